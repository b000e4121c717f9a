use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A point in physical (scanner) space, in millimeters
///
/// All distance and containment checks are evaluated in this space.
/// Converting image indices to physical positions is the loader's job.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinates {
    /// Creates new Coordinates
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Coordinates) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance to another point
    pub fn distance_squared(&self, other: &Coordinates) -> f64 {
        let d = *self - *other;
        d.dot(&d)
    }

    pub fn dot(&self, other: &Coordinates) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Coordinates) -> Coordinates {
        Coordinates::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Multiplies every component by `k`
    pub fn scale(&self, k: f64) -> Coordinates {
        Coordinates::new(self.x * k, self.y * k, self.z * k)
    }

    /// Checks that no component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Total order by (z, y, x), slice-major like image stacks are browsed
    pub fn total_cmp(&self, other: &Coordinates) -> Ordering {
        self.z
            .total_cmp(&other.z)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.x.total_cmp(&other.x))
    }
}

impl Add for Coordinates {
    type Output = Coordinates;

    fn add(self, rhs: Coordinates) -> Coordinates {
        Coordinates::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Coordinates {
    type Output = Coordinates;

    fn sub(self, rhs: Coordinates) -> Coordinates {
        Coordinates::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[f64; 3]> for Coordinates {
    fn from(v: [f64; 3]) -> Self {
        Coordinates::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Coordinates::new(0.0, 0.0, 0.0);
        let b = Coordinates::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance_squared(&b), 25.0);
    }

    #[test]
    fn test_arithmetic() {
        let a = Coordinates::new(1.0, 2.0, 3.0);
        let b = Coordinates::new(2.0, 2.0, 2.0);
        assert_eq!(a + b, Coordinates::new(3.0, 4.0, 5.0));
        assert_eq!(a - b, Coordinates::new(-1.0, 0.0, 1.0));
        assert_eq!(a.scale(2.0), Coordinates::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn test_cross_product() {
        let x = Coordinates::new(1.0, 0.0, 0.0);
        let y = Coordinates::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Coordinates::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_total_cmp_is_slice_major() {
        let low_slice = Coordinates::new(9.0, 9.0, 0.0);
        let high_slice = Coordinates::new(0.0, 0.0, 1.0);
        assert_eq!(low_slice.total_cmp(&high_slice), Ordering::Less);
        assert_eq!(high_slice.total_cmp(&high_slice), Ordering::Equal);
    }

    #[test]
    fn test_is_finite() {
        assert!(Coordinates::new(1.0, 2.0, 3.0).is_finite());
        assert!(!Coordinates::new(f64::NAN, 2.0, 3.0).is_finite());
        assert!(!Coordinates::new(1.0, f64::INFINITY, 3.0).is_finite());
    }
}
