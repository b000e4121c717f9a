//! Distance, containment, and minimal-enclosing-sphere primitives
//!
//! Everything here works in physical space on [`Coordinates`].

mod sphere;

pub use sphere::{fit_enclosing_sphere, Sphere};

use crate::types::Coordinates;

/// Euclidean distance between two points
pub fn distance(a: &Coordinates, b: &Coordinates) -> f64 {
    a.distance(b)
}

/// Checks whether `point` lies inside the sphere (boundary inclusive)
pub fn contains(center: &Coordinates, radius: f64, point: &Coordinates) -> bool {
    distance(center, point) <= radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_boundary_is_inclusive() {
        let center = Coordinates::new(0.0, 0.0, 0.0);
        assert!(contains(&center, 5.0, &Coordinates::new(5.0, 0.0, 0.0)));
        assert!(contains(&center, 5.0, &Coordinates::new(3.0, 4.0, 0.0)));
        assert!(!contains(&center, 5.0, &Coordinates::new(5.0, 0.1, 0.0)));
    }

    #[test]
    fn test_zero_radius_contains_only_center() {
        let center = Coordinates::new(1.0, 2.0, 3.0);
        assert!(contains(&center, 0.0, &center));
        assert!(!contains(&center, 0.0, &Coordinates::new(1.0, 2.0, 3.001)));
    }

    #[test]
    fn test_distance() {
        let a = Coordinates::new(1.0, 1.0, 1.0);
        let b = Coordinates::new(1.0, 1.0, 4.0);
        assert_eq!(distance(&a, &b), 3.0);
    }
}
