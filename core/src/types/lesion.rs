use serde::Serialize;
use std::cmp::Ordering;

use super::{CaseKey, Coordinates};
use crate::error::{LesionMatchError, Result};
use crate::geometry::{self, fit_enclosing_sphere};

/// Reference lesion approximated by a sphere in physical space
///
/// Created once from reference annotations and immutable afterward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lesion {
    id: String,
    center: Coordinates,
    radius: f64,
    case: CaseKey,
}

impl Lesion {
    /// Creates a lesion from an already known sphere
    ///
    /// # Errors
    ///
    /// Returns [`LesionMatchError::Validation`] if the radius is negative or
    /// non-finite, or the center has a non-finite component.
    pub fn new(
        id: impl Into<String>,
        case: CaseKey,
        center: Coordinates,
        radius: f64,
    ) -> Result<Self> {
        let id = id.into();
        if !radius.is_finite() || radius < 0.0 {
            return Err(LesionMatchError::Validation(format!(
                "lesion '{}' in {} has invalid radius {}",
                id, case, radius
            )));
        }
        if !center.is_finite() {
            return Err(LesionMatchError::Validation(format!(
                "lesion '{}' in {} has non-finite center {}",
                id, case, center
            )));
        }

        Ok(Self {
            id,
            center,
            radius,
            case,
        })
    }

    /// Creates a lesion from annotated points via the minimal enclosing sphere
    ///
    /// The fitted radius is raised to `min_radius` when smaller, which keeps
    /// single-voxel annotations from collapsing to a point.
    pub fn from_points(
        id: impl Into<String>,
        case: CaseKey,
        points: &[Coordinates],
        min_radius: f64,
    ) -> Result<Self> {
        let sphere = fit_enclosing_sphere(points)?;
        Self::new(id, case, sphere.center, sphere.radius.max(min_radius))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn center(&self) -> Coordinates {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn case(&self) -> &CaseKey {
        &self.case
    }

    /// Distance from the lesion center to a point
    pub fn distance_to(&self, point: &Coordinates) -> f64 {
        geometry::distance(&self.center, point)
    }

    /// Checks whether a point lies within the lesion sphere
    pub fn contains(&self, point: &Coordinates) -> bool {
        geometry::contains(&self.center, self.radius, point)
    }

    /// Total order used for tie-breaking and output: id, then geometry
    pub fn canonical_cmp(&self, other: &Lesion) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.center.total_cmp(&other.center))
            .then_with(|| self.radius.total_cmp(&other.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> CaseKey {
        CaseKey::new("P001", "20240102", "CT", "3")
    }

    #[test]
    fn test_new_valid() {
        let lesion = Lesion::new("L1", case(), Coordinates::new(1.0, 2.0, 3.0), 4.0).unwrap();
        assert_eq!(lesion.id(), "L1");
        assert_eq!(lesion.radius(), 4.0);
        assert_eq!(lesion.case(), &case());
    }

    #[test]
    fn test_point_lesion_allowed() {
        assert!(Lesion::new("L1", case(), Coordinates::default(), 0.0).is_ok());
    }

    #[test]
    fn test_invalid_radius_rejected() {
        for radius in [-1.0, f64::NAN, f64::INFINITY] {
            let err = Lesion::new("L1", case(), Coordinates::default(), radius).unwrap_err();
            assert!(matches!(err, LesionMatchError::Validation(_)));
        }
    }

    #[test]
    fn test_non_finite_center_rejected() {
        let err = Lesion::new("L1", case(), Coordinates::new(f64::NAN, 0.0, 0.0), 1.0)
            .unwrap_err();
        assert!(matches!(err, LesionMatchError::Validation(_)));
    }

    #[test]
    fn test_from_points_fits_sphere() {
        let points = [
            Coordinates::new(-3.0, 0.0, 0.0),
            Coordinates::new(3.0, 0.0, 0.0),
        ];
        let lesion = Lesion::from_points("L1", case(), &points, 0.0).unwrap();
        assert!((lesion.radius() - 3.0).abs() < 1e-9);
        assert!(lesion.contains(&Coordinates::new(0.0, 2.9, 0.0)));
    }

    #[test]
    fn test_from_points_applies_floor() {
        let lesion =
            Lesion::from_points("L1", case(), &[Coordinates::new(1.0, 1.0, 1.0)], 0.5).unwrap();
        assert_eq!(lesion.radius(), 0.5);
    }

    #[test]
    fn test_from_points_empty_is_geometry_error() {
        let err = Lesion::from_points("L1", case(), &[], 0.0).unwrap_err();
        assert!(matches!(err, LesionMatchError::Geometry(_)));
    }

    #[test]
    fn test_canonical_cmp_by_id() {
        let a = Lesion::new("A", case(), Coordinates::new(9.0, 0.0, 0.0), 1.0).unwrap();
        let b = Lesion::new("B", case(), Coordinates::new(0.0, 0.0, 0.0), 1.0).unwrap();
        assert_eq!(a.canonical_cmp(&b), Ordering::Less);
    }
}
