use serde::Serialize;

use super::distance;
use crate::error::{LesionMatchError, Result};
use crate::types::Coordinates;

/// Relative slack used while growing the sphere, so that points placed on
/// the boundary by construction are not rejected over rounding error
const FIT_TOLERANCE: f64 = 1e-9;

/// Threshold under which a support configuration is treated as degenerate
const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// A sphere in physical space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sphere {
    pub center: Coordinates,
    pub radius: f64,
}

/// Fits the smallest sphere containing every point
///
/// Uses Welzl's algorithm in its move-to-front form, so the recursion depth
/// is bounded by the support size (at most 4) rather than the input size.
/// A single point yields a sphere of radius 0.
///
/// # Errors
///
/// Returns [`LesionMatchError::Geometry`] if `points` is empty or contains a
/// non-finite coordinate.
///
/// # Example
///
/// ```
/// use lesionmatch_core::geometry::fit_enclosing_sphere;
/// use lesionmatch_core::Coordinates;
///
/// let sphere = fit_enclosing_sphere(&[
///     Coordinates::new(-2.0, 0.0, 0.0),
///     Coordinates::new(2.0, 0.0, 0.0),
///     Coordinates::new(0.0, 1.0, 0.0),
/// ])
/// .unwrap();
///
/// assert!((sphere.radius - 2.0).abs() < 1e-9);
/// assert!(sphere.center.distance(&Coordinates::new(0.0, 0.0, 0.0)) < 1e-9);
/// ```
pub fn fit_enclosing_sphere(points: &[Coordinates]) -> Result<Sphere> {
    if points.is_empty() {
        return Err(LesionMatchError::Geometry(
            "cannot fit an enclosing sphere to an empty point set".to_string(),
        ));
    }
    if let Some(p) = points.iter().find(|p| !p.is_finite()) {
        return Err(LesionMatchError::Geometry(format!(
            "non-finite point {} in annotation",
            p
        )));
    }

    let mut pts = points.to_vec();
    let n = pts.len();
    let mut support = Vec::with_capacity(4);
    let ball = move_to_front(&mut pts, n, &mut support);

    // Radius from the farthest input point, so every point passes `contains`
    // without tolerance
    let radius = points
        .iter()
        .map(|p| distance(&ball.center, p))
        .fold(0.0, f64::max);

    Ok(Sphere {
        center: ball.center,
        radius,
    })
}

/// Ball kept as squared radius while fitting
#[derive(Debug, Clone, Copy)]
struct Ball {
    center: Coordinates,
    radius_sq: f64,
}

impl Ball {
    /// Contains nothing, not even its center
    const EMPTY: Ball = Ball {
        center: Coordinates::new(0.0, 0.0, 0.0),
        radius_sq: -1.0,
    };

    fn covers(&self, p: &Coordinates) -> bool {
        let slack = FIT_TOLERANCE * self.radius_sq.max(1.0);
        p.distance_squared(&self.center) <= self.radius_sq + slack
    }

    fn covers_all(&self, points: &[Coordinates]) -> bool {
        points.iter().all(|p| self.covers(p))
    }

    /// Smallest ball with all support points on its boundary
    fn from_support(support: &[Coordinates]) -> Ball {
        match support {
            [] => Ball::EMPTY,
            [a] => Ball {
                center: *a,
                radius_sq: 0.0,
            },
            [a, b] => diametral(a, b),
            [a, b, c] => circumcircle(a, b, c).unwrap_or_else(|| smallest_covering(support)),
            [a, b, c, d] => {
                circumsphere(a, b, c, d).unwrap_or_else(|| smallest_covering(support))
            }
            _ => smallest_covering(support),
        }
    }
}

fn move_to_front(points: &mut [Coordinates], end: usize, support: &mut Vec<Coordinates>) -> Ball {
    let mut ball = Ball::from_support(support);
    if support.len() == 4 {
        return ball;
    }

    for i in 0..end {
        if !ball.covers(&points[i]) {
            support.push(points[i]);
            ball = move_to_front(points, i, support);
            support.pop();
            points[..=i].rotate_right(1);
        }
    }

    ball
}

fn diametral(a: &Coordinates, b: &Coordinates) -> Ball {
    Ball {
        center: (*a + *b).scale(0.5),
        radius_sq: a.distance_squared(b) / 4.0,
    }
}

fn circumcircle(a: &Coordinates, b: &Coordinates, c: &Coordinates) -> Option<Ball> {
    let u = *b - *a;
    let v = *c - *a;
    let w = u.cross(&v);
    let w_sq = w.dot(&w);

    // Collinear
    if w_sq <= DEGENERACY_TOLERANCE * u.dot(&u) * v.dot(&v) {
        return None;
    }

    let offset = (v.cross(&w).scale(u.dot(&u)) + w.cross(&u).scale(v.dot(&v))).scale(0.5 / w_sq);
    Some(Ball {
        center: *a + offset,
        radius_sq: offset.dot(&offset),
    })
}

fn circumsphere(
    a: &Coordinates,
    b: &Coordinates,
    c: &Coordinates,
    d: &Coordinates,
) -> Option<Ball> {
    let u = *b - *a;
    let v = *c - *a;
    let t = *d - *a;
    let det = u.dot(&v.cross(&t));

    // Coplanar
    let scale = (u.dot(&u) * v.dot(&v) * t.dot(&t)).sqrt();
    if det.abs() <= DEGENERACY_TOLERANCE * scale {
        return None;
    }

    let offset = (v.cross(&t).scale(u.dot(&u))
        + t.cross(&u).scale(v.dot(&v))
        + u.cross(&v).scale(t.dot(&t)))
    .scale(0.5 / det);
    Some(Ball {
        center: *a + offset,
        radius_sq: offset.dot(&offset),
    })
}

/// Smallest pair/triple ball covering a degenerate support set
fn smallest_covering(points: &[Coordinates]) -> Ball {
    let n = points.len();
    let mut best: Option<Ball> = None;
    let mut consider = |ball: Ball| {
        if ball.covers_all(points) && best.map_or(true, |b| ball.radius_sq < b.radius_sq) {
            best = Some(ball);
        }
    };

    for i in 0..n {
        for j in (i + 1)..n {
            consider(diametral(&points[i], &points[j]));
            for k in (j + 1)..n {
                if let Some(ball) = circumcircle(&points[i], &points[j], &points[k]) {
                    consider(ball);
                }
            }
        }
    }

    best.unwrap_or_else(|| centroid_ball(points))
}

fn centroid_ball(points: &[Coordinates]) -> Ball {
    if points.is_empty() {
        return Ball::EMPTY;
    }
    let sum = points
        .iter()
        .fold(Coordinates::default(), |acc, p| acc + *p);
    let center = sum.scale(1.0 / points.len() as f64);
    let radius_sq = points
        .iter()
        .map(|p| p.distance_squared(&center))
        .fold(0.0, f64::max);
    Ball { center, radius_sq }
}
