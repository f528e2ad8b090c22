//! 6-parameter affine map between world ground-plane and map pixel space.
//!
//! Planar points are `Point2<f64>` with `x` = world x and `y` = world z; the
//! world height axis never enters the planar projection (floor bands handle
//! it). Non-finite inputs flow through `apply` unchanged so one corrupt
//! sample cannot take down the position pipeline.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Error when the inverse of a transform is requested but the 2×2 linear
/// part is not invertible (zero or near-zero scale).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("singular transform: determinant={determinant:.6e}")]
pub struct SingularTransformError {
    /// The offending determinant `a*d - b*c`.
    pub determinant: f64,
}

/// World-to-pixel affine transform.
///
/// `screen_x = a*x + c*z + e`, `screen_y = b*x + d*z + f` — the 2×3 layout
/// used by the map document's `[a, b, c, d, e, f]` arrays.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl MapTransform {
    pub const IDENTITY: MapTransform = MapTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Build from the document coefficient order `[a, b, c, d, e, f]`.
    pub fn from_array(coeffs: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = coeffs;
        Self { a, b, c, d, e, f }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }

    /// Project a world ground-plane point to map pixels.
    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Determinant of the 2×2 linear part.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() >= f64::EPSILON
    }

    /// Map a pixel position back to the world ground plane.
    ///
    /// Solves the 2×2 system `[a c; b d]`; fails when the determinant is
    /// within machine epsilon of zero.
    pub fn invert_point(&self, screen: Point2<f64>) -> Result<Point2<f64>, SingularTransformError> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return Err(SingularTransformError { determinant: det });
        }
        let u = screen.x - self.e;
        let v = screen.y - self.f;
        Ok(Point2::new(
            (self.d * u - self.c * v) / det,
            (self.a * v - self.b * u) / det,
        ))
    }
}

/// Rotate a ground-plane point about the origin by `degrees`.
///
/// Legacy compatibility pre-step: a few older map images were aligned with a
/// fixed rotation baked into the document instead of the matrix itself.
pub fn rotate_world(p: Point2<f64>, degrees: f64) -> Point2<f64> {
    if degrees == 0.0 {
        return p;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    Point2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
}
