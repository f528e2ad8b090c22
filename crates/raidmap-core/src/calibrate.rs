//! Local calibration correction and affine auto-fit.
//!
//! Hand-aligned map images are never globally exact. A sparse set of
//! manually verified correspondences corrects the base affine locally:
//! each point contributes its residual with inverse-square-distance
//! weight, and a zero-residual anchor on the base projection makes the
//! correction fade out far from every point instead of plateauing.
//!
//! `fit_affine` re-derives the 6 coefficients from point correspondences
//! via normal equations on Hartley-normalized coordinates.

use nalgebra::{Matrix3, Point2, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::affine::{rotate_world, MapTransform};

/// Division guard for inverse-square weights.
const DISTANCE_EPSILON: f64 = 1e-9;
/// Squared world distance under which a query counts as sitting on a
/// calibration point and gets its verified target verbatim.
const EXACT_HIT_DIST_SQ: f64 = 1e-12;
/// World distance at which a single point's pull on the result halves.
const FALLOFF_RADIUS: f64 = 250.0;
const ANCHOR_WEIGHT: f64 = 1.0 / (FALLOFF_RADIUS * FALLOFF_RADIUS);
/// Determinant floor for the normalized Gram matrix in `fit_affine`.
const GRAM_DETERMINANT_EPSILON: f64 = 1e-9;

/// Errors from [`fit_affine`]. The caller keeps its previous transform on
/// either variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("need at least 3 usable point pairs, found {found}")]
    InsufficientData { found: usize },
    #[error("point geometry is degenerate (collinear or coincident): |det|={determinant:.6e}")]
    DegenerateGeometry { determinant: f64 },
}

/// A manually verified world-to-pixel correspondence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPoint {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub game_x: f64,
    pub game_z: f64,
    pub target_x: f64,
    pub target_y: f64,
}

impl CalibrationPoint {
    /// World ground-plane coordinates, pre-rotation.
    pub fn game(&self) -> Point2<f64> {
        Point2::new(self.game_x, self.game_z)
    }

    /// Verified destination pixel.
    pub fn target(&self) -> Point2<f64> {
        Point2::new(self.target_x, self.target_y)
    }

    pub fn is_finite(&self) -> bool {
        self.game_x.is_finite()
            && self.game_z.is_finite()
            && self.target_x.is_finite()
            && self.target_y.is_finite()
    }
}

#[derive(Clone, Copy, Debug)]
struct ResidualSample {
    game: Point2<f64>,
    target: Point2<f64>,
    residual: Vector2<f64>,
}

/// Per-point residuals against a base projection, precomputed once per
/// map snapshot so queries on the position pipeline stay allocation-free.
#[derive(Clone, Debug, Default)]
pub struct ResidualField {
    samples: Vec<ResidualSample>,
}

impl ResidualField {
    /// Builds residuals for `points` against `base`, with the same legacy
    /// rotation pre-step the query path will use.
    ///
    /// Points with non-finite coordinates are skipped; they would poison
    /// every query on the map otherwise.
    pub fn new(base: &MapTransform, rotation_degrees: f64, points: &[CalibrationPoint]) -> Self {
        let samples = points
            .iter()
            .filter(|p| {
                if p.is_finite() {
                    true
                } else {
                    log::warn!("skipping calibration point {:?}: non-finite coordinates", p.id);
                    false
                }
            })
            .map(|p| {
                let game = p.game();
                let predicted = base.apply(rotate_world(game, rotation_degrees));
                ResidualSample {
                    game,
                    target: p.target(),
                    residual: p.target() - predicted,
                }
            })
            .collect();
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Blend the weighted residuals into `base_projection` for a query at
    /// `world` (ground-plane, unrotated).
    ///
    /// Exact at every calibration point; converges to `base_projection`
    /// as the query moves away from all of them. Non-finite queries
    /// propagate as non-finite results.
    pub fn correct(&self, world: Point2<f64>, base_projection: Point2<f64>) -> Point2<f64> {
        if self.samples.is_empty() {
            return base_projection;
        }
        let mut weight_sum = ANCHOR_WEIGHT;
        let mut blended = Vector2::zeros();
        for sample in &self.samples {
            let dist_sq = (world - sample.game).norm_squared();
            if dist_sq < EXACT_HIT_DIST_SQ {
                return sample.target;
            }
            let w = 1.0 / (dist_sq + DISTANCE_EPSILON);
            weight_sum += w;
            blended += w * sample.residual;
        }
        base_projection + blended / weight_sum
    }
}

/// Isotropic normalization of a point cloud: centroid at the origin,
/// mean distance √2. Keeps the normal equations well conditioned for
/// pixel-scale coordinates.
#[derive(Clone, Copy, Debug)]
struct Normalization {
    scale: f64,
    cx: f64,
    cy: f64,
}

impl Normalization {
    fn fit(points: impl Iterator<Item = Point2<f64>> + Clone) -> Self {
        let mut n = 0.0_f64;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for p in points.clone() {
            n += 1.0;
            cx += p.x;
            cy += p.y;
        }
        cx /= n;
        cy /= n;
        let mean_dist =
            points.map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()).sum::<f64>() / n;
        let scale = if mean_dist > 0.0 {
            std::f64::consts::SQRT_2 / mean_dist
        } else {
            1.0
        };
        Self { scale, cx, cy }
    }

    fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new(self.scale * (p.x - self.cx), self.scale * (p.y - self.cy))
    }
}

/// Least-squares fit of the 6 affine coefficients from `(game, screen)`
/// correspondences.
///
/// Solves the normal equations on normalized coordinates: one shared
/// 3×3 Gram matrix, one right-hand side per pixel axis. Pairs with any
/// non-finite coordinate are dropped before counting.
///
/// Callers with a legacy rotation pre-step must rotate the game side of
/// each pair first so the fitted matrix composes with that same pre-step.
pub fn fit_affine(pairs: &[(Point2<f64>, Point2<f64>)]) -> Result<MapTransform, FitError> {
    let usable: Vec<(Point2<f64>, Point2<f64>)> = pairs
        .iter()
        .filter(|(g, s)| g.x.is_finite() && g.y.is_finite() && s.x.is_finite() && s.y.is_finite())
        .copied()
        .collect();
    if usable.len() < 3 {
        return Err(FitError::InsufficientData { found: usable.len() });
    }

    let game_norm = Normalization::fit(usable.iter().map(|(g, _)| *g));
    let screen_norm = Normalization::fit(usable.iter().map(|(_, s)| *s));

    let mut gram = Matrix3::zeros();
    let mut rhs_x = Vector3::zeros();
    let mut rhs_y = Vector3::zeros();
    for (game, screen) in &usable {
        let g = game_norm.apply(*game);
        let s = screen_norm.apply(*screen);
        let row = Vector3::new(g.x, g.y, 1.0);
        gram += row * row.transpose();
        rhs_x += row * s.x;
        rhs_y += row * s.y;
    }

    let determinant = gram.determinant();
    if determinant.abs() < GRAM_DETERMINANT_EPSILON {
        return Err(FitError::DegenerateGeometry { determinant });
    }
    let lu = gram.lu();
    let (sol_x, sol_y) = match (lu.solve(&rhs_x), lu.solve(&rhs_y)) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(FitError::DegenerateGeometry { determinant }),
    };

    // Undo both normalizations in closed form.
    let k = game_norm.scale / screen_norm.scale;
    let a = sol_x[0] * k;
    let c = sol_x[1] * k;
    let b = sol_y[0] * k;
    let d = sol_y[1] * k;
    let e = screen_norm.cx - a * game_norm.cx - c * game_norm.cy + sol_x[2] / screen_norm.scale;
    let f = screen_norm.cy - b * game_norm.cx - d * game_norm.cy + sol_y[2] / screen_norm.scale;
    Ok(MapTransform { a, b, c, d, e, f })
}

/// [`fit_affine`] over a calibration point list, pairing each point's
/// game coordinates with its verified target pixel.
pub fn fit_from_points(points: &[CalibrationPoint]) -> Result<MapTransform, FitError> {
    let pairs: Vec<(Point2<f64>, Point2<f64>)> =
        points.iter().map(|p| (p.game(), p.target())).collect();
    fit_affine(&pairs)
}
