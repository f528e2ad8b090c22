//! Per-map projection pipeline: base affine, local correction, floors.
//!
//! A `MapProjector` is built once from a validated [`MapConfig`] snapshot
//! and then fed world positions one at a time from the screenshot
//! pipeline. Projection itself is pure; only the floor state machine
//! mutates between calls.

use nalgebra::Point2;

use crate::affine::{rotate_world, MapTransform, SingularTransformError};
use crate::calibrate::ResidualField;
use crate::config::{ConfigError, MapBounds, MapConfig};
use crate::floors::FloorDetector;
use crate::position::{ScreenPosition, WorldPosition};

#[derive(Clone, Debug)]
pub struct MapProjector {
    map_key: String,
    transform: MapTransform,
    marker_transform: MapTransform,
    rotation_degrees: f64,
    residuals: ResidualField,
    floors: FloorDetector,
    bounds: Option<MapBounds>,
}

impl MapProjector {
    /// Validates `config` and precomputes the residual field.
    ///
    /// Fails only with [`ConfigError`]; the caller disables this one map
    /// and keeps serving the others.
    pub fn new(config: &MapConfig, debounce_threshold: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let transform = config.transform()?;
        let marker_transform = config.marker_transform()?;
        let bounds = config.map_bounds()?;
        let residuals = ResidualField::new(
            &transform,
            config.rotation_degrees,
            &config.calibration_points,
        );
        let floors = FloorDetector::new(config.floors.clone(), debounce_threshold);
        Ok(Self {
            map_key: config.key.clone(),
            transform,
            marker_transform,
            rotation_degrees: config.rotation_degrees,
            residuals,
            floors,
            bounds,
        })
    }

    pub fn map_key(&self) -> &str {
        &self.map_key
    }

    pub fn transform(&self) -> MapTransform {
        self.transform
    }

    /// Project one world reading to a calibrated pixel position and run
    /// the floor state machine on its height.
    ///
    /// Results outside the configured map extent are reported as-is; the
    /// renderer decides how to draw an off-map marker.
    pub fn project(&mut self, world: &WorldPosition) -> ScreenPosition {
        let planar = world.planar();
        let base = self.transform.apply(rotate_world(planar, self.rotation_degrees));
        let corrected = self.residuals.correct(planar, base);
        if !self.in_bounds(corrected.x, corrected.y) {
            log::debug!(
                "map {}: projection ({:.1}, {:.1}) falls outside bounds",
                self.map_key,
                corrected.x,
                corrected.y
            );
        }
        let floor = self.floors.update(world.y).map(|band| band.layer_id.clone());
        ScreenPosition {
            map_key: self.map_key.clone(),
            x: corrected.x,
            y: corrected.y,
            heading: world.heading,
            floor,
            world: *world,
        }
    }

    /// Pixel anchor for the player marker glyph.
    ///
    /// The marker coefficients are calibrated on the glyph's own visual
    /// anchor, so the general-point residual correction does not apply.
    pub fn project_marker(&self, world: &WorldPosition) -> Point2<f64> {
        self.marker_transform
            .apply(rotate_world(world.planar(), self.rotation_degrees))
    }

    /// Map a pixel back to world ground-plane coordinates.
    ///
    /// Inverts the plain base affine (the local correction has no closed
    /// inverse); used by the calibration editing flow to seed new points
    /// from clicks.
    pub fn unproject(&self, screen: Point2<f64>) -> Result<Point2<f64>, SingularTransformError> {
        let rotated = self.transform.invert_point(screen)?;
        Ok(rotate_world(rotated, -self.rotation_degrees))
    }

    /// Whether a pixel lies inside the configured map extent. Maps
    /// without bounds accept everything.
    pub fn in_bounds(&self, x: f64, y: f64) -> bool {
        self.bounds.map_or(true, |b| b.contains(x, y))
    }

    pub fn current_floor(&self) -> Option<&str> {
        self.floors.current().map(|band| band.layer_id.as_str())
    }

    /// Swap in a new config snapshot.
    ///
    /// Floor state survives the swap when the band list is unchanged, so
    /// a calibration edit mid-raid does not reset the detected floor.
    pub fn apply_config(&mut self, config: &MapConfig) -> Result<(), ConfigError> {
        let mut next = Self::new(config, self.floors.debounce_threshold())?;
        if next.floors.bands() == self.floors.bands() {
            next.floors = self.floors.clone();
        }
        *self = next;
        Ok(())
    }
}
