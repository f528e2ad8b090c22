//! Per-map configuration records.
//!
//! The persisted document keeps transform and bounds arrays untyped so a
//! malformed entry in one map record cannot fail deserialization of the
//! whole document. Typed accessors validate on read and report
//! [`ConfigError`] for that map alone; callers disable the offending map
//! and keep the rest.

use serde::{Deserialize, Serialize};

use crate::affine::MapTransform;
use crate::calibrate::CalibrationPoint;
use crate::floors::FloorBand;

/// A map record failed validation. Never fatal: the map is skipped.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("map {map:?}: no base transform configured")]
    MissingTransform { map: String },
    #[error("map {map:?}: {field} has {len} coefficients, expected 6")]
    MalformedTransform {
        map: String,
        field: &'static str,
        len: usize,
    },
    #[error("map {map:?}: bounds has {len} entries, expected 4")]
    MalformedBounds { map: String, len: usize },
    #[error("map {map:?}: duplicate calibration point id {id:?}")]
    DuplicateCalibrationId { map: String, id: String },
    #[error("map {map:?}: floor band {layer:?} has an empty height interval")]
    InvalidFloorBand { map: String, layer: String },
    #[error("map record has an empty key")]
    EmptyKey,
}

/// Extent of the map image in target pixel space, `[min_x, min_y, max_x, max_y]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MapBounds {
    pub fn from_array(values: [f64; 4]) -> Self {
        let [min_x, min_y, max_x, max_y] = values;
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }
}

/// One map's persisted description: transforms, calibration points,
/// floor bands and image extent.
///
/// Snapshot semantics: the transform path never mutates a `MapConfig` in
/// place. Edits clone, modify, validate and swap wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// `[a, b, c, d, e, f]`; kept untyped until read, may be absent.
    #[serde(default)]
    pub base_transform: Option<Vec<f64>>,
    /// Independent coefficients for the player marker glyph; falls back
    /// to the base transform when absent.
    #[serde(default)]
    pub player_marker_transform: Option<Vec<f64>>,
    /// Legacy pre-rotation of world coordinates, degrees about the origin.
    #[serde(default)]
    pub rotation_degrees: f64,
    #[serde(default)]
    pub calibration_points: Vec<CalibrationPoint>,
    #[serde(default)]
    pub floors: Vec<FloorBand>,
    /// `[min_x, min_y, max_x, max_y]` in target pixel space.
    #[serde(default)]
    pub bounds: Option<Vec<f64>>,
}

impl MapConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: String::new(),
            width: 0,
            height: 0,
            base_transform: None,
            player_marker_transform: None,
            rotation_degrees: 0.0,
            calibration_points: Vec::new(),
            floors: Vec::new(),
            bounds: None,
        }
    }

    /// The validated base transform.
    pub fn transform(&self) -> Result<MapTransform, ConfigError> {
        match &self.base_transform {
            None => Err(ConfigError::MissingTransform {
                map: self.key.clone(),
            }),
            Some(coeffs) => self.checked_transform(coeffs, "baseTransform"),
        }
    }

    /// The validated player marker transform, or the base transform when
    /// no independent marker coefficients are configured.
    pub fn marker_transform(&self) -> Result<MapTransform, ConfigError> {
        match &self.player_marker_transform {
            None => self.transform(),
            Some(coeffs) => self.checked_transform(coeffs, "playerMarkerTransform"),
        }
    }

    /// The validated image extent, or `None` when not configured.
    pub fn map_bounds(&self) -> Result<Option<MapBounds>, ConfigError> {
        match &self.bounds {
            None => Ok(None),
            Some(values) => {
                let array: [f64; 4] =
                    values
                        .as_slice()
                        .try_into()
                        .map_err(|_| ConfigError::MalformedBounds {
                            map: self.key.clone(),
                            len: values.len(),
                        })?;
                Ok(Some(MapBounds::from_array(array)))
            }
        }
    }

    pub fn find_point(&self, id: &str) -> Option<&CalibrationPoint> {
        self.calibration_points.iter().find(|p| p.id == id)
    }

    /// Full record validation: key present, transforms well formed,
    /// bounds well formed, calibration point ids unique, floor band
    /// intervals non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.is_empty() {
            return Err(ConfigError::EmptyKey);
        }
        self.transform()?;
        self.marker_transform()?;
        self.map_bounds()?;
        for (i, point) in self.calibration_points.iter().enumerate() {
            if self.calibration_points[..i].iter().any(|p| p.id == point.id) {
                return Err(ConfigError::DuplicateCalibrationId {
                    map: self.key.clone(),
                    id: point.id.clone(),
                });
            }
        }
        for band in &self.floors {
            // NaN limits also fail the comparison and land here.
            let has_span = band.min_height < band.max_height;
            if !has_span {
                return Err(ConfigError::InvalidFloorBand {
                    map: self.key.clone(),
                    layer: band.layer_id.clone(),
                });
            }
        }
        Ok(())
    }

    fn checked_transform(
        &self,
        coeffs: &[f64],
        field: &'static str,
    ) -> Result<MapTransform, ConfigError> {
        let array: [f64; 6] =
            coeffs
                .try_into()
                .map_err(|_| ConfigError::MalformedTransform {
                    map: self.key.clone(),
                    field,
                    len: coeffs.len(),
                })?;
        Ok(MapTransform::from_array(array))
    }
}
