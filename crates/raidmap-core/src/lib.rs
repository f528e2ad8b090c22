//! Core coordinate engine for the raidmap position tracker.
//!
//! This crate is intentionally small and purely geometric: affine
//! world-to-pixel transforms, locally-weighted calibration, floor-band
//! detection and the map config snapshots they read from. It does *not*
//! watch for screenshots, parse filenames or draw anything.

mod affine;
mod calibrate;
mod catalog;
mod config;
mod floors;
mod logger;
mod position;
mod projector;
mod settings;

pub use affine::{rotate_world, MapTransform, SingularTransformError};
pub use calibrate::{fit_affine, fit_from_points, CalibrationPoint, FitError, ResidualField};
pub use catalog::{load_maps, save_maps, CatalogError, MapCatalog};
pub use config::{ConfigError, MapBounds, MapConfig};
pub use floors::{FloorBand, FloorDetector, DEFAULT_DEBOUNCE_THRESHOLD};
pub use position::{ScreenPosition, Trail, WorldPosition};
pub use projector::MapProjector;
pub use settings::{SettingsError, TrackerSettings};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init, init_with_level};
