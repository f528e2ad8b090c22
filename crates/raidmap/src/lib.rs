//! High-level facade crate for the `raidmap-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the core engine and the telemetry
//!   parser
//! - a [`Session`] that wires filename parsing, calibrated projection and
//!   the bounded trail together for one map
//! - (feature `cli`, default on) the `raidmap` command-line tool.
//!
//! ## Quickstart
//!
//! ```no_run
//! use raidmap::{load_maps, Session, TrackerSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let maps = load_maps("maps.json")?;
//! let customs = maps.iter().find(|m| m.key == "customs").unwrap();
//!
//! let mut session = Session::new(customs, &TrackerSettings::default())?;
//! let pos = session.record(
//!     "2023-12-27[22-24]_-105.4, 2.9, -312.7_0.0, -0.4, 0.0, 0.9_12.1 (0).png",
//! )?;
//! println!("pixel ({:.1}, {:.1}) floor {:?}", pos.x, pos.y, pos.floor);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `raidmap::core`: transforms, calibration, floors, map catalog.
//! - `raidmap::telemetry`: screenshot filename → [`Sighting`].
//! - `raidmap::Session`: per-map stateful pipeline for host applications.

pub use raidmap_core as core;
pub use raidmap_telemetry as telemetry;

pub use raidmap_core::{
    fit_affine, fit_from_points, load_maps, save_maps, CalibrationPoint, CatalogError,
    ConfigError, FitError, FloorBand, MapCatalog, MapConfig, MapProjector, MapTransform,
    ScreenPosition, SingularTransformError, TrackerSettings, Trail, WorldPosition,
};
pub use raidmap_telemetry::{parse_screenshot_name, ParseError, Sighting};

#[cfg(feature = "tracing")]
pub use raidmap_core::init_tracing;

mod session;

pub use session::{Session, SessionError};
