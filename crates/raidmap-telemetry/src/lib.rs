//! Screenshot filename telemetry for the raidmap position tracker.
//!
//! The game writes the player's position and camera rotation into every
//! screenshot's filename. This crate turns such a name into a
//! [`Sighting`] — a ready-to-project [`raidmap_core::WorldPosition`]
//! with compass heading and capture timestamp — without touching the
//! filesystem. Watching a screenshot directory and debouncing events is
//! the host application's job.

mod filename;
mod heading;

pub use filename::{parse_screenshot_name, ParseError, Sighting};
pub use heading::{heading_from_quaternion, normalize_heading};
