//! Screenshot filename parsing for embedded position telemetry.
//!
//! The game names every screenshot after the player's state at capture
//! time:
//!
//! `2023-12-27[22-24]_-105.4, 2.9, -312.7_0.0, -0.4, 0.0, 0.9_12.1 (0).png`
//!
//! which is `date[time]_x, y, z_qx, qy, qz, qw_extra (n).png`:
//! - `date[time]` — local capture time, seconds optional;
//! - `x, y, z` — world position, `y` vertical;
//! - `qx, qy, qz, qw` — camera rotation quaternion (Unity convention);
//! - `_extra` — trailing float (zoom), optional and ignored;
//! - ` (n)` — duplicate-name counter, optional.
//!
//! The extension match is case-insensitive and a leading directory path
//! is tolerated. Parsing is pure string work; nothing here watches the
//! filesystem.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

use raidmap_core::WorldPosition;

use crate::heading::heading_from_quaternion;

/// Everything a screenshot name tells us.
#[derive(Debug, Clone, PartialEq)]
pub struct Sighting {
    /// Position with heading and capture time filled in, ready for the
    /// projection pipeline.
    pub world: WorldPosition,
    /// Raw rotation quaternion `[qx, qy, qz, qw]` as written by the game;
    /// `None` when a component was not a finite number.
    pub quaternion: Option<[f64; 4]>,
    /// Duplicate-name counter from the ` (n)` suffix.
    pub shot: Option<u32>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("filename does not match the screenshot pattern")]
    PatternMismatch,
    #[error("screenshot {component} is not a usable number: {value:?}")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },
}

/// Screenshot filename regex, compiled once.
fn screenshot_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Pattern breakdown:
        // (\d{4}-\d{2}-\d{2}\[\d{2}-\d{2}(?:-\d{2})?\])  - capture stamp, seconds optional
        // _x, y, z                                       - world position floats
        // _qx, qy, qz, qw                                - rotation quaternion floats
        // (?:_float)?                                    - trailing zoom, ignored
        // (?: \((\d+)\))?                                - duplicate counter
        // \.(?i:png)$                                    - extension, any case
        const FLOAT: &str = r"(-?\d+(?:\.\d+)?)";
        let pattern = format!(
            r"(\d{{4}}-\d{{2}}-\d{{2}}\[\d{{2}}-\d{{2}}(?:-\d{{2}})?\])_{F}, {F}, {F}_{F}, {F}, {F}, {F}(?:_-?\d+(?:\.\d+)?)?(?: \((\d+)\))?\.(?i:png)$",
            F = FLOAT
        );
        Regex::new(&pattern).unwrap()
    })
}

/// Parse one screenshot filename into a [`Sighting`].
///
/// The capture timestamp is parsed leniently: a stamp that matches the
/// shape but not the calendar (month 13 and the like) yields
/// `captured_at: None` rather than an error. A quaternion component that
/// overflows to infinity drops the quaternion and the heading the same
/// way. The position itself must be finite.
pub fn parse_screenshot_name(name: &str) -> Result<Sighting, ParseError> {
    let captures = screenshot_pattern()
        .captures(name)
        .ok_or(ParseError::PatternMismatch)?;

    let x = parse_axis(captures.get(2).unwrap().as_str(), "x")?;
    let y = parse_axis(captures.get(3).unwrap().as_str(), "y")?;
    let z = parse_axis(captures.get(4).unwrap().as_str(), "z")?;

    let quaternion = parse_quaternion([
        captures.get(5).unwrap().as_str(),
        captures.get(6).unwrap().as_str(),
        captures.get(7).unwrap().as_str(),
        captures.get(8).unwrap().as_str(),
    ]);

    let shot = match captures.get(9) {
        None => None,
        Some(m) => Some(m.as_str().parse::<u32>().map_err(|_| {
            ParseError::InvalidComponent {
                component: "shot counter",
                value: m.as_str().to_string(),
            }
        })?),
    };

    let world = WorldPosition {
        x,
        y,
        z,
        heading: quaternion.and_then(heading_from_quaternion),
        captured_at: parse_stamp(captures.get(1).unwrap().as_str()),
    };

    Ok(Sighting {
        world,
        quaternion,
        shot,
    })
}

fn parse_axis(raw: &str, component: &'static str) -> Result<f64, ParseError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::InvalidComponent {
            component,
            value: raw.to_string(),
        }),
    }
}

fn parse_quaternion(raw: [&str; 4]) -> Option<[f64; 4]> {
    let mut q = [0.0; 4];
    for (slot, text) in q.iter_mut().zip(raw) {
        let value = text.parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }
    Some(q)
}

fn parse_stamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d[%H-%M-%S]")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d[%H-%M]"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    const CANONICAL: &str = "2023-12-27[22-24]_-105.4, 2.9, -312.7_0.0, -0.4, 0.0, 0.9_12.1 (0).png";

    #[test]
    fn parses_canonical_name() {
        let sighting = parse_screenshot_name(CANONICAL).unwrap();
        assert_eq!(sighting.world.x, -105.4);
        assert_eq!(sighting.world.y, 2.9);
        assert_eq!(sighting.world.z, -312.7);
        assert_eq!(sighting.quaternion, Some([0.0, -0.4, 0.0, 0.9]));
        assert_eq!(sighting.shot, Some(0));

        let stamp = sighting.world.captured_at.unwrap();
        assert_eq!(
            stamp.date(),
            NaiveDate::from_ymd_opt(2023, 12, 27).unwrap()
        );
        assert_eq!((stamp.hour(), stamp.minute(), stamp.second()), (22, 24, 0));
    }

    #[test]
    fn parses_stamp_with_seconds() {
        let name = "2024-01-03[08-15-42]_0.0, 0.0, 0.0_0.0, 0.0, 0.0, 1.0_1.0.png";
        let sighting = parse_screenshot_name(name).unwrap();
        assert_eq!(sighting.world.captured_at.unwrap().second(), 42);
        assert_eq!(sighting.shot, None);
    }

    #[test]
    fn trailing_zoom_and_counter_are_optional() {
        let bare = "2023-12-27[22-24]_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0.png";
        let sighting = parse_screenshot_name(bare).unwrap();
        assert_eq!(sighting.world.x, 1.0);
        assert_eq!(sighting.shot, None);

        let counted = "2023-12-27[22-24]_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0 (7).png";
        assert_eq!(parse_screenshot_name(counted).unwrap().shot, Some(7));
    }

    #[test]
    fn extension_case_is_ignored() {
        let upper = "2023-12-27[22-24]_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0_5.5.PNG";
        assert!(parse_screenshot_name(upper).is_ok());
    }

    #[test]
    fn directory_prefixes_are_tolerated() {
        let unix = format!("/home/player/screenshots/{CANONICAL}");
        assert!(parse_screenshot_name(&unix).is_ok());
        let windows = format!(r"C:\Games\EFT\Screenshots\{CANONICAL}");
        assert!(parse_screenshot_name(&windows).is_ok());
    }

    #[test]
    fn identity_quaternion_faces_north() {
        let name = "2023-12-27[22-24]_0.0, 0.0, 0.0_0.0, 0.0, 0.0, 1.0_1.0.png";
        let sighting = parse_screenshot_name(name).unwrap();
        assert_eq!(sighting.world.heading, Some(0.0));
    }

    #[test]
    fn yaw_quaternion_gives_compass_heading() {
        // sin(45°) ≈ 0.7071068: a 90° yaw about the vertical axis.
        let name = "2023-12-27[22-24]_0.0, 0.0, 0.0_0.0, 0.7071068, 0.0, 0.7071068_1.0.png";
        let sighting = parse_screenshot_name(name).unwrap();
        let heading = sighting.world.heading.unwrap();
        assert!((heading - 90.0).abs() < 1e-4, "heading {heading}");
    }

    #[test]
    fn zero_quaternion_has_no_heading() {
        let name = "2023-12-27[22-24]_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 0.0_1.0.png";
        let sighting = parse_screenshot_name(name).unwrap();
        assert_eq!(sighting.quaternion, Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(sighting.world.heading, None);
    }

    #[test]
    fn impossible_calendar_stamp_is_lenient() {
        let name = "2023-13-45[99-98]_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0_1.0.png";
        let sighting = parse_screenshot_name(name).unwrap();
        assert_eq!(sighting.world.captured_at, None);
        assert_eq!(sighting.world.x, 1.0);
    }

    #[test]
    fn overflowing_position_component_is_an_error() {
        let huge = "9".repeat(400);
        let name = format!("2023-12-27[22-24]_{huge}.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0_1.0.png");
        match parse_screenshot_name(&name) {
            Err(ParseError::InvalidComponent { component: "x", .. }) => {}
            other => panic!("expected invalid x component, got {other:?}"),
        }
    }

    #[test]
    fn overflowing_quaternion_component_degrades_gracefully() {
        let huge = "9".repeat(400);
        let name = format!("2023-12-27[22-24]_1.0, 2.0, 3.0_{huge}.0, 0.0, 0.0, 1.0_1.0.png");
        let sighting = parse_screenshot_name(&name).unwrap();
        assert_eq!(sighting.quaternion, None);
        assert_eq!(sighting.world.heading, None);
        assert_eq!(sighting.world.x, 1.0);
    }

    #[test]
    fn overflowing_shot_counter_is_an_error() {
        let name = "2023-12-27[22-24]_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0_1.0 (99999999999).png";
        assert!(matches!(
            parse_screenshot_name(name),
            Err(ParseError::InvalidComponent {
                component: "shot counter",
                ..
            })
        ));
    }

    #[test]
    fn rejects_names_without_telemetry() {
        for name in [
            "",
            "readme.txt",
            "screenshot.png",
            "2023-12-27[22-24].png",
            "2023-12-27[22-24]_1.0, 2.0, 3.0.png",
            "2023-12-27[22-24]_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0_1.0.jpg",
            "2023-12-27 22-24_1.0, 2.0, 3.0_0.0, 0.0, 0.0, 1.0_1.0.png",
        ] {
            assert_eq!(
                parse_screenshot_name(name),
                Err(ParseError::PatternMismatch),
                "{name:?} should not parse"
            );
        }
    }

    #[test]
    fn integer_components_parse_too() {
        let name = "2023-12-27[22-24]_100, -200, 300_0, 0, 0, 1_1 (2).png";
        let sighting = parse_screenshot_name(name).unwrap();
        assert_eq!(sighting.world.x, 100.0);
        assert_eq!(sighting.world.z, 300.0);
        assert_eq!(sighting.world.heading, Some(0.0));
    }
}
