//! Per-map tracking session: parse, project, remember.

use raidmap_core::{
    ConfigError, MapConfig, MapProjector, ScreenPosition, TrackerSettings, Trail, WorldPosition,
};
use raidmap_telemetry::{parse_screenshot_name, ParseError};

/// Errors from [`Session`]. Both variants are local to one sample or one
/// config swap; the session stays usable.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One map's live tracking state: a projector plus the recent-position
/// trail.
///
/// The host detects screenshot files and feeds their names in one at a
/// time; the session does everything downstream of the filename. It is
/// the single-producer consumer the core is designed around and holds no
/// locks of its own.
#[derive(Clone, Debug)]
pub struct Session {
    projector: MapProjector,
    trail: Trail,
}

impl Session {
    pub fn new(config: &MapConfig, settings: &TrackerSettings) -> Result<Self, SessionError> {
        let projector = MapProjector::new(config, settings.debounce_threshold)?;
        Ok(Self {
            projector,
            trail: Trail::new(settings.trail_limit),
        })
    }

    /// Parse a screenshot filename, project it and append to the trail.
    pub fn record(&mut self, screenshot_name: &str) -> Result<ScreenPosition, SessionError> {
        let sighting = parse_screenshot_name(screenshot_name)?;
        Ok(self.record_world(&sighting.world))
    }

    /// Project an already-parsed reading and append it to the trail.
    pub fn record_world(&mut self, world: &WorldPosition) -> ScreenPosition {
        let position = self.projector.project(world);
        self.trail.push(position.clone());
        position
    }

    pub fn map_key(&self) -> &str {
        self.projector.map_key()
    }

    pub fn latest(&self) -> Option<&ScreenPosition> {
        self.trail.latest()
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn projector(&self) -> &MapProjector {
        &self.projector
    }

    /// Swap in an edited config snapshot (calibration updated signal).
    ///
    /// The trail is kept: already-projected positions stay where the old
    /// calibration put them.
    pub fn apply_config(&mut self, config: &MapConfig) -> Result<(), SessionError> {
        self.projector.apply_config(config)?;
        Ok(())
    }

    pub fn clear_trail(&mut self) {
        self.trail.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raidmap_core::CalibrationPoint;

    fn customs() -> MapConfig {
        MapConfig {
            display_name: "Customs".to_string(),
            base_transform: Some(vec![1.0, 0.0, 0.0, -1.0, 0.0, 1000.0]),
            ..MapConfig::new("customs")
        }
    }

    fn shot(x: f64, z: f64) -> String {
        format!("2023-12-27[22-24]_{x}, 0.0, {z}_0.0, 0.0, 0.0, 1.0_1.0.png")
    }

    #[test]
    fn records_screenshot_to_pixel() {
        let mut session = Session::new(&customs(), &TrackerSettings::default()).unwrap();
        let pos = session.record(&shot(200.0, 300.0)).unwrap();
        assert_eq!((pos.x, pos.y), (200.0, 700.0));
        assert_eq!(pos.map_key, "customs");
        assert_eq!(pos.heading, Some(0.0));
        assert_eq!(session.latest(), Some(&pos));
    }

    #[test]
    fn malformed_name_leaves_trail_untouched() {
        let mut session = Session::new(&customs(), &TrackerSettings::default()).unwrap();
        session.record(&shot(1.0, 2.0)).unwrap();
        assert!(matches!(
            session.record("not-a-screenshot.png"),
            Err(SessionError::Parse(_))
        ));
        assert_eq!(session.trail().len(), 1);
    }

    #[test]
    fn trail_respects_settings_limit() {
        let settings = TrackerSettings {
            trail_limit: 2,
            ..TrackerSettings::default()
        };
        let mut session = Session::new(&customs(), &settings).unwrap();
        for i in 0..4 {
            session.record(&shot(i as f64, 0.0)).unwrap();
        }
        assert_eq!(session.trail().len(), 2);
        assert_eq!(session.latest().unwrap().x, 3.0);
    }

    #[test]
    fn calibration_update_changes_later_projections_only() {
        let mut session = Session::new(&customs(), &TrackerSettings::default()).unwrap();
        let before = session.record(&shot(200.0, 300.0)).unwrap();
        assert_eq!((before.x, before.y), (200.0, 700.0));

        let mut edited = customs();
        edited.calibration_points = vec![CalibrationPoint {
            id: "cp1".to_string(),
            name: String::new(),
            game_x: 200.0,
            game_z: 300.0,
            target_x: 220.0,
            target_y: 680.0,
        }];
        session.apply_config(&edited).unwrap();

        let after = session.record(&shot(200.0, 300.0)).unwrap();
        assert_eq!((after.x, after.y), (220.0, 680.0));
        // The earlier projection is still in the trail, unchanged.
        let xs: Vec<f64> = session.trail().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![200.0, 220.0]);
    }

    #[test]
    fn invalid_map_is_rejected_at_construction() {
        let broken = MapConfig::new("woods");
        assert!(matches!(
            Session::new(&broken, &TrackerSettings::default()),
            Err(SessionError::Config(ConfigError::MissingTransform { .. }))
        ));
    }
}
