//! Floor-band detection with hysteresis for multi-level maps.
//!
//! World height (`y`) picks the active map layer. Raw height samples
//! flicker near stair and boundary regions, so a floor change only
//! commits after the same new band matches a run of consecutive samples.

use serde::{Deserialize, Serialize};

/// Consecutive samples a new band must match before it becomes current.
pub const DEFAULT_DEBOUNCE_THRESHOLD: u32 = 3;

/// One height interval of a multi-level map, `[min_height, max_height)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorBand {
    pub layer_id: String,
    #[serde(default)]
    pub display_name: String,
    /// Integer rank used to break overlap ties; lower is "below".
    pub order: i32,
    pub min_height: f64,
    pub max_height: f64,
    #[serde(default)]
    pub is_default: bool,
}

impl FloorBand {
    pub fn contains(&self, height: f64) -> bool {
        self.min_height <= height && height < self.max_height
    }
}

/// Per-map floor state machine.
///
/// With no bands configured the detector is a no-op that reports no
/// layer; the map has a single implicit floor.
#[derive(Clone, Debug)]
pub struct FloorDetector {
    bands: Vec<FloorBand>,
    current: Option<usize>,
    pending: Option<usize>,
    pending_count: u32,
    debounce_threshold: u32,
}

impl FloorDetector {
    /// Starts on the band marked `is_default`, or the lowest `order` when
    /// none is marked.
    pub fn new(bands: Vec<FloorBand>, debounce_threshold: u32) -> Self {
        let current = initial_band(&bands);
        Self {
            bands,
            current,
            pending: None,
            pending_count: 0,
            debounce_threshold,
        }
    }

    pub fn with_default_debounce(bands: Vec<FloorBand>) -> Self {
        Self::new(bands, DEFAULT_DEBOUNCE_THRESHOLD)
    }

    /// The band reported to consumers right now.
    pub fn current(&self) -> Option<&FloorBand> {
        self.current.map(|i| &self.bands[i])
    }

    pub fn bands(&self) -> &[FloorBand] {
        &self.bands
    }

    pub fn debounce_threshold(&self) -> u32 {
        self.debounce_threshold
    }

    /// Feed one height sample and get the (possibly debounced) active band.
    ///
    /// Heights outside every band, NaN included, leave both the current
    /// floor and any in-progress transition untouched; a brief gap in the
    /// bands must not cancel a change the player is actually making.
    pub fn update(&mut self, height: f64) -> Option<&FloorBand> {
        match self.match_band(height) {
            None => {}
            Some(matched) if Some(matched) == self.current => {
                self.pending = None;
                self.pending_count = 0;
            }
            Some(matched) => {
                if self.pending == Some(matched) {
                    self.pending_count += 1;
                } else {
                    self.pending = Some(matched);
                    self.pending_count = 1;
                }
                if self.pending_count >= self.debounce_threshold {
                    self.current = Some(matched);
                    self.pending = None;
                    self.pending_count = 0;
                }
            }
        }
        self.current()
    }

    /// Band containing `height`. Overlaps resolve to the band whose order
    /// is closest to the current floor's, ties to the lower order.
    fn match_band(&self, height: f64) -> Option<usize> {
        let current_order = self.current.map(|i| self.bands[i].order);
        self.bands
            .iter()
            .enumerate()
            .filter(|(_, band)| band.contains(height))
            .min_by_key(|(_, band)| {
                let proximity = current_order.map_or(0, |o| (band.order - o).abs());
                (proximity, band.order)
            })
            .map(|(index, _)| index)
    }
}

fn initial_band(bands: &[FloorBand]) -> Option<usize> {
    if bands.is_empty() {
        return None;
    }
    bands.iter().position(|band| band.is_default).or_else(|| {
        bands
            .iter()
            .enumerate()
            .min_by_key(|(_, band)| band.order)
            .map(|(index, _)| index)
    })
}
