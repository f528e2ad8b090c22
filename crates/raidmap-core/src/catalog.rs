//! Map document I/O and the copy-on-write snapshot store.
//!
//! The persisted document is a JSON array of map records. In memory each
//! map lives behind an `Arc`: the position pipeline clones the `Arc` per
//! query and keeps projecting from it even while a calibration edit
//! builds and swaps in a replacement. A snapshot is never mutated after
//! insertion, which is what makes the reads lock-free after the lookup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::affine::{rotate_world, MapTransform};
use crate::calibrate::{fit_affine, CalibrationPoint, FitError};
use crate::config::{ConfigError, MapConfig};

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error("unknown map {0:?}")]
    UnknownMap(String),
    #[error("map {map:?}: no calibration point with id {id:?}")]
    UnknownPoint { map: String, id: String },
}

/// Load a map document (JSON array of records) from disk.
pub fn load_maps(path: impl AsRef<Path>) -> Result<Vec<MapConfig>, CatalogError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write a map document to disk as pretty JSON.
pub fn save_maps(maps: &[MapConfig], path: impl AsRef<Path>) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(maps)?;
    fs::write(path, json)?;
    Ok(())
}

/// Thread-safe store of per-map config snapshots.
#[derive(Debug, Default)]
pub struct MapCatalog {
    maps: RwLock<HashMap<String, Arc<MapConfig>>>,
}

impl MapCatalog {
    /// Build the store from loaded records.
    ///
    /// Records that fail validation are kept so the editing flow can fix
    /// them; they only fail later, locally, when a projector is built.
    /// Records without a key cannot be addressed at all and are dropped.
    pub fn new(configs: Vec<MapConfig>) -> Self {
        let mut maps = HashMap::with_capacity(configs.len());
        for config in configs {
            if config.key.is_empty() {
                log::warn!(
                    "skipping map record with empty key (displayName {:?})",
                    config.display_name
                );
                continue;
            }
            if let Err(err) = config.validate() {
                log::warn!("map {:?} loaded with invalid config: {err}", config.key);
            }
            let key = config.key.clone();
            if maps.insert(key.clone(), Arc::new(config)).is_some() {
                log::warn!("duplicate map key {key:?}, keeping the later record");
            }
        }
        Self {
            maps: RwLock::new(maps),
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Ok(Self::new(load_maps(path)?))
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), CatalogError> {
        let mut records: Vec<Arc<MapConfig>> = self.maps.read().values().cloned().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        let views: Vec<&MapConfig> = records.iter().map(|r| r.as_ref()).collect();
        let json = serde_json::to_string_pretty(&views)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Current snapshot for `key`. The returned `Arc` stays valid across
    /// later edits.
    pub fn get(&self, key: &str) -> Option<Arc<MapConfig>> {
        self.maps.read().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.maps.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.maps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.read().is_empty()
    }

    /// Insert or replace a whole map record. Unlike loading, direct
    /// inserts must already be valid.
    pub fn insert(&self, config: MapConfig) -> Result<Arc<MapConfig>, CatalogError> {
        config.validate()?;
        let snapshot = Arc::new(config);
        self.maps
            .write()
            .insert(snapshot.key.clone(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Append a calibration point to `map`.
    pub fn add_point(
        &self,
        map: &str,
        point: CalibrationPoint,
    ) -> Result<Arc<MapConfig>, CatalogError> {
        self.edit(map, move |config| {
            config.calibration_points.push(point);
            Ok(())
        })
    }

    /// Replace the calibration point with `point.id` in `map`.
    pub fn replace_point(
        &self,
        map: &str,
        point: CalibrationPoint,
    ) -> Result<Arc<MapConfig>, CatalogError> {
        self.edit(map, move |config| {
            let slot = config
                .calibration_points
                .iter_mut()
                .find(|p| p.id == point.id)
                .ok_or_else(|| CatalogError::UnknownPoint {
                    map: config.key.clone(),
                    id: point.id.clone(),
                })?;
            *slot = point;
            Ok(())
        })
    }

    /// Remove the calibration point with `id` from `map`.
    pub fn remove_point(&self, map: &str, id: &str) -> Result<Arc<MapConfig>, CatalogError> {
        self.edit(map, |config| {
            let before = config.calibration_points.len();
            config.calibration_points.retain(|p| p.id != id);
            if config.calibration_points.len() == before {
                return Err(CatalogError::UnknownPoint {
                    map: config.key.clone(),
                    id: id.to_string(),
                });
            }
            Ok(())
        })
    }

    /// Re-derive `map`'s base transform from its calibration points.
    ///
    /// Game coordinates are pre-rotated by the map's legacy rotation so
    /// the fitted matrix composes with the same pre-step at projection
    /// time. On [`FitError`] the stored transform is left untouched.
    pub fn refit(&self, map: &str) -> Result<MapTransform, CatalogError> {
        let mut fitted = MapTransform::IDENTITY;
        self.edit(map, |config| {
            let pairs: Vec<_> = config
                .calibration_points
                .iter()
                .map(|p| (rotate_world(p.game(), config.rotation_degrees), p.target()))
                .collect();
            fitted = fit_affine(&pairs)?;
            config.base_transform = Some(fitted.to_array().to_vec());
            Ok(())
        })?;
        Ok(fitted)
    }

    /// Read-modify-validate-swap under the write lock. Readers holding
    /// the previous `Arc` never observe the draft.
    fn edit(
        &self,
        key: &str,
        apply: impl FnOnce(&mut MapConfig) -> Result<(), CatalogError>,
    ) -> Result<Arc<MapConfig>, CatalogError> {
        let mut maps = self.maps.write();
        let current = maps
            .get(key)
            .ok_or_else(|| CatalogError::UnknownMap(key.to_string()))?;
        let mut draft = MapConfig::clone(current);
        apply(&mut draft)?;
        draft.validate()?;
        let snapshot = Arc::new(draft);
        maps.insert(key.to_string(), Arc::clone(&snapshot));
        Ok(snapshot)
    }
}
