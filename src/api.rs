use crate::calibration::KeyTrim;
use crate::config::MappingSettings;
use crate::diagnostics::RangeWarning;
use crate::error::{KeyLightError, KlResult};
use crate::mapping::{compute_mapping, quality_report, MappingPipeline, MappingResult};
use crate::overrides::Reallocation;
use crate::scorer::QualityReport;
use crate::validation::{validate_config, ValidationReport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{error, info, warn};

/// Where resolved settings live. Every read hands out one coherent snapshot, and writes are
/// applied whole or not at all.
pub trait SettingsStore: Send + Sync {
    fn snapshot(&self) -> KlResult<MappingSettings>;

    /// Runs `mutate` on a copy of the current settings and commits the copy only if it
    /// returns `Ok`. Returns the committed settings.
    fn update<F>(&self, mutate: F) -> KlResult<MappingSettings>
    where
        F: FnOnce(&mut MappingSettings) -> KlResult<()>;
}

fn poisoned<E: std::fmt::Display>(e: E) -> KeyLightError {
    KeyLightError::Store(e.to_string())
}

#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    settings: RwLock<MappingSettings>,
}

impl InMemorySettingsStore {
    pub fn new(settings: MappingSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn snapshot(&self) -> KlResult<MappingSettings> {
        Ok(self.settings.read().map_err(poisoned)?.clone())
    }

    fn update<F>(&self, mutate: F) -> KlResult<MappingSettings>
    where
        F: FnOnce(&mut MappingSettings) -> KlResult<()>,
    {
        let mut guard = self.settings.write().map_err(poisoned)?;
        let mut next = guard.clone();
        mutate(&mut next)?;
        *guard = next.clone();
        Ok(next)
    }
}

/// Settings kept in a JSON file. Reads come from the cached copy; every committed update is
/// written through before it becomes visible.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    cache: RwLock<MappingSettings>,
}

impl JsonFileStore {
    /// Loads `path`, or starts from defaults when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> KlResult<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            MappingSettings::load_from_file(&path)?
        } else {
            MappingSettings::default()
        };
        Ok(Self {
            path,
            cache: RwLock::new(settings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn snapshot(&self) -> KlResult<MappingSettings> {
        Ok(self.cache.read().map_err(poisoned)?.clone())
    }

    fn update<F>(&self, mutate: F) -> KlResult<MappingSettings>
    where
        F: FnOnce(&mut MappingSettings) -> KlResult<()>,
    {
        let mut guard = self.cache.write().map_err(poisoned)?;
        let mut next = guard.clone();
        mutate(&mut next)?;
        next.save_to_file(&self.path)?;
        *guard = next.clone();
        Ok(next)
    }
}

/// What `refresh` handed to consumers.
#[derive(Debug, Clone)]
pub enum Published {
    Fresh(Arc<MappingResult>),
    /// The new settings could not be mapped; consumers keep the last good mapping.
    Stale {
        mapping: Arc<MappingResult>,
        error: String,
    },
}

impl Published {
    pub fn mapping(&self) -> &Arc<MappingResult> {
        match self {
            Published::Fresh(mapping) => mapping,
            Published::Stale { mapping, .. } => mapping,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Published::Stale { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyLeds {
    pub key_index: usize,
    pub midi_note: u8,
    pub leds: Vec<usize>,
}

/// The keys an operation can have changed, read from the mapping published after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSubset {
    pub keys: Vec<KeyLeds>,
    pub stale: bool,
    pub warnings: Vec<RangeWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideUpdate {
    pub subset: MappingSubset,
    /// LEDs this key released and the neighbour each went to.
    pub reallocations: Vec<Reallocation>,
}

/// Recomputes and publishes the canonical mapping whenever settings change.
///
/// Readers get an `Arc` to an immutable mapping and swap to the next one on their own schedule;
/// a published mapping is never modified in place.
pub struct MappingService<S: SettingsStore> {
    store: S,
    published: RwLock<Option<Arc<MappingResult>>>,
    /// Held from snapshot to publish so an older snapshot never replaces a newer mapping.
    refresh_lock: Mutex<()>,
}

impl<S: SettingsStore> MappingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            published: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> KlResult<MappingSettings> {
        self.store.snapshot()
    }

    /// Maps the current settings without publishing anything.
    pub fn compute_mapping(&self) -> KlResult<MappingResult> {
        compute_mapping(&self.store.snapshot()?)
    }

    pub fn validate(&self, candidate: &MappingSettings) -> ValidationReport {
        validate_config(candidate)
    }

    pub fn quality_report(&self) -> KlResult<QualityReport> {
        quality_report(&self.store.snapshot()?)
    }

    /// The mapping consumers should currently use, if one was ever published.
    pub fn published(&self) -> KlResult<Option<Arc<MappingResult>>> {
        Ok(self.published.read().map_err(poisoned)?.clone())
    }

    /// Recomputes from one snapshot and publishes the result. A fatal error keeps the last good
    /// mapping published and reports it as stale.
    pub fn refresh(&self) -> KlResult<Published> {
        let _guard = self.refresh_lock.lock().map_err(poisoned)?;
        let settings = self.store.snapshot()?;
        match compute_mapping(&settings) {
            Ok(result) => {
                let result = Arc::new(result);
                info!(
                    "Published mapping: {} notes, {} LEDs, mode {}",
                    result.mapping.len(),
                    result.diagnostics.leds_used,
                    result.diagnostics.mode
                );
                *self.published.write().map_err(poisoned)? = Some(Arc::clone(&result));
                Ok(Published::Fresh(result))
            }
            Err(e) => match self.published()? {
                Some(mapping) => {
                    warn!("Mapping rejected, keeping last good mapping: {}", e);
                    Ok(Published::Stale {
                        mapping,
                        error: e.to_string(),
                    })
                }
                None => {
                    error!("Mapping rejected and nothing to fall back to: {}", e);
                    Err(e)
                }
            },
        }
    }

    // === GLOBAL OFFSET ===

    pub fn get_global_offset(&self) -> KlResult<i32> {
        Ok(self.store.snapshot()?.calibration.global_offset)
    }

    pub fn set_global_offset(&self, offset: i32) -> KlResult<MappingSubset> {
        self.store.update(|s| s.calibration.set_global_offset(offset))?;
        self.publish_subset(|_| true)
    }

    pub fn clear_global_offset(&self) -> KlResult<MappingSubset> {
        self.set_global_offset(0)
    }

    // === KEY OFFSETS ===

    pub fn get_key_offset(&self, key_index: usize) -> KlResult<i32> {
        let settings = self.store.snapshot()?;
        check_key(&settings, key_index)?;
        Ok(settings.calibration.key_offset(key_index))
    }

    /// Key offsets cascade, so every key from `key_index` up may move.
    pub fn set_key_offset(&self, key_index: usize, offset: i32) -> KlResult<MappingSubset> {
        self.store.update(|s| {
            check_key(s, key_index)?;
            s.calibration.set_key_offset(key_index, offset)
        })?;
        self.publish_subset(|k| k >= key_index)
    }

    pub fn clear_key_offset(&self, key_index: usize) -> KlResult<MappingSubset> {
        self.store.update(|s| {
            check_key(s, key_index)?;
            s.calibration.clear_key_offset(key_index);
            Ok(())
        })?;
        self.publish_subset(|k| k >= key_index)
    }

    // === TRIMS ===

    pub fn get_key_trim(&self, key_index: usize) -> KlResult<KeyTrim> {
        let settings = self.store.snapshot()?;
        check_key(&settings, key_index)?;
        Ok(settings.calibration.key_trim(key_index))
    }

    pub fn set_key_trim(&self, key_index: usize, trim: KeyTrim) -> KlResult<MappingSubset> {
        self.store.update(|s| {
            check_key(s, key_index)?;
            s.calibration.set_key_trim(key_index, trim);
            Ok(())
        })?;
        self.publish_subset(|k| k == key_index)
    }

    pub fn clear_key_trim(&self, key_index: usize) -> KlResult<MappingSubset> {
        self.store.update(|s| {
            check_key(s, key_index)?;
            s.calibration.clear_key_trim(key_index);
            Ok(())
        })?;
        self.publish_subset(|k| k == key_index)
    }

    // === WELDS ===

    pub fn get_weld_offset(&self, led: usize) -> KlResult<i32> {
        let settings = self.store.snapshot()?;
        Ok(settings
            .calibration
            .weld_offsets
            .get(&led)
            .copied()
            .unwrap_or(0))
    }

    pub fn set_weld_offset(&self, led: usize, compensation: i32) -> KlResult<MappingSubset> {
        self.store.update(|s| {
            check_led(s, led)?;
            s.calibration.set_weld_offset(led, compensation);
            Ok(())
        })?;
        self.publish_subset(|_| true)
    }

    pub fn clear_weld_offset(&self, led: usize) -> KlResult<MappingSubset> {
        self.store.update(|s| {
            s.calibration.clear_weld_offset(led);
            Ok(())
        })?;
        self.publish_subset(|_| true)
    }

    // === LED SELECTION OVERRIDES ===

    pub fn get_led_override(&self, key_index: usize) -> KlResult<Option<Vec<usize>>> {
        let settings = self.store.snapshot()?;
        check_key(&settings, key_index)?;
        Ok(settings.calibration.led_override(key_index).map(<[usize]>::to_vec))
    }

    pub fn set_led_override(&self, key_index: usize, leds: Vec<usize>) -> KlResult<OverrideUpdate> {
        self.store.update(|s| {
            check_key(s, key_index)?;
            s.calibration.set_led_override(key_index, leds);
            Ok(())
        })?;
        self.publish_override(key_index)
    }

    /// Flips one LED of the key's selection as currently mapped. Returns whether the LED is now
    /// selected, with the resulting update.
    pub fn toggle_led(&self, key_index: usize, led: usize) -> KlResult<(bool, OverrideUpdate)> {
        let mut selected = false;
        self.store.update(|s| {
            check_key(s, key_index)?;
            let pipeline = MappingPipeline::run(s)?;
            let current = pipeline
                .final_map()
                .get(&key_index)
                .cloned()
                .unwrap_or_default();
            selected = s.calibration.toggle_led(key_index, led, &current);
            Ok(())
        })?;
        Ok((selected, self.publish_override(key_index)?))
    }

    pub fn clear_led_override(&self, key_index: usize) -> KlResult<OverrideUpdate> {
        self.store.update(|s| {
            check_key(s, key_index)?;
            s.calibration.clear_led_override(key_index);
            Ok(())
        })?;
        self.publish_override(key_index)
    }

    fn publish_override(&self, key_index: usize) -> KlResult<OverrideUpdate> {
        let published = self.refresh()?;
        let subset = subset_of(&published, |k| k + 1 >= key_index && k <= key_index + 1);
        let reallocations = published
            .mapping()
            .diagnostics
            .reallocations
            .iter()
            .filter(|r| r.from_key == key_index)
            .copied()
            .collect();
        Ok(OverrideUpdate {
            subset,
            reallocations,
        })
    }

    fn publish_subset<F: Fn(usize) -> bool>(&self, affected: F) -> KlResult<MappingSubset> {
        let published = self.refresh()?;
        Ok(subset_of(&published, affected))
    }
}

fn subset_of<F: Fn(usize) -> bool>(published: &Published, affected: F) -> MappingSubset {
    let result = published.mapping();
    let keys = result
        .mapping
        .iter()
        .filter_map(|(&midi_note, leds)| {
            let key_index = result.piano_size.key_index(midi_note)?;
            affected(key_index).then(|| KeyLeds {
                key_index,
                midi_note,
                leds: leds.clone(),
            })
        })
        .collect();

    MappingSubset {
        keys,
        stale: published.is_stale(),
        warnings: result.diagnostics.warnings.clone(),
    }
}

fn check_key(settings: &MappingSettings, key_index: usize) -> KlResult<()> {
    let key_count = settings.key_count();
    if key_index >= key_count {
        return Err(KeyLightError::Config(format!(
            "key index {} is outside a {}-key piano",
            key_index, key_count
        )));
    }
    Ok(())
}

fn check_led(settings: &MappingSettings, led: usize) -> KlResult<()> {
    if led >= settings.range.led_count {
        return Err(KeyLightError::Config(format!(
            "LED {} is outside a strip of {} LEDs",
            led, settings.range.led_count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_update_commits_nothing() {
        let store = InMemorySettingsStore::default();
        let result = store.update(|s| {
            s.calibration.global_offset = 7;
            Err(KeyLightError::Config("rejected".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(store.snapshot().unwrap().calibration.global_offset, 0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let service = MappingService::new(InMemorySettingsStore::default());
        assert!(service.set_key_offset(88, 1).is_err());
        assert!(service.get_key_trim(200).is_err());
    }
}
