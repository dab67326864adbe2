use crate::allocation::{self, check_coverage, AllocationOutcome, KeyLedMap, PitchCalibration};
use crate::calibration::{apply_cascade, CascadeOutcome};
use crate::config::{DistributionMode, MappingSettings};
use crate::diagnostics::{summarize, AdjustmentCounts, RangeWarning};
use crate::error::KlResult;
use crate::geometry::{note_name, KeyboardGeometry, PianoSize};
use crate::overrides::{apply_overrides, OverrideOutcome, Reallocation};
use crate::scorer::{build_report, OverlapScorer, QualityReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{debug, warn};

/// Everything a consumer may want to know about how a mapping came to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub mode: DistributionMode,
    pub pitch_mm: f64,
    pub counts: AdjustmentCounts,
    pub pitch_calibration: Option<PitchCalibration>,
    pub reallocations: Vec<Reallocation>,
    pub warnings: Vec<RangeWarning>,
    pub advisories: Vec<String>,
    pub leds_used: usize,
    pub unmapped_keys: usize,
}

/// The authoritative `midi note -> LED indices` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub piano_size: PianoSize,
    pub mapping: BTreeMap<u8, Vec<usize>>,
    pub diagnostics: Diagnostics,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    midi_note: u8,
    note: String,
    key_index: usize,
    led_count: usize,
    leds: &'a str,
}

impl MappingResult {
    pub fn leds_for_note(&self, midi_note: u8) -> &[usize] {
        self.mapping
            .get(&midi_note)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn to_json(&self) -> KlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> KlResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for (&midi_note, leds) in &self.mapping {
            let joined = leds
                .iter()
                .map(|l| l.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            wtr.serialize(CsvRow {
                midi_note,
                note: note_name(midi_note),
                key_index: self.piano_size.key_index(midi_note).unwrap_or_default(),
                led_count: leds.len(),
                leds: &joined,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Each stage of one assembly, in order.
#[derive(Debug, Clone)]
pub struct MappingPipeline {
    pub keyboard: KeyboardGeometry,
    pub allocation: AllocationOutcome,
    pub cascade: CascadeOutcome,
    pub overrides: OverrideOutcome,
}

impl MappingPipeline {
    /// Geometry, allocation, calibration cascade, then overrides. Configuration errors abort
    /// before anything is allocated.
    pub fn run(settings: &MappingSettings) -> KlResult<Self> {
        settings.validate()?;

        let keyboard = KeyboardGeometry::build(settings.piano_size, &settings.geometry)?;
        let allocation = allocation::allocate(settings, &keyboard)?;
        let cascade = apply_cascade(&allocation.allocation, &settings.calibration, settings.range);
        let overrides = apply_overrides(
            &cascade.mapping,
            &settings.calibration.led_selection_overrides,
            settings.range,
        );

        Ok(Self {
            keyboard,
            allocation,
            cascade,
            overrides,
        })
    }

    /// key index -> LEDs after overrides.
    pub fn final_map(&self) -> &KeyLedMap {
        &self.overrides.mapping
    }

    /// key index -> LEDs after the calibration cascade, before any override.
    pub fn pre_override_map(&self) -> &KeyLedMap {
        &self.cascade.mapping
    }

    pub fn into_result(self, settings: &MappingSettings) -> MappingResult {
        let piano_size = settings.piano_size;
        let final_map = &self.overrides.mapping;

        let mut warnings = self.allocation.warnings;
        warnings.extend(self.cascade.warnings);
        warnings.extend(self.overrides.warnings);

        let coverage = check_coverage(final_map, settings.range);
        debug_assert!(coverage.out_of_range.is_empty());

        let mapping: BTreeMap<u8, Vec<usize>> = final_map
            .iter()
            .filter_map(|(&key_index, leds)| {
                piano_size
                    .midi_note(key_index)
                    .map(|note| (note, leds.clone()))
            })
            .collect();

        let counts = self.cascade.counts;
        let advisories = summarize(&counts, &warnings);
        if !warnings.is_empty() {
            warn!("Mapping assembled with {} range warnings", warnings.len());
        }
        debug!(
            "Mapping: {} notes, {} distinct LEDs, {} empty keys",
            mapping.len(),
            coverage.distinct_leds,
            coverage.empty_keys.len()
        );

        MappingResult {
            piano_size,
            mapping,
            diagnostics: Diagnostics {
                mode: settings.mode,
                pitch_mm: self.allocation.pitch_mm,
                counts,
                pitch_calibration: self.allocation.pitch_calibration,
                reallocations: self.overrides.reallocations,
                warnings,
                advisories,
                leds_used: coverage.distinct_leds,
                unmapped_keys: coverage.empty_keys.len(),
            },
        }
    }
}

/// Assembles the canonical mapping from one settings snapshot.
pub fn compute_mapping(settings: &MappingSettings) -> KlResult<MappingResult> {
    Ok(MappingPipeline::run(settings)?.into_result(settings))
}

/// Per-key coverage and symmetry of the final mapping.
pub fn quality_report(settings: &MappingSettings) -> KlResult<QualityReport> {
    let pipeline = MappingPipeline::run(settings)?;
    let scorer = OverlapScorer::new(&settings.geometry);
    Ok(build_report(
        &pipeline.keyboard,
        pipeline.final_map(),
        settings.range,
        &scorer,
        pipeline.allocation.pitch_mm,
        settings.geometry.strip_offset(),
    ))
}
