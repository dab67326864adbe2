use crate::allocation::KeyLedMap;
use crate::config::LedRange;
use crate::diagnostics::RangeWarning;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// An LED an override released, and the neighbour that picked it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reallocation {
    pub led: usize,
    pub from_key: usize,
    pub to_key: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideOutcome {
    pub mapping: KeyLedMap,
    pub reallocations: Vec<Reallocation>,
    pub warnings: Vec<RangeWarning>,
}

/// Replaces overridden keys' lists with the operator's selection.
///
/// Keys are handled in ascending order against the current state. An LED a key had before its
/// override but not in it moves to whichever direct neighbour (`key - 1`, `key + 1`) has LEDs
/// closest to it; the left neighbour wins a tie. Freed LEDs move once, never further.
pub fn apply_overrides(
    mapping: &KeyLedMap,
    overrides: &BTreeMap<usize, Vec<usize>>,
    range: LedRange,
) -> OverrideOutcome {
    let mut current = mapping.clone();
    let mut reallocations = Vec::new();
    let mut warnings = Vec::new();

    for (&key_index, requested) in overrides {
        let Some(previous) = current.get(&key_index).cloned() else {
            warnings.push(RangeWarning::UnknownKey {
                key_index,
                source: "led_selection_overrides".to_string(),
            });
            continue;
        };

        let mut selection: Vec<usize> = Vec::with_capacity(requested.len());
        for &led in requested {
            if range.contains(led) {
                selection.push(led);
            } else {
                warnings.push(RangeWarning::OverrideOutOfRange { key_index, led });
            }
        }
        selection.sort_unstable();
        selection.dedup();

        let freed: Vec<usize> = previous
            .into_iter()
            .filter(|led| selection.binary_search(led).is_err())
            .collect();

        current.insert(key_index, selection);

        for led in freed {
            match nearest_neighbor(&current, key_index, led) {
                Some(to_key) => {
                    if let Some(list) = current.get_mut(&to_key) {
                        insert_sorted(list, led);
                    }
                    reallocations.push(Reallocation {
                        led,
                        from_key: key_index,
                        to_key,
                    });
                }
                None => {
                    if let Some(list) = current.get_mut(&key_index) {
                        insert_sorted(list, led);
                    }
                    warnings.push(RangeWarning::NoNeighbor { key_index, led });
                }
            }
        }
    }

    if !overrides.is_empty() {
        debug!(
            "Overrides: {} keys, {} LEDs reallocated",
            overrides.len(),
            reallocations.len()
        );
    }

    OverrideOutcome {
        mapping: current,
        reallocations,
        warnings,
    }
}

/// Gap between `led` and the span a key's LEDs occupy; 0 inside the span.
fn distance_to_allocation(leds: &[usize], led: usize) -> usize {
    let (Some(&lo), Some(&hi)) = (leds.iter().min(), leds.iter().max()) else {
        return usize::MAX;
    };
    if led < lo {
        lo - led
    } else if led > hi {
        led - hi
    } else {
        0
    }
}

fn nearest_neighbor(mapping: &KeyLedMap, key_index: usize, led: usize) -> Option<usize> {
    let left = key_index
        .checked_sub(1)
        .filter(|k| mapping.contains_key(k));
    let right = Some(key_index + 1).filter(|k| mapping.contains_key(k));

    let distance = |k: usize| {
        mapping
            .get(&k)
            .map_or(usize::MAX, |leds| distance_to_allocation(leds, led))
    };

    match (left, right) {
        (Some(l), Some(r)) => {
            if distance(l) <= distance(r) {
                Some(l)
            } else {
                Some(r)
            }
        }
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

fn insert_sorted(list: &mut Vec<usize>, led: usize) {
    if !list.contains(&led) {
        let pos = list.partition_point(|&x| x < led);
        list.insert(pos, led);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_inside_span_is_zero() {
        assert_eq!(distance_to_allocation(&[10, 12, 14], 13), 0);
        assert_eq!(distance_to_allocation(&[10, 12, 14], 17), 3);
        assert_eq!(distance_to_allocation(&[], 17), usize::MAX);
    }

    #[test]
    fn test_tie_prefers_left() {
        let mapping = KeyLedMap::from([(0, vec![8]), (1, vec![]), (2, vec![12])]);
        assert_eq!(nearest_neighbor(&mapping, 1, 10), Some(0));
    }
}
