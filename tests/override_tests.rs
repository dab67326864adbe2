use keylight::allocation::KeyLedMap;
use keylight::config::LedRange;
use keylight::diagnostics::RangeWarning;
use keylight::overrides::{apply_overrides, Reallocation};
use std::collections::BTreeMap;

fn range() -> LedRange {
    LedRange::new(0, 199, 200)
}

fn neighbourhood() -> KeyLedMap {
    KeyLedMap::from([
        (9, vec![90, 91]),
        (10, vec![92, 93, 94]),
        (11, vec![95, 96]),
    ])
}

#[test]
fn test_freed_led_goes_to_nearer_neighbour() {
    let overrides = BTreeMap::from([(10, vec![92, 93])]);
    let out = apply_overrides(&neighbourhood(), &overrides, range());

    assert_eq!(out.mapping[&9], vec![90, 91]);
    assert_eq!(out.mapping[&10], vec![92, 93]);
    assert_eq!(out.mapping[&11], vec![94, 95, 96]);
    assert_eq!(
        out.reallocations,
        vec![Reallocation {
            led: 94,
            from_key: 10,
            to_key: 11
        }]
    );
    assert!(out.warnings.is_empty());
}

#[test]
fn test_freed_leds_split_between_neighbours() {
    let overrides = BTreeMap::from([(10, vec![93])]);
    let out = apply_overrides(&neighbourhood(), &overrides, range());

    assert_eq!(out.mapping[&9], vec![90, 91, 92]);
    assert_eq!(out.mapping[&10], vec![93]);
    assert_eq!(out.mapping[&11], vec![94, 95, 96]);
    assert_eq!(out.reallocations.len(), 2);
}

#[test]
fn test_equal_distance_prefers_lower_key() {
    let base = KeyLedMap::from([(0, vec![8]), (1, vec![10]), (2, vec![12])]);
    let overrides = BTreeMap::from([(1, vec![])]);
    let out = apply_overrides(&base, &overrides, range());

    assert_eq!(out.mapping[&0], vec![8, 10]);
    assert!(out.mapping[&1].is_empty());
    assert_eq!(out.mapping[&2], vec![12]);
}

#[test]
fn test_override_can_take_leds_without_removing_them() {
    let overrides = BTreeMap::from([(10, vec![91, 92, 93, 94])]);
    let out = apply_overrides(&neighbourhood(), &overrides, range());

    assert_eq!(out.mapping[&10], vec![91, 92, 93, 94]);
    assert_eq!(out.mapping[&9], vec![90, 91]);
    assert!(out.reallocations.is_empty());
}

#[test]
fn test_out_of_range_override_leds_are_dropped() {
    let overrides = BTreeMap::from([(10, vec![92, 93, 94, 250])]);
    let out = apply_overrides(&neighbourhood(), &overrides, range());

    assert_eq!(out.mapping[&10], vec![92, 93, 94]);
    assert_eq!(
        out.warnings,
        vec![RangeWarning::OverrideOutOfRange {
            key_index: 10,
            led: 250
        }]
    );
}

#[test]
fn test_lone_key_keeps_led_without_neighbour() {
    let base = KeyLedMap::from([(0, vec![1, 2])]);
    let overrides = BTreeMap::from([(0, vec![1])]);
    let out = apply_overrides(&base, &overrides, range());

    assert_eq!(out.mapping[&0], vec![1, 2]);
    assert!(matches!(
        out.warnings.as_slice(),
        [RangeWarning::NoNeighbor { key_index: 0, led: 2 }]
    ));
}

#[test]
fn test_overrides_apply_in_key_order_against_current_state() {
    // Key 10 frees 94 to key 11; key 11's own override then drops it again.
    let overrides = BTreeMap::from([(10, vec![92, 93]), (11, vec![95, 96])]);
    let base = KeyLedMap::from([
        (9, vec![90, 91]),
        (10, vec![92, 93, 94]),
        (11, vec![95, 96]),
        (12, vec![97, 98]),
    ]);
    let out = apply_overrides(&base, &overrides, range());

    assert_eq!(out.mapping[&11], vec![95, 96]);
    // 94 is nearer to key 10's remaining [92, 93] than to key 12's [97, 98].
    assert_eq!(out.mapping[&10], vec![92, 93, 94]);
    assert_eq!(out.reallocations.len(), 2);
}

#[test]
fn test_override_for_unknown_key_is_ignored() {
    let overrides = BTreeMap::from([(50, vec![1])]);
    let out = apply_overrides(&neighbourhood(), &overrides, range());
    assert_eq!(out.mapping, neighbourhood());
    assert_eq!(out.warnings.len(), 1);
}
