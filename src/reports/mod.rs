use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use keylight::api::MappingSubset;
use keylight::geometry::note_name;
use keylight::mapping::MappingResult;
use keylight::overrides::Reallocation;
use keylight::scorer::{QualityLabel, QualityReport};
use keylight::validation::ValidationReport;

fn join_leds(leds: &[usize]) -> String {
    leds.iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn label_color(label: QualityLabel) -> Color {
    match label {
        QualityLabel::Excellent => Color::Green,
        QualityLabel::Good => Color::Cyan,
        QualityLabel::Fair => Color::Yellow,
        QualityLabel::Poor => Color::Red,
    }
}

pub fn print_mapping_summary(result: &MappingResult) {
    let diag = &result.diagnostics;
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Mode").add_attribute(Attribute::Bold),
        Cell::new("Notes"),
        Cell::new("LEDs Used"),
        Cell::new("Unmapped").fg(Color::Red),
        Cell::new("Pitch mm"),
        Cell::new("Adjusted"),
        Cell::new("Warnings").fg(Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new(diag.mode.to_string()),
        Cell::new(result.mapping.len()),
        Cell::new(diag.leds_used),
        Cell::new(diag.unmapped_keys),
        Cell::new(format!("{:.4}", diag.pitch_mm)),
        Cell::new(diag.counts.total()),
        Cell::new(diag.warnings.len()),
    ]);
    for i in 1..=6 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    println!("{}", table);

    if let Some(cal) = &diag.pitch_calibration {
        println!(
            "📏 Pitch: theoretical {:.4} mm, calibrated {:.4} mm ({:+.2}%){}",
            cal.theoretical_pitch_mm,
            cal.calibrated_pitch_mm,
            cal.delta_percent,
            if cal.was_adjusted { " [regenerated]" } else { "" }
        );
    }
    for line in &diag.advisories {
        println!("⚠️  {}", line);
    }
}

pub fn print_validation_report(report: &ValidationReport) {
    let stats = &report.stats;
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    let rows: Vec<(&str, String)> = vec![
        (
            "Keys",
            format!(
                "{} ({} white, {} black)",
                stats.key_count, stats.white_keys, stats.black_keys
            ),
        ),
        ("Available LEDs", stats.available_leds.to_string()),
        (
            "LEDs per key",
            format!("{}..={}", stats.min_leds_per_key, stats.max_leds_per_key),
        ),
        ("Keys with extra LED", stats.keys_with_extra_led.to_string()),
        ("Keyboard length", format!("{:.1} mm", stats.keyboard_length_mm)),
        ("Strip span", format!("{:.1} mm", stats.strip_length_mm)),
        ("Theoretical pitch", format!("{:.4} mm", stats.theoretical_pitch_mm)),
        (
            "Calibrated pitch",
            stats
                .calibrated_pitch_mm
                .map_or_else(|| "-".to_string(), |p| format!("{:.4} mm", p)),
        ),
        ("LEDs used", stats.leds_used.to_string()),
        ("Unmapped keys", stats.unmapped_keys.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);

    if report.valid {
        println!("✅ Configuration is valid");
    } else {
        println!("❌ Configuration is invalid");
    }
    for e in &report.errors {
        println!("   error: {}", e);
    }
    for w in &report.warnings {
        println!("   warning: {}", w);
    }
    for r in &report.recommendations {
        println!("   💡 {}", r);
    }
}

pub fn print_quality_report(report: &QualityReport, worst: Option<QualityLabel>) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Key").add_attribute(Attribute::Bold),
        Cell::new("Note"),
        Cell::new("Kind"),
        Cell::new("LEDs"),
        Cell::new("Cover %"),
        Cell::new("Symmetry").fg(Color::Cyan),
        Cell::new("Over L"),
        Cell::new("Over R"),
        Cell::new("Label"),
    ]);

    for key in &report.keys {
        let cov = &key.coverage;
        if worst.is_some_and(|w| cov.label < w) {
            continue;
        }
        table.add_row(vec![
            Cell::new(key.key_index),
            Cell::new(note_name(key.midi_note)),
            Cell::new(key.kind.to_string()),
            Cell::new(key.led_count),
            Cell::new(format!("{:.1}", cov.coverage_percent)),
            Cell::new(format!("{:.3}", cov.symmetry_score)),
            Cell::new(format!("{:.2}", cov.overhang_left_mm)),
            Cell::new(format!("{:.2}", cov.overhang_right_mm)),
            Cell::new(cov.label.to_string()).fg(label_color(cov.label)),
        ]);
    }
    for i in [0, 3, 4, 5, 6, 7] {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    println!("{}", table);

    let l = &report.labels;
    println!(
        "Pitch {:.4} mm | excellent {} | good {} | fair {} | poor {} | mean score {:.3}",
        report.pitch_mm, l.excellent, l.good, l.fair, l.poor, report.average_score
    );
}

pub fn print_subset(subset: &MappingSubset) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Key").add_attribute(Attribute::Bold),
        Cell::new("Note"),
        Cell::new("LEDs"),
    ]);
    for key in &subset.keys {
        table.add_row(vec![
            Cell::new(key.key_index).set_alignment(CellAlignment::Right),
            Cell::new(note_name(key.midi_note)),
            Cell::new(join_leds(&key.leds)),
        ]);
    }
    println!("{}", table);
    if !subset.warnings.is_empty() {
        println!("⚠️  {} range warnings in the current mapping", subset.warnings.len());
    }
}

pub fn print_reallocations(reallocations: &[Reallocation]) {
    for r in reallocations {
        println!("🔀 LED {} moved from key {} to key {}", r.led, r.from_key, r.to_key);
    }
}
