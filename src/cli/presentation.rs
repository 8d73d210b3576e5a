//! CLI presentation: text and json formatters per command.

use crate::api::GenerationReport;
use crate::error::DdlError;
use crate::generation::{GenerationConfig, PropertyConflict};
use crate::provider::UnitDescriptor;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, DdlError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DdlError::Configuration(format!("Failed to render JSON output: {}", e)))
}

fn conflict_lines(conflicts: &[PropertyConflict], out: &mut String) {
    if conflicts.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}\n", "Overridden properties".yellow().bold()));
    for c in conflicts {
        let previous = c.previous.as_deref().unwrap_or("<unset>");
        let (previous, value) = if crate::generation::keys::is_secret(&c.key) {
            ("********", "********")
        } else {
            (previous, c.value.as_str())
        };
        out.push_str(&format!("  {}: '{}' -> '{}'\n", c.key, previous, value));
    }
}

pub fn format_report_text(report: &GenerationReport) -> String {
    let mut out = format!(
        "{} persistence unit '{}' ({} ms)\n",
        "Generated".green().bold(),
        report.unit,
        report.duration_ms()
    );
    match &report.scripts.create_script {
        Some(path) => out.push_str(&format!("  create: {}\n", path.display())),
        None => out.push_str("  create: (not requested)\n"),
    }
    match &report.scripts.drop_script {
        Some(path) => out.push_str(&format!("  drop:   {}\n", path.display())),
        None => out.push_str("  drop:   (not requested)\n"),
    }
    conflict_lines(&report.conflicts, &mut out);
    out.trim_end().to_string()
}

pub fn format_report_json(report: &GenerationReport) -> Result<String, DdlError> {
    let conflicts: Vec<_> = report.conflicts.iter().map(masked_conflict).collect();
    to_json(&json!({
        "status": "succeeded",
        "unit": report.unit,
        "output_dir": report.output_dir,
        "create_script": report.scripts.create_script,
        "drop_script": report.scripts.drop_script,
        "conflicts": conflicts,
        "started_at": report.started_at,
        "finished_at": report.finished_at,
        "duration_ms": report.duration_ms(),
    }))
}

fn masked_conflict(c: &PropertyConflict) -> serde_json::Value {
    if crate::generation::keys::is_secret(&c.key) {
        json!({ "key": c.key, "previous": "********", "value": "********" })
    } else {
        json!({ "key": c.key, "previous": c.previous, "value": c.value })
    }
}

pub fn format_config_text(config: &GenerationConfig, conflicts: &[PropertyConflict]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Value"]);
    for (key, value) in config.masked().iter() {
        table.add_row(vec![key.to_string(), value.unwrap_or("<unset>").to_string()]);
    }
    let mut out = table.to_string();
    out.push('\n');
    conflict_lines(conflicts, &mut out);
    out.trim_end().to_string()
}

pub fn format_config_json(
    config: &GenerationConfig,
    conflicts: &[PropertyConflict],
) -> Result<String, DdlError> {
    let entries: serde_json::Map<String, serde_json::Value> = config
        .masked()
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    let conflicts: Vec<_> = conflicts.iter().map(masked_conflict).collect();
    to_json(&json!({ "config": entries, "conflicts": conflicts }))
}

pub fn format_units_text(units: &[UnitDescriptor]) -> String {
    if units.is_empty() {
        return "No persistence units found".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Unit", "Transaction", "Mapping files", "Classes", "Declared in"]);
    for unit in units {
        table.add_row(vec![
            unit.name.clone(),
            unit.transaction_type.clone().unwrap_or_else(|| "-".to_string()),
            unit.mapping_files.len().to_string(),
            unit.classes.len().to_string(),
            unit.source.clone(),
        ]);
    }
    table.to_string()
}

pub fn format_units_json(units: &[UnitDescriptor]) -> Result<String, DdlError> {
    to_json(units)
}
