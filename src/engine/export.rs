//! Export writers: JSON document, CSV of selected fields, `protocol://ip:port` lines.

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::{Value, json};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::utils::config::{EXPORT_FILE_PREFIX, EXPORT_TIMESTAMP_FORMAT};
use crate::{AggregateResult, ExportFormat, Record};

/// Default export file name: `quake_results_<YYYYmmdd_HHMMSS>.<ext>`.
pub fn generate_filename(format: ExportFormat) -> String {
    let timestamp = chrono::Local::now().format(EXPORT_TIMESTAMP_FORMAT);
    format!("{EXPORT_FILE_PREFIX}_{timestamp}.{}", format.extension())
}

/// Aggregate in the API's response shape, as written by [`export_json`].
pub fn response_document(result: &AggregateResult) -> Value {
    json!({
        "code": 0,
        "data": result.items,
        "meta": result.metadata,
        "message": "Success",
        "timestamp": chrono::Local::now().timestamp(),
    })
}

/// Write `result` to `path` in `format`. Returns false when there was nothing to write.
pub fn export(
    result: &AggregateResult,
    format: ExportFormat,
    fields: &[String],
    path: &Path,
) -> Result<bool> {
    info!("Exporting {:?} to {}", format, path.display());
    let written = match format {
        ExportFormat::Json => export_json(result, path).map(|_| true),
        ExportFormat::Csv => export_csv(result, fields, path),
        ExportFormat::Url => export_urls(result, path),
    }
    .with_context(|| format!("export {:?} to {}", format, path.display()))?;
    if written {
        info!("Export successful");
    }
    Ok(written)
}

pub fn export_json(result: &AggregateResult, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, &response_document(result))?;
    out.flush()?;
    Ok(())
}

/// Header row of `fields`, then one row per record. Skips the file entirely when there are
/// no records.
pub fn export_csv(result: &AggregateResult, fields: &[String], path: &Path) -> Result<bool> {
    if result.items.is_empty() {
        warn!("Empty results set; nothing to export");
        return Ok(false);
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(fields)?;
    for item in &result.items {
        writer.write_record(extract_row(item, fields))?;
    }
    writer.flush()?;
    Ok(true)
}

/// One `protocol://ip:port` line per record that has both ip and port.
pub fn export_urls(result: &AggregateResult, path: &Path) -> Result<bool> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut lines = 0_usize;
    for url in result.items.iter().filter_map(record_url) {
        writeln!(out, "{url}")?;
        lines += 1;
    }
    out.flush()?;
    if lines == 0 {
        warn!("No record had both ip and port; URL file is empty");
    }
    Ok(true)
}

/// Cell values for `fields`. Dotted names walk nested objects; misses are empty.
pub fn extract_row(item: &Record, fields: &[String]) -> Vec<String> {
    fields
        .iter()
        .map(|field| nested_value(item, field).map(cell).unwrap_or_default())
        .collect()
}

/// Look up a dotted path (`service.name`) in a record.
pub fn nested_value<'a>(item: &'a Record, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(item, |value, part| value.get(part))
}

/// Render a value for a table cell: strings as-is, null as empty, nested values as JSON.
pub fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        _ => value.to_string(),
    }
}

/// `protocol://ip:port` for a record. Protocol comes from `service.name` (default http);
/// `http/ssl` and `https` become https.
pub fn record_url(item: &Record) -> Option<String> {
    let ip = item.get("ip").map(cell).filter(|s| !s.is_empty())?;
    let port = item
        .get("port")
        .map(cell)
        .filter(|s| !s.is_empty() && s != "0")?;
    let protocol = nested_value(item, "service.name")
        .and_then(Value::as_str)
        .unwrap_or("http")
        .to_lowercase();
    let protocol = match protocol.as_str() {
        "http/ssl" | "https" => "https".to_string(),
        _ => protocol,
    };
    Some(format!("{protocol}://{ip}:{port}"))
}
