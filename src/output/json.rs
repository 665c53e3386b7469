//! JSON report output

use crate::output::{OutputResult, Report};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Serializes a report as pretty-printed JSON with camelCase keys
pub fn format_json_report(report: &Report) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Writes a report as JSON to `output_path`, replacing any existing file
pub fn write_json_report(report: &Report, output_path: &Path) -> OutputResult<()> {
    let json = format_json_report(report)?;

    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    tracing::debug!("Wrote JSON report to {}", output_path.display());
    Ok(())
}
