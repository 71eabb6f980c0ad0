//! Analysis JSON export.
//!
//! The exported file is the downloadable artifact of a run: the normalized
//! `AnalysisResult`, pretty-printed, named after the app and the UTC time of
//! the export. The same format is read back by `insights show`.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::AnalysisResult;
use crate::error::AppError;

/// `microsoft_teams_analysis_20261018_091500.json`
pub fn export_file_name(app_name: &str, at: DateTime<Utc>) -> String {
    format!("{}_analysis_{}.json", slug(app_name), at.format("%Y%m%d_%H%M%S"))
}

/// Lowercase ASCII alphanumerics joined by single underscores.
fn slug(name: &str) -> String {
    let mut out = String::new();
    for word in name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push('_');
        }
        out.push_str(&word.to_ascii_lowercase());
    }
    if out.is_empty() { "app".to_string() } else { out }
}

/// Pretty-printed JSON of the analysis.
pub fn analysis_json(analysis: &AnalysisResult) -> Result<String, AppError> {
    serde_json::to_string_pretty(analysis)
        .map_err(|e| AppError::new(2, format!("Failed to serialize analysis: {e}")))
}

/// Write the analysis into `dir` and return the created path.
pub fn write_analysis_json(
    dir: &Path,
    app_name: &str,
    analysis: &AnalysisResult,
    at: DateTime<Utc>,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let path = dir.join(export_file_name(app_name, at));
    let mut file = File::create(&path)
        .map_err(|e| AppError::new(2, format!("Failed to create analysis JSON '{}': {e}", path.display())))?;

    let json = analysis_json(analysis)?;
    writeln!(file, "{json}").map_err(|e| AppError::new(2, format!("Failed to write analysis JSON: {e}")))?;

    info!(path = %path.display(), "exported analysis");
    Ok(path)
}

/// Read an exported analysis JSON file.
pub fn read_analysis_json(path: &Path) -> Result<AnalysisResult, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open analysis JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid analysis JSON: {e}")))
}
