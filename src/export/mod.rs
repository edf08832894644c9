//! Report rendering
//!
//! One [`table::TableModel`] feeds the BBCode and Markdown table dialects;
//! the compact narrative and JSON read the album records directly.

pub mod bbcode;
pub mod compact;
pub mod json;
pub mod markdown;
pub mod table;

use crate::error::{RelprepError, Result};
use crate::types::AlbumRecord;
use clap::ValueEnum;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

pub use table::TableModel;

/// Output dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// `[table]` markup
    #[default]
    Bbcode,
    /// Pipe table
    Markdown,
    /// BBCode summary plus track list
    Compact,
    /// Machine-readable document
    Json,
}

/// Render one album
pub fn render(album: &AlbumRecord, format: ReportFormat) -> Result<String> {
    render_many(std::slice::from_ref(album), format)
}

/// Render several albums
///
/// Text dialects are separated by a blank line; JSON is a single document.
pub fn render_many(albums: &[AlbumRecord], format: ReportFormat) -> Result<String> {
    let render_one: fn(&AlbumRecord) -> String = match format {
        ReportFormat::Json => return json::render(albums),
        ReportFormat::Bbcode => |album| bbcode::render_table(&TableModel::from_album(album)),
        ReportFormat::Markdown => |album| markdown::render_table(&TableModel::from_album(album)),
        ReportFormat::Compact => compact::render,
    };

    let parts: Vec<String> = albums
        .iter()
        .map(|album| {
            let mut text = render_one(album);
            while text.ends_with('\n') {
                text.pop();
            }
            text.push('\n');
            text
        })
        .collect();

    Ok(parts.join("\n"))
}

/// Write a rendered report to a file, or to stdout when `path` is `None`
///
/// Files are written to a temp file in the same directory and renamed into
/// place so a partial report never replaces a complete one.
pub fn write_report(text: &str, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| RelprepError::output_error("<stdout>", e))?;
        return Ok(());
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| RelprepError::output_error(path, e))?;
    temp.write_all(text.as_bytes())
        .map_err(|e| RelprepError::output_error(path, e))?;
    temp.persist(path)
        .map_err(|e| RelprepError::output_error(path, e.error))?;

    info!("Wrote report to {}", path.display());
    Ok(())
}
