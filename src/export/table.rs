//! Table model shared by the table dialects

use crate::types::{AlbumRecord, TrackRecord};

/// Header label of the file name column
pub const FILENAME_HEADER: &str = "Filename";

/// One table cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    /// The text is a URL to render as a link
    pub link: bool,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: false,
        }
    }
}

/// Header plus one row per track, file name first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableModel {
    /// Build the table for an album
    ///
    /// Column labels come from the first record's fields; an empty album
    /// falls back to the static field list and has no rows.
    pub fn from_album(album: &AlbumRecord) -> Self {
        let header_fields: Vec<&str> = match album.first() {
            Some(first) => first.fields().iter().map(|f| f.name).collect(),
            None => TrackRecord::FIELD_NAMES.to_vec(),
        };

        let header = std::iter::once(FILENAME_HEADER.to_string())
            .chain(header_fields.into_iter().map(capitalize))
            .collect();

        let rows = album
            .iter()
            .map(|(file_name, record)| {
                std::iter::once(Cell::plain(file_name))
                    .chain(record.fields().into_iter().map(|f| Cell {
                        text: f.text,
                        link: f.link,
                    }))
                    .collect()
            })
            .collect();

        Self { header, rows }
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }
}

/// Upper-case the first character and lower-case the rest
pub fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
