use std::io::{Cursor, Read};

use serde::Serialize;
use zip::ZipArchive;

use crate::error::{AppError, AppResult};

/// Largest decompressed table we are willing to hold in memory
const MAX_TABLE_BYTES: u64 = 64 * 1024 * 1024;

/// Which exported table a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Ratings,
    Watched,
    Watchlist,
}

impl TableKind {
    /// Classifies an archive entry by its file name.
    ///
    /// Checked in order: `rating`, then `watched`, then `watchlist`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if !name.ends_with(".csv") {
            return None;
        }

        if name.contains("rating") {
            Some(TableKind::Ratings)
        } else if name.contains("watched") {
            Some(TableKind::Watched)
        } else if name.contains("watchlist") {
            Some(TableKind::Watchlist)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Ratings => "ratings",
            TableKind::Watched => "watched",
            TableKind::Watchlist => "watchlist",
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw table contents pulled from an export archive; absent tables stay `None`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportTables {
    pub ratings: Option<Vec<u8>>,
    pub watched: Option<Vec<u8>>,
    pub watchlist: Option<Vec<u8>>,
}

impl ExportTables {
    fn slot(&mut self, kind: TableKind) -> &mut Option<Vec<u8>> {
        match kind {
            TableKind::Ratings => &mut self.ratings,
            TableKind::Watched => &mut self.watched,
            TableKind::Watchlist => &mut self.watchlist,
        }
    }
}

/// Reads the ratings, watched and watchlist tables out of a ZIP export.
///
/// Only top-level entries are considered. When several entries map to the same
/// table, the last one in the archive wins.
pub fn extract_tables(bytes: &[u8]) -> AppResult<ExportTables> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        tracing::warn!(error = %e, "Upload is not a ZIP archive");
        AppError::InvalidArchive("Invalid ZIP file".to_string())
    })?;

    let mut tables = ExportTables::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| AppError::InvalidArchive(format!("Error extracting ZIP: {}", e)))?;

        if entry.is_dir() || entry.name().contains('/') {
            continue;
        }
        let Some(kind) = TableKind::from_file_name(entry.name()) else {
            continue;
        };

        if entry.size() > MAX_TABLE_BYTES {
            return Err(AppError::InvalidArchive(format!(
                "{} exceeds the {} byte table limit",
                entry.name(),
                MAX_TABLE_BYTES
            )));
        }

        let mut contents = Vec::new();
        (&mut entry)
            .take(MAX_TABLE_BYTES + 1)
            .read_to_end(&mut contents)
            .map_err(|e| AppError::InvalidArchive(format!("Error extracting ZIP: {}", e)))?;
        if contents.len() as u64 > MAX_TABLE_BYTES {
            return Err(AppError::InvalidArchive(format!(
                "{} exceeds the {} byte table limit",
                entry.name(),
                MAX_TABLE_BYTES
            )));
        }

        tracing::debug!(entry = %entry.name(), table = %kind, bytes = contents.len(), "Found export table");
        *tables.slot(kind) = Some(contents);
    }

    Ok(tables)
}
