use serde::Serialize;

use crate::{
    db::DatasetStore,
    error::{AppError, AppResult},
    models::{UserDataset, Username},
    services::{
        archive::extract_tables,
        export_parser::{parse_export, ParsedExport, RowDiagnostic},
    },
};

/// Counts reported back to the uploader
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub ratings_count: usize,
    pub watched_count: usize,
    pub watchlist_count: usize,
    pub skipped_rows: Vec<RowDiagnostic>,
}

impl ImportSummary {
    fn new(dataset: &UserDataset, skipped_rows: Vec<RowDiagnostic>) -> Self {
        Self {
            ratings_count: dataset.ratings.len(),
            watched_count: dataset.watched.len(),
            watchlist_count: dataset.watchlist.len(),
            skipped_rows,
        }
    }
}

/// Decodes an export archive into a dataset
///
/// Runs on the blocking pool since both decompression and parsing are CPU bound.
pub async fn decode_export(archive: Vec<u8>) -> AppResult<ParsedExport> {
    tokio::task::spawn_blocking(move || -> AppResult<ParsedExport> {
        let tables = extract_tables(&archive)?;
        Ok(parse_export(&tables))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?
}

/// Replaces a user's stored dataset with the contents of an uploaded export
pub async fn import_export(
    store: &dyn DatasetStore,
    username: &Username,
    archive: Vec<u8>,
) -> AppResult<ImportSummary> {
    tracing::info!(user = %username, bytes = archive.len(), "Importing export archive");

    let ParsedExport {
        dataset,
        diagnostics,
    } = decode_export(archive).await?;

    store.put(username, &dataset).await?;

    let summary = ImportSummary::new(&dataset, diagnostics);

    tracing::info!(
        user = %username,
        ratings = summary.ratings_count,
        watched = summary.watched_count,
        watchlist = summary.watchlist_count,
        skipped = summary.skipped_rows.len(),
        "Export imported"
    );

    Ok(summary)
}
