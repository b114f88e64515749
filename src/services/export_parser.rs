use csv::StringRecord;
use serde::Serialize;

use crate::{
    models::{parse_rating, FilmRecord, UserDataset},
    services::archive::{ExportTables, TableKind},
};

const TITLE_COLUMN: &str = "Name";
const YEAR_COLUMN: &str = "Year";
const RATING_COLUMN: &str = "Rating";
const URI_COLUMN: &str = "Letterboxd URI";
const DATE_COLUMN: &str = "Date";

/// A table row that could not be turned into a [`FilmRecord`]
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowDiagnostic {
    pub table: TableKind,
    /// 1-based line in the source table
    pub line: u64,
    pub reason: String,
}

/// Result of parsing an export: the usable dataset plus every skipped row
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedExport {
    pub dataset: UserDataset,
    pub diagnostics: Vec<RowDiagnostic>,
}

/// Parses every table present in the export. Missing tables yield empty lists.
pub fn parse_export(tables: &ExportTables) -> ParsedExport {
    let mut parsed = ParsedExport::default();

    let sources = [
        (TableKind::Ratings, &tables.ratings),
        (TableKind::Watched, &tables.watched),
        (TableKind::Watchlist, &tables.watchlist),
    ];

    for (kind, source) in sources {
        let Some(bytes) = source else {
            tracing::debug!(table = %kind, "Table absent from export");
            continue;
        };

        let (records, diagnostics) = parse_table(kind, bytes);
        match kind {
            TableKind::Ratings => parsed.dataset.ratings = records,
            TableKind::Watched => parsed.dataset.watched = records,
            TableKind::Watchlist => parsed.dataset.watchlist = records,
        }
        parsed.diagnostics.extend(diagnostics);
    }

    parsed
}

/// Column positions resolved from a table's header row
struct Columns {
    title: Option<usize>,
    year: Option<usize>,
    rating: Option<usize>,
    uri: Option<usize>,
    date: Option<usize>,
}

impl Columns {
    fn resolve(kind: TableKind, headers: &StringRecord) -> Self {
        let find = |name: &str| {
            headers.iter().position(|header| {
                header
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .eq_ignore_ascii_case(name)
            })
        };

        Self {
            title: find(TITLE_COLUMN),
            year: find(YEAR_COLUMN),
            rating: (kind == TableKind::Ratings)
                .then(|| find(RATING_COLUMN))
                .flatten(),
            uri: find(URI_COLUMN),
            date: (kind == TableKind::Watched)
                .then(|| find(DATE_COLUMN))
                .flatten(),
        }
    }
}

/// Parses one comma-separated table with a header row.
///
/// Rows the reader rejects or that lack a title are skipped and reported; all other
/// cells degrade to `None` when blank or, for ratings, non-numeric.
pub fn parse_table(kind: TableKind, bytes: &[u8]) -> (Vec<FilmRecord>, Vec<RowDiagnostic>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    let mut diagnostics = Vec::new();

    let columns = match reader.headers() {
        Ok(headers) => Columns::resolve(kind, headers),
        Err(e) => {
            tracing::warn!(table = %kind, error = %e, "Unreadable table header");
            diagnostics.push(RowDiagnostic {
                table: kind,
                line: 1,
                reason: format!("unreadable header: {}", e),
            });
            return (records, diagnostics);
        }
    };

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                diagnostics.push(RowDiagnostic {
                    table: kind,
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let line = row.position().map(|p| p.line()).unwrap_or_default();

        let title = cell(&row, columns.title);
        let Some(title) = title else {
            diagnostics.push(RowDiagnostic {
                table: kind,
                line,
                reason: "missing film title".to_string(),
            });
            continue;
        };

        records.push(FilmRecord {
            title,
            year: cell(&row, columns.year),
            uri: cell(&row, columns.uri),
            rating: cell(&row, columns.rating).and_then(|raw| parse_rating(&raw)),
            watched_date: cell(&row, columns.date),
        });
    }

    if !diagnostics.is_empty() {
        tracing::warn!(
            table = %kind,
            parsed = records.len(),
            skipped = diagnostics.len(),
            "Skipped malformed rows"
        );
    }

    (records, diagnostics)
}

/// Non-blank cell contents at `index`
fn cell(row: &StringRecord, index: Option<usize>) -> Option<String> {
    let value = row.get(index?)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}
