//! CSV ingestion for daily sales/stock observations.
//!
//! Expected columns (case-insensitive, surrounding whitespace ignored):
//!   Date, Product, Sold, Stock
//! Optional columns:
//!   Category, Season, Restock_Date
//!
//! Rows that miss a required value or carry a non-numeric `Sold`/`Stock` are
//! rejected one by one and reported back; they never reach the normalizer.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::record::{parse_record_date, CategoryFallback, NormalizedRecord, RawRecord};
use crate::errors::{ApplicationError, DomainError};
use crate::normalize::Normalizer;

pub const REQUIRED_COLUMNS: [&str; 4] = ["Date", "Product", "Sold", "Stock"];

/// A data row that failed validation. `line` is the 1-based line in the file,
/// counting the header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestOutcome {
    pub records: Vec<RawRecord>,
    /// Source line of each entry in `records`.
    pub lines: Vec<usize>,
    pub rejected: Vec<RejectedRow>,
}

/// Normalized rows ready for analysis, plus the rows that were dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<NormalizedRecord>,
    pub rejected: Vec<RejectedRow>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    product: usize,
    sold: usize,
    stock: usize,
    category: Option<usize>,
    season: Option<usize>,
    restock_date: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ApplicationError> {
        let find = |name: &str| {
            headers.iter().position(|header| header.trim().eq_ignore_ascii_case(name))
        };

        let missing: Vec<&str> =
            REQUIRED_COLUMNS.iter().copied().filter(|name| find(*name).is_none()).collect();
        match (find("Date"), find("Product"), find("Sold"), find("Stock")) {
            (Some(date), Some(product), Some(sold), Some(stock)) => Ok(Self {
                date,
                product,
                sold,
                stock,
                category: find("Category"),
                season: find("Season"),
                restock_date: find("Restock_Date"),
            }),
            _ => Err(ApplicationError::Ingest(format!(
                "missing required columns: {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Reads raw records from CSV, splitting valid rows from rejected ones.
///
/// Fails as a whole only when the header is unreadable or lacks a required
/// column.
pub fn read_raw_records<R: Read>(reader: R) -> Result<IngestOutcome, ApplicationError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|error| ApplicationError::Ingest(format!("could not read CSV header: {error}")))?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut outcome = IngestOutcome::default();
    for (index, row) in csv_reader.records().enumerate() {
        let line = index + 2;
        let validated = row
            .map_err(|error| format!("unreadable row: {error}"))
            .and_then(|row| validate_row(&row, &columns));

        match validated {
            Ok(record) => {
                outcome.records.push(record);
                outcome.lines.push(line);
            }
            Err(reason) => {
                warn!(event_name = "ingest.row.rejected", line, reason = %reason, "rejected data row");
                outcome.rejected.push(RejectedRow { line, reason });
            }
        }
    }

    debug!(
        event_name = "ingest.completed",
        accepted = outcome.records.len(),
        rejected = outcome.rejected.len(),
        "csv ingestion completed"
    );
    Ok(outcome)
}

pub fn read_raw_records_file(path: &Path) -> Result<IngestOutcome, ApplicationError> {
    let file = File::open(path).map_err(|error| {
        ApplicationError::Ingest(format!("failed to open `{}`: {error}", path.display()))
    })?;
    read_raw_records(file)
}

/// Reads and normalizes a CSV dataset. An empty valid-row set is the
/// terminal "no data" condition.
pub fn load_dataset<R: Read>(
    reader: R,
    fallback: CategoryFallback,
) -> Result<Dataset, ApplicationError> {
    let IngestOutcome { records, lines, mut rejected } = read_raw_records(reader)?;

    let normalizer = Normalizer::new(fallback);
    let mut normalized = Vec::with_capacity(records.len());
    for (line, result) in lines.into_iter().zip(normalizer.normalize_all(&records)) {
        match result {
            Ok(record) => normalized.push(record),
            Err(error) => rejected.push(RejectedRow { line, reason: error.to_string() }),
        }
    }
    rejected.sort_by_key(|row| row.line);

    if normalized.is_empty() {
        return Err(DomainError::NoData.into());
    }

    Ok(Dataset { records: normalized, rejected })
}

pub fn load_dataset_file(
    path: &Path,
    fallback: CategoryFallback,
) -> Result<Dataset, ApplicationError> {
    let file = File::open(path).map_err(|error| {
        ApplicationError::Ingest(format!("failed to open `{}`: {error}", path.display()))
    })?;
    load_dataset(file, fallback)
}

fn validate_row(row: &csv::StringRecord, columns: &ColumnMap) -> Result<RawRecord, String> {
    let field = |index: usize| row.get(index).map(str::trim).unwrap_or("");
    let optional = |index: Option<usize>| {
        index.map(field).filter(|value| !value.is_empty()).map(str::to_owned)
    };

    let date = field(columns.date);
    if date.is_empty() {
        return Err("missing Date".to_owned());
    }
    if parse_record_date(date).is_none() {
        return Err(format!("unparsable Date `{date}`"));
    }

    let product = field(columns.product);
    if product.is_empty() {
        return Err("missing Product".to_owned());
    }

    let sold = parse_number("Sold", field(columns.sold))?;
    let stock = parse_number("Stock", field(columns.stock))?;

    Ok(RawRecord {
        date: date.to_owned(),
        product: product.to_owned(),
        sold,
        stock,
        category: optional(columns.category),
        season: optional(columns.season),
        restock_date: optional(columns.restock_date),
    })
}

fn parse_number(column: &str, value: &str) -> Result<f64, String> {
    if value.is_empty() {
        return Err(format!("missing {column}"));
    }
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(format!("non-numeric {column} `{value}`")),
    }
}
