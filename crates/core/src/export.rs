//! CSV exports of the dataset and of an [`AnalysisReport`].

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::analysis::AnalysisReport;
use crate::domain::record::NormalizedRecord;
use crate::errors::ApplicationError;
use crate::recommend::{RecommendationType, Urgency};
use crate::restock::NO_ESTIMATE_DAYS;

const NOT_AVAILABLE: &str = "N/A";

const DATASET_COLUMNS: &[&str] =
    &["Date", "Product", "Category", "Sold", "Stock", "Season", "Generated_Date"];
const PREDICTION_COLUMNS: &[&str] = &[
    "Product",
    "Category",
    "Current_Stock",
    "Avg_Daily_Sales",
    "Days_Until_Restock",
    "Restock_Date",
    "Status",
    "Reason",
    "Generated_Date",
];
const RECOMMENDATION_COLUMNS: &[&str] = &[
    "ID",
    "Type",
    "Title",
    "Urgency",
    "Products_Count",
    "Products",
    "Reason",
    "Generated_Date",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportKind {
    Dataset,
    Predictions,
    Recommendations,
    Summary,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Predictions => "predictions",
            Self::Recommendations => "recommendations",
            Self::Summary => "summary",
        }
    }

    /// Conventional file name for an export generated on `date`.
    pub fn file_name(&self, date: NaiveDate) -> String {
        let stem = match self {
            Self::Dataset => "inventory_analysis",
            Self::Predictions => "restock_predictions",
            Self::Recommendations => "recommendations",
            Self::Summary => "inventory_summary",
        };
        format!("{stem}_{}.csv", date.format("%Y-%m-%d"))
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dataset" => Ok(Self::Dataset),
            "predictions" => Ok(Self::Predictions),
            "recommendations" => Ok(Self::Recommendations),
            "summary" => Ok(Self::Summary),
            other => Err(format!(
                "unknown export kind `{other}`; expected dataset, predictions, recommendations or summary"
            )),
        }
    }
}

#[derive(Debug, Serialize)]
struct DatasetRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Product")]
    product: &'a str,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Sold")]
    sold: f64,
    #[serde(rename = "Stock")]
    stock: f64,
    #[serde(rename = "Season")]
    season: &'static str,
    #[serde(rename = "Generated_Date")]
    generated_date: &'a str,
}

#[derive(Debug, Serialize)]
struct PredictionRow<'a> {
    #[serde(rename = "Product")]
    product: &'a str,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Current_Stock")]
    current_stock: f64,
    #[serde(rename = "Avg_Daily_Sales")]
    avg_daily_sales: f64,
    #[serde(rename = "Days_Until_Restock")]
    days_until_restock: String,
    #[serde(rename = "Restock_Date")]
    restock_date: String,
    #[serde(rename = "Status")]
    status: &'static str,
    #[serde(rename = "Reason")]
    reason: &'a str,
    #[serde(rename = "Generated_Date")]
    generated_date: &'a str,
}

#[derive(Debug, Serialize)]
struct RecommendationRow<'a> {
    #[serde(rename = "ID")]
    id: usize,
    #[serde(rename = "Type")]
    kind: &'static str,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Urgency")]
    urgency: &'static str,
    #[serde(rename = "Products_Count")]
    products_count: usize,
    #[serde(rename = "Products")]
    products: String,
    #[serde(rename = "Reason")]
    reason: String,
    #[serde(rename = "Generated_Date")]
    generated_date: &'a str,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    #[serde(rename = "Report_Date")]
    report_date: String,
    #[serde(rename = "Total_Products")]
    total_products: usize,
    #[serde(rename = "Total_Sales")]
    total_sales: f64,
    #[serde(rename = "Average_Stock")]
    average_stock: f64,
    #[serde(rename = "Out_Of_Stock_Items")]
    out_of_stock_items: usize,
    #[serde(rename = "Critical_Recommendations")]
    critical: usize,
    #[serde(rename = "High_Priority_Recommendations")]
    high: usize,
    #[serde(rename = "Medium_Priority_Recommendations")]
    medium: usize,
    #[serde(rename = "Low_Priority_Recommendations")]
    low: usize,
    #[serde(rename = "Festival_Recommendations")]
    festival: usize,
    #[serde(rename = "Weather_Recommendations")]
    weather: usize,
    #[serde(rename = "Urgent_Stock_Alerts")]
    urgent: usize,
    #[serde(rename = "Products_Needing_Immediate_Restock")]
    immediate_restock: usize,
    #[serde(rename = "Products_With_Low_Stock")]
    low_stock: usize,
    #[serde(rename = "Data_Points_Analyzed")]
    data_points: usize,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn csv_error(error: csv::Error) -> ApplicationError {
    ApplicationError::Export(format!("csv serialization error: {error}"))
}

/// Serializes `rows` with a header taken from the row struct. `columns` is
/// written instead when there are no rows, so an empty export still names its
/// columns.
fn write_rows<W, T, I>(writer: W, columns: &[&str], rows: I) -> Result<usize, ApplicationError>
where
    W: Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut csv = csv::Writer::from_writer(writer);
    let mut written = 0;
    for row in rows {
        csv.serialize(row).map_err(csv_error)?;
        written += 1;
    }
    if written == 0 {
        csv.write_record(columns).map_err(csv_error)?;
    }
    csv.flush().map_err(|error| ApplicationError::Export(format!("csv writer error: {error}")))?;
    Ok(written)
}

pub fn write_dataset<W: Write>(
    writer: W,
    records: &[NormalizedRecord],
    generated_on: NaiveDate,
) -> Result<usize, ApplicationError> {
    let generated_date = iso(generated_on);
    write_rows(
        writer,
        DATASET_COLUMNS,
        records.iter().map(|record| DatasetRow {
            date: iso(record.date),
            product: &record.product,
            category: &record.category,
            sold: record.sold,
            stock: record.stock,
            season: record.season.as_str(),
            generated_date: &generated_date,
        }),
    )
}

pub fn write_predictions<W: Write>(
    writer: W,
    report: &AnalysisReport,
) -> Result<usize, ApplicationError> {
    let generated_date = iso(report.generated_on);
    write_rows(
        writer,
        PREDICTION_COLUMNS,
        report.predictions.iter().map(|prediction| PredictionRow {
            product: &prediction.product,
            category: &prediction.category,
            current_stock: prediction.current_stock,
            avg_daily_sales: round2(prediction.avg_daily_sales),
            days_until_restock: if prediction.days_until_restock >= NO_ESTIMATE_DAYS {
                NOT_AVAILABLE.to_owned()
            } else {
                format!("{:.1}", prediction.days_until_restock)
            },
            restock_date: prediction.restock_date.map_or_else(|| NOT_AVAILABLE.to_owned(), iso),
            status: prediction.status.label(),
            reason: &prediction.reason,
            generated_date: &generated_date,
        }),
    )
}

/// Fails when there is nothing to export.
pub fn write_recommendations<W: Write>(
    writer: W,
    report: &AnalysisReport,
) -> Result<usize, ApplicationError> {
    if report.recommendations.is_empty() {
        return Err(ApplicationError::Export("no recommendations available to export".to_owned()));
    }

    let generated_date = iso(report.generated_on);
    write_rows(
        writer,
        RECOMMENDATION_COLUMNS,
        report.recommendations.iter().enumerate().map(|(position, recommendation)| {
            RecommendationRow {
                id: position + 1,
                kind: recommendation.kind.as_str(),
                title: &recommendation.title,
                urgency: recommendation.urgency.as_str(),
                products_count: recommendation.products.len(),
                products: recommendation.products.join(", "),
                reason: recommendation.plain_reason(),
                generated_date: &generated_date,
            }
        }),
    )
}

/// One-row executive summary.
pub fn write_summary<W: Write>(writer: W, report: &AnalysisReport) -> Result<usize, ApplicationError> {
    let by_urgency = |urgency: Urgency| {
        report.recommendations.iter().filter(|item| item.urgency == urgency).count()
    };
    let by_kind = |kind: RecommendationType| {
        report.recommendations.iter().filter(|item| item.kind == kind).count()
    };

    let row = SummaryRow {
        report_date: iso(report.generated_on),
        total_products: report.metrics.unique_products,
        total_sales: report.metrics.total_sales,
        average_stock: round2(report.metrics.avg_stock),
        out_of_stock_items: report.metrics.out_of_stock,
        critical: by_urgency(Urgency::Critical),
        high: by_urgency(Urgency::High),
        medium: by_urgency(Urgency::Medium),
        low: by_urgency(Urgency::Low),
        festival: by_kind(RecommendationType::Festival),
        weather: by_kind(RecommendationType::Weather),
        urgent: by_kind(RecommendationType::Urgent),
        immediate_restock: report.status_summary.immediate_restock,
        low_stock: report.status_summary.low_stock,
        data_points: report.records_analyzed,
    };
    write_rows(writer, &[], [row])
}

pub fn write_export<W: Write>(
    kind: ExportKind,
    writer: W,
    records: &[NormalizedRecord],
    report: &AnalysisReport,
) -> Result<usize, ApplicationError> {
    match kind {
        ExportKind::Dataset => write_dataset(writer, records, report.generated_on),
        ExportKind::Predictions => write_predictions(writer, report),
        ExportKind::Recommendations => write_recommendations(writer, report),
        ExportKind::Summary => write_summary(writer, report),
    }
}

/// Writes the export to `path`, replacing any existing file.
pub fn export_to_file(
    kind: ExportKind,
    path: &Path,
    records: &[NormalizedRecord],
    report: &AnalysisReport,
) -> Result<usize, ApplicationError> {
    // Validate before creating the file so a failed export leaves nothing behind.
    if kind == ExportKind::Recommendations && report.recommendations.is_empty() {
        return Err(ApplicationError::Export("no recommendations available to export".to_owned()));
    }
    let file = File::create(path).map_err(|error| {
        ApplicationError::Export(format!("could not create `{}`: {error}", path.display()))
    })?;
    let rows = write_export(kind, file, records, report)?;
    info!(
        event_name = "export.completed",
        kind = kind.as_str(),
        rows,
        path = %path.display(),
        "export written"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        write_dataset, write_predictions, write_recommendations, write_summary, ExportKind,
    };
    use crate::analysis::{AnalysisInput, AnalysisReport, DatasetFilter, InventoryAnalyzer};
    use crate::errors::ApplicationError;
    use crate::recommend::RecommendationEngine;
    use crate::series::fixtures::daily;
    use crate::NormalizedRecord;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 29).expect("valid date")
    }

    fn report(records: &[NormalizedRecord], engine: RecommendationEngine) -> AnalysisReport {
        InventoryAnalyzer::default().with_engine(engine).analyze(AnalysisInput {
            records,
            prior: None,
            today: today(),
            filter: DatasetFilter::default(),
        })
    }

    fn fixture() -> Vec<NormalizedRecord> {
        let mut records = daily("Milk", &[2.0, 3.0, 5.0, 5.0], &[10.0, 8.0, 5.0, 0.0]);
        records.extend(daily("Clay Diya", &[10.0; 3], &[70.0, 60.0, 50.0]));
        records.extend(daily("Salt", &[0.0; 3], &[50.0; 3]));
        records
    }

    fn render(write: impl FnOnce(&mut Vec<u8>) -> Result<usize, ApplicationError>) -> (usize, String) {
        let mut buffer = Vec::new();
        let rows = write(&mut buffer).expect("export succeeds");
        (rows, String::from_utf8(buffer).expect("utf-8"))
    }

    #[test]
    fn dataset_export_has_enriched_columns() {
        let records = daily("Milk", &[2.0], &[10.0]);

        let (rows, csv) = render(|out| write_dataset(out, &records, today()));

        assert_eq!(rows, 1);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Date,Product,Category,Sold,Stock,Season,Generated_Date"));
        assert_eq!(lines.next(), Some("2024-10-01,Milk,General,2.0,10.0,Autumn,2024-10-29"));
    }

    #[test]
    fn empty_exports_still_carry_a_header() {
        let empty = report(&[], RecommendationEngine::empty());

        let (rows, csv) = render(|out| write_dataset(out, &[], today()));
        assert_eq!(rows, 0);
        assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["Date,Product,Category,Sold,Stock,Season,Generated_Date"]);

        let (rows, csv) = render(|out| write_predictions(out, &empty));
        assert_eq!(rows, 0);
        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            vec!["Product,Category,Current_Stock,Avg_Daily_Sales,Days_Until_Restock,Restock_Date,Status,Reason,Generated_Date"]
        );
    }

    #[test]
    fn prediction_export_marks_missing_estimates() {
        let records = fixture();
        let report = report(&records, RecommendationEngine::empty());

        let (rows, csv) = render(|out| write_predictions(out, &report));

        assert_eq!(rows, 3);
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[0].starts_with("Product,Category,Current_Stock,Avg_Daily_Sales,Days_Until_Restock"));
        assert!(lines[1].starts_with("Milk,General,0.0,3.75,0.0,2024-10-04,OUT OF STOCK"));
        let salt = lines.iter().find(|line| line.starts_with("Salt,")).expect("salt row");
        assert!(salt.contains(",N/A,N/A,"));
    }

    #[test]
    fn recommendation_export_strips_markup_and_rejects_empty() {
        let records = fixture();
        let empty = report(&records, RecommendationEngine::empty());
        let full = report(&records, RecommendationEngine::default());

        let error = write_recommendations(Vec::new(), &empty).expect_err("empty list");
        assert!(error.to_string().contains("no recommendations available to export"));

        let (rows, csv) = render(|out| write_recommendations(out, &full));
        assert_eq!(rows, full.recommendations.len());
        assert!(csv.starts_with("ID,Type,Title,Urgency,Products_Count,Products,Reason,Generated_Date"));
        assert!(csv.contains("1,Festival,Diwali Preparation,High,1,Clay Diya,"));
        assert!(!csv.contains("**"));
    }

    #[test]
    fn summary_export_is_a_single_row() {
        let records = fixture();
        let report = report(&records, RecommendationEngine::default());

        let (rows, csv) = render(|out| write_summary(out, &report));

        assert_eq!(rows, 1);
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().expect("headers").clone();
        let row = reader.records().next().expect("row").expect("valid row");
        let field = |name: &str| {
            let position = headers.iter().position(|header| header == name).expect("column");
            row.get(position).expect("value").to_owned()
        };
        assert_eq!(field("Report_Date"), "2024-10-29");
        assert_eq!(field("Total_Products"), "3");
        assert_eq!(field("Urgent_Stock_Alerts"), "1");
        assert_eq!(field("Festival_Recommendations"), "1");
        assert_eq!(field("Products_Needing_Immediate_Restock"), "1");
        assert_eq!(field("Data_Points_Analyzed"), "10");
    }

    #[test]
    fn export_kind_parses_and_names_files() {
        assert_eq!("Summary".parse::<ExportKind>(), Ok(ExportKind::Summary));
        assert!("pdf".parse::<ExportKind>().is_err());
        assert_eq!(ExportKind::Predictions.file_name(today()), "restock_predictions_2024-10-29.csv");
    }
}
