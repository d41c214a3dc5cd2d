//! # Report Compiler
//!
//! Builds the downloadable stock / sales / weekly summaries.
//!
//! The compiler produces a format-independent [`Report`]; a
//! [`DocumentSink`] turns it into bytes. PDF rendering belongs behind the
//! same seam, in a dedicated sink; the built-in [`PlainTextSink`] keeps
//! every report kind downloadable without one.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use reparto_db::{Database, DbResult};

use crate::error::ApiError;

// =============================================================================
// Report Kinds
// =============================================================================

/// Report kinds the download endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Current stock ledger, one line per product
    Stock,

    /// Daily sale bucket with per-product totals
    Sales,

    /// Weekly archive with per-product totals
    Weekly,
}

impl ReportKind {
    /// File-name stem for the download.
    pub fn slug(&self) -> &'static str {
        match self {
            ReportKind::Stock => "stock",
            ReportKind::Sales => "sales",
            ReportKind::Weekly => "weekly",
        }
    }
}

/// Path parameter didn't name a report kind.
#[derive(Debug, thiserror::Error)]
#[error("Unknown report type: {0}")]
pub struct UnknownReportKind(String);

impl From<UnknownReportKind> for ApiError {
    fn from(err: UnknownReportKind) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl FromStr for ReportKind {
    type Err = UnknownReportKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock" => Ok(ReportKind::Stock),
            "sales" => Ok(ReportKind::Sales),
            "weekly" => Ok(ReportKind::Weekly),
            other => Err(UnknownReportKind(other.to_string())),
        }
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// A compiled report, independent of output format.
#[derive(Debug)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub lines: Vec<String>,
}

/// One sale record as the summaries see it, whichever bucket it came from.
struct SaleRow<'a> {
    product: &'a str,
    quantity: i64,
    user_id: &'a str,
    created_at: DateTime<Utc>,
}

/// Compiles the requested report from current data.
pub async fn compile(db: &Database, kind: ReportKind) -> DbResult<Report> {
    match kind {
        ReportKind::Stock => stock_report(db).await,
        ReportKind::Sales => sales_report(db).await,
        ReportKind::Weekly => weekly_report(db).await,
    }
}

async fn stock_report(db: &Database) -> DbResult<Report> {
    let items = db.stocks().list().await?;

    let mut lines = Vec::with_capacity(items.len() + 2);
    let mut total = 0;

    if items.is_empty() {
        lines.push("No records.".to_string());
    } else {
        for item in &items {
            total += item.quantity;
            lines.push(format!("{:<40} {:>8}", item.product, item.quantity));
        }
        lines.push(String::new());
        lines.push(format!("{:<40} {:>8}", "TOTAL", total));
    }

    Ok(Report {
        title: "Stock Ledger".to_string(),
        generated_at: Utc::now(),
        lines,
    })
}

async fn sales_report(db: &Database) -> DbResult<Report> {
    let sales = db.sales().list_daily().await?;
    let rows: Vec<SaleRow> = sales
        .iter()
        .map(|s| SaleRow {
            product: &s.product,
            quantity: s.quantity,
            user_id: &s.user_id,
            created_at: s.created_at,
        })
        .collect();

    Ok(summarize("Daily Sales", &rows))
}

async fn weekly_report(db: &Database) -> DbResult<Report> {
    let sales = db.sales().list_weekly().await?;
    let rows: Vec<SaleRow> = sales
        .iter()
        .map(|s| SaleRow {
            product: &s.product,
            quantity: s.quantity,
            user_id: &s.user_id,
            created_at: s.created_at,
        })
        .collect();

    Ok(summarize("Weekly Sales Archive", &rows))
}

/// Renders sale rows as a detail list followed by per-product totals.
fn summarize(title: &str, rows: &[SaleRow]) -> Report {
    let mut lines = Vec::new();

    if rows.is_empty() {
        lines.push("No records.".to_string());
    } else {
        let mut by_product: BTreeMap<&str, i64> = BTreeMap::new();
        let mut total = 0;

        for row in rows {
            *by_product.entry(row.product).or_insert(0) += row.quantity;
            total += row.quantity;
            lines.push(format!(
                "{}  {:<32} {:>6}  {}",
                row.created_at.format("%Y-%m-%d %H:%M"),
                row.product,
                row.quantity,
                row.user_id
            ));
        }

        lines.push(String::new());
        lines.push("Totals by product".to_string());
        for (product, quantity) in &by_product {
            lines.push(format!("{:<32} {:>6}", product, quantity));
        }

        lines.push(String::new());
        lines.push(format!("{:<32} {:>6}", "TOTAL", total));
    }

    Report {
        title: title.to_string(),
        generated_at: Utc::now(),
        lines,
    }
}

// =============================================================================
// Document Sinks
// =============================================================================

/// Renders a compiled [`Report`] into a downloadable document.
pub trait DocumentSink: Send + Sync {
    /// MIME type for the `Content-Type` header.
    fn content_type(&self) -> &'static str;

    /// File extension for the attachment name.
    fn file_extension(&self) -> &'static str;

    /// Renders the report body.
    fn render(&self, report: &Report) -> Vec<u8>;
}

/// Plain-text document sink.
#[derive(Debug, Default)]
pub struct PlainTextSink;

impl DocumentSink for PlainTextSink {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, report: &Report) -> Vec<u8> {
        // Writing into a String cannot fail
        let mut out = String::new();
        let _ = writeln!(out, "{}", report.title);
        let _ = writeln!(
            out,
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "{}", "=".repeat(60));

        for line in &report.lines {
            let _ = writeln!(out, "{}", line);
        }

        out.into_bytes()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
