//! Revenue report and invoice export
//!
//! Turns a dashboard snapshot into a downloadable file:
//! - a four-sheet xlsx workbook or a PDF report for revenue data
//! - a single PDF for an invoice
//!
//! Every export builds an [`Artifact`] in memory and hands it to an
//! [`ArtifactSink`]. Nothing is delivered when an export fails.

pub mod artifact;
pub mod chart;
pub mod constants;
pub mod currency;
pub mod error;
pub mod invoice;
pub mod invoice_document;
pub mod layout;
pub mod pdf;
pub mod report;
pub mod report_document;
pub mod snapshot;
pub mod spreadsheet;
pub mod time_range;

pub use artifact::{Artifact, ArtifactSink, DirectorySink};
pub use chart::{ChartCapture, NoChart, PngFileCapture};
pub use error::{CaptureError, ExportError, Result};
pub use invoice::{Invoice, InvoiceTotals, LineItem, Party, calculate_invoice_totals};
pub use invoice_document::{InvoiceOptions, build_invoice, export_invoice};
pub use pdf::FontFiles;
pub use report::{ExportFormat, ReportOptions, build_report, export_report};
pub use snapshot::{LenderRevenue, ReportSnapshot, RevenueMetrics, RevenuePoint, TransactionRecord};
pub use time_range::TimeRange;
