//! Revenue report export entry points
//!
//! One call turns a [`ReportSnapshot`] into a single artifact: a four-sheet
//! workbook or a PDF document. Each call owns its workbook/document, so
//! concurrent exports share nothing.

use chrono::Local;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::artifact::{Artifact, ArtifactSink, sanitize_file_name};
use crate::chart::{ChartCapture, capture_chart_snapshot};
use crate::constants;
use crate::currency::{format_currency, format_percent};
use crate::error::Result;
use crate::pdf::{FontFiles, render_pdf};
use crate::report_document::layout_report;
use crate::snapshot::ReportSnapshot;
use crate::spreadsheet::build_workbook;
use crate::time_range::TimeRange;

/// Output format picked on the export control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => constants::XLSX_EXTENSION,
            ExportFormat::Pdf => constants::PDF_EXTENSION,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => constants::XLSX_CONTENT_TYPE,
            ExportFormat::Pdf => constants::PDF_CONTENT_TYPE,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(format!("Invalid export format: {s} (expected xlsx or pdf)")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Per-call report settings
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub file_stem: String,
    pub time_range: TimeRange,
    /// Label of the metric selected on the dashboard
    pub selected_metric: String,
    /// Title line of the document report
    pub title: String,
    pub fonts: FontFiles,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            file_stem: constants::DEFAULT_REPORT_STEM.to_string(),
            time_range: TimeRange::default(),
            selected_metric: constants::DEFAULT_SELECTED_METRIC.to_string(),
            title: constants::DEFAULT_REPORT_TITLE.to_string(),
            fonts: FontFiles::default(),
        }
    }
}

/// `{stem}-{range}.{ext}`, with path separators in the stem or range
/// replaced by `_`
pub fn report_file_name(options: &ReportOptions, format: ExportFormat) -> String {
    format!(
        "{}-{}.{}",
        sanitize_file_name(&options.file_stem),
        sanitize_file_name(options.time_range.label()),
        format.extension()
    )
}

/// Metric/value pairs of the summary section, in display order
pub fn summary_rows(snapshot: &ReportSnapshot, options: &ReportOptions) -> Vec<(&'static str, String)> {
    let metrics = &snapshot.metrics;
    vec![
        ("Time Range", options.time_range.label().to_string()),
        ("Total Revenue", format_currency(metrics.total_revenue)),
        ("Monthly Growth", format_percent(metrics.monthly_growth)),
        ("Avg Commission Rate", format_percent(metrics.avg_commission_rate)),
        ("Top Lender Revenue", format_currency(metrics.top_lender_revenue)),
        ("Selected Metric", options.selected_metric.clone()),
    ]
}

/// Build the report artifact without delivering it.
///
/// `chart` is only consulted for PDF output; a failed capture drops the chart
/// section and the report is still produced.
pub async fn build_report<C: ChartCapture>(
    format: ExportFormat,
    snapshot: &ReportSnapshot,
    options: &ReportOptions,
    chart: Option<&C>,
) -> Result<Artifact> {
    let bytes = match format {
        ExportFormat::Xlsx => build_workbook(snapshot, options)?,
        ExportFormat::Pdf => {
            let chart_image = match chart {
                Some(chart) => capture_chart_snapshot(chart).await,
                None => None,
            };
            let generated_at = Local::now().format(constants::GENERATED_AT_FORMAT).to_string();
            let layout = layout_report(snapshot, options, chart_image, &generated_at);
            render_pdf(&layout, &options.fonts)?
        }
    };

    Ok(Artifact {
        file_name: report_file_name(options, format),
        content_type: format.content_type(),
        bytes,
    })
}

/// Build the report and hand it to `sink`
pub async fn export_report<C: ChartCapture>(
    format: ExportFormat,
    snapshot: &ReportSnapshot,
    options: &ReportOptions,
    chart: Option<&C>,
    sink: &dyn ArtifactSink,
) -> Result<PathBuf> {
    let artifact = build_report(format, snapshot, options, chart).await?;
    info!(
        file = %artifact.file_name,
        format = %format,
        range = %options.time_range,
        periods = snapshot.revenue_data.len(),
        lenders = snapshot.lender_revenue.len(),
        transactions = snapshot.transactions.len(),
        "Built revenue report"
    );
    sink.deliver(&artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::NoChart;
    use crate::error::CaptureError;
    use crate::snapshot::{RevenueMetrics, RevenuePoint, TransactionRecord};
    use image::DynamicImage;

    struct FailingCapture;

    impl ChartCapture for FailingCapture {
        async fn capture(&self, _pixel_ratio: f32) -> std::result::Result<DynamicImage, CaptureError> {
            Err(CaptureError::Unavailable("element detached".to_string()))
        }
    }

    fn snapshot() -> ReportSnapshot {
        ReportSnapshot {
            metrics: RevenueMetrics {
                total_revenue: 4_520_000.0,
                monthly_growth: 12.5,
                avg_commission_rate: 2.1,
                top_lender_revenue: 1_250_000.0,
            },
            revenue_data: vec![RevenuePoint {
                month: "Jan".to_string(),
                revenue: 320_000.0,
                transactions: 145,
                avg_ticket: 2206.9,
            }],
            ..Default::default()
        }
    }

    fn options(range: &str) -> ReportOptions {
        ReportOptions {
            file_stem: "revenue".to_string(),
            time_range: TimeRange::from(range),
            ..Default::default()
        }
    }

    #[test]
    fn test_report_file_names() {
        assert_eq!(report_file_name(&options("3m"), ExportFormat::Xlsx), "revenue-3m.xlsx");
        assert_eq!(report_file_name(&options("12m"), ExportFormat::Pdf), "revenue-12m.pdf");
        assert_eq!(report_file_name(&options("ytd"), ExportFormat::Pdf), "revenue-ytd.pdf");
        assert_eq!(report_file_name(&options("2024/Q1"), ExportFormat::Pdf), "revenue-2024_Q1.pdf");

        let mut escaping = options("3m");
        escaping.file_stem = "../../etc/revenue".to_string();
        assert_eq!(report_file_name(&escaping, ExportFormat::Xlsx), ".._.._etc_revenue-3m.xlsx");
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("xlsx".parse::<ExportFormat>(), Ok(ExportFormat::Xlsx));
        assert_eq!("PDF".parse::<ExportFormat>(), Ok(ExportFormat::Pdf));
        assert!("docx".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_summary_rows() {
        let rows = summary_rows(&snapshot(), &options("6m"));
        let labels: Vec<&str> = rows.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            labels,
            [
                "Time Range",
                "Total Revenue",
                "Monthly Growth",
                "Avg Commission Rate",
                "Top Lender Revenue",
                "Selected Metric"
            ]
        );
        assert_eq!(rows[0].1, "6m");
        assert_eq!(rows[1].1, "₹45,20,000");
        assert_eq!(rows[2].1, "12.5%");
        assert_eq!(rows[3].1, "2.1%");
        assert_eq!(rows[4].1, "₹12,50,000");
        assert_eq!(rows[5].1, "revenue");
    }

    #[tokio::test]
    async fn test_build_xlsx_report() {
        let artifact = build_report(ExportFormat::Xlsx, &snapshot(), &options("3m"), None::<&NoChart>)
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "revenue-3m.xlsx");
        assert_eq!(artifact.content_type, constants::XLSX_CONTENT_TYPE);
        // xlsx is a zip container
        assert!(artifact.bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_rendered_pdf_report_keeps_rupee_and_arrow() {
        let mut snapshot = snapshot();
        snapshot.transactions = vec![TransactionRecord {
            id: "TXN001".to_string(),
            lender: "HDFC Bank".to_string(),
            aggregator: "PayEasy".to_string(),
            amount: 50_000.0,
            commission: 1_000.0,
            date: "2024-01-15".to_string(),
            status: "completed".to_string(),
        }];

        let artifact = build_report(ExportFormat::Pdf, &snapshot, &options("3m"), None::<&NoChart>)
            .await
            .unwrap();
        let text = crate::pdf::extract_text(&artifact.bytes);

        assert!(text.contains("₹45,20,000"), "{text}");
        assert!(text.contains("Lender → Aggregator"), "{text}");
        assert!(text.contains("HDFC Bank → PayEasy"), "{text}");
        assert!(text.contains("₹50,000"), "{text}");
    }

    #[tokio::test]
    async fn test_chart_failure_does_not_abort_pdf_export() {
        let dir = tempfile::tempdir().unwrap();
        let sink = crate::artifact::DirectorySink::new(dir.path());

        let path = export_report(
            ExportFormat::Pdf,
            &snapshot(),
            &options("1m"),
            Some(&FailingCapture),
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(path, dir.path().join("revenue-1m.pdf"));
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF-"));
    }
}
