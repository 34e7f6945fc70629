//! Centralized constants for report and invoice exports
//!
//! Layout values are in millimetres unless the name says otherwise; font
//! sizes are in points.

// =============================================================================
// File Names
// =============================================================================

/// Default stem for revenue report artifacts (`{stem}-{range}.{ext}`)
pub const DEFAULT_REPORT_STEM: &str = "revenue-report";

/// Prefix for invoice artifacts (`invoice-{invoiceNo}.pdf`)
pub const INVOICE_FILE_PREFIX: &str = "invoice";

pub const XLSX_EXTENSION: &str = "xlsx";
pub const PDF_EXTENSION: &str = "pdf";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Suffix for in-flight files written by the directory sink
pub const PARTIAL_FILE_SUFFIX: &str = ".part";

/// Config file picked up from the working directory when `--config` is not given
pub const CONFIG_FILENAME: &str = "exporter.toml";

/// Where generated files go unless configured otherwise
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

// =============================================================================
// Workbook Sheets (order matters)
// =============================================================================

pub const SUMMARY_SHEET: &str = "Summary";
pub const REVENUE_SHEET: &str = "RevenueData";
pub const LENDER_SHEET: &str = "LenderRevenue";
pub const TRANSACTIONS_SHEET: &str = "Transactions";

/// Minimum and maximum worksheet column widths (Excel character units)
pub const MIN_COLUMN_WIDTH: f64 = 8.0;
pub const MAX_COLUMN_WIDTH: f64 = 60.0;

// =============================================================================
// Report Defaults
// =============================================================================

pub const DEFAULT_REPORT_TITLE: &str = "Revenue Report";
pub const DEFAULT_SELECTED_METRIC: &str = "revenue";

/// Period count used for the widest (and any unrecognized) time range
pub const DEFAULT_PERIOD_COUNT: usize = 12;

/// Generation timestamp format (en-IN style: 18/10/2026, 3:04:05 pm)
pub const GENERATED_AT_FORMAT: &str = "%d/%m/%Y, %-I:%M:%S %P";

// =============================================================================
// Currency
// =============================================================================

pub const RUPEE_SYMBOL: &str = "₹";

// =============================================================================
// Page Layout (A4 portrait)
// =============================================================================

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const PAGE_MARGIN_MM: f32 = 14.0;

pub const TITLE_FONT_SIZE: f32 = 18.0;
pub const INVOICE_TITLE_FONT_SIZE: f32 = 20.0;
pub const BODY_FONT_SIZE: f32 = 11.0;
pub const TABLE_FONT_SIZE: f32 = 9.0;

/// Baseline of the title line on the first page
pub const TITLE_BASELINE_MM: f32 = 20.0;

/// Distance between consecutive body lines
pub const LINE_SPACING_MM: f32 = 6.0;

/// Gap between a table's final row and the next block
pub const TABLE_SPACING_MM: f32 = 10.0;

/// Inner padding of a table cell
pub const CELL_PADDING_MM: f32 = 1.8;

pub const HEADER_RULE_PT: f32 = 0.8;
pub const ROW_RULE_PT: f32 = 0.3;

// =============================================================================
// Chart Snapshot
// =============================================================================

/// Pixel density the chart element is captured at
pub const CHART_PIXEL_RATIO: f32 = 2.0;

// =============================================================================
// PDF Output
// =============================================================================

pub const PDF_LAYER_NAME: &str = "Layer 1";
