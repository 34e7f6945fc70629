//! Configuration for the exporter CLI

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use report_exporter::constants;
use report_exporter::{FontFiles, InvoiceOptions, ReportOptions, TimeRange};

// =============================================================================
// File-based Configuration (exporter.toml)
// =============================================================================

/// Configuration loaded from exporter.toml. Every section and key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub document: DocumentSection,
    #[serde(default)]
    pub invoice: InvoiceSection,
}

/// Report export defaults
#[derive(Debug, Default, Deserialize)]
pub struct ExportSection {
    pub output_dir: Option<PathBuf>,
    /// Report file stem (`{stem}-{range}.{ext}`)
    pub file_stem: Option<String>,
    /// 1m, 3m, 6m or 12m
    pub time_range: Option<String>,
    pub selected_metric: Option<String>,
}

/// PDF document settings
#[derive(Debug, Default, Deserialize)]
pub struct DocumentSection {
    pub title: Option<String>,
    /// TrueType font for regular text
    pub font_regular: Option<PathBuf>,
    /// TrueType font for headings and totals
    pub font_bold: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceSection {
    /// Replaces `invoice-{invoiceNo}` as the file stem
    pub file_stem: Option<String>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| {
            format!(
                "Failed to parse {}. Check for:\n\
                 - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
                 - Incorrect data types (strings vs numbers)",
                path.display()
            )
        })
    }

    /// Load `explicit` when given, otherwise `exporter.toml` from the working
    /// directory when it exists, otherwise use defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = Path::new(constants::CONFIG_FILENAME);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Values given on the command line; each one wins over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub file_stem: Option<String>,
    pub time_range: Option<String>,
    pub selected_metric: Option<String>,
    pub invoice_stem: Option<String>,
}

/// Resolved settings for one CLI run
#[derive(Debug)]
pub struct Config {
    pub output_dir: PathBuf,
    pub report: ReportOptions,
    pub invoice: InvoiceOptions,
}

impl Config {
    /// Merge flag > config file > built-in default
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self> {
        let fonts = FontFiles {
            regular: file.document.font_regular,
            bold: file.document.font_bold,
        };
        for path in [&fonts.regular, &fonts.bold].into_iter().flatten() {
            if !path.exists() {
                bail!("Font file not found: {}", path.display());
            }
        }

        let defaults = ReportOptions::default();
        let report = ReportOptions {
            file_stem: overrides
                .file_stem
                .or(file.export.file_stem)
                .unwrap_or(defaults.file_stem),
            time_range: overrides
                .time_range
                .or(file.export.time_range)
                .map(TimeRange::from)
                .unwrap_or(defaults.time_range),
            selected_metric: overrides
                .selected_metric
                .or(file.export.selected_metric)
                .unwrap_or(defaults.selected_metric),
            title: file.document.title.unwrap_or(defaults.title),
            fonts: fonts.clone(),
        };

        let invoice = InvoiceOptions {
            file_stem: overrides.invoice_stem.or(file.invoice.file_stem),
            fonts,
        };

        Ok(Config {
            output_dir: overrides
                .output_dir
                .or(file.export.output_dir)
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_OUTPUT_DIR)),
            report,
            invoice,
        })
    }
}
