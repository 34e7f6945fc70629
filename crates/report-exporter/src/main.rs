//! Revenue report and invoice exporter
//!
//! Reads dashboard snapshots and invoices from JSON files and writes the
//! xlsx/pdf exports into an output directory.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use config::{Config, FileConfig, Overrides};
use report_exporter::currency::format_currency;
use report_exporter::snapshot::load_transactions_csv;
use report_exporter::{
    DirectorySink, ExportFormat, Invoice, NoChart, PngFileCapture, ReportSnapshot, calculate_invoice_totals,
    export_invoice, export_report,
};

#[derive(Parser, Debug)]
#[command(name = "report-exporter")]
#[command(about = "Export revenue reports (xlsx/pdf) and invoices (pdf)")]
struct Args {
    /// Config file (default: exporter.toml in the working directory, if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for generated files
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the revenue report
    Report {
        /// Snapshot JSON (metrics, revenueData, lenderRevenue, transactions)
        #[arg(short, long)]
        input: PathBuf,

        /// Output format: xlsx or pdf
        #[arg(short, long, default_value = "xlsx")]
        format: ExportFormat,

        /// Time range: 1m, 3m, 6m or 12m
        #[arg(short, long)]
        range: Option<String>,

        /// Label of the selected dashboard metric
        #[arg(long)]
        metric: Option<String>,

        /// File stem (default: revenue-report)
        #[arg(long)]
        stem: Option<String>,

        /// Pre-rendered chart PNG to embed in the PDF report
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Replace the snapshot's transactions with records from a CSV file
        #[arg(long)]
        transactions_csv: Option<PathBuf>,
    },

    /// Export an invoice as PDF
    Invoice {
        /// Invoice JSON
        #[arg(short, long)]
        input: PathBuf,

        /// File stem (default: invoice-{invoiceNo})
        #[arg(long)]
        name: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "report_exporter=debug"
    } else {
        "report_exporter=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let file_config = FileConfig::discover(args.config.as_deref())?;

    match args.command {
        Command::Report {
            input,
            format,
            range,
            metric,
            stem,
            chart,
            transactions_csv,
        } => {
            let overrides = Overrides {
                output_dir: args.output_dir,
                file_stem: stem,
                time_range: range,
                selected_metric: metric,
                ..Default::default()
            };
            let config = Config::resolve(file_config, overrides)?;
            run_report(&config, input, format, chart, transactions_csv).await
        }

        Command::Invoice { input, name } => {
            let overrides = Overrides {
                output_dir: args.output_dir,
                invoice_stem: name,
                ..Default::default()
            };
            let config = Config::resolve(file_config, overrides)?;
            run_invoice(&config, input)
        }
    }
}

async fn run_report(
    config: &Config,
    input: PathBuf,
    format: ExportFormat,
    chart: Option<PathBuf>,
    transactions_csv: Option<PathBuf>,
) -> Result<()> {
    let mut snapshot = ReportSnapshot::load(&input)
        .with_context(|| format!("Failed to load snapshot: {}", input.display()))?;

    if let Some(csv_path) = transactions_csv {
        snapshot.transactions = load_transactions_csv(&csv_path)
            .with_context(|| format!("Failed to read transactions CSV: {}", csv_path.display()))?;
        debug!(count = snapshot.transactions.len(), "Loaded transactions from CSV");
    }

    println!(
        "Exporting {} report ({}) from {}...",
        format,
        config.report.time_range,
        input.display()
    );

    let sink = DirectorySink::new(&config.output_dir);
    let path = match (format, chart) {
        (ExportFormat::Pdf, Some(chart_path)) => {
            let capture = PngFileCapture::new(chart_path);
            export_report(format, &snapshot, &config.report, Some(&capture), &sink).await
        }
        (_, chart_path) => {
            if let Some(chart_path) = chart_path {
                debug!(chart = %chart_path.display(), "Chart is only embedded in PDF reports");
            }
            export_report(format, &snapshot, &config.report, None::<&NoChart>, &sink).await
        }
    }
    .context("Failed to export report")?;

    println!("  Generated: {}", path.display());
    Ok(())
}

fn run_invoice(config: &Config, input: PathBuf) -> Result<()> {
    let invoice =
        Invoice::load(&input).with_context(|| format!("Failed to load invoice: {}", input.display()))?;

    let totals = calculate_invoice_totals(&invoice);
    println!("Invoice {}: {} item(s)", invoice.invoice_no, invoice.items.len());
    println!("  Subtotal: {}", format_currency(totals.subtotal));
    println!("  Tax:      {}", format_currency(totals.tax));
    println!("  Total:    {}", format_currency(totals.total));

    let sink = DirectorySink::new(&config.output_dir);
    let path = export_invoice(&invoice, &config.invoice, &sink).context("Failed to export invoice")?;

    println!("  Generated: {}", path.display());
    Ok(())
}
