//! Page layout of the PDF revenue report
//!
//! Fixed order: title, time range, generation time, metric lines, optional
//! chart, then the period, lender and transaction tables. Each table starts
//! a fixed gap below where the previous one ended.

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::constants;
use crate::currency::{format_currency, format_percent};
use crate::layout::{Cursor, DocumentLayout, FontWeight, PageGeometry, Table};
use crate::report::{ReportOptions, summary_rows};
use crate::snapshot::{LenderRevenue, ReportSnapshot, RevenuePoint, TransactionRecord};
use crate::time_range::truncate_to_recent_periods;

/// Lay out the report. `generated_at` is the already formatted timestamp.
pub fn layout_report(
    snapshot: &ReportSnapshot,
    options: &ReportOptions,
    chart: Option<DynamicImage>,
    generated_at: &str,
) -> DocumentLayout {
    let mut doc = DocumentLayout::new(options.title.as_str(), PageGeometry::A4);
    let left = doc.geometry.margin;

    let mut cursor = Cursor {
        page: 0,
        y: constants::TITLE_BASELINE_MM,
    };
    doc.text(cursor, left, constants::TITLE_FONT_SIZE, FontWeight::Bold, options.title.as_str());

    cursor = cursor.advance(constants::TABLE_SPACING_MM);
    doc.text(
        cursor,
        left,
        constants::BODY_FONT_SIZE,
        FontWeight::Regular,
        format!("Time Range: {}", options.time_range.label()),
    );
    cursor = cursor.advance(constants::LINE_SPACING_MM);
    doc.text(
        cursor,
        left,
        constants::BODY_FONT_SIZE,
        FontWeight::Regular,
        format!("Generated: {generated_at}"),
    );

    // Time Range already has its own line above
    cursor = cursor.advance(constants::TABLE_SPACING_MM);
    for (label, value) in summary_rows(snapshot, options).into_iter().skip(1) {
        doc.text(
            cursor,
            left,
            constants::BODY_FONT_SIZE,
            FontWeight::Regular,
            format!("{label}: {value}"),
        );
        cursor = cursor.advance(constants::LINE_SPACING_MM);
    }

    if let Some(image) = chart {
        cursor = place_chart(&mut doc, cursor, image);
    }

    let recent = truncate_to_recent_periods(&snapshot.revenue_data, &options.time_range);
    cursor = doc.table(&period_table(recent), cursor.advance(constants::CELL_PADDING_MM));
    cursor = doc.table(
        &lender_table(&snapshot.lender_revenue),
        cursor.advance(constants::TABLE_SPACING_MM),
    );
    doc.table(
        &transaction_table(&snapshot.transactions),
        cursor.advance(constants::TABLE_SPACING_MM),
    );

    debug!(pages = doc.pages.len(), "Laid out revenue report");
    doc
}

/// Fit the chart to the content width, shrinking it if it would run past the
/// bottom margin of the first page
fn place_chart(doc: &mut DocumentLayout, cursor: Cursor, image: DynamicImage) -> Cursor {
    let (pixels_wide, pixels_high) = image.dimensions();
    if pixels_wide == 0 || pixels_high == 0 {
        return cursor;
    }

    let aspect = pixels_high as f32 / pixels_wide as f32;
    let available = doc.geometry.bottom() - cursor.y;
    let mut width = doc.geometry.content_width();
    let mut height = width * aspect;
    if height > available {
        height = available.max(0.0);
        width = height / aspect;
    }

    doc.image(cursor, doc.geometry.margin, width, height, image);
    cursor.advance(height + constants::LINE_SPACING_MM)
}

fn period_table(points: &[RevenuePoint]) -> Table {
    let mut table = Table::new(["Month", "Revenue", "Transactions", "Avg Ticket"]).align_right(&[1, 2, 3]);
    for point in points {
        table.push_row(vec![
            point.month.clone(),
            format_currency(point.revenue),
            point.transactions.to_string(),
            format_currency(point.avg_ticket),
        ]);
    }
    table
}

fn lender_table(lenders: &[LenderRevenue]) -> Table {
    let mut table = Table::new(["Lender", "Revenue", "Share %", "Growth %"]).align_right(&[1, 2, 3]);
    for lender in lenders {
        table.push_row(vec![
            lender.name.clone(),
            format_currency(lender.revenue),
            format_percent(lender.share),
            format_percent(lender.growth),
        ]);
    }
    table
}

fn transaction_table(transactions: &[TransactionRecord]) -> Table {
    let mut table = Table::new([
        "Txn ID",
        "Lender → Aggregator",
        "Amount",
        "Commission",
        "Date",
        "Status",
    ])
    .with_weights(&[1.0, 2.2, 1.1, 1.1, 1.1, 1.0])
    .align_right(&[2, 3]);
    for txn in transactions {
        table.push_row(vec![
            txn.id.clone(),
            format!("{} → {}", txn.lender, txn.aggregator),
            format_currency(txn.amount),
            format_currency(txn.commission),
            txn.date.clone(),
            txn.status.clone(),
        ]);
    }
    table
}
