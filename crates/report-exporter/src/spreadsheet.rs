//! Multi-sheet workbook for the spreadsheet export
//!
//! Sheets, in order: Summary, RevenueData (time-filtered), LenderRevenue,
//! Transactions. Record sheets take their header row from the record's
//! serialized field names.

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::constants;
use crate::error::{ExportError, Result};
use crate::report::{ReportOptions, summary_rows};
use crate::snapshot::ReportSnapshot;
use crate::time_range::truncate_to_recent_periods;

/// Build the report workbook and return the xlsx bytes
pub fn build_workbook(snapshot: &ReportSnapshot, options: &ReportOptions) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let summary = summary_rows(snapshot, options);
    let worksheet = workbook.add_worksheet().set_name(constants::SUMMARY_SHEET)?;
    write_summary(worksheet, &summary, &header_format)?;

    let recent = truncate_to_recent_periods(&snapshot.revenue_data, &options.time_range);
    let worksheet = workbook.add_worksheet().set_name(constants::REVENUE_SHEET)?;
    write_records(worksheet, recent, &header_format)?;

    let worksheet = workbook.add_worksheet().set_name(constants::LENDER_SHEET)?;
    write_records(worksheet, &snapshot.lender_revenue, &header_format)?;

    let worksheet = workbook.add_worksheet().set_name(constants::TRANSACTIONS_SHEET)?;
    write_records(worksheet, &snapshot.transactions, &header_format)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_summary(worksheet: &mut Worksheet, rows: &[(&str, String)], header_format: &Format) -> Result<()> {
    let mut widths = ColumnWidths::default();

    for (col, header) in ["Metric", "Value"].iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, header_format)?;
        widths.observe(col, header);
    }

    for (index, (metric, value)) in rows.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet.write_string(row, 0, *metric)?;
        worksheet.write_string(row, 1, value.as_str())?;
        widths.observe(0, metric);
        widths.observe(1, value);
    }

    widths.apply(worksheet)
}

/// Write one row per record. An empty slice leaves the sheet empty.
fn write_records<T: Serialize>(worksheet: &mut Worksheet, records: &[T], header_format: &Format) -> Result<()> {
    let rows = records
        .iter()
        .map(record_fields)
        .collect::<Result<Vec<_>>>()?;

    let Some(first) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let mut widths = ColumnWidths::default();

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header.as_str(), header_format)?;
        widths.observe(col, header);
    }

    for (index, fields) in rows.iter().enumerate() {
        let row = index as u32 + 1;
        for (col, header) in headers.iter().enumerate() {
            let Some(value) = fields.get(header) else {
                continue;
            };
            write_value(worksheet, row, col as u16, value)?;
            widths.observe(col, &display_value(value));
        }
    }

    widths.apply(worksheet)
}

fn record_fields<T: Serialize>(record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        other => Err(ExportError::Record(format!("expected a record, got {other}"))),
    }
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(number) => {
                worksheet.write_number(row, col, number)?;
            }
            None => {
                worksheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        Value::Array(_) | Value::Object(_) => {
            worksheet.write_string(row, col, value.to_string())?;
        }
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Tracks the widest text per column
#[derive(Default)]
struct ColumnWidths(Vec<usize>);

impl ColumnWidths {
    fn observe(&mut self, col: usize, text: &str) {
        if self.0.len() <= col {
            self.0.resize(col + 1, 0);
        }
        self.0[col] = self.0[col].max(text.chars().count());
    }

    fn apply(&self, worksheet: &mut Worksheet) -> Result<()> {
        for (col, chars) in self.0.iter().enumerate() {
            let width = (*chars as f64 + 2.0).clamp(constants::MIN_COLUMN_WIDTH, constants::MAX_COLUMN_WIDTH);
            worksheet.set_column_width(col as u16, width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{LenderRevenue, RevenueMetrics, RevenuePoint, TransactionRecord};
    use crate::time_range::TimeRange;
    use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
    use std::io::Cursor;

    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    fn full_snapshot() -> ReportSnapshot {
        ReportSnapshot {
            metrics: RevenueMetrics {
                total_revenue: 4_520_000.0,
                monthly_growth: 12.5,
                avg_commission_rate: 2.1,
                top_lender_revenue: 1_250_000.0,
            },
            revenue_data: MONTHS
                .iter()
                .enumerate()
                .map(|(i, month)| RevenuePoint {
                    month: month.to_string(),
                    revenue: 300_000.0 + i as f64 * 10_000.0,
                    transactions: 100 + i as u64,
                    avg_ticket: 2500.0,
                })
                .collect(),
            lender_revenue: vec![
                LenderRevenue {
                    name: "HDFC Bank".to_string(),
                    revenue: 1_250_000.0,
                    share: 27.6,
                    growth: 8.2,
                },
                LenderRevenue {
                    name: "ICICI Bank".to_string(),
                    revenue: 980_000.0,
                    share: 21.7,
                    growth: -1.5,
                },
            ],
            transactions: vec![TransactionRecord {
                id: "TXN001".to_string(),
                lender: "HDFC Bank".to_string(),
                aggregator: "PayEasy".to_string(),
                amount: 50_000.0,
                commission: 1000.0,
                date: "2024-01-15".to_string(),
                status: "completed".to_string(),
            }],
        }
    }

    fn options(range: &str) -> ReportOptions {
        ReportOptions {
            time_range: TimeRange::from(range),
            ..Default::default()
        }
    }

    fn open(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
        open_workbook_from_rs(Cursor::new(bytes)).unwrap()
    }

    fn cell_text(data: &Data) -> String {
        match data {
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            other => format!("{other:?}"),
        }
    }

    #[test]
    fn test_four_sheets_in_order() {
        let workbook = open(build_workbook(&full_snapshot(), &options("3m")).unwrap());
        assert_eq!(
            workbook.sheet_names(),
            vec!["Summary", "RevenueData", "LenderRevenue", "Transactions"]
        );
    }

    #[test]
    fn test_four_sheets_for_empty_snapshot() {
        let mut workbook = open(build_workbook(&ReportSnapshot::default(), &options("12m")).unwrap());
        assert_eq!(
            workbook.sheet_names(),
            vec!["Summary", "RevenueData", "LenderRevenue", "Transactions"]
        );

        let revenue = workbook.worksheet_range("RevenueData").unwrap();
        assert!(revenue.is_empty());
        let summary = workbook.worksheet_range("Summary").unwrap();
        assert_eq!(summary.height(), 7);
    }

    #[test]
    fn test_summary_sheet_rows() {
        let mut workbook = open(build_workbook(&full_snapshot(), &options("6m")).unwrap());
        let summary = workbook.worksheet_range("Summary").unwrap();

        let rows: Vec<(String, String)> = summary
            .rows()
            .map(|row| (cell_text(&row[0]), cell_text(&row[1])))
            .collect();
        assert_eq!(rows[0], ("Metric".to_string(), "Value".to_string()));
        assert_eq!(rows[1], ("Time Range".to_string(), "6m".to_string()));
        assert_eq!(rows[2], ("Total Revenue".to_string(), "₹45,20,000".to_string()));
        assert_eq!(rows[3], ("Monthly Growth".to_string(), "12.5%".to_string()));
        assert_eq!(rows[6], ("Selected Metric".to_string(), "revenue".to_string()));
    }

    #[test]
    fn test_revenue_sheet_is_time_filtered() {
        let mut workbook = open(build_workbook(&full_snapshot(), &options("3m")).unwrap());
        let revenue = workbook.worksheet_range("RevenueData").unwrap();

        let rows: Vec<Vec<String>> = revenue
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        assert_eq!(rows[0], vec!["month", "revenue", "transactions", "avgTicket"]);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1][0], "Oct");
        assert_eq!(rows[3][0], "Dec");
    }

    #[test]
    fn test_other_sheets_are_unfiltered() {
        let mut workbook = open(build_workbook(&full_snapshot(), &options("1m")).unwrap());

        let lenders = workbook.worksheet_range("LenderRevenue").unwrap();
        assert_eq!(lenders.height(), 3);
        let header: Vec<String> = lenders.rows().next().unwrap().iter().map(cell_text).collect();
        assert_eq!(header, vec!["name", "revenue", "share", "growth"]);

        let transactions = workbook.worksheet_range("Transactions").unwrap();
        let header: Vec<String> = transactions.rows().next().unwrap().iter().map(cell_text).collect();
        assert_eq!(
            header,
            vec!["id", "lender", "aggregator", "amount", "commission", "date", "status"]
        );
        let first: Vec<String> = transactions.rows().nth(1).unwrap().iter().map(cell_text).collect();
        assert_eq!(first[0], "TXN001");
        assert_eq!(first[3], "50000");
    }
}
