//! Revenue snapshot types supplied by the dashboard for one export call
//!
//! Field names serialize in camelCase; the record sheets of the workbook use
//! them verbatim as column headers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::Result;

/// Aggregate revenue figures shown in the summary section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevenueMetrics {
    pub total_revenue: f64,
    /// Month-over-month growth, percent
    pub monthly_growth: f64,
    /// Average commission rate, percent
    pub avg_commission_rate: f64,
    pub top_lender_revenue: f64,
}

/// One aggregated period (month) of revenue data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub month: String,
    pub revenue: f64,
    pub transactions: u64,
    pub avg_ticket: f64,
}

/// Revenue attributed to one lender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LenderRevenue {
    pub name: String,
    pub revenue: f64,
    /// Share of total revenue, percent
    pub share: f64,
    /// Growth, percent
    pub growth: f64,
}

/// A single disbursement routed through an aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub lender: String,
    pub aggregator: String,
    pub amount: f64,
    pub commission: f64,
    pub date: String,
    pub status: String,
}

/// Everything a revenue report export consumes
///
/// Sequences keep caller order. `revenue_data` is chronological; its tail is
/// the most recent period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSnapshot {
    #[serde(default)]
    pub metrics: RevenueMetrics,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub revenue_data: Vec<RevenuePoint>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub lender_revenue: Vec<LenderRevenue>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub transactions: Vec<TransactionRecord>,
}

impl ReportSnapshot {
    /// Load a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Read transaction records from a CSV file whose headers are the record's
/// field names (id, lender, aggregator, amount, commission, date, status)
pub fn load_transactions_csv(path: &Path) -> Result<Vec<TransactionRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: TransactionRecord = result?;
        records.push(record);
    }
    Ok(records)
}

/// Deserialize a sequence, reading anything that is not an array (null, a
/// scalar, an object) as an empty sequence
pub(crate) fn lenient_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_snapshot_from_dashboard_json() {
        let json = r#"{
            "metrics": {
                "totalRevenue": 4520000,
                "monthlyGrowth": 12.5,
                "avgCommissionRate": 2.1,
                "topLenderRevenue": 1250000
            },
            "revenueData": [
                {"month": "Jan", "revenue": 320000, "transactions": 145, "avgTicket": 2206.9}
            ],
            "lenderRevenue": [
                {"name": "HDFC Bank", "revenue": 1250000, "share": 27.6, "growth": 8.2}
            ],
            "transactions": [
                {"id": "TXN001", "lender": "HDFC Bank", "aggregator": "PayEasy",
                 "amount": 50000, "commission": 1000, "date": "2024-01-15", "status": "completed"}
            ]
        }"#;

        let snapshot: ReportSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.metrics.total_revenue, 4_520_000.0);
        assert_eq!(snapshot.revenue_data[0].avg_ticket, 2206.9);
        assert_eq!(snapshot.lender_revenue[0].name, "HDFC Bank");
        assert_eq!(snapshot.transactions[0].aggregator, "PayEasy");
    }

    #[test]
    fn test_non_sequence_fields_read_as_empty() {
        let json = r#"{
            "metrics": {"totalRevenue": 10},
            "revenueData": null,
            "lenderRevenue": {"name": "not a list"},
            "transactions": "oops"
        }"#;

        let snapshot: ReportSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.metrics.total_revenue, 10.0);
        assert_eq!(snapshot.metrics.monthly_growth, 0.0);
        assert!(snapshot.revenue_data.is_empty());
        assert!(snapshot.lender_revenue.is_empty());
        assert!(snapshot.transactions.is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot: ReportSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, ReportSnapshot::default());
    }

    #[test]
    fn test_load_transactions_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,lender,aggregator,amount,commission,date,status").unwrap();
        writeln!(file, "TXN001,HDFC Bank,PayEasy,50000,1000,2024-01-15,completed").unwrap();
        writeln!(file, "TXN002,ICICI Bank,LoanHub,75000,1500,2024-01-16,pending").unwrap();
        file.flush().unwrap();

        let records = load_transactions_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].lender, "ICICI Bank");
        assert_eq!(records[1].amount, 75_000.0);
        assert_eq!(records[1].status, "pending");
    }
}
