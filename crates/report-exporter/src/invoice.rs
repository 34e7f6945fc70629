//! Invoice model and totals

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::snapshot::lenient_seq;

/// Seller or buyer on an invoice. A missing name renders as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    #[serde(default)]
    pub name: String,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One billed line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Precomputed amount; when absent the line is `quantity * unit_price`
    #[serde(default)]
    pub amount: Option<f64>,
}

impl LineItem {
    /// Amount billed for this line. Both the item table and the totals use
    /// this, so the printed rows always add up to the printed subtotal.
    pub fn line_amount(&self) -> f64 {
        self.amount.unwrap_or(self.quantity * self.unit_price)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_no: String,
    pub date: String,
    pub due_date: Option<String>,
    #[serde(default)]
    pub seller: Party,
    #[serde(default)]
    pub buyer: Party,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub items: Vec<LineItem>,
    /// Tax rate, percent
    pub tax_rate_pct: Option<f64>,
    pub notes: Option<String>,
    /// ISO currency code, informational only
    pub currency: Option<String>,
}

impl Invoice {
    /// Load an invoice from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Tax rate applied to the subtotal (0 when unset)
    pub fn effective_tax_rate(&self) -> f64 {
        self.tax_rate_pct.unwrap_or(0.0)
    }
}

/// Derived invoice totals; recomputed on demand, never stored
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// Compute subtotal, tax and total for an invoice
pub fn calculate_invoice_totals(invoice: &Invoice) -> InvoiceTotals {
    let subtotal: f64 = invoice.items.iter().map(LineItem::line_amount).sum();
    let tax = match invoice.tax_rate_pct {
        Some(rate) => subtotal * rate / 100.0,
        None => 0.0,
    };

    InvoiceTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}
