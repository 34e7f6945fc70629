//! Invoice PDF: layout and export

use std::path::PathBuf;
use tracing::{debug, info};

use crate::artifact::{Artifact, ArtifactSink, sanitize_file_name};
use crate::constants;
use crate::currency::{format_currency, format_number};
use crate::error::Result;
use crate::invoice::{Invoice, InvoiceTotals, LineItem, Party, calculate_invoice_totals};
use crate::layout::{Cursor, DocumentLayout, FontWeight, PageGeometry, Table, line_height, wrap_text};
use crate::pdf::{FontFiles, render_pdf};

/// Gap between the From and Bill To blocks
const PARTY_GUTTER_MM: f32 = 4.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceOptions {
    /// Replaces the default `invoice-{invoiceNo}` stem
    pub file_stem: Option<String>,
    pub fonts: FontFiles,
}

/// `invoice-{invoiceNo}.pdf`, or `{stem}.pdf` when a stem is given. Path
/// separators in either become `_` (`INV/2024-25/001` -> `invoice-INV_2024-25_001.pdf`).
pub fn invoice_file_name(invoice: &Invoice, file_stem: Option<&str>) -> String {
    match file_stem {
        Some(stem) => format!("{}.{}", sanitize_file_name(stem), constants::PDF_EXTENSION),
        None => format!(
            "{}-{}.{}",
            constants::INVOICE_FILE_PREFIX,
            sanitize_file_name(&invoice.invoice_no),
            constants::PDF_EXTENSION
        ),
    }
}

/// Lay out a single invoice
pub fn layout_invoice(invoice: &Invoice, totals: &InvoiceTotals) -> DocumentLayout {
    let title = format!("Invoice {}", invoice.invoice_no);
    let mut doc = DocumentLayout::new(title, PageGeometry::A4);
    let left = doc.geometry.margin;
    let body = constants::BODY_FONT_SIZE;

    let mut cursor = Cursor {
        page: 0,
        y: constants::TITLE_BASELINE_MM,
    };
    doc.text(cursor, left, constants::INVOICE_TITLE_FONT_SIZE, FontWeight::Bold, "INVOICE");

    cursor = cursor.advance(constants::TABLE_SPACING_MM);
    doc.text(cursor, left, body, FontWeight::Regular, format!("Invoice No: {}", invoice.invoice_no));
    cursor = cursor.advance(constants::LINE_SPACING_MM);
    doc.text(cursor, left, body, FontWeight::Regular, format!("Date: {}", invoice.date));

    if let Some(due_date) = &invoice.due_date {
        cursor = cursor.advance(constants::LINE_SPACING_MM);
        doc.text(cursor, left, body, FontWeight::Regular, format!("Due Date: {due_date}"));
    }
    if let Some(currency) = &invoice.currency {
        cursor = cursor.advance(constants::LINE_SPACING_MM);
        doc.text(cursor, left, body, FontWeight::Regular, format!("Currency: {currency}"));
    }

    cursor = place_parties(&mut doc, cursor.advance(constants::TABLE_SPACING_MM), invoice);
    cursor = doc.table(&item_table(&invoice.items), cursor.advance(constants::TABLE_SPACING_MM));
    cursor = place_totals(&mut doc, cursor, invoice, totals);

    if let Some(notes) = invoice.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        place_notes(&mut doc, cursor.advance(constants::TABLE_SPACING_MM), notes);
    }

    debug!(
        invoice = %invoice.invoice_no,
        items = invoice.items.len(),
        pages = doc.pages.len(),
        "Laid out invoice"
    );
    doc
}

/// Seller and buyer blocks side by side; returns the cursor on the last line
/// of the taller block
fn place_parties(doc: &mut DocumentLayout, at: Cursor, invoice: &Invoice) -> Cursor {
    let left = doc.geometry.margin;
    let half = doc.geometry.content_width() / 2.0;
    let block_width = half - PARTY_GUTTER_MM;

    let seller = party_lines(&invoice.seller, block_width);
    let buyer = party_lines(&invoice.buyer, block_width);
    let step = line_height(constants::BODY_FONT_SIZE);
    let rows = seller.len().max(buyer.len());

    let at = doc.ensure_room(at, constants::LINE_SPACING_MM + rows as f32 * step);
    doc.text(at, left, constants::BODY_FONT_SIZE, FontWeight::Bold, "From:");
    doc.text(at, left + half, constants::BODY_FONT_SIZE, FontWeight::Bold, "Bill To:");

    let first = at.advance(constants::LINE_SPACING_MM);
    for (x, lines) in [(left, &seller), (left + half, &buyer)] {
        for (index, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let weight = if index == 0 { FontWeight::Bold } else { FontWeight::Regular };
            doc.text(first.advance(index as f32 * step), x, constants::BODY_FONT_SIZE, weight, line.as_str());
        }
    }

    first.advance(rows.saturating_sub(1) as f32 * step)
}

/// Name line followed by the wrapped address
fn party_lines(party: &Party, width: f32) -> Vec<String> {
    let mut lines = vec![party.name.clone()];
    if let Some(address) = &party.address {
        lines.extend(
            wrap_text(address, width, constants::BODY_FONT_SIZE, FontWeight::Regular)
                .into_iter()
                .filter(|line| !line.is_empty()),
        );
    }
    lines
}

fn item_table(items: &[LineItem]) -> Table {
    let mut table = Table::new(["Description", "Qty", "Unit Price", "Amount"])
        .with_weights(&[3.0, 1.0, 1.5, 1.5])
        .align_right(&[1, 2, 3]);
    for item in items {
        table.push_row(vec![
            item.description.clone(),
            format_number(item.quantity),
            format_currency(item.unit_price),
            format_currency(item.line_amount()),
        ]);
    }
    table
}

fn place_totals(doc: &mut DocumentLayout, at: Cursor, invoice: &Invoice, totals: &InvoiceTotals) -> Cursor {
    let right = doc.geometry.right();
    let size = constants::BODY_FONT_SIZE;

    let lines = [
        (FontWeight::Regular, format!("Subtotal: {}", format_currency(totals.subtotal))),
        (
            FontWeight::Regular,
            format!(
                "Tax ({}%): {}",
                format_number(invoice.effective_tax_rate()),
                format_currency(totals.tax)
            ),
        ),
        (FontWeight::Bold, format!("Total: {}", format_currency(totals.total))),
    ];

    let mut cursor = doc.ensure_room(at, lines.len() as f32 * constants::LINE_SPACING_MM + constants::LINE_SPACING_MM);
    for (weight, text) in lines {
        cursor = cursor.advance(constants::LINE_SPACING_MM);
        doc.text_right(cursor, right, size, weight, text);
    }
    cursor
}

fn place_notes(doc: &mut DocumentLayout, at: Cursor, notes: &str) {
    let left = doc.geometry.margin;
    let size = constants::BODY_FONT_SIZE;
    let step = line_height(size);

    let mut cursor = doc.ensure_room(at, 2.0 * step);
    doc.text(cursor, left, size, FontWeight::Bold, "Notes:");

    for line in wrap_text(notes, doc.geometry.content_width(), size, FontWeight::Regular) {
        cursor = doc.ensure_room(cursor, step).advance(step);
        if !line.is_empty() {
            doc.text(cursor, left, size, FontWeight::Regular, line);
        }
    }
}

/// Compute totals, lay out and render the invoice without delivering it
pub fn build_invoice(invoice: &Invoice, options: &InvoiceOptions) -> Result<Artifact> {
    let totals = calculate_invoice_totals(invoice);
    let layout = layout_invoice(invoice, &totals);
    let bytes = render_pdf(&layout, &options.fonts)?;

    Ok(Artifact {
        file_name: invoice_file_name(invoice, options.file_stem.as_deref()),
        content_type: constants::PDF_CONTENT_TYPE,
        bytes,
    })
}

/// Build the invoice and hand it to `sink`
pub fn export_invoice(invoice: &Invoice, options: &InvoiceOptions, sink: &dyn ArtifactSink) -> Result<PathBuf> {
    let artifact = build_invoice(invoice, options)?;
    info!(
        file = %artifact.file_name,
        invoice = %invoice.invoice_no,
        items = invoice.items.len(),
        "Built invoice"
    );
    sink.deliver(&artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::DirectorySink;
    use crate::layout::Element;

    fn item(description: &str, quantity: f64, unit_price: f64) -> LineItem {
        LineItem {
            description: description.to_string(),
            quantity,
            unit_price,
            amount: None,
        }
    }

    fn invoice() -> Invoice {
        Invoice {
            invoice_no: "INV-001".to_string(),
            date: "2024-01-15".to_string(),
            due_date: Some("2024-02-14".to_string()),
            seller: Party {
                name: "Lendwise Technologies".to_string(),
                address: Some("Plot 42, Sector 18, Cyber City, Gurugram, Haryana 122015".to_string()),
                ..Default::default()
            },
            buyer: Party {
                name: "PayEasy Pvt Ltd".to_string(),
                address: Some("12 MG Road\nBengaluru".to_string()),
                ..Default::default()
            },
            items: vec![item("Widget", 2.0, 500.0)],
            tax_rate_pct: None,
            notes: None,
            currency: None,
        }
    }

    fn layout(invoice: &Invoice) -> DocumentLayout {
        layout_invoice(invoice, &calculate_invoice_totals(invoice))
    }

    fn text_x(doc: &DocumentLayout, wanted: &str) -> f32 {
        doc.pages
            .iter()
            .flat_map(|page| page.elements.iter())
            .find_map(|element| match element {
                Element::Text { x, text, .. } if text == wanted => Some(*x),
                _ => None,
            })
            .unwrap_or_else(|| panic!("missing text: {wanted}"))
    }

    #[test]
    fn test_invoice_file_names() {
        assert_eq!(invoice_file_name(&invoice(), None), "invoice-INV-001.pdf");
        assert_eq!(invoice_file_name(&invoice(), Some("acme-jan")), "acme-jan.pdf");
        assert_eq!(invoice_file_name(&invoice(), Some("../acme")), ".._acme.pdf");

        let mut fiscal = invoice();
        fiscal.invoice_no = "INV/2024-25/001".to_string();
        assert_eq!(invoice_file_name(&fiscal, None), "invoice-INV_2024-25_001.pdf");
    }

    #[test]
    fn test_export_invoice_with_slashes_in_number() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let sink = DirectorySink::new(&out);
        let mut fiscal = invoice();
        fiscal.invoice_no = "INV/2024-25/001".to_string();

        let path = export_invoice(&fiscal, &InvoiceOptions::default(), &sink).unwrap();
        assert_eq!(path, out.join("invoice-INV_2024-25_001.pdf"));

        let escaping = InvoiceOptions {
            file_stem: Some("../escaped".to_string()),
            ..Default::default()
        };
        let path = export_invoice(&fiscal, &escaping, &sink).unwrap();
        assert_eq!(path.parent(), Some(out.as_path()));
        assert!(!dir.path().join("escaped.pdf").exists());
    }

    #[test]
    fn test_rendered_invoice_keeps_rupee_amounts() {
        let artifact = build_invoice(&invoice(), &InvoiceOptions::default()).unwrap();
        let text = crate::pdf::extract_text(&artifact.bytes);

        assert!(text.contains("₹500"), "{text}");
        assert!(text.contains("₹1,000"), "{text}");
        assert!(text.contains("Subtotal: ₹1,000"), "{text}");
        assert!(text.contains("Total: ₹1,000"), "{text}");
    }

    #[test]
    fn test_header_lines() {
        let doc = layout(&invoice());
        let runs: Vec<&str> = doc.text_runs().into_iter().map(|(_, _, text)| text).collect();
        assert_eq!(
            &runs[..4],
            &["INVOICE", "Invoice No: INV-001", "Date: 2024-01-15", "Due Date: 2024-02-14"]
        );
    }

    #[test]
    fn test_optional_header_lines() {
        let mut without_due = invoice();
        without_due.due_date = None;
        let doc = layout(&without_due);
        assert!(doc.text_runs().iter().all(|(_, _, text)| !text.starts_with("Due Date")));
        assert!(doc.text_runs().iter().all(|(_, _, text)| !text.starts_with("Currency")));

        let mut with_currency = invoice();
        with_currency.currency = Some("INR".to_string());
        let doc = layout(&with_currency);
        let (_, due) = doc.find_text("Due Date: 2024-02-14").unwrap();
        let (_, currency) = doc.find_text("Currency: INR").unwrap();
        assert!(currency > due);
    }

    #[test]
    fn test_parties_side_by_side() {
        let doc = layout(&invoice());

        let (_, from_y) = doc.find_text("From:").unwrap();
        let (_, to_y) = doc.find_text("Bill To:").unwrap();
        assert_eq!(from_y, to_y);
        assert!(text_x(&doc, "Bill To:") > text_x(&doc, "From:"));

        let (_, seller_y) = doc.find_text("Lendwise Technologies").unwrap();
        let (_, buyer_y) = doc.find_text("PayEasy Pvt Ltd").unwrap();
        assert_eq!(seller_y, buyer_y);
        assert_eq!(text_x(&doc, "PayEasy Pvt Ltd"), text_x(&doc, "Bill To:"));
        assert!(doc.find_text("Bengaluru").is_some());
    }

    #[test]
    fn test_item_table_follows_parties() {
        let doc = layout(&invoice());

        let last_address_line = doc
            .text_runs()
            .into_iter()
            .take_while(|(_, _, text)| *text != "Description")
            .map(|(_, y, _)| y)
            .fold(0.0_f32, f32::max);
        let (_, header_y) = doc.find_text("Description").unwrap();
        assert!(header_y > last_address_line + constants::TABLE_SPACING_MM);
    }

    #[test]
    fn test_widget_totals() {
        let doc = layout(&invoice());

        assert!(doc.find_text("Widget").is_some());
        assert!(doc.find_text("2").is_some());
        assert!(doc.find_text("₹500").is_some());
        assert!(doc.find_text("₹1,000").is_some());
        assert!(doc.find_text("Subtotal: ₹1,000").is_some());
        assert!(doc.find_text("Tax (0%): ₹0").is_some());
        assert!(doc.find_text("Total: ₹1,000").is_some());
    }

    #[test]
    fn test_totals_are_right_aligned_below_items() {
        let mut taxed = invoice();
        taxed.tax_rate_pct = Some(18.0);
        let doc = layout(&taxed);

        let (_, item_y) = doc.find_text("Widget").unwrap();
        let (_, subtotal_y) = doc.find_text("Subtotal: ₹1,000").unwrap();
        let (_, tax_y) = doc.find_text("Tax (18%): ₹180").unwrap();
        let (_, total_y) = doc.find_text("Total: ₹1,180").unwrap();
        assert!(item_y < subtotal_y && subtotal_y < tax_y && tax_y < total_y);

        let right_edge = doc.geometry.right();
        for (_, _, text) in doc.text_runs() {
            if text.starts_with("Total:") {
                let x = text_x(&doc, text);
                let width = crate::layout::text_width(text, constants::BODY_FONT_SIZE, FontWeight::Bold);
                assert!((x + width - right_edge).abs() < 0.01);
            }
        }
    }

    #[test]
    fn test_amount_cell_matches_subtotal() {
        let mut discounted = item("Consulting", 10.0, 1000.0);
        discounted.amount = Some(9000.0);
        let mut inv = invoice();
        inv.items = vec![discounted];
        let doc = layout(&inv);

        assert!(doc.find_text("₹9,000").is_some());
        assert!(doc.find_text("₹10,000").is_none());
        assert!(doc.find_text("Subtotal: ₹9,000").is_some());
    }

    #[test]
    fn test_notes_are_wrapped_after_totals() {
        let mut noted = invoice();
        noted.notes = Some("Payment due within 30 days of the invoice date. ".repeat(6));
        let doc = layout(&noted);

        let (_, total_y) = doc.find_text("Total: ₹1,000").unwrap();
        let (_, notes_y) = doc.find_text("Notes:").unwrap();
        assert!(notes_y > total_y);

        let note_lines = doc
            .text_runs()
            .into_iter()
            .filter(|(_, y, _)| *y > notes_y)
            .count();
        assert!(note_lines > 1);
    }

    #[test]
    fn test_missing_names_render_empty() {
        let mut anonymous = invoice();
        anonymous.seller = Party::default();
        anonymous.buyer = Party::default();
        let doc = layout(&anonymous);
        assert!(doc.find_text("From:").is_some());
        assert!(doc.find_text("Bill To:").is_some());
    }

    #[test]
    fn test_export_invoice_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        let path = export_invoice(&invoice(), &InvoiceOptions::default(), &sink).unwrap();

        assert_eq!(path, dir.path().join("invoice-INV-001.pdf"));
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF-"));
    }
}
