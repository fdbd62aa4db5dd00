//! CSV export.
//!
//! One header row, then one row per record. Fields are quoted only when
//! they contain a comma, quote or line break, with inner quotes doubled.
//! Amounts are plain two-decimal numbers and dates are `DD/MM/YYYY`.

use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};
use tracing::debug;

use crate::error::Result;
use crate::invoice::{normalize_amount, normalize_date, InvoiceRow};
use crate::models::record::TransactionRecord;

pub const TRANSACTION_HEADERS: [&str; 3] = ["Date", "Description", "Amount"];

pub const INVOICE_HEADERS: [&str; 6] = [
    "File",
    "Supplier Name",
    "Document Date",
    "Document Number",
    "Total Amount",
    "Template",
];

fn writer<W: Write>(inner: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(inner)
}

/// Write statement transactions.
pub fn write_transactions_csv<W: Write>(inner: W, records: &[TransactionRecord]) -> Result<()> {
    let mut wtr = writer(inner);
    wtr.write_record(TRANSACTION_HEADERS)?;
    for record in records {
        wtr.write_record([
            record.date_string(),
            record.description.clone(),
            record.amount_string(),
        ])?;
    }
    wtr.flush()?;
    debug!("Wrote {} transaction rows", records.len());
    Ok(())
}

/// Write invoice rows. The template's official export name replaces the
/// extracted supplier name when set; dates and totals are normalized.
pub fn write_invoices_csv<W: Write>(inner: W, rows: &[InvoiceRow]) -> Result<()> {
    let mut wtr = writer(inner);
    wtr.write_record(INVOICE_HEADERS)?;
    for row in rows {
        let fields = &row.fields;
        let date = fields.document_date.as_deref().map(normalize_date).unwrap_or_default();
        let total = fields.total_amount.as_deref().map(normalize_amount).unwrap_or_default();
        wtr.write_record([
            row.file.as_str(),
            row.export_supplier_name().unwrap_or_default(),
            date.as_str(),
            fields.document_number.as_deref().unwrap_or_default(),
            total.as_str(),
            row.template_name.as_deref().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    debug!("Wrote {} invoice rows", rows.len());
    Ok(())
}

/// Transactions as a CSV string.
pub fn transactions_to_csv(records: &[TransactionRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_transactions_csv(&mut buf, records)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Invoice rows as a CSV string.
pub fn invoices_to_csv(rows: &[InvoiceRow]) -> Result<String> {
    let mut buf = Vec::new();
    write_invoices_csv(&mut buf, rows)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
