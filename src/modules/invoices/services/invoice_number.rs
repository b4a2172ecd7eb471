use chrono::{Datelike, NaiveDate};

/// Prefix carried by every invoice number
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

/// Format an invoice number from the assignment date and a sequence value.
///
/// Layout: `INV` + 2-digit year + 2-digit month + 4-digit zero-padded
/// sequence. Sequences past 9999 widen rather than wrap, so uniqueness is
/// preserved at the cost of a longer number.
pub fn format_invoice_number(date: NaiveDate, sequence: u64) -> String {
    format!(
        "{}{:02}{:02}{:04}",
        INVOICE_NUMBER_PREFIX,
        date.year() % 100,
        date.month(),
        sequence
    )
}
