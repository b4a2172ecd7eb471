// Tests for invoice number assignment.
//
// Numbers follow INV + 2-digit year + 2-digit month + zero-padded sequence,
// with the store's unique constraint as the real arbiter of uniqueness.

#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::{Datelike, NaiveDate, Utc};

use careledger::invoices::services::invoice_number::{
    format_invoice_number, INVOICE_NUMBER_PREFIX,
};
use helpers::TestDataFactory;

#[test]
fn test_number_layout() {
    let date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();

    assert_eq!(format_invoice_number(date, 1), "INV26080001");
    assert_eq!(format_invoice_number(date, 9999), "INV26089999");
}

#[test]
fn test_number_pads_month_and_sequence() {
    let date = NaiveDate::from_ymd_opt(2027, 3, 1).unwrap();

    assert_eq!(format_invoice_number(date, 12), "INV27030012");
}

#[test]
fn test_number_widens_past_four_digit_sequence() {
    let date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();

    assert_eq!(format_invoice_number(date, 10000), "INV260810000");
}

#[tokio::test]
async fn test_sequential_creation_assigns_increasing_numbers() {
    let (service, _repo) = helpers::test_service();

    let today = Utc::now().date_naive();
    let expected_prefix = format!(
        "{}{:02}{:02}",
        INVOICE_NUMBER_PREFIX,
        today.year() % 100,
        today.month()
    );

    let mut numbers = Vec::new();
    for _ in 0..5 {
        let invoice = service
            .create_invoice(TestDataFactory::create_invoice_request())
            .await
            .unwrap();
        assert!(invoice.invoice_number.starts_with(&expected_prefix));
        numbers.push(invoice.invoice_number);
    }

    let mut deduped = numbers.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), numbers.len());

    assert_eq!(numbers[0], format!("{}0001", expected_prefix));
    assert_eq!(numbers[4], format!("{}0005", expected_prefix));
}
