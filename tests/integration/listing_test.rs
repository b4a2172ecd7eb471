// Integration test for invoice listing: search, patient filter, paging,
// and the read-time overdue derivation.

#[path = "../helpers/mod.rs"]
mod helpers;

use rust_decimal_macros::dec;

use careledger::invoices::{InvoiceQuery, InvoiceStatus};
use helpers::TestDataFactory;

#[tokio::test]
async fn test_search_matches_patient_name_and_number() -> anyhow::Result<()> {
    let (service, _repo) = helpers::test_service();

    let mut first = TestDataFactory::create_invoice_request();
    first.patient_name = "Asha Verma".to_string();
    let first = service.create_invoice(first).await?;

    let mut second = TestDataFactory::create_invoice_request();
    second.patient_name = "Ravi Iyer".to_string();
    service.create_invoice(second).await?;

    let by_name = service
        .list_invoices(&InvoiceQuery {
            search: Some("verma".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].patient_name, "Asha Verma");

    let by_number = service
        .list_invoices(&InvoiceQuery {
            search: Some(first.invoice_number.clone()),
            ..Default::default()
        })
        .await?;
    assert_eq!(by_number.len(), 1);
    assert_eq!(by_number[0].id, first.id);

    let no_match = service
        .list_invoices(&InvoiceQuery {
            search: Some("nobody".to_string()),
            ..Default::default()
        })
        .await?;
    assert!(no_match.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_patient_filter() -> anyhow::Result<()> {
    let (service, _repo) = helpers::test_service();

    let request = TestDataFactory::create_invoice_request();
    let patient_id = request.patient_id.clone();
    service.create_invoice(request).await?;
    service
        .create_invoice(TestDataFactory::create_invoice_request())
        .await?;

    let for_patient = service
        .list_invoices(&InvoiceQuery {
            patient_id: Some(patient_id.clone()),
            ..Default::default()
        })
        .await?;
    assert_eq!(for_patient.len(), 1);
    assert_eq!(for_patient[0].patient_id, patient_id);

    Ok(())
}

#[tokio::test]
async fn test_pagination_newest_first() -> anyhow::Result<()> {
    let (service, _repo) = helpers::test_service();

    let mut ids = Vec::new();
    for _ in 0..5 {
        let invoice = service
            .create_invoice(TestDataFactory::create_invoice_request())
            .await?;
        ids.push(invoice.id);
    }

    let first_page = service
        .list_invoices(&InvoiceQuery {
            limit: Some(2),
            offset: Some(0),
            ..Default::default()
        })
        .await?;
    assert_eq!(first_page.len(), 2);
    // Newest first
    assert_eq!(first_page[0].id, ids[4]);
    assert_eq!(first_page[1].id, ids[3]);

    let second_page = service
        .list_invoices(&InvoiceQuery {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        })
        .await?;
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[0].id, ids[2]);

    Ok(())
}

#[tokio::test]
async fn test_listing_surfaces_overdue() -> anyhow::Result<()> {
    let (service, repo) = helpers::test_service();

    let created = service
        .create_invoice(TestDataFactory::overdue_invoice_request())
        .await?;

    let listed = service.list_invoices(&InvoiceQuery::default()).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, InvoiceStatus::Overdue);
    assert_eq!(listed[0].balance, dec!(500));

    // The stored record still carries the draft status; overdue is derived
    use careledger::invoices::InvoiceRepository;
    let stored = repo.find_by_id(&created.id).await?.unwrap();
    assert_eq!(stored.status, InvoiceStatus::Draft);

    Ok(())
}
