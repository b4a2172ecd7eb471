// Integration test for payment application through the service, including
// the optimistic-concurrency contract at the persistence seam.

#[path = "../helpers/mod.rs"]
mod helpers;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use careledger::core::AppError;
use careledger::invoices::{InvoiceStatus, PaymentMethod, PaymentRequest};
use helpers::TestDataFactory;

fn payment(amount: Decimal) -> PaymentRequest {
    PaymentRequest {
        amount,
        payment_method: PaymentMethod::Upi,
        payment_date: Utc::now().date_naive(),
        notes: None,
    }
}

#[tokio::test]
async fn test_payment_persists_through_the_store() -> anyhow::Result<()> {
    let (service, repo) = helpers::test_service();

    let created = service
        .create_invoice(TestDataFactory::create_invoice_request())
        .await?;

    service
        .apply_payment(&created.id, None, &payment(dec!(200)))
        .await?;

    // Re-read straight from the repository: the write stuck
    let stored = repo_invoice(&repo, &created.id).await;
    assert_eq!(stored.amount_paid, dec!(200));
    assert_eq!(stored.balance, dec!(300));
    assert_eq!(stored.status, InvoiceStatus::PartiallyPaid);
    assert_eq!(stored.version, 2);

    Ok(())
}

#[tokio::test]
async fn test_rejected_payment_persists_nothing() -> anyhow::Result<()> {
    let (service, repo) = helpers::test_service();

    let created = service
        .create_invoice(TestDataFactory::create_invoice_request())
        .await?;
    service
        .apply_payment(&created.id, None, &payment(dec!(200)))
        .await?;

    let before = repo_invoice(&repo, &created.id).await;

    let result = service
        .apply_payment(&created.id, None, &payment(dec!(900)))
        .await;
    assert!(matches!(result, Err(AppError::PaymentExceedsBalance(_))));

    let after = repo_invoice(&repo, &created.id).await;
    assert_eq!(before, after);

    Ok(())
}

#[tokio::test]
async fn test_stale_version_token_is_rejected() -> anyhow::Result<()> {
    let (service, _repo) = helpers::test_service();

    let created = service
        .create_invoice(TestDataFactory::create_invoice_request())
        .await?;

    // A front-desk client read the invoice at version 1...
    let read = service.get_invoice(&created.id).await?;
    assert_eq!(read.version, 1);

    // ...another client recorded a payment in the meantime
    service
        .apply_payment(&created.id, None, &payment(dec!(100)))
        .await?;

    // The first client's token is now stale and must not double-apply
    let stale = service
        .apply_payment(&created.id, Some(read.version), &payment(dec!(100)))
        .await;
    assert!(matches!(stale, Err(AppError::ConcurrentModification(_))));

    // Re-read and retry the same logical payment exactly once
    let fresh = service.get_invoice(&created.id).await?;
    let retried = service
        .apply_payment(&created.id, Some(fresh.version), &payment(dec!(100)))
        .await?;
    assert_eq!(retried.amount_paid, dec!(200));

    Ok(())
}

#[tokio::test]
async fn test_payment_on_missing_invoice() {
    let (service, _repo) = helpers::test_service();

    let result = service
        .apply_payment("no-such-id", None, &payment(dec!(100)))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_exact_balance_payment_settles() -> anyhow::Result<()> {
    let (service, _repo) = helpers::test_service();

    let mut request = TestDataFactory::create_invoice_request_with(vec![
        ("Physiotherapy session", 2, dec!(300)),
    ]);
    request.discount = dec!(10);
    request.discount_type = careledger::invoices::DiscountType::Percentage;
    request.tax_rate = dec!(18);

    let created = service.create_invoice(request).await?;
    assert_eq!(created.total, dec!(637.20));

    let settled = service
        .apply_payment(&created.id, None, &payment(dec!(637.20)))
        .await?;
    assert_eq!(settled.balance, dec!(0));
    assert_eq!(settled.status, InvoiceStatus::Paid);

    Ok(())
}

async fn repo_invoice(
    repo: &std::sync::Arc<careledger::invoices::InMemoryInvoiceRepository>,
    id: &str,
) -> careledger::invoices::Invoice {
    use careledger::invoices::InvoiceRepository;

    repo.find_by_id(id).await.unwrap().unwrap()
}
