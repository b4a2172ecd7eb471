use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::invoice_number;
use crate::config::AppConfig;
use crate::core::error::AppError;
use crate::core::Result;
use crate::modules::invoices::models::{
    CreateInvoiceRequest, Invoice, PaymentRequest, UpdateInvoiceTerms,
};
use crate::modules::invoices::repositories::{InvoiceQuery, InvoiceRepository};

/// Attempts at assigning a unique invoice number before giving up.
/// Each retry recomputes the sequence from the store, so a loser of a
/// creation race lands on the next free slot almost immediately.
const MAX_NUMBERING_ATTEMPTS: u64 = 5;

/// Service for invoice business logic
pub struct InvoiceService {
    invoice_repo: Arc<dyn InvoiceRepository>,
    default_due_days: i64,
}

impl InvoiceService {
    pub fn new(invoice_repo: Arc<dyn InvoiceRepository>, config: &AppConfig) -> Self {
        Self {
            invoice_repo,
            default_due_days: config.default_due_days,
        }
    }

    /// Create a new invoice with a freshly assigned invoice number.
    ///
    /// The sequence is derived from the store's invoice count; the store's
    /// unique constraint on invoice_number is the real arbiter, and the
    /// sequence is recomputed and retried on collision rather than trusting
    /// an in-process counter across concurrent creations.
    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Invoice> {
        let assigned_on = Utc::now().date_naive();

        for attempt in 0..MAX_NUMBERING_ATTEMPTS {
            let sequence = self.invoice_repo.count().await? + 1 + attempt;
            let number = invoice_number::format_invoice_number(assigned_on, sequence);
            let invoice = Invoice::new(&request, number, self.default_due_days)?;

            match self.invoice_repo.insert(&invoice).await {
                Ok(created) => {
                    info!(
                        invoice_number = %created.invoice_number,
                        patient_id = %created.patient_id,
                        total = %created.total,
                        status = %created.status,
                        "Invoice created"
                    );
                    return Ok(created);
                }
                Err(AppError::ConcurrentModification(reason)) => {
                    warn!(
                        attempt = attempt + 1,
                        reason = %reason,
                        "Invoice number collision, recomputing sequence"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::concurrent_modification(format!(
            "Could not assign a unique invoice number after {} attempts",
            MAX_NUMBERING_ATTEMPTS
        )))
    }

    /// Get an invoice by ID, with overdue derived for the reader
    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        let invoice = self.find_required(id).await?;
        Ok(Self::with_effective_status(invoice))
    }

    /// List invoices matching the query, newest first, with overdue derived
    pub async fn list_invoices(&self, query: &InvoiceQuery) -> Result<Vec<Invoice>> {
        let invoices = self.invoice_repo.list(query).await?;

        Ok(invoices
            .into_iter()
            .map(Self::with_effective_status)
            .collect())
    }

    /// Apply a partial update of the invoice's terms and re-derive all
    /// financial fields.
    ///
    /// `expected_version` is the caller's concurrency token from an earlier
    /// read; when supplied, the edit fails with `ConcurrentModification` if
    /// the invoice has changed since.
    pub async fn update_invoice_terms(
        &self,
        id: &str,
        expected_version: Option<u64>,
        changes: &UpdateInvoiceTerms,
    ) -> Result<Invoice> {
        let mut invoice = self.find_required(id).await?;
        let version = Self::check_version(&invoice, expected_version)?;

        invoice.update_terms(changes)?;

        let updated = self.invoice_repo.update(id, version, &invoice).await?;
        info!(
            invoice_number = %updated.invoice_number,
            total = %updated.total,
            balance = %updated.balance,
            status = %updated.status,
            "Invoice terms updated"
        );

        Ok(updated)
    }

    /// Apply a payment against the invoice's outstanding balance.
    ///
    /// Rejection is atomic: a payment that would overshoot the total, or
    /// that arrives against a terminal invoice, changes nothing. A stale
    /// `expected_version` fails with `ConcurrentModification`; the caller
    /// may re-read and retry the same logical payment exactly once.
    pub async fn apply_payment(
        &self,
        id: &str,
        expected_version: Option<u64>,
        payment: &PaymentRequest,
    ) -> Result<Invoice> {
        let mut invoice = self.find_required(id).await?;
        let version = Self::check_version(&invoice, expected_version)?;

        invoice.apply_payment(payment)?;

        let updated = self.invoice_repo.update(id, version, &invoice).await?;
        info!(
            invoice_number = %updated.invoice_number,
            amount = %payment.amount,
            amount_paid = %updated.amount_paid,
            balance = %updated.balance,
            status = %updated.status,
            "Payment recorded"
        );

        Ok(updated)
    }

    /// Cancel an invoice. Terminal; no refund logic.
    pub async fn cancel_invoice(&self, id: &str) -> Result<Invoice> {
        let mut invoice = self.find_required(id).await?;
        let version = invoice.version;

        invoice.cancel()?;

        let updated = self.invoice_repo.update(id, version, &invoice).await?;
        info!(invoice_number = %updated.invoice_number, "Invoice cancelled");

        Ok(updated)
    }

    /// Mark a draft invoice as issued to the patient
    pub async fn mark_sent(&self, id: &str) -> Result<Invoice> {
        let mut invoice = self.find_required(id).await?;
        let version = invoice.version;

        invoice.mark_sent()?;

        let updated = self.invoice_repo.update(id, version, &invoice).await?;
        info!(invoice_number = %updated.invoice_number, "Invoice marked sent");

        Ok(updated)
    }

    /// Administrative removal of an invoice record. Carries none of the
    /// lifecycle guarantees; callers gate access.
    pub async fn delete_invoice(&self, id: &str) -> Result<()> {
        self.invoice_repo.delete(id).await?;
        warn!(invoice_id = %id, "Invoice deleted");

        Ok(())
    }

    async fn find_required(&self, id: &str) -> Result<Invoice> {
        self.invoice_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Invoice with id '{}' not found", id)))
    }

    fn check_version(invoice: &Invoice, expected_version: Option<u64>) -> Result<u64> {
        match expected_version {
            Some(expected) if expected != invoice.version => {
                Err(AppError::concurrent_modification(format!(
                    "Invoice '{}' changed since it was read (expected version {}, found {})",
                    invoice.id, expected, invoice.version
                )))
            }
            _ => Ok(invoice.version),
        }
    }

    fn with_effective_status(mut invoice: Invoice) -> Invoice {
        invoice.status = invoice.effective_status(Utc::now().date_naive());
        invoice
    }
}
