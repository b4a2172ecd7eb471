// Persistence seam for the invoice ledger.
//
// The engine runs a read-full-aggregate, compute, write-back cycle per
// operation, so correctness hangs on two guarantees the store must provide:
// check-and-set updates keyed on the version read, and a unique constraint
// on invoice_number. Both surface as ConcurrentModification, the one error
// in the taxonomy a caller may retry after re-reading.

use async_trait::async_trait;

use crate::core::Result;
use crate::modules::invoices::models::Invoice;

/// Listing filter for invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceQuery {
    /// Case-insensitive substring match over patient name and invoice number
    pub search: Option<String>,

    /// Restrict to a single patient
    pub patient_id: Option<String>,

    /// Page size; stores cap this at 100
    pub limit: Option<i64>,

    /// Number of results to skip
    pub offset: Option<i64>,
}

/// Repository for invoice storage operations
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Persist a freshly created invoice.
    ///
    /// Enforces invoice_number uniqueness: a collision fails with
    /// `ConcurrentModification` so the caller can recompute the sequence
    /// and retry.
    async fn insert(&self, invoice: &Invoice) -> Result<Invoice>;

    /// Find an invoice by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>>;

    /// Find an invoice by its human-readable number
    async fn find_by_number(&self, invoice_number: &str) -> Result<Option<Invoice>>;

    /// Replace a stored invoice if and only if its version still matches
    /// `expected_version`.
    ///
    /// On success the stored invoice carries `expected_version + 1`. A
    /// version mismatch fails with `ConcurrentModification` and writes
    /// nothing; a missing invoice fails with `NotFound`.
    async fn update(&self, id: &str, expected_version: u64, invoice: &Invoice)
        -> Result<Invoice>;

    /// Number of invoices currently stored; feeds invoice-number sequencing
    async fn count(&self) -> Result<u64>;

    /// List invoices, most recently created first
    async fn list(&self, query: &InvoiceQuery) -> Result<Vec<Invoice>>;

    /// Administrative removal. Not part of the invoice lifecycle; callers
    /// gate access.
    async fn delete(&self, id: &str) -> Result<()>;
}
