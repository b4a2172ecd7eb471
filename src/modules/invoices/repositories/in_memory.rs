use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::invoice_repository::{InvoiceQuery, InvoiceRepository};
use crate::core::{AppError, Result};
use crate::modules::invoices::models::Invoice;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// In-memory invoice store with check-and-set semantics.
///
/// Intended for tests and embedders that do not need durability. Not
/// optimized for large invoice counts.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    invoices: RwLock<HashMap<String, Invoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn insert(&self, invoice: &Invoice) -> Result<Invoice> {
        let mut invoices = self
            .invoices
            .write()
            .map_err(|_| AppError::internal("invoice store lock poisoned"))?;

        if invoices.contains_key(&invoice.id) {
            return Err(AppError::internal(format!(
                "Invoice id '{}' already stored",
                invoice.id
            )));
        }

        // Unique constraint on the human-readable number
        if invoices
            .values()
            .any(|stored| stored.invoice_number == invoice.invoice_number)
        {
            return Err(AppError::concurrent_modification(format!(
                "Invoice number '{}' is already assigned",
                invoice.invoice_number
            )));
        }

        invoices.insert(invoice.id.clone(), invoice.clone());

        Ok(invoice.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        let invoices = self
            .invoices
            .read()
            .map_err(|_| AppError::internal("invoice store lock poisoned"))?;

        Ok(invoices.get(id).cloned())
    }

    async fn find_by_number(&self, invoice_number: &str) -> Result<Option<Invoice>> {
        let invoices = self
            .invoices
            .read()
            .map_err(|_| AppError::internal("invoice store lock poisoned"))?;

        Ok(invoices
            .values()
            .find(|stored| stored.invoice_number == invoice_number)
            .cloned())
    }

    async fn update(
        &self,
        id: &str,
        expected_version: u64,
        invoice: &Invoice,
    ) -> Result<Invoice> {
        let mut invoices = self
            .invoices
            .write()
            .map_err(|_| AppError::internal("invoice store lock poisoned"))?;

        let stored_version = invoices
            .get(id)
            .map(|stored| stored.version)
            .ok_or_else(|| AppError::not_found(format!("Invoice with id '{}' not found", id)))?;

        if stored_version != expected_version {
            return Err(AppError::concurrent_modification(format!(
                "Invoice '{}' changed since it was read (expected version {}, found {})",
                id, expected_version, stored_version
            )));
        }

        let mut updated = invoice.clone();
        updated.version = expected_version + 1;
        invoices.insert(id.to_string(), updated.clone());

        Ok(updated)
    }

    async fn count(&self) -> Result<u64> {
        let invoices = self
            .invoices
            .read()
            .map_err(|_| AppError::internal("invoice store lock poisoned"))?;

        Ok(invoices.len() as u64)
    }

    async fn list(&self, query: &InvoiceQuery) -> Result<Vec<Invoice>> {
        let invoices = self
            .invoices
            .read()
            .map_err(|_| AppError::internal("invoice store lock poisoned"))?;

        let search = query.search.as_ref().map(|s| s.to_lowercase());

        let mut matches: Vec<Invoice> = invoices
            .values()
            .filter(|invoice| {
                if let Some(patient_id) = &query.patient_id {
                    if &invoice.patient_id != patient_id {
                        return false;
                    }
                }

                if let Some(needle) = &search {
                    return invoice.patient_name.to_lowercase().contains(needle)
                        || invoice.invoice_number.to_lowercase().contains(needle);
                }

                true
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.invoice_number.cmp(&a.invoice_number))
        });

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE) as usize;
        let offset = query.offset.unwrap_or(0).max(0) as usize;

        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut invoices = self
            .invoices
            .write()
            .map_err(|_| AppError::internal("invoice store lock poisoned"))?;

        invoices
            .remove(id)
            .ok_or_else(|| AppError::not_found(format!("Invoice with id '{}' not found", id)))?;

        Ok(())
    }
}
