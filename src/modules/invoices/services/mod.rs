pub mod invoice_number;
pub mod invoice_service;

pub use invoice_service::InvoiceService;
