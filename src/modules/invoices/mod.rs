// Invoices module

pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    CreateInvoiceRequest, CreateLineItemRequest, DiscountType, Invoice, InvoiceStatus, LineItem,
    PaymentMethod, PaymentRequest, UpdateInvoiceTerms,
};
pub use repositories::{InMemoryInvoiceRepository, InvoiceQuery, InvoiceRepository};
pub use services::InvoiceService;
