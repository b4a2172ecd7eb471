mod invoice;
mod line_item;

pub use invoice::{
    CreateInvoiceRequest, CreateLineItemRequest, DiscountType, Invoice, InvoiceStatus,
    PaymentMethod, PaymentRequest, UpdateInvoiceTerms, DEFAULT_TERMS,
};
pub use line_item::LineItem;
