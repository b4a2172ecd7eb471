// Invoice aggregate with derived financial fields and status lifecycle.
//
// An invoice captures a patient's billable services, discount and tax
// parameters, and payments applied against the total. The monetary fields
// subtotal, tax, total, and balance are always derived; callers supply only
// line items, discount, tax rate, and payments. Status is derived from the
// balance by a single function so every mutation path agrees.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::line_item::LineItem;
use crate::core::{money, AppError, Result};

/// Default payment terms printed on an invoice when none are supplied
pub const DEFAULT_TERMS: &str = "Payment is due within 30 days of invoice date.";

const MAX_NOTES_LEN: usize = 500;
const MAX_TERMS_LEN: usize = 1000;
const MAX_PAYMENT_NOTES_LEN: usize = 200;

/// Invoice status lifecycle
///
/// `Overdue` is a derived, read-time fact: it is reported by
/// [`Invoice::effective_status`] and never persisted, so a payment arriving
/// after the due date still finds the stored draft/sent/partially-paid state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Invoice created but not yet issued to the patient
    #[serde(rename = "draft")]
    Draft,

    /// Invoice issued to the patient, no payment received
    #[serde(rename = "sent")]
    Sent,

    /// Balance settled in full
    #[serde(rename = "paid")]
    Paid,

    /// Some payment received, balance outstanding
    #[serde(rename = "partially-paid")]
    PartiallyPaid,

    /// Balance outstanding past the due date (derived at read time)
    #[serde(rename = "overdue")]
    Overdue,

    /// Voided by an explicit cancel; terminal
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl InvoiceStatus {
    /// Terminal statuses admit no further mutation
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Draft => write!(f, "draft"),
            InvoiceStatus::Sent => write!(f, "sent"),
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::PartiallyPaid => write!(f, "partially-paid"),
            InvoiceStatus::Overdue => write!(f, "overdue"),
            InvoiceStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(InvoiceStatus::Draft),
            "sent" => Ok(InvoiceStatus::Sent),
            "paid" => Ok(InvoiceStatus::Paid),
            "partially-paid" => Ok(InvoiceStatus::PartiallyPaid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(format!("Invalid invoice status: {}", s)),
        }
    }
}

/// How the discount figure on an invoice is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscountType {
    /// Discount is a percentage of the subtotal
    #[serde(rename = "percentage")]
    Percentage,

    /// Discount is a flat amount
    #[serde(rename = "fixed")]
    Fixed,
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::Fixed
    }
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
        }
    }
}

/// Payment channels accepted at the clinic's front desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "upi")]
    Upi,
    #[serde(rename = "bank-transfer")]
    BankTransfer,
    #[serde(rename = "online")]
    Online,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::BankTransfer => write!(f, "bank-transfer"),
            PaymentMethod::Online => write!(f, "online"),
        }
    }
}

/// Input for a single line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLineItemRequest {
    pub description: String,
    pub quantity: i32,
    pub rate: Decimal,
}

/// Input for invoice creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    pub patient_name: String,
    pub patient_phone: String,
    #[serde(default)]
    pub patient_email: Option<String>,
    #[serde(default)]
    pub patient_address: Option<String>,
    pub date: NaiveDate,
    /// Defaults to `date + default_due_days` when omitted
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub items: Vec<CreateLineItemRequest>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Payment already collected at the desk when the invoice is raised
    #[serde(default)]
    pub amount_paid: Decimal,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
}

/// Partial update of an invoice's terms; omitted fields retain prior values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateInvoiceTerms {
    #[serde(default)]
    pub items: Option<Vec<CreateLineItemRequest>>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub discount_type: Option<DiscountType>,
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
}

/// A payment to apply against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payment amount must be positive, got: {}",
                self.amount
            )));
        }

        if let Some(notes) = &self.notes {
            if notes.len() > MAX_PAYMENT_NOTES_LEN {
                return Err(AppError::validation(format!(
                    "Payment notes cannot exceed {} characters",
                    MAX_PAYMENT_NOTES_LEN
                )));
            }
        }

        Ok(())
    }
}

/// Represents a clinic invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique invoice ID (UUID)
    pub id: String,

    /// Human-readable number, unique and immutable once assigned
    pub invoice_number: String,

    /// Reference into the patient directory; existence is the caller's concern
    pub patient_id: String,

    /// Optional reference to the appointment this invoice bills
    pub appointment_id: Option<String>,

    /// Patient snapshot, denormalized onto the invoice at creation
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub patient_address: Option<String>,

    /// Invoice date
    pub date: NaiveDate,

    /// Payment due date; never precedes `date`
    pub due_date: NaiveDate,

    /// Billable entries, insertion order preserved, never empty
    pub line_items: Vec<LineItem>,

    /// Discount figure, interpreted per `discount_type`
    pub discount: Decimal,
    pub discount_type: DiscountType,

    /// Tax percentage applied to the discounted subtotal, 0..=100
    pub tax_rate: Decimal,

    /// Sum of line item amounts (derived)
    pub subtotal: Decimal,

    /// Tax on the discounted subtotal (derived)
    pub tax: Decimal,

    /// subtotal − discount amount + tax (derived)
    pub total: Decimal,

    /// Cumulative payments applied; monotonically non-decreasing
    pub amount_paid: Decimal,

    /// total − amount_paid (derived)
    pub balance: Decimal,

    /// Persisted status; overdue is layered on at read time
    pub status: InvoiceStatus,

    /// Method and date of the most recent payment
    pub payment_method: Option<PaymentMethod>,
    pub payment_date: Option<NaiveDate>,

    pub notes: Option<String>,
    pub terms: Option<String>,

    /// Optimistic-concurrency token, bumped by every repository update
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a new invoice with validation
    ///
    /// # Arguments
    /// * `request` - Validated creation input from the caller
    /// * `invoice_number` - Freshly assigned unique invoice number
    /// * `default_due_days` - Fallback due-date offset when the request omits one
    ///
    /// # Returns
    /// * `Result<Self>` - Fully derived invoice in its initial status
    pub fn new(
        request: &CreateInvoiceRequest,
        invoice_number: String,
        default_due_days: i64,
    ) -> Result<Self> {
        Self::validate_patient(request)?;
        Self::validate_tax_rate(request.tax_rate)?;
        Self::validate_notes(request.notes.as_deref())?;
        Self::validate_terms(request.terms.as_deref())?;

        let line_items = Self::build_line_items(&request.items)?;

        let due_date = request
            .due_date
            .unwrap_or(request.date + Duration::days(default_due_days));
        if due_date < request.date {
            return Err(AppError::validation(format!(
                "Due date {} cannot precede invoice date {}",
                due_date, request.date
            )));
        }

        money::validate_amount(request.amount_paid).map_err(AppError::Validation)?;

        let now = Utc::now();

        let mut invoice = Self {
            id: Uuid::new_v4().to_string(),
            invoice_number,
            patient_id: request.patient_id.clone(),
            appointment_id: request.appointment_id.clone(),
            patient_name: request.patient_name.trim().to_string(),
            patient_phone: request.patient_phone.trim().to_string(),
            patient_email: request.patient_email.clone(),
            patient_address: request.patient_address.clone(),
            date: request.date,
            due_date,
            line_items,
            discount: request.discount,
            discount_type: request.discount_type,
            tax_rate: request.tax_rate,
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            total: Decimal::ZERO,
            amount_paid: request.amount_paid,
            balance: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            payment_method: request.payment_method,
            payment_date: None,
            notes: request.notes.clone(),
            terms: Some(
                request
                    .terms
                    .clone()
                    .unwrap_or_else(|| DEFAULT_TERMS.to_string()),
            ),
            version: 1,
            created_at: now,
            updated_at: now,
        };

        invoice.recompute_totals()?;

        if invoice.amount_paid > invoice.total {
            return Err(AppError::validation(format!(
                "Amount paid {} cannot exceed invoice total {}",
                invoice.amount_paid, invoice.total
            )));
        }

        invoice.recompute_balance_and_status();

        Ok(invoice)
    }

    /// Discount amount implied by the current figure and type, clamped to
    /// `[0, subtotal]` so the taxable base can never go negative
    pub fn discount_amount(&self) -> Decimal {
        let raw = match self.discount_type {
            DiscountType::Percentage => self.subtotal * self.discount / Decimal::from(100),
            DiscountType::Fixed => self.discount,
        };

        money::round(raw.clamp(Decimal::ZERO, self.subtotal))
    }

    /// Derive the persisted status from the money columns.
    ///
    /// The single authority for status: every mutation path funnels through
    /// here. Cancelled is sticky; a settled balance means paid; any payment
    /// against an open balance means partially paid; otherwise the invoice
    /// keeps its draft/sent standing. The overdue date rule lives in
    /// [`Invoice::effective_status`] instead so it is never persisted.
    pub fn derive_status(
        balance: Decimal,
        amount_paid: Decimal,
        current: InvoiceStatus,
    ) -> InvoiceStatus {
        if current == InvoiceStatus::Cancelled {
            InvoiceStatus::Cancelled
        } else if balance <= Decimal::ZERO {
            InvoiceStatus::Paid
        } else if amount_paid > Decimal::ZERO {
            InvoiceStatus::PartiallyPaid
        } else if current == InvoiceStatus::Sent {
            InvoiceStatus::Sent
        } else {
            InvoiceStatus::Draft
        }
    }

    /// Status as seen by readers: overdue when the balance is open past the
    /// due date and the invoice is not terminal
    pub fn effective_status(&self, today: NaiveDate) -> InvoiceStatus {
        if !self.status.is_terminal() && self.balance > Decimal::ZERO && self.due_date < today {
            InvoiceStatus::Overdue
        } else {
            self.status
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.effective_status(today) == InvoiceStatus::Overdue
    }

    /// Apply a partial update of the invoice's terms and re-derive all
    /// financial fields.
    ///
    /// Fails without touching the invoice: terminal statuses reject the edit,
    /// and an edit that would drop the total below payments already applied
    /// is an overpayment inconsistency rather than a silent clamp.
    pub fn update_terms(&mut self, changes: &UpdateInvoiceTerms) -> Result<()> {
        if self.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "Cannot edit a {} invoice",
                self.status
            )));
        }

        // Build the merged candidate first so a failed edit leaves self intact
        let mut next = self.clone();

        if let Some(items) = &changes.items {
            next.line_items = Self::build_line_items(items)?;
        }
        if let Some(discount) = changes.discount {
            next.discount = discount;
        }
        if let Some(discount_type) = changes.discount_type {
            next.discount_type = discount_type;
        }
        if let Some(tax_rate) = changes.tax_rate {
            Self::validate_tax_rate(tax_rate)?;
            next.tax_rate = tax_rate;
        }
        if let Some(due_date) = changes.due_date {
            if due_date < next.date {
                return Err(AppError::validation(format!(
                    "Due date {} cannot precede invoice date {}",
                    due_date, next.date
                )));
            }
            next.due_date = due_date;
        }
        if let Some(notes) = &changes.notes {
            Self::validate_notes(Some(notes))?;
            next.notes = Some(notes.clone());
        }
        if let Some(terms) = &changes.terms {
            Self::validate_terms(Some(terms))?;
            next.terms = Some(terms.clone());
        }

        next.recompute_totals()?;

        if next.amount_paid > next.total {
            return Err(AppError::OverpaymentInconsistency(format!(
                "New total {} is below the {} already paid on invoice {}",
                next.total, next.amount_paid, next.invoice_number
            )));
        }

        next.recompute_balance_and_status();
        next.updated_at = Utc::now();

        *self = next;
        Ok(())
    }

    /// Apply a payment against the outstanding balance.
    ///
    /// All checks run before any field changes, so a rejected payment leaves
    /// the invoice exactly as it was. Payment notes are replace-semantics:
    /// the latest payment's notes win.
    pub fn apply_payment(&mut self, payment: &PaymentRequest) -> Result<()> {
        payment.validate()?;

        if self.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "Cannot record a payment on a {} invoice",
                self.status
            )));
        }

        let new_amount_paid = self.amount_paid + payment.amount;
        if new_amount_paid > self.total {
            return Err(AppError::PaymentExceedsBalance(format!(
                "Payment of {} exceeds the outstanding balance {} on invoice {}",
                payment.amount, self.balance, self.invoice_number
            )));
        }

        self.amount_paid = new_amount_paid;
        self.payment_method = Some(payment.payment_method);
        self.payment_date = Some(payment.payment_date);
        if let Some(notes) = &payment.notes {
            self.notes = Some(notes.clone());
        }

        self.recompute_balance_and_status();
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Cancel the invoice from any non-cancelled state. Terminal; no refund
    /// of payments already applied.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status == InvoiceStatus::Cancelled {
            return Err(AppError::invalid_state(format!(
                "Invoice {} is already cancelled",
                self.invoice_number
            )));
        }

        self.status = InvoiceStatus::Cancelled;
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Mark a draft invoice as issued to the patient
    pub fn mark_sent(&mut self) -> Result<()> {
        if self.status != InvoiceStatus::Draft {
            return Err(AppError::invalid_state(format!(
                "Only draft invoices can be marked sent, current status: {}",
                self.status
            )));
        }

        self.status = InvoiceStatus::Sent;
        self.updated_at = Utc::now();

        Ok(())
    }

    /// Recompute subtotal, tax, and total from line items and the
    /// discount/tax parameters
    fn recompute_totals(&mut self) -> Result<()> {
        if self.line_items.is_empty() {
            return Err(AppError::validation(
                "Invoice must have at least one line item",
            ));
        }

        Self::validate_discount(self.discount, self.discount_type)?;

        for item in &mut self.line_items {
            item.calculate_amount();
        }

        let raw_subtotal: Decimal = self.line_items.iter().map(|item| item.amount).sum();
        self.subtotal = money::round(raw_subtotal);

        if self.discount_type == DiscountType::Fixed && self.discount > self.subtotal {
            return Err(AppError::validation(format!(
                "Fixed discount {} cannot exceed subtotal {}",
                self.discount, self.subtotal
            )));
        }

        let taxable = self.subtotal - self.discount_amount();
        self.tax = money::round(taxable * self.tax_rate / Decimal::from(100));
        self.total = money::round(taxable + self.tax);

        Ok(())
    }

    /// Recompute the balance and re-derive the persisted status
    fn recompute_balance_and_status(&mut self) {
        self.balance = self.total - self.amount_paid;
        self.status = Self::derive_status(self.balance, self.amount_paid, self.status);
    }

    fn build_line_items(items: &[CreateLineItemRequest]) -> Result<Vec<LineItem>> {
        if items.is_empty() {
            return Err(AppError::validation(
                "Invoice must have at least one line item",
            ));
        }

        items
            .iter()
            .map(|item| LineItem::new(item.description.clone(), item.quantity, item.rate))
            .collect()
    }

    // Validation methods

    fn validate_patient(request: &CreateInvoiceRequest) -> Result<()> {
        if request.patient_id.trim().is_empty() {
            return Err(AppError::validation("Patient is required"));
        }

        if request.patient_name.trim().len() < 2 {
            return Err(AppError::validation("Patient name is required"));
        }

        if request.patient_phone.trim().len() < 10 {
            return Err(AppError::validation("Valid patient phone number is required"));
        }

        Ok(())
    }

    fn validate_tax_rate(tax_rate: Decimal) -> Result<()> {
        if tax_rate < Decimal::ZERO || tax_rate > Decimal::from(100) {
            return Err(AppError::validation(format!(
                "Tax rate must be between 0 and 100, got: {}",
                tax_rate
            )));
        }

        Ok(())
    }

    fn validate_discount(discount: Decimal, discount_type: DiscountType) -> Result<()> {
        if discount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Discount must be non-negative, got: {}",
                discount
            )));
        }

        if discount_type == DiscountType::Percentage && discount > Decimal::from(100) {
            return Err(AppError::validation(format!(
                "Percentage discount cannot exceed 100, got: {}",
                discount
            )));
        }

        Ok(())
    }

    fn validate_notes(notes: Option<&str>) -> Result<()> {
        if let Some(notes) = notes {
            if notes.len() > MAX_NOTES_LEN {
                return Err(AppError::validation(format!(
                    "Notes cannot exceed {} characters",
                    MAX_NOTES_LEN
                )));
            }
        }

        Ok(())
    }

    fn validate_terms(terms: Option<&str>) -> Result<()> {
        if let Some(terms) = terms {
            if terms.len() > MAX_TERMS_LEN {
                return Err(AppError::validation(format!(
                    "Terms cannot exceed {} characters",
                    MAX_TERMS_LEN
                )));
            }
        }

        Ok(())
    }
}
