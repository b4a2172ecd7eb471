// A line item is a single billable entry on a clinic invoice: a consultation,
// a procedure, a lab charge. Each line item derives its amount from
// quantity × rate with ledger-scale rounding; the amount is never caller-set.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{money, AppError, Result};

/// Represents a single billable entry on an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Description of the service or charge
    pub description: String,

    /// Quantity billed
    pub quantity: i32,

    /// Price per unit
    pub rate: Decimal,

    /// Calculated amount (quantity × rate, rounded to ledger scale)
    pub amount: Decimal,
}

impl LineItem {
    /// Create a new line item with validation
    ///
    /// # Arguments
    /// * `description` - Service description (non-empty, max 255 chars)
    /// * `quantity` - Must be at least 1
    /// * `rate` - Must be non-negative
    ///
    /// # Returns
    /// * `Result<Self>` - Validated line item with derived amount
    pub fn new(description: String, quantity: i32, rate: Decimal) -> Result<Self> {
        Self::validate_description(&description)?;
        Self::validate_quantity(quantity)?;
        Self::validate_rate(rate)?;

        let mut line_item = Self {
            description,
            quantity,
            rate,
            amount: Decimal::ZERO,
        };

        line_item.calculate_amount();

        Ok(line_item)
    }

    /// Recalculate the derived amount
    ///
    /// Formula: amount = quantity × rate, rounded to the ledger scale
    pub fn calculate_amount(&mut self) {
        let raw_amount = Decimal::from(self.quantity) * self.rate;
        self.amount = money::round(raw_amount);
    }

    fn validate_description(description: &str) -> Result<()> {
        if description.trim().is_empty() {
            return Err(AppError::validation("Line item description cannot be empty"));
        }

        if description.len() > 255 {
            return Err(AppError::validation(
                "Line item description cannot exceed 255 characters",
            ));
        }

        Ok(())
    }

    fn validate_quantity(quantity: i32) -> Result<()> {
        if quantity < 1 {
            return Err(AppError::validation(format!(
                "Quantity must be at least 1, got: {}",
                quantity
            )));
        }

        Ok(())
    }

    fn validate_rate(rate: Decimal) -> Result<()> {
        if rate < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Rate must be non-negative, got: {}",
                rate
            )));
        }

        Ok(())
    }
}
