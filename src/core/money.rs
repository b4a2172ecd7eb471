use rust_decimal::Decimal;

/// Decimal places carried by every monetary field on the ledger.
///
/// The clinic bills in a single currency with two minor units, so unlike a
/// multi-currency gateway there is no per-invoice scale to thread through.
pub const SCALE: u32 = 2;

/// Rounds a raw arithmetic result to the ledger scale (banker's rounding)
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp(SCALE)
}

/// Smallest representable amount on the ledger
pub fn smallest_unit() -> Decimal {
    Decimal::new(1, SCALE)
}

/// Validates that an amount is non-negative and carries no sub-unit precision
pub fn validate_amount(amount: Decimal) -> std::result::Result<(), String> {
    if amount < Decimal::ZERO {
        return Err(format!("Amount cannot be negative, got: {}", amount));
    }

    if amount.scale() > SCALE {
        return Err(format!(
            "Amounts must have at most {} decimal places, got {}",
            SCALE,
            amount.scale()
        ));
    }

    Ok(())
}

/// Formats an amount for display with the ledger scale
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.width$}", amount, width = SCALE as usize)
}
