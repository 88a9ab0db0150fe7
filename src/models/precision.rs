//! Fixed-precision truncation for ledger amounts.

use rust_decimal::{Decimal, RoundingStrategy};

/// Asset that funds every purchase and receives every sale.
pub const QUOTE_ASSET: &str = "USDT";

/// Fractional digits kept for quote-denominated amounts.
pub const QUOTE_DECIMALS: u32 = 6;

/// Fractional digits kept for base-asset quantities.
pub const BASE_DECIMALS: u32 = 8;

/// Truncate toward zero at `decimals` fractional digits. Never rounds up.
pub fn truncate(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
}

pub fn truncate_quote(value: Decimal) -> Decimal {
    truncate(value, QUOTE_DECIMALS)
}

pub fn truncate_base(value: Decimal) -> Decimal {
    truncate(value, BASE_DECIMALS)
}
