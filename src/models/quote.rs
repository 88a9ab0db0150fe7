//! Price table entries and mark prices.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One row of the price table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Decimal,
}

impl PriceQuote {
    pub fn new(symbol: impl Into<String>, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:>12}", self.symbol, self.price)
    }
}

/// Reference price used for valuation and sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPrice {
    pub symbol: String,
    pub mark_price: Decimal,
}

/// Symbols seeded into a fresh price table, in display order.
pub const TRACKED_SYMBOLS: [&str; 4] = ["BTCUSDT", "ETHUSDT", "BNBUSDT", "SOLUSDT"];

/// Seed prices written on first use of a ledger.
pub fn default_prices() -> Vec<PriceQuote> {
    vec![
        PriceQuote::new("BTCUSDT", dec!(68250.00)),
        PriceQuote::new("ETHUSDT", dec!(3650.00)),
        PriceQuote::new("BNBUSDT", dec!(590.00)),
        PriceQuote::new("SOLUSDT", dec!(190.50)),
    ]
}

/// Case-insensitive lookup in a price table.
pub fn find_price(quotes: &[PriceQuote], symbol: &str) -> Option<Decimal> {
    quotes
        .iter()
        .find(|q| q.symbol.eq_ignore_ascii_case(symbol))
        .map(|q| q.price)
}
