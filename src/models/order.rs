//! Order model: side of a market order and the result returned to callers.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Status reported by the simulated exchange for every accepted order.
pub const STATUS_FILLED: &str = "FILLED";

/// Direction of a market order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(EngineError::invalid(
                "side",
                format!("expected BUY or SELL, got {other:?}"),
            )),
        }
    }
}

/// Outcome of a single market order. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// `FILLED` for simulated fills, exchange-defined otherwise
    pub status: String,

    pub side: OrderSide,

    pub symbol: String,

    /// Fill price in the quote asset
    pub price: Decimal,

    /// Filled quantity in the base asset
    #[serde(rename = "qty")]
    pub quantity: Decimal,
}

impl OrderResult {
    /// Build a filled result for the simulated exchange.
    pub fn filled(symbol: &str, side: OrderSide, price: Decimal, quantity: Decimal) -> Self {
        Self {
            status: STATUS_FILLED.to_string(),
            side,
            symbol: symbol.to_string(),
            price,
            quantity,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.status == STATUS_FILLED
    }

    /// Quote-asset notional of the fill.
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} [{}]",
            self.side, self.quantity, self.symbol, self.price, self.status
        )
    }
}
