//! Risk parameters shared by position sizing and the trade flow.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Inputs to risk-based position sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskParams {
    /// Percent of the quote balance put at risk (1 = 1%)
    pub risk_pct: Decimal,

    /// Stop-loss distance as a fraction of price (0.01 = 1%)
    pub stop_loss_pct: Decimal,

    /// Leverage multiplier applied to the risk amount
    pub leverage: u32,
}

impl Default for RiskParams {
    fn default() -> Self {
        Self {
            risk_pct: dec!(1.0),
            stop_loss_pct: dec!(0.01),
            leverage: 1,
        }
    }
}

impl RiskParams {
    pub fn new(risk_pct: Decimal, stop_loss_pct: Decimal, leverage: u32) -> Self {
        Self {
            risk_pct,
            stop_loss_pct,
            leverage,
        }
    }

    /// Reject parameters that cannot produce a meaningful size.
    pub fn validate(&self) -> Result<()> {
        if self.risk_pct <= Decimal::ZERO {
            return Err(EngineError::invalid(
                "risk_pct",
                format!("must be positive, got {}", self.risk_pct),
            ));
        }
        if self.stop_loss_pct <= Decimal::ZERO {
            return Err(EngineError::invalid(
                "stop_loss_pct",
                format!("must be positive, got {}", self.stop_loss_pct),
            ));
        }
        crate::api::validate_leverage(self.leverage)
    }
}
