//! Full trade flow: size the position, enter at market, derive stop-loss and
//! take-profit levels. Levels are reported, not placed.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::info;

use crate::api::ExchangeClient;
use crate::error::{EngineError, Result};
use crate::models::{OrderResult, OrderSide};

use super::{calculate_position_size, PositionSize, RiskParams};

/// A risk-sized market entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub risk: RiskParams,
    /// Take-profit distance as a fraction of price (0.02 = 2%)
    pub take_profit_pct: Decimal,
}

impl TradeRequest {
    pub fn new(symbol: impl Into<String>, side: OrderSide, risk: RiskParams) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            risk,
            take_profit_pct: dec!(0.02),
        }
    }

    pub fn with_take_profit(mut self, take_profit_pct: Decimal) -> Self {
        self.take_profit_pct = take_profit_pct;
        self
    }
}

/// Protective exit prices around an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtectiveLevels {
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

impl ProtectiveLevels {
    /// Stop below / target above for longs; mirrored for shorts.
    pub fn around(
        side: OrderSide,
        entry: Decimal,
        stop_pct: Decimal,
        take_profit_pct: Decimal,
    ) -> Result<Self> {
        let (stop_factor, target_factor) = match side {
            OrderSide::Buy => (
                Decimal::ONE.checked_sub(stop_pct),
                Decimal::ONE.checked_add(take_profit_pct),
            ),
            OrderSide::Sell => (
                Decimal::ONE.checked_add(stop_pct),
                Decimal::ONE.checked_sub(take_profit_pct),
            ),
        };

        let stop_loss = stop_factor
            .and_then(|factor| entry.checked_mul(factor))
            .ok_or_else(|| EngineError::invalid("stop_loss_pct", "stop-loss level overflows"))?;
        let take_profit = target_factor
            .and_then(|factor| entry.checked_mul(factor))
            .ok_or_else(|| {
                EngineError::invalid("take_profit_pct", "take-profit level overflows")
            })?;

        Ok(Self {
            stop_loss,
            take_profit,
        })
    }
}

/// Everything a trade produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOutcome {
    pub size: PositionSize,
    pub order: OrderResult,
    pub levels: ProtectiveLevels,
}

/// Size, enter, and compute exits. Fails before ordering if any input is invalid.
pub fn execute_trade<C: ExchangeClient + ?Sized>(
    client: &C,
    request: &TradeRequest,
) -> Result<TradeOutcome> {
    if request.take_profit_pct <= Decimal::ZERO {
        return Err(EngineError::invalid(
            "take_profit_pct",
            format!("must be positive, got {}", request.take_profit_pct),
        ));
    }

    let size = calculate_position_size(client, &request.symbol, &request.risk)?;
    let levels = ProtectiveLevels::around(
        request.side,
        size.mark_price,
        request.risk.stop_loss_pct,
        request.take_profit_pct,
    )?;
    let order = client.place_market_order(&request.symbol, request.side, size.quantity)?;

    info!(
        symbol = %request.symbol,
        side = %request.side,
        quantity = %size.quantity,
        stop_loss = %levels.stop_loss,
        take_profit = %levels.take_profit,
        "Trade entered"
    );

    Ok(TradeOutcome { size, order, levels })
}
