//! Risk-based position sizing.
//!
//! quantity = (balance * risk_pct / 100 * leverage) / (mark_price * stop_loss_pct)
//!
//! truncated to 6 fractional digits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::debug;

use crate::api::ExchangeClient;
use crate::error::{EngineError, Result};
use crate::models::truncate_quote;

use super::RiskParams;

/// Result of a sizing calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PositionSize {
    /// Order quantity in the base asset
    pub quantity: Decimal,

    /// Mark price the size was computed against
    pub mark_price: Decimal,

    /// Quote amount put at risk
    pub risk_amount: Decimal,

    /// Price distance to the stop
    pub stop_distance: Decimal,
}

/// Size an order so that hitting the stop loses `risk_pct` of the balance
/// (times leverage). Reads balance and mark price; never mutates anything.
pub fn calculate_position_size<C: ExchangeClient + ?Sized>(
    client: &C,
    symbol: &str,
    params: &RiskParams,
) -> Result<PositionSize> {
    params.validate()?;

    let balance = client
        .get_balance()
        .map_err(|e| EngineError::BalanceUnavailable {
            source: Box::new(e),
        })?;
    let risk_amount = balance
        .checked_mul(params.risk_pct)
        .map(|amount| amount / dec!(100))
        .ok_or_else(|| EngineError::invalid("risk_pct", "risk amount overflows"))?;

    let mark_price = client.futures_mark_price(symbol)?.mark_price;
    let stop_distance = mark_price
        .checked_mul(params.stop_loss_pct)
        .ok_or_else(|| EngineError::invalid("stop_loss_pct", "stop distance overflows"))?;
    if stop_distance.is_zero() {
        return Err(EngineError::invalid(
            "stop_loss_pct",
            format!("stop distance is zero at mark price {mark_price}"),
        ));
    }

    let raw = risk_amount
        .checked_mul(Decimal::from(params.leverage))
        .and_then(|exposure| exposure.checked_div(stop_distance))
        .ok_or_else(|| EngineError::invalid("leverage", "position size overflows"))?;
    let quantity = truncate_quote(raw);

    debug!(
        symbol = %symbol,
        balance = %balance,
        risk_amount = %risk_amount,
        stop_distance = %stop_distance,
        quantity = %quantity,
        "Position size calculated"
    );

    Ok(PositionSize {
        quantity,
        mark_price,
        risk_amount,
        stop_distance,
    })
}
