//! Trading logic: risk parameters, position sizing, trade flow.

mod config;
mod execution;
mod position_sizer;

pub use config::RiskParams;
pub use execution::{execute_trade, ProtectiveLevels, TradeOutcome, TradeRequest};
pub use position_sizer::{calculate_position_size, PositionSize};
