//! Futures paper-trading engine.
//!
//! One [`ExchangeClient`] contract with two backends: a file-backed simulated
//! exchange that keeps a truncating, never-negative balance ledger, and a thin
//! Binance USD-M futures client. Risk-based position sizing and the full
//! size-enter-protect trade flow run against either backend.

pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod trading;

pub use api::{build_client, select_mode, BalanceView, ClientMode, ExchangeClient, SimulatedClient};
pub use config::{Credentials, EngineConfig};
pub use error::{EngineError, Result};
pub use ledger::LedgerStore;
pub use models::{BalanceSheet, MarkPrice, OrderResult, OrderSide, PriceQuote};
pub use trading::{
    calculate_position_size, execute_trade, PositionSize, ProtectiveLevels, RiskParams,
    TradeOutcome, TradeRequest,
};
