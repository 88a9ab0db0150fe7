//! Exchange clients: the shared capability contract and its two backends.
//!
//! The simulated client executes against a local [`LedgerStore`](crate::ledger::LedgerStore);
//! the live client (cargo feature `live`) proxies to Binance USD-M futures.

mod factory;
#[cfg(feature = "live")]
mod live;
mod simulated;
mod types;

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::models::{BalanceSheet, MarkPrice, OrderResult, OrderSide, PriceQuote};

pub use factory::{build_client, select_mode, LIVE_COMPILED};
#[cfg(feature = "live")]
pub use live::{LiveClient, MAINNET_URL, TESTNET_URL};
pub use simulated::SimulatedClient;
pub use types::*;

/// Which backend a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    Mock,
    Live,
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMode::Mock => f.write_str("mock"),
            ClientMode::Live => f.write_str("live"),
        }
    }
}

/// Full balance snapshot.
///
/// The two modes deliberately keep their native shapes: a flat asset map for
/// the simulated ledger, the exchange's account listing for live mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BalanceView {
    Ledger(BalanceSheet),
    Exchange(Vec<AccountBalance>),
}

/// Operations the engine needs from an exchange.
///
/// All calls are synchronous and block until the backend answers.
pub trait ExchangeClient {
    fn mode(&self) -> ClientMode;

    /// Current quotes for the tracked symbols.
    fn get_all_prices(&self) -> Result<Vec<PriceQuote>>;

    /// Price of one symbol, `None` if the exchange does not list it.
    fn get_price(&self, symbol: &str) -> Result<Option<Decimal>>;

    /// Quote-asset (USDT) balance only.
    fn get_balance(&self) -> Result<Decimal>;

    fn show_balance(&self) -> Result<BalanceView>;

    /// Idempotent. `leverage` must be at least 1.
    fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()>;

    fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderResult>;

    fn futures_mark_price(&self, symbol: &str) -> Result<MarkPrice>;
}

impl<C: ExchangeClient + ?Sized> ExchangeClient for Box<C> {
    fn mode(&self) -> ClientMode {
        (**self).mode()
    }

    fn get_all_prices(&self) -> Result<Vec<PriceQuote>> {
        (**self).get_all_prices()
    }

    fn get_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        (**self).get_price(symbol)
    }

    fn get_balance(&self) -> Result<Decimal> {
        (**self).get_balance()
    }

    fn show_balance(&self) -> Result<BalanceView> {
        (**self).show_balance()
    }

    fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        (**self).set_leverage(symbol, leverage)
    }

    fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderResult> {
        (**self).place_market_order(symbol, side, quantity)
    }

    fn futures_mark_price(&self, symbol: &str) -> Result<MarkPrice> {
        (**self).futures_mark_price(symbol)
    }
}

pub(crate) fn validate_leverage(leverage: u32) -> Result<()> {
    if leverage < 1 {
        return Err(crate::error::EngineError::invalid(
            "leverage",
            "must be at least 1",
        ));
    }
    Ok(())
}
