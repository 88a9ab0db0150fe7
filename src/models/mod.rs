//! Data models for quotes, balances, and orders.

mod balance;
mod order;
mod precision;
mod quote;

pub use balance::BalanceSheet;
pub use order::{OrderResult, OrderSide, STATUS_FILLED};
pub use precision::{
    truncate, truncate_base, truncate_quote, BASE_DECIMALS, QUOTE_ASSET, QUOTE_DECIMALS,
};
pub use quote::{default_prices, find_price, MarkPrice, PriceQuote, TRACKED_SYMBOLS};
