//! Balance sheet held by the simulated exchange.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::precision::QUOTE_ASSET;
use super::quote::{find_price, PriceQuote};

/// Asset symbol to held quantity. Always carries a quote-asset entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet(BTreeMap<String, Decimal>);

impl BalanceSheet {
    /// Empty sheet holding only a zero quote-asset entry.
    pub fn new() -> Self {
        let mut sheet = Self(BTreeMap::new());
        sheet.ensure_quote_entry();
        sheet
    }

    /// Seed balance written on first use of a ledger.
    pub fn seed() -> Self {
        let mut sheet = Self::new();
        sheet.set(QUOTE_ASSET, dec!(10000.0));
        for asset in ["BTC", "ETH", "BNB", "SOL"] {
            sheet.set(asset, Decimal::ZERO);
        }
        sheet
    }

    pub(crate) fn ensure_quote_entry(&mut self) {
        self.0.entry(QUOTE_ASSET.to_string()).or_insert(Decimal::ZERO);
    }

    /// Held quantity; zero for assets never traded.
    pub fn get(&self, asset: &str) -> Decimal {
        self.0.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn quote(&self) -> Decimal {
        self.get(QUOTE_ASSET)
    }

    pub fn set(&mut self, asset: &str, quantity: Decimal) {
        self.0.insert(asset.to_string(), quantity);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.0.iter().map(|(asset, qty)| (asset.as_str(), *qty))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First asset holding a negative quantity, if any.
    pub fn first_negative(&self) -> Option<(&str, Decimal)> {
        self.iter().find(|(_, qty)| qty.is_sign_negative() && !qty.is_zero())
    }

    /// Quote-equivalent value of the whole sheet. Assets without a
    /// `<ASSET>USDT` quote contribute nothing.
    pub fn total_notional(&self, quotes: &[PriceQuote]) -> Decimal {
        self.iter()
            .map(|(asset, qty)| {
                if asset == QUOTE_ASSET {
                    qty
                } else {
                    let symbol = format!("{asset}{QUOTE_ASSET}");
                    find_price(quotes, &symbol).map_or(Decimal::ZERO, |p| p * qty)
                }
            })
            .sum()
    }
}

impl FromIterator<(String, Decimal)> for BalanceSheet {
    fn from_iter<I: IntoIterator<Item = (String, Decimal)>>(iter: I) -> Self {
        let mut sheet = Self(iter.into_iter().collect());
        sheet.ensure_quote_entry();
        sheet
    }
}
