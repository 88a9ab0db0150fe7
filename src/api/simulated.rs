//! File-backed simulated exchange.
//!
//! Market orders fill instantly at the ledger price. Every fill is an
//! all-or-nothing read-modify-write of the balance record under a
//! [`LedgerGuard`](crate::ledger::LedgerGuard); amounts are truncated toward
//! zero (6 digits quote, 8 digits base) so the holder is never over-credited.

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::ledger::LedgerStore;
use crate::models::{
    find_price, truncate_base, truncate_quote, MarkPrice, OrderResult, OrderSide, PriceQuote,
    QUOTE_ASSET,
};

use super::{validate_leverage, BalanceView, ClientMode, ExchangeClient};

/// Exchange client that trades against a local ledger.
#[derive(Debug, Clone)]
pub struct SimulatedClient {
    store: LedgerStore,
}

impl SimulatedClient {
    pub fn new(store: LedgerStore) -> Self {
        info!(dir = %store.dir().display(), "Using simulated exchange (file-backed)");
        Self { store }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Base asset of a `<BASE>USDT` symbol.
    fn base_asset(symbol: &str) -> Result<&str> {
        match symbol.strip_suffix(QUOTE_ASSET) {
            Some(base) if !base.is_empty() => Ok(base),
            _ => Err(EngineError::invalid(
                "symbol",
                format!("{symbol} is not quoted in {QUOTE_ASSET}"),
            )),
        }
    }
}

impl ExchangeClient for SimulatedClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Mock
    }

    fn get_all_prices(&self) -> Result<Vec<PriceQuote>> {
        self.store.load_prices()
    }

    fn get_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        Ok(find_price(&self.store.load_prices()?, symbol))
    }

    fn get_balance(&self) -> Result<Decimal> {
        Ok(self.store.load_balances()?.quote())
    }

    fn show_balance(&self) -> Result<BalanceView> {
        Ok(BalanceView::Ledger(self.store.load_balances()?))
    }

    fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        validate_leverage(leverage)?;
        info!(symbol = %symbol, leverage = leverage, "(mock) set leverage");
        Ok(())
    }

    fn place_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderResult> {
        if quantity <= Decimal::ZERO {
            return Err(EngineError::invalid(
                "quantity",
                format!("must be positive, got {quantity}"),
            ));
        }

        let symbol = symbol.to_ascii_uppercase();
        let guard = self.store.lock()?;

        let price = self
            .get_price(&symbol)?
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.clone()))?;
        let base = Self::base_asset(&symbol)?;

        let notional = quantity.checked_mul(price).ok_or_else(|| {
            EngineError::invalid("quantity", format!("{quantity} x {price} overflows"))
        })?;

        let mut sheet = guard.balances()?;
        let quote_held = sheet.quote();
        let base_held = sheet.get(base);

        match side {
            OrderSide::Buy => {
                if quote_held < notional {
                    return Err(EngineError::InsufficientFunds {
                        asset: QUOTE_ASSET.to_string(),
                        required: notional,
                        available: quote_held,
                    });
                }
                let credited = base_held.checked_add(quantity).ok_or_else(|| {
                    EngineError::invalid("quantity", format!("{base} balance overflows"))
                })?;
                sheet.set(QUOTE_ASSET, truncate_quote(quote_held - notional));
                sheet.set(base, truncate_base(credited));
            }
            OrderSide::Sell => {
                if base_held < quantity {
                    return Err(EngineError::InsufficientFunds {
                        asset: base.to_string(),
                        required: quantity,
                        available: base_held,
                    });
                }
                let credited = quote_held.checked_add(notional).ok_or_else(|| {
                    EngineError::invalid("quantity", format!("{QUOTE_ASSET} balance overflows"))
                })?;
                sheet.set(base, truncate_base(base_held - quantity));
                sheet.set(QUOTE_ASSET, truncate_quote(credited));
            }
        }

        guard.save_balances(&sheet)?;
        debug!(
            quote = %sheet.quote(),
            base_asset = base,
            base = %sheet.get(base),
            "Balance updated"
        );
        info!(
            symbol = %symbol,
            side = %side,
            quantity = %quantity,
            price = %price,
            "(mock) market order filled"
        );

        Ok(OrderResult::filled(&symbol, side, price, quantity))
    }

    fn futures_mark_price(&self, symbol: &str) -> Result<MarkPrice> {
        let mark_price = self
            .get_price(symbol)?
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        Ok(MarkPrice {
            symbol: symbol.to_string(),
            mark_price,
        })
    }
}
