//! File-backed ledger for the simulated exchange.
//!
//! Two independent JSON records live in the data directory:
//! - `mock_prices.json`: ordered array of `{symbol, price}`
//! - `mock_balance.json`: flat map of asset to quantity
//!
//! Both are seeded with defaults on first access. Writers must hold a
//! [`LedgerGuard`] for the whole read-modify-write cycle; a second writer
//! fails fast with [`EngineError::LedgerBusy`] instead of racing.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::models::{default_prices, BalanceSheet, PriceQuote};

pub const PRICES_FILE: &str = "mock_prices.json";
pub const BALANCE_FILE: &str = "mock_balance.json";
pub const LOCK_FILE: &str = "ledger.lock";

/// Owned handle on a ledger directory.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    dir: PathBuf,
    prices_path: PathBuf,
    balance_path: PathBuf,
    lock_path: PathBuf,
}

/// Exclusive write access to a ledger. Released on drop.
#[derive(Debug)]
pub struct LedgerGuard<'a> {
    store: &'a LedgerStore,
}

impl LedgerStore {
    /// Open (and create if needed) a ledger directory, seeding missing records.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| EngineError::LedgerIo {
            path: dir.clone(),
            source,
        })?;

        let store = Self {
            prices_path: dir.join(PRICES_FILE),
            balance_path: dir.join(BALANCE_FILE),
            lock_path: dir.join(LOCK_FILE),
            dir,
        };

        if !store.prices_path.exists() {
            store.save_prices(&default_prices())?;
            info!(path = %store.prices_path.display(), "Seeded default price table");
        }
        if !store.balance_path.exists() {
            store.write_json(&store.balance_path, &BalanceSheet::seed())?;
            info!(path = %store.balance_path.display(), "Seeded default balance");
        }

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the price table. Re-seeds defaults if the record has gone missing.
    pub fn load_prices(&self) -> Result<Vec<PriceQuote>> {
        if !self.prices_path.exists() {
            warn!(path = %self.prices_path.display(), "Price table missing, restoring defaults");
            let defaults = default_prices();
            self.save_prices(&defaults)?;
            return Ok(defaults);
        }

        let quotes: Vec<PriceQuote> = self.read_json(&self.prices_path)?;

        let mut seen = HashSet::new();
        for quote in &quotes {
            if !seen.insert(quote.symbol.to_ascii_uppercase()) {
                return Err(self.corrupt(&self.prices_path, format!("duplicate symbol {}", quote.symbol)));
            }
            if quote.price.is_sign_negative() && !quote.price.is_zero() {
                return Err(self.corrupt(
                    &self.prices_path,
                    format!("negative price {} for {}", quote.price, quote.symbol),
                ));
            }
        }

        Ok(quotes)
    }

    /// Replace the price table.
    pub fn save_prices(&self, quotes: &[PriceQuote]) -> Result<()> {
        self.write_json(&self.prices_path, &quotes)
    }

    /// Read the balance sheet. Re-seeds defaults if the record has gone missing.
    pub fn load_balances(&self) -> Result<BalanceSheet> {
        if !self.balance_path.exists() {
            warn!(path = %self.balance_path.display(), "Balance record missing, restoring defaults");
            let seed = BalanceSheet::seed();
            self.write_json(&self.balance_path, &seed)?;
            return Ok(seed);
        }

        let mut sheet: BalanceSheet = self.read_json(&self.balance_path)?;
        if let Some((asset, qty)) = sheet.first_negative() {
            return Err(self.corrupt(&self.balance_path, format!("negative {asset} balance {qty}")));
        }
        sheet.ensure_quote_entry();
        Ok(sheet)
    }

    /// Take exclusive write access to the ledger.
    ///
    /// The lock file is created with create-new semantics, so a second
    /// holder (in this or another process) gets `LedgerBusy`.
    pub fn lock(&self) -> Result<LedgerGuard<'_>> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(EngineError::LedgerBusy(self.lock_path.clone()));
            }
            Err(source) => {
                return Err(EngineError::LedgerIo {
                    path: self.lock_path.clone(),
                    source,
                })
            }
        };

        // Stamp for whoever finds a stale lock.
        if let Err(e) = writeln!(
            file,
            "pid={} acquired={}",
            std::process::id(),
            Utc::now().to_rfc3339()
        ) {
            warn!(error = %e, path = %self.lock_path.display(), "Failed to stamp ledger lock");
        }
        debug!(path = %self.lock_path.display(), "Ledger lock acquired");

        Ok(LedgerGuard { store: self })
    }

    pub fn is_locked(&self) -> bool {
        self.lock_path.exists()
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let bytes = fs::read(path).map_err(|source| EngineError::LedgerIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| EngineError::LedgerFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write via a temp file and rename, so readers never see a partial record.
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(value).map_err(|source| EngineError::LedgerFormat {
            path: path.to_path_buf(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        let io_err = |source| EngineError::LedgerIo {
            path: path.to_path_buf(),
            source,
        };
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }

    fn corrupt(&self, path: &Path, reason: String) -> EngineError {
        EngineError::LedgerCorrupt {
            path: path.to_path_buf(),
            reason,
        }
    }
}

impl LedgerGuard<'_> {
    /// Re-read the balance sheet under the lock.
    pub fn balances(&self) -> Result<BalanceSheet> {
        self.store.load_balances()
    }

    /// Persist a whole balance sheet. Refuses sheets with negative entries.
    pub fn save_balances(&self, sheet: &BalanceSheet) -> Result<()> {
        if let Some((asset, qty)) = sheet.first_negative() {
            return Err(EngineError::invalid(
                "balance",
                format!("refusing to persist negative {asset} balance {qty}"),
            ));
        }
        self.store.write_json(&self.store.balance_path, sheet)
    }
}

impl Drop for LedgerGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.store.lock_path) {
            warn!(error = %e, path = %self.store.lock_path.display(), "Failed to release ledger lock");
        } else {
            debug!("Ledger lock released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, LedgerStore) {
        let dir = TempDir::new().unwrap();
        let store = LedgerStore::open(dir.path().join("data")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_seeds_defaults() {
        let (_dir, store) = open_temp();
        assert!(store.dir().join(PRICES_FILE).exists());
        assert!(store.dir().join(BALANCE_FILE).exists());
        assert_eq!(store.load_prices().unwrap(), default_prices());
        assert_eq!(store.load_balances().unwrap(), BalanceSheet::seed());
    }

    #[test]
    fn test_open_keeps_existing_records() {
        let (_dir, store) = open_temp();
        {
            let guard = store.lock().unwrap();
            let mut sheet = guard.balances().unwrap();
            sheet.set("USDT", dec!(42));
            guard.save_balances(&sheet).unwrap();
        }
        let reopened = LedgerStore::open(store.dir()).unwrap();
        assert_eq!(reopened.load_balances().unwrap().quote(), dec!(42));
    }

    #[test]
    fn test_balance_round_trip() {
        let (_dir, store) = open_temp();
        let mut sheet = BalanceSheet::seed();
        sheet.set("BTC", dec!(0.14652));
        sheet.set("USDT", dec!(9999.123456));
        sheet.set("DOGE", dec!(12.00000001));

        let guard = store.lock().unwrap();
        guard.save_balances(&sheet).unwrap();
        drop(guard);

        let loaded = store.load_balances().unwrap();
        assert_eq!(loaded, sheet);
        for (asset, qty) in sheet.iter() {
            assert_eq!(loaded.get(asset), qty);
        }
    }

    #[test]
    fn test_missing_records_are_reseeded() {
        let (_dir, store) = open_temp();
        fs::remove_file(store.dir().join(PRICES_FILE)).unwrap();
        fs::remove_file(store.dir().join(BALANCE_FILE)).unwrap();

        assert_eq!(store.load_prices().unwrap(), default_prices());
        assert_eq!(store.load_balances().unwrap(), BalanceSheet::seed());
        assert!(store.dir().join(PRICES_FILE).exists());
    }

    #[test]
    fn test_lock_is_exclusive() {
        let (_dir, store) = open_temp();
        let guard = store.lock().unwrap();
        assert!(store.is_locked());
        assert!(matches!(store.lock(), Err(EngineError::LedgerBusy(_))));

        drop(guard);
        assert!(!store.is_locked());
        assert!(store.lock().is_ok());
    }

    #[test]
    fn test_lock_file_is_stamped_with_holder() {
        let (_dir, store) = open_temp();
        let _guard = store.lock().unwrap();
        let stamp = fs::read_to_string(store.dir().join(LOCK_FILE)).unwrap();
        assert!(stamp.starts_with(&format!("pid={} acquired=", std::process::id())));
    }

    #[test]
    fn test_malformed_record_is_reported() {
        let (_dir, store) = open_temp();
        fs::write(store.dir().join(BALANCE_FILE), "{not json").unwrap();
        assert!(matches!(
            store.load_balances(),
            Err(EngineError::LedgerFormat { .. })
        ));
    }

    #[test]
    fn test_negative_balance_is_corrupt() {
        let (_dir, store) = open_temp();
        fs::write(store.dir().join(BALANCE_FILE), r#"{"USDT": "-1"}"#).unwrap();
        assert!(matches!(
            store.load_balances(),
            Err(EngineError::LedgerCorrupt { .. })
        ));
    }

    #[test]
    fn test_duplicate_symbols_are_corrupt() {
        let (_dir, store) = open_temp();
        fs::write(
            store.dir().join(PRICES_FILE),
            r#"[{"symbol":"BTCUSDT","price":1},{"symbol":"btcusdt","price":2}]"#,
        )
        .unwrap();
        assert!(matches!(
            store.load_prices(),
            Err(EngineError::LedgerCorrupt { .. })
        ));
    }

    #[test]
    fn test_missing_quote_entry_is_filled_in() {
        let (_dir, store) = open_temp();
        fs::write(store.dir().join(BALANCE_FILE), r#"{"BTC": "0.5"}"#).unwrap();
        let sheet = store.load_balances().unwrap();
        assert_eq!(sheet.quote(), dec!(0));
        assert_eq!(sheet.get("BTC"), dec!(0.5));
    }

    #[test]
    fn test_guard_refuses_negative_sheet() {
        let (_dir, store) = open_temp();
        let guard = store.lock().unwrap();
        let mut sheet = guard.balances().unwrap();
        sheet.set("BTC", dec!(-0.1));
        assert!(guard.save_balances(&sheet).is_err());
        drop(guard);
        assert_eq!(store.load_balances().unwrap(), BalanceSheet::seed());
    }
}
