//! Client selection.
//!
//! The real client is used only when it is explicitly requested, compiled
//! in, allowed by configuration, and both credentials are present. Every
//! other combination quietly yields the simulated client.

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ledger::LedgerStore;

use super::{ClientMode, ExchangeClient, SimulatedClient};

/// Whether this build carries the real exchange client (cargo feature `live`).
pub const LIVE_COMPILED: bool = cfg!(feature = "live");

/// Decide which backend a session gets. Pure and infallible.
pub fn select_mode(config: &EngineConfig) -> ClientMode {
    let live_capable = LIVE_COMPILED && config.live_available;
    if config.use_real && live_capable && config.credentials.is_some() {
        ClientMode::Live
    } else {
        debug!(
            use_real = config.use_real,
            live_capable = live_capable,
            has_credentials = config.credentials.is_some(),
            "Selecting mock mode"
        );
        ClientMode::Mock
    }
}

/// Construct the client chosen by [`select_mode`].
pub fn build_client(config: &EngineConfig) -> Result<Box<dyn ExchangeClient>> {
    match (select_mode(config), config.credentials.as_ref()) {
        #[cfg(feature = "live")]
        (ClientMode::Live, Some(credentials)) => {
            let base_url = config.base_url.clone().unwrap_or_else(|| {
                if config.testnet {
                    super::TESTNET_URL.to_string()
                } else {
                    super::MAINNET_URL.to_string()
                }
            });
            let client = super::LiveClient::new(credentials.clone(), base_url)?
                .with_recv_window(config.recv_window_ms)
                .with_tracked_symbols(config.tracked_symbols.clone());
            Ok(Box::new(client))
        }
        _ => {
            let store = LedgerStore::open(&config.data_dir)?;
            Ok(Box::new(SimulatedClient::new(store)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use tempfile::TempDir;

    fn config(use_real: bool, creds: bool, live_available: bool) -> EngineConfig {
        EngineConfig {
            use_real,
            live_available,
            credentials: creds.then(|| Credentials::new("key", "secret")),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_mock_whenever_flag_or_credentials_missing() {
        for live_available in [true, false] {
            assert_eq!(select_mode(&config(false, true, live_available)), ClientMode::Mock);
            assert_eq!(select_mode(&config(true, false, live_available)), ClientMode::Mock);
            assert_eq!(select_mode(&config(false, false, live_available)), ClientMode::Mock);
        }
    }

    #[test]
    fn test_mock_when_live_capability_disabled() {
        assert_eq!(select_mode(&config(true, true, false)), ClientMode::Mock);
    }

    #[test]
    fn test_live_when_everything_lines_up() {
        let expected = if LIVE_COMPILED { ClientMode::Live } else { ClientMode::Mock };
        assert_eq!(select_mode(&config(true, true, true)), expected);
    }

    #[test]
    fn test_build_client_falls_back_to_simulated() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            data_dir: dir.path().join("ledger"),
            ..config(true, false, true)
        };
        let client = build_client(&config).unwrap();
        assert_eq!(client.mode(), ClientMode::Mock);
        assert!(dir.path().join("ledger").join(crate::ledger::BALANCE_FILE).exists());
    }

    #[cfg(feature = "live")]
    #[test]
    fn test_build_client_live_does_not_touch_ledger() {
        let dir = TempDir::new().unwrap();
        let config = EngineConfig {
            data_dir: dir.path().join("ledger"),
            ..config(true, true, true)
        };
        let client = build_client(&config).unwrap();
        assert_eq!(client.mode(), ClientMode::Live);
        assert!(!dir.path().join("ledger").exists());
    }
}
