//! Binance USD-M futures client.
//!
//! A thin proxy: every operation is one REST call, no local state, no retries.
//! Signed endpoints use HMAC-SHA256 over the query string with the API key
//! in the `X-MBX-APIKEY` header.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::error::{EngineError, Result};
use crate::models::{MarkPrice, OrderResult, OrderSide, PriceQuote, QUOTE_ASSET, TRACKED_SYMBOLS};

use super::types::{
    AccountBalance, ApiErrorBody, FuturesOrderResponse, LeverageResponse, PremiumIndex,
};
use super::{validate_leverage, BalanceView, ClientMode, ExchangeClient};

/// Futures testnet REST base URL.
pub const TESTNET_URL: &str = "https://testnet.binancefuture.com";
/// Futures production REST base URL.
pub const MAINNET_URL: &str = "https://fapi.binance.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

/// Exchange codes that mean the credentials themselves were refused.
const AUTH_ERROR_CODES: [i64; 3] = [-2014, -2015, -1022];
/// "Invalid symbol."
const INVALID_SYMBOL_CODE: i64 = -1121;

/// Client for the real exchange.
pub struct LiveClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    recv_window_ms: u64,
    tracked_symbols: Vec<String>,
}

impl fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .field("recv_window_ms", &self.recv_window_ms)
            .finish()
    }
}

impl LiveClient {
    /// Create a client against `base_url` (see [`TESTNET_URL`]).
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| EngineError::Connectivity(format!("failed to create HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Using live exchange client");

        Ok(Self {
            http,
            base_url,
            credentials,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            tracked_symbols: TRACKED_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    /// Symbols reported by `get_all_prices`, in display order.
    pub fn with_tracked_symbols(mut self, symbols: Vec<String>) -> Self {
        self.tracked_symbols = symbols;
        self
    }

    fn sign(&self, query: &str) -> Result<String> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.credentials.api_secret.as_bytes())
            .map_err(|e| EngineError::Auth(format!("unusable API secret: {e}")))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Append `timestamp`, `recvWindow` and `signature` to a parameter list.
    fn signed_query(&self, params: &[(&str, String)]) -> Result<String> {
        let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.push(format!("timestamp={}", Utc::now().timestamp_millis()));
        pairs.push(format!("recvWindow={}", self.recv_window_ms));

        let query = pairs.join("&");
        let signature = self.sign(&query)?;
        Ok(format!("{query}&signature={signature}"))
    }

    fn public_get<T: DeserializeOwned>(&self, path: &str, query: Option<&str>) -> Result<T> {
        let url = match query {
            Some(q) => format!("{}{}?{}", self.base_url, path, q),
            None => format!("{}{}", self.base_url, path),
        };
        debug!(url = %url, "GET");
        self.execute(self.http.get(&url))
    }

    fn signed_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}?{}", self.base_url, path, self.signed_query(params)?);
        debug!(path = %path, "Signed GET");
        self.execute(self.http.get(&url).header("X-MBX-APIKEY", &self.credentials.api_key))
    }

    fn signed_post<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}?{}", self.base_url, path, self.signed_query(params)?);
        debug!(path = %path, "Signed POST");
        self.execute(self.http.post(&url).header("X-MBX-APIKEY", &self.credentials.api_key))
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            return Err(rejection(status, response));
        }

        response.json().map_err(|e| EngineError::RemoteRejected {
            status: status.as_u16(),
            code: None,
            message: format!("unreadable response: {e}"),
        })
    }
}

fn transport_error(e: reqwest::Error) -> EngineError {
    if e.is_timeout() {
        EngineError::Connectivity(format!("request timed out: {e}"))
    } else {
        EngineError::Connectivity(e.to_string())
    }
}

/// Classify a non-success response.
fn rejection(status: StatusCode, response: Response) -> EngineError {
    let text = response.text().unwrap_or_default();
    let body: Option<ApiErrorBody> = serde_json::from_str(&text).ok();
    let (code, message) = match body {
        Some(b) => (Some(b.code), b.msg),
        None => (None, text),
    };

    let auth_status = matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN);
    let auth_code = code.is_some_and(|c| AUTH_ERROR_CODES.contains(&c));
    if auth_status || auth_code {
        return EngineError::Auth(match code {
            Some(c) => format!("{message} (code {c})"),
            None => format!("HTTP {status}: {message}"),
        });
    }

    EngineError::RemoteRejected {
        status: status.as_u16(),
        code,
        message,
    }
}

impl ExchangeClient for LiveClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Live
    }

    fn get_all_prices(&self) -> Result<Vec<PriceQuote>> {
        let infos: Vec<PremiumIndex> = self.public_get("/fapi/v1/premiumIndex", None)?;

        let quotes = self
            .tracked_symbols
            .iter()
            .filter_map(|symbol| {
                infos
                    .iter()
                    .find(|i| &i.symbol == symbol)
                    .map(|i| PriceQuote::new(symbol.clone(), i.mark_price))
            })
            .collect();
        Ok(quotes)
    }

    fn get_price(&self, symbol: &str) -> Result<Option<Decimal>> {
        match self.futures_mark_price(symbol) {
            Ok(mark) => Ok(Some(mark.mark_price)),
            Err(EngineError::UnknownSymbol(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn get_balance(&self) -> Result<Decimal> {
        let balances: Vec<AccountBalance> = self.signed_get("/fapi/v2/balance", &[])?;
        Ok(balances
            .iter()
            .find(|b| b.asset == QUOTE_ASSET)
            .map_or(Decimal::ZERO, |b| b.balance))
    }

    fn show_balance(&self) -> Result<BalanceView> {
        let balances: Vec<AccountBalance> = self.signed_get("/fapi/v2/balance", &[])?;
        Ok(BalanceView::Exchange(balances))
    }

    fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        validate_leverage(leverage)?;
        let resp: LeverageResponse = self.signed_post(
            "/fapi/v1/leverage",
            &[("symbol", symbol.to_string()), ("leverage", leverage.to_string())],
        )?;
        info!(symbol = %resp.symbol, leverage = resp.leverage, "Leverage updated");
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

        let resp: FuturesOrderResponse = self.signed_post(
            "/fapi/v1/order",
            &[
                ("symbol", symbol.to_string()),
                ("side", side.as_str().to_string()),
                ("type", "MARKET".to_string()),
                ("quantity", quantity.normalize().to_string()),
                ("newOrderRespType", "RESULT".to_string()),
            ],
        )?;

        info!(
            order_id = resp.order_id,
            symbol = %resp.symbol,
            side = %resp.side,
            status = %resp.status,
            "Market order accepted"
        );

        let filled = if resp.executed_qty.is_zero() {
            resp.orig_qty
        } else {
            resp.executed_qty
        };
        let side = resp
            .side
            .parse::<OrderSide>()
            .map_err(|_| EngineError::RemoteRejected {
                status: 200,
                code: None,
                message: format!("unreadable response: unknown order side {:?}", resp.side),
            })?;
        Ok(OrderResult {
            status: resp.status,
            side,
            symbol: resp.symbol,
            price: resp.avg_price,
            quantity: filled,
        })
    }

    fn futures_mark_price(&self, symbol: &str) -> Result<MarkPrice> {
        let query = format!("symbol={symbol}");
        match self.public_get::<PremiumIndex>("/fapi/v1/premiumIndex", Some(&query)) {
            Ok(info) => Ok(MarkPrice {
                symbol: info.symbol,
                mark_price: info.mark_price,
            }),
            Err(EngineError::RemoteRejected {
                code: Some(INVALID_SYMBOL_CODE),
                ..
            }) => Err(EngineError::UnknownSymbol(symbol.to_string())),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use rust_decimal_macros::dec;

    fn client(server: &Server) -> LiveClient {
        LiveClient::new(Credentials::new("test-key", "test-secret"), server.url()).unwrap()
    }

    fn signed() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::Regex(r"timestamp=\d+".to_string()),
            Matcher::Regex("recvWindow=5000".to_string()),
            Matcher::Regex("signature=[0-9a-f]{64}".to_string()),
        ])
    }

    #[test]
    fn test_signature_is_hex_hmac() {
        let client = LiveClient::new(Credentials::new("k", "secret"), TESTNET_URL).unwrap();
        let sig = client.sign("symbol=BTCUSDT&timestamp=1").unwrap();
        assert_eq!(sig.len(), 64);
        assert_eq!(sig, client.sign("symbol=BTCUSDT&timestamp=1").unwrap());
        assert_ne!(sig, client.sign("symbol=BTCUSDT&timestamp=2").unwrap());
    }

    #[test]
    fn test_get_all_prices_keeps_tracked_symbols_in_order() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/fapi/v1/premiumIndex")
            .with_body(
                r#"[{"symbol":"SOLUSDT","markPrice":"190.1"},
                    {"symbol":"XRPUSDT","markPrice":"0.5"},
                    {"symbol":"BTCUSDT","markPrice":"68000.5"}]"#,
            )
            .create();

        let prices = client(&server).get_all_prices().unwrap();
        assert_eq!(
            prices,
            vec![
                PriceQuote::new("BTCUSDT", dec!(68000.5)),
                PriceQuote::new("SOLUSDT", dec!(190.1)),
            ]
        );
    }

    #[test]
    fn test_unknown_symbol_maps_to_absent_price() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/fapi/v1/premiumIndex")
            .match_query(Matcher::UrlEncoded("symbol".into(), "NOPEUSDT".into()))
            .with_status(400)
            .with_body(r#"{"code":-1121,"msg":"Invalid symbol."}"#)
            .create();

        let client = client(&server);
        assert_eq!(client.get_price("NOPEUSDT").unwrap(), None);
        assert!(matches!(
            client.futures_mark_price("NOPEUSDT"),
            Err(EngineError::UnknownSymbol(_))
        ));
    }

    #[test]
    fn test_get_balance_reads_quote_asset() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/fapi/v2/balance")
            .match_header("X-MBX-APIKEY", "test-key")
            .match_query(signed())
            .with_body(
                r#"[{"accountAlias":"a","asset":"BNB","balance":"1.5"},
                    {"accountAlias":"a","asset":"USDT","balance":"15000.25","availableBalance":"14000"}]"#,
            )
            .expect(2)
            .create();

        let client = client(&server);
        assert_eq!(client.get_balance().unwrap(), dec!(15000.25));
        match client.show_balance().unwrap() {
            BalanceView::Exchange(rows) => assert_eq!(rows.len(), 2),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_place_market_order() {
        let mut server = Server::new();
        let m = server
            .mock("POST", "/fapi/v1/order")
            .match_header("X-MBX-APIKEY", "test-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "BTCUSDT".into()),
                Matcher::UrlEncoded("side".into(), "SELL".into()),
                Matcher::UrlEncoded("type".into(), "MARKET".into()),
                Matcher::UrlEncoded("quantity".into(), "0.01".into()),
                signed(),
            ]))
            .with_body(
                r#"{"orderId":7,"symbol":"BTCUSDT","status":"FILLED","side":"SELL",
                    "avgPrice":"68100.0","origQty":"0.010","executedQty":"0.010","type":"MARKET"}"#,
            )
            .create();

        let result = client(&server)
            .place_market_order("BTCUSDT", OrderSide::Sell, dec!(0.0100))
            .unwrap();

        m.assert();
        assert_eq!(result.status, "FILLED");
        assert_eq!(result.side, OrderSide::Sell);
        assert_eq!(result.price, dec!(68100));
        assert_eq!(result.quantity, dec!(0.01));
    }

    #[test]
    fn test_unknown_order_side_in_response_is_rejected() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/fapi/v1/order")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"orderId":8,"symbol":"BTCUSDT","status":"FILLED","side":"HOLD",
                    "avgPrice":"68100.0","origQty":"0.010","executedQty":"0.010","type":"MARKET"}"#,
            )
            .create();

        let err = client(&server)
            .place_market_order("BTCUSDT", OrderSide::Buy, dec!(0.01))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::RemoteRejected { status: 200, code: None, ref message } if message.contains("HOLD")
        ));
    }

    #[test]
    fn test_auth_failures_are_classified() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/fapi/v2/balance")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#)
            .create();

        assert!(matches!(client(&server).get_balance(), Err(EngineError::Auth(_))));
    }

    #[test]
    fn test_rejected_leverage_is_surfaced() {
        let mut server = Server::new();
        let _m = server
            .mock("POST", "/fapi/v1/leverage")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code":-4028,"msg":"Leverage 200 is not valid"}"#)
            .create();

        let err = client(&server).set_leverage("BTCUSDT", 200).unwrap_err();
        assert!(matches!(
            err,
            EngineError::RemoteRejected { status: 400, code: Some(-4028), .. }
        ));
    }

    #[test]
    fn test_unreachable_exchange_is_connectivity_error() {
        let client = LiveClient::new(Credentials::new("k", "s"), "http://127.0.0.1:1").unwrap();
        assert!(matches!(
            client.get_all_prices(),
            Err(EngineError::Connectivity(_))
        ));
    }

    #[test]
    fn test_validation_precedes_remote_calls() {
        let client = LiveClient::new(Credentials::new("k", "s"), "http://127.0.0.1:1").unwrap();
        assert!(matches!(
            client.place_market_order("BTCUSDT", OrderSide::Buy, Decimal::ZERO),
            Err(EngineError::InvalidParameter { .. })
        ));
        assert!(matches!(
            client.set_leverage("BTCUSDT", 0),
            Err(EngineError::InvalidParameter { .. })
        ));
    }
}
