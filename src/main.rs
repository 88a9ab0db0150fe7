//! Futures paper-trading CLI.
//!
//! Runs against the file-backed mock exchange unless `--use-real` is given
//! together with API credentials, in which case orders go to the Binance
//! futures testnet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use futures_paper_trader::{
    build_client, calculate_position_size, execute_trade, BalanceView, ClientMode, Credentials,
    EngineConfig, ExchangeClient, OrderSide, RiskParams, TradeRequest,
};
use futures_paper_trader::models::QUOTE_ASSET;

/// Futures paper-trading CLI.
#[derive(Parser)]
#[command(name = "papertrade")]
#[command(about = "Simulate or execute futures market trades with risk-based sizing", long_about = None)]
struct Cli {
    /// Exchange API key
    #[arg(long, env = "BINANCE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Exchange API secret
    #[arg(long, env = "BINANCE_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// Use the real exchange client (requires both credentials)
    #[arg(long)]
    use_real: bool,

    /// Target production instead of the futures testnet
    #[arg(long)]
    mainnet: bool,

    /// Directory holding the mock ledger
    #[arg(short, long, env = "PAPER_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List current market prices
    Prices,

    /// Show portfolio balance
    Balance,

    /// Market buy a symbol
    Buy {
        symbol: String,
        /// Quantity in the base asset
        amount: Decimal,
    },

    /// Market sell a symbol
    Sell {
        symbol: String,
        /// Quantity in the base asset
        amount: Decimal,
    },

    /// Set leverage for a symbol (mock mode only logs it)
    SetLeverage { symbol: String, leverage: u32 },

    /// Calculate position size from risk parameters
    CalcSize {
        symbol: String,

        /// Percent of balance to risk
        #[arg(long, default_value = "1.0")]
        risk: Decimal,

        /// Stop loss as a fraction of price (0.01 = 1%)
        #[arg(long, default_value = "0.01")]
        stop: Decimal,

        /// Leverage
        #[arg(long, default_value = "1")]
        lev: u32,
    },

    /// Full trade flow: size, market entry, protective levels
    Trade {
        symbol: String,

        #[arg(long, default_value = "1.0")]
        risk: Decimal,

        #[arg(long, default_value = "0.01")]
        stop: Decimal,

        /// Take profit as a fraction of price
        #[arg(long, default_value = "0.02")]
        tp: Decimal,

        #[arg(long, default_value = "1")]
        lev: u32,

        /// BUY or SELL
        #[arg(long, default_value = "BUY")]
        side: OrderSide,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let env_config = EngineConfig::from_env();
    let config = EngineConfig {
        data_dir: cli.data_dir.clone(),
        credentials: Credentials::from_parts(cli.api_key.as_deref(), cli.api_secret.as_deref()),
        use_real: cli.use_real || env_config.use_real,
        testnet: !cli.mainnet && env_config.testnet,
        ..env_config
    };

    let client = build_client(&config).context("Failed to initialize exchange client")?;
    if client.mode() == ClientMode::Mock && config.use_real {
        println!("Real mode unavailable (missing credentials or live support); using mock mode.");
    }
    info!(mode = %client.mode(), "Session started");

    match cli.command {
        Commands::Prices => {
            let prices = client.get_all_prices().context("Failed to fetch prices")?;
            println!("Market Prices ({}):", client.mode());
            for quote in prices {
                println!("{}", quote);
            }
        }

        Commands::Balance => {
            let view = client.show_balance().context("Failed to fetch balance")?;
            println!("Balance ({}):", client.mode());
            match &view {
                BalanceView::Ledger(sheet) => {
                    for (asset, qty) in sheet.iter() {
                        println!("  {:<8} {:>20}", asset, qty);
                    }
                }
                BalanceView::Exchange(_) => {
                    println!("{}", serde_json::to_string_pretty(&view)?);
                }
            }
        }

        Commands::Buy { symbol, amount } => {
            place(client.as_ref(), &symbol, OrderSide::Buy, amount)?;
        }

        Commands::Sell { symbol, amount } => {
            place(client.as_ref(), &symbol, OrderSide::Sell, amount)?;
        }

        Commands::SetLeverage { symbol, leverage } => {
            let symbol = symbol.to_uppercase();
            client
                .set_leverage(&symbol, leverage)
                .with_context(|| format!("Failed to set leverage for {}", symbol))?;
            println!("Set leverage ({}) for {} to {}x", client.mode(), symbol, leverage);
        }

        Commands::CalcSize {
            symbol,
            risk,
            stop,
            lev,
        } => {
            let symbol = symbol.to_uppercase();
            let size = calculate_position_size(
                client.as_ref(),
                &symbol,
                &RiskParams::new(risk, stop, lev),
            )
            .context("Position sizing failed")?;
            println!(
                "Calculated qty: {:.6} @ price {:.2}",
                size.quantity, size.mark_price
            );
            println!(
                "  Risk amount: {:.2}  Stop distance: {:.2}",
                size.risk_amount, size.stop_distance
            );
        }

        Commands::Trade {
            symbol,
            risk,
            stop,
            tp,
            lev,
            side,
        } => {
            let request = TradeRequest::new(symbol.to_uppercase(), side, RiskParams::new(risk, stop, lev))
                .with_take_profit(tp);
            let outcome = execute_trade(client.as_ref(), &request).context("Trade failed")?;

            println!(
                "-> Calculated qty: {:.6} @ price {:.2}",
                outcome.size.quantity, outcome.size.mark_price
            );
            println!("-> Entry order result: {}", outcome.order);
            println!(
                "-> (simulated) SL: {:.2}, TP: {:.2}",
                outcome.levels.stop_loss, outcome.levels.take_profit
            );
        }
    }

    Ok(())
}

fn place(client: &dyn ExchangeClient, symbol: &str, side: OrderSide, amount: Decimal) -> Result<()> {
    let symbol = symbol.to_uppercase();
    let result = match client.place_market_order(&symbol, side, amount) {
        Ok(result) => result,
        Err(e) => {
            let hint = if e.is_recoverable() {
                "nothing was traded; adjust the order and retry"
            } else {
                "order outcome may need checking"
            };
            return Err(anyhow::Error::new(e)
                .context(format!("{} {} {} rejected ({})", side, amount, symbol, hint)));
        }
    };
    println!("{} executed: {}", side, result);
    println!("  Notional: {} {}", result.notional(), QUOTE_ASSET);
    Ok(())
}
