//! TrendSignal CLI — one-shot signal runs, the HTTP endpoint, config checks.
//!
//! Commands:
//! - `run` — resolve the universe, evaluate every instrument, print the rows
//! - `serve` — expose `GET /signals` (full pipeline per request) and `GET /health`
//! - `check-config` — validate a TOML config and print the effective values

mod server;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trendsignal_core::data::{
    BinanceClient, CircuitBreaker, MarketCatalog, MarketDataProvider, SyntheticProvider,
};
use trendsignal_core::domain::InstrumentSignal;
use trendsignal_core::{run_signals, PipelineError, SignalConfig};

#[derive(Parser)]
#[command(
    name = "trendsignal",
    version,
    about = "TrendSignal — Supertrend flip signals on Heikin-Ashi candles"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and print one row per instrument.
    Run {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use seeded synthetic bars instead of the exchange.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Serve signals over HTTP.
    Serve {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bind address. Falls back to $HOST, then the config.
        #[arg(long)]
        host: Option<String>,

        /// Bind port. Falls back to $PORT, then the config.
        #[arg(long)]
        port: Option<u16>,

        /// Use seeded synthetic bars instead of the exchange.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Validate a config file and print the effective configuration.
    CheckConfig {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

/// Catalog and bar provider behind one run or one server.
#[derive(Clone)]
pub struct Sources {
    pub catalog: Arc<dyn MarketCatalog>,
    pub provider: Arc<dyn MarketDataProvider>,
}

impl Sources {
    fn build(config: &SignalConfig, synthetic: bool, seed: u64) -> Result<Self> {
        if synthetic {
            let markets = config
                .coins
                .iter()
                .map(|base| format!("{base}/{}", config.quote));
            // A few extra days so the lookback window is fully covered.
            let history = Duration::days(31 * i64::from(config.lookback_months) + 7);
            let provider =
                Arc::new(SyntheticProvider::new(seed, Utc::now(), history).with_markets(markets));
            return Ok(Self {
                catalog: provider.clone(),
                provider,
            });
        }

        let breaker = Arc::new(CircuitBreaker::default_exchange());
        let client = Arc::new(
            BinanceClient::for_exchange(&config.exchange, breaker)
                .with_context(|| format!("cannot connect to exchange '{}'", config.exchange))?,
        );
        Ok(Self {
            catalog: client.clone(),
            provider: client,
        })
    }

    pub fn run(&self, config: &SignalConfig) -> Result<Vec<InstrumentSignal>, PipelineError> {
        run_signals(config, self.catalog.as_ref(), self.provider.as_ref())
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            synthetic,
            seed,
            format,
        } => run_cmd(config.as_deref(), synthetic, seed, format),
        Commands::Serve {
            config,
            host,
            port,
            synthetic,
            seed,
        } => serve_cmd(config.as_deref(), host, port, synthetic, seed),
        Commands::CheckConfig { config } => check_config_cmd(config.as_deref()),
    }
}

/// Logs go to stderr so `run` output on stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "trendsignal=info,trendsignal_core=info,tower_http=info".into()
        }))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SignalConfig> {
    let config = match path {
        Some(path) => SignalConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SignalConfig::default(),
    };
    info!(fingerprint = %config.fingerprint()?, "configuration loaded");
    Ok(config)
}

fn run_cmd(path: Option<&Path>, synthetic: bool, seed: u64, format: OutputFormat) -> Result<()> {
    let config = load_config(path)?;
    let sources = Sources::build(&config, synthetic, seed)?;
    let rows = sources.run(&config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}

fn serve_cmd(
    path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    synthetic: bool,
    seed: u64,
) -> Result<()> {
    let config = load_config(path)?;
    let addr = bind_address(&config, host, port)?;
    let sources = Sources::build(&config, synthetic, seed)?;
    let state = server::AppState::new(config, sources);

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    // `state` outlives the runtime so the blocking HTTP client is dropped outside it.
    runtime.block_on(server::serve(state.clone(), addr))
}

/// Flag, then environment, then config file.
fn bind_address(
    config: &SignalConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<SocketAddr> {
    let host = host
        .or_else(|| std::env::var("HOST").ok())
        .unwrap_or_else(|| config.server.host.clone());
    let port = match port {
        Some(p) => p,
        None => match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a valid port number, got '{raw}'"))?,
            Err(_) => config.server.port,
        },
    };
    format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))
}

fn check_config_cmd(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    config.validate()?;
    print!("{}", config.to_toml()?);
    println!("# fingerprint: {}", config.fingerprint()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_csv_format() {
        let cli =
            Cli::try_parse_from(["trendsignal", "run", "--synthetic", "--format", "csv"]).unwrap();
        match cli.command {
            Commands::Run {
                synthetic, format, ..
            } => {
                assert!(synthetic);
                assert!(matches!(format, OutputFormat::Csv));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn explicit_flags_win_for_bind_address() {
        let config = SignalConfig::default();
        let addr = bind_address(&config, Some("127.0.0.1".into()), Some(9000)).unwrap();
        assert_eq!(addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn synthetic_sources_run_offline() {
        let config = SignalConfig {
            coins: vec!["BTC".into(), "ETH".into()],
            pacing_ms: 0,
            ..Default::default()
        };
        let rows = Sources::build(&config, true, 7).unwrap().run(&config).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "BTC");
        assert!(rows.iter().all(|r| r.timestamp.is_some()));
    }

    #[test]
    fn csv_rows_have_wire_headers() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(InstrumentSignal::null("BTC")).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "SYMBOL,SIGNAL,TIMESTAMP\nBTC,,\n");
    }
}
