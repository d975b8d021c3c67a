//! Pipeline orchestration: resolve the universe, then for each instrument build
//! the bar store, transform, estimate volatility, run the band engine and
//! classify the last bar.
//!
//! Failures are isolated per instrument: a provider error or a short history
//! turns into a null row for that instrument only. Output order always equals
//! the resolved input order, sequential or parallel.

use crate::config::{ConfigError, SignalConfig};
use crate::data::catalog::{resolve_instruments, MarketCatalog};
use crate::data::fetch::fetch_series;
use crate::data::provider::{DataError, MarketDataProvider};
use crate::domain::{Direction, Instrument, InstrumentSignal, Series, SignalKind};
use crate::indicators::supertrend::{band_scan, SupertrendOutput};
use crate::indicators::{Atr, HeikinAshi, Indicator};
use crate::signals::{last_signal, scan_flips};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Batch-fatal errors. Per-instrument problems never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load market catalog: {0}")]
    Catalog(#[from] DataError),

    #[error("no symbols resolved")]
    EmptyUniverse,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything derived from one series in one evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Candles the engine ran on (Heikin-Ashi when enabled).
    pub candles: Series,
    pub atr: Vec<Option<f64>>,
    pub bands: SupertrendOutput,
    /// Classification of the last bar.
    pub signal: Option<SignalKind>,
    /// Timestamp of the last bar, if any.
    pub timestamp: Option<DateTime<Utc>>,
}

impl Evaluation {
    pub fn directions(&self) -> Vec<Option<Direction>> {
        self.bands.directions()
    }

    /// Every flip in the evaluated history.
    pub fn flips(&self) -> Vec<(usize, SignalKind)> {
        scan_flips(&self.directions())
    }
}

/// Run the transform, estimator, engine and extractor over an in-memory series.
pub fn evaluate_series(series: &Series, config: &SignalConfig) -> Result<Evaluation, ConfigError> {
    config.validate()?;
    let candles = if config.use_heikin_ashi {
        HeikinAshi::new().transform(series)
    } else {
        series.clone()
    };

    let atr = Atr::new(config.atr_period).compute(candles.bars());
    let bands = band_scan(candles.bars(), &atr, config.multiplier);
    let signal = last_signal(&bands.directions());
    let timestamp = candles.last_timestamp();

    Ok(Evaluation {
        candles,
        atr,
        bands,
        signal,
        timestamp,
    })
}

/// Result for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Signal {
        signal: Option<SignalKind>,
        timestamp: DateTime<Utc>,
    },
    InsufficientData {
        bars: usize,
        required: usize,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentReport {
    pub instrument: Instrument,
    pub outcome: Outcome,
}

impl InstrumentReport {
    /// Public output row; anything but a computed signal becomes a null row.
    pub fn to_signal(&self) -> InstrumentSignal {
        match &self.outcome {
            Outcome::Signal { signal, timestamp } => InstrumentSignal {
                symbol: self.instrument.base.clone(),
                signal: *signal,
                timestamp: Some(*timestamp),
            },
            Outcome::InsufficientData { .. } | Outcome::Failed { .. } => {
                InstrumentSignal::null(self.instrument.base.clone())
            }
        }
    }
}

/// Fetch and evaluate a single instrument.
pub fn process_instrument(
    config: &SignalConfig,
    provider: &dyn MarketDataProvider,
    instrument: &Instrument,
) -> InstrumentReport {
    let report = |outcome| InstrumentReport {
        instrument: instrument.clone(),
        outcome,
    };

    if let Err(e) = config.validate() {
        warn!(symbol = %instrument, error = %e, "instrument skipped");
        return report(Outcome::Failed {
            reason: e.to_string(),
        });
    }

    let window = config.fetch_window(provider.now());
    let series = match fetch_series(provider, instrument, &window) {
        Ok(series) => series,
        Err(e) => {
            warn!(symbol = %instrument, provider = provider.name(), error = %e, "instrument failed");
            return report(Outcome::Failed {
                reason: e.to_string(),
            });
        }
    };

    let required = config.min_bars();
    if series.len() < required {
        debug!(symbol = %instrument, bars = series.len(), required, "insufficient data");
        return report(Outcome::InsufficientData {
            bars: series.len(),
            required,
        });
    }

    let evaluation = match evaluate_series(&series, config) {
        Ok(evaluation) => evaluation,
        Err(e) => {
            return report(Outcome::Failed {
                reason: e.to_string(),
            })
        }
    };
    let Some(timestamp) = evaluation.timestamp else {
        return report(Outcome::InsufficientData { bars: 0, required });
    };

    debug!(
        symbol = %instrument,
        bars = series.len(),
        fingerprint = %series.fingerprint(),
        signal = ?evaluation.signal,
        "evaluated"
    );

    report(Outcome::Signal {
        signal: evaluation.signal,
        timestamp,
    })
}

/// Process every instrument, preserving input order.
pub fn run_batch(
    config: &SignalConfig,
    provider: &dyn MarketDataProvider,
    instruments: &[Instrument],
) -> Vec<InstrumentReport> {
    let sequential = || -> Vec<InstrumentReport> {
        instruments
            .iter()
            .map(|inst| process_instrument(config, provider, inst))
            .collect()
    };

    if !config.parallel || instruments.len() < 2 {
        return sequential();
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallel.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| {
            instruments
                .par_iter()
                .map(|inst| process_instrument(config, provider, inst))
                .collect()
        }),
        Err(e) => {
            warn!(error = %e, "failed to build thread pool, running sequentially");
            sequential()
        }
    }
}

/// Resolve configured bases against the venue catalog.
pub fn resolve_universe(
    config: &SignalConfig,
    catalog: &dyn MarketCatalog,
) -> Result<Vec<Instrument>, PipelineError> {
    let markets = catalog.load_markets()?;
    let instruments = resolve_instruments(
        &markets,
        &config.coins,
        &config.quote,
        config.target_count,
        &config.leveraged_patterns,
    );
    if instruments.is_empty() {
        return Err(PipelineError::EmptyUniverse);
    }
    Ok(instruments)
}

/// Full run: resolve, then evaluate every instrument into output rows.
pub fn run_signals(
    config: &SignalConfig,
    catalog: &dyn MarketCatalog,
    provider: &dyn MarketDataProvider,
) -> Result<Vec<InstrumentSignal>, PipelineError> {
    config.validate()?;
    let instruments = resolve_universe(config, catalog)?;

    info!(
        instruments = instruments.len(),
        provider = provider.name(),
        timeframe = %config.timeframe,
        parallel = config.parallel,
        "signal run started"
    );

    let reports = run_batch(config, provider, &instruments);

    let (mut flips, mut nulls, mut failed) = (0usize, 0usize, 0usize);
    for r in &reports {
        match &r.outcome {
            Outcome::Signal { signal: Some(_), .. } => flips += 1,
            Outcome::Signal { signal: None, .. } | Outcome::InsufficientData { .. } => nulls += 1,
            Outcome::Failed { .. } => failed += 1,
        }
    }
    info!(flips, quiet = nulls, failed, "signal run finished");

    Ok(reports.iter().map(InstrumentReport::to_signal).collect())
}
