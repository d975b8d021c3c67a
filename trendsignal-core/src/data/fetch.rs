//! Bar store builder — paged retrieval of a lookback window.
//!
//! Requests pages from the provider starting at the window start. Each next
//! page starts 1 ms after the last bar of the previous page. Pagination ends on
//! an empty page or once the last bar reaches the live edge (`now - 1s`).
//! A pacing delay follows every non-empty page to stay under venue rate limits.
//! Bars failing the OHLC sanity check are dropped; the rest are canonicalized
//! (sorted, deduplicated keep-first).

use super::canonicalize::Canonicalizer;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Bar, Cadence, Instrument, Series};
use chrono::{DateTime, Duration, Months, Utc};
use tracing::{debug, warn};

/// What to fetch and how fast.
#[derive(Debug, Clone)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub cadence: Cadence,
    pub page_limit: usize,
    pub pacing: std::time::Duration,
}

impl FetchWindow {
    /// Window starting `months` calendar months before `now`.
    pub fn lookback(
        now: DateTime<Utc>,
        months: u32,
        cadence: Cadence,
        page_limit: usize,
        pacing: std::time::Duration,
    ) -> Self {
        Self {
            start: window_start(now, months),
            cadence,
            page_limit,
            pacing,
        }
    }
}

/// `now` minus `months` calendar months (clamped to the earliest representable instant).
pub fn window_start(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Fetch every bar from `window.start` to the live edge as a canonical series.
pub fn fetch_series(
    provider: &dyn MarketDataProvider,
    instrument: &Instrument,
    window: &FetchWindow,
) -> Result<Series, DataError> {
    let live_edge_slack = Duration::seconds(1);
    let mut since = window.start;
    let mut raw = Vec::new();
    let mut pages = 0usize;

    loop {
        let page = provider.fetch_page(instrument, window.cadence, since, window.page_limit)?;
        let Some(last) = page.last().map(|b| b.timestamp) else {
            break;
        };
        pages += 1;
        debug!(
            symbol = %instrument,
            page = pages,
            bars = page.len(),
            since = %since,
            "fetched page"
        );
        raw.extend(page);

        if !window.pacing.is_zero() {
            std::thread::sleep(window.pacing);
        }

        if last > provider.now() - live_edge_slack {
            break;
        }

        let next = last + Duration::milliseconds(1);
        if next <= since {
            warn!(
                symbol = %instrument,
                provider = provider.name(),
                "provider did not advance past cursor, stopping pagination"
            );
            break;
        }
        since = next;
    }

    let fetched = raw.len();
    raw.retain(Bar::is_sane);
    if raw.len() < fetched {
        warn!(
            symbol = %instrument,
            dropped = fetched - raw.len(),
            "dropped bars with invalid OHLC values"
        );
    }

    let series = Canonicalizer::canonicalize_bars(raw)?;
    debug!(symbol = %instrument, pages, bars = series.len(), "bar store built");
    Ok(series)
}
