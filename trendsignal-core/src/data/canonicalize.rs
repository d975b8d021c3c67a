//! Canonicalization of raw paged bars: sort ascending, dedupe keep-first.

use super::provider::DataError;
use crate::domain::{Bar, Series};
use chrono::DateTime;
use polars::prelude::*;

/// Canonicalizer for bar data
pub struct Canonicalizer;

impl Canonicalizer {
    /// Sort by timestamp and drop duplicate timestamps.
    ///
    /// The sort is stable, so among duplicates the one that arrived first wins.
    pub fn canonicalize(df: LazyFrame) -> LazyFrame {
        df.sort(
            ["timestamp"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .unique_stable(Some(vec!["timestamp".into()]), UniqueKeepStrategy::First)
    }

    /// Columnar view of bars; timestamps as epoch milliseconds.
    pub fn to_frame(bars: &[Bar]) -> PolarsResult<DataFrame> {
        df!(
            "timestamp" => bars.iter().map(|b| b.timestamp.timestamp_millis()).collect::<Vec<i64>>(),
            "open" => bars.iter().map(|b| b.open).collect::<Vec<f64>>(),
            "high" => bars.iter().map(|b| b.high).collect::<Vec<f64>>(),
            "low" => bars.iter().map(|b| b.low).collect::<Vec<f64>>(),
            "close" => bars.iter().map(|b| b.close).collect::<Vec<f64>>(),
            "volume" => bars.iter().map(|b| b.volume).collect::<Vec<f64>>(),
        )
    }

    /// Rebuild bars from a frame produced by `to_frame`.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
        let polars_err = |e: PolarsError| DataError::Canonicalize(e.to_string());

        let ts = df.column("timestamp").map_err(polars_err)?.i64().map_err(polars_err)?;
        let f64_col = |name: &str| -> Result<Vec<Option<f64>>, DataError> {
            Ok(df
                .column(name)
                .map_err(polars_err)?
                .f64()
                .map_err(polars_err)?
                .iter()
                .collect())
        };
        let open = f64_col("open")?;
        let high = f64_col("high")?;
        let low = f64_col("low")?;
        let close = f64_col("close")?;
        let volume = f64_col("volume")?;

        ts.iter()
            .enumerate()
            .map(|(i, millis)| {
                let timestamp = millis
                    .and_then(DateTime::from_timestamp_millis)
                    .ok_or_else(|| DataError::Canonicalize(format!("bad timestamp at row {i}")))?;
                let value = |col: &[Option<f64>]| {
                    col[i].ok_or_else(|| DataError::Canonicalize(format!("null value at row {i}")))
                };
                Ok(Bar {
                    timestamp,
                    open: value(&open)?,
                    high: value(&high)?,
                    low: value(&low)?,
                    close: value(&close)?,
                    volume: value(&volume)?,
                })
            })
            .collect()
    }

    /// Raw bars in arrival order to a canonical series.
    pub fn canonicalize_bars(bars: Vec<Bar>) -> Result<Series, DataError> {
        if bars.is_empty() {
            return Ok(Series::default());
        }
        let polars_err = |e: PolarsError| DataError::Canonicalize(e.to_string());
        let df = Self::to_frame(&bars).map_err(polars_err)?;
        let canonical = Self::canonicalize(df.lazy()).collect().map_err(polars_err)?;
        Ok(Series::from_ordered(Self::from_frame(&canonical)?))
    }
}
