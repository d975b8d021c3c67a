//! Domain types for the signal pipeline

pub mod bar;
pub mod cadence;
pub mod instrument;
pub mod series;
pub mod signal;

pub use bar::Bar;
pub use cadence::Cadence;
pub use instrument::Instrument;
pub use series::{Series, SeriesError};
pub use signal::{Direction, InstrumentSignal, SignalKind};
