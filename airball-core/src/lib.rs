//! Flight-danger assessment engine for the Airball instrument
//!
//! Turns quality-flagged instrument readings (airspeed, angle of attack,
//! lateral acceleration, height above ground, roll, vertical speed) into a
//! single danger level between 0 and 10, a short pilot message and the
//! presentation hints the display needs.
//!
//! Key constraints:
//! - Recomputed on every sensor change, so the hot path does not allocate
//!   beyond the returned message
//! - A malformed danger table is rejected at load time, never mid-flight
//! - Per-update numeric problems degrade to "no danger" plus a log line,
//!   they never stop the monitor
//!
//! ```no_run
//! use airball_core::{AirballConfig, Reading, SensorSnapshot, NoGeolocation};
//!
//! let config = AirballConfig::from_json(r#"{ "table_path": "danger.csv", "aux": { "vs": 60.0 } }"#)?;
//! let engine = config.build_engine(Box::new(NoGeolocation))?.expect("table configured");
//!
//! let snapshot = SensorSnapshot {
//!     ias: Reading::good(90.0),
//!     aoa: Reading::good(5.0),
//!     ..SensorSnapshot::default()
//! };
//! let outcome = engine.assess(&snapshot)?;
//! println!("danger {:.1}: {}", outcome.assessment.danger_level, outcome.assessment.message);
//! # Ok::<(), airball_core::EngineError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

// Optional logging, compiled out when the `log` crate is not linked
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_error {
    ($($arg:tt)*) => { log::error!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

pub mod channel;
pub mod classify;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod filter;
pub mod phase;
pub mod presentation;
pub mod quality;
pub mod table;
pub mod terrain;

#[cfg(feature = "std")]
pub mod monitor;
#[cfg(feature = "std")]
pub mod signal;

// Public API
pub use channel::{AuxLimits, ChannelId, Reading, SensorSnapshot};
pub use classify::{Category, Classification, Classifier, ClassifierThresholds, DangerKey, Level};
pub use config::{AirballConfig, AuxConfig};
pub use engine::{DangerAssessment, DangerEngine, Outcome, Stage};
pub use errors::{EngineError, EngineResult};
pub use filter::MovingAverage;
pub use phase::{
    FlightPhaseSuppressor, Geolocation, NoGeolocation, RunwayPolicy, Suppression, SuppressionConfig,
};
pub use presentation::{BallPosition, ColorPolicy, DisplayState, Presentation, Rgb};
pub use quality::{GateState, Quality, QualityGate};
pub use table::{DangerEntry, DangerTable};
pub use terrain::{TerrainConfig, TerrainEscalator};

#[cfg(feature = "std")]
pub use monitor::{Monitor, SensorChannels};
#[cfg(feature = "std")]
pub use signal::{Signal, Subscription};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
