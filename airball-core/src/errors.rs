//! Error Types for the Assessment Engine
//!
//! ## Error Categories
//!
//! Errors fall into two groups that are handled very differently:
//!
//! ### Load-time (fatal)
//! - `LookupInconsistency`: the danger table cannot resolve a key the
//!   classifier is able to produce
//! - `TableFormat`: the danger table file is malformed
//! - `InvalidConfig`: configuration cannot build an engine
//! - `Io`: table or configuration file could not be read
//!
//! These abort initialization. An engine that was built successfully never
//! reports them for a well-formed table.
//!
//! ### Disabled
//! - `ConfigurationMissing`: no danger table path is configured. The engine
//!   is simply not built and no alarm ever fires.
//!
//! ### Per-update (recoverable)
//! - `SensorQualityFailure`: a gated channel is failed; the display shows the
//!   failure indicator until quality recovers
//! - `InvalidInput`: a ratio could not be formed (zero stall speed, NaN)
//!
//! The engine never returns `InvalidInput` from [`DangerEngine::assess`]; it
//! logs it and publishes a danger level of 0 instead.
//!
//! ```rust
//! use airball_core::{EngineError, ChannelId};
//!
//! fn is_fatal(e: &EngineError) -> bool {
//!     !matches!(
//!         e,
//!         EngineError::SensorQualityFailure { .. }
//!             | EngineError::InvalidInput { .. }
//!             | EngineError::ConfigurationMissing { .. }
//!     )
//! }
//!
//! assert!(!is_fatal(&EngineError::SensorQualityFailure { channel: ChannelId::Aoa }));
//! ```
//!
//! [`DangerEngine::assess`]: crate::engine::DangerEngine::assess

use alloc::string::String;
use thiserror_no_std::Error;

use crate::channel::ChannelId;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A gated input channel reports failed quality
    #[error("Sensor quality failure on {channel}")]
    SensorQualityFailure {
        /// First failed channel in gate order
        channel: ChannelId,
    },

    /// Neither neighbour of an absent key exists in the danger table
    #[error("Danger table cannot resolve key {key}")]
    LookupInconsistency {
        /// The key that could not be resolved
        key: String,
    },

    /// The danger table file is malformed
    #[error("Danger table line {line}: {reason}")]
    TableFormat {
        /// 1-based line number in the source
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A required configuration value is absent
    #[error("Missing configuration: {field}")]
    ConfigurationMissing {
        /// Name of the missing field
        field: &'static str,
    },

    /// A configuration value is out of its domain
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Name of the offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A per-update ratio could not be formed
    #[error("No assessment possible: {reason}")]
    InvalidInput {
        /// Which guard fired
        reason: &'static str,
    },

    /// File could not be read or parsed
    #[error("I/O error: {0}")]
    Io(String),
}

impl EngineError {
    /// Whether this error must abort initialization
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            EngineError::SensorQualityFailure { .. }
                | EngineError::InvalidInput { .. }
                | EngineError::ConfigurationMissing { .. }
        )
    }

    pub(crate) fn table(line: usize, reason: impl Into<String>) -> Self {
        EngineError::TableFormat {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(alloc::string::ToString::to_string(&e))
    }
}
