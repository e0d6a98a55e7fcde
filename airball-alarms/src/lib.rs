//! Alarm sessions for the Airball danger level
//!
//! ## Overview
//!
//! The danger engine publishes a single scalar, the danger level in
//! [0, 10]. This crate turns it into things the pilot hears and feels:
//!
//! - **Aural warnings**: a ladder of `(threshold, volume, clip)` rungs. The
//!   clip of the highest threshold strictly exceeded plays in a loop; below
//!   every threshold the audio stops.
//! - **Stick shaker**: a text command with the rounded, scaled danger level
//!   written to a serial line whenever that value changes.
//!
//! ## Threading
//!
//! Each session owns one worker thread and a single-slot mailbox. The
//! engine thread only leaves the newest command in the mailbox and returns;
//! blocking device or process I/O happens on the worker. An unread command
//! is replaced by the next one.
//!
//! ```text
//! danger_level signal ──► AlarmDispatcher ─┬─► mailbox ─► aural worker ─► player / mixer
//!                                          └─► mailbox ─► shaker worker ─► tty
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use airball_alarms::{AlarmConfig, AlarmDispatcher};
//! use airball_core::Signal;
//!
//! let config = AlarmConfig::load("/etc/airball/alarms.json")?;
//! let danger_level = Signal::new("DANGER_LEVEL", 0.0);
//! let _alarms = AlarmDispatcher::from_config(&config, &danger_level)?;
//!
//! danger_level.publish(7.5);
//! # Ok::<(), airball_alarms::ActuatorError>(())
//! ```

pub mod aural;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ladder;
pub mod mailbox;
pub mod shaker;

pub use aural::{AudioOutput, AuralCommand, AuralSession, CommandOutput};
pub use config::AlarmConfig;
pub use dispatcher::AlarmDispatcher;
pub use error::{ActuatorError, ActuatorResult};
pub use ladder::{AlarmEntry, AlarmLadder};
pub use mailbox::{Mailbox, Received};
pub use shaker::{CommandTemplate, ShakerSettings, StickShaker};

/// Something driven by the danger level
///
/// Implementations must return quickly from [`DangerSink::on_danger`]; it
/// is called on the thread that published the danger level.
pub trait DangerSink: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Hand over a new danger level
    fn on_danger(&self, danger_level: f64) -> ActuatorResult<()>;

    /// Return the actuator to rest and release it
    fn quit(&self);

    /// Counters
    fn stats(&self) -> ActuatorStats;
}

/// Counters common to all sessions
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ActuatorStats {
    /// Device commands that succeeded
    pub commands_applied: u64,
    /// Device commands that failed
    pub failures: u64,
    /// Last failure message
    pub last_error: Option<String>,
}

impl ActuatorStats {
    /// Count a failure
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.failures += 1;
        self.last_error = Some(error.into());
    }
}
