//! Actuator errors

use thiserror::Error;

/// Errors raised by the alarm sessions
///
/// Sessions log these and carry on; none of them reaches the engine.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// Device, tty or child process I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened or configured
    #[error("Serial port {port}: {source}")]
    Serial {
        /// Device path as configured
        port: String,
        /// Underlying port error
        #[source]
        source: serialport::Error,
    },

    /// Stick shaker message template could not be parsed
    #[error("Invalid message template '{template}': {reason}")]
    InvalidTemplate {
        /// Template text as configured
        template: String,
        /// What is wrong with it
        reason: String,
    },

    /// The session has quit and accepts no more commands
    #[error("Session closed")]
    SessionClosed,

    /// Out-of-domain or unreadable alarm configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for actuator operations
pub type ActuatorResult<T> = Result<T, ActuatorError>;
