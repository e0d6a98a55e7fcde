//! Stick shaker session
//!
//! The shaker controller sits on a serial line and takes a short text
//! command carrying the shake intensity. The intensity is the danger level
//! times a multiplier, rounded to a configured number of digits, and is only
//! sent when it changes. Quitting sends intensity zero before the line is
//! closed so the stick never keeps shaking after the instrument stops.
//!
//! The command text comes from a template with a single value placeholder:
//!
//! | Placeholder | Renders |
//! |---|---|
//! | `{}` or `{0}` | value with the configured number of decimals |
//! | `{:.2f}` or `{0:.2f}` | value with exactly 2 decimals |
//! | `{{` / `}}` | a literal brace |

use std::fmt::Write as _;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::AlarmConfig;
use crate::error::{ActuatorError, ActuatorResult};
use crate::mailbox::Mailbox;
use crate::{ActuatorStats, DangerSink};

/// Serial write timeout
const PORT_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Value { precision: Option<usize> },
}

/// Parsed stick shaker command template
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    pieces: Vec<Piece>,
    default_precision: usize,
}

impl CommandTemplate {
    /// Parse a template
    pub fn parse(template: &str) -> ActuatorResult<Self> {
        let invalid = |reason: &str| ActuatorError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => field.push(ch),
                            None => return Err(invalid("unclosed '{'")),
                        }
                    }
                    let precision = Self::parse_field(&field).ok_or_else(|| {
                        invalid(&format!("unsupported placeholder '{{{}}}'", field))
                    })?;
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Value { precision });
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            pieces,
            default_precision: 0,
        })
    }

    // "", "0", ":.Nf" or "0:.Nf"
    fn parse_field(field: &str) -> Option<Option<usize>> {
        let spec = field.strip_prefix('0').unwrap_or(field);
        if spec.is_empty() {
            return Some(None);
        }
        let digits = spec.strip_prefix(":.")?.strip_suffix('f')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Some)
    }

    /// Decimals used by `{}` and `{0}`
    pub fn with_default_precision(mut self, precision: usize) -> Self {
        self.default_precision = precision;
        self
    }

    /// Whether the template contains a value placeholder
    pub fn has_placeholder(&self) -> bool {
        self.pieces.iter().any(|p| matches!(p, Piece::Value { .. }))
    }

    /// Command text for a value
    pub fn render(&self, value: f64) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Value { precision } => {
                    let precision = precision.unwrap_or(self.default_precision);
                    // Writing to a String cannot fail
                    let _ = write!(out, "{:.*}", precision, value);
                }
            }
        }
        out
    }
}

/// Intensity computation for the shaker
#[derive(Debug, Clone, PartialEq)]
pub struct ShakerSettings {
    /// Danger level scale factor
    pub multiplier: f64,
    /// Digits kept after rounding; negative rounds to tens, hundreds, ...
    pub round_digits: i32,
    /// Command template
    pub template: CommandTemplate,
}

impl ShakerSettings {
    /// Settings from the alarm configuration
    pub fn from_config(config: &AlarmConfig) -> ActuatorResult<Self> {
        let template = CommandTemplate::parse(&config.ss_message)?
            .with_default_precision(config.ss_round_digits.max(0) as usize);
        Ok(Self {
            multiplier: config.ss_multiplier,
            round_digits: config.ss_round_digits,
            template,
        })
    }

    /// Rounded shake intensity for a danger level
    pub fn intensity(&self, danger_level: f64) -> f64 {
        round_to(danger_level * self.multiplier, self.round_digits)
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let rounded = if digits >= 0 {
        let scale = libm::pow(10.0, f64::from(digits));
        libm::round(value * scale) / scale
    } else {
        let scale = libm::pow(10.0, f64::from(-digits));
        libm::round(value / scale) * scale
    };
    // Avoid sending "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[derive(Debug)]
enum ShakerCommand {
    Shake(f64),
    Quit,
}

/// Stick shaker on a byte link
pub struct StickShaker {
    mailbox: Arc<Mailbox<ShakerCommand>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<Mutex<ActuatorStats>>,
}

impl std::fmt::Debug for StickShaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StickShaker")
            .field("closed", &self.mailbox.is_closed())
            .field("stats", &self.stats())
            .finish()
    }
}

impl StickShaker {
    /// Start a session writing to `link`
    pub fn new<W>(link: W, settings: ShakerSettings) -> ActuatorResult<Self>
    where
        W: Write + Send + 'static,
    {
        let mailbox = Arc::new(Mailbox::new());
        let stats = Arc::new(Mutex::new(ActuatorStats::default()));

        let worker = {
            let mailbox = Arc::clone(&mailbox);
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name("stick-shaker".into())
                .spawn(move || run(link, settings, &mailbox, &stats))?
        };

        Ok(Self {
            mailbox,
            worker: Mutex::new(Some(worker)),
            stats,
        })
    }

    /// Open the configured serial port, `Ok(None)` when no shaker is configured
    ///
    /// The port is opened at `ss_rate` baud, 8N1 without flow control.
    pub fn open(config: &AlarmConfig) -> ActuatorResult<Option<Self>> {
        let Some(ttyname) = config.ss_ttyname.as_deref() else {
            return Ok(None);
        };
        let settings = ShakerSettings::from_config(config)?;
        let port = serialport::new(ttyname, config.ss_rate)
            .timeout(PORT_TIMEOUT)
            .open()
            .map_err(|source| ActuatorError::Serial {
                port: ttyname.to_string(),
                source,
            })?;
        log::info!("Stick shaker on {} at {} baud", ttyname, config.ss_rate);
        Self::new(port, settings).map(Some)
    }

    /// Start a session on an already open link with settings from `config`
    pub fn with_link<W>(config: &AlarmConfig, link: W) -> ActuatorResult<Self>
    where
        W: Write + Send + 'static,
    {
        Self::new(link, ShakerSettings::from_config(config)?)
    }

    /// Request the intensity for a danger level
    pub fn shake(&self, danger_level: f64) -> ActuatorResult<()> {
        self.mailbox.post(ShakerCommand::Shake(danger_level))
    }

    /// Send intensity zero, close the link and stop the worker
    pub fn quit(&self) {
        if self.mailbox.close_with(ShakerCommand::Quit).is_err() {
            return;
        }
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                log::error!("Stick shaker worker panicked");
            }
        }
    }

    /// Session counters
    pub fn stats(&self) -> ActuatorStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl DangerSink for StickShaker {
    fn name(&self) -> &'static str {
        "stick shaker"
    }

    fn on_danger(&self, danger_level: f64) -> ActuatorResult<()> {
        self.shake(danger_level)
    }

    fn quit(&self) {
        StickShaker::quit(self);
    }

    fn stats(&self) -> ActuatorStats {
        StickShaker::stats(self)
    }
}

impl Drop for StickShaker {
    fn drop(&mut self) {
        self.quit();
    }
}

fn send<W: Write>(link: &mut W, text: &str) -> std::io::Result<()> {
    link.write_all(text.as_bytes())?;
    link.flush()
}

fn run<W: Write>(
    mut link: W,
    settings: ShakerSettings,
    mailbox: &Mailbox<ShakerCommand>,
    stats: &Mutex<ActuatorStats>,
) {
    let record = |result: std::io::Result<()>| -> bool {
        let mut stats = stats.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(()) => {
                stats.commands_applied += 1;
                true
            }
            Err(e) => {
                log::warn!("Stick shaker write failed: {}", e);
                stats.record_failure(e.to_string());
                false
            }
        }
    };

    let mut current = 0.0;
    while let Some(command) = mailbox.recv() {
        match command {
            ShakerCommand::Shake(danger_level) => {
                let value = settings.intensity(danger_level);
                if !value.is_finite() {
                    log::warn!("Ignoring non-finite shake value for danger {}", danger_level);
                    continue;
                }
                // A failed write leaves `current` alone so the next request retries
                if value != current && record(send(&mut link, &settings.template.render(value))) {
                    current = value;
                }
            }
            ShakerCommand::Quit => {
                record(send(&mut link, &settings.template.render(0.0)));
                break;
            }
        }
    }
    log::debug!("Stick shaker link closed");
}
