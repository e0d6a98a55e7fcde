//! Live monitor
//!
//! Wires the engine to the sensor channels. One callback is registered per
//! channel; any change of value or quality reruns the whole pipeline on the
//! current snapshot and publishes the result on three output signals:
//!
//! - `danger_level`: the scalar downstream alarms consume
//! - `message`: the pilot message
//! - `display`: color, flash and ball position, or the failure indicator
//!
//! While a gated channel is failed the danger level rests at 0 with an empty
//! message, so no alarm keeps sounding behind the failure indicator. A fatal
//! engine error faults the monitor: it is logged once and nothing is
//! published afterwards.
//!
//! Updates may arrive on several threads. Each one takes a sequence number
//! while it holds the filter state and publishes under a separate lock;
//! an update older than the last one published is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::channel::{ChannelId, Reading, SensorSnapshot};
use crate::config::AirballConfig;
use crate::engine::DangerEngine;
use crate::errors::EngineResult;
use crate::filter::MovingAverage;
use crate::phase::Geolocation;
use crate::presentation::{DisplayState, Presentation};
use crate::quality::Quality;
use crate::signal::{Signal, Subscription};

/// The six input channels
#[derive(Debug, Clone)]
pub struct SensorChannels {
    /// Indicated airspeed (kt)
    pub ias: Signal<Reading>,
    /// Angle of attack (deg)
    pub aoa: Signal<Reading>,
    /// Lateral acceleration (g)
    pub alat: Signal<Reading>,
    /// Height above ground (ft)
    pub agl: Signal<Reading>,
    /// Roll (deg)
    pub roll: Signal<Reading>,
    /// Vertical speed (ft/min)
    pub vs: Signal<Reading>,
}

impl Default for SensorChannels {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorChannels {
    /// Channels with no data yet (value 0, quality old)
    pub fn new() -> Self {
        let fresh = |ch: ChannelId| Signal::new(ch.key(), Reading::new(0.0, Quality::Old));
        Self {
            ias: fresh(ChannelId::Ias),
            aoa: fresh(ChannelId::Aoa),
            alat: fresh(ChannelId::Alat),
            agl: fresh(ChannelId::Agl),
            roll: fresh(ChannelId::Roll),
            vs: fresh(ChannelId::Vs),
        }
    }

    /// Signal for one channel
    pub fn get(&self, channel: ChannelId) -> &Signal<Reading> {
        match channel {
            ChannelId::Ias => &self.ias,
            ChannelId::Aoa => &self.aoa,
            ChannelId::Alat => &self.alat,
            ChannelId::Agl => &self.agl,
            ChannelId::Roll => &self.roll,
            ChannelId::Vs => &self.vs,
        }
    }

    /// Latest value of every channel
    pub fn snapshot(&self) -> SensorSnapshot {
        let mut snapshot = SensorSnapshot::default();
        for ch in ChannelId::ALL {
            *snapshot.get_mut(ch) = self.get(ch).latest();
        }
        snapshot
    }
}

struct FilterState {
    filter: MovingAverage,
    alat: f64,
    sequence: u64,
}

struct Shared {
    engine: DangerEngine,
    presentation: Presentation,
    channels: SensorChannels,
    state: Mutex<FilterState>,
    published: Mutex<u64>,
    faulted: AtomicBool,
    danger_level: Signal<f64>,
    message: Signal<String>,
    display: Signal<DisplayState>,
}

impl Shared {
    fn on_change(&self, channel: ChannelId, reading: &Reading) {
        let alat_sample = (channel == ChannelId::Alat).then_some(reading);
        self.update(alat_sample);
    }

    fn update(&self, alat_sample: Option<&Reading>) {
        if self.faulted.load(Ordering::Acquire) {
            return;
        }

        // Compute under the state lock, publish under the publish lock
        let (sequence, result) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(reading) = alat_sample {
                state.alat = match reading.usable() {
                    Some(v) => state.filter.push(v),
                    None => reading.value,
                };
            }
            state.sequence += 1;

            let mut snapshot = self.channels.snapshot();
            snapshot.alat.value = state.alat;
            let result = self.engine.assess(&snapshot).map(|outcome| {
                let display = self
                    .presentation
                    .present(outcome.assessment.danger_level, outcome.gate, &snapshot);
                (outcome, display)
            });
            (state.sequence, result)
        };

        let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        if sequence < *published {
            log_debug!("Dropped update {} older than {}", sequence, *published);
            return;
        }
        *published = sequence;

        match result {
            Ok((outcome, display)) => {
                if outcome.is_failure() {
                    self.message.publish(String::new());
                    self.danger_level.publish(0.0);
                } else {
                    self.message.publish(outcome.assessment.message);
                    self.danger_level.publish(outcome.assessment.danger_level);
                }
                self.display.publish(display);
            }
            Err(e) => {
                if !self.faulted.swap(true, Ordering::AcqRel) {
                    log_error!("Danger monitor stopped: {}", e);
                }
            }
        }
    }
}

/// Runs the engine on every sensor change
pub struct Monitor {
    shared: Arc<Shared>,
    _subscriptions: Vec<Subscription>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("danger_level", &self.shared.danger_level.latest())
            .field("faulted", &self.is_faulted())
            .finish()
    }
}

impl Monitor {
    /// Subscribe an engine to a set of channels
    pub fn new(
        engine: DangerEngine,
        presentation: Presentation,
        filter: MovingAverage,
        channels: &SensorChannels,
    ) -> Self {
        let initial_alat = channels.alat.latest().value;
        let shared = Arc::new(Shared {
            engine,
            presentation,
            channels: channels.clone(),
            state: Mutex::new(FilterState {
                filter,
                alat: initial_alat,
                sequence: 0,
            }),
            published: Mutex::new(0),
            faulted: AtomicBool::new(false),
            danger_level: Signal::new("DANGER_LEVEL", 0.0),
            message: Signal::new("DANGER_MESSAGE", String::new()),
            display: Signal::new("DISPLAY", DisplayState::Failure),
        });

        let subscriptions = ChannelId::ALL
            .iter()
            .map(|&ch| {
                let weak: Weak<Shared> = Arc::downgrade(&shared);
                channels.get(ch).subscribe(move |reading| {
                    if let Some(shared) = weak.upgrade() {
                        shared.on_change(ch, reading);
                    }
                })
            })
            .collect();

        log_debug!("Danger monitor subscribed to {} channels", ChannelId::ALL.len());
        Self {
            shared,
            _subscriptions: subscriptions,
        }
    }

    /// Build engine, presentation and filter from configuration
    ///
    /// `Ok(None)` when no danger table is configured.
    pub fn from_config(
        config: &AirballConfig,
        channels: &SensorChannels,
        geo: Box<dyn Geolocation + Send + Sync>,
    ) -> EngineResult<Option<Self>> {
        let Some(engine) = config.build_engine(geo)? else {
            return Ok(None);
        };
        Ok(Some(Self::new(
            engine,
            config.presentation()?,
            config.alat_filter(),
            channels,
        )))
    }

    /// Recompute from the current channel values without waiting for a change
    pub fn refresh(&self) {
        self.shared.update(None);
    }

    /// Published danger level
    pub fn danger_level(&self) -> &Signal<f64> {
        &self.shared.danger_level
    }

    /// Published pilot message
    pub fn message(&self) -> &Signal<String> {
        &self.shared.message
    }

    /// Published display state
    pub fn display(&self) -> &Signal<DisplayState> {
        &self.shared.display
    }

    /// Whether a fatal engine error stopped publishing
    pub fn is_faulted(&self) -> bool {
        self.shared.faulted.load(Ordering::Acquire)
    }

    /// Engine in use
    pub fn engine(&self) -> &DangerEngine {
        &self.shared.engine
    }
}
