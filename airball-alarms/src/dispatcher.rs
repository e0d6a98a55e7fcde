//! Ties the alarm sessions to the published danger level

use std::sync::Arc;

use airball_core::signal::{Signal, Subscription};

use crate::aural::AuralSession;
use crate::config::AlarmConfig;
use crate::error::{ActuatorError, ActuatorResult};
use crate::shaker::StickShaker;
use crate::{ActuatorStats, DangerSink};

/// Forwards every danger level change to the alarm sessions
///
/// The callback runs on the engine's thread and only posts to the session
/// mailboxes. Dropping the dispatcher unsubscribes and quits every session.
pub struct AlarmDispatcher {
    sinks: Vec<Arc<dyn DangerSink>>,
    subscription: Option<Subscription>,
}

impl std::fmt::Debug for AlarmDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("AlarmDispatcher")
            .field("sinks", &names)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

impl AlarmDispatcher {
    /// Subscribe sessions to a danger level signal
    ///
    /// The current value is forwarded immediately.
    pub fn new(danger_level: &Signal<f64>, sinks: Vec<Arc<dyn DangerSink>>) -> Self {
        let forward = {
            let sinks = sinks.clone();
            move |level: &f64| dispatch(&sinks, *level)
        };
        dispatch(&sinks, danger_level.latest());
        let subscription = danger_level.subscribe(forward);

        log::debug!("Alarm dispatcher started with {} session(s)", sinks.len());
        Self {
            sinks,
            subscription: Some(subscription),
        }
    }

    /// Build the configured sessions and subscribe them
    ///
    /// Aural warnings run when the ladder has at least one rung; the stick
    /// shaker runs when `ss_ttyname` is set.
    pub fn from_config(config: &AlarmConfig, danger_level: &Signal<f64>) -> ActuatorResult<Self> {
        let mut sinks: Vec<Arc<dyn DangerSink>> = Vec::new();
        if !config.aural_warnings.is_empty() {
            sinks.push(Arc::new(AuralSession::from_config(config)?));
        }
        if let Some(shaker) = StickShaker::open(config)? {
            sinks.push(Arc::new(shaker));
        }
        if sinks.is_empty() {
            log::warn!("No aural warnings or stick shaker configured");
        }
        Ok(Self::new(danger_level, sinks))
    }

    /// Sessions in dispatch order
    pub fn sinks(&self) -> &[Arc<dyn DangerSink>] {
        &self.sinks
    }

    /// Counters per session
    pub fn stats(&self) -> Vec<(&'static str, ActuatorStats)> {
        self.sinks.iter().map(|s| (s.name(), s.stats())).collect()
    }

    /// Unsubscribe and quit every session
    pub fn shutdown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            for sink in &self.sinks {
                sink.quit();
            }
            log::debug!("Alarm dispatcher stopped");
        }
    }
}

impl Drop for AlarmDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn dispatch(sinks: &[Arc<dyn DangerSink>], danger_level: f64) {
    for sink in sinks {
        match sink.on_danger(danger_level) {
            Ok(()) | Err(ActuatorError::SessionClosed) => {}
            Err(e) => log::warn!("{}: {}", sink.name(), e),
        }
    }
}
