//! Quality gate
//!
//! Classifies the trustworthiness of the channels the instrument depends on.
//! A failed channel is terminal for the update: the display shows the failure
//! indicator instead of a ball. A bad or stale channel still lets the numbers
//! run, but the display falls back to a neutral color without flashing.

use crate::channel::{ChannelId, SensorSnapshot};

/// Per-channel data quality as reported by the sensor layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Quality {
    /// Fresh and trusted
    #[default]
    Good,
    /// Not refreshed within its expected interval
    Old,
    /// Source flagged the value as unreliable
    Bad,
    /// Source has failed entirely
    Failed,
}

impl Quality {
    /// Whether the value may be used as-is
    pub const fn is_good(&self) -> bool {
        matches!(self, Quality::Good)
    }

    /// Bad or old, but not failed
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Quality::Old | Quality::Bad)
    }

    /// Bad, old or failed
    pub const fn is_unusable(&self) -> bool {
        !self.is_good()
    }
}

/// Result of the quality gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// All gated channels good
    Normal,
    /// At least one gated channel bad or old
    Degraded,
    /// A gated channel has failed
    Failed {
        /// First failed channel in gate order
        channel: ChannelId,
    },
}

impl GateState {
    /// Whether the update should be suppressed for a failure display
    pub const fn is_failed(&self) -> bool {
        matches!(self, GateState::Failed { .. })
    }
}

/// Gate over the channels the instrument cannot work without
#[derive(Debug, Clone, Copy)]
pub struct QualityGate {
    channels: &'static [ChannelId],
}

impl Default for QualityGate {
    fn default() -> Self {
        Self::INSTRUMENT
    }
}

impl QualityGate {
    /// Airspeed, angle of attack and lateral acceleration
    pub const INSTRUMENT: Self = Self {
        channels: &[ChannelId::Ias, ChannelId::Aoa, ChannelId::Alat],
    };

    /// Channels this gate inspects
    pub fn channels(&self) -> &'static [ChannelId] {
        self.channels
    }

    /// Classify a snapshot
    ///
    /// Failure takes precedence over degradation regardless of channel order.
    pub fn check(&self, snapshot: &SensorSnapshot) -> GateState {
        let failed = self
            .channels
            .iter()
            .copied()
            .find(|&ch| snapshot.get(ch).quality == Quality::Failed);
        if let Some(channel) = failed {
            return GateState::Failed { channel };
        }

        let degraded = self
            .channels
            .iter()
            .any(|&ch| snapshot.get(ch).quality.is_degraded());
        if degraded {
            GateState::Degraded
        } else {
            GateState::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Reading;

    fn snapshot_with(channel: ChannelId, quality: Quality) -> SensorSnapshot {
        let mut snapshot = SensorSnapshot::default();
        snapshot.get_mut(channel).quality = quality;
        snapshot
    }

    #[test]
    fn all_good_is_normal() {
        assert_eq!(QualityGate::INSTRUMENT.check(&SensorSnapshot::default()), GateState::Normal);
    }

    #[test]
    fn any_failed_channel_fails() {
        for ch in QualityGate::INSTRUMENT.channels() {
            let state = QualityGate::INSTRUMENT.check(&snapshot_with(*ch, Quality::Failed));
            assert_eq!(state, GateState::Failed { channel: *ch });
        }
    }

    #[test]
    fn bad_or_old_degrades() {
        let gate = QualityGate::INSTRUMENT;
        assert_eq!(gate.check(&snapshot_with(ChannelId::Ias, Quality::Bad)), GateState::Degraded);
        assert_eq!(gate.check(&snapshot_with(ChannelId::Alat, Quality::Old)), GateState::Degraded);
    }

    #[test]
    fn failure_beats_degradation() {
        let mut snapshot = snapshot_with(ChannelId::Ias, Quality::Bad);
        snapshot.alat = Reading::new(0.0, Quality::Failed);
        assert_eq!(
            QualityGate::INSTRUMENT.check(&snapshot),
            GateState::Failed { channel: ChannelId::Alat }
        );
    }

    #[test]
    fn ungated_channels_ignored() {
        let gate = QualityGate::INSTRUMENT;
        assert_eq!(gate.check(&snapshot_with(ChannelId::Agl, Quality::Failed)), GateState::Normal);
        assert_eq!(gate.check(&snapshot_with(ChannelId::Roll, Quality::Bad)), GateState::Normal);
    }
}
