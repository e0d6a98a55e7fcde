//! Sensor channels, snapshots and per-session reference limits
//!
//! The sensor layer owns the live values; the engine works on a
//! [`SensorSnapshot`] taken for one update. A reading's numeric value is only
//! meaningful while its quality is [`Quality::Good`].

use core::fmt;

use crate::constants::{
    display::ALPHA_MAX_STALL_RATIO,
    flight::{ALPHA_X_STALL_FRACTION, VX_DEFAULT_VS_RATIO},
    DEFAULT_ALAT_MULTIPLIER, DEFAULT_ALPHA_STALL_DEG,
};
use crate::quality::Quality;

/// Input channels the engine subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ChannelId {
    /// Indicated airspeed (knots)
    Ias = 0,
    /// Angle of attack (degrees)
    Aoa = 1,
    /// Lateral acceleration (g)
    Alat = 2,
    /// Altitude above ground level (feet)
    Agl = 3,
    /// Roll / bank angle (degrees)
    Roll = 4,
    /// Vertical speed (feet per minute)
    Vs = 5,
}

impl ChannelId {
    /// All channels in subscription order
    pub const ALL: [ChannelId; 6] = [
        ChannelId::Ias,
        ChannelId::Aoa,
        ChannelId::Alat,
        ChannelId::Agl,
        ChannelId::Roll,
        ChannelId::Vs,
    ];

    /// Data-bus key of the channel
    pub const fn key(&self) -> &'static str {
        match self {
            ChannelId::Ias => "IAS",
            ChannelId::Aoa => "AOA",
            ChannelId::Alat => "ALAT",
            ChannelId::Agl => "AGL",
            ChannelId::Roll => "ROLL",
            ChannelId::Vs => "VS",
        }
    }

    /// Unit of measurement
    pub const fn unit(&self) -> &'static str {
        match self {
            ChannelId::Ias => "kt",
            ChannelId::Aoa | ChannelId::Roll => "deg",
            ChannelId::Alat => "g",
            ChannelId::Agl => "ft",
            ChannelId::Vs => "ft/min",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value with its quality flag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Measured value in channel units
    pub value: f64,
    /// Trustworthiness of `value`
    pub quality: Quality,
}

impl Reading {
    /// Reading with good quality
    pub const fn good(value: f64) -> Self {
        Self { value, quality: Quality::Good }
    }

    /// Reading with an explicit quality
    pub const fn new(value: f64, quality: Quality) -> Self {
        Self { value, quality }
    }

    /// Value if quality is good and the number is finite
    pub fn usable(&self) -> Option<f64> {
        if self.quality.is_good() && self.value.is_finite() {
            Some(self.value)
        } else {
            None
        }
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::good(0.0)
    }
}

/// Values of every channel for one update cycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Indicated airspeed
    pub ias: Reading,
    /// Angle of attack
    pub aoa: Reading,
    /// Lateral acceleration (already filtered when a filter is configured)
    pub alat: Reading,
    /// Altitude above ground level
    pub agl: Reading,
    /// Roll angle
    pub roll: Reading,
    /// Vertical speed
    pub vs: Reading,
}

impl SensorSnapshot {
    /// Reading for a channel
    pub fn get(&self, channel: ChannelId) -> &Reading {
        match channel {
            ChannelId::Ias => &self.ias,
            ChannelId::Aoa => &self.aoa,
            ChannelId::Alat => &self.alat,
            ChannelId::Agl => &self.agl,
            ChannelId::Roll => &self.roll,
            ChannelId::Vs => &self.vs,
        }
    }

    /// Mutable reading for a channel
    pub fn get_mut(&mut self, channel: ChannelId) -> &mut Reading {
        match channel {
            ChannelId::Ias => &mut self.ias,
            ChannelId::Aoa => &mut self.aoa,
            ChannelId::Alat => &mut self.alat,
            ChannelId::Agl => &mut self.agl,
            ChannelId::Roll => &mut self.roll,
            ChannelId::Vs => &mut self.vs,
        }
    }
}

/// Reference speeds, angles and scale factors for one session
///
/// Built once from configuration; immutable afterwards. Speeds have no
/// default; the engine guards every ratio that depends on them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxLimits {
    /// Clean stall speed Vs (knots)
    pub vs: Option<f64>,
    /// Landing-configuration stall speed Vs0 (knots)
    pub vs0: Option<f64>,
    /// Best angle of climb speed Vx (knots)
    pub vx: Option<f64>,
    /// Critical angle of attack (degrees)
    pub alpha_stall: f64,
    /// Top of the AOA scale (degrees)
    pub alpha_max: f64,
    /// Bottom of the AOA scale (degrees)
    pub alpha_min: f64,
    /// AOA for best angle of climb (degrees)
    pub alpha_x: f64,
    /// Lateral acceleration to ball deflection scale (1/g)
    pub alat_multiplier: f64,
}

impl Default for AuxLimits {
    fn default() -> Self {
        Self::with_alpha_stall(DEFAULT_ALPHA_STALL_DEG)
    }
}

impl AuxLimits {
    /// Limits for a given critical angle with every derived value defaulted
    pub fn with_alpha_stall(alpha_stall: f64) -> Self {
        let alpha_max = alpha_stall * ALPHA_MAX_STALL_RATIO;
        Self {
            vs: None,
            vs0: None,
            vx: None,
            alpha_stall,
            alpha_max,
            alpha_min: -alpha_max,
            alpha_x: alpha_stall * ALPHA_X_STALL_FRACTION,
            alat_multiplier: DEFAULT_ALAT_MULTIPLIER,
        }
    }

    /// Set stall speeds
    pub fn stall_speeds(mut self, vs: f64, vs0: Option<f64>) -> Self {
        self.vs = Some(vs);
        self.vs0 = vs0;
        self
    }

    /// Landing-configuration stall speed, falling back to Vs
    pub fn vs0(&self) -> Option<f64> {
        self.vs0.or(self.vs)
    }

    /// Vx, falling back to 1.2 Vs
    pub fn vx(&self) -> Option<f64> {
        self.vx.or_else(|| self.vs.map(|vs| vs * VX_DEFAULT_VS_RATIO))
    }

    /// Lateral acceleration (g) at which the ball hits the end of the tube
    pub fn max_coordinated_displacement(&self) -> f64 {
        1.0 / self.alat_multiplier
    }

    /// Span of the AOA scale
    pub fn alpha_range(&self) -> f64 {
        self.alpha_max - self.alpha_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_alpha_defaults() {
        let limits = AuxLimits::with_alpha_stall(15.0);
        assert!((limits.alpha_max - 19.5).abs() < 1e-9);
        assert!((limits.alpha_min + 19.5).abs() < 1e-9);
        assert!((limits.alpha_x - 11.25).abs() < 1e-9);
        assert!((limits.alpha_range() - 39.0).abs() < 1e-9);
    }

    #[test]
    fn speed_fallbacks() {
        let limits = AuxLimits::default().stall_speeds(60.0, None);
        assert_eq!(limits.vs0(), Some(60.0));
        assert!((limits.vx().unwrap() - 72.0).abs() < 1e-9);

        let limits = AuxLimits::default().stall_speeds(60.0, Some(50.0));
        assert_eq!(limits.vs0(), Some(50.0));

        assert_eq!(AuxLimits::default().vx(), None);
    }

    #[test]
    fn default_displacement_matches_inclinometer() {
        let limits = AuxLimits::default();
        assert!((limits.max_coordinated_displacement() - 0.217).abs() < 1e-9);
    }

    #[test]
    fn usable_requires_good_finite() {
        assert_eq!(Reading::good(3.0).usable(), Some(3.0));
        assert_eq!(Reading::new(3.0, Quality::Old).usable(), None);
        assert_eq!(Reading::good(f64::NAN).usable(), None);
    }
}
