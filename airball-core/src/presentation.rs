//! Presentation Mapper
//!
//! What the display layer needs from an assessment: a ball color, whether it
//! flashes, and where the ball sits. Drawing it is someone else's job.
//!
//! Color runs linearly from the safe color at danger 0 to the danger color
//! at `max_color_danger_level`; anything beyond that flashes. A degraded
//! instrument shows the neutral color and never flashes.

use core::fmt;
use core::str::FromStr;

use alloc::format;
use alloc::string::String;

use libm::round;

use crate::channel::{AuxLimits, SensorSnapshot};
use crate::constants::MAX_COLOR_DANGER_LEVEL;
use crate::errors::EngineError;
use crate::quality::GateState;

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String"))]
pub struct Rgb {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
}

impl Rgb {
    /// `#00ff00`
    pub const GREEN: Rgb = Rgb::new(0x00, 0xff, 0x00);
    /// `#ff0000`
    pub const RED: Rgb = Rgb::new(0xff, 0x00, 0x00);
    /// `#a0a0a4`
    pub const GRAY: Rgb = Rgb::new(0xa0, 0xa0, 0xa4);
    /// `#ffff00`
    pub const YELLOW: Rgb = Rgb::new(0xff, 0xff, 0x00);
    /// `#000000`
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    /// `#ffffff`
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    /// `#0000ff`
    pub const BLUE: Rgb = Rgb::new(0x00, 0x00, 0xff);

    /// Create a color
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise linear blend, `ratio` 0 gives `self`, 1 gives `other`
    pub fn interpolate(&self, other: &Rgb, ratio: f64) -> Rgb {
        let mix = |a: u8, b: u8| -> u8 {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * ratio;
            round(v).clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl FromStr for Rgb {
    type Err = EngineError;

    /// `#rrggbb` or a color name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || EngineError::InvalidConfig {
            field: "color",
            reason: format!("'{}' is neither #rrggbb nor a known color name", s),
        };

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(invalid());
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            return Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?));
        }

        match s.to_ascii_lowercase().as_str() {
            "green" => Ok(Rgb::GREEN),
            "red" => Ok(Rgb::RED),
            "gray" | "grey" => Ok(Rgb::GRAY),
            "yellow" => Ok(Rgb::YELLOW),
            "black" => Ok(Rgb::BLACK),
            "white" => Ok(Rgb::WHITE),
            "blue" => Ok(Rgb::BLUE),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Danger → color mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorPolicy {
    /// Color at danger 0
    pub safe: Rgb,
    /// Color at `max_color_danger_level`
    pub danger: Rgb,
    /// Color while degraded
    pub neutral: Rgb,
    /// Danger level that reaches the full danger color
    pub max_color_danger_level: f64,
}

impl Default for ColorPolicy {
    fn default() -> Self {
        Self {
            safe: Rgb::GREEN,
            danger: Rgb::RED,
            neutral: Rgb::GRAY,
            max_color_danger_level: MAX_COLOR_DANGER_LEVEL,
        }
    }
}

impl ColorPolicy {
    /// Clamped color ratio and flash flag
    ///
    /// `flash` is true iff the unclamped ratio exceeds 1.
    pub fn ratio(&self, danger_level: f64) -> (f64, bool) {
        let raw = danger_level / self.max_color_danger_level;
        if !raw.is_finite() {
            return (0.0, false);
        }
        (raw.clamp(0.0, 1.0), raw > 1.0)
    }

    /// Color and flash flag for a danger level under a gate state
    pub fn color(&self, danger_level: f64, gate: GateState) -> (Rgb, bool) {
        if gate == GateState::Degraded {
            return (self.neutral, false);
        }
        let (ratio, flash) = self.ratio(danger_level);
        (self.safe.interpolate(&self.danger, ratio), flash)
    }
}

/// Ball position on the instrument face, both axes normalized
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BallPosition {
    /// -1 (left end of the tube) to 1 (right end)
    pub lateral: f64,
    /// 0 (top, alpha_min) to 1 (bottom, alpha_max)
    pub vertical: f64,
}

impl BallPosition {
    /// Place the ball from lateral acceleration (g) and AOA (deg)
    pub fn from_readings(alat: f64, aoa: f64, limits: &AuxLimits) -> Self {
        let max_disp = limits.max_coordinated_displacement();
        let lateral = if alat.is_finite() && max_disp > 0.0 {
            -alat.clamp(-max_disp, max_disp) * limits.alat_multiplier
        } else {
            0.0
        };

        let range = limits.alpha_range();
        let vertical = if aoa.is_finite() && range > 0.0 {
            ((aoa - limits.alpha_min) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self { lateral, vertical }
    }
}

/// What the display should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayState {
    /// Fixed instrument-failure indicator
    Failure,
    /// Normal instrument
    Instrument {
        /// Ball color
        color: Rgb,
        /// Whether the ball flashes
        flash: bool,
        /// Ball position
        ball: BallPosition,
    },
}

/// Builds [`DisplayState`] for each update
#[derive(Debug, Clone, Copy)]
pub struct Presentation {
    policy: ColorPolicy,
    limits: AuxLimits,
}

impl Presentation {
    /// Create a mapper
    pub fn new(policy: ColorPolicy, limits: AuxLimits) -> Self {
        Self { policy, limits }
    }

    /// Color policy in use
    pub fn policy(&self) -> &ColorPolicy {
        &self.policy
    }

    /// Display state for one update
    pub fn present(&self, danger_level: f64, gate: GateState, snapshot: &SensorSnapshot) -> DisplayState {
        if gate.is_failed() {
            return DisplayState::Failure;
        }
        let (color, flash) = self.policy.color(danger_level, gate);
        let ball = BallPosition::from_readings(snapshot.alat.value, snapshot.aoa.value, &self.limits);
        DisplayState::Instrument { color, flash, ball }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelId, Reading};

    #[test]
    fn parses_hex_and_names() {
        assert_eq!("#a0a0a4".parse::<Rgb>().unwrap(), Rgb::GRAY);
        assert_eq!("Red".parse::<Rgb>().unwrap(), Rgb::RED);
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
        assert!("mauve".parse::<Rgb>().is_err());
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102ff");
    }

    #[test]
    fn ratio_and_flash() {
        let p = ColorPolicy::default();
        assert_eq!(p.ratio(0.0), (0.0, false));
        assert_eq!(p.ratio(4.0), (0.5, false));
        assert_eq!(p.ratio(8.0), (1.0, false));
        assert_eq!(p.ratio(9.0), (1.0, true));
    }

    #[test]
    fn color_blends() {
        let p = ColorPolicy::default();
        assert_eq!(p.color(0.0, GateState::Normal), (Rgb::GREEN, false));
        assert_eq!(p.color(4.0, GateState::Normal), (Rgb::new(128, 128, 0), false));
        assert_eq!(p.color(10.0, GateState::Normal), (Rgb::RED, true));
    }

    #[test]
    fn degraded_is_neutral_and_steady() {
        let p = ColorPolicy::default();
        assert_eq!(p.color(10.0, GateState::Degraded), (Rgb::GRAY, false));
    }

    #[test]
    fn ball_position() {
        let limits = AuxLimits::with_alpha_stall(10.0);
        let ball = BallPosition::from_readings(0.0, 0.0, &limits);
        assert!((ball.lateral).abs() < 1e-12);
        assert!((ball.vertical - 0.5).abs() < 1e-12);

        let ball = BallPosition::from_readings(1.0, 50.0, &limits);
        assert!((ball.lateral + 1.0).abs() < 1e-9);
        assert_eq!(ball.vertical, 1.0);

        let ball = BallPosition::from_readings(-0.1085, -50.0, &limits);
        assert!((ball.lateral - 0.5).abs() < 1e-9);
        assert_eq!(ball.vertical, 0.0);
    }

    #[test]
    fn failure_overrides_everything() {
        let pres = Presentation::new(ColorPolicy::default(), AuxLimits::default());
        let snap = SensorSnapshot {
            aoa: Reading::good(3.0),
            ..SensorSnapshot::default()
        };
        assert_eq!(
            pres.present(5.0, GateState::Failed { channel: ChannelId::Aoa }, &snap),
            DisplayState::Failure
        );
        assert!(matches!(
            pres.present(5.0, GateState::Normal, &snap),
            DisplayState::Instrument { flash: false, .. }
        ));
    }
}
