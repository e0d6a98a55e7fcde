//! Presentation Defaults

/// Danger level at which the ball reaches the full danger color.
///
/// Anything above this flashes.
pub const MAX_COLOR_DANGER_LEVEL: f64 = 8.0;

/// Critical angle of attack (degrees) when none is configured.
pub const DEFAULT_ALPHA_STALL_DEG: f64 = 10.0;

/// Ratio of alpha_max to alpha_stall when alpha_max is not configured.
pub const ALPHA_MAX_STALL_RATIO: f64 = 1.3;
