//! Flight-Phase and Terrain Limits
//!
//! Units follow the cockpit: knots, feet, feet per minute, degrees, g.

// ===== FLIGHT-PHASE SUPPRESSION =====

/// Fraction of Vs0 below which the aircraft cannot be flying.
///
/// 20% of landing-configuration stall speed is taxi speed at most.
pub const NOT_FLYING_VS0_FRACTION: f64 = 0.2;

/// Vertical speed magnitude (ft/min) treated as level / on the ground.
///
/// Below the noise floor of a typical VSI.
pub const GROUND_VS_LIMIT_FPM: f64 = 20.0;

/// Height above ground (ft) below which an aircraft near an airport is
/// assumed to be in the pattern or on the surface.
pub const GROUND_AGL_LIMIT_FT: f64 = 200.0;

/// Roll magnitude (degrees) accepted as wings-level over a runway.
pub const RUNWAY_ROLL_LIMIT_DEG: f64 = 5.0;

/// Lateral acceleration magnitude (g) accepted as coordinated over a runway
/// when the roll-and-lateral runway policy is selected.
pub const RUNWAY_ALAT_LIMIT_G: f64 = 0.05;

/// Ratio of Vx to Vs used when no Vx is configured.
pub const VX_DEFAULT_VS_RATIO: f64 = 1.2;

/// Fraction of alpha_stall used for alpha_x when not configured.
pub const ALPHA_X_STALL_FRACTION: f64 = 0.75;

// ===== TERRAIN CLOSURE =====

/// Time to ground contact (minutes) below which terrain is imminent.
pub const CLOSURE_ALERT_MINUTES: f64 = 1.0;

/// Danger points added when terrain closure is imminent.
pub const TERRAIN_ESCALATION: f64 = 5.0;

/// Height above terrain (ft) assumed when neither the AGL sensor nor the
/// terrain estimate is usable.
///
/// High enough that it never triggers ground or terrain logic by itself.
pub const TERRAIN_ESTIMATE_DEFAULT_FT: f64 = 10000.0;

/// Text appended to the pilot message on terrain escalation.
pub const TERRAIN_ALERT_SUFFIX: &str = " Terrain Alert!";
