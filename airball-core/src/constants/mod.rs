//! Constants for the Airball assessment engine
//!
//! Every numeric default the engine falls back to lives here, with the unit
//! in the name and a note on where the value comes from. Configuration can
//! override most of them; these are what an absent field means.
//!
//! ## Organization
//!
//! Constants are grouped by pipeline stage:
//! - **Classifier**: cut points that turn ratios into Low/Medium/High codes
//! - **Flight**: flight-phase suppression and terrain-closure escalation
//! - **Display**: color ratio and instrument geometry defaults
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Keep units in the name (`_KT`, `_FPM`, `_FT`, `_DEG`)
//! 3. Group related constants together

/// Categorical classifier thresholds.
pub mod classifier;

/// Flight-phase suppression and terrain escalation limits.
pub mod flight;

/// Presentation defaults.
pub mod display;

/// Lowest danger level the engine publishes.
pub const DANGER_MIN: f64 = 0.0;

/// Highest danger level the engine publishes.
pub const DANGER_MAX: f64 = 10.0;

pub use classifier::{
    SLIP_LOW_RATIO, SLIP_HIGH_RATIO, HAT_HIGH_FT, IAS_HIGH_RATIO,
    AOA_LOW_RATIO, AOA_HIGH_RATIO, ROLL_HIGH_DEG, DEFAULT_ALAT_MULTIPLIER,
};

pub use flight::{
    NOT_FLYING_VS0_FRACTION, GROUND_VS_LIMIT_FPM, GROUND_AGL_LIMIT_FT,
    RUNWAY_ROLL_LIMIT_DEG, RUNWAY_ALAT_LIMIT_G, CLOSURE_ALERT_MINUTES,
    TERRAIN_ESCALATION, TERRAIN_ESTIMATE_DEFAULT_FT, TERRAIN_ALERT_SUFFIX,
};

pub use display::{MAX_COLOR_DANGER_LEVEL, DEFAULT_ALPHA_STALL_DEG};
