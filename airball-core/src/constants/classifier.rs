//! Classifier Cut Points
//!
//! Each classifier input is a ratio (or an absolute value in the case of
//! height and roll) compared against fixed cut points. The resulting one-letter
//! codes index the danger table, so changing a cut point changes which table
//! row a flight condition lands on.

// ===== SLIP / SKID =====

/// Slip/skid ratio below which the ball is considered centered.
///
/// Ratio = |lateral acceleration| / max coordinated displacement.
/// A fifth of the way to the tube end is within normal pilot tolerance.
pub const SLIP_LOW_RATIO: f64 = 0.2;

/// Slip/skid ratio at or above which the aircraft is badly uncoordinated.
///
/// 70% of full ball deflection is well into cross-controlled territory,
/// which is what turns a stall into a spin.
pub const SLIP_HIGH_RATIO: f64 = 0.7;

/// Default lateral acceleration multiplier (1/g).
///
/// The ball reaches the end of the tube at 0.217 g, the deflection of a
/// standard inclinometer. Max coordinated displacement = 1 / multiplier.
pub const DEFAULT_ALAT_MULTIPLIER: f64 = 1.0 / 0.217;

// ===== HEIGHT ABOVE TERRAIN =====

/// Height above terrain (ft) above which there is room to recover.
///
/// 3000 ft AGL covers a full spin recovery in most light aircraft.
pub const HAT_HIGH_FT: f64 = 3000.0;

// ===== AIRSPEED =====

/// Airspeed margin ratio (IAS / Vs) above which speed is comfortable.
///
/// 1.2 Vs is the traditional minimum maneuvering margin.
pub const IAS_HIGH_RATIO: f64 = 1.2;

// ===== ANGLE OF ATTACK =====

/// AOA ratio (alpha / alpha_stall) below which the wing is lightly loaded.
pub const AOA_LOW_RATIO: f64 = 0.4;

/// AOA ratio at or above which the wing is close to the critical angle.
pub const AOA_HIGH_RATIO: f64 = 0.7;

// ===== ROLL =====

/// Bank angle (degrees) at or above which the turn is considered steep
/// for the purpose of stall/spin risk.
pub const ROLL_HIGH_DEG: f64 = 20.0;
