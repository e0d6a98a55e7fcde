//! Flight-Phase Suppressor
//!
//! Some flight phases are benign by definition and would otherwise light the
//! instrument up: taxiing, sitting on the ramp, rolling down the runway. When
//! one of them is detected the engine publishes `(0, "")` and skips the rest
//! of the pipeline.
//!
//! Conditions, evaluated in order:
//! 1. Not flying: IAS < 0.2 Vs0 and |VS| < 20 ft/min
//! 2. On the ground near an airport: |VS| < 20 ft/min, in airport vicinity,
//!    height above terrain < 200 ft
//! 3. Runway overflight: |roll| < 5° over a runway (optionally also
//!    |alat| < 0.05 g, see [`RunwayPolicy`])
//! 4. Normal cruise (opt-in): IAS ≥ Vx and AOA < alpha_x
//!
//! Only good readings take part. A failed VS is never "level".

use libm::fabs;

use crate::channel::{AuxLimits, SensorSnapshot};
use crate::constants::{
    GROUND_AGL_LIMIT_FT, GROUND_VS_LIMIT_FPM, NOT_FLYING_VS0_FRACTION, RUNWAY_ALAT_LIMIT_G,
    RUNWAY_ROLL_LIMIT_DEG,
};

/// Position-derived predicates supplied by a geolocation collaborator
///
/// How "near an airport" or "over a runway" is decided is up to the
/// implementation. The engine only consumes the answers.
pub trait Geolocation {
    /// Whether the aircraft is within the vicinity of an airport
    fn in_airport_vicinity(&self) -> bool;

    /// Whether the aircraft is directly over a runway
    fn is_over_runway(&self) -> bool;

    /// Height above terrain (ft) from a terrain database, if known
    fn terrain_agl_estimate(&self) -> Option<f64> {
        None
    }
}

/// Geolocation that knows nothing: never near an airport, no terrain data
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

impl Geolocation for NoGeolocation {
    fn in_airport_vicinity(&self) -> bool {
        false
    }

    fn is_over_runway(&self) -> bool {
        false
    }
}

/// Which signals qualify a runway overflight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunwayPolicy {
    /// Wings level over a runway
    #[default]
    RollOnly,
    /// Wings level and ball centered over a runway
    RollAndLateral,
}

/// Why an update was suppressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    /// Too slow and level to be airborne
    NotFlying,
    /// Level, low and near an airport
    OnGroundNearAirport,
    /// Wings level over a runway
    RunwayOverflight,
    /// Comfortable speed and low AOA
    NormalCruise,
}

/// Suppressor limits
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct SuppressionConfig {
    /// Runway overflight policy
    pub runway_policy: RunwayPolicy,
    /// Enable the normal-cruise rule
    pub suppress_normal_cruise: bool,
    /// Fraction of Vs0 below which the aircraft is not flying
    pub not_flying_vs0_fraction: f64,
    /// |VS| (ft/min) treated as level
    pub ground_vs_limit_fpm: f64,
    /// Height (ft) below which an aircraft near an airport is on the ground
    pub ground_agl_limit_ft: f64,
    /// |roll| (deg) accepted as wings level over a runway
    pub runway_roll_limit_deg: f64,
    /// |alat| (g) accepted as coordinated over a runway
    pub runway_alat_limit_g: f64,
}

impl Default for SuppressionConfig {
    fn default() -> Self {
        Self {
            runway_policy: RunwayPolicy::RollOnly,
            suppress_normal_cruise: false,
            not_flying_vs0_fraction: NOT_FLYING_VS0_FRACTION,
            ground_vs_limit_fpm: GROUND_VS_LIMIT_FPM,
            ground_agl_limit_ft: GROUND_AGL_LIMIT_FT,
            runway_roll_limit_deg: RUNWAY_ROLL_LIMIT_DEG,
            runway_alat_limit_g: RUNWAY_ALAT_LIMIT_G,
        }
    }
}

/// Detects benign flight phases
#[derive(Debug, Clone, Copy)]
pub struct FlightPhaseSuppressor {
    config: SuppressionConfig,
    limits: AuxLimits,
}

impl FlightPhaseSuppressor {
    /// Create a suppressor
    pub fn new(limits: AuxLimits, config: SuppressionConfig) -> Self {
        Self { config, limits }
    }

    /// Limits in use
    pub fn config(&self) -> &SuppressionConfig {
        &self.config
    }

    /// First matching suppression, if any
    ///
    /// A rule only matches on good, finite inputs. Old, bad or failed
    /// readings never suppress.
    pub fn check(
        &self,
        snapshot: &SensorSnapshot,
        height_above_terrain: f64,
        geo: &dyn Geolocation,
    ) -> Option<Suppression> {
        let c = &self.config;
        let ias = snapshot.ias.usable();
        let level = match snapshot.vs.usable() {
            Some(vs) => fabs(vs) < c.ground_vs_limit_fpm,
            None => {
                log_debug!("VS quality {:?}, ground rules skipped", snapshot.vs.quality);
                false
            }
        };

        if let (Some(vs0), Some(ias)) = (self.limits.vs0(), ias) {
            if level && ias < c.not_flying_vs0_fraction * vs0 {
                return Some(Suppression::NotFlying);
            }
        }

        if level && height_above_terrain < c.ground_agl_limit_ft && geo.in_airport_vicinity() {
            return Some(Suppression::OnGroundNearAirport);
        }

        let wings_level = snapshot
            .roll
            .usable()
            .is_some_and(|roll| fabs(roll) < c.runway_roll_limit_deg);
        let coordinated = match c.runway_policy {
            RunwayPolicy::RollOnly => true,
            RunwayPolicy::RollAndLateral => snapshot
                .alat
                .usable()
                .is_some_and(|alat| fabs(alat) < c.runway_alat_limit_g),
        };
        if wings_level && coordinated && geo.is_over_runway() {
            return Some(Suppression::RunwayOverflight);
        }

        if c.suppress_normal_cruise {
            if let (Some(vx), Some(ias), Some(aoa)) = (self.limits.vx(), ias, snapshot.aoa.usable()) {
                if ias >= vx && aoa < self.limits.alpha_x {
                    return Some(Suppression::NormalCruise);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Reading;
    use crate::quality::Quality;

    struct Airport {
        vicinity: bool,
        runway: bool,
    }

    impl Geolocation for Airport {
        fn in_airport_vicinity(&self) -> bool {
            self.vicinity
        }
        fn is_over_runway(&self) -> bool {
            self.runway
        }
    }

    fn suppressor(config: SuppressionConfig) -> FlightPhaseSuppressor {
        FlightPhaseSuppressor::new(AuxLimits::with_alpha_stall(15.0).stall_speeds(60.0, Some(50.0)), config)
    }

    fn cruising() -> SensorSnapshot {
        SensorSnapshot {
            ias: Reading::good(90.0),
            aoa: Reading::good(5.0),
            alat: Reading::good(0.01),
            agl: Reading::good(5000.0),
            roll: Reading::good(2.0),
            vs: Reading::good(0.0),
        }
    }

    #[test]
    fn cruise_not_suppressed_by_default() {
        let s = suppressor(SuppressionConfig::default());
        assert_eq!(s.check(&cruising(), 5000.0, &NoGeolocation), None);
    }

    #[test]
    fn taxi_is_not_flying() {
        let s = suppressor(SuppressionConfig::default());
        let mut snap = cruising();
        snap.ias = Reading::good(9.0); // < 0.2 * 50
        assert_eq!(s.check(&snap, 5000.0, &NoGeolocation), Some(Suppression::NotFlying));

        snap.vs = Reading::good(-300.0);
        assert_eq!(s.check(&snap, 5000.0, &NoGeolocation), None);
    }

    #[test]
    fn ground_near_airport() {
        let s = suppressor(SuppressionConfig::default());
        let geo = Airport { vicinity: true, runway: false };
        assert_eq!(s.check(&cruising(), 150.0, &geo), Some(Suppression::OnGroundNearAirport));
        assert_eq!(s.check(&cruising(), 250.0, &geo), None);
        assert_eq!(s.check(&cruising(), 150.0, &NoGeolocation), None);
    }

    #[test]
    fn runway_policies() {
        let geo = Airport { vicinity: false, runway: true };
        let mut snap = cruising();
        snap.alat = Reading::good(0.1);

        let roll_only = suppressor(SuppressionConfig::default());
        assert_eq!(roll_only.check(&snap, 5000.0, &geo), Some(Suppression::RunwayOverflight));

        let strict = suppressor(SuppressionConfig {
            runway_policy: RunwayPolicy::RollAndLateral,
            ..SuppressionConfig::default()
        });
        assert_eq!(strict.check(&snap, 5000.0, &geo), None);

        snap.roll = Reading::good(-8.0);
        assert_eq!(roll_only.check(&snap, 5000.0, &geo), None);
    }

    #[test]
    fn unusable_vs_never_looks_level() {
        let s = suppressor(SuppressionConfig::default());
        let geo = Airport { vicinity: true, runway: false };
        let mut snap = cruising();
        snap.ias = Reading::good(9.0);
        for quality in [Quality::Old, Quality::Bad, Quality::Failed] {
            snap.vs = Reading::new(0.0, quality);
            assert_eq!(s.check(&snap, 100.0, &geo), None, "{:?}", quality);
        }
        snap.vs = Reading::good(f64::NAN);
        assert_eq!(s.check(&snap, 100.0, &geo), None);
    }

    #[test]
    fn unusable_roll_is_not_wings_level() {
        let geo = Airport { vicinity: false, runway: true };
        let roll_only = suppressor(SuppressionConfig::default());
        let mut snap = cruising();
        snap.roll = Reading::new(0.0, Quality::Old);
        assert_eq!(roll_only.check(&snap, 5000.0, &geo), None);
        snap.roll = Reading::new(0.0, Quality::Failed);
        assert_eq!(roll_only.check(&snap, 5000.0, &geo), None);

        let strict = suppressor(SuppressionConfig {
            runway_policy: RunwayPolicy::RollAndLateral,
            ..SuppressionConfig::default()
        });
        let mut snap = cruising();
        snap.alat = Reading::new(0.0, Quality::Bad);
        assert_eq!(strict.check(&snap, 5000.0, &geo), None);
    }

    #[test]
    fn unusable_airspeed_is_not_taxiing() {
        let s = suppressor(SuppressionConfig::default());
        let mut snap = cruising();
        snap.ias = Reading::new(0.0, Quality::Failed);
        assert_eq!(s.check(&snap, 5000.0, &NoGeolocation), None);
    }

    #[test]
    fn cruise_rule_is_opt_in() {
        let s = suppressor(SuppressionConfig {
            suppress_normal_cruise: true,
            ..SuppressionConfig::default()
        });
        assert_eq!(s.check(&cruising(), 5000.0, &NoGeolocation), Some(Suppression::NormalCruise));

        let mut slow = cruising();
        slow.ias = Reading::good(70.0); // below Vx = 72
        assert_eq!(s.check(&slow, 5000.0, &NoGeolocation), None);
    }

    #[test]
    fn unconfigured_vs_skips_speed_rules() {
        let s = FlightPhaseSuppressor::new(AuxLimits::default(), SuppressionConfig::default());
        let mut snap = cruising();
        snap.ias = Reading::good(0.0);
        assert_eq!(s.check(&snap, 5000.0, &NoGeolocation), None);
    }
}
