//! Terrain-Closure Escalator
//!
//! Descending toward terrain away from an airport raises the danger level by
//! a fixed step and tags the message, whatever the table said. Closure time
//! is height above terrain divided by descent rate, in minutes.

use libm::fmin;

use crate::channel::Reading;
use crate::constants::{
    CLOSURE_ALERT_MINUTES, DANGER_MAX, TERRAIN_ALERT_SUFFIX, TERRAIN_ESCALATION,
    TERRAIN_ESTIMATE_DEFAULT_FT,
};
use crate::engine::DangerAssessment;
use crate::phase::Geolocation;

/// Escalator limits
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct TerrainConfig {
    /// Closure time (min) below which terrain is imminent
    pub closure_minutes: f64,
    /// Danger points added on escalation
    pub escalation: f64,
    /// Height above terrain (ft) used when nothing better is known
    pub terrain_estimate_default: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            closure_minutes: CLOSURE_ALERT_MINUTES,
            escalation: TERRAIN_ESCALATION,
            terrain_estimate_default: TERRAIN_ESTIMATE_DEFAULT_FT,
        }
    }
}

/// Raises danger on imminent terrain closure
#[derive(Debug, Clone, Copy, Default)]
pub struct TerrainEscalator {
    config: TerrainConfig,
}

impl TerrainEscalator {
    /// Create an escalator
    pub fn new(config: TerrainConfig) -> Self {
        Self { config }
    }

    /// Limits in use
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Height above terrain: the AGL sensor when good, else the terrain
    /// estimate, else the configured default
    pub fn height_above_terrain(&self, agl: &Reading, geo: &dyn Geolocation) -> f64 {
        agl.usable()
            .or_else(|| geo.terrain_agl_estimate().filter(|h| h.is_finite()))
            .unwrap_or(self.config.terrain_estimate_default)
    }

    /// Minutes to terrain contact, only while descending
    pub fn closure_minutes(height_ft: f64, vs_fpm: f64) -> Option<f64> {
        if vs_fpm < 0.0 && height_ft.is_finite() {
            Some(height_ft / -vs_fpm)
        } else {
            None
        }
    }

    /// Escalate in place; returns whether it fired
    ///
    /// A vertical speed that is not good never escalates.
    pub fn escalate(
        &self,
        assessment: &mut DangerAssessment,
        height_ft: f64,
        vs: &Reading,
        geo: &dyn Geolocation,
    ) -> bool {
        let Some(vs_fpm) = vs.usable() else {
            log_debug!("VS quality {:?}, terrain closure not evaluated", vs.quality);
            return false;
        };
        let imminent = Self::closure_minutes(height_ft, vs_fpm)
            .map_or(false, |t| t < self.config.closure_minutes);
        if !imminent || geo.in_airport_vicinity() {
            return false;
        }

        assessment.danger_level = fmin(DANGER_MAX, assessment.danger_level + self.config.escalation);
        assessment.message.push_str(TERRAIN_ALERT_SUFFIX);
        log_debug!(
            "Terrain closure {:.2} min, danger escalated to {:.1}",
            height_ft / -vs_fpm,
            assessment.danger_level
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::NoGeolocation;
    use crate::quality::Quality;

    struct Terrain(Option<f64>, bool);

    impl Geolocation for Terrain {
        fn in_airport_vicinity(&self) -> bool {
            self.1
        }
        fn is_over_runway(&self) -> bool {
            false
        }
        fn terrain_agl_estimate(&self) -> Option<f64> {
            self.0
        }
    }

    #[test]
    fn closure_only_when_descending() {
        assert_eq!(TerrainEscalator::closure_minutes(1500.0, -2000.0), Some(0.75));
        assert_eq!(TerrainEscalator::closure_minutes(1500.0, 0.0), None);
        assert_eq!(TerrainEscalator::closure_minutes(1500.0, 500.0), None);
    }

    #[test]
    fn escalates_and_tags() {
        let esc = TerrainEscalator::default();
        let mut a = DangerAssessment::new(3.0, "Low and slow");
        assert!(esc.escalate(&mut a, 1500.0, &Reading::good(-2000.0), &NoGeolocation));
        assert_eq!(a.danger_level, 8.0);
        assert_eq!(a.message, "Low and slow Terrain Alert!");
    }

    #[test]
    fn escalation_saturates() {
        let esc = TerrainEscalator::default();
        let mut a = DangerAssessment::new(7.5, "");
        esc.escalate(&mut a, 100.0, &Reading::good(-1000.0), &NoGeolocation);
        assert_eq!(a.danger_level, 10.0);
    }

    #[test]
    fn no_escalation_near_airport_or_slow_closure() {
        let esc = TerrainEscalator::default();
        let mut a = DangerAssessment::new(2.0, "");
        assert!(!esc.escalate(&mut a, 1500.0, &Reading::good(-2000.0), &Terrain(None, true)));
        assert!(!esc.escalate(&mut a, 3000.0, &Reading::good(-2000.0), &NoGeolocation));
        assert_eq!(a, DangerAssessment::new(2.0, ""));
    }

    #[test]
    fn unusable_vs_never_escalates() {
        let esc = TerrainEscalator::default();
        let mut a = DangerAssessment::new(2.0, "");
        for quality in [Quality::Old, Quality::Bad, Quality::Failed] {
            let vs = Reading::new(-2000.0, quality);
            assert!(!esc.escalate(&mut a, 1500.0, &vs, &NoGeolocation));
        }
        assert!(!esc.escalate(&mut a, 1500.0, &Reading::good(f64::NAN), &NoGeolocation));
        assert_eq!(a, DangerAssessment::new(2.0, ""));
    }

    #[test]
    fn height_fallbacks() {
        let esc = TerrainEscalator::default();
        let good = Reading::good(1200.0);
        let stale = Reading::new(1200.0, Quality::Old);

        assert_eq!(esc.height_above_terrain(&good, &NoGeolocation), 1200.0);
        assert_eq!(esc.height_above_terrain(&stale, &Terrain(Some(800.0), false)), 800.0);
        assert_eq!(esc.height_above_terrain(&stale, &NoGeolocation), 10000.0);
        assert_eq!(esc.height_above_terrain(&stale, &Terrain(Some(f64::NAN), false)), 10000.0);
    }
}
