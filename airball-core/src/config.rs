//! Engine configuration
//!
//! Every field is optional in the JSON document and has a documented
//! default. The config is validated once at load; after that the engine
//! never re-checks it.
//!
//! ```json
//! {
//!   "table_path": "/etc/airball/danger.csv",
//!   "aux": { "vs": 52.0, "vs0": 45.0, "alpha_stall": 15.0 },
//!   "alat_filter_depth": 8,
//!   "ball_color_danger": "#ff2020",
//!   "suppression": { "runway_policy": "roll_and_lateral" }
//! }
//! ```

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::boxed::Box;

use crate::channel::AuxLimits;
use crate::classify::ClassifierThresholds;
use crate::constants::{DEFAULT_ALAT_MULTIPLIER, DEFAULT_ALPHA_STALL_DEG, MAX_COLOR_DANGER_LEVEL};
use crate::constants::display::ALPHA_MAX_STALL_RATIO;
use crate::constants::flight::ALPHA_X_STALL_FRACTION;
use crate::engine::DangerEngine;
use crate::errors::{EngineError, EngineResult};
use crate::filter::{MovingAverage, MAX_FILTER_DEPTH};
use crate::phase::{Geolocation, SuppressionConfig};
use crate::presentation::{ColorPolicy, Presentation, Rgb};
use crate::table::DangerTable;
use crate::terrain::TerrainConfig;

/// Airframe reference values; absent ones are derived
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct AuxConfig {
    /// Clean stall speed (kt)
    pub vs: Option<f64>,
    /// Landing-configuration stall speed (kt), defaults to `vs`
    pub vs0: Option<f64>,
    /// Best angle of climb speed (kt), defaults to 1.2 `vs`
    pub vx: Option<f64>,
    /// Critical AOA (deg), defaults to 10
    pub alpha_stall: Option<f64>,
    /// Top of the AOA scale (deg), defaults to 1.3 `alpha_stall`
    pub alpha_max: Option<f64>,
    /// Bottom of the AOA scale (deg), defaults to `-alpha_max`
    pub alpha_min: Option<f64>,
    /// Best angle of climb AOA (deg), defaults to 0.75 `alpha_stall`
    pub alpha_x: Option<f64>,
    /// Ball deflection per g; values `<= 0` keep the default `1 / 0.217`
    pub alat_multiplier: Option<f64>,
}

impl AuxConfig {
    /// Resolve defaults and check domains
    pub fn limits(&self) -> EngineResult<AuxLimits> {
        for (field, value) in [("aux.vs", self.vs), ("aux.vs0", self.vs0), ("aux.vx", self.vx)] {
            if let Some(v) = value {
                non_negative(field, v)?;
            }
        }

        let alpha_stall = self.alpha_stall.unwrap_or(DEFAULT_ALPHA_STALL_DEG);
        non_negative("aux.alpha_stall", alpha_stall)?;
        let alpha_max = self.alpha_max.unwrap_or(alpha_stall * ALPHA_MAX_STALL_RATIO);
        let alpha_min = self.alpha_min.unwrap_or(-alpha_max);
        let alpha_x = self.alpha_x.unwrap_or(alpha_stall * ALPHA_X_STALL_FRACTION);
        if !(alpha_max.is_finite() && alpha_min.is_finite() && alpha_max > alpha_min) {
            return Err(EngineError::InvalidConfig {
                field: "aux.alpha_max",
                reason: format!("alpha_max {} must exceed alpha_min {}", alpha_max, alpha_min),
            });
        }

        let alat_multiplier = match self.alat_multiplier {
            Some(m) if m.is_finite() && m > 0.0 => m,
            Some(m) => {
                log_warn!("Ignoring alat_multiplier {}, using the default", m);
                DEFAULT_ALAT_MULTIPLIER
            }
            None => DEFAULT_ALAT_MULTIPLIER,
        };

        Ok(AuxLimits {
            vs: self.vs,
            vs0: self.vs0,
            vx: self.vx,
            alpha_stall,
            alpha_max,
            alpha_min,
            alpha_x,
            alat_multiplier,
        })
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct AirballConfig {
    /// Danger table CSV; absent disables the engine
    pub table_path: Option<String>,
    /// Airframe reference values
    pub aux: AuxConfig,
    /// Lateral acceleration moving-average depth, 0 disables
    pub alat_filter_depth: usize,
    /// Danger level that reaches the full danger color
    pub max_color_danger_level: f64,
    /// Ball color at danger 0
    pub ball_color_safe: Rgb,
    /// Ball color at `max_color_danger_level`
    pub ball_color_danger: Rgb,
    /// Ball color while degraded
    pub ball_color_degraded: Rgb,
    /// Classifier cut points
    pub thresholds: ClassifierThresholds,
    /// Flight-phase suppression limits
    pub suppression: SuppressionConfig,
    /// Terrain escalation limits
    pub terrain: TerrainConfig,
}

impl Default for AirballConfig {
    fn default() -> Self {
        Self {
            table_path: None,
            aux: AuxConfig::default(),
            alat_filter_depth: 0,
            max_color_danger_level: MAX_COLOR_DANGER_LEVEL,
            ball_color_safe: Rgb::GREEN,
            ball_color_danger: Rgb::RED,
            ball_color_degraded: Rgb::GRAY,
            thresholds: ClassifierThresholds::default(),
            suppression: SuppressionConfig::default(),
            terrain: TerrainConfig::default(),
        }
    }
}

impl AirballConfig {
    /// Parse and validate a JSON document
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig {
            field: "config",
            reason: format!("{}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    #[cfg(feature = "std")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Check every value against its domain
    pub fn validate(&self) -> EngineResult<()> {
        self.aux.limits()?;

        if !(self.max_color_danger_level.is_finite() && self.max_color_danger_level > 0.0) {
            return Err(EngineError::InvalidConfig {
                field: "max_color_danger_level",
                reason: format!("{} is not positive", self.max_color_danger_level),
            });
        }
        if self.alat_filter_depth > MAX_FILTER_DEPTH {
            return Err(EngineError::InvalidConfig {
                field: "alat_filter_depth",
                reason: format!("{} exceeds {}", self.alat_filter_depth, MAX_FILTER_DEPTH),
            });
        }

        let t = &self.thresholds;
        if !(t.slip_low <= t.slip_high) {
            return Err(EngineError::InvalidConfig {
                field: "thresholds.slip_low",
                reason: format!("slip_low {} above slip_high {}", t.slip_low, t.slip_high),
            });
        }
        if !(t.aoa_low <= t.aoa_high) {
            return Err(EngineError::InvalidConfig {
                field: "thresholds.aoa_low",
                reason: format!("aoa_low {} above aoa_high {}", t.aoa_low, t.aoa_high),
            });
        }

        let terrain = &self.terrain;
        if !(terrain.escalation.is_finite() && terrain.escalation >= 0.0) {
            return Err(EngineError::InvalidConfig {
                field: "terrain.escalation",
                reason: format!("{} would lower the danger level", terrain.escalation),
            });
        }
        Ok(())
    }

    /// Resolved airframe limits
    pub fn limits(&self) -> EngineResult<AuxLimits> {
        self.aux.limits()
    }

    /// Color mapping from the configured colors
    pub fn color_policy(&self) -> ColorPolicy {
        ColorPolicy {
            safe: self.ball_color_safe,
            danger: self.ball_color_danger,
            neutral: self.ball_color_degraded,
            max_color_danger_level: self.max_color_danger_level,
        }
    }

    /// Presentation mapper for this airframe
    pub fn presentation(&self) -> EngineResult<Presentation> {
        Ok(Presentation::new(self.color_policy(), self.limits()?))
    }

    /// Lateral acceleration filter
    pub fn alat_filter(&self) -> MovingAverage {
        MovingAverage::new(self.alat_filter_depth)
    }

    /// Engine over an already loaded table
    pub fn engine_with_table(
        &self,
        table: Arc<DangerTable>,
        geo: Box<dyn Geolocation + Send + Sync>,
    ) -> EngineResult<DangerEngine> {
        Ok(DangerEngine::new(table, self.limits()?, geo)
            .with_thresholds(self.thresholds)
            .with_suppression(self.suppression)
            .with_terrain(self.terrain))
    }

    /// Configured danger table path
    pub fn table_path(&self) -> EngineResult<&str> {
        self.table_path
            .as_deref()
            .ok_or(EngineError::ConfigurationMissing { field: "table_path" })
    }

    /// Load the configured table and build the engine
    ///
    /// `Ok(None)` when no table is configured: danger is then never assessed
    /// and alarms never fire.
    #[cfg(feature = "std")]
    pub fn build_engine(
        &self,
        geo: Box<dyn Geolocation + Send + Sync>,
    ) -> EngineResult<Option<DangerEngine>> {
        match self.table_path() {
            Ok(_) => self.require_engine(geo).map(Some),
            Err(e) => {
                log_warn!("{}, danger assessment disabled", e);
                Ok(None)
            }
        }
    }

    /// Like [`AirballConfig::build_engine`], but a missing table path is an error
    #[cfg(feature = "std")]
    pub fn require_engine(
        &self,
        geo: Box<dyn Geolocation + Send + Sync>,
    ) -> EngineResult<DangerEngine> {
        let path = self.table_path()?;
        let table = DangerTable::load(path).map_err(|e| {
            log_error!("Cannot load danger table {}: {}", path, e);
            e
        })?;
        self.engine_with_table(Arc::new(table), geo)
    }
}

fn non_negative(field: &'static str, v: f64) -> EngineResult<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidConfig {
            field,
            reason: format!("{} must be a non-negative number", v),
        })
    }
}
