//! Danger Engine
//!
//! One synchronous pass per sensor update:
//!
//! ```text
//! snapshot ─► QualityGate ─┬─ Failed ──────────────────────────────► Failure
//!                          └─► Suppressor ─┬─ match ──────────────► (0, "")
//!                                          └─► Classifier ─► Table ─► Escalator ─► (danger, message)
//! ```
//!
//! The engine holds no mutable state. Everything it reads after
//! construction is immutable, so a single engine can be shared behind an
//! `Arc` and called from any thread.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::channel::{AuxLimits, ChannelId, SensorSnapshot};
use crate::classify::{Classifier, ClassifierThresholds, DangerKey};
use crate::constants::{DANGER_MAX, DANGER_MIN};
use crate::errors::{EngineError, EngineResult};
use crate::phase::{FlightPhaseSuppressor, Geolocation, Suppression, SuppressionConfig};
use crate::quality::{GateState, QualityGate};
use crate::table::DangerTable;
use crate::terrain::{TerrainConfig, TerrainEscalator};

/// Danger level and pilot message for one update
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DangerAssessment {
    /// Danger level in [0, 10]
    pub danger_level: f64,
    /// Pilot message, empty when there is nothing to say
    pub message: String,
}

impl DangerAssessment {
    /// Create an assessment
    pub fn new(danger_level: f64, message: impl Into<String>) -> Self {
        Self {
            danger_level,
            message: message.into(),
        }
    }

    /// `(0, "")`
    pub fn none() -> Self {
        Self::default()
    }
}

/// Where the pipeline stopped for an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// A gated channel failed; show the failure indicator
    Failed {
        /// First failed channel
        channel: ChannelId,
    },
    /// A benign flight phase matched
    Suppressed(Suppression),
    /// A numeric guard fired; danger defaults to 0
    Indeterminate,
    /// Table value used as-is
    LookedUp,
    /// Table value raised by terrain closure
    Escalated,
}

/// Result of one pass
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Where the pipeline stopped
    pub stage: Stage,
    /// Published danger and message (`(0, "")` unless looked up)
    pub assessment: DangerAssessment,
    /// Quality gate result
    pub gate: GateState,
    /// Table key, when classification ran
    pub key: Option<DangerKey>,
}

impl Outcome {
    fn early(stage: Stage, gate: GateState) -> Self {
        Self {
            stage,
            assessment: DangerAssessment::none(),
            gate,
            key: None,
        }
    }

    /// Whether the display should show the failure indicator
    pub fn is_failure(&self) -> bool {
        matches!(self.stage, Stage::Failed { .. })
    }

    /// The per-channel failure as an error value, if any
    pub fn quality_failure(&self) -> Option<EngineError> {
        match self.stage {
            Stage::Failed { channel } => Some(EngineError::SensorQualityFailure { channel }),
            _ => None,
        }
    }
}

/// The assessment pipeline
pub struct DangerEngine {
    table: Arc<DangerTable>,
    limits: AuxLimits,
    gate: QualityGate,
    suppressor: FlightPhaseSuppressor,
    classifier: Classifier,
    escalator: TerrainEscalator,
    geo: Box<dyn Geolocation + Send + Sync>,
}

impl fmt::Debug for DangerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DangerEngine")
            .field("columns", &self.table.columns())
            .field("rows", &self.table.len())
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl DangerEngine {
    /// Create an engine with default cut points and limits
    pub fn new(
        table: Arc<DangerTable>,
        limits: AuxLimits,
        geo: Box<dyn Geolocation + Send + Sync>,
    ) -> Self {
        Self {
            table,
            limits,
            gate: QualityGate::INSTRUMENT,
            suppressor: FlightPhaseSuppressor::new(limits, SuppressionConfig::default()),
            classifier: Classifier::new(limits, ClassifierThresholds::default()),
            escalator: TerrainEscalator::default(),
            geo,
        }
    }

    /// Replace the classifier cut points
    pub fn with_thresholds(mut self, thresholds: ClassifierThresholds) -> Self {
        self.classifier = Classifier::new(self.limits, thresholds);
        self
    }

    /// Replace the suppressor limits
    pub fn with_suppression(mut self, config: SuppressionConfig) -> Self {
        self.suppressor = FlightPhaseSuppressor::new(self.limits, config);
        self
    }

    /// Replace the terrain escalator limits
    pub fn with_terrain(mut self, config: TerrainConfig) -> Self {
        self.escalator = TerrainEscalator::new(config);
        self
    }

    /// Danger table in use
    pub fn table(&self) -> &DangerTable {
        &self.table
    }

    /// Airframe limits in use
    pub fn limits(&self) -> &AuxLimits {
        &self.limits
    }

    /// Run the pipeline on one snapshot
    ///
    /// Only fatal table errors are returned as `Err`. A failed channel,
    /// a suppression or a numeric guard all produce an `Ok` outcome.
    pub fn assess(&self, snapshot: &SensorSnapshot) -> EngineResult<Outcome> {
        let gate = self.gate.check(snapshot);
        if let GateState::Failed { channel } = gate {
            log_debug!("Quality failure on {}, showing failure indicator", channel);
            return Ok(Outcome::early(Stage::Failed { channel }, gate));
        }

        let geo: &dyn Geolocation = self.geo.as_ref();
        let height = self.escalator.height_above_terrain(&snapshot.agl, geo);

        if let Some(suppression) = self.suppressor.check(snapshot, height, geo) {
            return Ok(Outcome::early(Stage::Suppressed(suppression), gate));
        }

        let key = match self
            .classifier
            .classify(snapshot, height)
            .and_then(|c| c.key(self.table.columns()))
        {
            Ok(key) => key,
            Err(EngineError::InvalidInput { reason }) => {
                log_warn!("No danger assessment possible: {}", reason);
                return Ok(Outcome::early(Stage::Indeterminate, gate));
            }
            Err(e) => return Err(e),
        };

        let entry = self.table.lookup(&key).map_err(|e| {
            log_error!("Danger table lookup failed: {}", e);
            e
        })?;

        let mut assessment = DangerAssessment::new(entry.danger, entry.message);
        let escalated = self
            .escalator
            .escalate(&mut assessment, height, &snapshot.vs, geo);
        assessment.danger_level = assessment.danger_level.clamp(DANGER_MIN, DANGER_MAX);

        Ok(Outcome {
            stage: if escalated { Stage::Escalated } else { Stage::LookedUp },
            assessment,
            gate,
            key: Some(key),
        })
    }
}
