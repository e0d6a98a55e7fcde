//! Categorical Classifier
//!
//! Turns the continuous flight state into one-letter codes, one per danger
//! table column, and concatenates them into a [`DangerKey`].
//!
//! | Category  | Input                          | Codes                         |
//! |-----------|--------------------------------|-------------------------------|
//! | slip/skid | \|alat\| / max displacement    | L < 0.2 ≤ M < 0.7 ≤ H         |
//! | HAT       | height above terrain (ft)      | H > 3000, else L              |
//! | IAS       | IAS / Vs                       | H > 1.2, else L               |
//! | AOA       | alpha / alpha_stall            | L < 0.4 ≤ M < 0.7 ≤ H         |
//! | roll      | \|roll\| (deg)                 | H ≥ 20, else L                |
//!
//! Column order is whatever the danger table header declares; the
//! classifier itself does not care.

use core::cmp::Ordering;
use core::fmt;

use libm::fabs;

use crate::channel::{AuxLimits, SensorSnapshot};
use crate::constants::{
    AOA_HIGH_RATIO, AOA_LOW_RATIO, HAT_HIGH_FT, IAS_HIGH_RATIO, ROLL_HIGH_DEG, SLIP_HIGH_RATIO,
    SLIP_LOW_RATIO,
};
use crate::errors::{EngineError, EngineResult};

/// Longest key a table may declare
pub const MAX_KEY_LEN: usize = 8;

/// Discrete level of one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// `L`
    Low,
    /// `M`
    Medium,
    /// `H`
    High,
}

impl Level {
    /// One-letter code
    pub const fn code(&self) -> char {
        match self {
            Level::Low => 'L',
            Level::Medium => 'M',
            Level::High => 'H',
        }
    }

    /// Parse a one-letter code (case-insensitive)
    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'L' => Some(Level::Low),
            'M' => Some(Level::Medium),
            'H' => Some(Level::High),
            _ => None,
        }
    }
}

/// Classifier input category, i.e. one danger table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Lateral acceleration ratio
    SlipSkid,
    /// Height above terrain
    Hat,
    /// Airspeed margin
    Ias,
    /// Angle of attack margin
    Aoa,
    /// Bank angle
    Roll,
}

impl Category {
    /// Every category
    pub const ALL: [Category; 5] = [
        Category::SlipSkid,
        Category::Hat,
        Category::Ias,
        Category::Aoa,
        Category::Roll,
    ];

    /// Canonical column name
    pub const fn name(&self) -> &'static str {
        match self {
            Category::SlipSkid => "slip_skid",
            Category::Hat => "hat",
            Category::Ias => "ias",
            Category::Aoa => "aoa",
            Category::Roll => "roll",
        }
    }

    /// Levels the classifier can emit for this category
    pub const fn possible_levels(&self) -> &'static [Level] {
        match self {
            Category::SlipSkid | Category::Aoa => &[Level::Low, Level::Medium, Level::High],
            Category::Hat | Category::Ias | Category::Roll => &[Level::Low, Level::High],
        }
    }

    /// Match a table header name
    ///
    /// Case is ignored, as are `_`, `-` and spaces.
    pub fn from_header(name: &str) -> Option<Self> {
        let mut norm: heapless::String<32> = heapless::String::new();
        for c in name.chars().filter(|c| !matches!(c, '_' | '-' | ' ')) {
            norm.push(c.to_ascii_lowercase()).ok()?;
        }
        match norm.as_str() {
            "slipskid" | "slip" | "skid" | "ball" => Some(Category::SlipSkid),
            "hat" | "agl" | "heightaboveterrain" => Some(Category::Hat),
            "ias" | "airspeed" => Some(Category::Ias),
            "aoa" | "alpha" => Some(Category::Aoa),
            "roll" | "bank" => Some(Category::Roll),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Danger table key: one code per column, in header order
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct DangerKey(heapless::String<MAX_KEY_LEN>);

impl DangerKey {
    /// Empty key
    pub fn new() -> Self {
        Self(heapless::String::new())
    }

    /// Parse a key made only of `L`, `M` and `H`
    pub fn parse(s: &str) -> Option<Self> {
        let mut key = Self::new();
        for c in s.chars() {
            key.push(Level::from_code(c)?).ok()?;
        }
        Some(key)
    }

    /// Append a level
    pub fn push(&mut self, level: Level) -> EngineResult<()> {
        self.0.push(level.code()).map_err(|_| EngineError::InvalidInput {
            reason: "danger key longer than supported",
        })
    }

    /// Key text
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Number of codes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has no codes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Codes in order
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.0.chars().filter_map(Level::from_code)
    }

    /// Position of the first `M`, if any
    pub fn first_medium(&self) -> Option<usize> {
        self.0.find('M')
    }

    /// Copy of this key with the code at `index` replaced
    pub fn with_level(&self, index: usize, level: Level) -> Self {
        let mut out = Self::new();
        for (i, l) in self.levels().enumerate() {
            let l = if i == index { level } else { l };
            // Same length as self, so capacity is never exceeded
            let _ = out.0.push(l.code());
        }
        out
    }
}

impl PartialOrd for DangerKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DangerKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl fmt::Debug for DangerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DangerKey({})", self.as_str())
    }
}

impl fmt::Display for DangerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier cut points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ClassifierThresholds {
    /// Slip ratio below which the code is `L`
    pub slip_low: f64,
    /// Slip ratio at or above which the code is `H`
    pub slip_high: f64,
    /// Height above terrain (ft) above which the code is `H`
    pub hat_high_ft: f64,
    /// IAS / Vs above which the code is `H`
    pub ias_high: f64,
    /// AOA ratio below which the code is `L`
    pub aoa_low: f64,
    /// AOA ratio at or above which the code is `H`
    pub aoa_high: f64,
    /// Bank (deg) at or above which the code is `H`
    pub roll_high_deg: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            slip_low: SLIP_LOW_RATIO,
            slip_high: SLIP_HIGH_RATIO,
            hat_high_ft: HAT_HIGH_FT,
            ias_high: IAS_HIGH_RATIO,
            aoa_low: AOA_LOW_RATIO,
            aoa_high: AOA_HIGH_RATIO,
            roll_high_deg: ROLL_HIGH_DEG,
        }
    }
}

/// Codes for every category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Slip/skid code
    pub slip_skid: Level,
    /// Height above terrain code
    pub hat: Level,
    /// Airspeed code
    pub ias: Level,
    /// AOA code
    pub aoa: Level,
    /// Roll code
    pub roll: Level,
}

impl Classification {
    /// Code for one category
    pub fn level(&self, category: Category) -> Level {
        match category {
            Category::SlipSkid => self.slip_skid,
            Category::Hat => self.hat,
            Category::Ias => self.ias,
            Category::Aoa => self.aoa,
            Category::Roll => self.roll,
        }
    }

    /// Build the key for a column order
    pub fn key(&self, columns: &[Category]) -> EngineResult<DangerKey> {
        let mut key = DangerKey::new();
        for &c in columns {
            key.push(self.level(c))?;
        }
        Ok(key)
    }
}

/// Maps flight state to categorical codes
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    thresholds: ClassifierThresholds,
    limits: AuxLimits,
}

impl Classifier {
    /// Create a classifier for one airframe
    pub fn new(limits: AuxLimits, thresholds: ClassifierThresholds) -> Self {
        Self { thresholds, limits }
    }

    /// Cut points in use
    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classify a snapshot
    ///
    /// `height_above_terrain` is the AGL reading or its substitute; the
    /// caller decides which.
    pub fn classify(
        &self,
        snapshot: &SensorSnapshot,
        height_above_terrain: f64,
    ) -> EngineResult<Classification> {
        Ok(Classification {
            slip_skid: self.slip_skid(snapshot.alat.value)?,
            hat: self.hat(height_above_terrain)?,
            ias: self.ias(snapshot.ias.value)?,
            aoa: self.aoa(snapshot.aoa.value)?,
            roll: self.roll(snapshot.roll.value)?,
        })
    }

    /// Slip/skid code from lateral acceleration (g)
    pub fn slip_skid(&self, alat: f64) -> EngineResult<Level> {
        let max_disp = self.limits.max_coordinated_displacement();
        if !(max_disp.is_finite() && max_disp > 0.0) {
            return Err(EngineError::InvalidInput {
                reason: "max coordinated displacement is not positive",
            });
        }
        let ratio = fabs(finite(alat, "lateral acceleration is not finite")?) / max_disp;
        Ok(three_way(ratio, self.thresholds.slip_low, self.thresholds.slip_high))
    }

    /// Height above terrain code (ft)
    pub fn hat(&self, height_ft: f64) -> EngineResult<Level> {
        let h = finite(height_ft, "height above terrain is not finite")?;
        Ok(if h > self.thresholds.hat_high_ft { Level::High } else { Level::Low })
    }

    /// Airspeed margin code (kt)
    pub fn ias(&self, ias: f64) -> EngineResult<Level> {
        let vs = match self.limits.vs {
            Some(vs) if vs > 0.0 => vs,
            Some(_) => return Err(EngineError::InvalidInput { reason: "zero stall speed" }),
            None => return Err(EngineError::InvalidInput { reason: "stall speed not configured" }),
        };
        let ratio = finite(ias, "airspeed is not finite")? / vs;
        Ok(if ratio > self.thresholds.ias_high { Level::High } else { Level::Low })
    }

    /// AOA margin code (deg)
    pub fn aoa(&self, aoa: f64) -> EngineResult<Level> {
        let stall = self.limits.alpha_stall;
        if !(stall.is_finite() && stall > 0.0) {
            return Err(EngineError::InvalidInput { reason: "zero stall angle" });
        }
        let ratio = finite(aoa, "angle of attack is not finite")? / stall;
        Ok(three_way(ratio, self.thresholds.aoa_low, self.thresholds.aoa_high))
    }

    /// Bank code (deg)
    pub fn roll(&self, roll: f64) -> EngineResult<Level> {
        let r = fabs(finite(roll, "roll is not finite")?);
        Ok(if r >= self.thresholds.roll_high_deg { Level::High } else { Level::Low })
    }
}

fn finite(v: f64, reason: &'static str) -> EngineResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EngineError::InvalidInput { reason })
    }
}

fn three_way(ratio: f64, low: f64, high: f64) -> Level {
    if ratio < low {
        Level::Low
    } else if ratio >= high {
        Level::High
    } else {
        Level::Medium
    }
}
