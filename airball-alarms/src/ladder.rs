//! Aural warning ladder
//!
//! Each rung pairs a danger threshold with a volume and a sound clip. The
//! clip to play is the one whose threshold is the highest one strictly
//! exceeded by the current danger level; below every threshold nothing
//! plays.

use std::path::{Path, PathBuf};

/// One rung of the ladder
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmEntry {
    /// Danger level that must be exceeded
    pub threshold: f64,
    /// Mixer volume in percent
    pub volume: u8,
    /// Sound clip
    pub path: PathBuf,
}

impl AlarmEntry {
    /// Create a rung
    pub fn new(threshold: f64, volume: u8, path: impl Into<PathBuf>) -> Self {
        Self {
            threshold,
            volume,
            path: path.into(),
        }
    }

    /// Clip path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Rungs kept in descending threshold order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlarmLadder {
    entries: Vec<AlarmEntry>,
}

impl AlarmLadder {
    /// Build a ladder from rungs in any order
    pub fn new(mut entries: Vec<AlarmEntry>) -> Self {
        entries.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Self { entries }
    }

    /// Rung for a danger level, `None` means silence
    pub fn select(&self, danger_level: f64) -> Option<&AlarmEntry> {
        self.entries.iter().find(|e| danger_level > e.threshold)
    }

    /// Rungs, highest threshold first
    pub fn entries(&self) -> &[AlarmEntry] {
        &self.entries
    }

    /// Number of rungs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no rungs
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> AlarmLadder {
        AlarmLadder::new(vec![
            AlarmEntry::new(3.0, 60, "caution.wav"),
            AlarmEntry::new(8.0, 100, "stall.wav"),
            AlarmEntry::new(5.0, 80, "warning.wav"),
        ])
    }

    #[test]
    fn sorted_descending() {
        let thresholds: Vec<f64> = ladder().entries().iter().map(|e| e.threshold).collect();
        assert_eq!(thresholds, vec![8.0, 5.0, 3.0]);
    }

    #[test]
    fn highest_exceeded_threshold_wins() {
        let l = ladder();
        assert_eq!(l.select(9.0).unwrap().path(), Path::new("stall.wav"));
        assert_eq!(l.select(6.0).unwrap().volume, 80);
        assert_eq!(l.select(3.5).unwrap().path(), Path::new("caution.wav"));
    }

    #[test]
    fn threshold_must_be_strictly_exceeded() {
        let l = ladder();
        assert!(l.select(3.0).is_none());
        assert_eq!(l.select(5.0).unwrap().threshold, 3.0);
        assert!(l.select(0.0).is_none());
        assert!(l.select(f64::NAN).is_none());
    }

    #[test]
    fn empty_ladder_is_silent() {
        assert!(AlarmLadder::default().select(10.0).is_none());
    }
}
