//! Shared fixtures for the integration tests
//!
//! - A complete danger table over all five channels, generated from a simple
//!   risk count so expected values can be computed in the test
//! - Snapshot builders for the flight conditions the tests keep reusing
//! - A scriptable geolocation

#![allow(dead_code)]

use std::fmt::Write as _;
use std::sync::Arc;

use airball_core::{
    AuxLimits, DangerEngine, DangerTable, Geolocation, Reading, SensorSnapshot,
};

/// Header of the generated table, in key order
pub const HEADER: &str = "slip_skid,hat,ias,aoa,roll,danger,message";

/// Number of risky codes in a literal key
///
/// Risky means: slip H, height L, airspeed L, AOA H, roll H.
pub fn risk(key: &str) -> usize {
    let risky = ['H', 'L', 'L', 'H', 'H'];
    key.chars().zip(risky).filter(|(c, r)| c == r).count()
}

/// Danger the generated table stores for a literal key
pub fn table_danger(key: &str) -> f64 {
    2.0 * risk(key) as f64
}

/// Message the generated table stores for a literal key
pub fn table_message(key: &str) -> String {
    match risk(key) {
        0 => String::new(),
        n => format!("{} hazards ({})", n, key),
    }
}

/// Every L/H key over five columns
pub fn literal_keys() -> Vec<String> {
    (0..32u32)
        .map(|bits| {
            (0..5)
                .map(|i| if bits & (1 << (4 - i)) != 0 { 'H' } else { 'L' })
                .collect()
        })
        .collect()
}

/// CSV for a table with every L/H row
pub fn full_table_csv() -> String {
    let mut csv = String::from("# generated for tests\n");
    csv.push_str(HEADER);
    csv.push('\n');
    for key in literal_keys() {
        let codes: Vec<String> = key.chars().map(|c| c.to_string()).collect();
        let message = table_message(&key);
        if message.contains(',') {
            writeln!(csv, "{},{},\"{}\"", codes.join(","), table_danger(&key), message).unwrap();
        } else {
            writeln!(csv, "{},{},{}", codes.join(","), table_danger(&key), message).unwrap();
        }
    }
    csv
}

pub fn full_table() -> Arc<DangerTable> {
    Arc::new(DangerTable::parse(&full_table_csv()).expect("generated table is valid"))
}

/// Airframe used by the scenarios: Vs 60 kt, stall 15°
pub fn limits() -> AuxLimits {
    AuxLimits::with_alpha_stall(15.0).stall_speeds(60.0, None)
}

pub fn engine_with(geo: impl Geolocation + Send + Sync + 'static) -> DangerEngine {
    DangerEngine::new(full_table(), limits(), Box::new(geo))
}

/// Straight and level at 90 kt, 5000 ft AGL
pub fn level_cruise() -> SensorSnapshot {
    SensorSnapshot {
        ias: Reading::good(90.0),
        aoa: Reading::good(5.0),
        alat: Reading::good(0.01),
        agl: Reading::good(5000.0),
        roll: Reading::good(2.0),
        vs: Reading::good(0.0),
    }
}

/// Slow, steep, uncoordinated turn close to the ground
pub fn base_to_final_spin_entry() -> SensorSnapshot {
    SensorSnapshot {
        ias: Reading::good(55.0),
        aoa: Reading::good(13.0),
        alat: Reading::good(0.2),
        agl: Reading::good(600.0),
        roll: Reading::good(35.0),
        vs: Reading::good(-400.0),
    }
}

/// Scriptable position predicates
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeGeo {
    pub vicinity: bool,
    pub runway: bool,
    pub terrain: Option<f64>,
}

impl Geolocation for FakeGeo {
    fn in_airport_vicinity(&self) -> bool {
        self.vicinity
    }

    fn is_over_runway(&self) -> bool {
        self.runway
    }

    fn terrain_agl_estimate(&self) -> Option<f64> {
        self.terrain
    }
}
