//! Assessing Flight Snapshots
//!
//! Builds an engine over a small inline danger table and runs a handful of
//! flight conditions through it.
//!
//! ## What You'll Learn
//!
//! - Parsing a danger table and building an engine
//! - Reading the outcome: stage, key, danger level and message
//! - How suppression, interpolation and terrain escalation show up
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_assess_snapshot
//! ```

use std::sync::Arc;

use airball_core::{
    AuxLimits, ColorPolicy, DangerEngine, DangerTable, EngineResult, NoGeolocation, Presentation,
    Reading, SensorSnapshot,
};

const TABLE: &str = "\
# slip/skid, airspeed margin, angle of attack, bank
slip_skid,ias,aoa,roll,danger,message
L,H,L,L,0,
L,H,L,H,1,
L,H,H,L,4,High AOA
L,H,H,H,6,High AOA in a turn
L,L,L,L,2,Slow
L,L,L,H,3,Slow in a turn
L,L,H,L,7,Approaching stall
L,L,H,H,9,Accelerated stall risk
H,H,L,L,1,Uncoordinated
H,H,L,H,3,Uncoordinated turn
H,H,H,L,7,\"High AOA, uncoordinated\"
H,H,H,H,9,Spin risk
H,L,L,L,4,\"Slow, uncoordinated\"
H,L,L,H,6,\"Slow, uncoordinated turn\"
H,L,H,L,9,Stall/spin risk
H,L,H,H,10,SPIN
";

fn main() -> EngineResult<()> {
    println!("Airball Danger Assessment Example");
    println!("=================================\n");

    let table = Arc::new(DangerTable::parse(TABLE)?);
    println!("Table columns: {:?} ({} rows)\n", table.columns(), table.len());

    let limits = AuxLimits::with_alpha_stall(15.0).stall_speeds(52.0, Some(45.0));
    let engine = DangerEngine::new(table, limits, Box::new(NoGeolocation));
    let presentation = Presentation::new(ColorPolicy::default(), limits);

    let cases = [
        ("Taxi", snapshot(8.0, 2.0, 0.0, 0.0, 0.0, 0.0)),
        ("Cruise", snapshot(110.0, 3.0, 0.01, 4500.0, 1.0, 0.0)),
        ("Slow flight", snapshot(58.0, 8.0, 0.02, 3000.0, 3.0, -100.0)),
        ("Base to final", snapshot(60.0, 11.5, 0.18, 700.0, 32.0, -500.0)),
        ("Diving at terrain", snapshot(120.0, 2.0, 0.0, 1200.0, 0.0, -2500.0)),
    ];

    for (name, snap) in &cases {
        let outcome = engine.assess(snap)?;
        let display = presentation.present(outcome.assessment.danger_level, outcome.gate, snap);
        println!("{}:", name);
        println!("  stage   {:?}", outcome.stage);
        if let Some(key) = &outcome.key {
            println!("  key     {}", key);
        }
        println!("  danger  {:.1}", outcome.assessment.danger_level);
        if !outcome.assessment.message.is_empty() {
            println!("  message {}", outcome.assessment.message);
        }
        println!("  display {:?}\n", display);
    }

    Ok(())
}

fn snapshot(ias: f64, aoa: f64, alat: f64, agl: f64, roll: f64, vs: f64) -> SensorSnapshot {
    SensorSnapshot {
        ias: Reading::good(ias),
        aoa: Reading::good(aoa),
        alat: Reading::good(alat),
        agl: Reading::good(agl),
        roll: Reading::good(roll),
        vs: Reading::good(vs),
    }
}
