//! Live Monitor Example
//!
//! Connects the engine to a set of sensor channels and replays a short
//! approach, printing every change of danger level and display state.
//!
//! ## What You'll Learn
//!
//! - Building a monitor from JSON configuration
//! - Subscribing to the published danger level and display signals
//! - What a sensor failure and its recovery look like downstream
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_live_monitor
//! ```

use std::io::Write;

use airball_core::{
    AirballConfig, DisplayState, EngineError, EngineResult, Monitor, NoGeolocation, Quality,
    Reading, SensorChannels,
};

const TABLE: &str = "\
aoa,roll,danger,message
L,L,0,
L,H,2,Steep turn
H,L,6,High AOA
H,H,9,Stall/spin risk
";

fn main() -> EngineResult<()> {
    println!("Airball Live Monitor Example");
    println!("============================\n");

    let mut table_file = std::env::temp_dir();
    table_file.push("airball-example-danger.csv");
    std::fs::File::create(&table_file)?.write_all(TABLE.as_bytes())?;

    let config = AirballConfig::from_json(&format!(
        r#"{{
            "table_path": {:?},
            "aux": {{ "vs": 52.0, "alpha_stall": 15.0 }},
            "alat_filter_depth": 4
        }}"#,
        table_file.to_str().ok_or_else(|| EngineError::InvalidConfig {
            field: "table_path",
            reason: "temporary path is not UTF-8".into(),
        })?
    ))?;

    let channels = SensorChannels::new();
    let engine = config.require_engine(Box::new(NoGeolocation))?;
    let monitor = Monitor::new(engine, config.presentation()?, config.alat_filter(), &channels);

    let _danger = monitor.danger_level().subscribe(|d| println!("  danger -> {:.1}", d));
    let _display = monitor.display().subscribe(|state| match state {
        DisplayState::Failure => println!("  display -> FAILURE"),
        DisplayState::Instrument { color, flash, ball } => println!(
            "  display -> {}{} ball ({:+.2}, {:.2})",
            color,
            if *flash { " flashing" } else { "" },
            ball.lateral,
            ball.vertical
        ),
    });

    // (label, ias, aoa, roll, agl, vs)
    let approach = [
        ("downwind", 80.0, 4.0, 0.0, 1000.0, 0.0),
        ("base turn", 70.0, 7.0, 25.0, 800.0, -400.0),
        ("overshoot, tightening", 62.0, 11.0, 35.0, 600.0, -500.0),
        ("rolled out on final", 65.0, 6.0, 2.0, 400.0, -500.0),
    ];

    for (label, ias, aoa, roll, agl, vs) in approach {
        println!("{}:", label);
        channels.ias.publish(Reading::good(ias));
        channels.aoa.publish(Reading::good(aoa));
        channels.alat.publish(Reading::good(0.02));
        channels.roll.publish(Reading::good(roll));
        channels.agl.publish(Reading::good(agl));
        channels.vs.publish(Reading::good(vs));
    }

    println!("AOA probe fails:");
    channels.aoa.publish(Reading::new(6.0, Quality::Failed));
    println!("AOA probe recovers:");
    channels.aoa.publish(Reading::good(6.0));

    std::fs::remove_file(&table_file)?;
    Ok(())
}
