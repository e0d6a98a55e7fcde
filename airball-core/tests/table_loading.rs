//! Loading the danger table and configuration from disk

mod common;

use std::io::Write;

use airball_core::{AirballConfig, DangerTable, EngineError, NoGeolocation, Reading, Stage};
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn loads_generated_table_from_file() {
    let file = write_temp(&common::full_table_csv());
    let table = DangerTable::load(file.path()).unwrap();
    assert_eq!(table.len(), 32);
    assert_eq!(table.columns().len(), 5);
}

#[test]
fn sparse_table_with_aliases_and_comments() {
    let csv = "\
# Short table: AOA and bank only
Alpha , Bank , Danger , Message

L,L,0,
L,H,3,Steep turn
H,L,6,\"Slow, nose high\"
H,H,9,Stall/spin
";
    let file = write_temp(csv);
    let table = DangerTable::load(file.path()).unwrap();
    assert_eq!(table.len(), 4);

    let mid = table
        .lookup(&airball_core::DangerKey::parse("ML").unwrap())
        .unwrap();
    assert_eq!(mid.danger, 3.0);
    assert_eq!(mid.message, "Slow, nose high");
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DangerTable::load(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}

#[test]
fn malformed_row_reports_line() {
    let file = write_temp("aoa,roll,danger,message\n# comment\nL,L,0,\nL,Q,1,x\n");
    match DangerTable::load(file.path()) {
        Err(EngineError::TableFormat { line, reason }) => {
            assert_eq!(line, 4);
            assert!(reason.contains('Q'));
        }
        other => panic!("expected TableFormat, got {:?}", other),
    }
}

#[test]
fn incomplete_table_is_rejected_at_load() {
    let file = write_temp("aoa,roll,danger,message\nL,L,0,\nL,H,1,\nH,L,2,\n");
    let err = DangerTable::load(file.path()).unwrap_err();
    assert!(matches!(err, EngineError::LookupInconsistency { .. }));
    assert!(err.is_fatal());
}

#[test]
fn config_file_builds_working_engine() {
    let table = write_temp(&common::full_table_csv());
    let config_json = format!(
        r#"{{
            "table_path": {:?},
            "aux": {{ "vs": 60.0, "alpha_stall": 15.0 }},
            "alat_filter_depth": 4
        }}"#,
        table.path().to_str().unwrap()
    );
    let config_file = write_temp(&config_json);

    let config = AirballConfig::load(config_file.path()).unwrap();
    assert_eq!(config.alat_filter_depth, 4);

    let engine = config
        .build_engine(Box::new(NoGeolocation))
        .unwrap()
        .expect("table configured");
    let outcome = engine.assess(&common::level_cruise()).unwrap();
    assert_eq!(outcome.stage, Stage::LookedUp);

    let mut snapshot = common::level_cruise();
    snapshot.ias = Reading::good(2.0);
    assert!(matches!(engine.assess(&snapshot).unwrap().stage, Stage::Suppressed(_)));
}

#[test]
fn config_with_bad_table_fails_fast() {
    let table = write_temp("aoa,danger,message\nL,0,\n");
    let config = AirballConfig {
        table_path: Some(table.path().to_str().unwrap().to_string()),
        ..AirballConfig::default()
    };
    let err = config.build_engine(Box::new(NoGeolocation)).unwrap_err();
    assert!(matches!(err, EngineError::LookupInconsistency { .. }));
}
