//! Property tests for the pipeline invariants

mod common;

use airball_core::{
    AuxLimits, Category, Classifier, ClassifierThresholds, ColorPolicy, DangerAssessment,
    DangerKey, NoGeolocation, Reading, SensorSnapshot, Stage, TerrainEscalator,
};
use proptest::prelude::*;

fn key_with_one_medium() -> impl Strategy<Value = String> {
    (0u32..32, 0usize..5).prop_map(|(bits, m)| {
        (0..5)
            .map(|i| {
                if i == m {
                    'M'
                } else if bits & (1 << i) != 0 {
                    'H'
                } else {
                    'L'
                }
            })
            .collect()
    })
}

fn any_snapshot() -> impl Strategy<Value = SensorSnapshot> {
    (
        0.0..200.0f64,
        -20.0..30.0f64,
        -1.0..1.0f64,
        0.0..12000.0f64,
        -90.0..90.0f64,
        -4000.0..4000.0f64,
    )
        .prop_map(|(ias, aoa, alat, agl, roll, vs)| SensorSnapshot {
            ias: Reading::good(ias),
            aoa: Reading::good(aoa),
            alat: Reading::good(alat),
            agl: Reading::good(agl),
            roll: Reading::good(roll),
            vs: Reading::good(vs),
        })
}

#[test]
fn literal_rows_round_trip() {
    let table = common::full_table();
    for key in common::literal_keys() {
        let entry = table.lookup(&DangerKey::parse(&key).unwrap()).unwrap();
        assert_eq!(entry.danger, common::table_danger(&key));
        assert_eq!(entry.message, common::table_message(&key));
    }
}

proptest! {
    #[test]
    fn keys_are_five_codes_in_order(snapshot in any_snapshot(), hat in 0.0..20000.0f64) {
        let classifier = Classifier::new(common::limits(), ClassifierThresholds::default());
        let classes = classifier.classify(&snapshot, hat).unwrap();
        let key = classes.key(&Category::ALL).unwrap();

        prop_assert_eq!(key.len(), 5);
        prop_assert!(key.as_str().chars().all(|c| matches!(c, 'L' | 'M' | 'H')));
        for (i, category) in Category::ALL.iter().enumerate() {
            prop_assert_eq!(key.as_str().chars().nth(i), Some(classes.level(*category).code()));
        }
    }

    #[test]
    fn single_medium_is_neighbour_average(key in key_with_one_medium()) {
        let table = common::full_table();
        let idx = key.find('M').unwrap();
        let high = key.replacen('M', "H", 1);
        let low = key.replacen('M', "L", 1);

        let entry = table.lookup(&DangerKey::parse(&key).unwrap()).unwrap();
        let expected = (common::table_danger(&high) + common::table_danger(&low)) / 2.0;
        prop_assert!((entry.danger - expected).abs() < 1e-12, "key {} at {}", key, idx);
        prop_assert_eq!(entry.message, common::table_message(&high));
    }

    #[test]
    fn escalation_is_monotonic_and_capped(
        d in 0.0..=10.0f64,
        agl in 0.0..3000.0f64,
        vs in -6000.0..-3001.0f64,
    ) {
        let mut assessment = DangerAssessment::new(d, "");
        let fired = TerrainEscalator::default()
            .escalate(&mut assessment, agl, &Reading::good(vs), &NoGeolocation);
        prop_assert!(fired);
        prop_assert_eq!(assessment.danger_level, (d + 5.0).min(10.0));
        prop_assert!(assessment.danger_level >= d);
    }

    #[test]
    fn danger_always_in_range(snapshot in any_snapshot()) {
        let engine = common::engine_with(NoGeolocation);
        let outcome = engine.assess(&snapshot).unwrap();
        let d = outcome.assessment.danger_level;
        prop_assert!((0.0..=10.0).contains(&d));
    }

    #[test]
    fn color_ratio_clamped_and_flash_iff_over(d in -5.0..20.0f64, max in 0.5..12.0f64) {
        let policy = ColorPolicy { max_color_danger_level: max, ..ColorPolicy::default() };
        let (ratio, flash) = policy.ratio(d);
        prop_assert!((0.0..=1.0).contains(&ratio));
        prop_assert_eq!(flash, d / max > 1.0);
    }

    #[test]
    fn suppression_wins_over_everything(mut snapshot in any_snapshot(), vs in -19.9..19.9f64) {
        let limits = AuxLimits::with_alpha_stall(15.0).stall_speeds(60.0, Some(50.0));
        let engine = airball_core::DangerEngine::new(common::full_table(), limits, Box::new(NoGeolocation));
        snapshot.ias = Reading::good(snapshot.ias.value % 10.0);
        snapshot.vs = Reading::good(vs);

        let outcome = engine.assess(&snapshot).unwrap();
        prop_assert!(matches!(outcome.stage, Stage::Suppressed(_)));
        prop_assert_eq!(outcome.assessment, DangerAssessment::none());
    }
}
