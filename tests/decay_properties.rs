use mnemo_accel::decay::{calculate_batch_scalar, RECENCY_AGE_HOURS};
use mnemo_accel::{calculate, calculate_batch, DecayConfig, DecayInput, TypeMultipliers};
use proptest::prelude::*;

fn arb_input() -> impl Strategy<Value = DecayInput> {
    (
        0.0f64..=1.0,
        -100.0f64..5000.0,
        0i64..1_000_000,
        0i64..25,
        prop_oneof![Just(-1.0f64), 0.0f64..500.0],
        -2i64..6,
        0i64..12,
    )
        .prop_map(|(importance, hours, access, connections, last_access, kind, channels)| {
            DecayInput::from_raw(importance, hours, access, connections, last_access, kind, channels)
        })
}

fn arb_config() -> impl Strategy<Value = DecayConfig> {
    (
        0.0f64..0.05,
        0.0f64..=1.0,
        0.0f64..2.0,
        0.0f64..0.5,
        0.0f64..1.0,
        prop::array::uniform4(0.0f64..2.0),
    )
        .prop_map(|(base, retention, access_k, relation_k, channel_k, table)| DecayConfig {
            base_decay_rate: base,
            min_retention: retention,
            access_stability_k: access_k,
            relation_resistance_k: relation_k,
            channel_diversity_k: channel_k,
            type_multipliers: TypeMultipliers::new(table[0], table[1], table[2], table[3]),
        })
}

fn assert_close(actual: f64, expected: f64) -> Result<(), TestCaseError> {
    prop_assert!(
        (actual - expected).abs() <= 1e-9 * expected.abs(),
        "batch {} != scalar {}",
        actual,
        expected
    );
    Ok(())
}

// ── Not-yet-valid records are untouched ─────────────────────────────────

proptest! {
    #[test]
    fn negative_age_returns_importance(
        input in arb_input(),
        hours in -10_000.0f64..-1e-9,
        config in arb_config(),
    ) {
        let input = DecayInput { hours_passed: None, ..input };
        prop_assert_eq!(calculate(&input, &config), input.importance);

        let raw = DecayInput::from_raw(input.importance, hours, 3, 1, 2.0, 1, 0);
        prop_assert_eq!(calculate(&raw, &config), input.importance);
    }
}

// ── Retention floor ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn never_below_retention_floor(input in arb_input(), config in arb_config()) {
        let score = calculate(&input, &config);
        prop_assert!(score >= input.importance * config.min_retention - 1e-12);
    }
}

// ── Monotonically non-increasing in age ─────────────────────────────────

proptest! {
    #[test]
    fn older_never_scores_higher(
        input in arb_input(),
        config in arb_config(),
        a in 0.0f64..5000.0,
        b in 0.0f64..5000.0,
    ) {
        let (younger, older) = if a <= b { (a, b) } else { (b, a) };
        let base = DecayInput { last_access_hours: None, ..input };
        let young = calculate(&DecayInput { hours_passed: Some(younger), ..base }, &config);
        let old = calculate(&DecayInput { hours_passed: Some(older), ..base }, &config);
        prop_assert!(old <= young, "{} hours scored {} > {} at {} hours", older, old, young, younger);
    }

    #[test]
    fn older_never_scores_higher_inside_first_week(
        input in arb_input(),
        a in 0.0f64..RECENCY_AGE_HOURS,
        b in 0.0f64..RECENCY_AGE_HOURS,
    ) {
        let config = DecayConfig::default();
        let (younger, older) = if a <= b { (a, b) } else { (b, a) };
        let young = calculate(&DecayInput { hours_passed: Some(younger), ..input }, &config);
        let old = calculate(&DecayInput { hours_passed: Some(older), ..input }, &config);
        prop_assert!(old <= young);
    }
}

// ── Scalar / vectorized parity ──────────────────────────────────────────

proptest! {
    #[test]
    fn batch_matches_scalar(
        inputs in prop::collection::vec(arb_input(), 0..200),
        config in arb_config(),
    ) {
        let batch = calculate_batch(&inputs, &config);
        prop_assert_eq!(batch.len(), inputs.len());
        for (input, score) in inputs.iter().zip(&batch) {
            assert_close(*score, calculate(input, &config))?;
        }
    }

    #[test]
    fn batch_matches_reference_batch(inputs in prop::collection::vec(arb_input(), 0..64)) {
        let config = DecayConfig::default();
        let fast = calculate_batch(&inputs, &config);
        let reference = calculate_batch_scalar(&inputs, &config);
        for (f, r) in fast.iter().zip(&reference) {
            assert_close(*f, *r)?;
        }
    }
}

// ── Concrete scenarios ──────────────────────────────────────────────────

#[test]
fn fresh_record_keeps_full_importance() {
    assert_eq!(calculate(&DecayInput::new(1.0, 0.0), &DecayConfig::default()), 1.0);
}

#[test]
fn thousand_hour_conversation_decays_partially() {
    let input = DecayInput::from_raw(1.0, 1000.0, 0, 0, -1.0, 0, 0);
    let score = calculate(&input, &DecayConfig::default());
    assert!(score > 0.1 && score < 1.0, "got {score}");
}

#[test]
fn large_batch_keeps_order() {
    let config = DecayConfig::default();
    let inputs: Vec<DecayInput> = (0..50_000)
        .map(|i| {
            DecayInput::new(1.0, f64::from(i % 5000))
                .with_access_count(i % 17)
                .with_channel_mentions(i % 3)
        })
        .collect();
    let scores = calculate_batch(&inputs, &config);
    assert_eq!(scores.len(), inputs.len());
    for k in [0, 1, 3, 4, 4999, 12_345, 49_999] {
        let expected = calculate(&inputs[k], &config);
        assert!((scores[k] - expected).abs() <= 1e-9 * expected);
    }
}
