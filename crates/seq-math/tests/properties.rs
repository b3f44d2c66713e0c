//! Property-based tests for seq-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use proptest::prelude::*;
use seq_math::{exp_matrix, ln_matrix, log_add_exp, log_sum_exp, StreamingLogSumExp};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

/// Helper to check approximate equality.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// log_add_exp properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// log_add_exp is commutative.
    #[test]
    fn log_add_exp_commutative(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let ab = log_add_exp(a, b);
        let ba = log_add_exp(b, a);
        prop_assert!(approx_eq(ab, ba, TOL), "lae({},{})={} != lae({},{})={}", a, b, ab, b, a, ba);
    }

    /// log_add_exp is associative up to floating-point tolerance.
    #[test]
    fn log_add_exp_associative(a in -50.0..50.0f64, b in -50.0..50.0f64, c in -50.0..50.0f64) {
        let left = log_add_exp(log_add_exp(a, b), c);
        let right = log_add_exp(a, log_add_exp(b, c));
        prop_assert!(approx_eq(left, right, TOL),
            "((a+b)+c)={} != (a+(b+c))={} for a={}, b={}, c={}", left, right, a, b, c);
    }

    /// NEG_INFINITY is the identity element: logSum(-inf, x) = x.
    #[test]
    fn log_add_exp_neg_inf_identity(x in -200.0..200.0f64) {
        prop_assert!(approx_eq(log_add_exp(f64::NEG_INFINITY, x), x, TOL));
        prop_assert!(approx_eq(log_add_exp(x, f64::NEG_INFINITY), x, TOL));
    }

    /// Result is always >= both operands (adding probability mass).
    #[test]
    fn log_add_exp_monotone(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let out = log_add_exp(a, b);
        prop_assert!(out >= a.max(b) - TOL, "lae({},{})={} < max", a, b, out);
    }
}

// ============================================================================
// log_sum_exp properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Reducing form agrees with pairwise folding via log_add_exp.
    #[test]
    fn log_sum_exp_matches_pairwise_fold(values in prop::collection::vec(-80.0..80.0f64, 1..12)) {
        let reduced = log_sum_exp(&values);
        let folded = values.iter().fold(f64::NEG_INFINITY, |acc, &x| log_add_exp(acc, x));
        prop_assert!(approx_eq(reduced, folded, TOL),
            "log_sum_exp={} != fold={} for {:?}", reduced, folded, values);
    }

    /// Streaming accumulator agrees with the reducing form.
    #[test]
    fn streaming_matches_reducing(values in prop::collection::vec(-80.0..80.0f64, 0..16)) {
        let mut acc = StreamingLogSumExp::new();
        for &v in &values {
            acc.push(v);
        }
        prop_assert!(approx_eq(acc.value(), log_sum_exp(&values), TOL));
    }

    /// The max value dominates when the rest are far below it.
    #[test]
    fn log_sum_exp_dominance(max_val in -50.0..50.0f64) {
        let small = max_val - 100.0;
        let result = log_sum_exp(&[max_val, small, small - 10.0]);
        prop_assert!(approx_eq(result, max_val, TOL));
    }

    /// No overflow with large values; result bounded below by the max.
    #[test]
    fn log_sum_exp_no_overflow(a in 500.0..700.0f64, b in 500.0..700.0f64) {
        let result = log_sum_exp(&[a, b]);
        prop_assert!(!result.is_nan());
        prop_assert!(result >= a.max(b) - TOL);
    }

    /// No spurious NaN with very negative values.
    #[test]
    fn log_sum_exp_no_underflow(a in -700.0..-500.0f64, b in -700.0..-500.0f64) {
        let result = log_sum_exp(&[a, b]);
        prop_assert!(!result.is_nan());
    }
}

// ============================================================================
// Elementwise matrix forms
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// exp(ln(m)) round-trips probability-domain matrices, zeros included.
    #[test]
    fn ln_exp_matrix_round_trip(
        rows in prop::collection::vec(prop::collection::vec(0.0..1.0f64, 1..5), 1..5)
    ) {
        let back = exp_matrix(&ln_matrix(&rows));
        prop_assert_eq!(back.len(), rows.len());
        for (orig, round) in rows.iter().zip(&back) {
            prop_assert_eq!(orig.len(), round.len());
            for (o, r) in orig.iter().zip(round) {
                prop_assert!(approx_eq(*o, *r, TOL), "{} != {}", o, r);
            }
        }
    }
}
