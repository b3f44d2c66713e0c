//! Fuzz target for the lattice engines' no-NaN postcondition.
//!
//! Builds small models from arbitrary finite parameters and checks that
//! the forward, backward, and Viterbi lattices never produce NaN.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use seq_hmm::{
    backward_log, backward_scaled, forward_log, forward_scaled, DiscreteEmission, HiddenMarkov,
    RunningFilter,
};

#[derive(Debug, Arbitrary)]
struct Input {
    initial: Vec<f64>,
    transition: Vec<Vec<f64>>,
    emission_mass: Vec<Vec<f64>>,
    observations: Vec<u8>,
}

fn clamp_mass(raw: &[f64], len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let v = raw.get(i).copied().unwrap_or(0.5);
            if v.is_finite() {
                v.abs().min(1e6)
            } else {
                0.5
            }
        })
        .collect()
}

fuzz_target!(|input: Input| {
    let n = input.initial.len().clamp(1, 6);
    let k = 4usize;

    let initial = clamp_mass(&input.initial, n);
    let transition: Vec<Vec<f64>> = (0..n)
        .map(|i| clamp_mass(input.transition.get(i).map_or(&[][..], Vec::as_slice), n))
        .collect();
    let emissions: Vec<DiscreteEmission> = (0..n)
        .map(|i| {
            let mass = clamp_mass(input.emission_mass.get(i).map_or(&[][..], Vec::as_slice), k);
            DiscreteEmission::from_probabilities(&mass).unwrap()
        })
        .collect();

    // Rows are clamped finite but deliberately not normalized; the
    // engines must still stay NaN-free.
    let Ok(model) = HiddenMarkov::from_probabilities(&initial, &transition, emissions) else {
        return;
    };

    let observations: Vec<usize> = input
        .observations
        .iter()
        .take(32)
        .map(|o| (*o as usize) % k)
        .collect();

    let scaled = forward_scaled(&model, &observations).unwrap();
    assert!(scaled.alpha.iter().flatten().all(|v| !v.is_nan()));

    let beta = backward_scaled(&model, &observations, &scaled.scaling).unwrap();
    assert!(beta.iter().flatten().all(|v| !v.is_nan()));

    let logged = forward_log(&model, &observations).unwrap();
    assert!(logged.log_alpha.iter().flatten().all(|v| !v.is_nan()));

    let log_beta = backward_log(&model, &observations).unwrap();
    assert!(log_beta.iter().flatten().all(|v| !v.is_nan()));

    let decoded = seq_hmm::decode(&model, &observations).unwrap();
    assert!(!decoded.log_likelihood.is_nan());

    let mut filter = RunningFilter::new(&model);
    for obs in &observations {
        filter.push(obs).unwrap();
    }
    assert!(!filter.log_forward().is_nan());
});
