//! Ancestral sampling of observation sequences with their state paths.

use rand::Rng;
use serde::Serialize;

use crate::emission::Emission;
use crate::error::HmmError;
use crate::model::HiddenMarkov;

/// A sampled sequence, its generating state path, and the joint
/// log-probability of the pair under the model.
#[derive(Debug, Clone, Serialize)]
pub struct Generated<O> {
    /// Sampled observations.
    pub observations: Vec<O>,
    /// States that generated each observation.
    pub states: Vec<usize>,
    /// `log P(S, O | model)` accumulated additively along the sample.
    pub log_likelihood: f64,
}

/// Draw one state index from a log-domain categorical distribution.
fn sample_state<R: Rng + ?Sized>(log_probs: &[f64], rng: &mut R) -> usize {
    let u: f64 = rng.random();
    let mut acc = 0.0;
    for (state, lp) in log_probs.iter().enumerate() {
        acc += lp.exp();
        if u < acc {
            return state;
        }
    }
    // Rounding in the cumulative sum can leave u just above the total.
    log_probs.len() - 1
}

/// Sample `samples` observations by walking the chain: the first state
/// from π, each next state from its predecessor's transition row, and
/// each observation from the occupied state's emission.
///
/// Requires every emission to support sampling. Deterministic for a
/// fixed RNG seed.
pub fn generate<E: Emission, R: Rng + ?Sized>(
    model: &HiddenMarkov<E>,
    samples: usize,
    rng: &mut R,
) -> Result<Generated<E::Obs>, HmmError> {
    let mut observations = Vec::with_capacity(samples);
    let mut states = Vec::with_capacity(samples);
    let mut log_likelihood = if samples == 0 {
        f64::NEG_INFINITY
    } else {
        0.0
    };

    let mut previous: Option<usize> = None;
    for _ in 0..samples {
        let (state, log_step) = match previous {
            None => {
                let state = sample_state(model.log_initial(), rng);
                (state, model.log_initial()[state])
            }
            Some(prev) => {
                let row = model.log_transition_row(prev);
                let state = sample_state(row, rng);
                (state, row[state])
            }
        };

        let obs = model
            .emission(state)
            .sample(rng)
            .ok_or(HmmError::CapabilityMissing {
                state,
                capability: "sample",
            })?;
        log_likelihood += log_step + model.emission(state).log_pdf(&obs);

        observations.push(obs);
        states.push(state);
        previous = Some(state);
    }

    Ok(Generated {
        observations,
        states,
        log_likelihood,
    })
}
