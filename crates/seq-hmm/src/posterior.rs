//! Smoothed state posteriors γ from the forward and backward lattices.

use serde::Serialize;
use tracing::warn;

use crate::emission::Emission;
use crate::error::HmmError;
use crate::forward_backward::{backward_log, forward_log};
use crate::model::HiddenMarkov;

/// Smoothed posteriors for a whole sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Posteriors {
    /// `γ_t[i] = P(S_t = i | O, model)`, T×N; every row sums to one.
    pub gamma: Vec<Vec<f64>>,
    /// Sequence log-likelihood from the forward pass.
    pub log_likelihood: f64,
}

/// Per-step maximum-posterior decoding.
///
/// Each state is chosen independently as `argmax_i γ_t[i]`; the resulting
/// path maximizes per-step posteriors but need not be realizable under the
/// transition structure.
#[derive(Debug, Clone, Serialize)]
pub struct PosteriorDecoding {
    /// Argmax state of each γ row.
    pub states: Vec<usize>,
    /// The underlying smoothed posteriors.
    pub posteriors: Posteriors,
}

/// Compute γ from the log-domain forward and backward lattices:
/// `γ_t[i] = exp(lnα_t[i] + lnβ_t[i] − L)`.
pub fn posteriors<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
) -> Result<Posteriors, HmmError> {
    let forward = forward_log(model, observations)?;
    let log_beta = backward_log(model, observations)?;
    let n = model.num_states();
    let log_likelihood = forward.log_likelihood;

    if observations.is_empty() {
        return Ok(Posteriors {
            gamma: Vec::new(),
            log_likelihood,
        });
    }

    // An impossible sequence carries no evidence about the states; fall
    // back to uniform rows so the simplex invariant survives.
    if log_likelihood == f64::NEG_INFINITY {
        warn!("sequence has zero likelihood; posteriors fall back to uniform");
        let uniform = 1.0 / n as f64;
        return Ok(Posteriors {
            gamma: vec![vec![uniform; n]; observations.len()],
            log_likelihood,
        });
    }

    let gamma = forward
        .log_alpha
        .iter()
        .zip(&log_beta)
        .map(|(alpha_row, beta_row)| {
            alpha_row
                .iter()
                .zip(beta_row)
                .map(|(a, b)| (a + b - log_likelihood).exp())
                .collect()
        })
        .collect();

    Ok(Posteriors {
        gamma,
        log_likelihood,
    })
}

/// Decode by per-step posterior maximum.
pub fn posterior_decode<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
) -> Result<PosteriorDecoding, HmmError> {
    let posteriors = posteriors(model, observations)?;
    let states = posteriors
        .gamma
        .iter()
        .map(|row| {
            let mut best = 0;
            for (i, value) in row.iter().enumerate().skip(1) {
                if *value > row[best] {
                    best = i;
                }
            }
            best
        })
        .collect();
    Ok(PosteriorDecoding { states, posteriors })
}
