//! Short-horizon prediction through a log-domain forward extension.
//!
//! Future observations are stood in for by each state's emission mode, so
//! the extension stays a standard forward step. The reported
//! log-likelihood is the maximum entry of the normalized extension column
//! at each step — deliberately *not* the full forward sum; callers that
//! want the true sequence-with-prediction likelihood should evaluate it
//! explicitly.

use serde::Serialize;

use seq_math::{log_sum_exp, StreamingLogSumExp};

use crate::emission::Emission;
use crate::error::HmmError;
use crate::forward_backward::forward_log;
use crate::model::HiddenMarkov;

/// Output of a k-step prediction.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction<O> {
    /// Predicted observations, one per step.
    pub observations: Vec<O>,
    /// Log-weight of the winning state at the final step.
    pub log_likelihood: f64,
    /// Probability-domain state distribution one step ahead; these are
    /// the weights of the induced mixture over the next observation with
    /// the per-state emissions as components.
    pub next_state_weights: Vec<f64>,
}

/// Predict the next `horizon` observations after a conditioning sequence.
///
/// Requires every emission to expose a mode. An empty conditioning
/// sequence seeds the extension from the initial distribution.
pub fn predict<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
    horizon: usize,
) -> Result<Prediction<E::Obs>, HmmError> {
    if horizon == 0 {
        return Err(HmmError::ZeroHorizon);
    }
    let n = model.num_states();

    let mut modes = Vec::with_capacity(n);
    for (state, emission) in model.emissions().iter().enumerate() {
        modes.push(emission.mode().ok_or(HmmError::CapabilityMissing {
            state,
            capability: "mode",
        })?);
    }

    let mut current: Vec<f64> = if observations.is_empty() {
        model.log_initial().to_vec()
    } else {
        let forward = forward_log(model, observations)?;
        forward.log_alpha[observations.len() - 1].clone()
    };

    let mut predicted = Vec::with_capacity(horizon);
    let mut log_likelihood = f64::NEG_INFINITY;
    let mut next_state_weights = Vec::new();

    for step in 0..horizon {
        let mut next = vec![f64::NEG_INFINITY; n];
        for (i, value) in next.iter_mut().enumerate() {
            let mut acc = StreamingLogSumExp::new();
            for j in 0..n {
                acc.push(current[j] + model.log_transition_row(j)[i]);
            }
            *value = acc.value() + model.emission(i).log_pdf(&modes[i]);
        }

        // Renormalize so the column stays a log-distribution over states.
        let norm = log_sum_exp(&next);
        if norm != f64::NEG_INFINITY {
            for value in next.iter_mut() {
                *value -= norm;
            }
        }

        let mut best = 0;
        for i in 1..n {
            if next[i] > next[best] {
                best = i;
            }
        }
        predicted.push(modes[best].clone());
        log_likelihood = next[best];

        if step == 0 {
            next_state_weights = seq_math::exp_vec(&next);
        }
        current = next;
    }

    Ok(Prediction {
        observations: predicted,
        log_likelihood,
        next_state_weights,
    })
}

/// Log-density of an observation under the induced next-observation
/// mixture: components are the per-state emissions, weighted by the
/// predicted state distribution.
pub fn mixture_log_pdf<E: Emission>(
    model: &HiddenMarkov<E>,
    weights: &[f64],
    obs: &E::Obs,
) -> Result<f64, HmmError> {
    if weights.len() != model.num_states() {
        return Err(HmmError::ShapeMismatch {
            expected: model.num_states(),
            got: weights.len(),
        });
    }
    let mut acc = StreamingLogSumExp::new();
    for (weight, emission) in weights.iter().zip(model.emissions()) {
        acc.push(weight.ln() + emission.log_pdf(obs));
    }
    Ok(acc.value())
}
