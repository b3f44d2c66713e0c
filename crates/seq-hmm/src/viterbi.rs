//! Most-likely state path decoding (max-product dynamic program).
//!
//! Ties break on strict greater-than: the lowest state index wins, so
//! decoding is deterministic and part of the contract.

use serde::Serialize;

use crate::emission::Emission;
use crate::error::HmmError;
use crate::forward_backward::guard_lattice_nan;
use crate::model::HiddenMarkov;

/// A decoded state path and its joint log-likelihood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViterbiPath {
    /// Best state at each time step.
    pub states: Vec<usize>,
    /// `log P(S*, O | model)` of the best path.
    pub log_likelihood: f64,
}

/// Decode the most likely state path for an observation sequence.
pub fn decode<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
) -> Result<ViterbiPath, HmmError> {
    model.check_sequence(observations)?;
    let steps = observations.len();
    let n = model.num_states();
    if steps == 0 {
        return Ok(ViterbiPath {
            states: Vec::new(),
            log_likelihood: f64::NEG_INFINITY,
        });
    }

    let mut weight = vec![vec![f64::NEG_INFINITY; n]; steps];
    let mut predecessor = vec![vec![0usize; n]; steps];

    for i in 0..n {
        weight[0][i] = model.log_initial()[i] + model.emission(i).log_pdf(&observations[0]);
    }

    for t in 1..steps {
        for j in 0..n {
            let mut best_state = 0;
            let mut best_weight = f64::NEG_INFINITY;
            for i in 0..n {
                let candidate = weight[t - 1][i] + model.log_transition_row(i)[j];
                if candidate > best_weight {
                    best_weight = candidate;
                    best_state = i;
                }
            }
            weight[t][j] = best_weight + model.emission(j).log_pdf(&observations[t]);
            predecessor[t][j] = best_state;
        }
    }

    let mut best_last = 0;
    for i in 1..n {
        if weight[steps - 1][i] > weight[steps - 1][best_last] {
            best_last = i;
        }
    }

    let mut states = vec![0usize; steps];
    states[steps - 1] = best_last;
    for t in (0..steps - 1).rev() {
        states[t] = predecessor[t + 1][states[t + 1]];
    }

    guard_lattice_nan(&weight, "viterbi");
    Ok(ViterbiPath {
        log_likelihood: weight[steps - 1][best_last],
        states,
    })
}

/// Joint log-likelihood of an externally supplied state path:
/// `logπ[p_0] + logB_{p_0}(O_0) + Σ_{t≥1} (logA[p_{t−1}, p_t] + logB_{p_t}(O_t))`.
pub fn evaluate_path<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
    path: &[usize],
) -> Result<f64, HmmError> {
    model.check_sequence(observations)?;
    if path.len() != observations.len() {
        return Err(HmmError::ShapeMismatch {
            expected: observations.len(),
            got: path.len(),
        });
    }
    let n = model.num_states();
    for &state in path {
        if state >= n {
            return Err(HmmError::StateOutOfRange {
                state,
                num_states: n,
            });
        }
    }
    if observations.is_empty() {
        return Ok(f64::NEG_INFINITY);
    }

    let mut log_likelihood =
        model.log_initial()[path[0]] + model.emission(path[0]).log_pdf(&observations[0]);
    for t in 1..observations.len() {
        log_likelihood += model.log_transition_row(path[t - 1])[path[t]]
            + model.emission(path[t]).log_pdf(&observations[t]);
    }
    Ok(log_likelihood)
}
