//! Forward and backward recurrences, in scaled-probability and log domains.
//!
//! The scaled variant rescales each forward column by its sum `c_t` so the
//! lattice stays in probability space without underflow; the sequence
//! log-likelihood is recovered as `Σ_t log c_t`, and the backward pass
//! reuses the same coefficients. The log variant runs entirely in
//! log-domain arithmetic and needs no scaling. Both agree on the sequence
//! log-likelihood to floating-point tolerance.

use serde::Serialize;
use tracing::warn;

use seq_math::{log_sum_exp, StreamingLogSumExp};

use crate::emission::Emission;
use crate::error::HmmError;
use crate::model::HiddenMarkov;

/// Forward pass output in the scaled-probability domain.
#[derive(Debug, Clone, Serialize)]
pub struct ScaledForward {
    /// Rescaled forward lattice, T×N.
    pub alpha: Vec<Vec<f64>>,
    /// Per-step scaling coefficients `c_t`.
    pub scaling: Vec<f64>,
    /// Sequence log-likelihood `Σ_t log c_t`.
    pub log_likelihood: f64,
}

/// Forward pass output in the log domain.
#[derive(Debug, Clone, Serialize)]
pub struct LogForward {
    /// Log forward lattice, T×N.
    pub log_alpha: Vec<Vec<f64>>,
    /// Sequence log-likelihood `logSum_i lnα_{T−1}[i]`.
    pub log_likelihood: f64,
}

/// NaN in a lattice means a caller-supplied log-density was degenerate.
/// Fatal in debug builds; propagated with a breadcrumb in release.
pub(crate) fn guard_lattice_nan(rows: &[Vec<f64>], lattice: &'static str) {
    if rows.iter().any(|row| row.iter().any(|v| v.is_nan())) {
        debug_assert!(false, "{lattice} lattice contains NaN");
        warn!(lattice, "lattice contains NaN from a degenerate log-density");
    }
}

/// Scaled forward recurrence.
pub fn forward_scaled<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
) -> Result<ScaledForward, HmmError> {
    model.check_sequence(observations)?;
    let steps = observations.len();
    let n = model.num_states();
    if steps == 0 {
        return Ok(ScaledForward {
            alpha: Vec::new(),
            scaling: Vec::new(),
            log_likelihood: f64::NEG_INFINITY,
        });
    }

    let initial = seq_math::exp_vec(model.log_initial());
    let transition = seq_math::exp_matrix(model.log_transition());

    let mut alpha = vec![vec![0.0; n]; steps];
    let mut scaling = vec![0.0; steps];

    for i in 0..n {
        alpha[0][i] = initial[i] * model.emission(i).log_pdf(&observations[0]).exp();
    }
    scaling[0] = alpha[0].iter().sum();
    if scaling[0] != 0.0 {
        for value in alpha[0].iter_mut() {
            *value /= scaling[0];
        }
    }

    for t in 1..steps {
        for i in 0..n {
            let mut mass = 0.0;
            for j in 0..n {
                mass += alpha[t - 1][j] * transition[j][i];
            }
            alpha[t][i] = mass * model.emission(i).log_pdf(&observations[t]).exp();
        }
        scaling[t] = alpha[t].iter().sum();
        if scaling[t] != 0.0 {
            for value in alpha[t].iter_mut() {
                *value /= scaling[t];
            }
        }
    }

    let log_likelihood = scaling.iter().map(|c| c.ln()).sum();
    guard_lattice_nan(&alpha, "scaled forward");
    Ok(ScaledForward {
        alpha,
        scaling,
        log_likelihood,
    })
}

/// Scaled backward recurrence, reusing the forward scaling coefficients.
///
/// Steps whose scaling coefficient is zero produce zero β rows; the
/// sequence likelihood is already zero in that case.
pub fn backward_scaled<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
    scaling: &[f64],
) -> Result<Vec<Vec<f64>>, HmmError> {
    model.check_sequence(observations)?;
    if observations.len() != scaling.len() {
        return Err(HmmError::ShapeMismatch {
            expected: observations.len(),
            got: scaling.len(),
        });
    }
    let steps = observations.len();
    let n = model.num_states();
    if steps == 0 {
        return Ok(Vec::new());
    }

    let transition = seq_math::exp_matrix(model.log_transition());
    let mut beta = vec![vec![0.0; n]; steps];

    let last = steps - 1;
    for i in 0..n {
        beta[last][i] = if scaling[last] != 0.0 {
            1.0 / scaling[last]
        } else {
            0.0
        };
    }

    for t in (0..last).rev() {
        for i in 0..n {
            let mut mass = 0.0;
            for j in 0..n {
                mass += transition[i][j]
                    * model.emission(j).log_pdf(&observations[t + 1]).exp()
                    * beta[t + 1][j];
            }
            beta[t][i] = if scaling[t] != 0.0 {
                mass / scaling[t]
            } else {
                0.0
            };
        }
    }

    guard_lattice_nan(&beta, "scaled backward");
    Ok(beta)
}

/// Log-domain forward recurrence.
pub fn forward_log<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
) -> Result<LogForward, HmmError> {
    model.check_sequence(observations)?;
    let steps = observations.len();
    let n = model.num_states();
    if steps == 0 {
        return Ok(LogForward {
            log_alpha: Vec::new(),
            log_likelihood: f64::NEG_INFINITY,
        });
    }

    let mut log_alpha = vec![vec![f64::NEG_INFINITY; n]; steps];

    for i in 0..n {
        log_alpha[0][i] = model.log_initial()[i] + model.emission(i).log_pdf(&observations[0]);
    }

    for t in 1..steps {
        for i in 0..n {
            let mut acc = StreamingLogSumExp::new();
            for j in 0..n {
                acc.push(log_alpha[t - 1][j] + model.log_transition_row(j)[i]);
            }
            log_alpha[t][i] = acc.value() + model.emission(i).log_pdf(&observations[t]);
        }
    }

    let log_likelihood = log_sum_exp(&log_alpha[steps - 1]);
    guard_lattice_nan(&log_alpha, "log forward");
    Ok(LogForward {
        log_alpha,
        log_likelihood,
    })
}

/// Log-domain backward recurrence (no scaling).
pub fn backward_log<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
) -> Result<Vec<Vec<f64>>, HmmError> {
    model.check_sequence(observations)?;
    let steps = observations.len();
    let n = model.num_states();
    if steps == 0 {
        return Ok(Vec::new());
    }

    let mut log_beta = vec![vec![0.0; n]; steps];

    for t in (0..steps - 1).rev() {
        for i in 0..n {
            let mut acc = StreamingLogSumExp::new();
            for j in 0..n {
                acc.push(
                    log_beta[t + 1][j]
                        + model.log_transition_row(i)[j]
                        + model.emission(j).log_pdf(&observations[t + 1]),
                );
            }
            log_beta[t][i] = acc.value();
        }
    }

    guard_lattice_nan(&log_beta, "log backward");
    Ok(log_beta)
}

/// Sequence log-likelihood recovered from the backward lattice alone:
/// `logSum_i (lnβ_0[i] + logπ[i] + logB_i(O_0))`.
pub fn log_likelihood_from_backward<E: Emission>(
    model: &HiddenMarkov<E>,
    observations: &[E::Obs],
    log_beta: &[Vec<f64>],
) -> Result<f64, HmmError> {
    if log_beta.len() != observations.len() {
        return Err(HmmError::ShapeMismatch {
            expected: observations.len(),
            got: log_beta.len(),
        });
    }
    if observations.is_empty() {
        return Ok(f64::NEG_INFINITY);
    }
    let mut acc = StreamingLogSumExp::new();
    for (i, beta_0) in log_beta[0].iter().enumerate() {
        acc.push(beta_0 + model.log_initial()[i] + model.emission(i).log_pdf(&observations[0]));
    }
    Ok(acc.value())
}
