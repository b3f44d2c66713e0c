//! Hidden Markov model parameters.
//!
//! A model is the triple (π, A, B): a log initial-state distribution, a
//! log transition matrix whose row i is the log-distribution over next
//! states given state i, and one emission distribution per state. Models
//! are immutable after construction and freely shared across concurrent
//! readers; every inference call allocates its own lattices.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::emission::Emission;
use crate::error::HmmError;
use crate::forward_backward;
use crate::viterbi;

/// Row normalization drift beyond this is reported via `tracing::warn!`.
const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// Which quantity [`HiddenMarkov::log_likelihood`] reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikelihoodMethod {
    /// Full-evidence log-likelihood from the forward recurrence.
    #[default]
    Forward,
    /// Log-likelihood of the single best state path.
    Viterbi,
}

/// Immutable HMM parameters with state-conditioned emissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenMarkov<E> {
    log_initial: Vec<f64>,
    log_transition: Vec<Vec<f64>>,
    emissions: Vec<E>,
    method: LikelihoodMethod,
}

impl<E: Emission> HiddenMarkov<E> {
    /// Build a model from log-domain parameters.
    ///
    /// Shapes are validated hard (`|π| = N`, `A ∈ ℝ^{N×N}`, `|B| = N`,
    /// N ≥ 1). Normalization is *not* enforced: rows that do not
    /// log-sum-exp to zero produce a warning and are otherwise the
    /// caller's problem — see [`normalization_defect`].
    ///
    /// [`normalization_defect`]: HiddenMarkov::normalization_defect
    pub fn from_logs(
        log_initial: Vec<f64>,
        log_transition: Vec<Vec<f64>>,
        emissions: Vec<E>,
    ) -> Result<Self, HmmError> {
        let n = log_initial.len();
        if n == 0 {
            return Err(HmmError::InvalidModel(
                "model needs at least one state".into(),
            ));
        }
        if log_transition.len() != n {
            return Err(HmmError::ShapeMismatch {
                expected: n,
                got: log_transition.len(),
            });
        }
        for row in &log_transition {
            if row.len() != n {
                return Err(HmmError::ShapeMismatch {
                    expected: n,
                    got: row.len(),
                });
            }
        }
        if emissions.len() != n {
            return Err(HmmError::ShapeMismatch {
                expected: n,
                got: emissions.len(),
            });
        }

        let model = Self {
            log_initial,
            log_transition,
            emissions,
            method: LikelihoodMethod::default(),
        };
        let defect = model.normalization_defect();
        if defect > NORMALIZATION_TOLERANCE {
            warn!(
                defect,
                "model rows are not normalized; inference proceeds on the parameters as given"
            );
        }
        Ok(model)
    }

    /// Build a model from probability-domain parameters, taking logs
    /// elementwise. Zeros map to `NEG_INFINITY`.
    pub fn from_probabilities(
        initial: &[f64],
        transition: &[Vec<f64>],
        emissions: Vec<E>,
    ) -> Result<Self, HmmError> {
        Self::from_logs(
            seq_math::ln_vec(initial),
            seq_math::ln_matrix(transition),
            emissions,
        )
    }

    /// Select which quantity `log_likelihood` reports.
    pub fn with_method(mut self, method: LikelihoodMethod) -> Self {
        self.method = method;
        self
    }

    /// Number of hidden states N.
    pub fn num_states(&self) -> usize {
        self.log_initial.len()
    }

    /// Log initial-state distribution π.
    pub fn log_initial(&self) -> &[f64] {
        &self.log_initial
    }

    /// Log transition matrix A (row i = log-distribution given state i).
    pub fn log_transition(&self) -> &[Vec<f64>] {
        &self.log_transition
    }

    /// Row i of the log transition matrix.
    pub fn log_transition_row(&self, state: usize) -> &[f64] {
        &self.log_transition[state]
    }

    /// Per-state emission distributions B.
    pub fn emissions(&self) -> &[E] {
        &self.emissions
    }

    /// Emission distribution of one state.
    pub fn emission(&self, state: usize) -> &E {
        &self.emissions[state]
    }

    /// The active likelihood method selector.
    pub fn method(&self) -> LikelihoodMethod {
        self.method
    }

    /// Worst absolute log-sum-exp drift from zero across π and the rows
    /// of A. Exactly normalized inputs report 0.0.
    pub fn normalization_defect(&self) -> f64 {
        let mut defect = seq_math::log_sum_exp(&self.log_initial).abs();
        for row in &self.log_transition {
            defect = defect.max(seq_math::log_sum_exp(row).abs());
        }
        defect
    }

    /// Validate every observation of a sequence against every state's
    /// emission shape.
    pub fn check_sequence(&self, observations: &[E::Obs]) -> Result<(), HmmError> {
        for obs in observations {
            for emission in &self.emissions {
                emission.check(obs)?;
            }
        }
        Ok(())
    }

    /// Sequence log-likelihood under the active method selector.
    pub fn log_likelihood(&self, observations: &[E::Obs]) -> Result<f64, HmmError> {
        match self.method {
            LikelihoodMethod::Forward => {
                Ok(forward_backward::forward_log(self, observations)?.log_likelihood)
            }
            LikelihoodMethod::Viterbi => Ok(viterbi::decode(self, observations)?.log_likelihood),
        }
    }

    /// Per-sequence log-likelihoods for a batch.
    pub fn log_likelihoods(&self, sequences: &[Vec<E::Obs>]) -> Result<Vec<f64>, HmmError> {
        sequences
            .iter()
            .map(|seq| self.log_likelihood(seq))
            .collect()
    }

    /// Summed batch log-likelihood, as a convenience over
    /// [`log_likelihoods`](HiddenMarkov::log_likelihoods).
    pub fn total_log_likelihood(&self, sequences: &[Vec<E::Obs>]) -> Result<f64, HmmError> {
        Ok(self.log_likelihoods(sequences)?.iter().sum())
    }
}
