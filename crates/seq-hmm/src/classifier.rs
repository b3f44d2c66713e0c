//! Multi-class sequence classification over a bank of per-class models.
//!
//! Each class contributes `logπ_c + log P(O | model_c)` under its model's
//! active likelihood method; a softmax turns the bank's scores into class
//! posteriors. An optional threshold model appends a rejection entry: its
//! bare log-likelihood acts as a floor that every class must clear, and
//! the extended posterior vector still sums to one.

use serde::Serialize;
use tracing::warn;

use seq_math::log_sum_exp;

use crate::emission::Emission;
use crate::error::HmmError;
use crate::model::HiddenMarkov;

/// Outcome of a classification decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The winning class index.
    Class(usize),
    /// The rejection entry won against every class.
    Rejected,
}

impl Decision {
    /// Signed index form: the class index, or `-1` for rejection.
    pub fn index(&self) -> isize {
        match self {
            Decision::Class(c) => *c as isize,
            Decision::Rejected => -1,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Decision::Rejected)
    }
}

/// Bank of per-class models with prior weights and an optional
/// rejection threshold model.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceClassifier<E> {
    models: Vec<HiddenMarkov<E>>,
    log_priors: Vec<f64>,
    threshold: Option<HiddenMarkov<E>>,
}

impl<E: Emission> SequenceClassifier<E> {
    /// Build a classifier with uniform class priors.
    pub fn new(models: Vec<HiddenMarkov<E>>) -> Result<Self, HmmError> {
        if models.is_empty() {
            return Err(HmmError::EmptyModels);
        }
        let uniform = (1.0 / models.len() as f64).ln();
        let log_priors = vec![uniform; models.len()];
        Ok(Self {
            models,
            log_priors,
            threshold: None,
        })
    }

    /// Replace the class priors (probability domain).
    pub fn with_priors(mut self, priors: &[f64]) -> Result<Self, HmmError> {
        if priors.len() != self.models.len() {
            return Err(HmmError::ShapeMismatch {
                expected: self.models.len(),
                got: priors.len(),
            });
        }
        let log_priors = seq_math::ln_vec(priors);
        let defect = log_sum_exp(&log_priors).abs();
        if defect > 1e-6 {
            warn!(defect, "class priors are not normalized");
        }
        self.log_priors = log_priors;
        Ok(self)
    }

    /// Attach a rejection threshold model.
    pub fn with_threshold(mut self, model: HiddenMarkov<E>) -> Self {
        self.threshold = Some(model);
        self
    }

    /// Number of classes K.
    pub fn num_classes(&self) -> usize {
        self.models.len()
    }

    /// The per-class models.
    pub fn models(&self) -> &[HiddenMarkov<E>] {
        &self.models
    }

    /// Log class priors.
    pub fn log_priors(&self) -> &[f64] {
        &self.log_priors
    }

    /// The threshold model, if attached.
    pub fn threshold(&self) -> Option<&HiddenMarkov<E>> {
        self.threshold.as_ref()
    }

    /// `logπ_c + log P(O | model_c)` per class, under each model's
    /// active likelihood method.
    pub fn log_likelihood_per_class(&self, observations: &[E::Obs]) -> Result<Vec<f64>, HmmError> {
        self.models
            .iter()
            .zip(&self.log_priors)
            .map(|(model, prior)| Ok(prior + model.log_likelihood(observations)?))
            .collect()
    }

    /// Prior-weighted scores plus, when a threshold model is attached,
    /// one trailing rejection entry.
    fn scores(&self, observations: &[E::Obs]) -> Result<Vec<f64>, HmmError> {
        let mut scores = self.log_likelihood_per_class(observations)?;
        if let Some(threshold) = &self.threshold {
            scores.push(threshold.log_likelihood(observations)?);
        }
        Ok(scores)
    }

    /// Class posteriors by softmax over the prior-weighted scores.
    ///
    /// With a threshold model the returned vector has K+1 entries, the
    /// last being the rejection probability; it always sums to one.
    /// Evidence that is `-inf` everywhere carries no information and
    /// yields a uniform vector.
    pub fn probabilities(&self, observations: &[E::Obs]) -> Result<Vec<f64>, HmmError> {
        let scores = self.scores(observations)?;
        let evidence = log_sum_exp(&scores);
        if evidence == f64::NEG_INFINITY {
            warn!("all class scores are -inf; posteriors fall back to uniform");
            return Ok(vec![1.0 / scores.len() as f64; scores.len()]);
        }
        Ok(scores.iter().map(|s| (s - evidence).exp()).collect())
    }

    /// Decide the class of a sequence, or reject it when the threshold
    /// entry outscores every class.
    pub fn decide(&self, observations: &[E::Obs]) -> Result<Decision, HmmError> {
        let scores = self.scores(observations)?;
        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }
        if self.threshold.is_some() && best == self.models.len() {
            Ok(Decision::Rejected)
        } else {
            Ok(Decision::Class(best))
        }
    }

    /// Per-sequence evidence `logSum_c (logπ_c + log P(O | model_c))`
    /// for a batch.
    pub fn log_likelihoods(&self, sequences: &[Vec<E::Obs>]) -> Result<Vec<f64>, HmmError> {
        sequences
            .iter()
            .map(|seq| Ok(log_sum_exp(&self.log_likelihood_per_class(seq)?)))
            .collect()
    }

    /// Summed batch evidence, as a convenience over
    /// [`log_likelihoods`](SequenceClassifier::log_likelihoods).
    pub fn total_log_likelihood(&self, sequences: &[Vec<E::Obs>]) -> Result<f64, HmmError> {
        Ok(self.log_likelihoods(sequences)?.iter().sum())
    }
}
