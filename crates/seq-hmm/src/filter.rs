//! Online forward filtering with constant per-observation cost.
//!
//! The filter consumes one observation at a time, maintaining the current
//! log-forward vector in place. Each `push` is O(N²) and allocates
//! nothing beyond the buffers created at construction. A filter belongs
//! to a single logical stream; the serial order of `push` calls defines
//! its semantics.

use seq_math::{log_sum_exp, StreamingLogSumExp};

use crate::emission::Emission;
use crate::error::HmmError;
use crate::model::HiddenMarkov;

/// Lifecycle of the filter: no observation consumed yet, or running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Running,
}

/// Derived scores of the current forward vector, recomputed on every
/// mutating call and dropped by [`RunningFilter::clear`].
#[derive(Debug, Clone, Copy)]
struct Scores {
    state: usize,
    log_best_state: f64,
    log_forward: f64,
}

/// Streaming filter over a borrowed model.
#[derive(Debug)]
pub struct RunningFilter<'m, E: Emission> {
    model: &'m HiddenMarkov<E>,
    phase: Phase,
    current: Vec<f64>,
    previous: Vec<f64>,
    scratch: Vec<f64>,
    scores: Option<Scores>,
}

impl<'m, E: Emission> RunningFilter<'m, E> {
    /// A fresh filter for `model`.
    pub fn new(model: &'m HiddenMarkov<E>) -> Self {
        let n = model.num_states();
        Self {
            model,
            phase: Phase::Fresh,
            current: vec![f64::NEG_INFINITY; n],
            previous: vec![f64::NEG_INFINITY; n],
            scratch: vec![f64::NEG_INFINITY; n],
            scores: None,
        }
    }

    /// Whether any observation has been consumed since construction or
    /// the last [`clear`](RunningFilter::clear).
    pub fn is_fresh(&self) -> bool {
        self.phase == Phase::Fresh
    }

    /// One forward step of the recurrence, writing into `out`.
    fn step_into(&self, out: &mut [f64], previous: &[f64], obs: &E::Obs, phase: Phase) {
        let n = self.model.num_states();
        match phase {
            Phase::Fresh => {
                for (i, value) in out.iter_mut().enumerate() {
                    *value =
                        self.model.log_initial()[i] + self.model.emission(i).log_pdf(obs);
                }
            }
            Phase::Running => {
                for (i, value) in out.iter_mut().enumerate() {
                    let mut acc = StreamingLogSumExp::new();
                    for j in 0..n {
                        acc.push(previous[j] + self.model.log_transition_row(j)[i]);
                    }
                    *value = acc.value() + self.model.emission(i).log_pdf(obs);
                }
            }
        }
    }

    /// Consume one observation, advancing the forward vector.
    pub fn push(&mut self, obs: &E::Obs) -> Result<(), HmmError> {
        for emission in self.model.emissions() {
            emission.check(obs)?;
        }
        if self.phase == Phase::Running {
            self.previous.copy_from_slice(&self.current);
        }
        let mut current = std::mem::take(&mut self.current);
        self.step_into(&mut current, &self.previous, obs, self.phase);
        self.current = current;
        self.phase = Phase::Running;
        self.scores = Some(self.compute_scores());
        Ok(())
    }

    /// Probe the log-forward score `push(obs)` would produce, without
    /// mutating the filter. Runs on a scratch vector.
    pub fn peek(&mut self, obs: &E::Obs) -> Result<f64, HmmError> {
        for emission in self.model.emissions() {
            emission.check(obs)?;
        }
        let mut scratch = std::mem::take(&mut self.scratch);
        self.step_into(&mut scratch, &self.current, obs, self.phase);
        let probe = log_sum_exp(&scratch);
        self.scratch = scratch;
        Ok(probe)
    }

    /// `logSum_i current[i]`: the log-likelihood of everything pushed so
    /// far. `NEG_INFINITY` while fresh.
    pub fn log_forward(&self) -> f64 {
        self.scores.map_or(f64::NEG_INFINITY, |s| s.log_forward)
    }

    /// Maximum entry of the current forward vector.
    ///
    /// This is an online approximation of the Viterbi score: the per-step
    /// maximum of the forward column, not the log-likelihood of the true
    /// best path.
    pub fn log_best_state(&self) -> f64 {
        self.scores.map_or(f64::NEG_INFINITY, |s| s.log_best_state)
    }

    /// Most likely current state, or `None` while fresh.
    pub fn current_state(&self) -> Option<usize> {
        self.scores.map(|s| s.state)
    }

    /// Return to the fresh state, clearing the forward vector.
    pub fn clear(&mut self) {
        self.phase = Phase::Fresh;
        self.current.fill(f64::NEG_INFINITY);
        self.previous.fill(f64::NEG_INFINITY);
        self.scores = None;
    }

    fn compute_scores(&self) -> Scores {
        let mut state = 0;
        for i in 1..self.current.len() {
            if self.current[i] > self.current[state] {
                state = i;
            }
        }
        Scores {
            state,
            log_best_state: self.current[state],
            log_forward: log_sum_exp(&self.current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emission::DiscreteEmission;
    use crate::forward_backward::forward_log;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn wiki_model() -> HiddenMarkov<DiscreteEmission> {
        HiddenMarkov::from_probabilities(
            &[0.6, 0.4],
            &[vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![
                DiscreteEmission::from_probabilities(&[0.1, 0.4, 0.5]).unwrap(),
                DiscreteEmission::from_probabilities(&[0.6, 0.3, 0.1]).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn sequential_pushes_match_batch_forward() {
        let model = wiki_model();
        let mut filter = RunningFilter::new(&model);
        for obs in [0usize, 1, 2] {
            filter.push(&obs).unwrap();
        }
        assert!(approx_eq(filter.log_forward(), -3.3928721329161653, 1e-10));

        // And on a longer stream, against the batch recurrence.
        filter.clear();
        let stream = [2usize, 0, 0, 1, 2, 1];
        for obs in &stream {
            filter.push(obs).unwrap();
        }
        let batch = forward_log(&model, &stream).unwrap();
        assert!(approx_eq(filter.log_forward(), batch.log_likelihood, 1e-10));
    }

    #[test]
    fn peek_probes_without_mutation() {
        let model = wiki_model();
        let mut filter = RunningFilter::new(&model);
        filter.push(&0).unwrap();
        filter.push(&1).unwrap();

        let before = filter.log_forward();
        let state_before = filter.current_state();

        let probe = filter.peek(&2).unwrap();
        assert!(approx_eq(filter.log_forward(), before, 1e-12));
        assert_eq!(filter.current_state(), state_before);

        // The probe equals what the real push then reports.
        filter.push(&2).unwrap();
        assert!(approx_eq(filter.log_forward(), probe, 1e-12));
    }

    #[test]
    fn peek_works_on_a_fresh_filter() {
        let model = wiki_model();
        let mut filter = RunningFilter::new(&model);
        let probe = filter.peek(&0).unwrap();
        // First-push evidence: logSum_i (logπ[i] + logB_i(0)).
        let expected = (0.6 * 0.1 + 0.4 * 0.6f64).ln();
        assert!(approx_eq(probe, expected, 1e-12));
        assert!(filter.is_fresh());
    }

    #[test]
    fn best_state_score_bounds_the_forward_score() {
        let model = wiki_model();
        let mut filter = RunningFilter::new(&model);
        for obs in [0usize, 1, 2] {
            filter.push(&obs).unwrap();
            assert!(filter.log_best_state() <= filter.log_forward());
        }
        assert_eq!(filter.current_state(), Some(0));
    }

    #[test]
    fn clear_returns_to_fresh() {
        let model = wiki_model();
        let mut filter = RunningFilter::new(&model);
        filter.push(&0).unwrap();
        assert!(!filter.is_fresh());

        filter.clear();
        assert!(filter.is_fresh());
        assert!(filter.log_forward().is_infinite() && filter.log_forward() < 0.0);
        assert_eq!(filter.current_state(), None);

        // A cleared filter restarts from the initial distribution.
        filter.push(&0).unwrap();
        let mut other = RunningFilter::new(&model);
        other.push(&0).unwrap();
        assert!(approx_eq(filter.log_forward(), other.log_forward(), 1e-12));
    }

    #[test]
    fn invalid_symbol_bubbles_up_unchanged() {
        let model = wiki_model();
        let mut filter = RunningFilter::new(&model);
        filter.push(&0).unwrap();
        let before = filter.log_forward();

        assert!(matches!(
            filter.push(&9),
            Err(HmmError::InvalidSymbol { .. })
        ));
        // A rejected push leaves the filter state untouched.
        assert!(approx_eq(filter.log_forward(), before, 1e-12));
    }
}
