//! Hidden Markov model inference and streaming sequence classification.
//!
//! The crate provides the four canonical HMM operations over a finite
//! -state chain with state-conditioned emissions — likelihood evaluation,
//! Viterbi decoding, smoothed posteriors, and short-horizon prediction or
//! generation — plus an online filter with constant per-observation cost
//! and a multi-class sequence classifier with optional rejection.
//!
//! Models are immutable after construction and safe to share across
//! concurrent readers; every one-shot inference call owns its lattices.
//! Training is out of scope: this crate consumes parameters, it does not
//! fit them.
//!
//! # Example
//!
//! ```
//! use seq_hmm::{DiscreteEmission, HiddenMarkov, viterbi};
//!
//! let model = HiddenMarkov::from_probabilities(
//!     &[0.6, 0.4],
//!     &[vec![0.7, 0.3], vec![0.4, 0.6]],
//!     vec![
//!         DiscreteEmission::from_probabilities(&[0.1, 0.4, 0.5]).unwrap(),
//!         DiscreteEmission::from_probabilities(&[0.6, 0.3, 0.1]).unwrap(),
//!     ],
//! )
//! .unwrap();
//!
//! let decoded = viterbi::decode(&model, &[0, 1, 2]).unwrap();
//! assert_eq!(decoded.states, vec![1, 0, 0]);
//! ```

pub mod classifier;
pub mod emission;
pub mod error;
pub mod filter;
pub mod forward_backward;
pub mod generate;
pub mod model;
pub mod posterior;
pub mod predict;
pub mod viterbi;

pub use classifier::{Decision, SequenceClassifier};
pub use emission::{DiagonalGaussianEmission, DiscreteEmission, Emission, GaussianEmission};
pub use error::HmmError;
pub use filter::RunningFilter;
pub use forward_backward::{
    backward_log, backward_scaled, forward_log, forward_scaled, log_likelihood_from_backward,
    LogForward, ScaledForward,
};
pub use generate::{generate, Generated};
pub use model::{HiddenMarkov, LikelihoodMethod};
pub use posterior::{posterior_decode, posteriors, PosteriorDecoding, Posteriors};
pub use predict::{mixture_log_pdf, predict, Prediction};
pub use viterbi::{decode, evaluate_path, ViterbiPath};
