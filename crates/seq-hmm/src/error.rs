//! Error types for HMM inference operations.
//!
//! Every fallible operation reports to the caller; there is no silent
//! fallback. Empty observation sequences are deliberately *not* errors —
//! inference on a zero-length sequence yields a `NEG_INFINITY`
//! log-likelihood and empty lattices.

use thiserror::Error;

/// Errors from model construction and inference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HmmError {
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("symbol {symbol} is outside the alphabet [0, {alphabet_size})")]
    InvalidSymbol { symbol: usize, alphabet_size: usize },

    #[error("state {state} is outside [0, {num_states})")]
    StateOutOfRange { state: usize, num_states: usize },

    #[error("emission for state {state} does not support {capability}")]
    CapabilityMissing {
        state: usize,
        capability: &'static str,
    },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("classifier requires at least one model")]
    EmptyModels,

    #[error("prediction horizon must be at least 1")]
    ZeroHorizon,
}
