//! Fuzz target for model JSON deserialization.
//!
//! Tests that deserializing arbitrary input as a model handles any byte
//! stream without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use seq_hmm::{DiscreteEmission, HiddenMarkov};

fuzz_target!(|data: &[u8]| {
    // Should never panic, only return an error.
    let _ = serde_json::from_slice::<HiddenMarkov<DiscreteEmission>>(data);
});
