// /src/errors.rs
//! Error taxonomy for integration mistakes: every variant is deterministic for a given input
use crate::types::{ElementSlot, Identity, IdentityScope};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlocksError {
    #[error("No model backs {slot}")]
    InvalidModel { slot: ElementSlot },

    #[error("No view is registered for component type '{component}'")]
    ViewNotRegistered { component: &'static str },

    #[error("View dequeued for '{reuse_identifier}' does not implement ComponentView")]
    InvalidViewClass { reuse_identifier: String },

    #[error("Type mismatch: expected component '{expected}', got '{actual}'")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Duplicate identity '{identity}' in {scope} at indices {first} and {second}")]
    DuplicateIdentity {
        identity: Identity,
        scope: IdentityScope,
        first: usize,
        second: usize,
    },

    #[error("Invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

// Slot lookup that turns a missing model into `InvalidModel`.
macro_rules! slot_get {
    ($lookup:expr, $slot:expr) => {{
        ($lookup).ok_or_else(|| $crate::errors::BlocksError::InvalidModel { slot: $slot })?
    }};
}
