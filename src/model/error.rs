// Magic Wand - Model Errors

use thiserror::Error;

use super::artifact::{OpKind, TensorSpec};

/// Fatal problems found while bringing the model up. None of these can be
/// fixed at runtime; the firmware reports them once and stays out of the
/// sampling loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("model artifact does not start with the WAND magic")]
    BadMagic,

    #[error("model artifact truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("model provided is schema version {found} not equal to supported version {supported}")]
    SchemaVersionMismatch { found: u32, supported: u32 },

    #[error("bad input tensor parameters in model: found {found}, expected {expected}")]
    InputShapeMismatch { expected: TensorSpec, found: TensorSpec },

    #[error("operator {index} has opcode {opcode}, which is not registered")]
    UnsupportedOperator { index: usize, opcode: u32 },

    #[error("operator {index} is invalid: {reason}")]
    InvalidOperator { index: usize, reason: &'static str },

    #[error("model has more than {max} operators")]
    TooManyOperators { max: usize },

    #[error("malformed model artifact: {0}")]
    Malformed(&'static str),

    #[error("model produces {found} scores, expected {expected}")]
    OutputShapeMismatch { expected: usize, found: usize },

    #[error("tensor arena too small: {required} bytes required, {available} available")]
    ArenaTooSmall { required: usize, available: usize },
}

/// Per-pass failures. The frame is dropped and the loop carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("window holds {have} samples, {need} needed")]
    IncompleteWindow { have: usize, need: usize },

    #[error("invoke failed on operator {index} ({op}): non-finite activation")]
    InvocationFailed { index: usize, op: OpKind },
}
