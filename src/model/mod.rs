// Magic Wand - Gesture Model
//
// Versioned model artifact, the fixed tensor arena and the runner that
// turns one full sample window into a score per class.

pub mod arena;
pub mod artifact;
pub mod error;
pub mod ops;
pub mod runner;

#[cfg(test)]
pub(crate) mod builder;

pub use arena::TensorArena;
pub use artifact::{OpKind, OpResolver, TensorSpec};
pub use error::{InferenceError, SetupError};
pub use runner::ModelRunner;

use crate::buffer::SampleBuffer;
use crate::events::Scores;

/// The classifier as seen by the sampling loop.
pub trait GestureModel<const W: usize> {
    fn infer(&mut self, window: &SampleBuffer<W>) -> Result<Scores, InferenceError>;
}

impl<M: GestureModel<W> + ?Sized, const W: usize> GestureModel<W> for &mut M {
    fn infer(&mut self, window: &SampleBuffer<W>) -> Result<Scores, InferenceError> {
        (**self).infer(window)
    }
}

/// The bundled three-gesture model (wing, ring, slope).
pub static MAGIC_WAND_MODEL: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/models/magic_wand.wand"));
