// Magic Wand - Model Runner
//
// Owns the parsed graph and the tensor arena. Everything that can go wrong
// with the model itself is caught in `initialize`; after that a pass can
// only fail on bad input or a numeric blow-up.

use log::{debug, info};

use super::arena::{SlotPlan, TensorArena};
use super::artifact::{Graph, OpResolver, TensorSpec};
use super::error::{InferenceError, SetupError};
use super::ops;
use super::GestureModel;
use crate::buffer::SampleBuffer;
use crate::config::{CHANNELS, CLASS_COUNT};
use crate::events::Scores;

pub struct ModelRunner<'a, const W: usize> {
    graph: Graph<'a>,
    arena: TensorArena<'a>,
    plan: SlotPlan,
}

impl<'a, const W: usize> ModelRunner<'a, W> {
    /// The only input tensor this runner accepts: one window of `W`
    /// samples by three axes, float32.
    pub fn expected_input() -> TensorSpec {
        TensorSpec::float32(&[1, W as u32, CHANNELS as u32, 1])
    }

    /// Load `artifact` with the standard operator set.
    pub fn initialize(artifact: &'a [u8], arena: TensorArena<'a>) -> Result<Self, SetupError> {
        Self::initialize_with(artifact, arena, &OpResolver::magic_wand())
    }

    pub fn initialize_with(
        artifact: &'a [u8],
        arena: TensorArena<'a>,
        resolver: &OpResolver,
    ) -> Result<Self, SetupError> {
        let graph = Graph::parse(artifact, &Self::expected_input(), resolver)?;

        let produced = graph.output_shape().len();
        if produced != CLASS_COUNT {
            return Err(SetupError::OutputShapeMismatch {
                expected: CLASS_COUNT,
                found: produced,
            });
        }
        if graph.output_len != produced {
            return Err(SetupError::OutputShapeMismatch {
                expected: graph.output_len,
                found: produced,
            });
        }

        let plan = SlotPlan::for_tensors(graph.tensor_lens());
        if plan.required_words() > arena.capacity_words() {
            return Err(SetupError::ArenaTooSmall {
                required: plan.required_bytes(),
                available: arena.capacity_bytes(),
            });
        }

        for (i, layer) in graph.layers.iter().enumerate() {
            debug!(
                "op {i}: {} {}x{}x{} -> {}x{}x{}",
                layer.op.kind(),
                layer.input.h,
                layer.input.w,
                layer.input.c,
                layer.output.h,
                layer.output.w,
                layer.output.c
            );
        }
        info!(
            "Model v{} ready: {} ops, arena {}/{} bytes",
            graph.version,
            graph.layers.len(),
            plan.required_bytes(),
            arena.capacity_bytes()
        );

        Ok(Self { graph, arena, plan })
    }

    /// Run one forward pass over a full window.
    pub fn infer(&mut self, window: &SampleBuffer<W>) -> Result<Scores, InferenceError> {
        if !window.is_full() {
            return Err(InferenceError::IncompleteWindow {
                have: window.len(),
                need: W,
            });
        }

        let (even, odd) = self.arena.words_mut().split_at_mut(self.plan.even_words);
        window.write_interleaved(&mut even[..self.graph.input.len()]);

        for (index, layer) in self.graph.layers.iter().enumerate() {
            let (src, dst) = if index % 2 == 0 {
                (&even[..], &mut odd[..])
            } else {
                (&odd[..], &mut even[..])
            };
            let dst = &mut dst[..layer.output.len()];
            ops::eval(layer, &src[..layer.input.len()], dst);

            if !dst.iter().all(|v| v.is_finite()) {
                return Err(InferenceError::InvocationFailed {
                    index,
                    op: layer.op.kind(),
                });
            }
        }

        let last = if self.graph.layers.len() % 2 == 0 { even } else { odd };
        let mut scores = [0.0; CLASS_COUNT];
        scores.copy_from_slice(&last[..CLASS_COUNT]);
        Ok(Scores(scores))
    }

    /// Bytes of the arena actually used by the tensor plan.
    pub fn arena_used_bytes(&self) -> usize {
        self.plan.required_bytes()
    }

    pub fn arena_capacity_bytes(&self) -> usize {
        self.arena.capacity_bytes()
    }

    pub fn operator_count(&self) -> usize {
        self.graph.layers.len()
    }

    pub fn output_len(&self) -> usize {
        self.graph.output_len
    }
}

impl<const W: usize> GestureModel<W> for ModelRunner<'_, W> {
    fn infer(&mut self, window: &SampleBuffer<W>) -> Result<Scores, InferenceError> {
        ModelRunner::infer(self, window)
    }
}
