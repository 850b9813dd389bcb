// Magic Wand - Tensor Arena
//
// The one block of memory every activation tensor is carved from. It is
// handed to the runner once at startup and never grows.

use core::mem::size_of;

const WORD: usize = size_of::<f32>();

pub struct TensorArena<'a> {
    words: &'a mut [f32],
}

impl<'a> TensorArena<'a> {
    pub fn new(words: &'a mut [f32]) -> Self {
        Self { words }
    }

    /// Leak a zeroed arena of `bytes` (rounded down to whole words) for the
    /// lifetime of the program. Meant to be called once from `main`.
    pub fn leak(bytes: usize) -> TensorArena<'static> {
        TensorArena::new(vec![0.0f32; bytes / WORD].leak())
    }

    pub fn capacity_bytes(&self) -> usize {
        self.words.len() * WORD
    }

    pub(crate) fn capacity_words(&self) -> usize {
        self.words.len()
    }

    pub(crate) fn words_mut(&mut self) -> &mut [f32] {
        &mut *self.words
    }

    #[cfg(test)]
    pub(crate) fn words(&self) -> &[f32] {
        &*self.words
    }
}

/// Where each tensor of a linear operator chain lives. Tensor `i` (the
/// input is tensor 0, operator `k` writes tensor `k + 1`) sits at the start
/// of slot `i % 2`, so an operator always reads one slot and writes the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlan {
    /// Words reserved for even tensors; odd tensors start right after.
    pub even_words: usize,
    pub odd_words: usize,
}

impl SlotPlan {
    /// Plan for tensors of the given element counts, in execution order.
    pub fn for_tensors(lens: impl IntoIterator<Item = usize>) -> Self {
        let mut plan = SlotPlan {
            even_words: 0,
            odd_words: 0,
        };
        for (i, len) in lens.into_iter().enumerate() {
            let slot = if i % 2 == 0 {
                &mut plan.even_words
            } else {
                &mut plan.odd_words
            };
            *slot = (*slot).max(len);
        }
        plan
    }

    pub fn required_words(&self) -> usize {
        self.even_words + self.odd_words
    }

    pub fn required_bytes(&self) -> usize {
        self.required_words() * WORD
    }

    /// Word offset of tensor `index`.
    pub fn offset(&self, index: usize) -> usize {
        if index % 2 == 0 {
            0
        } else {
            self.even_words
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_reported_in_bytes() {
        let mut words = [0.0f32; 32];
        let arena = TensorArena::new(&mut words);
        assert_eq!(arena.capacity_bytes(), 128);
        assert_eq!(arena.capacity_words(), 32);
    }

    #[test]
    fn leaked_arena_rounds_down_to_words() {
        let arena = TensorArena::leak(1027);
        assert_eq!(arena.capacity_bytes(), 1024);
        assert!(arena.words().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn slots_are_sized_by_their_largest_tensor() {
        let plan = SlotPlan::for_tensors([384, 384, 726, 90, 4, 4]);
        assert_eq!(plan.even_words, 726);
        assert_eq!(plan.odd_words, 384);
        assert_eq!(plan.required_bytes(), 4 * 1110);
        assert_eq!(plan.offset(0), 0);
        assert_eq!(plan.offset(3), 726);
    }

    #[test]
    fn single_tensor_needs_one_slot() {
        let plan = SlotPlan::for_tensors([10]);
        assert_eq!(plan.required_words(), 10);
    }
}
