use generational_arena::Index;

use crate::node::LatentRef;

/// Per-simulation-round record of where each root's traversal stopped.
///
/// `latent_refs[i]` is the *parent* state of root `i`'s reached leaf — the
/// model input for the next inference round — paired with `last_actions[i]`,
/// the action that led to the leaf. Node and path entries are arena indices
/// into root `i`'s own tree; the batch is consumed by the matching
/// `batch_backpropagate` call and then discarded.
#[derive(Debug, Default)]
pub struct SearchResults {
    pub latent_refs: Vec<LatentRef>,
    pub last_actions: Vec<usize>,
    pub search_lens: Vec<usize>,
    pub virtual_to_play: Vec<i32>,
    pub nodes: Vec<Index>,
    pub search_paths: Vec<Vec<Index>>,
}

impl SearchResults {
    pub fn with_capacity(num: usize) -> Self {
        Self {
            latent_refs: Vec::with_capacity(num),
            last_actions: Vec::with_capacity(num),
            search_lens: Vec::with_capacity(num),
            virtual_to_play: Vec::with_capacity(num),
            nodes: Vec::with_capacity(num),
            search_paths: Vec::with_capacity(num),
        }
    }

    pub fn num(&self) -> usize {
        self.nodes.len()
    }
}
