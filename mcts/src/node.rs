use generational_arena::Index;

use common::div_or_zero;

/// `to_play` value used by single-player environments.
pub const SINGLE_PLAYER: i32 = -1;

/// Coordinates into the external latent-state cache: `row` is the
/// model-inference round the state was produced in, `column` the position
/// within that round's batch. The planner never inspects the state itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatentRef {
    pub row: usize,
    pub column: usize,
}

impl LatentRef {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A single arena-resident search tree node.
#[derive(Debug)]
pub struct SearchNode {
    pub(crate) visit_count: usize,
    pub(crate) to_play: i32,
    pub(crate) latent_ref: Option<LatentRef>,
    pub(crate) best_action: Option<usize>,
    pub(crate) is_reset: bool,
    pub(crate) value_prefix: f32,
    pub(crate) parent_value_prefix: f32,
    pub(crate) prior: f32,
    pub(crate) value_sum: f32,
    pub(crate) legal_actions: Vec<usize>,
    pub(crate) children: Vec<(usize, Index)>,
}

impl SearchNode {
    pub fn new(prior: f32, legal_actions: Vec<usize>) -> Self {
        Self {
            visit_count: 0,
            to_play: SINGLE_PLAYER,
            latent_ref: None,
            best_action: None,
            is_reset: false,
            value_prefix: 0.0,
            parent_value_prefix: 0.0,
            prior,
            value_sum: 0.0,
            legal_actions,
            children: Vec::new(),
        }
    }

    pub fn visit_count(&self) -> usize {
        self.visit_count
    }

    pub fn to_play(&self) -> i32 {
        self.to_play
    }

    pub fn latent_ref(&self) -> Option<LatentRef> {
        self.latent_ref
    }

    pub fn best_action(&self) -> Option<usize> {
        self.best_action
    }

    pub fn is_reset(&self) -> bool {
        self.is_reset
    }

    pub fn value_prefix(&self) -> f32 {
        self.value_prefix
    }

    pub fn parent_value_prefix(&self) -> f32 {
        self.parent_value_prefix
    }

    pub fn prior(&self) -> f32 {
        self.prior
    }

    pub fn legal_actions(&self) -> &[usize] {
        &self.legal_actions
    }

    /// Mean value estimate; 0 before the first completed simulation.
    pub fn value(&self) -> f32 {
        div_or_zero(self.value_sum, self.visit_count as f32)
    }

    pub fn expanded(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child_len(&self) -> usize {
        self.children.len()
    }

    /// Children in legal-action order.
    pub fn children(&self) -> impl Iterator<Item = (usize, Index)> + '_ {
        self.children.iter().copied()
    }

    pub fn child_of(&self, action: usize) -> Option<Index> {
        self.children
            .iter()
            .find(|&&(a, _)| a == action)
            .map(|&(_, index)| index)
    }
}

/// Player count implied by a batch of `to_play` values: the `-1` sentinel
/// throughout means single-player, anything else alternating two-player.
pub fn num_players(to_play_batch: &[i32]) -> usize {
    let largest = to_play_batch.iter().copied().max().unwrap_or(SINGLE_PLAYER);

    if largest == SINGLE_PLAYER {
        1
    } else {
        2
    }
}
