use anyhow::{ensure, Result};
use generational_arena::{Arena, Index};

use common::softmax;

use crate::node::{LatentRef, SearchNode};

/// One root's search tree: nodes live in an arena and refer to each other
/// by index, so paths recorded during traversal are plain index lists.
/// Dropping or rebuilding the tree releases the whole subtree at once.
#[derive(Debug)]
pub struct SearchTree {
    arena: Arena<SearchNode>,
    root: Index,
}

impl SearchTree {
    pub fn new(legal_actions: Vec<usize>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(SearchNode::new(0.0, legal_actions));

        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn node(&self, index: Index) -> &SearchNode {
        &self.arena[index]
    }

    pub(crate) fn node_mut(&mut self, index: Index) -> &mut SearchNode {
        &mut self.arena[index]
    }

    /// Converts an unexpanded node into an internal node with one child per
    /// legal action, priors taken from a softmax over the legal subset of
    /// `policy_logits`. A node without a legal-action set treats every
    /// policy index as legal.
    pub fn expand(
        &mut self,
        index: Index,
        to_play: i32,
        latent_ref: LatentRef,
        value_prefix: f32,
        policy_logits: &[f32],
    ) -> Result<()> {
        let node = &self.arena[index];
        ensure!(!node.expanded(), "Node is already expanded");

        let mut legal_actions = node.legal_actions.clone();
        if legal_actions.is_empty() {
            legal_actions = (0..policy_logits.len()).collect();
        }

        for &action in legal_actions.iter() {
            ensure!(
                action < policy_logits.len(),
                "Legal action {} is out of range for {} policy logits",
                action,
                policy_logits.len()
            );
        }

        let legal_logits: Vec<f32> = legal_actions.iter().map(|&a| policy_logits[a]).collect();
        let priors = softmax(&legal_logits);

        let mut children = Vec::with_capacity(legal_actions.len());
        for (&action, prior) in legal_actions.iter().zip(priors) {
            let child = self.arena.insert(SearchNode::new(prior, Vec::new()));
            children.push((action, child));
        }

        let node = &mut self.arena[index];
        node.to_play = to_play;
        node.latent_ref = Some(latent_ref);
        node.value_prefix = value_prefix;
        node.legal_actions = legal_actions;
        node.children = children;

        Ok(())
    }

    /// Mixes caller-supplied noise into the priors of an expanded node:
    /// `prior' = (1 - fraction) * prior + fraction * noise`.
    pub fn add_exploration_noise(
        &mut self,
        index: Index,
        exploration_fraction: f32,
        noises: &[f32],
    ) -> Result<()> {
        let node = &self.arena[index];
        ensure!(node.expanded(), "Exploration noise requires an expanded node");
        ensure!(
            noises.len() == node.children.len(),
            "Expected {} noise values but received {}",
            node.children.len(),
            noises.len()
        );

        let child_indexes: Vec<Index> = node.children.iter().map(|&(_, index)| index).collect();

        for (child_index, &noise) in child_indexes.into_iter().zip(noises) {
            let child = &mut self.arena[child_index];
            child.prior = (1.0 - exploration_fraction) * child.prior + exploration_fraction * noise;
        }

        Ok(())
    }

    /// Realized action sequence: the `best_action` chain from the root.
    pub fn trajectory(&self) -> Vec<usize> {
        let mut trajectory = Vec::new();
        let mut node = &self.arena[self.root];

        while let Some(action) = node.best_action {
            trajectory.push(action);

            match node.child_of(action) {
                Some(child_index) => node = &self.arena[child_index],
                None => break,
            }
        }

        trajectory
    }

    /// Root child visit counts in legal-action order; empty until the root
    /// is expanded.
    pub fn distribution(&self) -> Vec<usize> {
        let root = &self.arena[self.root];

        root.children
            .iter()
            .map(|&(_, index)| self.arena[index].visit_count)
            .collect()
    }

    pub fn root_value(&self) -> f32 {
        self.arena[self.root].value()
    }
}
