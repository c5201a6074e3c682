use anyhow::{ensure, Result};
use itertools::izip;
use log::debug;

use crate::node::LatentRef;
use crate::tree::SearchTree;

/// One search tree per environment instance in the batch, plus the
/// per-root legal-action sets supplied at construction and reused across
/// searches.
#[derive(Debug)]
pub struct RootCollection {
    trees: Vec<SearchTree>,
    legal_actions_list: Vec<Vec<usize>>,
}

impl RootCollection {
    pub fn new(root_num: usize, legal_actions_list: Vec<Vec<usize>>) -> Result<Self> {
        ensure!(
            root_num == legal_actions_list.len(),
            "Expected {} legal-action sets but received {}",
            root_num,
            legal_actions_list.len()
        );

        let trees = legal_actions_list
            .iter()
            .cloned()
            .map(SearchTree::new)
            .collect();

        Ok(Self {
            trees,
            legal_actions_list,
        })
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn tree(&self, index: usize) -> &SearchTree {
        &self.trees[index]
    }

    pub fn tree_mut(&mut self, index: usize) -> &mut SearchTree {
        &mut self.trees[index]
    }

    pub fn trees(&self) -> &[SearchTree] {
        &self.trees
    }

    /// Expands every root with the first-round model outputs and mixes
    /// exploration noise into the root priors. Latent refs are pinned to
    /// row 0, the initial inference round.
    pub fn prepare(
        &mut self,
        root_noise_weight: f32,
        noises: &[Vec<f32>],
        value_prefixes: &[f32],
        policies: &[Vec<f32>],
        to_play_batch: &[i32],
    ) -> Result<()> {
        self.validate_prepare(value_prefixes, policies, to_play_batch)?;
        ensure!(
            noises.len() == self.len(),
            "Expected {} noise vectors but received {}",
            self.len(),
            noises.len()
        );
        for (legal_actions, noise) in izip!(&self.legal_actions_list, noises) {
            ensure!(
                noise.len() == legal_actions.len(),
                "Expected {} noise values but received {}",
                legal_actions.len(),
                noise.len()
            );
        }

        for (i, tree) in self.trees.iter_mut().enumerate() {
            tree.expand(
                tree.root(),
                to_play_batch[i],
                LatentRef::new(0, i),
                value_prefixes[i],
                &policies[i],
            )?;
            tree.add_exploration_noise(tree.root(), root_noise_weight, &noises[i])?;
        }

        Ok(())
    }

    /// `prepare` without noise, for evaluation-time searches.
    pub fn prepare_no_noise(
        &mut self,
        value_prefixes: &[f32],
        policies: &[Vec<f32>],
        to_play_batch: &[i32],
    ) -> Result<()> {
        self.validate_prepare(value_prefixes, policies, to_play_batch)?;

        for (i, tree) in self.trees.iter_mut().enumerate() {
            tree.expand(
                tree.root(),
                to_play_batch[i],
                LatentRef::new(0, i),
                value_prefixes[i],
                &policies[i],
            )?;
        }

        Ok(())
    }

    /// Discards every subtree, returning the collection to its
    /// just-constructed state. The legal-action sets are retained.
    pub fn clear(&mut self) {
        debug!("Discarding {} search trees", self.trees.len());

        self.trees = self
            .legal_actions_list
            .iter()
            .cloned()
            .map(SearchTree::new)
            .collect();
    }

    /// Per-root visit-count histograms over the root's legal actions — the
    /// behavior-policy targets. A root that was never prepared yields an
    /// empty histogram.
    pub fn get_distributions(&self) -> Vec<Vec<usize>> {
        self.trees.iter().map(SearchTree::distribution).collect()
    }

    pub fn get_values(&self) -> Vec<f32> {
        self.trees.iter().map(SearchTree::root_value).collect()
    }

    /// Per-root realized action sequences, following each tree's
    /// `best_action` chain.
    pub fn get_trajectories(&self) -> Vec<Vec<usize>> {
        self.trees.iter().map(SearchTree::trajectory).collect()
    }

    fn validate_prepare(
        &self,
        value_prefixes: &[f32],
        policies: &[Vec<f32>],
        to_play_batch: &[i32],
    ) -> Result<()> {
        ensure!(
            value_prefixes.len() == self.len(),
            "Expected {} value prefixes but received {}",
            self.len(),
            value_prefixes.len()
        );
        ensure!(
            policies.len() == self.len(),
            "Expected {} policies but received {}",
            self.len(),
            policies.len()
        );
        ensure!(
            to_play_batch.len() == self.len(),
            "Expected {} to_play values but received {}",
            self.len(),
            to_play_batch.len()
        );

        for (tree, legal_actions, policy) in izip!(&self.trees, &self.legal_actions_list, policies)
        {
            ensure!(
                !tree.node(tree.root()).expanded(),
                "Roots are already prepared; call clear() before preparing again"
            );
            ensure!(!policy.is_empty(), "Root policy logits must be non-empty");
            for &action in legal_actions {
                ensure!(
                    action < policy.len(),
                    "Legal action {} is out of range for {} policy logits",
                    action,
                    policy.len()
                );
            }
        }

        Ok(())
    }
}
