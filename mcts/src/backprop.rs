use anyhow::{ensure, Result};
use generational_arena::Index;
use itertools::izip;

use common::{MinMaxStats, MinMaxStatsList};

use crate::node::{num_players, LatentRef};
use crate::results::SearchResults;
use crate::roots::RootCollection;
use crate::tree::SearchTree;

/// ±1 factor applied to a backed-up return at a given tree level. In
/// two-player mode a node accumulates the return negated whenever it
/// belongs to the other player than the evaluated leaf.
fn backup_sign(node_to_play: i32, leaf_to_play: i32, num_players: usize) -> f32 {
    if num_players == 2 && node_to_play != leaf_to_play {
        -1.0
    } else {
        1.0
    }
}

/// Propagates a leaf value estimate back along `search_path` (leaf to
/// root), updating visit counts, value sums and the tree's normalization
/// bounds. The bootstrapped return is rebuilt level by level:
/// `G = reward_delta + discount * G`, with the reward delta suppressing the
/// parent prefix across reset boundaries.
pub fn backpropagate(
    tree: &mut SearchTree,
    search_path: &[Index],
    min_max_stats: &mut MinMaxStats,
    to_play: i32,
    value: f32,
    discount_factor: f32,
    num_players: usize,
) {
    let mut bootstrap = value;

    for (i, &index) in search_path.iter().enumerate().rev() {
        let (parent_value_prefix, parent_is_reset) = if i >= 1 {
            let parent = tree.node(search_path[i - 1]);
            (parent.value_prefix(), parent.is_reset())
        } else {
            (0.0, false)
        };

        let node = tree.node_mut(index);
        let sign = backup_sign(node.to_play, to_play, num_players);
        node.value_sum += sign * bootstrap;
        node.visit_count += 1;

        let reward = if parent_is_reset {
            node.value_prefix
        } else {
            node.value_prefix - parent_value_prefix
        };
        let node_value = node.value();
        min_max_stats.update(node_value);

        let reward = if num_players == 2 { -sign * reward } else { reward };
        bootstrap = reward + discount_factor * bootstrap;
    }
}

/// Expands every leaf reached by the matching `batch_traverse` call with
/// the model outputs for it, then backs the model values up each recorded
/// path. `latent_refs[i]` is the cache slot the model wrote root `i`'s new
/// latent state to.
#[allow(clippy::too_many_arguments)]
pub fn batch_backpropagate(
    discount_factor: f32,
    latent_refs: &[LatentRef],
    value_prefixes: &[f32],
    values: &[f32],
    policies: &[Vec<f32>],
    min_max_stats_list: &mut MinMaxStatsList,
    results: &SearchResults,
    is_reset_list: &[bool],
    to_play_batch: &[i32],
    roots: &mut RootCollection,
) -> Result<()> {
    let num = results.num();
    ensure!(
        roots.len() == num,
        "Expected {} roots but received {}",
        num,
        roots.len()
    );
    ensure!(
        min_max_stats_list.len() == num,
        "Expected {} min-max stats but received {}",
        num,
        min_max_stats_list.len()
    );
    for (name, len) in [
        ("latent_refs", latent_refs.len()),
        ("value_prefixes", value_prefixes.len()),
        ("values", values.len()),
        ("policies", policies.len()),
        ("is_reset_list", is_reset_list.len()),
        ("to_play_batch", to_play_batch.len()),
    ] {
        ensure!(
            len == num,
            "Expected {} entries in {} but received {}",
            num,
            name,
            len
        );
    }
    for policy in policies {
        ensure!(!policy.is_empty(), "Leaf policy logits must be non-empty");
    }

    let num_players = num_players(to_play_batch);

    for (i, (&leaf, path, &latent_ref, &value_prefix, &value, policy, &is_reset, &to_play)) in izip!(
        &results.nodes,
        &results.search_paths,
        latent_refs,
        value_prefixes,
        values,
        policies,
        is_reset_list,
        to_play_batch
    )
    .enumerate()
    {
        let tree = roots.tree_mut(i);
        tree.expand(leaf, to_play, latent_ref, value_prefix, policy)?;

        if path.len() >= 2 {
            let parent_value_prefix = tree.node(path[path.len() - 2]).value_prefix();
            tree.node_mut(leaf).parent_value_prefix = parent_value_prefix;
        }
        tree.node_mut(leaf).is_reset = is_reset;

        backpropagate(
            tree,
            path,
            min_max_stats_list.get_mut(i),
            to_play,
            value,
            discount_factor,
            num_players,
        );
    }

    for i in 0..num {
        update_tree_q(
            roots.tree_mut(i),
            min_max_stats_list.get_mut(i),
            discount_factor,
            num_players,
        );
    }

    Ok(())
}

/// Walks the expanded part of the tree, restamping every child's copy of
/// its parent's value prefix and feeding each node's discounted-return
/// estimate to the normalization bounds for the next round's scoring.
pub fn update_tree_q(
    tree: &mut SearchTree,
    min_max_stats: &mut MinMaxStats,
    discount_factor: f32,
    num_players: usize,
) {
    let root = tree.root();
    let mut stack = vec![root];

    while let Some(index) = stack.pop() {
        if index != root {
            let node = tree.node(index);
            let reward = if node.is_reset() {
                node.value_prefix()
            } else {
                node.value_prefix() - node.parent_value_prefix()
            };
            let node_value = if num_players == 2 {
                -node.value()
            } else {
                node.value()
            };
            min_max_stats.update(reward + discount_factor * node_value);
        }

        let value_prefix = tree.node(index).value_prefix();
        let children: Vec<Index> = tree.node(index).children().map(|(_, c)| c).collect();

        for child in children {
            if tree.node(child).expanded() {
                tree.node_mut(child).parent_value_prefix = value_prefix;
                stack.push(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{LatentRef, SINGLE_PLAYER};

    fn two_level_tree(root_value_prefix: f32, leaf_value_prefix: f32) -> (SearchTree, Vec<Index>) {
        let mut tree = SearchTree::new(vec![0, 1]);
        tree.expand(
            tree.root(),
            SINGLE_PLAYER,
            LatentRef::new(0, 0),
            root_value_prefix,
            &[0.0, 0.0],
        )
        .unwrap();

        let leaf = tree.node(tree.root()).child_of(0).unwrap();
        tree.expand(leaf, SINGLE_PLAYER, LatentRef::new(1, 0), leaf_value_prefix, &[0.0, 0.0])
            .unwrap();
        tree.node_mut(leaf).parent_value_prefix = root_value_prefix;

        let root = tree.root();
        (tree, vec![root, leaf])
    }

    #[test]
    fn test_backpropagate_increments_visits_along_path() {
        let (mut tree, path) = two_level_tree(0.0, 0.0);
        let mut stats = MinMaxStats::default();

        backpropagate(&mut tree, &path, &mut stats, SINGLE_PLAYER, 0.5, 0.997, 1);

        for &index in &path {
            assert_eq!(tree.node(index).visit_count(), 1);
        }
    }

    #[test]
    fn test_backpropagate_is_value_conservative_without_discount() {
        let (mut tree, path) = two_level_tree(0.0, 0.0);
        let mut stats = MinMaxStats::default();

        backpropagate(&mut tree, &path, &mut stats, SINGLE_PLAYER, 0.7, 1.0, 1);

        // Zero value prefixes and no discounting: the root receives the
        // leaf value exactly.
        assert_eq!(tree.node(tree.root()).value(), 0.7);
    }

    #[test]
    fn test_backpropagate_adds_reward_delta_between_levels() {
        let (mut tree, path) = two_level_tree(0.25, 1.0);
        let mut stats = MinMaxStats::default();

        backpropagate(&mut tree, &path, &mut stats, SINGLE_PLAYER, 0.5, 1.0, 1);

        // Leaf return 0.5; edge reward 1.0 - 0.25 = 0.75; root sees 1.25.
        assert_eq!(tree.node(path[1]).value(), 0.5);
        assert_eq!(tree.node(tree.root()).value(), 1.25);
    }

    #[test]
    fn test_reset_boundary_ignores_parent_value_prefix() {
        let sentinel = 1.0e9;
        let (mut tree_a, path_a) = two_level_tree(sentinel, 0.5);
        let (mut tree_b, path_b) = two_level_tree(0.0, 0.5);

        // The parent's reset flag governs the child's reward delta, so the
        // root prefix must drop out of the backup entirely.
        tree_a.node_mut(path_a[0]).is_reset = true;
        tree_b.node_mut(path_b[0]).is_reset = true;

        let mut stats_a = MinMaxStats::default();
        let mut stats_b = MinMaxStats::default();
        backpropagate(&mut tree_a, &path_a, &mut stats_a, SINGLE_PLAYER, 1.0, 1.0, 1);
        backpropagate(&mut tree_b, &path_b, &mut stats_b, SINGLE_PLAYER, 1.0, 1.0, 1);

        assert_eq!(
            tree_a.node(path_a[0]).value(),
            tree_b.node(path_b[0]).value()
        );
    }

    #[test]
    fn test_two_player_backup_flips_sign_across_levels() {
        let (mut tree, path) = two_level_tree(0.0, 0.0);
        tree.node_mut(path[0]).to_play = 1;
        tree.node_mut(path[1]).to_play = 2;
        let mut stats = MinMaxStats::default();

        backpropagate(&mut tree, &path, &mut stats, 2, 1.0, 1.0, 2);

        // A win for player 2 at the leaf is a loss from the root player's
        // perspective.
        assert_eq!(tree.node(path[1]).value(), 1.0);
        assert_eq!(tree.node(path[0]).value(), -1.0);
    }

    #[test]
    fn test_update_tree_q_restamps_parent_value_prefix() {
        let (mut tree, path) = two_level_tree(0.25, 1.0);
        tree.node_mut(path[1]).parent_value_prefix = 0.0;
        let mut stats = MinMaxStats::default();

        update_tree_q(&mut tree, &mut stats, 1.0, 1);

        assert_eq!(tree.node(path[1]).parent_value_prefix(), 0.25);
    }
}
