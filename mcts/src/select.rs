use generational_arena::Index;

use common::MinMaxStats;

use crate::tree::SearchTree;

/// Reset-aware per-edge reward: the difference of cumulative value
/// prefixes, unless the prefix restarted at the parent.
fn reward_delta(child_value_prefix: f32, parent_value_prefix: f32, is_reset: bool) -> f32 {
    if is_reset {
        child_value_prefix
    } else {
        child_value_prefix - parent_value_prefix
    }
}

/// UCB score of a child edge: a prior-weighted exploration bonus plus the
/// child's normalized discounted-return estimate. An unvisited child falls
/// back to the parent's mean Q.
#[allow(clippy::too_many_arguments)]
pub fn ucb_score(
    tree: &SearchTree,
    child: Index,
    min_max_stats: &MinMaxStats,
    parent_mean_q: f32,
    is_reset: bool,
    parent_visit_total: usize,
    parent_value_prefix: f32,
    pb_c_base: usize,
    pb_c_init: f32,
    discount_factor: f32,
    num_players: usize,
) -> f32 {
    let child = tree.node(child);

    let pb_c = ((parent_visit_total as f32 + pb_c_base as f32 + 1.0) / pb_c_base as f32).ln()
        + pb_c_init;
    let prior_score = pb_c * child.prior() / (1.0 + child.visit_count() as f32);

    let value_score = if child.visit_count() == 0 {
        parent_mean_q
    } else {
        let reward = reward_delta(child.value_prefix(), parent_value_prefix, is_reset);
        // Two-player: the child's value is from the opponent's perspective.
        let child_value = if num_players == 2 {
            -child.value()
        } else {
            child.value()
        };

        reward + discount_factor * child_value
    };

    prior_score + min_max_stats.normalize(value_score).clamp(0.0, 1.0)
}

pub(crate) fn select_child_entry(
    tree: &SearchTree,
    node: Index,
    min_max_stats: &MinMaxStats,
    pb_c_base: usize,
    pb_c_init: f32,
    discount_factor: f32,
    parent_mean_q: f32,
    num_players: usize,
) -> Option<(usize, Index)> {
    let node = tree.node(node);
    let mut best: Option<(usize, Index, f32)> = None;

    for (action, child) in node.children() {
        let score = ucb_score(
            tree,
            child,
            min_max_stats,
            parent_mean_q,
            node.is_reset(),
            node.visit_count(),
            node.value_prefix(),
            pb_c_base,
            pb_c_init,
            discount_factor,
            num_players,
        );

        let is_better = match best {
            None => true,
            // Ties resolve to the lowest action index, for reproducibility.
            Some((best_action, _, best_score)) => {
                score > best_score || (score == best_score && action < best_action)
            }
        };

        if is_better {
            best = Some((action, child, score));
        }
    }

    best.map(|(action, child, _)| (action, child))
}

/// Action with the maximum UCB score over the node's children, or `None`
/// for a node with no children.
#[allow(clippy::too_many_arguments)]
pub fn select_child(
    tree: &SearchTree,
    node: Index,
    min_max_stats: &MinMaxStats,
    pb_c_base: usize,
    pb_c_init: f32,
    discount_factor: f32,
    parent_mean_q: f32,
    num_players: usize,
) -> Option<usize> {
    select_child_entry(
        tree,
        node,
        min_max_stats,
        pb_c_base,
        pb_c_init,
        discount_factor,
        parent_mean_q,
        num_players,
    )
    .map(|(action, _)| action)
}

/// Mean discounted-return estimate over a node's visited children, used as
/// the fallback value for its unvisited ones. The root averages strictly
/// over visited children; deeper nodes fold `parent_q` in as one extra
/// sample, so an unvisited region inherits its parent's estimate.
pub fn compute_mean_q(
    tree: &SearchTree,
    node: Index,
    is_root: bool,
    parent_q: f32,
    discount_factor: f32,
) -> f32 {
    let node = tree.node(node);
    let parent_value_prefix = node.value_prefix();

    let mut total_q = 0.0;
    let mut visited = 0usize;

    for (_, child) in node.children() {
        let child = tree.node(child);
        if child.visit_count() > 0 {
            let reward = reward_delta(child.value_prefix(), parent_value_prefix, node.is_reset());
            total_q += reward + discount_factor * child.value();
            visited += 1;
        }
    }

    if is_root && visited > 0 {
        total_q / visited as f32
    } else {
        (parent_q + total_q) / (visited + 1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{LatentRef, SINGLE_PLAYER};
    use assert_approx_eq::assert_approx_eq;

    const PB_C_BASE: usize = 19652;
    const PB_C_INIT: f32 = 1.25;

    fn expanded_tree(legal_actions: Vec<usize>, policy_logits: &[f32]) -> SearchTree {
        let mut tree = SearchTree::new(legal_actions);
        tree.expand(tree.root(), SINGLE_PLAYER, LatentRef::new(0, 0), 0.0, policy_logits)
            .unwrap();
        tree
    }

    fn select(tree: &SearchTree, stats: &MinMaxStats) -> Option<usize> {
        select_child(tree, tree.root(), stats, PB_C_BASE, PB_C_INIT, 1.0, 0.0, 1)
    }

    #[test]
    fn test_select_child_prefers_higher_prior() {
        let tree = expanded_tree(vec![0, 1, 2], &[0.1, 2.0, 0.1]);
        let stats = MinMaxStats::default();

        assert_eq!(select(&tree, &stats), Some(1));
    }

    #[test]
    fn test_select_child_tie_resolves_to_lowest_action() {
        let tree = expanded_tree(vec![2, 0, 1], &[0.5, 0.5, 0.5]);
        let stats = MinMaxStats::default();

        // Uniform priors and zero visits everywhere: every score ties.
        assert_eq!(select(&tree, &stats), Some(0));
    }

    #[test]
    fn test_select_child_is_deterministic() {
        let tree = expanded_tree(vec![0, 1, 2], &[0.4, 0.4, 0.1]);
        let stats = MinMaxStats::default();

        let first = select(&tree, &stats);
        for _ in 0..10 {
            assert_eq!(select(&tree, &stats), first);
        }
    }

    #[test]
    fn test_select_child_on_childless_node_returns_none() {
        let tree = SearchTree::new(vec![0, 1]);
        let stats = MinMaxStats::default();

        assert_eq!(select(&tree, &stats), None);
    }

    #[test]
    fn test_select_child_prefers_higher_value_when_visited() {
        let mut tree = expanded_tree(vec![0, 1], &[0.0, 0.0]);
        let mut stats = MinMaxStats::default();

        let root = tree.root();
        let (low, high) = {
            let root = tree.node(root);
            (root.child_of(0).unwrap(), root.child_of(1).unwrap())
        };
        for (child, value) in [(low, 0.1), (high, 0.9)] {
            let node = tree.node_mut(child);
            node.visit_count = 1;
            node.value_sum = value;
            stats.update(value);
        }
        tree.node_mut(root).visit_count = 2;

        assert_eq!(select(&tree, &stats), Some(1));
    }

    #[test]
    fn test_ucb_unvisited_child_uses_parent_mean_q() {
        let tree = expanded_tree(vec![0, 1], &[0.0, 0.0]);
        let child = tree.node(tree.root()).child_of(0).unwrap();

        let stats = MinMaxStats::default();
        let with_low_q = ucb_score(&tree, child, &stats, 0.2, false, 0, 0.0, PB_C_BASE, PB_C_INIT, 1.0, 1);
        let with_high_q = ucb_score(&tree, child, &stats, 0.8, false, 0, 0.0, PB_C_BASE, PB_C_INIT, 1.0, 1);

        assert_approx_eq!(with_high_q - with_low_q, 0.6, 0.00001);
    }

    #[test]
    fn test_ucb_reset_edge_ignores_parent_value_prefix() {
        let mut tree = expanded_tree(vec![0], &[0.0]);
        let child = tree.node(tree.root()).child_of(0).unwrap();
        {
            let node = tree.node_mut(child);
            node.visit_count = 1;
            node.value_sum = 0.5;
            node.value_prefix = 0.25;
        }

        let stats = MinMaxStats::default();
        let sentinel = ucb_score(&tree, child, &stats, 0.0, true, 1, 1.0e9, PB_C_BASE, PB_C_INIT, 1.0, 1);
        let zeroed = ucb_score(&tree, child, &stats, 0.0, true, 1, 0.0, PB_C_BASE, PB_C_INIT, 1.0, 1);

        assert_eq!(sentinel, zeroed);
    }

    #[test]
    fn test_compute_mean_q_without_visits_returns_parent_q() {
        let tree = expanded_tree(vec![0, 1], &[0.0, 0.0]);

        assert_approx_eq!(compute_mean_q(&tree, tree.root(), false, 0.7, 1.0), 0.7, 0.00001);
    }

    #[test]
    fn test_compute_mean_q_root_averages_visited_children_only() {
        let mut tree = expanded_tree(vec![0, 1, 2], &[0.0, 0.0, 0.0]);
        let root = tree.root();
        let visited: Vec<_> = tree
            .node(root)
            .children()
            .take(2)
            .map(|(_, c)| c)
            .collect();
        for (child, value) in visited.into_iter().zip([0.2, 0.6]) {
            let node = tree.node_mut(child);
            node.visit_count = 1;
            node.value_sum = value;
        }

        assert_approx_eq!(compute_mean_q(&tree, root, true, 5.0, 1.0), 0.4, 0.00001);
    }

    #[test]
    fn test_compute_mean_q_non_root_folds_in_parent_q() {
        let mut tree = expanded_tree(vec![0, 1], &[0.0, 0.0]);
        let root = tree.root();
        let child = tree.node(root).child_of(0).unwrap();
        {
            let node = tree.node_mut(child);
            node.visit_count = 1;
            node.value_sum = 0.6;
        }

        // (parent_q + qsa) / (visited + 1)
        assert_approx_eq!(compute_mean_q(&tree, root, false, 0.2, 1.0), 0.4, 0.00001);
    }
}
