use anyhow::{anyhow, ensure, Result};

use common::MinMaxStatsList;

use crate::node::num_players;
use crate::results::SearchResults;
use crate::roots::RootCollection;
use crate::select::{compute_mean_q, select_child_entry};

/// Descends every root tree by repeated UCB selection until an unexpanded
/// node is reached, and returns the batch of reached leaves so the caller
/// can evaluate all of them with a single model call.
///
/// Each root is traversed independently; nothing carries over between
/// roots, so the per-root loop bodies could run on worker threads without
/// sharing any mutable state beyond each root's own stats.
pub fn batch_traverse(
    roots: &mut RootCollection,
    pb_c_base: usize,
    pb_c_init: f32,
    discount_factor: f32,
    min_max_stats_list: &MinMaxStatsList,
    virtual_to_play_batch: &[i32],
) -> Result<SearchResults> {
    ensure!(pb_c_base > 0, "pb_c_base must be positive");
    ensure!(
        discount_factor > 0.0 && discount_factor <= 1.0,
        "discount_factor must be in (0, 1], got {}",
        discount_factor
    );
    ensure!(
        virtual_to_play_batch.len() == roots.len(),
        "Expected {} virtual to_play values but received {}",
        roots.len(),
        virtual_to_play_batch.len()
    );
    ensure!(
        min_max_stats_list.len() == roots.len(),
        "Expected {} min-max stats but received {}",
        roots.len(),
        min_max_stats_list.len()
    );
    for tree in roots.trees() {
        ensure!(
            tree.node(tree.root()).expanded(),
            "batch_traverse requires prepared roots"
        );
    }

    let num_players = num_players(virtual_to_play_batch);
    let mut results = SearchResults::with_capacity(roots.len());

    for i in 0..roots.len() {
        let tree = roots.tree_mut(i);
        let min_max_stats = min_max_stats_list.get(i);

        let mut to_play = virtual_to_play_batch[i];
        let mut node = tree.root();
        let mut path = vec![node];
        let mut parent_q = 0.0;
        let mut last_action = 0;
        let mut depth = 0usize;

        while tree.node(node).expanded() {
            let mean_q = compute_mean_q(tree, node, depth == 0, parent_q, discount_factor);
            parent_q = mean_q;

            let Some((action, child)) = select_child_entry(
                tree,
                node,
                min_max_stats,
                pb_c_base,
                pb_c_init,
                discount_factor,
                mean_q,
                num_players,
            ) else {
                break;
            };

            if num_players == 2 {
                to_play = if to_play == 1 { 2 } else { 1 };
            }

            tree.node_mut(node).best_action = Some(action);
            last_action = action;
            node = child;
            path.push(node);
            depth += 1;
        }

        let parent = tree.node(path[path.len() - 2]);
        let latent_ref = parent
            .latent_ref()
            .ok_or_else(|| anyhow!("Expanded node is missing its latent state ref"))?;

        results.latent_refs.push(latent_ref);
        results.last_actions.push(last_action);
        results.search_lens.push(depth);
        results.virtual_to_play.push(to_play);
        results.nodes.push(node);
        results.search_paths.push(path);
    }

    Ok(results)
}
