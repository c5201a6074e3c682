use log::warn;
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

/// Draws a single Dirichlet sample with a symmetric concentration of
/// `alpha` over `num_actions` categories. Degenerate single-action spaces
/// get the trivial distribution.
pub fn sample_dirichlet<R: Rng>(alpha: f32, num_actions: usize, rng: &mut R) -> Vec<f32> {
    if num_actions < 2 {
        warn!(
            "Dirichlet noise requested for {} actions, returning trivial noise",
            num_actions
        );
        return vec![1.0; num_actions];
    }

    let dirichlet = Dirichlet::new_with_size(alpha, num_actions)
        .expect("Dirichlet parameters are valid for two or more actions");
    dirichlet.sample(rng)
}

/// One Dirichlet draw per root, sized to each root's legal action count.
pub fn batch_dirichlet<R: Rng>(alpha: f32, action_counts: &[usize], rng: &mut R) -> Vec<Vec<f32>> {
    action_counts
        .iter()
        .map(|&num_actions| sample_dirichlet(alpha, num_actions, rng))
        .collect()
}
