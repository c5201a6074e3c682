/// Numerically stable softmax: exp(p - max_p) / sum(exp(p - max_p)).
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_logit = logits.iter().cloned().fold(f32::MIN, f32::max);
    let mut weights: Vec<f32> = logits.iter().map(|&p| (p - max_logit).exp()).collect();
    let sum: f32 = weights.iter().sum();

    for w in weights.iter_mut() {
        *w /= sum;
    }

    weights
}
