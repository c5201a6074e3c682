use crate::node::LatentRef;
use crate::results::SearchResults;

/// Stand-in for the recurrent inference model. Every evaluation returns
/// the same value and value prefix with a uniform policy, and hands each
/// leaf a fresh latent slot in the next cache row.
pub struct StubEvaluator {
    pub num_actions: usize,
    pub value: f32,
    pub value_prefix: f32,
    next_row: usize,
}

pub struct StubOutput {
    pub latent_refs: Vec<LatentRef>,
    pub value_prefixes: Vec<f32>,
    pub values: Vec<f32>,
    pub policies: Vec<Vec<f32>>,
}

impl StubEvaluator {
    pub fn new(num_actions: usize, value: f32, value_prefix: f32) -> Self {
        Self {
            num_actions,
            value,
            value_prefix,
            // Row 0 is reserved for the initial root inference.
            next_row: 1,
        }
    }

    pub fn evaluate(&mut self, results: &SearchResults) -> StubOutput {
        let num = results.num();
        let row = self.next_row;
        self.next_row += 1;

        StubOutput {
            latent_refs: (0..num).map(|i| LatentRef::new(row, i)).collect(),
            value_prefixes: vec![self.value_prefix; num],
            values: vec![self.value; num],
            policies: vec![vec![0.0; self.num_actions]; num],
        }
    }
}
