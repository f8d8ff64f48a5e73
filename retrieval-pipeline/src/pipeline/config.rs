use serde::{Deserialize, Serialize};

/// Tunable knobs for one retrieval run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineTuning {
    /// Documents kept after reranking.
    pub top_k: usize,
    /// Per-expansion fetch size is `top_k * fetch_multiplier`, so the
    /// reranker has headroom to reorder across expansions.
    pub fetch_multiplier: usize,
    /// Content prefix length used for cross-expansion deduplication.
    pub dedup_prefix_chars: usize,
    /// Upper bound on query variants per question.
    pub max_expansions: usize,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        Self {
            top_k: 5,
            fetch_multiplier: 2,
            dedup_prefix_chars: 100,
            max_expansions: 5,
        }
    }
}

impl PipelineTuning {
    pub fn with_top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }

    pub fn fetch_size(&self) -> usize {
        self.top_k.saturating_mul(self.fetch_multiplier).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_size_never_hits_zero() {
        assert_eq!(PipelineTuning::with_top_k(0).fetch_size(), 1);
        assert_eq!(PipelineTuning::default().fetch_size(), 10);
    }
}
