//! Claim grouping by embedding similarity.

use std::sync::Arc;

use crate::llm::LlmClient;
use crate::verification::types::ExtractedClaim;

/// Cosine similarity threshold for placing a claim into a group.
pub const SIMILARITY_THRESHOLD: f32 = 0.85;

/// Cosine similarity of two vectors. Zero for mismatched lengths or
/// zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Groups claims by greedy single-linkage against each group's
/// representative (first) embedding. Group order follows encounter
/// order.
pub struct ClaimMatcher {
    client: Arc<dyn LlmClient>,
    threshold: f32,
}

impl ClaimMatcher {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Group semantically similar claims.
    ///
    /// A claim whose embedding call fails forms its own group: it can
    /// neither join an existing group nor accept members.
    pub async fn group_similar_claims(
        &self,
        claims: &[ExtractedClaim],
    ) -> Vec<Vec<ExtractedClaim>> {
        let mut embeddings: Vec<Option<Vec<f32>>> = Vec::with_capacity(claims.len());
        for claim in claims {
            match self.client.embed(&claim.claim).await {
                Ok(vector) => embeddings.push(Some(vector)),
                Err(e) => {
                    tracing::debug!(error = %e, "embedding failed, isolating claim");
                    embeddings.push(None);
                }
            }
        }

        let mut groups: Vec<Vec<ExtractedClaim>> = Vec::new();
        let mut representatives: Vec<Option<Vec<f32>>> = Vec::new();

        for (claim, embedding) in claims.iter().zip(embeddings.into_iter()) {
            let mut placed = false;

            if let Some(ref vector) = embedding {
                for (group, representative) in groups.iter_mut().zip(representatives.iter()) {
                    let Some(rep) = representative else { continue };
                    if cosine_similarity(vector, rep) >= self.threshold {
                        group.push(claim.clone());
                        placed = true;
                        break;
                    }
                }
            }

            if !placed {
                groups.push(vec![claim.clone()]);
                representatives.push(embedding);
            }
        }

        groups
    }
}
