use deskmate_core::types::{DocumentChunk, ScoredChunk};

/// Keeps degenerate (all-zero) vectors from dividing by zero.
pub const EPSILON: f32 = 1e-10;

/// `dot(a, b) / (|a| * |b| + EPSILON)`. Vectors of different length score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (norm_a * norm_b + EPSILON)
}

/// Score every chunk against `query`, best first, keeping at most `k`.
/// Ties keep document order.
pub fn rank_chunks(query: &[f32], chunks: &[DocumentChunk], k: usize) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .map(|c| ScoredChunk {
            score: cosine_similarity(query, &c.embedding),
            index: c.index,
            text: c.text.clone(),
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}
