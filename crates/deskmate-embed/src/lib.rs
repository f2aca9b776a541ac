//! Embedding providers.
//!
//! The production embedder is the remote API client. `APP_USE_FAKE_EMBEDDINGS=1`
//! swaps in [`FakeEmbedder`], a deterministic hashed bag-of-words, for tests
//! and offline development.

use anyhow::Result;
use std::sync::Arc;

use deskmate_core::traits::Embedder;
use deskmate_remote::ApiClient;

pub const FAKE_DIM: usize = 1024;

pub struct FakeEmbedder {
    dim: usize,
}

impl FakeEmbedder {
    /// A zero dimension is bumped to one so hashing always has a bucket.
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Scale `v` to unit length. All-zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-6 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(client: Arc<ApiClient>) -> Arc<dyn Embedder> {
    if use_fake_embeddings() {
        tracing::info!("using FakeEmbedder");
        return Arc::new(FakeEmbedder::new(FAKE_DIM));
    }
    client
}
