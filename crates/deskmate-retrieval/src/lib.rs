//! Chunk-and-embed retrieval over a single document.
//!
//! The document is cut into fixed-size character chunks, every chunk and the
//! question are embedded, and the top-K chunks by cosine similarity become the
//! context of a grounded prompt. Nothing is persisted between requests.

pub mod chunk;
pub mod scorer;
pub mod similarity;

pub use chunk::chunk_text;
pub use scorer::{
    answer, build_prompt, Retrieval, RetrievalConfig, RetrievalScorer, NO_TEXT_ANSWER,
};
pub use similarity::{cosine_similarity, rank_chunks};
