use anyhow::{anyhow, bail, Result};
use std::path::Path;
use std::sync::Arc;

use deskmate_core::config::RetrievalSettings;
use deskmate_core::document::DocumentReader;
use deskmate_core::traits::{Embedder, Generator};
use deskmate_core::types::ScoredChunk;
use deskmate_core::Error;

use crate::chunk::{chunk_text, into_document_chunks};
use crate::similarity::rank_chunks;

/// Answer returned when a document yields no usable text.
pub const NO_TEXT_ANSWER: &str = "No extractable text was found in the document.";

pub const ANSWER_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that answers questions about the user's document.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    pub chunk_size: usize,
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            top_k: 3,
        }
    }
}

impl From<&RetrievalSettings> for RetrievalConfig {
    fn from(s: &RetrievalSettings) -> Self {
        Self {
            chunk_size: s.chunk_size,
            top_k: s.top_k,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> deskmate_core::Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("retrieval chunk_size must be > 0".into()));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval top_k must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// The document had no extractable text; nothing was embedded.
    NoText,
    Grounded {
        chunks: Vec<ScoredChunk>,
        context: String,
        prompt: String,
    },
}

impl Retrieval {
    pub fn chunks(&self) -> &[ScoredChunk] {
        match self {
            Self::NoText => &[],
            Self::Grounded { chunks, .. } => chunks,
        }
    }
}

/// Picks the chunks of a document most similar to a question and builds a
/// grounded prompt from them.
pub struct RetrievalScorer {
    embedder: Arc<dyn Embedder>,
    config: RetrievalConfig,
}

impl RetrievalScorer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> deskmate_core::Result<Self> {
        config.validate()?;
        Ok(Self { embedder, config })
    }

    pub fn score(&self, text: &str, question: &str) -> Result<Retrieval> {
        if text.trim().is_empty() {
            tracing::debug!("no extractable text, skipping embedding");
            return Ok(Retrieval::NoText);
        }

        let mut chunks = into_document_chunks(chunk_text(text, self.config.chunk_size));
        let inputs: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&inputs)?;
        if embeddings.len() != chunks.len() {
            bail!("expected {} chunk embeddings, got {}", chunks.len(), embeddings.len());
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }
        let query = self.embedder.embed(question)?;
        if let Some(chunk) = chunks.iter().find(|c| c.embedding.len() != query.len()) {
            return Err(anyhow!(
                "embedding dimension mismatch: question has {}, chunk {} has {}",
                query.len(),
                chunk.index,
                chunk.embedding.len()
            ));
        }

        let ranked = rank_chunks(&query, &chunks, self.config.top_k);
        tracing::debug!(total = chunks.len(), kept = ranked.len(), "ranked document chunks");
        let context = ranked.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n");
        let prompt = build_prompt(&context, question);
        Ok(Retrieval::Grounded {
            chunks: ranked,
            context,
            prompt,
        })
    }

    pub fn score_file(
        &self,
        reader: &DocumentReader,
        path: &Path,
        question: &str,
    ) -> Result<Retrieval> {
        let text = reader.extract(path);
        self.score(&text, question)
    }
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question using only the document excerpts below. \
         If the excerpts do not contain the answer, say so.\n\n\
         ### Excerpts\n{context}\n\n### Question\n{question}"
    )
}

/// Run the generation call for a retrieval, or return [`NO_TEXT_ANSWER`]
/// without touching the network.
pub fn answer(generator: &dyn Generator, model: &str, retrieval: &Retrieval) -> Result<String> {
    match retrieval {
        Retrieval::NoText => Ok(NO_TEXT_ANSWER.to_string()),
        Retrieval::Grounded { prompt, .. } => {
            generator.complete(ANSWER_SYSTEM_PROMPT, prompt, model)
        }
    }
}
