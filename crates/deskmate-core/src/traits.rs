//! Seams to the remote services. Implementations live in `deskmate-remote`
//! and `deskmate-embed`; tests substitute mocks.

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedding service returned no vector"))
    }
}

pub trait Generator: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> anyhow::Result<String>;
    fn generate_image(&self, prompt: &str, size: &str, count: usize) -> anyhow::Result<Vec<String>>;
    /// Download a generated image by the URL `generate_image` returned.
    fn fetch_image(&self, url: &str) -> anyhow::Result<Vec<u8>>;
    fn transcribe_audio(&self, audio: Vec<u8>, file_name: &str) -> anyhow::Result<String>;
}
