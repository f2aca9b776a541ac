//! Blocking HTTP client for the hosted language-model API.
//!
//! One [`ApiClient`] is built at startup and shared read-only (`Arc`) by every
//! page. All calls block, so they must only run on worker threads.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use deskmate_core::config::{ModelSettings, Settings};
use deskmate_core::traits::{Embedder, Generator};
use deskmate_core::Error;

// Requests above this are split; the embeddings endpoint caps a batch at 2048 inputs.
const MAX_EMBED_BATCH: usize = 2048;

pub struct ApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    image_model: String,
    transcribe_model: String,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        api_key: String,
        models: &ModelSettings,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: models.embedding.clone(),
            image_model: models.image.clone(),
            transcribe_model: models.transcribe.clone(),
        })
    }

    /// Build a client from settings, reading the key from `api.key_env`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.api.api_key()?;
        Self::new(
            &settings.api.base_url,
            api_key,
            &settings.models,
            Duration::from_secs(settings.api.timeout_secs),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!(%url, "POST");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| Error::Remote(format!("request to {url} failed: {e}")))?;
        let response = check_status(response)?;
        response
            .json::<R>()
            .map_err(|e| Error::Remote(format!("failed to parse response from {url}: {e}")).into())
    }

    fn embed_batch_internal(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse = self.post_json("embeddings", &request)?;
        let mut data = response.data;
        data.sort_by_key(|e| e.index);
        if data.len() != texts.len() {
            let (got, want) = (data.len(), texts.len());
            return Err(anyhow!("embedding service returned {got} vectors for {want} inputs"));
        }
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_else(|_| "Unknown error".to_string());
    Err(Error::Remote(describe_error(status.as_u16(), &body)).into())
}

fn describe_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.error_type {
            Some(kind) => format!("API error ({status}): {kind} - {}", parsed.error.message),
            None => format!("API error ({status}): {}", parsed.error.message),
        },
        Err(_) => format!("API error ({status}): {}", body.trim()),
    }
}

impl Generator for ApiClient {
    fn complete(&self, system_prompt: &str, user_prompt: &str, model: &str) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };
        let response: ChatResponse = self.post_json("chat/completions", &request)?;
        first_choice_text(response)
    }

    fn generate_image(&self, prompt: &str, size: &str, count: usize) -> Result<Vec<String>> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            size,
            n: count,
            response_format: "url",
        };
        let response: ImageResponse = self.post_json("images/generations", &request)?;
        Ok(response.data.into_iter().filter_map(|d| d.url).filter(|u| !u.is_empty()).collect())
    }

    fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        // Image URLs are pre-signed; the API key is not sent to the storage host.
        tracing::debug!(%url, "GET image");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| Error::Remote(format!("image download from {url} failed: {e}")))?;
        let response = check_status(response)?;
        let bytes = response.bytes().context("Failed to read image body")?;
        Ok(bytes.to_vec())
    }

    fn transcribe_audio(&self, audio: Vec<u8>, file_name: &str) -> Result<String> {
        let url = self.endpoint("audio/transcriptions");
        let part = multipart::Part::bytes(audio).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.transcribe_model.clone())
            .text("response_format", "text");
        tracing::debug!(%url, file_name, "POST multipart");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| Error::Remote(format!("request to {url} failed: {e}")))?;
        let response = check_status(response)?;
        let text = response.text().context("Failed to read transcription body")?;
        Ok(text.trim().to_string())
    }
}

impl Embedder for ApiClient {
    fn dim(&self) -> usize {
        match self.embedding_model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_EMBED_BATCH) {
            all.extend(self.embed_batch_internal(chunk)?);
        }
        Ok(all)
    }
}

fn first_choice_text(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("completion response contained no message"))
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: usize,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}
