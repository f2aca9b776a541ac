use anyhow::{bail, Context};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use deskmate_core::traits::Generator;
use deskmate_core::types::Slot;
use deskmate_core::{Error, Result};
use deskmate_task::WorkerTask;

use crate::{Page, StatusLine};

pub const IMAGE_SIZE: &str = "1024x1024";

static SLOT: Slot = Slot::named("image");

#[derive(Debug, Clone, Default)]
pub struct ImagePrompt {
    pub prompt: String,
    /// Where to save the downloaded image, if anywhere.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
    pub bytes: Vec<u8>,
    pub saved_to: Option<PathBuf>,
}

pub struct ImagePage {
    client: Arc<dyn Generator>,
    status: StatusLine,
}

impl ImagePage {
    pub fn new(client: Arc<dyn Generator>) -> Self {
        Self {
            client,
            status: StatusLine::default(),
        }
    }
}

impl Page for ImagePage {
    type Input = ImagePrompt;
    type Request = ImagePrompt;
    type Output = GeneratedImage;

    fn slot(&self) -> &Slot {
        &SLOT
    }

    fn status(&self) -> &StatusLine {
        &self.status
    }

    fn working_message(&self) -> &str {
        "Generating image..."
    }

    fn prepare(&self, input: ImagePrompt) -> Result<ImagePrompt> {
        let prompt = input.prompt.trim();
        if prompt.is_empty() {
            return Err(Error::MissingInput("Please enter an image prompt.".to_string()));
        }
        Ok(ImagePrompt {
            prompt: prompt.to_string(),
            output: input.output,
        })
    }

    fn task(&self, request: ImagePrompt) -> WorkerTask<ImagePrompt, GeneratedImage> {
        let client = Arc::clone(&self.client);
        WorkerTask::new(SLOT.clone(), request, move |request: ImagePrompt| {
            let urls = client.generate_image(&request.prompt, IMAGE_SIZE, 1)?;
            let Some(url) = urls.into_iter().next() else {
                bail!("no image URL returned");
            };
            let bytes = client.fetch_image(&url)?;
            if bytes.is_empty() {
                bail!("image download from {url} was empty");
            }
            if let Some(path) = &request.output {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create {}", parent.display()))?;
                }
                fs::write(path, &bytes)
                    .with_context(|| format!("Failed to save image to {}", path.display()))?;
                tracing::debug!(path = %path.display(), len = bytes.len(), "image saved");
            }
            Ok(GeneratedImage {
                url,
                bytes,
                saved_to: request.output,
            })
        })
    }

    fn render(output: &GeneratedImage) -> String {
        match &output.saved_to {
            Some(path) => format!("Image saved: {}", path.display()),
            None => format!("{} ({} bytes)", output.url, output.bytes.len()),
        }
    }
}
