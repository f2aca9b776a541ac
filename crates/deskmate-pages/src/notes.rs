//! Meeting notes from an audio recording: transcribe, ask for four kinds of
//! notes, export them as one document.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use deskmate_core::document::export_sections;
use deskmate_core::traits::Generator;
use deskmate_core::types::Slot;
use deskmate_core::{Error, Result};
use deskmate_task::WorkerTask;

use crate::{Page, StatusLine};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Notes are written as Markdown text; other extensions would mislabel the file.
const EXPORT_EXTENSIONS: [&str; 3] = ["md", "markdown", "txt"];

/// Section key and the instruction sent with the transcript, in document order.
pub const SECTIONS: [(&str, &str); 4] = [
    ("abstract_summary", "Summarize the following text:"),
    ("key_points", "Extract key points:"),
    ("action_items", "Extract action items:"),
    ("sentiment", "Analyze the sentiment:"),
];

static SLOT: Slot = Slot::named("notes");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesRequest {
    pub audio: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioNotes {
    pub sections: Vec<(String, String)>,
    pub output: PathBuf,
}

pub struct NotesPage {
    client: Arc<dyn Generator>,
    model: String,
    status: StatusLine,
}

impl NotesPage {
    pub fn new(client: Arc<dyn Generator>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
            status: StatusLine::default(),
        }
    }
}

fn build_notes(
    client: &dyn Generator,
    model: &str,
    request: &NotesRequest,
) -> anyhow::Result<AudioNotes> {
    let audio = fs::read(&request.audio)
        .with_context(|| format!("failed to read audio file {}", request.audio.display()))?;
    let file_name = request
        .audio
        .file_name()
        .map_or_else(|| "audio".to_string(), |n| n.to_string_lossy().to_string());
    let transcript = client.transcribe_audio(audio, &file_name).context("transcription failed")?;
    tracing::debug!(chars = transcript.chars().count(), "transcribed audio");

    let mut sections = Vec::with_capacity(SECTIONS.len());
    for (key, instruction) in SECTIONS {
        let text = client
            .complete(SYSTEM_PROMPT, &format!("{instruction}\n\n{transcript}"), model)
            .with_context(|| format!("{key} request failed"))?;
        sections.push((key.to_string(), text));
    }
    export_sections(&sections, &request.output)?;
    Ok(AudioNotes {
        sections,
        output: request.output.clone(),
    })
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

fn is_text_export(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXPORT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

impl Page for NotesPage {
    type Input = NotesRequest;
    type Request = NotesRequest;
    type Output = AudioNotes;

    fn slot(&self) -> &Slot {
        &SLOT
    }

    fn status(&self) -> &StatusLine {
        &self.status
    }

    fn working_message(&self) -> &str {
        "Creating notes..."
    }

    fn prepare(&self, input: NotesRequest) -> Result<NotesRequest> {
        if is_blank(&input.audio) {
            return Err(missing("Please enter the path of an audio file."));
        }
        if is_blank(&input.output) {
            return Err(missing("Please choose where to save the notes."));
        }
        if !is_text_export(&input.output) {
            return Err(missing("Notes are saved as Markdown; choose a .md or .txt file."));
        }
        Ok(input)
    }

    fn task(&self, request: NotesRequest) -> WorkerTask<NotesRequest, AudioNotes> {
        let client = Arc::clone(&self.client);
        let model = self.model.clone();
        WorkerTask::new(SLOT.clone(), request, move |request: NotesRequest| {
            build_notes(client.as_ref(), &model, &request)
        })
    }

    fn render(output: &AudioNotes) -> String {
        format!("Notes saved: {}", output.output.display())
    }
}

fn missing(message: &str) -> Error {
    Error::MissingInput(message.to_string())
}
