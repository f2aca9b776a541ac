//! The application's pages, independent of any UI toolkit.
//!
//! A page validates user input, turns it into a [`WorkerTask`] and reports
//! progress through its [`StatusLine`]. [`submit`] is the one place where a
//! page meets the [`TaskRunner`].

use std::sync::Arc;

use deskmate_core::config::Settings;
use deskmate_core::traits::{Embedder, Generator};
use deskmate_core::types::{Slot, TaskId};
use deskmate_core::{Error, Result};
use deskmate_retrieval::{RetrievalConfig, RetrievalScorer};
use deskmate_task::{TaskRunner, WorkerTask};

pub mod chat;
pub mod filesearch;
pub mod image;
pub mod notes;
pub mod status;

pub use chat::ChatPage;
pub use filesearch::{FileQuestion, FileSearchPage};
pub use image::{GeneratedImage, ImagePage, ImagePrompt};
pub use notes::{AudioNotes, NotesPage, NotesRequest};
pub use status::{Status, StatusLine};

pub const BUSY_MESSAGE: &str = "Already working on it, please wait.";

pub trait Page {
    type Input;
    type Request: Send + 'static;
    type Output: Send + 'static;

    fn slot(&self) -> &Slot;
    fn status(&self) -> &StatusLine;
    fn working_message(&self) -> &str;

    /// Validate raw input. The error's message is shown to the user as-is.
    fn prepare(&self, input: Self::Input) -> Result<Self::Request>;

    fn task(&self, request: Self::Request) -> WorkerTask<Self::Request, Self::Output>;

    /// Text shown in the status line on success.
    fn render(output: &Self::Output) -> String;
}

/// Validate `input`, start the page's task, and wire its outcome into the
/// page's status line. `on_output` runs on the owning thread after the status
/// is updated.
pub fn submit<P, H>(
    page: &P,
    runner: &mut TaskRunner,
    input: P::Input,
    on_output: H,
) -> Result<TaskId>
where
    P: Page + 'static,
    H: FnOnce(&P::Output) + 'static,
{
    let request = match page.prepare(input) {
        Ok(request) => request,
        Err(e) => {
            page.status().set(Status::Rejected(e.to_string()));
            return Err(e);
        }
    };

    let done = page.status().clone();
    let failed = page.status().clone();
    let submitted = runner.submit(
        page.task(request),
        move |output| {
            done.set(Status::Done(P::render(&output)));
            on_output(&output);
        },
        move |message| failed.set(Status::Failed(message)),
    );

    match submitted {
        Ok(id) => {
            page.status().set(Status::Working(page.working_message().to_string()));
            Ok(id)
        }
        Err(e @ Error::Busy { .. }) => {
            page.status().set(Status::Rejected(BUSY_MESSAGE.to_string()));
            Err(e)
        }
        Err(e) => {
            page.status().set(Status::Failed(e.to_string()));
            Err(e)
        }
    }
}

/// Every page, sharing one API client.
pub struct Pages {
    pub poem: ChatPage,
    pub translate: ChatPage,
    pub rudebot: ChatPage,
    pub image: ImagePage,
    pub notes: NotesPage,
    pub filesearch: FileSearchPage,
}

impl Pages {
    pub fn new(
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        settings: &Settings,
    ) -> Result<Self> {
        let models = &settings.models;
        let scorer = RetrievalScorer::new(embedder, RetrievalConfig::from(&settings.retrieval))?;
        Ok(Self {
            poem: ChatPage::poem(Arc::clone(&generator), &models.chat),
            translate: ChatPage::translate(Arc::clone(&generator), &models.chat),
            rudebot: ChatPage::rudebot(Arc::clone(&generator), &models.rudebot),
            image: ImagePage::new(Arc::clone(&generator)),
            notes: NotesPage::new(Arc::clone(&generator), &models.notes),
            filesearch: FileSearchPage::new(generator, Arc::new(scorer), &models.answer),
        })
    }
}
