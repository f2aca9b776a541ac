use std::path::PathBuf;
use std::sync::Arc;

use deskmate_core::document::DocumentReader;
use deskmate_core::traits::Generator;
use deskmate_core::types::Slot;
use deskmate_core::{Error, Result};
use deskmate_retrieval::{answer, RetrievalScorer};
use deskmate_task::WorkerTask;

use crate::{Page, StatusLine};

static SLOT: Slot = Slot::named("filesearch");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuestion {
    pub path: PathBuf,
    pub question: String,
}

/// Answers a question about a local document using retrieved excerpts.
pub struct FileSearchPage {
    client: Arc<dyn Generator>,
    scorer: Arc<RetrievalScorer>,
    reader: DocumentReader,
    model: String,
    status: StatusLine,
}

impl FileSearchPage {
    pub fn new(client: Arc<dyn Generator>, scorer: Arc<RetrievalScorer>, model: &str) -> Self {
        Self {
            client,
            scorer,
            reader: DocumentReader::new(),
            model: model.to_string(),
            status: StatusLine::default(),
        }
    }
}

impl Page for FileSearchPage {
    type Input = FileQuestion;
    type Request = FileQuestion;
    type Output = String;

    fn slot(&self) -> &Slot {
        &SLOT
    }

    fn status(&self) -> &StatusLine {
        &self.status
    }

    fn working_message(&self) -> &str {
        "Analyzing file..."
    }

    fn prepare(&self, input: FileQuestion) -> Result<FileQuestion> {
        let question = input.question.trim().to_string();
        if input.path.as_os_str().is_empty() || question.is_empty() {
            return Err(Error::MissingInput("Please enter a file and a question.".to_string()));
        }
        if !input.path.exists() {
            let shown = input.path.display();
            return Err(Error::NotFound(format!("{shown} (please check the path)")));
        }
        Ok(FileQuestion {
            path: input.path,
            question,
        })
    }

    fn task(&self, request: FileQuestion) -> WorkerTask<FileQuestion, String> {
        let client = Arc::clone(&self.client);
        let scorer = Arc::clone(&self.scorer);
        let reader = self.reader;
        let model = self.model.clone();
        WorkerTask::new(SLOT.clone(), request, move |request: FileQuestion| {
            let retrieval = scorer.score_file(&reader, &request.path, &request.question)?;
            answer(client.as_ref(), &model, &retrieval)
        })
    }

    fn render(output: &String) -> String {
        output.trim().to_string()
    }
}
