use std::sync::Arc;

use deskmate_core::traits::Generator;
use deskmate_core::types::Slot;
use deskmate_core::{Error, Result};
use deskmate_task::WorkerTask;

use crate::{Page, StatusLine};

/// What distinguishes one single-completion page from another.
#[derive(Clone)]
pub struct Persona {
    pub slot: Slot,
    pub system_prompt: &'static str,
    pub user_prompt: fn(&str) -> String,
    pub working: &'static str,
    pub missing_input: &'static str,
}

/// A page that sends one chat completion and shows the reply.
pub struct ChatPage {
    client: Arc<dyn Generator>,
    model: String,
    persona: Persona,
    status: StatusLine,
}

impl ChatPage {
    pub fn new(client: Arc<dyn Generator>, model: &str, persona: Persona) -> Self {
        Self {
            client,
            model: model.to_string(),
            persona,
            status: StatusLine::default(),
        }
    }

    pub fn poem(client: Arc<dyn Generator>, model: &str) -> Self {
        let persona = Persona {
            slot: Slot::named("poem"),
            system_prompt: "You are a helpful assistant who writes poems in Korean.",
            user_prompt: |topic| format!("{topic}에 대한 시를 작성해줘."),
            working: "Writing a poem...",
            missing_input: "Please enter a topic for the poem.",
        };
        Self::new(client, model, persona)
    }

    pub fn translate(client: Arc<dyn Generator>, model: &str) -> Self {
        let persona = Persona {
            slot: Slot::named("translate"),
            system_prompt: "Translate English to Korean.",
            user_prompt: str::to_string,
            working: "Translating...",
            missing_input: "Please enter text to translate.",
        };
        Self::new(client, model, persona)
    }

    pub fn rudebot(client: Arc<dyn Generator>, model: &str) -> Self {
        let persona = Persona {
            slot: Slot::named("rudebot"),
            system_prompt: "You are RudeBot — a sarcastic chatbot.",
            user_prompt: str::to_string,
            working: "RudeBot is thinking...",
            missing_input: "Please enter a question!",
        };
        Self::new(client, model, persona)
    }
}

impl Page for ChatPage {
    type Input = String;
    type Request = String;
    type Output = String;

    fn slot(&self) -> &Slot {
        &self.persona.slot
    }

    fn status(&self) -> &StatusLine {
        &self.status
    }

    fn working_message(&self) -> &str {
        self.persona.working
    }

    fn prepare(&self, input: String) -> Result<String> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::MissingInput(self.persona.missing_input.to_string()));
        }
        Ok((self.persona.user_prompt)(input))
    }

    fn task(&self, request: String) -> WorkerTask<String, String> {
        let client = Arc::clone(&self.client);
        let model = self.model.clone();
        let system = self.persona.system_prompt;
        WorkerTask::new(self.persona.slot.clone(), request, move |user: String| {
            client.complete(system, &user, &model)
        })
    }

    fn render(output: &String) -> String {
        output.trim().to_string()
    }
}
