use super::gemini::{Content, GeminiClient, GeminiError, Request};

/// One ongoing conversation with the model service.
///
/// Owned by whoever started the chat; dropped or closed when that view ends.
/// Only successful exchanges are kept in the history sent back to the service.
#[derive(Debug)]
pub struct ChatSession {
    system_instruction: String,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        tracing::debug!("chat session opened");
        Self {
            system_instruction: system_instruction.into(),
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Send one user message and return the model's reply
    pub async fn send(&mut self, client: &GeminiClient, message: &str) -> Result<String, GeminiError> {
        let mut contents = self.history.clone();
        contents.push(Content::user(message));

        let request = Request {
            system_instruction: Some(self.system_instruction.clone()),
            contents,
            generation_config: None,
        };
        let reply = client.generate(&request).await?;

        self.history.push(Content::user(message));
        self.history.push(Content::model(reply.clone()));
        Ok(reply)
    }

    pub fn close(self) {
        tracing::debug!(turns = self.history.len() / 2, "chat session closed");
    }
}
