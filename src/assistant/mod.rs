//! Chat companion backed by an external generative-AI service.
//!
//! Network failures never escape this module: replies degrade to a fixed
//! apology and suggestions to an empty list.

pub mod gemini;
pub mod session;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::app::{App, AppError};
use crate::config::AssistantConfig;
use crate::models::{ChatMessage, JournalEntry, Task};

pub use gemini::{GeminiClient, GeminiError};
pub use session::ChatSession;

pub const SYSTEM_INSTRUCTION: &str = "You are 'Aurora', a friendly and supportive companion in a self-care app. \
Your goal is to be a warm, encouraging friend. Avoid clinical, diagnostic, or medical terms. \
Do not use words like 'mental health', 'therapy', 'disorder', 'symptoms'. \
Instead, talk about feelings, personal growth, self-care, and finding joy in small things. \
Be conversational, empathetic, and use positive language. \
You have access to the user's recent activity; use it to provide personalized encouragement. \
For example, if they've been gardening, you could say 'I see you've been spending time with your plants! That sounds so calming.' \
Keep your responses concise and uplifting. \
When asked to suggest tasks, you must only respond with a JSON object that follows this schema: \
{ \"suggestions\": [\"task 1\", \"task 2\", \"task 3\"] }. \
Do not include any other text or markdown formatting in that specific response.";

pub const SUGGESTION_PROMPT: &str = "Suggest three simple and uplifting self-care activities for today.";

pub const CONNECTION_APOLOGY: &str =
    "I'm having a little trouble connecting right now. Let's try again in a moment.";
pub const SUGGESTIONS_THINKING: &str = "Let me think of some ideas for you...";
pub const SUGGESTIONS_INTRO: &str = "Here are a few simple things you could try:";
pub const SUGGESTIONS_EMPTY: &str =
    "I couldn't think of anything right now. Maybe we can try again later?";

/// Summary of today's activity prepended to every user message
pub fn activity_context(today_tasks: &[&Task], journal: &[JournalEntry]) -> String {
    let mut context = String::from("Here is a summary of the user's recent activity:\n");

    let completed: Vec<&str> = today_tasks
        .iter()
        .filter(|t| t.completed)
        .map(|t| t.text.as_str())
        .collect();
    if completed.is_empty() {
        context.push_str("- They haven't completed any tasks today.\n");
    } else {
        context.push_str(&format!("- Today, they completed: {}.\n", completed.join(", ")));
    }

    if let Some(latest) = journal.first() {
        context.push_str(&format!(
            "- Their latest journal entry is titled: \"{}\".\n",
            latest.title
        ));
    }

    context
}

#[derive(Deserialize)]
struct SuggestionPayload {
    #[serde(default)]
    suggestions: Vec<String>,
}

/// The two exchanges with the model service: conversation and suggestions.
pub struct Assistant {
    client: GeminiClient,
    system_instruction: String,
}

impl Assistant {
    pub fn new(client: GeminiClient, system_instruction: impl Into<String>) -> Self {
        Self {
            client,
            system_instruction: system_instruction.into(),
        }
    }

    pub fn from_config(config: &AssistantConfig) -> Self {
        let instruction = config
            .system_instruction
            .clone()
            .unwrap_or_else(|| SYSTEM_INSTRUCTION.to_string());
        Self::new(GeminiClient::from_config(config), instruction)
    }

    /// Start a new conversation owned by the caller
    pub fn open_session(&self) -> ChatSession {
        ChatSession::new(self.system_instruction.clone())
    }

    /// Forward a user message with activity context; apologise on failure
    pub async fn respond(
        &self,
        session: &mut ChatSession,
        message: &str,
        today_tasks: &[&Task],
        journal: &[JournalEntry],
    ) -> String {
        let full_message = format!(
            "{}\n\nUser: {}",
            activity_context(today_tasks, journal),
            message
        );
        match session.send(&self.client, &full_message).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "chat response failed");
                CONNECTION_APOLOGY.to_string()
            }
        }
    }

    /// Ask for a short list of activities; empty on any failure
    pub async fn suggest_tasks(&self) -> Vec<String> {
        match self.request_suggestions().await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, "task suggestions failed");
                Vec::new()
            }
        }
    }

    async fn request_suggestions(&self) -> Result<Vec<String>, GeminiError> {
        let request = gemini::Request {
            system_instruction: None,
            contents: vec![gemini::Content::user(SUGGESTION_PROMPT)],
            generation_config: Some(gemini::GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "suggestions": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" }
                        }
                    }
                })),
            }),
        };

        let text = self.client.generate(&request).await?;
        let payload: SuggestionPayload =
            serde_json::from_str(text.trim()).map_err(|e| GeminiError::Parse(e.to_string()))?;

        Ok(payload
            .suggestions
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Record a user message, obtain the reply and record it
    pub async fn converse(
        &self,
        session: &mut ChatSession,
        app: &mut App,
        message: &str,
        today: NaiveDate,
    ) -> Result<Option<ChatMessage>, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }
        app.push_chat_message(ChatMessage::user(message))?;

        let today_tasks = app.tasks_for(today);
        let reply = self
            .respond(session, message, &today_tasks, app.journal())
            .await;

        let reply = ChatMessage::model(reply);
        app.push_chat_message(reply.clone())?;
        Ok(Some(reply))
    }

    /// Record the suggestion exchange in the transcript and return the final message
    pub async fn suggest(&self, app: &mut App) -> Result<ChatMessage, AppError> {
        app.push_chat_message(ChatMessage::model(SUGGESTIONS_THINKING))?;

        let suggestions = self.suggest_tasks().await;
        let message = if suggestions.is_empty() {
            ChatMessage::model(SUGGESTIONS_EMPTY)
        } else {
            ChatMessage::model(SUGGESTIONS_INTRO).with_suggestions(suggestions)
        };
        app.push_chat_message(message.clone())?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::ChatRole;
    use mockito::Matcher;

    const PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn task(text: &str, completed: bool) -> Task {
        Task {
            id: format!("2026-10-19-{}", text.len()),
            text: text.to_string(),
            completed,
            date: "2026-10-19".to_string(),
        }
    }

    fn candidate(text: &str) -> String {
        json!({"candidates":[{"content":{"parts":[{"text": text}]}}]}).to_string()
    }

    fn assistant(url: String) -> Assistant {
        Assistant::new(
            GeminiClient::new(url, Some("k".into()), "gemini-2.5-flash"),
            SYSTEM_INSTRUCTION,
        )
    }

    #[test]
    fn context_lists_completed_tasks_and_latest_entry() {
        let walk = task("Walk", true);
        let read = task("Read", false);
        let stretch = task("Stretch", true);
        let journal = vec![
            JournalEntry::new("2".into(), "Sunny".into(), "b".into(), day().and_hms_opt(9, 0, 0).unwrap()),
            JournalEntry::new("1".into(), "Rainy".into(), "a".into(), day().and_hms_opt(8, 0, 0).unwrap()),
        ];

        let context = activity_context(&[&walk, &read, &stretch], &journal);
        assert_eq!(
            context,
            "Here is a summary of the user's recent activity:\n\
             - Today, they completed: Walk, Stretch.\n\
             - Their latest journal entry is titled: \"Sunny\".\n"
        );
    }

    #[test]
    fn persona_keeps_the_gardening_example() {
        assert!(SYSTEM_INSTRUCTION.contains(
            "if they've been gardening, you could say 'I see you've been spending time with your plants! That sounds so calming.'"
        ));
    }

    #[test]
    fn context_without_activity() {
        let read = task("Read", false);
        let context = activity_context(&[&read], &[]);
        assert_eq!(
            context,
            "Here is a summary of the user's recent activity:\n\
             - They haven't completed any tasks today.\n"
        );
    }

    #[tokio::test]
    async fn respond_prefixes_context_and_returns_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("User: How was my day\\?".to_string()),
                Matcher::Regex("haven't completed any tasks today".to_string()),
            ]))
            .with_status(200)
            .with_body(candidate("It sounds lovely."))
            .create_async()
            .await;

        let assistant = assistant(server.url());
        let mut session = assistant.open_session();
        let reply = assistant.respond(&mut session, "How was my day?", &[], &[]).await;

        assert_eq!(reply, "It sounds lovely.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn respond_apologises_on_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", PATH).with_status(503).create_async().await;

        let assistant = assistant(server.url());
        let mut session = assistant.open_session();
        let reply = assistant.respond(&mut session, "hello", &[], &[]).await;
        assert_eq!(reply, CONNECTION_APOLOGY);
    }

    #[tokio::test]
    async fn missing_key_degrades_to_fallbacks() {
        let assistant = Assistant::new(
            GeminiClient::new("http://127.0.0.1:9", None, "gemini-2.5-flash"),
            SYSTEM_INSTRUCTION,
        );
        let mut session = assistant.open_session();
        assert_eq!(assistant.respond(&mut session, "hi", &[], &[]).await, CONNECTION_APOLOGY);
        assert!(assistant.suggest_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn suggestions_are_parsed_from_json_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .with_status(200)
            .with_body(candidate(
                "{\"suggestions\": [\"Listen to a song\", \" \", \"Make tea\", \"Doodle\"]}",
            ))
            .create_async()
            .await;

        let suggestions = assistant(server.url()).suggest_tasks().await;
        assert_eq!(suggestions, vec!["Listen to a song", "Make tea", "Doodle"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_suggestions_yield_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(candidate("Sure! Here are some ideas: walk, tea, music"))
            .create_async()
            .await;

        assert!(assistant(server.url()).suggest_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn converse_records_both_sides_of_the_exchange() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(candidate("Glad to hear it!"))
            .create_async()
            .await;

        let assistant = assistant(server.url());
        let mut session = assistant.open_session();
        let mut app = App::new(Database::in_memory().unwrap(), day());

        assert!(assistant.converse(&mut session, &mut app, "   ", day()).await.unwrap().is_none());

        let reply = assistant
            .converse(&mut session, &mut app, "I feel good", day())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.text, "Glad to hear it!");

        let stored = app.database().load_chat_history();
        let texts: Vec<&str> = stored.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![crate::app::CHAT_GREETING, "I feel good", "Glad to hear it!"]);
        assert_eq!(stored[1].role, ChatRole::User);
    }

    #[tokio::test]
    async fn suggest_records_thinking_and_result() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(candidate("{\"suggestions\": [\"Water the plants\"]}"))
            .create_async()
            .await;

        let assistant = assistant(server.url());
        let mut app = App::new(Database::in_memory().unwrap(), day());
        let message = assistant.suggest(&mut app).await.unwrap();

        assert_eq!(message.text, SUGGESTIONS_INTRO);
        assert_eq!(app.latest_suggestions(), Some(&["Water the plants".to_string()][..]));

        let history = app.chat_history();
        assert_eq!(history[history.len() - 2].text, SUGGESTIONS_THINKING);

        // a suggestion can become today's task
        let added = app.add_task("Water the plants", day()).unwrap();
        assert!(added.is_some());
    }

    #[tokio::test]
    async fn suggest_reports_when_nothing_came_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", PATH).with_status(500).create_async().await;

        let assistant = assistant(server.url());
        let mut app = App::new(Database::in_memory().unwrap(), day());
        let message = assistant.suggest(&mut app).await.unwrap();
        assert_eq!(message.text, SUGGESTIONS_EMPTY);
        assert_eq!(message.suggestions, None);
    }
}
