use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::utils::{format_date, format_timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    pub date: String, // ISO 8601: YYYY-MM-DD
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: String, // YYYY-MM-DDTHH:MM:SS
}

/// Running count of consecutive days with a qualifying action.
/// `last_update` is empty until the first one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Streak {
    pub count: u32,
    pub last_update: String, // YYYY-MM-DD or ""
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl Task {
    pub fn new(id: String, text: String, date: NaiveDate) -> Self {
        Self {
            id,
            text,
            completed: false,
            date: format_date(date),
        }
    }
}

impl JournalEntry {
    pub fn new(id: String, title: String, content: String, written_at: NaiveDateTime) -> Self {
        Self {
            id,
            title,
            content,
            date: format_timestamp(written_at),
        }
    }

    /// The calendar day part of the entry timestamp
    pub fn day(&self) -> &str {
        self.date.get(..10).unwrap_or(&self.date)
    }
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            suggestions: None,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
            suggestions: None,
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_uses_stored_field_names() {
        let json = serde_json::to_string(&Streak::default()).unwrap();
        assert_eq!(json, r#"{"count":0,"lastUpdate":""}"#);
    }

    #[test]
    fn chat_message_omits_missing_suggestions() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","text":"hi"}"#);

        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"model","text":"ideas","suggestions":["walk"]}"#).unwrap();
        assert_eq!(parsed.role, ChatRole::Model);
        assert_eq!(parsed.suggestions, Some(vec!["walk".to_string()]));
    }

    #[test]
    fn journal_entry_day_is_timestamp_prefix() {
        let written_at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(21, 5, 0)
            .unwrap();
        let entry = JournalEntry::new("1".into(), "Evening".into(), "Calm day".into(), written_at);
        assert_eq!(entry.date, "2026-10-19T21:05:00");
        assert_eq!(entry.day(), "2026-10-19");
    }
}
