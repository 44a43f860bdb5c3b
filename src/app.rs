use chrono::{Datelike, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::{ChatMessage, JournalEntry, Streak, Task, User};
use crate::streak::update_streak;
use crate::utils::format_date;

/// Daily checklist seeded when a day has no tasks yet
pub const TASK_TEMPLATES: [&str; 4] = [
    "Drink a glass of water",
    "Take a 5-minute walk outside",
    "Write down one thing you're grateful for",
    "Stretch for 10 minutes",
];

pub const GREETINGS: [&str; 4] = [
    "What wonderful things will you do today?",
    "Ready to make today amazing?",
    "Let's start this day with a positive step.",
    "Your journey of self-care continues today.",
];

pub const CHAT_GREETING: &str = "Hey there! I'm Aurora. How are you feeling today?";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

/// Snapshot shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub user_name: Option<String>,
    pub greeting: &'static str,
    pub streak: Streak,
    pub completed: usize,
    pub total: usize,
    pub progress_percent: f64,
}

/// In-memory application state over the record store.
///
/// Every mutation writes the affected record back straight away. Nothing is
/// merged: the in-memory copy is always the authority.
pub struct App {
    db: Database,
    user: Option<User>,
    tasks: Vec<Task>,
    journal: Vec<JournalEntry>,
    streak: Streak,
    chat_history: Vec<ChatMessage>,
}

impl App {
    /// Load every record and seed today's checklist if it is empty
    pub fn new(db: Database, today: NaiveDate) -> Self {
        let user = db.load_user();
        let mut tasks = db.load_all_tasks();
        let mut journal = db.load_journal_entries();
        let streak = db.load_streak();
        let chat_history = db.load_chat_history();

        let today_str = format_date(today);
        if !tasks.iter().any(|t| t.date == today_str) {
            tracing::debug!(date = %today_str, "seeding daily task templates");
            tasks.extend(TASK_TEMPLATES.iter().enumerate().map(|(i, text)| {
                Task::new(format!("{}-{}", today_str, i + 1), text.to_string(), today)
            }));
        }

        // Timestamps share one fixed-width format, so string order is time order
        journal.sort_by(|a, b| b.date.cmp(&a.date));

        Self {
            db,
            user,
            tasks,
            journal,
            streak,
            chat_history,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Record the display name on first login. Blank names are ignored, and
    /// so is any login once a user exists.
    pub fn login(&mut self, name: &str) -> Result<Option<&User>, AppError> {
        let name = name.trim();
        if name.is_empty() || self.user.is_some() {
            return Ok(None);
        }
        let user = User {
            name: name.to_string(),
        };
        self.db.save_user(&user)?;
        tracing::info!(name = %user.name, "user logged in");
        self.user = Some(user);
        Ok(self.user.as_ref())
    }

    pub fn streak(&self) -> &Streak {
        &self.streak
    }

    pub fn tasks_for(&self, day: NaiveDate) -> Vec<&Task> {
        let day = format_date(day);
        self.tasks.iter().filter(|t| t.date == day).collect()
    }

    /// Add a task for `today`.
    ///
    /// Returns `None` without touching anything when the text is blank or
    /// matches (case-insensitively) a task already on today's list.
    pub fn add_task(&mut self, text: &str, today: NaiveDate) -> Result<Option<Task>, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let today_str = format_date(today);
        let lowered = text.to_lowercase();
        if self
            .tasks
            .iter()
            .any(|t| t.date == today_str && t.text.to_lowercase() == lowered)
        {
            tracing::debug!(text, "duplicate task ignored");
            return Ok(None);
        }

        let mut sequence = self.tasks.iter().filter(|t| t.date == today_str).count() + 1;
        let mut id = format!("{}-{}", today_str, sequence);
        while self.tasks.iter().any(|t| t.id == id) {
            sequence += 1;
            id = format!("{}-{}", today_str, sequence);
        }

        let task = Task::new(id, text.to_string(), today);
        self.tasks.push(task.clone());
        self.db.save_tasks(&self.tasks)?;
        tracing::info!(id = %task.id, "task added");
        Ok(Some(task))
    }

    /// Flip a task's completion. Completing a task credits the streak for `today`.
    ///
    /// Only today's tasks can be toggled. Returns the updated task, or `None`
    /// if today's list has no task with that id.
    pub fn toggle_task(&mut self, id: &str, today: NaiveDate) -> Result<Option<Task>, AppError> {
        let today_str = format_date(today);
        let Some(task) = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.date == today_str)
        else {
            return Ok(None);
        };
        task.completed = !task.completed;
        let task = task.clone();

        self.db.save_tasks(&self.tasks)?;
        tracing::info!(id = %task.id, completed = task.completed, "task toggled");

        if task.completed {
            self.credit_streak(today)?;
        }
        Ok(Some(task))
    }

    /// Journal entries, newest first
    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    pub fn journal_entry(&self, id: &str) -> Option<&JournalEntry> {
        self.journal.iter().find(|e| e.id == id)
    }

    /// Entries written on the given calendar day, newest first
    pub fn journal_for(&self, day: NaiveDate) -> Vec<&JournalEntry> {
        let day = format_date(day);
        self.journal.iter().filter(|e| e.day() == day).collect()
    }

    /// Every calendar day that has at least one entry
    pub fn journal_dates(&self) -> Vec<String> {
        let mut dates: Vec<String> = self.journal.iter().map(|e| e.day().to_string()).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Save a journal entry written at `now`. Credits the streak.
    ///
    /// Returns `None` without saving when the title or body is blank.
    pub fn add_journal_entry(
        &mut self,
        title: &str,
        content: &str,
        now: NaiveDateTime,
    ) -> Result<Option<JournalEntry>, AppError> {
        let (title, content) = (title.trim(), content.trim());
        if title.is_empty() || content.is_empty() {
            return Ok(None);
        }

        let mut millis = now.and_utc().timestamp_millis();
        while self.journal.iter().any(|e| e.id == millis.to_string()) {
            millis += 1;
        }

        let entry = JournalEntry::new(millis.to_string(), title.to_string(), content.to_string(), now);
        self.journal.insert(0, entry.clone());
        self.db.save_journal_entries(&self.journal)?;
        tracing::info!(id = %entry.id, "journal entry saved");

        self.credit_streak(now.date())?;
        Ok(Some(entry))
    }

    fn credit_streak(&mut self, today: NaiveDate) -> Result<(), AppError> {
        let updated = update_streak(&self.streak, today);
        if updated != self.streak {
            self.db.save_streak(&updated)?;
            tracing::info!(count = updated.count, "streak updated");
            self.streak = updated;
        }
        Ok(())
    }

    /// The chat transcript, opening with the assistant's greeting when empty
    pub fn chat_history(&self) -> Vec<ChatMessage> {
        if self.chat_history.is_empty() {
            vec![ChatMessage::model(CHAT_GREETING)]
        } else {
            self.chat_history.clone()
        }
    }

    /// Append to the transcript and persist it
    pub fn push_chat_message(&mut self, message: ChatMessage) -> Result<(), AppError> {
        if self.chat_history.is_empty() {
            self.chat_history.push(ChatMessage::model(CHAT_GREETING));
        }
        self.chat_history.push(message);
        self.db.save_chat_history(&self.chat_history)?;
        Ok(())
    }

    /// Suggestions attached to the most recent assistant message that has any
    pub fn latest_suggestions(&self) -> Option<&[String]> {
        self.chat_history
            .iter()
            .rev()
            .find_map(|m| m.suggestions.as_deref())
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardSummary {
        let tasks = self.tasks_for(today);
        let completed = tasks.iter().filter(|t| t.completed).count();
        let total = tasks.len();
        let progress_percent = if total > 0 {
            completed as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let greeting = GREETINGS[today.ordinal0() as usize % GREETINGS.len()];

        DashboardSummary {
            user_name: self.user.as_ref().map(|u| u.name.clone()),
            greeting,
            streak: self.streak.clone(),
            completed,
            total,
            progress_percent,
        }
    }
}
