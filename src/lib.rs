pub mod app;
pub mod assistant;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod database;
pub mod models;
pub mod streak;
pub mod utils;

pub use app::App;
pub use config::Config;
pub use database::Database;
pub use models::{ChatMessage, ChatRole, JournalEntry, Streak, Task, User};
pub use streak::update_streak;
pub use utils::Profile;
