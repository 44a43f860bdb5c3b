use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Format used for calendar days throughout the stored records
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used for journal entry timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "aurora-dev",
            Profile::Prod => "aurora",
        }
    }
}

/// Get the configuration directory path for Aurora
/// If profile is Dev, uses "aurora-dev" instead of "aurora"
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "aurora", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path for Aurora
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "aurora", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, DATE_FORMAT)
}

/// Parse a month string (YYYY-MM) into the first day of that month
pub fn parse_month(month_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(&format!("{}-01", month_str.trim()), DATE_FORMAT)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Today's calendar day on the local clock.
///
/// Only the command-line layer calls this; everything below it takes the
/// current date as a parameter.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The current local time, truncated to whole seconds
pub fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
