use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use thiserror::Error;

use crate::app::{App, AppError};
use crate::assistant::Assistant;
use crate::calendar::MonthView;
use crate::models::{ChatMessage, ChatRole, JournalEntry};
use crate::utils::{self, parse_date, parse_month};
use chrono::NaiveDate;

#[derive(Parser)]
#[command(name = "aurora")]
#[command(about = "Aurora - daily self-care tasks, journal, streak and a chat companion")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set your display name
    Login {
        /// Your name
        name: String,
    },
    /// Show who is logged in
    Whoami,
    /// Show streak and today's progress (default if no subcommand)
    Dashboard,
    /// Today's checklist
    #[command(subcommand)]
    Tasks(TaskCommands),
    /// Journal entries
    #[command(subcommand)]
    Journal(JournalCommands),
    /// Chat with Aurora (interactive if no subcommand)
    Chat {
        #[command(subcommand)]
        command: Option<ChatCommands>,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List today's tasks
    List,
    /// Add a task for today
    Add {
        /// Task text
        text: String,
    },
    /// Mark a task done or not done
    Toggle {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum JournalCommands {
    /// List entries for one day (today unless --date is given)
    List {
        /// Day to show (YYYY-MM-DD)
        #[arg(long, conflicts_with = "all")]
        date: Option<String>,
        /// List every entry, newest first
        #[arg(long)]
        all: bool,
    },
    /// Write a new entry
    Add {
        /// Entry title
        #[arg(long)]
        title: String,
        /// Entry body
        #[arg(long)]
        content: String,
    },
    /// Show one entry in full
    Show {
        /// Entry ID
        id: String,
    },
    /// Month calendar with days that have entries marked
    Calendar {
        /// Month to show (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        /// Months to move from the shown month, e.g. -1 for the previous one
        #[arg(long, allow_hyphen_values = true)]
        offset: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum ChatCommands {
    /// Send one message
    Send {
        /// Message text
        message: String,
    },
    /// Ask for activity ideas
    Suggest,
    /// Print the conversation so far
    History,
    /// Turn one of the latest suggestions into a task
    AddSuggestion {
        /// Suggestion number as listed (1-based)
        number: usize,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Application error: {0}")]
    AppError(#[from] AppError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

const LOGIN_PROMPT: &str = "Welcome to Aurora! Please log in first: aurora login <name>";

/// Dispatch a parsed command against the application state
pub async fn run(command: Commands, app: &mut App, assistant: &Assistant) -> Result<(), CliError> {
    if let Commands::Login { name } = &command {
        return handle_login(name, app);
    }
    if app.user().is_none() {
        println!("{}", LOGIN_PROMPT);
        return Ok(());
    }

    match command {
        Commands::Login { .. } => Ok(()),
        Commands::Whoami => {
            if let Some(user) = app.user() {
                println!("{}", user.name);
            }
            Ok(())
        }
        Commands::Dashboard => handle_dashboard(app),
        Commands::Tasks(TaskCommands::List) => handle_list_tasks(app),
        Commands::Tasks(TaskCommands::Add { text }) => handle_add_task(&text, app),
        Commands::Tasks(TaskCommands::Toggle { id }) => handle_toggle_task(&id, app),
        Commands::Journal(JournalCommands::List { date, all }) => {
            handle_list_journal(date, all, app)
        }
        Commands::Journal(JournalCommands::Add { title, content }) => {
            handle_add_journal(&title, &content, app)
        }
        Commands::Journal(JournalCommands::Show { id }) => handle_show_journal(&id, app),
        Commands::Journal(JournalCommands::Calendar { month, offset }) => {
            handle_calendar(month, offset, app)
        }
        Commands::Chat { command: None } => handle_chat_interactive(app, assistant).await,
        Commands::Chat {
            command: Some(ChatCommands::Send { message }),
        } => {
            let mut session = assistant.open_session();
            let reply = assistant
                .converse(&mut session, app, &message, utils::today())
                .await?;
            session.close();
            if let Some(reply) = reply {
                print_chat_message(&reply);
            }
            Ok(())
        }
        Commands::Chat {
            command: Some(ChatCommands::Suggest),
        } => {
            let message = assistant.suggest(app).await?;
            print_chat_message(&message);
            Ok(())
        }
        Commands::Chat {
            command: Some(ChatCommands::History),
        } => {
            for message in app.chat_history() {
                print_chat_message(&message);
            }
            Ok(())
        }
        Commands::Chat {
            command: Some(ChatCommands::AddSuggestion { number }),
        } => handle_add_suggestion(number, app),
    }
}

/// Handle the login command
pub fn handle_login(name: &str, app: &mut App) -> Result<(), CliError> {
    if let Some(user) = app.user() {
        println!("Already logged in as {}.", user.name);
        return Ok(());
    }
    match app.login(name)? {
        Some(user) => println!("Welcome, {}!", user.name),
        None => println!("Please enter a name."),
    }
    Ok(())
}

pub fn handle_dashboard(app: &App) -> Result<(), CliError> {
    let summary = app.dashboard(utils::today());
    if let Some(name) = &summary.user_name {
        println!("Hello, {}!", name);
    }
    println!("{}", summary.greeting);
    println!();
    let days = if summary.streak.count == 1 { "day" } else { "days" };
    println!("Streak: {} {}", summary.streak.count, days);
    println!(
        "Today: {}/{} tasks done ({:.0}%)",
        summary.completed, summary.total, summary.progress_percent
    );
    Ok(())
}

pub fn handle_list_tasks(app: &App) -> Result<(), CliError> {
    let tasks = app.tasks_for(utils::today());
    if tasks.is_empty() {
        println!("No tasks for today.");
    }
    for task in tasks {
        let mark = if task.completed { "x" } else { " " };
        println!("[{}] {}  {}", mark, task.id, task.text);
    }
    Ok(())
}

/// Handle the tasks add command
pub fn handle_add_task(text: &str, app: &mut App) -> Result<(), CliError> {
    match app.add_task(text, utils::today())? {
        Some(task) => println!("Task added (ID: {})", task.id),
        None => println!("Nothing added: task is empty or already on today's list."),
    }
    Ok(())
}

pub fn handle_toggle_task(id: &str, app: &mut App) -> Result<(), CliError> {
    match app.toggle_task(id, utils::today())? {
        Some(task) => {
            let state = if task.completed { "done" } else { "not done" };
            println!("'{}' marked {}", task.text, state);
            if task.completed {
                println!("Streak: {}", app.streak().count);
            }
        }
        None => println!("No task with ID {}", id),
    }
    Ok(())
}

/// Entries to list: every entry with `all`, otherwise one day (default `today`)
pub fn journal_listing<'a>(
    date: Option<&str>,
    all: bool,
    app: &'a App,
    today: NaiveDate,
) -> Result<Vec<&'a JournalEntry>, CliError> {
    if all {
        return Ok(app.journal().iter().collect());
    }
    let day = match date {
        Some(date_str) => parse_date(date_str).map_err(|e| {
            CliError::DateParseError(format!("Invalid date format '{}': {}", date_str, e))
        })?,
        None => today,
    };
    Ok(app.journal_for(day))
}

pub fn handle_list_journal(date: Option<String>, all: bool, app: &App) -> Result<(), CliError> {
    let entries = journal_listing(date.as_deref(), all, app, utils::today())?;

    if entries.is_empty() {
        println!("No entries.");
    }
    for entry in entries {
        println!("{}  {}  {}", entry.id, entry.date, entry.title);
    }
    Ok(())
}

/// Handle the journal add command
pub fn handle_add_journal(title: &str, content: &str, app: &mut App) -> Result<(), CliError> {
    match app.add_journal_entry(title, content, utils::now())? {
        Some(entry) => {
            println!("Journal entry saved (ID: {})", entry.id);
            println!("Streak: {}", app.streak().count);
        }
        None => println!("Nothing saved: an entry needs both a title and some text."),
    }
    Ok(())
}

pub fn handle_show_journal(id: &str, app: &App) -> Result<(), CliError> {
    match app.journal_entry(id) {
        Some(entry) => {
            println!("{}", entry.title);
            println!("{}", entry.date);
            println!();
            println!("{}", entry.content);
        }
        None => println!("No journal entry with ID {}", id),
    }
    Ok(())
}

/// Month view for `--month` (default: the current month), moved by `--offset` months
pub fn calendar_view(
    month: Option<&str>,
    offset: Option<i32>,
    app: &App,
    today: NaiveDate,
) -> Result<MonthView, CliError> {
    let mut view = MonthView::new(today, app.journal_dates());
    if let Some(month_str) = month {
        let start = parse_month(month_str).map_err(|e| {
            CliError::DateParseError(format!("Invalid month format '{}': {}", month_str, e))
        })?;
        view.select(start);
    }
    if let Some(offset) = offset {
        view.shift(offset);
    }
    Ok(view)
}

pub fn handle_calendar(month: Option<String>, offset: Option<i32>, app: &App) -> Result<(), CliError> {
    let view = calendar_view(month.as_deref(), offset, app, utils::today())?;
    print!("{}", view.render());
    Ok(())
}

pub fn handle_add_suggestion(number: usize, app: &mut App) -> Result<(), CliError> {
    let suggestion = app
        .latest_suggestions()
        .and_then(|list| number.checked_sub(1).and_then(|i| list.get(i)))
        .cloned();
    match suggestion {
        Some(text) => handle_add_task(&text, app),
        None => {
            println!("No suggestion number {}", number);
            Ok(())
        }
    }
}

/// One line typed into the interactive chat
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Quit,
    Suggest,
    /// `/add <n>`; `None` when the number is missing or invalid
    AddSuggestion(Option<usize>),
    Message(&'a str),
}

impl<'a> ChatInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        let input = line.trim();
        match input {
            "/quit" | "/exit" => ChatInput::Quit,
            "/suggest" => ChatInput::Suggest,
            "/add" => ChatInput::AddSuggestion(None),
            _ => match input.strip_prefix("/add ") {
                Some(rest) => ChatInput::AddSuggestion(rest.trim().parse().ok()),
                None => ChatInput::Message(input),
            },
        }
    }
}

/// Read-eval loop holding one chat session for its whole lifetime
pub async fn handle_chat_interactive(app: &mut App, assistant: &Assistant) -> Result<(), CliError> {
    for message in app.chat_history() {
        print_chat_message(&message);
    }
    println!("(type a message, /suggest for ideas, /add <n> to add an idea, /quit to leave)");

    let mut session = assistant.open_session();
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;

        match ChatInput::parse(&line) {
            ChatInput::Quit => break,
            ChatInput::Suggest => {
                let message = assistant.suggest(app).await?;
                print_chat_message(&message);
            }
            ChatInput::AddSuggestion(Some(number)) => handle_add_suggestion(number, app)?,
            ChatInput::AddSuggestion(None) => println!("Usage: /add <number>"),
            ChatInput::Message(text) => {
                if let Some(reply) = assistant
                    .converse(&mut session, app, text, utils::today())
                    .await?
                {
                    print_chat_message(&reply);
                }
            }
        }
    }

    session.close();
    Ok(())
}

fn print_chat_message(message: &ChatMessage) {
    let speaker = match message.role {
        ChatRole::User => "You",
        ChatRole::Model => "Aurora",
    };
    println!("{}: {}", speaker, message.text);
    if let Some(suggestions) = &message.suggestions {
        for (i, suggestion) in suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, suggestion);
        }
    }
}
