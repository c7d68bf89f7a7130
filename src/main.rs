//! `todo-planner`: command-line front end for the task store.
//!
//! ```bash
//! todo-planner add "Buy milk" --category personal --priority low
//! todo-planner reminders --mode today
//! todo-planner stats --range month
//! TODO_PLANNER_DATA_DIR=/tmp/planner todo-planner list --status todo
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use todo_planner_lib::commands::{self, CommandCtx, CommandResult, Notice};
use todo_planner_lib::config::{resolve_data_dir, DATA_DIR_ENV};
use todo_planner_lib::logging::init_logging;
use todo_planner_lib::{
    Category, Priority, ReminderMode, StatusFilter, StorageError, TaskDraft, TaskFilter,
    ThemeMode, TimeRange,
};

#[derive(Debug, Parser)]
#[command(name = "todo-planner", version, about = "Personal task planner")]
struct Cli {
    /// Directory holding task/settings records, exports and logs.
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    /// Echo informational log lines to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print tasks and settings.
    State,
    /// Create a task.
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "personal")]
        category: Category,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// RFC 3339, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD` (local time).
        #[arg(long, value_parser = parse_when)]
        due: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_when)]
        remind: Option<DateTime<Utc>>,
    },
    /// Change fields of an existing task; omitted fields keep their value.
    /// An unknown id changes nothing and prints `null`.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<Category>,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long, value_parser = parse_when, conflicts_with = "clear_due")]
        due: Option<DateTime<Utc>>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, value_parser = parse_when, conflicts_with = "clear_remind")]
        remind: Option<DateTime<Utc>>,
        #[arg(long)]
        clear_remind: bool,
    },
    /// Delete a task.
    Delete { id: String },
    /// Flip a task between done and not done.
    Toggle { id: String },
    /// Delete every task.
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Replace all tasks with an exported JSON array.
    Import { path: PathBuf },
    /// Write all tasks as a JSON array.
    Export {
        /// Defaults to `<data dir>/exports/todo-list-backup-<date>.json`.
        path: Option<PathBuf>,
    },
    /// List tasks.
    List {
        #[arg(short, long, default_value = "")]
        query: String,
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,
        #[arg(short, long)]
        category: Option<Category>,
    },
    /// Show reminders: overdue plus one bucket.
    Reminders {
        #[arg(short, long, default_value = "upcoming")]
        mode: ReminderMode,
    },
    /// Completion statistics.
    Stats {
        #[arg(short, long, default_value = "week")]
        range: TimeRange,
    },
    /// Change appearance.
    Theme {
        #[arg(long)]
        mode: Option<ThemeMode>,
        #[arg(long)]
        accent: Option<String>,
    },
    /// Change the interface language (zh-CN, en-US, ja-JP, ko-KR).
    Language { tag: String },
    /// Turn reminder notifications on or off.
    Notifications {
        /// `on`/`off` (also `yes`/`no`, `true`/`false`).
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
}

struct CliCtx {
    data_dir: PathBuf,
}

impl CommandCtx for CliCtx {
    fn data_dir(&self) -> Result<PathBuf, StorageError> {
        Ok(self.data_dir.clone())
    }

    fn notify(&self, notice: Notice) {
        log::info!("notice title={} destructive={}", notice.title, notice.destructive);
        match notice.description {
            Some(description) => eprintln!("{} - {description}", notice.title),
            None => eprintln!("{}", notice.title),
        }
    }

    fn request_notification_permission(&self) -> Result<bool, String> {
        // A terminal has no permission prompt to show.
        Ok(true)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ctx = CliCtx {
        data_dir: resolve_data_dir(cli.data_dir.clone()),
    };

    let _logger = match init_logging(&ctx.data_dir, cli.verbose) {
        Ok(handle) => Some(handle),
        Err(error) => {
            eprintln!("warning: file logging disabled: {error}");
            None
        }
    };

    let store = match commands::open_store(&ctx) {
        Ok(store) => store,
        Err(error) => {
            eprintln!("error: cannot open task store in {}: {error}", ctx.data_dir.display());
            return ExitCode::FAILURE;
        }
    };
    store.subscribe(|event| {
        log::debug!(
            "state updated kind={:?} count={}",
            event.kind,
            event.tasks.len()
        );
    });

    match cli.command {
        Command::State => emit(commands::load_state(&ctx, &store)),
        Command::Add {
            title,
            description,
            category,
            priority,
            due,
            remind,
        } => emit(commands::create_task(
            &store,
            TaskDraft {
                title,
                description,
                category,
                priority,
                due_date: due,
                reminder_date: remind,
            },
        )),
        Command::Edit {
            id,
            title,
            description,
            category,
            priority,
            due,
            clear_due,
            remind,
            clear_remind,
        } => {
            let mut draft = store
                .get(&id)
                .map(|existing| TaskDraft::from(&existing))
                .unwrap_or_default();
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if clear_due {
                draft.due_date = None;
            } else if due.is_some() {
                draft.due_date = due;
            }
            if clear_remind {
                draft.reminder_date = None;
            } else if remind.is_some() {
                draft.reminder_date = remind;
            }
            emit(commands::update_task(&store, &id, draft))
        }
        Command::Delete { id } => emit(commands::delete_task(&store, &id)),
        Command::Toggle { id } => emit(commands::toggle_task(&store, &id)),
        Command::Clear { yes } => {
            if !yes {
                eprintln!("refusing to delete every task without --yes");
                return ExitCode::FAILURE;
            }
            emit(commands::clear_tasks(&store))
        }
        Command::Import { path } => emit(commands::import_tasks(&ctx, &store, &path)),
        Command::Export { path } => emit(commands::export_tasks(&ctx, &store, path)),
        Command::List {
            query,
            status,
            category,
        } => emit(commands::list_tasks(
            &store,
            &TaskFilter {
                query,
                status,
                category,
            },
        )),
        Command::Reminders { mode } => emit(commands::list_reminders(&ctx, &store, mode)),
        Command::Stats { range } => emit(commands::get_statistics(&store, range)),
        Command::Theme { mode, accent } => {
            let current = commands::load_state(&ctx, &store)
                .data
                .map(|state| state.theme)
                .unwrap_or_default();
            let mut theme = current;
            if let Some(mode) = mode {
                theme.theme = mode;
            }
            if let Some(accent) = accent {
                theme.accent_color = accent;
            }
            emit(commands::update_theme(&ctx, theme))
        }
        Command::Language { tag } => emit(commands::update_language(&ctx, &tag)),
        Command::Notifications { enabled } => {
            emit(commands::set_notifications_enabled(&ctx, enabled))
        }
    }
}

fn emit<T: Serialize>(result: CommandResult<T>) -> ExitCode {
    if !result.ok {
        eprintln!("error: {}", result.error.unwrap_or_default());
        return ExitCode::FAILURE;
    }
    match serde_json::to_string_pretty(&result.data) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: cannot encode output: {error}");
            ExitCode::FAILURE
        }
    }
}

fn parse_when(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| format!("cannot read `{value}` as a date or time"))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("`{value}` does not exist in the local time zone"))
}
