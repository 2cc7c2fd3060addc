mod input;
mod menu;
mod render;

use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use clap::Parser;
use todolist_core::{open_store, Backend, NewTask, StoreConfig, TaskStore, TaskUpdate};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::input::{parse_confirmation, resolve_id, validate_description, validate_due_date, validate_title};
use crate::menu::{AppInfo, Menu};
use crate::render::{summary, task_details, task_table};

#[derive(Parser)]
#[command(name = "todolist")]
#[command(about = "A terminal to-do list backed by a JSON file or SQLite", long_about = None)]
struct Cli {
    /// Storage backend: json or sqlite
    #[arg(long, global = true, env = "TODOLIST_BACKEND", default_value = "json", value_parser = Backend::from_str)]
    backend: Backend,

    /// Directory holding todo.json / todo.db (defaults to ~/.todolist)
    #[arg(long, global = true, env = "TODOLIST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        title: String,
        #[arg(short, long)]
        description: String,
        /// Due date as "YYYY-MM-DD HH:MM"
        #[arg(long)]
        due: String,
    },
    /// List all tasks
    List,
    /// Show one task (id or id prefix)
    Show { id: String },
    /// Change some fields of a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Mark a task as completed
    Done { id: String },
    /// Mark a task as not completed
    Undone { id: String },
    /// Delete a task
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show task counts
    Stats,
    /// Open the interactive menu
    Menu,
}

fn init_logging() {
    // stderr keeps log lines out of the menu and list output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = StoreConfig::new(cli.backend, cli.data_dir)?;
    run(&config, cli.command.unwrap_or(Commands::Menu))
}

// The store is closed even when the command fails.
fn run(config: &StoreConfig, command: Commands) -> Result<()> {
    debug!(backend = %config.backend, path = %config.storage_path().display(), "resolved store");
    let mut store = open_store(config)?;
    let result = execute(store.as_mut(), command);
    if let Err(e) = &result {
        info!(error = %e, "command failed");
    }
    store.close()?;
    result
}

fn execute(store: &mut dyn TaskStore, command: Commands) -> Result<()> {
    match command {
        Commands::Add { title, description, due } => {
            let new = NewTask::new(
                validate_title(&title)?,
                validate_description(&description)?,
                validate_due_date(&due)?,
            );
            let task = store.create(new)?;
            println!("Task added: {} (ID: {})", task.title, task.id);
        }
        Commands::List => {
            println!("{}", task_table(store.read_all()));
        }
        Commands::Show { id } => {
            let id = resolve_id(store.read_all(), &id)?;
            match store.get(&id) {
                Some(task) => println!("{}", task_details(task)),
                None => bail!("Task {} not found.", id),
            }
        }
        Commands::Edit { id, title, description, due } => {
            let id = resolve_id(store.read_all(), &id)?;
            let changes = TaskUpdate {
                title: title.as_deref().map(validate_title).transpose()?,
                description: description.as_deref().map(validate_description).transpose()?,
                due_date: due.as_deref().map(validate_due_date).transpose()?,
                completed: None,
            };
            if !store.update(&id, changes)? {
                bail!("Task {} not found.", id);
            }
            println!("Task updated.");
        }
        Commands::Done { id } => set_completed(store, &id, true)?,
        Commands::Undone { id } => set_completed(store, &id, false)?,
        Commands::Delete { id, yes } => {
            let id = resolve_id(store.read_all(), &id)?;
            let Some(task) = store.get(&id) else {
                bail!("Task {} not found.", id);
            };
            if !yes && !confirm(&format!("Delete '{}'?", task.title))? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete(&id)?;
            println!("Task deleted.");
        }
        Commands::Stats => {
            println!("{}", summary(store));
        }
        Commands::Menu => {
            let stdin = io::stdin();
            Menu::new(store, stdin.lock(), io::stdout(), AppInfo::default()).run()?;
        }
    }
    Ok(())
}

fn set_completed(store: &mut dyn TaskStore, id: &str, completed: bool) -> Result<()> {
    let id = resolve_id(store.read_all(), id)?;
    if !store.mark_completed(&id, completed)? {
        bail!("Task {} not found.", id);
    }
    println!("Task marked as {}.", if completed { "completed" } else { "not completed" });
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    loop {
        println!("{} (y/n)", question);
        let mut answer = String::new();
        if stdin.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        match parse_confirmation(&answer) {
            Some(answer) => return Ok(answer),
            None => println!("Please enter 'y' for yes or 'n' for no."),
        }
    }
}
