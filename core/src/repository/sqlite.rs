use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Backend;
use crate::error::StoreError;
use crate::model::task::{self, NewTask, Task, TaskUpdate};
use crate::repository::title::unique_title;
use crate::repository::traits::TaskStore;

pub const DEFAULT_DB_NAME: &str = "todo.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        due_date TEXT,
        completed BOOLEAN NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )";

/// One connection for the store's lifetime. Every mutation is a single
/// autocommitted statement followed by a reload of the cached table.
pub struct SqliteTaskStore {
    conn: Connection,
    tasks: Vec<Task>,
}

impl SqliteTaskStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create data directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Could not open database {}", path.display()))?;
        let store = Self::with_connection(conn)?;
        info!(path = %path.display(), tasks = store.tasks.len(), "opened sqlite task store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        let mut store = SqliteTaskStore { conn, tasks: Vec::new() };
        store.reload()?;
        Ok(store)
    }

    fn reload(&mut self) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, due_date, completed, created_at, updated_at
             FROM tasks ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], RawTask::from_row)?;

        let mut tasks = Vec::new();
        for raw in rows {
            tasks.push(raw?.into_task()?);
        }
        drop(stmt);

        debug!(tasks = tasks.len(), "reloaded sqlite cache");
        self.tasks = tasks;
        Ok(())
    }

    // Titles come from the table rather than the cache so rows written by
    // another connection still take part in disambiguation.
    fn resolve_title(&self, requested: &str, exclude: Option<&Uuid>) -> Result<String> {
        let mut stmt = self.conn.prepare("SELECT id, title FROM tasks")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let exclude = exclude.map(|id| id.to_string());
        let mut titles = Vec::new();
        for row in rows {
            let (id, title) = row?;
            if Some(&id) != exclude.as_ref() {
                titles.push(title);
            }
        }
        Ok(unique_title(requested, titles.iter().map(String::as_str)))
    }
}

impl TaskStore for SqliteTaskStore {
    fn kind(&self) -> Backend {
        Backend::Sqlite
    }

    fn create(&mut self, new: NewTask) -> Result<Task> {
        let title = self.resolve_title(&new.title, None)?;
        let task = Task::from_new(new, title);

        self.conn.execute(
            "INSERT INTO tasks (id, title, description, due_date, completed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id.to_string(),
                task.title,
                task.description,
                task.due_date,
                task.completed,
                format_timestamp(&task.created_at),
                format_timestamp(&task.updated_at),
            ],
        )?;
        self.reload()?;
        Ok(task)
    }

    fn read_all(&self) -> &[Task] {
        &self.tasks
    }

    fn get(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    fn update(&mut self, id: &Uuid, changes: TaskUpdate) -> Result<bool> {
        let Some(current) = self.get(id) else {
            return Ok(false);
        };
        let mut task = current.clone();
        let title = match changes.title.as_deref() {
            Some(requested) => Some(self.resolve_title(requested, Some(id))?),
            None => None,
        };

        task.apply(changes, title);

        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?1, description = ?2, due_date = ?3, completed = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                task.title,
                task.description,
                task.due_date,
                task.completed,
                format_timestamp(&task.updated_at),
                id.to_string(),
            ],
        )?;
        self.reload()?;
        Ok(changed > 0)
    }

    fn delete(&mut self, id: &Uuid) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        self.reload()?;
        Ok(changed > 0)
    }

    fn mark_completed(&mut self, id: &Uuid, completed: bool) -> Result<bool> {
        let Some(current) = self.get(id) else {
            return Ok(false);
        };
        let mut task = current.clone();
        task.completed = completed;
        task.touch();

        let changed = self.conn.execute(
            "UPDATE tasks SET completed = ?1, updated_at = ?2 WHERE id = ?3",
            params![task.completed, format_timestamp(&task.updated_at), id.to_string()],
        )?;
        self.reload()?;
        Ok(changed > 0)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let store = *self;
        store.conn.close().map_err(|(_, e)| e)?;
        debug!("closed sqlite task store");
        Ok(())
    }
}

// Lossless: keeps sub-second precision so a reload compares equal.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(id: &str, field: &'static str, value: String) -> Result<DateTime<Utc>, StoreError> {
    task::parse_timestamp(&value).ok_or_else(|| StoreError::InvalidTimestamp {
        id: id.to_string(),
        field,
        value,
    })
}

// Columns as stored, before id and timestamps are parsed.
struct RawTask {
    id: String,
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    completed: bool,
    created_at: String,
    updated_at: String,
}

impl RawTask {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(RawTask {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: row.get("due_date")?,
            completed: row.get("completed")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        let id = Uuid::parse_str(&self.id).map_err(|_| StoreError::InvalidId(self.id.clone()))?;
        let created_at = parse_timestamp(&self.id, "created_at", self.created_at)?;
        let updated_at = parse_timestamp(&self.id, "updated_at", self.updated_at)?;
        Ok(Task {
            id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            due_date: self.due_date.unwrap_or_default(),
            completed: self.completed,
            created_at,
            updated_at,
        })
    }
}
