use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Serializer;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Backend;
use crate::model::task::{NewTask, Task, TaskUpdate};
use crate::repository::title::resolve_title;
use crate::repository::traits::TaskStore;

pub const DEFAULT_FILE_NAME: &str = "todo.json";

#[derive(Deserialize, Default)]
struct TaskDocument {
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct TaskDocumentRef<'a> {
    tasks: &'a [Task],
}

/// Keeps the whole collection in memory and rewrites the document after
/// every mutation.
pub struct JsonTaskStore {
    file_path: PathBuf,
    tasks: Vec<Task>,
}

impl JsonTaskStore {
    /// Loads `file_path` if it exists and is non-empty, otherwise starts
    /// empty. The file itself is not written until the first mutation.
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Could not create data directory {}", parent.display()))?;
        }

        let tasks = Self::load(&file_path)?;
        info!(path = %file_path.display(), tasks = tasks.len(), "opened json task store");
        Ok(JsonTaskStore { file_path, tasks })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(path: &Path) -> Result<Vec<Task>> {
        let is_empty = match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if is_empty {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let document: TaskDocument = serde_json::from_reader(reader)
            .with_context(|| format!("Could not parse task file {}", path.display()))?;
        Ok(document.tasks)
    }

    fn save(&self) -> Result<()> {
        let file = File::create(&self.file_path)?;
        let mut writer = BufWriter::new(file);
        let mut serializer = Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        TaskDocumentRef { tasks: &self.tasks }.serialize(&mut serializer)?;
        writer.flush()?;
        debug!(path = %self.file_path.display(), tasks = self.tasks.len(), "saved task file");
        Ok(())
    }

    fn position(&self, id: &Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == *id)
    }

    // Adopts `next` only once it has been written out.
    fn commit(&mut self, next: Vec<Task>) -> Result<()> {
        let previous = std::mem::replace(&mut self.tasks, next);
        if let Err(e) = self.save() {
            self.tasks = previous;
            return Err(e);
        }
        Ok(())
    }
}

impl TaskStore for JsonTaskStore {
    fn kind(&self) -> Backend {
        Backend::Json
    }

    fn create(&mut self, new: NewTask) -> Result<Task> {
        let title = resolve_title(&self.tasks, &new.title, None);
        let task = Task::from_new(new, title);

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;
        Ok(task)
    }

    fn read_all(&self) -> &[Task] {
        &self.tasks
    }

    fn get(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    fn update(&mut self, id: &Uuid, changes: TaskUpdate) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        let title = changes
            .title
            .as_deref()
            .map(|requested| resolve_title(&self.tasks, requested, Some(id)));

        let mut next = self.tasks.clone();
        next[pos].apply(changes, title);
        self.commit(next)?;
        Ok(true)
    }

    fn delete(&mut self, id: &Uuid) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        next.remove(pos);
        self.commit(next)?;
        Ok(true)
    }

    fn mark_completed(&mut self, id: &Uuid, completed: bool) -> Result<bool> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };

        let mut next = self.tasks.clone();
        next[pos].completed = completed;
        next[pos].touch();
        self.commit(next)?;
        Ok(true)
    }

    fn close(self: Box<Self>) -> Result<()> {
        debug!(path = %self.file_path.display(), "closed json task store");
        Ok(())
    }
}
