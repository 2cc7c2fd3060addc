use std::io::{BufRead, Write};

use anyhow::Result;
use todolist_core::{NewTask, TaskStore, TaskUpdate};
use uuid::Uuid;

use crate::input::{parse_confirmation, validate_description, validate_due_date, validate_title};
use crate::render::{summary, task_details, task_table};

/// Header and footer text shown by the menu. Empty fields are not printed.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub name: String,
    pub url: String,
    pub copyright: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: format!("todolist {}", env!("CARGO_PKG_VERSION")),
            url: env!("CARGO_PKG_REPOSITORY").to_string(),
            copyright: "Copyright (c) todolist contributors".to_string(),
        }
    }
}

/// Interactive text menu. Reads answers from `input` and writes everything
/// to `output`; end of input behaves like choosing "exit".
pub struct Menu<'a, R: BufRead, W: Write> {
    store: &'a mut dyn TaskStore,
    input: R,
    output: W,
    info: AppInfo,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(store: &'a mut dyn TaskStore, input: R, output: W, info: AppInfo) -> Self {
        Self { store, input, output, info }
    }

    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "== {} ==", self.info.name)?;
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "{}", summary(&*self.store))?;
            writeln!(self.output, "1. Add task")?;
            writeln!(self.output, "2. List tasks")?;
            writeln!(self.output, "3. Open task")?;
            writeln!(self.output, "0. Exit")?;

            let Some(choice) = self.prompt("Select an option")? else {
                break;
            };
            match choice.trim() {
                "1" => self.add_task()?,
                "2" => {
                    let table = task_table(self.store.read_all());
                    writeln!(self.output, "{}", table)?;
                }
                "3" => self.open_task()?,
                "0" => break,
                _ => writeln!(self.output, "Invalid option!")?,
            }
        }
        writeln!(self.output, "Bye.")?;
        self.show_footer()
    }

    fn show_footer(&mut self) -> Result<()> {
        writeln!(self.output, "----")?;
        for line in [&self.info.url, &self.info.copyright] {
            if !line.is_empty() {
                writeln!(self.output, "{}", line)?;
            }
        }
        Ok(())
    }

    fn add_task(&mut self) -> Result<()> {
        let Some(title) = self.prompt_valid("Title", validate_title)? else {
            return Ok(());
        };
        let Some(description) = self.prompt_valid("Description", validate_description)? else {
            return Ok(());
        };
        let Some(due_date) = self.prompt_valid("Due date (YYYY-MM-DD HH:MM)", validate_due_date)? else {
            return Ok(());
        };

        let task = self.store.create(NewTask::new(title, description, due_date))?;
        writeln!(self.output, "Task added: {}", task.title)?;
        Ok(())
    }

    fn open_task(&mut self) -> Result<()> {
        if self.store.count() == 0 {
            writeln!(self.output, "No tasks found.")?;
            return Ok(());
        }
        let table = task_table(self.store.read_all());
        writeln!(self.output, "{}", table)?;

        let Some(answer) = self.prompt("Task number (0 to go back)")? else {
            return Ok(());
        };
        let id = match answer.trim().parse::<usize>() {
            Ok(0) => return Ok(()),
            Ok(n) if n <= self.store.count() => self.store.read_all()[n - 1].id,
            _ => {
                writeln!(self.output, "Invalid task number!")?;
                return Ok(());
            }
        };
        self.task_menu(id)
    }

    fn task_menu(&mut self, id: Uuid) -> Result<()> {
        loop {
            let Some(task) = self.store.get(&id) else {
                return Ok(());
            };
            let details = task_details(task);
            let toggle = if task.completed { "Mark as not completed" } else { "Mark as completed" };
            let completed = task.completed;

            writeln!(self.output)?;
            writeln!(self.output, "{}", details)?;
            writeln!(self.output, "1. Edit")?;
            writeln!(self.output, "2. {}", toggle)?;
            writeln!(self.output, "3. Delete")?;
            writeln!(self.output, "0. Back")?;

            let Some(choice) = self.prompt("Select an option")? else {
                return Ok(());
            };
            match choice.trim() {
                "1" => self.edit_task(&id)?,
                "2" => {
                    self.store.mark_completed(&id, !completed)?;
                }
                "3" => {
                    if self.delete_task(&id)? {
                        return Ok(());
                    }
                }
                "0" => return Ok(()),
                _ => writeln!(self.output, "Invalid option!")?,
            }
        }
    }

    fn edit_task(&mut self, id: &Uuid) -> Result<()> {
        writeln!(self.output, "Leave a field empty to keep its current value.")?;
        let mut changes = TaskUpdate::default();

        match self.prompt_change("Title", validate_title)? {
            Some(title) => changes.title = title,
            None => return Ok(()),
        }
        match self.prompt_change("Description", validate_description)? {
            Some(description) => changes.description = description,
            None => return Ok(()),
        }
        match self.prompt_change("Due date (YYYY-MM-DD HH:MM)", validate_due_date)? {
            Some(due_date) => changes.due_date = due_date,
            None => return Ok(()),
        }

        if changes.is_empty() {
            writeln!(self.output, "Nothing changed.")?;
            return Ok(());
        }
        if self.store.update(id, changes)? {
            writeln!(self.output, "Task updated.")?;
        }
        Ok(())
    }

    fn delete_task(&mut self, id: &Uuid) -> Result<bool> {
        loop {
            let Some(answer) = self.prompt("Are you sure? (y/n)")? else {
                return Ok(false);
            };
            match parse_confirmation(&answer) {
                Some(true) => {
                    let deleted = self.store.delete(id)?;
                    if deleted {
                        writeln!(self.output, "Task deleted.")?;
                    }
                    return Ok(deleted);
                }
                Some(false) => return Ok(false),
                None => writeln!(self.output, "Please enter 'y' for yes or 'n' for no.")?,
            }
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;
        self.read_line()
    }

    // Re-asks until `validate` accepts. `None` means input ended.
    fn prompt_valid(&mut self, label: &str, validate: fn(&str) -> Result<String>) -> Result<Option<String>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            match validate(&raw) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }
    }

    // Like `prompt_valid`, but an empty answer is `Some(None)`: keep the field.
    fn prompt_change(&mut self, label: &str, validate: fn(&str) -> Result<String>) -> Result<Option<Option<String>>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            if raw.trim().is_empty() {
                return Ok(Some(None));
            }
            match validate(&raw) {
                Ok(value) => return Ok(Some(Some(value))),
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use todolist_core::SqliteTaskStore;

    fn run_menu(store: &mut SqliteTaskStore, script: &str) -> String {
        let mut output = Vec::new();
        Menu::new(store, Cursor::new(script.as_bytes()), &mut output, AppInfo::default())
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_exit_immediately() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let output = run_menu(&mut store, "0\n");

        assert!(output.contains("Tasks: 0"));
        assert!(output.contains("Bye."));
    }

    #[test]
    fn test_header_and_footer_come_from_app_info() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let info = AppInfo {
            name: "Groceries".to_string(),
            url: "https://example.org/groceries".to_string(),
            copyright: "Copyright (c) Someone".to_string(),
        };
        let mut output = Vec::new();
        Menu::new(&mut store, Cursor::new(&b"0\n"[..]), &mut output, info).run().unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.starts_with("== Groceries ==\n"));
        assert!(output.ends_with("Bye.\n----\nhttps://example.org/groceries\nCopyright (c) Someone\n"));
    }

    #[test]
    fn test_empty_footer_fields_are_skipped() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let info = AppInfo { name: "x".to_string(), url: String::new(), copyright: String::new() };
        let mut output = Vec::new();
        Menu::new(&mut store, Cursor::new(&b"0\n"[..]), &mut output, info).run().unwrap();

        assert!(String::from_utf8(output).unwrap().ends_with("Bye.\n----\n"));
    }

    #[test]
    fn test_end_of_input_exits() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let output = run_menu(&mut store, "");
        assert!(output.contains("Bye."));
    }

    #[test]
    fn test_add_task_revalidates_bad_input() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let output = run_menu(
            &mut store,
            "1\n\nBuy milk\n2% low-fat\n2025-01-01\n2025-01-01 09:00\n0\n",
        );

        assert!(output.contains("Error: Title cannot be empty."));
        assert!(output.contains("Error: Invalid due date"));
        assert!(output.contains("Task added: Buy milk"));
        assert_eq!(store.count(), 1);
        let task = &store.read_all()[0];
        assert_eq!(task.description, "2% low-fat");
        assert_eq!(task.due_date, "2025-01-01 09:00");
    }

    #[test]
    fn test_add_duplicate_reports_disambiguated_title() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        store.create(NewTask::new("Buy milk", "x", "2025-01-01 09:00")).unwrap();

        let output = run_menu(&mut store, "1\nBuy milk\nx\n2025-01-01 09:00\n0\n");

        assert!(output.contains("Task added: Buy milk (1)"));
    }

    #[test]
    fn test_invalid_option() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let output = run_menu(&mut store, "9\n0\n");
        assert!(output.contains("Invalid option!"));
    }

    #[test]
    fn test_toggle_completion() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let task = store.create(NewTask::new("A", "x", "2025-01-01 09:00")).unwrap();

        let output = run_menu(&mut store, "3\n1\n2\n0\n0\n");

        assert!(output.contains("2. Mark as completed"));
        assert!(output.contains("2. Mark as not completed"));
        assert!(store.get(&task.id).unwrap().completed);
    }

    #[test]
    fn test_edit_keeps_empty_fields() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let task = store.create(NewTask::new("A", "old", "2025-01-01 09:00")).unwrap();

        let output = run_menu(&mut store, "3\n1\n1\n\nnew\n\n0\n0\n");

        assert!(output.contains("Task updated."));
        let edited = store.get(&task.id).unwrap();
        assert_eq!(edited.title, "A");
        assert_eq!(edited.description, "new");
        assert_eq!(edited.due_date, "2025-01-01 09:00");
    }

    #[test]
    fn test_edit_with_nothing_changed() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        store.create(NewTask::new("A", "old", "2025-01-01 09:00")).unwrap();

        let output = run_menu(&mut store, "3\n1\n1\n\n\n\n0\n0\n");

        assert!(output.contains("Nothing changed."));
    }

    #[test]
    fn test_delete_asks_for_confirmation() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        store.create(NewTask::new("A", "x", "2025-01-01 09:00")).unwrap();

        let output = run_menu(&mut store, "3\n1\n3\nmaybe\nn\n3\ny\n0\n");

        assert!(output.contains("Please enter 'y' for yes or 'n' for no."));
        assert!(output.contains("Task deleted."));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_open_task_with_bad_number() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        store.create(NewTask::new("A", "x", "2025-01-01 09:00")).unwrap();

        let output = run_menu(&mut store, "3\n7\n0\n");

        assert!(output.contains("Invalid task number!"));
    }
}
