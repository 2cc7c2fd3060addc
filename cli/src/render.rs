use chrono::{DateTime, Local, Utc};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use todolist_core::{Task, TaskStore};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Done")]
    done: &'static str,
}

pub fn short_id(task: &Task) -> String {
    task.id.to_string()[..8].to_string()
}

/// Numbered table of tasks; the numbers are what the menu asks for.
pub fn task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let rows = tasks.iter().enumerate().map(|(i, task)| TaskRow {
        number: i + 1,
        id: short_id(task),
        title: task.title.clone(),
        due: if task.due_date.is_empty() { "-".to_string() } else { task.due_date.clone() },
        done: task.completion_mark(),
    });

    let mut table = Table::new(rows);
    table.with(Style::modern());
    table.to_string()
}

pub fn task_details(task: &Task) -> String {
    [
        format!("ID:          {}", task.id),
        format!("Title:       {}", task.title),
        format!("Description: {}", task.description),
        format!("Due:         {}", task.due_date),
        format!("Completed:   {} {}", task.completion_mark(), task.completion_label()),
        format!("Created:     {}", local_time(&task.created_at)),
        format!("Updated:     {}", local_time(&task.updated_at)),
    ]
    .join("\n")
}

pub fn summary(store: &dyn TaskStore) -> String {
    format!(
        "Tasks: {} (active {}, completed {}) [{}]",
        store.count(),
        store.active_count(),
        store.completed_count(),
        store.kind()
    )
}

fn local_time(ts: &DateTime<Utc>) -> String {
    DateTime::<Local>::from(*ts).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use todolist_core::{NewTask, SqliteTaskStore};

    #[test]
    fn test_empty_table() {
        assert_eq!(task_table(&[]), "No tasks found.");
    }

    #[test]
    fn test_table_lists_every_task() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let a = store.create(NewTask::new("Buy milk", "", "2025-01-01 09:00")).unwrap();
        store.create(NewTask::new("Walk dog", "", "")).unwrap();
        store.mark_completed(&a.id, true).unwrap();

        let table = task_table(store.read_all());

        assert!(table.contains("Buy milk"));
        assert!(table.contains("Walk dog"));
        assert!(table.contains(&short_id(&a)));
        assert!(table.contains("✓"));
        assert!(table.contains("✗"));
    }

    #[test]
    fn test_details_show_completion() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let task = store.create(NewTask::new("Buy milk", "2% low-fat", "2025-01-01 09:00")).unwrap();

        let details = task_details(&task);

        assert!(details.contains("Title:       Buy milk"));
        assert!(details.contains("Description: 2% low-fat"));
        assert!(details.contains("Completed:   ✗ No"));
    }

    #[test]
    fn test_summary_counts() {
        let mut store = SqliteTaskStore::open_in_memory().unwrap();
        let a = store.create(NewTask::new("A", "", "")).unwrap();
        store.create(NewTask::new("B", "", "")).unwrap();
        store.mark_completed(&a.id, true).unwrap();

        assert_eq!(summary(&store), "Tasks: 2 (active 1, completed 1) [sqlite]");
    }
}
