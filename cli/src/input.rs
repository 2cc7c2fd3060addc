use anyhow::{anyhow, bail, Result};
use chrono::NaiveDateTime;
use todolist_core::Task;
use uuid::Uuid;

pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn validate_title(input: &str) -> Result<String> {
    non_empty(input, "Title")
}

pub fn validate_description(input: &str) -> Result<String> {
    non_empty(input, "Description")
}

fn non_empty(input: &str, field: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("{} cannot be empty.", field);
    }
    Ok(trimmed.to_string())
}

/// Accepts `YYYY-MM-DD HH:MM` and returns it in canonical form.
pub fn validate_due_date(input: &str) -> Result<String> {
    let parsed = NaiveDateTime::parse_from_str(input.trim(), DUE_DATE_FORMAT)
        .map_err(|_| anyhow!("Invalid due date '{}', expected YYYY-MM-DD HH:MM.", input.trim()))?;
    Ok(parsed.format(DUE_DATE_FORMAT).to_string())
}

pub fn parse_confirmation(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Finds a task by full id or by an unambiguous id prefix.
pub fn resolve_id(tasks: &[Task], query: &str) -> Result<Uuid> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        bail!("Task id is required.");
    }
    if let Ok(id) = Uuid::parse_str(&query) {
        return Ok(id);
    }

    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.to_string().starts_with(&query))
        .collect();
    match matches.as_slice() {
        [task] => Ok(task.id),
        [] => Err(anyhow!("No task matches id '{}'.", query)),
        _ => Err(anyhow!("Id '{}' matches {} tasks, use more characters.", query, matches.len())),
    }
}
