use std::collections::HashSet;

use uuid::Uuid;

use crate::model::task::Task;

/// Returns `requested` unchanged when no existing title matches it exactly,
/// otherwise the first free `"{requested} (n)"` counting up from 1.
pub fn unique_title<'a, I>(requested: &str, existing: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<&str> = existing.into_iter().collect();
    if !taken.contains(requested) {
        return requested.to_string();
    }

    let mut count = 1;
    loop {
        let candidate = format!("{} ({})", requested, count);
        if !taken.contains(candidate.as_str()) {
            return candidate;
        }
        count += 1;
    }
}

/// Resolves `requested` against the titles in `tasks`, ignoring the task
/// with id `exclude` so that a task never collides with itself.
pub(crate) fn resolve_title(tasks: &[Task], requested: &str, exclude: Option<&Uuid>) -> String {
    unique_title(
        requested,
        tasks
            .iter()
            .filter(|t| Some(&t.id) != exclude)
            .map(|t| t.title.as_str()),
    )
}
