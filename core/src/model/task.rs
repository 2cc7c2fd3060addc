use serde::{Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use uuid::Uuid;

// Zone-less ISO 8601, as written by earlier versions of the task file.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses an RFC 3339 timestamp, or a zone-less `YYYY-MM-DDTHH:MM:SS[.f]`
/// taken as local time.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT).ok()?;
    // A local time skipped by a DST change has no mapping; read it as UTC.
    Some(
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc()),
    )
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_timestamp(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", value)))
}

/// Everything the caller supplies when creating a task. Identity and
/// timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub completed: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date: due_date.into(),
            completed: false,
        }
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Partial update. `None` leaves the field untouched, which is not the same
/// as `Some(String::new())` or `Some(false)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }
}

// Field order here is the on-disk key order of the JSON document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    // Kept as text in `YYYY-MM-DD HH:MM`; the caller validates it.
    pub due_date: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub(crate) fn from_new(new: NewTask, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description: new.description,
            due_date: new.due_date,
            completed: new.completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies every supplied field of `changes` except the title, which the
    /// store resolves for uniqueness first and passes in separately.
    pub(crate) fn apply(&mut self, changes: TaskUpdate, title: Option<String>) {
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.touch();
    }

    /// Refreshes `updated_at`. A clock that steps backwards never makes it
    /// older than its previous value or `created_at`.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.updated_at).max(self.created_at);
    }

    pub fn completion_mark(&self) -> &'static str {
        if self.completed { "✓" } else { "✗" }
    }

    pub fn completion_label(&self) -> &'static str {
        if self.completed { "Yes" } else { "No" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_from_new_assigns_identity_and_timestamps() {
        let task = Task::from_new(NewTask::new("Buy milk", "2% low-fat", "2025-01-01 09:00"), "Buy milk".to_string());

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "2% low-fat");
        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_apply_only_touches_supplied_fields() {
        let mut task = Task::from_new(NewTask::new("A", "desc", "2025-01-01 09:00"), "A".to_string());
        let before = task.clone();

        task.apply(TaskUpdate::default().due_date("2025-02-02 10:30"), None);

        assert_eq!(task.id, before.id);
        assert_eq!(task.title, "A");
        assert_eq!(task.description, "desc");
        assert_eq!(task.due_date, "2025-02-02 10:30");
        assert_eq!(task.created_at, before.created_at);
        assert!(task.updated_at >= before.updated_at);
    }

    #[test]
    fn test_empty_string_is_a_supplied_value() {
        let mut task = Task::from_new(NewTask::new("A", "desc", "2025-01-01 09:00"), "A".to_string());
        task.apply(TaskUpdate::default().description(""), None);
        assert_eq!(task.description, "");
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut task = Task::from_new(NewTask::default(), "A".to_string());
        let future = Utc::now() + Duration::hours(1);
        task.updated_at = future;

        task.touch();

        assert_eq!(task.updated_at, future);
    }

    #[test]
    fn test_completion_indicator() {
        let mut task = Task::from_new(NewTask::default(), "A".to_string());
        assert_eq!(task.completion_mark(), "✗");
        assert_eq!(task.completion_label(), "No");

        task.completed = true;
        assert_eq!(task.completion_mark(), "✓");
        assert_eq!(task.completion_label(), "Yes");
    }

    fn local_to_utc(naive: &str) -> DateTime<Utc> {
        let naive = NaiveDateTime::parse_from_str(naive, NAIVE_TIMESTAMP_FORMAT).unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_timestamp_accepts_both_forms() {
        let utc = Utc::now();
        assert_eq!(parse_timestamp(&utc.to_rfc3339()), Some(utc));
        assert_eq!(
            parse_timestamp("2024-05-01T10:00:00.123456"),
            Some(local_to_utc("2024-05-01T10:00:00.123456"))
        );
        assert_eq!(
            parse_timestamp("2024-05-01T10:00:00"),
            Some(local_to_utc("2024-05-01T10:00:00"))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_deserializes_zone_less_timestamps() {
        let json = r#"{
            "id": "1b4e28ba-2fa1-11d2-883f-0016d3cca427",
            "title": "Buy milk",
            "description": "2% low-fat",
            "due_date": "2025-01-01 09:00",
            "completed": false,
            "created_at": "2024-05-01T10:00:00.123456",
            "updated_at": "2024-05-02T11:30:00.5"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.created_at, local_to_utc("2024-05-01T10:00:00.123456"));
        assert_eq!(task.updated_at, local_to_utc("2024-05-02T11:30:00.5"));
        assert!(task.updated_at >= task.created_at);
    }

    #[test]
    fn test_rejects_unparseable_timestamp() {
        let json = r#"{"id":"1b4e28ba-2fa1-11d2-883f-0016d3cca427","title":"A","due_date":"",
            "created_at":"soon","updated_at":"soon"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn test_serialized_key_order() {
        let task = Task::from_new(NewTask::new("A", "b", "2025-01-01 09:00"), "A".to_string());
        let json = serde_json::to_string(&task).unwrap();

        let keys = ["\"id\"", "\"title\"", "\"description\"", "\"due_date\"", "\"completed\"", "\"created_at\"", "\"updated_at\""];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
