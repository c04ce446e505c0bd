use chrono::NaiveDateTime;
use serde::Serialize;
use validator::Validate;

pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub completed: bool,
    #[serde(serialize_with = "serialize_created_at")]
    pub created_at: NaiveDateTime,
    pub due_date: Option<String>,
}

/// A task row joined with its category, as shown on the listing page.
///
/// Category fields are `None` when the task has no category or points at one
/// that no longer exists.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskWithCategory {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct NewTask {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub due_date: Option<String>,
}

impl NewTask {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

/// Full replacement of a task's editable fields.
#[derive(Debug, Clone, Default, Validate)]
pub struct TaskChanges {
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub due_date: Option<String>,
    pub completed: bool,
}

fn serialize_created_at<S>(created_at: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(&created_at.format(CREATED_AT_FORMAT))
}
