use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

use crate::models::validation::double_option;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "todo_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    /// Status implied by the completed flag after a toggle
    pub fn for_completion(completed: bool) -> Self {
        if completed {
            TodoStatus::Completed
        } else {
            TodoStatus::Pending
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Type)]
#[sqlx(type_name = "todo_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TodoPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTodoRequest {
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub priority: Option<TodoPriority>,
    pub status: Option<TodoStatus>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTodoRequest {
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub title: Option<String>,
    /// `null` clears the field
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    pub priority: Option<TodoPriority>,
    pub status: Option<TodoStatus>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Deserialize)]
pub struct TodoQuery {
    pub status: Option<TodoStatus>,
    pub category_id: Option<Uuid>,
    pub completed: Option<bool>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Resolve the (completed, status) pair an update should store.
///
/// An explicit status wins; a bare `completed` flag implies the status; when
/// neither is given the current pair is kept.
pub fn reconcile_completion(
    current: (bool, TodoStatus),
    completed: Option<bool>,
    status: Option<TodoStatus>,
) -> (bool, TodoStatus) {
    match (completed, status) {
        (_, Some(status)) => (status == TodoStatus::Completed, status),
        (Some(completed), None) => (completed, TodoStatus::for_completion(completed)),
        (None, None) => current,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TodoCategory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TodoCategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub todo_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTodoCategoryRequest {
    #[validate(length(max = 60, message = "must be at most 60 characters"))]
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTodoCategoryRequest {
    #[validate(length(max = 60, message = "must be at most 60 characters"))]
    pub name: Option<String>,
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let cleared: UpdateTodoRequest =
            serde_json::from_str(r#"{"category_id": null, "due_date": null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));
        assert_eq!(cleared.due_date, Some(None));
        assert_eq!(cleared.description, None);

        let category = Uuid::new_v4();
        let set: UpdateTodoRequest =
            serde_json::from_value(serde_json::json!({ "category_id": category, "description": "Buy oats" })).unwrap();
        assert_eq!(set.category_id, Some(Some(category)));
        assert_eq!(set.description, Some(Some("Buy oats".to_string())));
    }

    #[test]
    fn test_status_for_completion() {
        assert_eq!(TodoStatus::for_completion(true), TodoStatus::Completed);
        assert_eq!(TodoStatus::for_completion(false), TodoStatus::Pending);
    }

    #[test]
    fn test_explicit_status_drives_completed_flag() {
        let current = (false, TodoStatus::Pending);
        assert_eq!(
            reconcile_completion(current, None, Some(TodoStatus::Completed)),
            (true, TodoStatus::Completed)
        );
        assert_eq!(
            reconcile_completion((true, TodoStatus::Completed), Some(true), Some(TodoStatus::InProgress)),
            (false, TodoStatus::InProgress)
        );
    }

    #[test]
    fn test_completed_flag_implies_status() {
        assert_eq!(
            reconcile_completion((false, TodoStatus::InProgress), Some(true), None),
            (true, TodoStatus::Completed)
        );
        assert_eq!(
            reconcile_completion((true, TodoStatus::Completed), Some(false), None),
            (false, TodoStatus::Pending)
        );
    }

    #[test]
    fn test_untouched_completion_keeps_current() {
        let current = (false, TodoStatus::InProgress);
        assert_eq!(reconcile_completion(current, None, None), current);
    }
}
