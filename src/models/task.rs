use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::Role;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Created,
    Assigned,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Created => "created",
            TaskStatus::Assigned => "assigned",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(TaskStatus::Created),
            "assigned" => Some(TaskStatus::Assigned),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Created | TaskStatus::Assigned)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Comment,
    Request,
    Error,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Comment => "comment",
            TaskType::Request => "request",
            TaskType::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "comment" => Some(TaskType::Comment),
            "request" => Some(TaskType::Request),
            "error" => Some(TaskType::Error),
            _ => None,
        }
    }
}

/// Work item raised by a domain event. The audience is at least one of
/// `user_id`, `organization_id`, `role`; tasks are closed, never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub created: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub role: Option<Role>,
    pub status: TaskStatus,
    pub task_type: TaskType,
    pub due_date: Option<DateTime<Utc>>,
    pub principal_kind: Option<String>,
    pub principal_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbTask {
    pub id: Uuid,
    pub title: String,
    pub created: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub role: Option<String>,
    pub status: String,
    pub task_type: String,
    pub due_date: Option<DateTime<Utc>>,
    pub principal_kind: Option<String>,
    pub principal_id: Option<Uuid>,
}

impl TryFrom<DbTask> for Task {
    type Error = AppError;

    fn try_from(value: DbTask) -> Result<Self, Self::Error> {
        let status = TaskStatus::parse(&value.status)
            .ok_or_else(|| AppError::internal(format!("unknown task status: {}", value.status)))?;
        let task_type = TaskType::parse(&value.task_type)
            .ok_or_else(|| AppError::internal(format!("unknown task type: {}", value.task_type)))?;
        let role = match value.role.as_deref() {
            Some(raw) => Some(
                Role::parse(raw)
                    .ok_or_else(|| AppError::internal(format!("unknown task role: {raw}")))?,
            ),
            None => None,
        };

        Ok(Task {
            id: value.id,
            title: value.title,
            created: value.created,
            user_id: value.user_id,
            organization_id: value.organization_id,
            role,
            status,
            task_type,
            due_date: value.due_date,
            principal_kind: value.principal_kind,
            principal_id: value.principal_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskCreateRequest {
    pub title: String,
    pub task_type: String,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub role: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub principal_kind: Option<String>,
    pub principal_id: Option<Uuid>,
}
