use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::Role;
use crate::errors::{AppError, AppResult};
use crate::models::task::{DbTask, Task, TaskStatus, TaskType};

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub task_type: TaskType,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub role: Option<Role>,
    pub due_date: Option<DateTime<Utc>>,
    pub principal_kind: Option<String>,
    pub principal_id: Option<Uuid>,
}

/// Task persistence. Collaborators create tasks on domain events; the only
/// mutations afterwards are the assign and close status transitions - tasks
/// are never hard-deleted.
#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_task: NewTask) -> AppResult<Task> {
        if new_task.user_id.is_none() && new_task.organization_id.is_none() && new_task.role.is_none()
        {
            return Err(AppError::bad_request(
                "task needs an audience: user, organization or role",
            ));
        }

        let task = Task {
            id: Uuid::new_v4(),
            title: new_task.title,
            created: Utc::now(),
            user_id: new_task.user_id,
            organization_id: new_task.organization_id,
            role: new_task.role,
            status: TaskStatus::Created,
            task_type: new_task.task_type,
            due_date: new_task.due_date,
            principal_kind: new_task.principal_kind,
            principal_id: new_task.principal_id,
        };

        sqlx::query(
            "INSERT INTO tasks (id, title, created, user_id, organization_id, role, status, \
                                task_type, due_date, principal_kind, principal_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(task.created)
        .bind(task.user_id)
        .bind(task.organization_id)
        .bind(task.role.map(|role| role.as_str()))
        .bind(task.status.as_str())
        .bind(task.task_type.as_str())
        .bind(task.due_date)
        .bind(task.principal_kind.as_deref())
        .bind(task.principal_id)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Task> {
        let row = sqlx::query_as::<_, DbTask>(
            "SELECT id, title, created, user_id, organization_id, role, status, task_type, \
                    due_date, principal_kind, principal_id \
             FROM tasks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("task not found"))?;
        row.try_into()
    }

    /// CREATED -> ASSIGNED, attaching the assignee.
    pub async fn assign(&self, id: Uuid, user_id: Uuid) -> AppResult<Task> {
        let task = self.get(id).await?;
        if task.status != TaskStatus::Created {
            return Err(AppError::conflict(format!(
                "task is {}, only created tasks can be assigned",
                task.status.as_str()
            )));
        }

        sqlx::query("UPDATE tasks SET status = ?, user_id = ? WHERE id = ?")
            .bind(TaskStatus::Assigned.as_str())
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }

    /// Any open status -> COMPLETED.
    pub async fn close(&self, id: Uuid) -> AppResult<Task> {
        let task = self.get(id).await?;
        if !task.status.is_open() {
            return Err(AppError::conflict("task is already completed"));
        }

        sqlx::query("UPDATE tasks SET status = ? WHERE id = ?")
            .bind(TaskStatus::Completed.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }
}
