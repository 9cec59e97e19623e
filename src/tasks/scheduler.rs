use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::workdays::past_work_date;
use crate::authz::Role;
use crate::errors::AppResult;
use crate::holidays::HolidayCalendar;
use crate::models::task::{DbTask, Task};
use crate::models::user::User;

/// Computes which open tasks a user may currently see.
///
/// Direct audiences (the task's user, the task's organization through a
/// binding, a role the user holds) see a task immediately; each audience
/// field widens visibility on its own. Coordinators of ancestor
/// organizations see tasks of strict descendants after `raise_1` business
/// days; staff see every open task after `raise_2`. Thresholds are injected
/// at construction and `now` is always an explicit parameter, so evaluations
/// are reproducible.
#[derive(Clone)]
pub struct EscalationScheduler {
    pool: SqlitePool,
    calendar: HolidayCalendar,
    raise_1: u32,
    raise_2: u32,
}

#[derive(Debug, sqlx::FromRow)]
struct BindingRow {
    principal_kind: String,
    principal_id: Uuid,
    role: String,
}

struct BoundOrg {
    id: Uuid,
    path: String,
}

impl EscalationScheduler {
    pub fn new(pool: SqlitePool, calendar: HolidayCalendar, raise_1: u32, raise_2: u32) -> Self {
        Self {
            pool,
            calendar,
            raise_1,
            raise_2,
        }
    }

    /// Open tasks visible to `user` as of `now`, ordered by `(created, id)`.
    pub async fn active_tasks(&self, user: &User, now: NaiveDate) -> AppResult<Vec<Task>> {
        // The window is padded so holidays just before the staff threshold
        // are always loaded.
        let window_start = now - Duration::days(i64::from(self.raise_2) + 30);
        let holidays = self.calendar.range(window_start, now).await?;
        let date1 = past_work_date(self.raise_1, &holidays, now);
        let date2 = past_work_date(self.raise_2, &holidays, now);

        let (bound_orgs, user_roles) = self.bound_organizations(user.id).await?;
        let direct: HashSet<Uuid> = bound_orgs.iter().map(|org| org.id).collect();
        let is_staff = user.is_staff || user.is_superuser;

        let rows = sqlx::query_as::<_, TaskWithPath>(
            "SELECT t.id, t.title, t.created, t.user_id, t.organization_id, t.role, t.status, \
                    t.task_type, t.due_date, t.principal_kind, t.principal_id, o.path AS org_path \
             FROM tasks t LEFT JOIN organizations o ON o.id = t.organization_id \
             WHERE t.status IN ('created', 'assigned') \
             ORDER BY t.created ASC, t.id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut visible = Vec::new();
        for row in rows {
            let task: Task = row.task.try_into()?;
            let created = task.created.date_naive();

            let owned = task.user_id == Some(user.id);
            let direct_org = task.organization_id.is_some_and(|org_id| direct.contains(&org_id));
            let role_addressed = task.role.is_some_and(|role| user_roles.contains(&role));
            let supervised = row.org_path.as_deref().is_some_and(|task_path| {
                created <= date1
                    && bound_orgs.iter().any(|org| {
                        task_path.starts_with(&org.path) && task_path != org.path
                    })
            });
            let escalated_to_staff = is_staff && created <= date2;

            if owned || direct_org || role_addressed || supervised || escalated_to_staff {
                visible.push(task);
            }
        }

        Ok(visible)
    }

    /// Organizations the user is directly bound to (organization principals
    /// as-is, organization-scoped principals like datasets and requests
    /// through their owning organization), plus every role the user holds on
    /// any binding.
    async fn bound_organizations(
        &self,
        user_id: Uuid,
    ) -> AppResult<(Vec<BoundOrg>, HashSet<Role>)> {
        let bindings = sqlx::query_as::<_, BindingRow>(
            "SELECT principal_kind, principal_id, role FROM representatives WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut user_roles: HashSet<Role> = HashSet::new();
        let mut org_ids: HashSet<Uuid> = HashSet::new();
        for binding in bindings {
            if let Some(role) = Role::parse(&binding.role) {
                user_roles.insert(role);
            }
            let org_id = match binding.principal_kind.as_str() {
                "organization" => Some(binding.principal_id),
                "dataset" => {
                    sqlx::query_scalar::<_, Uuid>("SELECT organization_id FROM datasets WHERE id = ?")
                        .bind(binding.principal_id)
                        .fetch_optional(&self.pool)
                        .await?
                }
                "request" => sqlx::query_scalar::<_, Option<Uuid>>(
                    "SELECT organization_id FROM requests WHERE id = ?",
                )
                .bind(binding.principal_id)
                .fetch_optional(&self.pool)
                .await?
                .flatten(),
                _ => None,
            };
            if let Some(org_id) = org_id {
                org_ids.insert(org_id);
            }
        }

        if org_ids.is_empty() {
            return Ok((Vec::new(), user_roles));
        }

        let placeholders = std::iter::repeat("?")
            .take(org_ids.len())
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!("SELECT id, path FROM organizations WHERE id IN ({})", placeholders);
        let mut query = sqlx::query_as::<_, OrgPathRow>(&sql);
        for id in &org_ids {
            query = query.bind(*id);
        }
        let org_paths = query.fetch_all(&self.pool).await?;

        let bound = org_paths
            .into_iter()
            .map(|row| BoundOrg {
                id: row.id,
                path: row.path,
            })
            .collect();
        Ok((bound, user_roles))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrgPathRow {
    id: Uuid,
    path: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TaskWithPath {
    #[sqlx(flatten)]
    task: DbTask,
    org_path: Option<String>,
}
