//! Task lifecycle service
//!
//! Admins assign operational tasks to staff; assignees drive them through
//! the pending → in_progress → completed state machine (either side may
//! cancel an open task). Status changes are validated against the shared
//! transition table; completed and cancelled are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{validate_transition, Task, TaskPriority, TaskStatus, TaskType};

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Task lifecycle service
#[derive(Clone)]
pub struct TaskService {
    db: PgPool,
}

/// Input for creating a task
#[derive(Debug, Deserialize)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub priority: TaskPriority,
    pub assigned_to: Uuid,
    pub festival_id: Option<Uuid>,
    pub target_quantity: Option<i32>,
    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
}

/// Partial update for a task's details (not its status)
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Uuid>,
    pub festival_id: Option<Uuid>,
    pub target_quantity: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusInput {
    pub status: TaskStatus,
    pub notes: Option<String>,
    pub actual_quantity: Option<i32>,
}

/// List filters
#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub task_type: Option<TaskType>,
    pub assigned_to: Option<Uuid>,
}

/// Task as exposed over the API, with assignment context and urgency
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub assigned_to_name: Option<String>,
    pub festival_name: Option<String>,
    pub is_overdue: bool,
    pub days_until_due: Option<i64>,
}

/// Tasks grouped by status for the "my tasks" view
#[derive(Debug, Serialize)]
pub struct MyTasks {
    pub pending: Vec<TaskResponse>,
    pub in_progress: Vec<TaskResponse>,
    pub completed: Vec<TaskResponse>,
    pub total: usize,
}

/// Task counts per status
#[derive(Debug, Serialize)]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

/// Raw task row as stored, joined with assignee and festival names
#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    task_type: String,
    priority: String,
    status: String,
    assigned_to: Uuid,
    created_by: Option<Uuid>,
    festival_id: Option<Uuid>,
    target_quantity: Option<i32>,
    actual_quantity: Option<i32>,
    notes: Option<String>,
    due_date: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assignee_full_name: Option<String>,
    assignee_username: Option<String>,
    festival_name: Option<String>,
}

const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.task_type, t.priority, t.status, \
     t.assigned_to, t.created_by, t.festival_id, t.target_quantity, t.actual_quantity, t.notes, \
     t.due_date, t.completed_at, t.created_at, t.updated_at, \
     u.full_name AS assignee_full_name, u.username AS assignee_username, \
     f.name AS festival_name";

const TASK_JOINS: &str = "FROM tasks t \
     LEFT JOIN users u ON u.id = t.assigned_to \
     LEFT JOIN festivals f ON f.id = t.festival_id";

impl TaskRow {
    fn into_response(self, now: DateTime<Utc>) -> AppResult<TaskResponse> {
        let task = Task {
            id: self.id,
            title: self.title,
            description: self.description,
            task_type: TaskType::parse(&self.task_type)
                .ok_or_else(|| AppError::Internal(format!("bad task type: {}", self.task_type)))?,
            priority: TaskPriority::parse(&self.priority)
                .ok_or_else(|| AppError::Internal(format!("bad priority: {}", self.priority)))?,
            status: TaskStatus::parse(&self.status)
                .ok_or_else(|| AppError::Internal(format!("bad status: {}", self.status)))?,
            assigned_to: self.assigned_to,
            created_by: self.created_by,
            festival_id: self.festival_id,
            target_quantity: self.target_quantity,
            actual_quantity: self.actual_quantity,
            notes: self.notes,
            due_date: self.due_date,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        let assigned_to_name = match self.assignee_full_name {
            Some(ref name) if !name.trim().is_empty() => Some(name.clone()),
            _ => self.assignee_username,
        };
        Ok(TaskResponse {
            is_overdue: task.is_overdue(now),
            days_until_due: task.days_until_due(now),
            assigned_to_name,
            festival_name: self.festival_name,
            task,
        })
    }
}

impl TaskService {
    /// Create a new TaskService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List tasks. Admins see every task; employees only their own.
    pub async fn list(&self, user: &AuthUser, filter: TaskFilter) -> AppResult<Vec<TaskResponse>> {
        let scope_user = if user.is_admin() {
            filter.assigned_to
        } else {
            Some(user.user_id)
        };

        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            {TASK_JOINS}
            WHERE ($1::uuid IS NULL OR t.assigned_to = $1)
              AND ($2::text IS NULL OR t.status = $2)
              AND ($3::text IS NULL OR t.priority = $3)
              AND ($4::text IS NULL OR t.task_type = $4)
            ORDER BY t.created_at DESC
            "#
        ))
        .bind(scope_user)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.priority.map(|p| p.as_str()))
        .bind(filter.task_type.map(|t| t.as_str()))
        .fetch_all(&self.db)
        .await?;

        let now = Utc::now();
        rows.into_iter().map(|row| row.into_response(now)).collect()
    }

    /// Get one task. Employees may only read tasks assigned to them.
    pub async fn get(&self, user: &AuthUser, task_id: Uuid) -> AppResult<TaskResponse> {
        let response = self.fetch(task_id).await?;
        if !user.is_admin() && response.task.assigned_to != user.user_id {
            return Err(AppError::NotFound("Task".to_string()));
        }
        Ok(response)
    }

    /// Create a task (admin operation, guarded at the route)
    pub async fn create(&self, user: &AuthUser, input: CreateTaskInput) -> AppResult<TaskResponse> {
        if input.title.trim().is_empty() {
            return Err(AppError::Validation {
                field: "title".to_string(),
                message: "Title cannot be empty".to_string(),
                message_th: "ต้องระบุชื่องาน".to_string(),
            });
        }

        let assignee_active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(input.assigned_to)
        .fetch_one(&self.db)
        .await?;
        if !assignee_active {
            return Err(AppError::NotFound("Assignee".to_string()));
        }

        if let Some(festival_id) = input.festival_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM festivals WHERE id = $1)",
            )
            .bind(festival_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Festival".to_string()));
            }
        }

        let task_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO tasks (title, description, task_type, priority, assigned_to, created_by,
                               festival_id, target_quantity, notes, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.task_type.as_str())
        .bind(input.priority.as_str())
        .bind(input.assigned_to)
        .bind(user.user_id)
        .bind(input.festival_id)
        .bind(input.target_quantity)
        .bind(&input.notes)
        .bind(input.due_date)
        .fetch_one(&self.db)
        .await?;

        self.fetch(task_id).await
    }

    /// Partially update a task's details (admin operation)
    pub async fn update(&self, task_id: Uuid, input: UpdateTaskInput) -> AppResult<TaskResponse> {
        if let Some(ref title) = input.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "title".to_string(),
                    message: "Title cannot be empty".to_string(),
                    message_th: "ต้องระบุชื่องาน".to_string(),
                });
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                task_type = COALESCE($3, task_type),
                priority = COALESCE($4, priority),
                assigned_to = COALESCE($5, assigned_to),
                festival_id = COALESCE($6, festival_id),
                target_quantity = COALESCE($7, target_quantity),
                due_date = COALESCE($8, due_date),
                updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(input.title.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(input.task_type.map(|t| t.as_str()))
        .bind(input.priority.map(|p| p.as_str()))
        .bind(input.assigned_to)
        .bind(input.festival_id)
        .bind(input.target_quantity)
        .bind(input.due_date)
        .bind(task_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Task".to_string()));
        }

        self.fetch(task_id).await
    }

    /// Drive the status state machine. The assignee (or an admin) moves a
    /// task forward; an illegal transition is rejected and nothing changes.
    /// Notes accumulate with a timestamp prefix rather than overwriting.
    pub async fn update_status(
        &self,
        user: &AuthUser,
        task_id: Uuid,
        input: UpdateStatusInput,
    ) -> AppResult<TaskResponse> {
        let current = self.fetch(task_id).await?;

        if !user.is_admin() && current.task.assigned_to != user.user_id {
            return Err(AppError::Forbidden(
                "Only the assignee may change this task".to_string(),
            ));
        }

        validate_transition(current.task.status, input.status)?;

        let now = Utc::now();
        let notes = match input.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(new_note) => {
                let mut combined = current.task.notes.clone().unwrap_or_default();
                if !combined.is_empty() {
                    combined.push('\n');
                }
                combined.push_str(&format!("[{}] {}", now.format("%Y-%m-%d %H:%M"), new_note));
                Some(combined)
            }
            None => current.task.notes.clone(),
        };
        let completed_at = if input.status == TaskStatus::Completed {
            Some(now)
        } else {
            None
        };

        sqlx::query(
            r#"
            UPDATE tasks
            SET status = $1,
                notes = $2,
                actual_quantity = COALESCE($3, actual_quantity),
                completed_at = $4,
                updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(input.status.as_str())
        .bind(&notes)
        .bind(input.actual_quantity)
        .bind(completed_at)
        .bind(task_id)
        .execute(&self.db)
        .await?;

        self.fetch(task_id).await
    }

    /// The caller's open and recently finished tasks, grouped by status
    pub async fn my_tasks(&self, user: &AuthUser) -> AppResult<MyTasks> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            {TASK_JOINS}
            WHERE t.assigned_to = $1
            ORDER BY t.due_date DESC
            "#
        ))
        .bind(user.user_id)
        .fetch_all(&self.db)
        .await?;

        let now = Utc::now();
        let mut my_tasks = MyTasks {
            pending: Vec::new(),
            in_progress: Vec::new(),
            completed: Vec::new(),
            total: rows.len(),
        };
        for row in rows {
            let response = row.into_response(now)?;
            match response.task.status {
                TaskStatus::Pending => my_tasks.pending.push(response),
                TaskStatus::InProgress => my_tasks.in_progress.push(response),
                TaskStatus::Completed => my_tasks.completed.push(response),
                TaskStatus::Cancelled => {}
            }
        }
        Ok(my_tasks)
    }

    /// Task counts per status, scoped like `list`
    pub async fn stats(&self, user: &AuthUser) -> AppResult<TaskStats> {
        let scope_user = if user.is_admin() {
            None
        } else {
            Some(user.user_id)
        };

        let row = sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            r#"
            SELECT COUNT(*)::bigint,
                   COUNT(*) FILTER (WHERE status = 'pending')::bigint,
                   COUNT(*) FILTER (WHERE status = 'in_progress')::bigint,
                   COUNT(*) FILTER (WHERE status = 'completed')::bigint,
                   COUNT(*) FILTER (WHERE status = 'cancelled')::bigint
            FROM tasks
            WHERE ($1::uuid IS NULL OR assigned_to = $1)
            "#,
        )
        .bind(scope_user)
        .fetch_one(&self.db)
        .await?;

        Ok(TaskStats {
            total: row.0,
            pending: row.1,
            in_progress: row.2,
            completed: row.3,
            cancelled: row.4,
        })
    }

    async fn fetch(&self, task_id: Uuid) -> AppResult<TaskResponse> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            {TASK_JOINS}
            WHERE t.id = $1
            "#
        ))
        .bind(task_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Task".to_string()))?;

        row.into_response(Utc::now())
    }
}
