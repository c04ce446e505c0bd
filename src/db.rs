use chrono::{Local, NaiveDateTime};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::database::DEMO_USER_EMAIL;
use crate::error::AppError;
use crate::models::{
    CREATED_AT_FORMAT, Category, NewTask, Task, TaskChanges, TaskStats, TaskWithCategory, User,
};
use crate::validation::{ValidateExt, none_if_blank};

const TASK_COLUMNS: &str = "t.id, t.title, COALESCE(t.description, '') AS description, t.user_id,
     t.category_id, COALESCE(t.completed, 0) AS completed, t.created_at, t.due_date";

#[instrument]
pub async fn get_demo_user(pool: &Pool<Sqlite>) -> Result<User, AppError> {
    info!("Fetching demo user");
    let row = sqlx::query_as::<_, User>("SELECT id, name, email, password FROM users WHERE email = ?")
        .bind(DEMO_USER_EMAIL)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(user),
        _ => Err(AppError::NotFound(format!(
            "Demo user {} not found in database",
            DEMO_USER_EMAIL
        ))),
    }
}

#[instrument]
pub async fn get_all_categories(pool: &Pool<Sqlite>) -> Result<Vec<Category>, AppError> {
    info!("Getting all categories");
    let rows = sqlx::query_as::<_, Category>("SELECT id, name, color FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

#[instrument]
pub async fn get_all_tasks(pool: &Pool<Sqlite>) -> Result<Vec<TaskWithCategory>, AppError> {
    info!("Getting all tasks");
    let query = format!(
        "SELECT {TASK_COLUMNS}, c.name AS category_name, c.color AS category_color
         FROM tasks t
         LEFT JOIN categories c ON t.category_id = c.id
         ORDER BY t.created_at DESC, t.id DESC"
    );

    let rows = sqlx::query_as::<_, TaskWithCategory>(&query)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

#[instrument]
pub async fn get_task(pool: &Pool<Sqlite>, id: i64) -> Result<Task, AppError> {
    info!("Fetching task by ID");
    let query = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?");

    let row = sqlx::query_as::<_, Task>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(task) => Ok(task),
        _ => Err(AppError::NotFound(format!("Task {} not found", id))),
    }
}

#[instrument]
pub async fn create_task(pool: &Pool<Sqlite>, task: NewTask) -> Result<i64, AppError> {
    create_task_at(pool, task, Local::now().naive_local()).await
}

/// Inserts a task owned by the demo user, stamped with `created_at`.
#[instrument]
pub async fn create_task_at(
    pool: &Pool<Sqlite>,
    task: NewTask,
    created_at: NaiveDateTime,
) -> Result<i64, AppError> {
    info!("Creating task");
    let task = task.validated()?;
    let owner = get_demo_user(pool).await?;

    let res = sqlx::query(
        "INSERT INTO tasks (title, description, user_id, category_id, created_at, due_date)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(task.title.trim())
    .bind(task.description.unwrap_or_default())
    .bind(owner.id)
    .bind(task.category_id)
    .bind(created_at.format(CREATED_AT_FORMAT).to_string())
    .bind(none_if_blank(task.due_date))
    .execute(pool)
    .await?;

    Ok(res.last_insert_rowid())
}

/// Flips `completed` in a single statement. Unknown ids are ignored.
#[instrument]
pub async fn toggle_task(pool: &Pool<Sqlite>, id: i64) -> Result<bool, AppError> {
    info!("Toggling task completion");
    let res = sqlx::query(
        "UPDATE tasks SET completed = NOT COALESCE(completed, 0)
         WHERE id = ?",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(res.rows_affected() > 0)
}

#[instrument]
pub async fn update_task(
    pool: &Pool<Sqlite>,
    id: i64,
    changes: TaskChanges,
) -> Result<(), AppError> {
    info!("Updating task");
    let changes = changes.validated()?;

    let res = sqlx::query(
        "UPDATE tasks
         SET title = ?, description = ?, category_id = ?, due_date = ?, completed = ?
         WHERE id = ?",
    )
    .bind(changes.title.trim())
    .bind(changes.description)
    .bind(changes.category_id)
    .bind(none_if_blank(changes.due_date))
    .bind(changes.completed)
    .bind(id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Task {} not found", id)));
    }

    Ok(())
}

/// Deleting an id that does not exist is not an error.
#[instrument]
pub async fn delete_task(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
    info!("Deleting task");
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

#[instrument]
pub async fn get_task_stats(pool: &Pool<Sqlite>) -> Result<TaskStats, AppError> {
    info!("Counting tasks");
    let (total_tasks, completed_tasks) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN completed THEN 1 ELSE 0 END), 0) FROM tasks",
    )
    .fetch_one(pool)
    .await?;

    Ok(TaskStats {
        total_tasks,
        completed_tasks,
        pending_tasks: total_tasks - completed_tasks,
    })
}
