use rocket::State;
use rocket::form::Form;
use rocket::response::Redirect;
use rocket_dyn_templates::{Template, context};
use sqlx::{Pool, Sqlite};
use tracing::debug;

use crate::db::{
    create_task, delete_task, get_all_categories, get_all_tasks, get_task, get_task_stats,
    toggle_task, update_task,
};
use crate::error::AppError;
use crate::models::{NewTask, TaskChanges};
use crate::validation::none_if_blank;

/// Fields posted by the create and edit forms.
///
/// Every field is optional at the form layer so that a missing title reaches
/// validation and is reported as a bad request.
#[derive(FromForm, Debug)]
pub struct TaskForm {
    title: Option<String>,
    description: Option<String>,
    category_id: Option<i64>,
    due_date: Option<String>,
    // Checkbox: present means checked.
    completed: bool,
}

impl From<TaskForm> for NewTask {
    fn from(form: TaskForm) -> Self {
        Self {
            title: form.title.unwrap_or_default(),
            description: form.description,
            category_id: form.category_id,
            due_date: none_if_blank(form.due_date),
        }
    }
}

impl From<TaskForm> for TaskChanges {
    fn from(form: TaskForm) -> Self {
        Self {
            title: form.title.unwrap_or_default(),
            description: form.description.unwrap_or_default(),
            category_id: form.category_id,
            due_date: none_if_blank(form.due_date),
            completed: form.completed,
        }
    }
}

#[get("/")]
pub async fn index(db: &State<Pool<Sqlite>>) -> Result<Template, AppError> {
    let stats = get_task_stats(db).await?;

    Ok(Template::render(
        "index",
        context! {
            title: "Task Tracker",
            total_tasks: stats.total_tasks,
            completed_tasks: stats.completed_tasks,
            pending_tasks: stats.pending_tasks,
        },
    ))
}

#[get("/tasks")]
pub async fn tasks_page(db: &State<Pool<Sqlite>>) -> Result<Template, AppError> {
    let tasks = get_all_tasks(db).await?;

    Ok(Template::render(
        "tasks",
        context! {
            title: "Tasks",
            tasks: tasks,
        },
    ))
}

#[get("/task/create")]
pub async fn create_task_form(db: &State<Pool<Sqlite>>) -> Result<Template, AppError> {
    let categories = get_all_categories(db).await?;

    Ok(Template::render(
        "create_task",
        context! {
            title: "New task",
            categories: categories,
        },
    ))
}

#[post("/task/create", data = "<form>")]
pub async fn create_task_route(
    form: Form<TaskForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    create_task(db, NewTask::from(form.into_inner())).await?;

    Ok(Redirect::to(uri!(tasks_page)))
}

#[get("/task/toggle/<id>")]
pub async fn toggle_task_route(id: i64, db: &State<Pool<Sqlite>>) -> Result<Redirect, AppError> {
    if !toggle_task(db, id).await? {
        debug!("Toggle ignored for unknown task {}", id);
    }

    Ok(Redirect::to(uri!(tasks_page)))
}

#[get("/task/edit/<id>")]
pub async fn edit_task_form(id: i64, db: &State<Pool<Sqlite>>) -> Result<Template, AppError> {
    let task = get_task(db, id).await?;
    let categories = get_all_categories(db).await?;

    Ok(Template::render(
        "edit_task",
        context! {
            title: "Edit task",
            task: task,
            categories: categories,
        },
    ))
}

#[post("/task/edit/<id>", data = "<form>")]
pub async fn edit_task_route(
    id: i64,
    form: Form<TaskForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    update_task(db, id, TaskChanges::from(form.into_inner())).await?;

    Ok(Redirect::to(uri!(tasks_page)))
}

#[get("/task/delete/<id>")]
pub async fn delete_task_route(id: i64, db: &State<Pool<Sqlite>>) -> Result<Redirect, AppError> {
    delete_task(db, id).await?;

    Ok(Redirect::to(uri!(tasks_page)))
}

#[get("/categories")]
pub async fn categories_page(db: &State<Pool<Sqlite>>) -> Result<Template, AppError> {
    let categories = get_all_categories(db).await?;

    Ok(Template::render(
        "categories",
        context! {
            title: "Categories",
            categories: categories,
        },
    ))
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
