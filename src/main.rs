#[macro_use]
extern crate rocket;

mod database;
mod db;
mod env;
mod error;
mod models;
mod routes;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use anyhow::Context;
use env::{AppConfig, load_environment};
use error::AppError;
use rocket::figment::Figment;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use routes::{
    categories_page, create_task_form, create_task_route, delete_task_route, edit_task_form,
    edit_task_route, health, index, tasks_page, toggle_task_route,
};
use sqlx::{Pool, Sqlite};
use telemetry::{TelemetryFairing, init_tracing, shutdown_telemetry};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Anyhow(anyhow::Error),
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Error::Anyhow(value)
    }
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    let env_result = load_environment().map_err(|e| anyhow::anyhow!("{}", e));

    init_tracing().context("Failed to initialise tracing")?;
    env_result.context("Failed to load environment files")?;

    let figment = AppConfig::figment();
    let config = AppConfig::from_figment(&figment)?;

    let pool = database::connect(&config).await?;

    info!("Initialising database schema...");
    match database::init_database(&pool, &config).await {
        Ok(_) => info!("Database initialised successfully"),
        Err(e) => {
            error!("Failed to initialise database: {}", e);
            shutdown_telemetry();
            return Err(e.into());
        }
    }

    let result = init_rocket(figment, pool).await.launch().await;

    shutdown_telemetry();

    result.map(|_| ()).map_err(|e| AppError::from(e).into())
}

pub async fn init_rocket(figment: Figment, pool: Pool<Sqlite>) -> Rocket<Build> {
    info!("Starting task tracker");

    rocket::custom(figment)
        .manage(pool)
        .mount(
            "/",
            routes![
                index,
                tasks_page,
                create_task_form,
                create_task_route,
                toggle_task_route,
                edit_task_form,
                edit_task_route,
                delete_task_route,
                categories_page,
                health,
            ],
        )
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
