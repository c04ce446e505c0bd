use std::path::Path;

use rocket::figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database.db";

/// Application settings layered on top of Rocket's own configuration.
///
/// Values come from (lowest to highest priority) the defaults below,
/// `Rocket.toml`, `ROCKET_*` environment variables and finally a raw
/// `DATABASE_URL` variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    pub database_url: String,
    pub password_hash_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            password_hash_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AppConfig {
    pub fn figment() -> Figment {
        rocket::Config::figment()
            .join(Serialized::defaults(AppConfig::default()))
            .merge(Env::raw().only(&["DATABASE_URL"]).global())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        figment.extract()
    }
}

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}
