use std::sync::Arc;

use anyhow::Context;
use sqlx::{migrate::Migrator, postgres::PgPoolOptions};

use crate::config::AppConfig;
use crate::users::repo::{PgUserRepository, UserRepository};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Loads config from the environment and connects the repository.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env().context("load config")?);
        let users = connect_users(&config).await?;
        Ok(Self::from_parts(Arc::new(users), config))
    }

    pub fn from_parts(users: Arc<dyn UserRepository>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// Releases the repository. Called once the server has stopped.
    pub async fn shutdown(&self) {
        self.users.close().await;
    }
}

/// Connects the pool and applies pending migrations. Shared by the server and
/// the seed binary so either can run first against a fresh database.
pub async fn connect_users(config: &AppConfig) -> anyhow::Result<PgUserRepository> {
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    if let Err(e) = MIGRATOR.run(&db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    Ok(PgUserRepository::new(db))
}
