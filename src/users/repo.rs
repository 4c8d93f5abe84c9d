use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::{error::RepoError, users::repo_types::User};

/// Storage seam for users. The server and the seed script only talk to this.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Unfiltered scan of every stored user.
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;

    /// Insert a user and return the stored row, generated id included.
    async fn create_user(&self, name: &str, email: &str) -> Result<User, RepoError>;

    /// Release the underlying connections. Safe to call more than once.
    async fn close(&self);
}

pub struct PgUserRepository {
    db: PgPool,
    closed: AtomicBool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            closed: AtomicBool::new(false),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    fn ensure_open(&self) -> Result<(), RepoError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RepoError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        self.ensure_open()?;
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(RepoError::database("list users"))?;
        debug!(count = users.len(), "users listed");
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn create_user(&self, name: &str, email: &str) -> Result<User, RepoError> {
        self.ensure_open()?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(RepoError::database("create user"))?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!("user repository already closed");
            return;
        }
        self.db.close().await;
        info!("user repository closed");
    }
}
