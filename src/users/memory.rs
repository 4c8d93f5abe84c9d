//! In-memory repository used by the router and seed tests.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error::RepoError,
    users::{repo::UserRepository, repo_types::User},
};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
    fail_list: AtomicBool,
    fail_create: AtomicBool,
    closes: AtomicUsize,
}

impl MemoryUserRepository {
    pub fn with_users(users: &[(&str, &str)]) -> Self {
        let repo = Self::default();
        {
            let mut stored = repo.users.lock().unwrap();
            for (name, email) in users {
                stored.push(User {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    email: email.to_string(),
                    created_at: OffsetDateTime::now_utc(),
                });
            }
        }
        repo
    }

    /// Makes every later scan fail as if the connection dropped.
    pub fn failing_scans(self) -> Self {
        self.fail_list.store(true, Ordering::SeqCst);
        self
    }

    /// Makes every later insert fail.
    pub fn failing_creates(self) -> Self {
        self.fail_create.store(true, Ordering::SeqCst);
        self
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RepoError::database("list users")(sqlx::Error::PoolClosed));
        }
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(&self, name: &str, email: &str) -> Result<User, RepoError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RepoError::database("create user")(sqlx::Error::PoolClosed));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
