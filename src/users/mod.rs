pub mod handlers;
#[cfg(test)]
pub(crate) mod memory;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::{PgUserRepository, UserRepository};
pub use repo_types::{NewUser, User};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::read_routes())
}
