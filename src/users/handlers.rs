use axum::{extract::State, response::Html, routing::get, Router};
use tracing::{debug, instrument};

use crate::{error::AppError, state::AppState, users::services::render_users_html};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/", get(list_users_page))
}

#[instrument(skip(state))]
pub async fn list_users_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let users = state.users.list_users().await?;
    debug!(count = users.len(), view = ?state.config.view, "rendering users page");
    let html = render_users_html(&users, state.config.view, state.config.field)?;
    Ok(Html(html))
}
