use userboard::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    userboard::init_tracing();

    let app_state = AppState::init().await?;
    app::serve(app_state).await
}
