use std::process::ExitCode;

use userboard::{config::AppConfig, seed, state::connect_users};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    userboard::init_tracing();

    let repo = match AppConfig::from_env() {
        Ok(config) => connect_users(&config).await,
        Err(e) => Err(e.context("load config")),
    };
    let repo = match repo {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "seed setup failed");
            return ExitCode::from(1);
        }
    };

    let status = seed::run(&repo, &seed::demo_user(), &mut std::io::stdout()).await;
    ExitCode::from(status)
}
