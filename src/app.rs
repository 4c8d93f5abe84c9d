use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use tokio::signal;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

use crate::{config::HttpConfig, middleware::parse_json_body, state::AppState, users};

/// Single-origin CORS with credentials, mirroring whatever headers the
/// preflight asks for. Other origins get no `Access-Control-Allow-Origin`.
pub fn cors_layer(http: &HttpConfig) -> anyhow::Result<CorsLayer> {
    if http.cors_origin.trim() == "*" {
        anyhow::bail!("CORS origin '*' cannot be combined with credentials; set an explicit origin");
    }
    let origin = http
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin '{}'", http.cors_origin))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request()))
}

pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.http)?;
    let json_limit = state.config.http.json_body_limit;

    Ok(Router::new()
        .merge(users::router())
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(json_limit, parse_json_body))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        ))
}

/// Serves until Ctrl+C or SIGTERM, then releases the repository.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let http = &state.config.http;
    let addr: SocketAddr = format!("{}:{}", http.host, http.port)
        .parse()
        .context("parse listen address")?;
    let app = build_app(state.clone())?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    state.shutdown().await;
    served.context("http server")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received Ctrl+C, shutting down"),
        _ = terminate => warn!("received SIGTERM, shutting down"),
    }
}
