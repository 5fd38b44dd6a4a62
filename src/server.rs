//! HTTP surface: the dashboard page at `/`, nothing else.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// The page is rendered once at startup and shared by every request.
#[derive(Clone)]
pub struct AppState {
    page: Bytes,
}

impl AppState {
    pub fn new(page: String) -> Self {
        Self {
            page: Bytes::from(page),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_page))
        .with_state(state)
}

async fn dashboard_page(State(state): State<AppState>) -> Html<Bytes> {
    debug!(bytes = state.page.len(), "serving dashboard");
    Html(state.page.clone())
}

/// Serve until SIGINT or SIGTERM.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("dashboard listening on http://{addr}/");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;
    info!("dashboard stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
