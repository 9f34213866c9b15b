use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use nexus_core::DeskResult;
use nexus_engine::FeedbackDesk;
use nexus_store::SqliteStore;

use crate::error::{ApiError, ApiResult};
use crate::routes;
use crate::session::{self, SessionRegistry};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            request_timeout_secs: 30,
            session_ttl_secs: 86_400,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<FeedbackDesk<SqliteStore>>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(desk: FeedbackDesk<SqliteStore>, session_ttl: Duration) -> Self {
        Self {
            desk: Arc::new(desk),
            sessions: Arc::new(SessionRegistry::new(session_ttl)),
        }
    }

    /// Run a desk operation on the blocking pool. Password hashing and the
    /// SQLite connection lock both block, so handlers go through here
    /// instead of calling the desk on a runtime worker.
    pub async fn desk_call<T, F>(&self, f: F) -> ApiResult<T>
    where
        F: FnOnce(&FeedbackDesk<SqliteStore>) -> DeskResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let desk = Arc::clone(&self.desk);
        let result = tokio::task::spawn_blocking(move || f(&*desk))
            .await
            .map_err(|e| ApiError::internal(format!("desk task failed: {e}")))?;
        Ok(result?)
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/session", get(routes::get_session))
        .route("/api/login", post(routes::login))
        .route("/api/logout", post(routes::logout))
        .route("/api/stats", get(routes::stats))
        .route(
            "/api/feedback",
            get(routes::list_feedback).post(routes::create_feedback),
        )
        .route(
            "/api/feedback/{id}",
            get(routes::get_feedback).put(routes::update_feedback),
        )
        .route("/api/feedback/{id}/comments", post(routes::add_comment))
        .route("/api/faculty/tasks", get(routes::my_tasks))
        .route("/api/users/faculty", get(routes::list_faculty))
        .route("/api/users/add-faculty", post(routes::add_faculty))
        .route("/api/users/{id}", delete(routes::delete_user))
        .route("/api/faculty-stats", get(routes::faculty_stats))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the listener and serve in the background. Returns a handle to shut
/// it down.
pub async fn start(
    config: ServerConfig,
    desk: FeedbackDesk<SqliteStore>,
) -> Result<ServerHandle, std::io::Error> {
    let state = AppState::new(desk, Duration::from_secs(config.session_ttl_secs));

    let cleanup = session::start_cleanup_task(
        Arc::clone(&state.sessions),
        Duration::from_secs(60),
    );

    let router = build_router(state, Duration::from_secs(config.request_timeout_secs));
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "feedback desk listening");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        if let Err(e) = serve.await {
            tracing::error!(error = %e, "server exited with error");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        shutdown_tx: Some(shutdown_tx),
        server,
        cleanup,
    })
}

/// Handle returned by `start()`; keeps background tasks alive.
pub struct ServerHandle {
    pub port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: tokio::task::JoinHandle<()>,
    cleanup: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.cleanup.abort();
        if let Err(e) = (&mut self.server).await {
            tracing::warn!(error = %e, "server task did not exit cleanly");
        }
        tracing::info!("feedback desk stopped");
    }
}
