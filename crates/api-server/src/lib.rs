use std::sync::Arc;

use ai_client::{AiError, ChatCompletionClient, LlmAdvisor, MarketAdvisor};
use analysis_core::{MarketDataProvider, NewsProvider};
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dashboard_store::{AlertManager, CustomListManager, DashboardDb, StoreError, UserManager};
use market_data_client::AngelOneClient;
use news_client::NewsApiClient;
use notification_service::NotificationService;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
mod identity;
mod request_id;

mod ai_routes;
mod alert_routes;
mod auth_routes;
mod settings_routes;
mod stock_routes;


pub use config::ServerConfig;
pub use identity::CallerId;

/// Brokerage login details exposed by the auth routes
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub authenticated: bool,
    pub mock_mode: bool,
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub market_data: Arc<dyn MarketDataProvider>,
    pub news: Arc<dyn NewsProvider>,
    pub advisor: Arc<dyn MarketAdvisor>,
    pub alerts: AlertManager,
    pub custom_lists: CustomListManager,
    pub users: UserManager,
    pub notifications: NotificationService,
    pub oauth: OAuthSettings,
}

impl AppState {
    pub fn new(
        db: DashboardDb,
        market_data: Arc<dyn MarketDataProvider>,
        news: Arc<dyn NewsProvider>,
        advisor: Arc<dyn MarketAdvisor>,
        notifications: NotificationService,
        oauth: OAuthSettings,
    ) -> Self {
        Self {
            market_data,
            news,
            advisor,
            alerts: AlertManager::new(db.clone()),
            custom_lists: CustomListManager::new(db.clone()),
            users: UserManager::new(db),
            notifications,
            oauth,
        }
    }
}

/// `{success, data, error}` envelope used by every route
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Body of write endpoints that only confirm the change
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Handler error: an `anyhow::Error` plus the status it maps to.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn missing_field(field: &str) -> Self {
        Self::bad_request(format!("Missing required field: {}", field))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

fn status_for(error: &anyhow::Error) -> StatusCode {
    if let Some(e) = error.downcast_ref::<StoreError>() {
        return match e {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Database(_) | StoreError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
    }

    if let Some(e) = error.downcast_ref::<AiError>() {
        return match e {
            AiError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        };
    }

    if error.is::<JsonRejection>() || error.is::<QueryRejection>() || error.is::<PathRejection>() {
        return StatusCode::BAD_REQUEST;
    }

    StatusCode::INTERNAL_SERVER_ERROR
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        Self {
            status: status_for(&error),
            error,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = format!("{:#}", self.error);
        if self.status.is_server_error() {
            tracing::error!("{} {}", self.status, message);
        } else {
            tracing::debug!("{} {}", self.status, message);
        }

        let body: ApiResponse<()> = ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        };
        (self.status, Json(body)).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assemble every route group behind the shared middleware stack
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(alert_routes::alert_routes())
        .merge(settings_routes::settings_routes())
        .merge(stock_routes::stock_routes())
        .merge(ai_routes::ai_routes())
        .merge(auth_routes::auth_routes())
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Install the global tracing subscriber. `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Starting market dashboard API");
    tracing::info!("  Market data: {}", if config.market.mock_mode { "mock" } else { "SmartAPI" });
    tracing::info!("  News: {}", if config.news.mock_mode { "mock" } else { "NewsAPI" });
    tracing::info!("  AI model: {} (configured: {})", config.ai.model, config.ai.is_configured());

    let db = DashboardDb::new(&config.database_url).await?;

    let oauth = OAuthSettings {
        client_id: config.oauth_client_id(),
        authenticated: !config.market.access_token.is_empty(),
        mock_mode: config.market.mock_mode,
    };
    let state = AppState::new(
        db,
        Arc::new(AngelOneClient::new(config.market.clone())),
        Arc::new(NewsApiClient::new(config.news.clone())),
        Arc::new(LlmAdvisor::new(ChatCompletionClient::new(config.ai.clone()))),
        NotificationService::new(&config.notifications),
        oauth,
    );

    let app = build_router(state);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
