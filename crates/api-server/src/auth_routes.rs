//! Brokerage OAuth Routes
//!
//! Login URL construction and the callback/postback endpoints the broker calls
//! back into. Token exchange is not performed here.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header::HOST, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

const PUBLISHER_LOGIN_URL: &str = "https://smartapi.angelbroking.com/publisher-login";
const CALLBACK_PATH: &str = "/api/auth/callback";

#[derive(Serialize)]
pub struct LoginResponse {
    pub oauth_url: String,
    pub redirect_uri: String,
    pub client_id: String,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Serialize)]
pub struct CallbackResponse {
    pub message: String,
    pub auth_code: String,
    pub state: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct PostbackResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub mock_mode: bool,
    pub timestamp: DateTime<Utc>,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", get(login))
        .route("/api/auth/callback", get(callback))
        .route("/api/auth/postback", post(postback))
        .route("/api/auth/status", get(status))
}

/// Callback URL on this server, as reached by the client
fn redirect_uri(headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    format!("{}://{}{}", scheme, host, CALLBACK_PATH)
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let redirect_uri = redirect_uri(&headers);
    let client_id = state.oauth.client_id.clone();

    let oauth_url = Url::parse_with_params(
        PUBLISHER_LOGIN_URL,
        &[("api_key", client_id.as_str()), ("redirect_url", redirect_uri.as_str())],
    )?;

    Ok(Json(ApiResponse::success(LoginResponse {
        oauth_url: oauth_url.to_string(),
        redirect_uri,
        client_id,
    })))
}

async fn callback(
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<CallbackResponse>>, AppError> {
    let Query(params) = query?;
    let auth_code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("Authorization code not received"))?;

    tracing::info!("Received brokerage OAuth callback");

    Ok(Json(ApiResponse::success(CallbackResponse {
        message: "Authentication successful".to_string(),
        auth_code,
        state: params.state,
        timestamp: Utc::now(),
    })))
}

/// Broker postbacks may be JSON or form encoded; the raw body is logged
async fn postback(body: Bytes) -> Json<ApiResponse<PostbackResponse>> {
    tracing::info!("Received postback: {}", String::from_utf8_lossy(&body));

    Json(ApiResponse::success(PostbackResponse {
        message: "Postback received successfully".to_string(),
        timestamp: Utc::now(),
    }))
}

async fn status(State(state): State<AppState>) -> Json<ApiResponse<AuthStatusResponse>> {
    Json(ApiResponse::success(AuthStatusResponse {
        authenticated: state.oauth.authenticated,
        mock_mode: state.oauth.mock_mode,
        timestamp: Utc::now(),
    }))
}
