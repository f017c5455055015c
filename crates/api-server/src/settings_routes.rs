//! Settings API Routes
//!
//! User preferences and the caller's custom stock lists.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use dashboard_store::{CustomList, User, UserManager, UserSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ApiResponse, AppError, AppState, CallerId, MessageResponse};

#[derive(Serialize)]
pub struct SettingsResponse {
    pub user: User,
    pub settings: UserSettings,
    pub custom_lists: Vec<CustomList>,
}

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub settings: Option<Value>,
}

#[derive(Serialize)]
pub struct SettingsUpdatedResponse {
    pub message: String,
    pub settings: UserSettings,
}

#[derive(Deserialize)]
pub struct CreateListRequest {
    pub name: Option<String>,
    pub stocks: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct UpdateListRequest {
    pub name: Option<String>,
    pub stocks: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ListCreatedResponse {
    pub message: String,
    pub list_id: i64,
}

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .route("/api/custom-lists", post(create_list))
        .route("/api/custom-lists/:id", put(update_list).delete(delete_list))
}

/// Settings, profile and lists for the caller. The user row is created on first visit.
async fn get_settings(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Json<ApiResponse<SettingsResponse>>, AppError> {
    let user = state.users.get_or_create(user_id).await?;
    let settings = UserManager::settings_of(&user)?;
    let custom_lists = state.custom_lists.list_lists(user_id).await?;

    Ok(Json(ApiResponse::success(SettingsResponse {
        user,
        settings,
        custom_lists,
    })))
}

async fn update_settings(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    payload: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SettingsUpdatedResponse>>, AppError> {
    let Json(req) = payload?;
    let partial = req.settings.ok_or_else(|| AppError::missing_field("settings"))?;

    let settings = state.users.update_settings(user_id, partial).await?;

    Ok(Json(ApiResponse::success(SettingsUpdatedResponse {
        message: "Settings updated successfully".to_string(),
        settings,
    })))
}

async fn create_list(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    payload: Result<Json<CreateListRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ListCreatedResponse>>), AppError> {
    let Json(req) = payload?;
    let name = req.name.ok_or_else(|| AppError::missing_field("name"))?;
    let stocks = req.stocks.ok_or_else(|| AppError::missing_field("stocks"))?;

    let list_id = state.custom_lists.create_list(user_id, &name, &stocks).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ListCreatedResponse {
            message: "Custom list created successfully".to_string(),
            list_id,
        })),
    ))
}

async fn update_list(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateListRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let Path(id) = path?;
    let Json(req) = payload?;

    state
        .custom_lists
        .update_list(user_id, id, req.name.as_deref(), req.stocks.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Custom list updated successfully".to_string(),
    })))
}

async fn delete_list(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let Path(id) = path?;
    state.custom_lists.delete_list(user_id, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Custom list deleted successfully".to_string(),
    })))
}
