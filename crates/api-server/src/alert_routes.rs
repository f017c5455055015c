//! Alert API Routes
//!
//! CRUD for the caller's alerts plus the manual trigger endpoint.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use dashboard_store::{Alert, AlertStatus, AlertUpdate, NewAlert, NotificationChannel, TriggerType};
use notification_service::AlertNotification;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{ApiResponse, AppError, AppState, CallerId, MessageResponse};

#[derive(Deserialize)]
pub struct CreateAlertRequest {
    pub stock_symbol: Option<String>,
    pub stock_name: Option<String>,
    pub trigger_type: Option<String>,
    pub trigger_value: Option<Value>,
    pub notification_channel: Option<String>,
    pub webhook_url: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateAlertRequest {
    pub trigger_value: Option<Value>,
    pub notification_channel: Option<String>,
    /// Absent keeps the stored webhook; `null` or blank clears it
    #[serde(default, deserialize_with = "present")]
    pub webhook_url: Option<Option<String>>,
    pub status: Option<String>,
}

/// Marks a field as present, so an explicit `null` is distinguishable from absence
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct TriggerAlertRequest {
    pub alert_id: Option<i64>,
}

#[derive(Serialize)]
pub struct AlertListResponse {
    pub alerts: Vec<Alert>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct AlertCreatedResponse {
    pub message: String,
    pub alert_id: i64,
}

#[derive(Serialize)]
pub struct AlertTriggeredResponse {
    pub message: String,
    pub alert_id: i64,
    pub notification_sent: bool,
}

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/api/alerts", get(list_alerts).post(create_alert))
        .route("/api/alerts/trigger", post(trigger_alert))
        .route("/api/alerts/:id", put(update_alert).delete(delete_alert))
}

/// Trigger values arrive as strings or bare numbers
fn trigger_value_text(value: Value) -> Result<String, AppError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(AppError::bad_request(format!(
            "trigger_value must be a string or number, got {}",
            other
        ))),
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::missing_field(field))
}

async fn list_alerts(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
) -> Result<Json<ApiResponse<AlertListResponse>>, AppError> {
    let alerts = state.alerts.list_alerts(user_id).await?;

    Ok(Json(ApiResponse::success(AlertListResponse {
        count: alerts.len(),
        alerts,
    })))
}

async fn create_alert(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    payload: Result<Json<CreateAlertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AlertCreatedResponse>>), AppError> {
    let Json(req) = payload?;

    let stock_symbol = required(req.stock_symbol, "stock_symbol")?;
    let trigger_type: TriggerType = required(req.trigger_type, "trigger_type")?.parse()?;
    let trigger_value = trigger_value_text(required(req.trigger_value, "trigger_value")?)?;
    let notification_channel: NotificationChannel =
        required(req.notification_channel, "notification_channel")?.parse()?;

    let alert_id = state
        .alerts
        .create_alert(
            user_id,
            NewAlert {
                stock_symbol,
                stock_name: req.stock_name,
                trigger_type,
                trigger_value,
                notification_channel,
                webhook_url: req.webhook_url,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AlertCreatedResponse {
            message: "Alert created successfully".to_string(),
            alert_id,
        })),
    ))
}

async fn update_alert(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateAlertRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let Path(id) = path?;
    let Json(req) = payload?;

    let update = AlertUpdate {
        trigger_value: req.trigger_value.map(trigger_value_text).transpose()?,
        notification_channel: req
            .notification_channel
            .map(|c| c.parse::<NotificationChannel>())
            .transpose()?,
        webhook_url: req.webhook_url,
        status: req.status.map(|s| s.parse::<AlertStatus>()).transpose()?,
    };
    state.alerts.update_alert(user_id, id, update).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Alert updated successfully".to_string(),
    })))
}

async fn delete_alert(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let Path(id) = path?;
    state.alerts.delete_alert(user_id, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Alert deleted successfully".to_string(),
    })))
}

/// Mark the alert triggered, then notify. Delivery failure does not fail the request.
async fn trigger_alert(
    State(state): State<AppState>,
    CallerId(user_id): CallerId,
    payload: Result<Json<TriggerAlertRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AlertTriggeredResponse>>, AppError> {
    let Json(req) = payload?;
    let alert_id = required(req.alert_id, "alert_id")?;

    let alert = state.alerts.trigger_alert(user_id, alert_id).await?;

    let notification = AlertNotification {
        alert_id: alert.id,
        stock_symbol: alert.stock_symbol.clone(),
        trigger_type: alert.trigger_type.to_string(),
        trigger_value: alert.trigger_value.clone(),
        notification_channel: alert.notification_channel.to_string(),
        triggered_at: alert.triggered_at.unwrap_or_else(chrono::Utc::now),
    };
    let notification_sent = state
        .notifications
        .deliver(&notification, alert.webhook_url.as_deref())
        .await;

    Ok(Json(ApiResponse::success(AlertTriggeredResponse {
        message: "Alert triggered successfully".to_string(),
        alert_id,
        notification_sent,
    })))
}
