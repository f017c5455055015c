use chrono::Utc;

use crate::db::DashboardDb;
use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::stocks;
use crate::users::ensure_user;

const SELECT_ALERT: &str = r#"
    SELECT a.id, a.user_id, s.symbol AS stock_symbol, a.trigger_type, a.trigger_value,
           a.notification_channel, a.webhook_url, a.status, a.created_at, a.triggered_at
    FROM alerts a
    JOIN stocks s ON s.id = a.stock_id
"#;

/// User-scoped alert CRUD. An alert owned by someone else is reported as missing.
#[derive(Clone)]
pub struct AlertManager {
    db: DashboardDb,
}

impl AlertManager {
    pub fn new(db: DashboardDb) -> Self {
        Self { db }
    }

    /// Create an active alert, registering the stock on first use
    pub async fn create_alert(&self, user_id: i64, alert: NewAlert) -> StoreResult<i64> {
        let symbol = stocks::normalize_symbol(&alert.stock_symbol)?;
        let trigger_value = alert.trigger_value.trim();
        if trigger_value.is_empty() {
            return Err(StoreError::Validation("trigger_value must not be empty".to_string()));
        }

        let mut tx = self.db.pool().begin().await?;
        ensure_user(&mut tx, user_id).await?;
        let stock_id = stocks::find_or_create(&mut tx, &symbol, alert.stock_name.as_deref()).await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO alerts
            (user_id, stock_id, trigger_type, trigger_value, notification_channel, webhook_url, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(stock_id)
        .bind(alert.trigger_type)
        .bind(trigger_value)
        .bind(alert.notification_channel)
        .bind(alert.webhook_url.as_deref().map(str::trim).filter(|u| !u.is_empty()))
        .bind(AlertStatus::Active)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Created alert {} on {} for user {}", id, symbol, user_id);
        Ok(id)
    }

    /// All alerts of a user, newest first
    pub async fn list_alerts(&self, user_id: i64) -> StoreResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            "{} WHERE a.user_id = ? ORDER BY a.created_at DESC, a.id DESC",
            SELECT_ALERT
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(alerts)
    }

    pub async fn get_alert(&self, user_id: i64, id: i64) -> StoreResult<Alert> {
        sqlx::query_as::<_, Alert>(&format!("{} WHERE a.id = ? AND a.user_id = ?", SELECT_ALERT))
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::not_found("Alert", id))
    }

    /// Apply the supplied fields; status is set directly
    pub async fn update_alert(&self, user_id: i64, id: i64, update: AlertUpdate) -> StoreResult<()> {
        if let Some(value) = &update.trigger_value {
            if value.trim().is_empty() {
                return Err(StoreError::Validation("trigger_value must not be empty".to_string()));
            }
        }

        let webhook_changed = update.webhook_url.is_some();
        let webhook_url = update
            .webhook_url
            .flatten()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let result = sqlx::query(
            r#"
            UPDATE alerts SET
                trigger_value = COALESCE(?, trigger_value),
                notification_channel = COALESCE(?, notification_channel),
                webhook_url = CASE WHEN ? THEN ? ELSE webhook_url END,
                status = COALESCE(?, status)
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(update.trigger_value.as_deref().map(str::trim))
        .bind(update.notification_channel)
        .bind(webhook_changed)
        .bind(webhook_url)
        .bind(update.status)
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Alert", id));
        }
        Ok(())
    }

    pub async fn delete_alert(&self, user_id: i64, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Alert", id));
        }
        Ok(())
    }

    /// Mark the alert triggered and return its committed state
    pub async fn trigger_alert(&self, user_id: i64, id: i64) -> StoreResult<Alert> {
        let result = sqlx::query(
            "UPDATE alerts SET status = ?, triggered_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(AlertStatus::Triggered)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Alert", id));
        }

        tracing::info!("Alert {} triggered for user {}", id, user_id);
        self.get_alert(user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager() -> AlertManager {
        AlertManager::new(DashboardDb::in_memory().await.unwrap())
    }

    fn new_alert(symbol: &str) -> NewAlert {
        NewAlert {
            stock_symbol: symbol.to_string(),
            stock_name: None,
            trigger_type: TriggerType::Price,
            trigger_value: "2500".to_string(),
            notification_channel: NotificationChannel::Email,
            webhook_url: None,
        }
    }

    async fn stock_count(alerts: &AlertManager) -> i64 {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stocks")
            .fetch_one(alerts.db.pool())
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let alerts = manager().await;
        let id = alerts.create_alert(1, new_alert(" reliance ")).await.unwrap();

        let listed = alerts.list_alerts(1).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].stock_symbol, "RELIANCE");
        assert_eq!(listed[0].status, AlertStatus::Active);
        assert!(listed[0].triggered_at.is_none());
    }

    #[tokio::test]
    async fn test_stock_row_shared_between_alerts() {
        let alerts = manager().await;
        alerts.create_alert(1, new_alert("TCS")).await.unwrap();
        alerts.create_alert(2, new_alert("tcs")).await.unwrap();
        alerts.create_alert(1, new_alert("INFY")).await.unwrap();

        assert_eq!(stock_count(&alerts).await, 2);
    }

    #[tokio::test]
    async fn test_invalid_alert_registers_no_stock() {
        let alerts = manager().await;
        let mut alert = new_alert("NEWCO");
        alert.trigger_value = "  ".to_string();

        assert!(matches!(alerts.create_alert(1, alert).await, Err(StoreError::Validation(_))));
        assert_eq!(stock_count(&alerts).await, 0);
    }

    #[tokio::test]
    async fn test_alerts_are_user_scoped() {
        let alerts = manager().await;
        let id = alerts.create_alert(1, new_alert("TCS")).await.unwrap();

        assert!(alerts.list_alerts(2).await.unwrap().is_empty());
        assert!(matches!(alerts.get_alert(2, id).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(alerts.delete_alert(2, id).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(alerts.trigger_alert(2, id).await, Err(StoreError::NotFound { .. })));
        assert!(alerts.get_alert(1, id).await.is_ok());
    }

    #[tokio::test]
    async fn test_partial_update() {
        let alerts = manager().await;
        let id = alerts.create_alert(1, new_alert("TCS")).await.unwrap();

        alerts
            .update_alert(
                1,
                id,
                AlertUpdate {
                    status: Some(AlertStatus::Inactive),
                    webhook_url: Some(Some("https://hooks.example.com/a".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let alert = alerts.get_alert(1, id).await.unwrap();
        assert_eq!(alert.status, AlertStatus::Inactive);
        assert_eq!(alert.trigger_value, "2500");
        assert_eq!(alert.notification_channel, NotificationChannel::Email);
        assert_eq!(alert.webhook_url.as_deref(), Some("https://hooks.example.com/a"));
    }

    #[tokio::test]
    async fn test_update_clears_webhook() {
        let alerts = manager().await;
        let mut alert = new_alert("TCS");
        alert.webhook_url = Some("https://hooks.example.com/x".to_string());
        let id = alerts.create_alert(1, alert).await.unwrap();

        // absent keeps the stored url
        alerts.update_alert(1, id, AlertUpdate::default()).await.unwrap();
        let alert = alerts.get_alert(1, id).await.unwrap();
        assert_eq!(alert.webhook_url.as_deref(), Some("https://hooks.example.com/x"));

        let clear = AlertUpdate {
            webhook_url: Some(None),
            ..Default::default()
        };
        alerts.update_alert(1, id, clear).await.unwrap();
        assert!(alerts.get_alert(1, id).await.unwrap().webhook_url.is_none());

        let set = AlertUpdate {
            webhook_url: Some(Some(" https://hooks.example.com/y ".to_string())),
            ..Default::default()
        };
        alerts.update_alert(1, id, set).await.unwrap();
        let alert = alerts.get_alert(1, id).await.unwrap();
        assert_eq!(alert.webhook_url.as_deref(), Some("https://hooks.example.com/y"));

        let blank = AlertUpdate {
            webhook_url: Some(Some("   ".to_string())),
            ..Default::default()
        };
        alerts.update_alert(1, id, blank).await.unwrap();
        assert!(alerts.get_alert(1, id).await.unwrap().webhook_url.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_alert() {
        let alerts = manager().await;
        let err = alerts.update_alert(1, 99, AlertUpdate::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Alert", id: 99 }));
    }

    #[tokio::test]
    async fn test_trigger_sets_status_and_time() {
        let alerts = manager().await;
        let id = alerts.create_alert(1, new_alert("TCS")).await.unwrap();

        let triggered = alerts.trigger_alert(1, id).await.unwrap();
        assert_eq!(triggered.status, AlertStatus::Triggered);
        assert!(triggered.triggered_at.is_some());
    }

    #[tokio::test]
    async fn test_delete() {
        let alerts = manager().await;
        let id = alerts.create_alert(1, new_alert("TCS")).await.unwrap();

        alerts.delete_alert(1, id).await.unwrap();
        assert!(alerts.list_alerts(1).await.unwrap().is_empty());
        assert!(alerts.delete_alert(1, id).await.is_err());
    }
}
