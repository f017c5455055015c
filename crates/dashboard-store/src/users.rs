use chrono::Utc;
use serde_json::Value;
use sqlx::SqliteConnection;

use crate::db::DashboardDb;
use crate::error::{StoreError, StoreResult};
use crate::models::{User, UserSettings};

/// Insert the user row for `user_id` if it does not exist yet
pub(crate) async fn ensure_user(conn: &mut SqliteConnection, user_id: i64) -> StoreResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO users (id, username, email, settings, created_at) VALUES (?, ?, NULL, NULL, ?)",
    )
    .bind(user_id)
    .bind(format!("user_{}", user_id))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct UserManager {
    db: DashboardDb,
}

impl UserManager {
    pub fn new(db: DashboardDb) -> Self {
        Self { db }
    }

    pub async fn get(&self, user_id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(user)
    }

    pub async fn get_or_create(&self, user_id: i64) -> StoreResult<User> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_user(&mut conn, user_id).await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(user)
    }

    /// Stored settings, or the defaults when nothing has been saved
    pub fn settings_of(user: &User) -> StoreResult<UserSettings> {
        match user.settings.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(raw)?),
            _ => Ok(UserSettings::default()),
        }
    }

    /// Merge `partial` over the stored settings and persist the result
    pub async fn update_settings(&self, user_id: i64, partial: Value) -> StoreResult<UserSettings> {
        if !partial.is_object() {
            return Err(StoreError::Validation("settings must be a JSON object".to_string()));
        }

        let user = self
            .get(user_id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", user_id))?;

        let mut merged = serde_json::to_value(Self::settings_of(&user)?)?;
        merge_json(&mut merged, partial);

        let settings: UserSettings = serde_json::from_value(merged)
            .map_err(|e| StoreError::Validation(format!("Invalid settings: {}", e)))?;

        sqlx::query("UPDATE users SET settings = ? WHERE id = ?")
            .bind(serde_json::to_string(&settings)?)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        tracing::debug!("Updated settings for user {}", user_id);
        Ok(settings)
    }
}

/// Recursive object merge; non-object values in `patch` replace the target
fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (dst, value) => *dst = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn manager() -> UserManager {
        UserManager::new(DashboardDb::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let users = manager().await;
        assert!(users.get(7).await.unwrap().is_none());

        let created = users.get_or_create(7).await.unwrap();
        assert_eq!(created.id, 7);
        assert_eq!(created.username, "user_7");

        let again = users.get_or_create(7).await.unwrap();
        assert_eq!(again.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_new_user_has_default_settings() {
        let users = manager().await;
        let user = users.get_or_create(1).await.unwrap();
        assert_eq!(UserManager::settings_of(&user).unwrap(), UserSettings::default());
    }

    #[tokio::test]
    async fn test_update_settings_merges_nested_fields() {
        let users = manager().await;
        users.get_or_create(1).await.unwrap();

        users
            .update_settings(1, json!({"theme": "light", "notification_preferences": {"sms": true}}))
            .await
            .unwrap();
        let updated = users
            .update_settings(1, json!({"ai_settings": {"recommendation_count": 8}}))
            .await
            .unwrap();

        assert_eq!(updated.theme, "light");
        assert!(updated.notification_preferences.sms);
        assert!(updated.notification_preferences.email);
        assert_eq!(updated.ai_settings.recommendation_count, 8);
        assert_eq!(updated.ai_settings.risk_tolerance, "moderate");

        let stored = users.get(1).await.unwrap().unwrap();
        assert_eq!(UserManager::settings_of(&stored).unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_settings_unknown_user() {
        let users = manager().await;
        let err = users.update_settings(42, json!({"theme": "light"})).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "User", id: 42 }));
    }

    #[tokio::test]
    async fn test_update_settings_rejects_wrong_types() {
        let users = manager().await;
        users.get_or_create(1).await.unwrap();

        let err = users
            .update_settings(1, json!({"ai_settings": {"recommendation_count": "many"}}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let err = users.update_settings(1, json!(["dark"])).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn test_merge_json_replaces_scalars() {
        let mut target = json!({"a": {"b": 1, "c": 2}, "d": 3});
        merge_json(&mut target, json!({"a": {"b": 10}, "d": {"x": 1}, "e": 5}));
        assert_eq!(target, json!({"a": {"b": 10, "c": 2}, "d": {"x": 1}, "e": 5}));
    }
}
