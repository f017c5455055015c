use chrono::{DateTime, Utc};

use crate::db::DashboardDb;
use crate::error::{StoreError, StoreResult};
use crate::models::CustomList;
use crate::users::ensure_user;

#[derive(sqlx::FromRow)]
struct CustomListRow {
    id: i64,
    user_id: i64,
    name: String,
    stocks: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomListRow {
    fn into_list(self) -> StoreResult<CustomList> {
        Ok(CustomList {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            stocks: serde_json::from_str(&self.stocks)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn validate_name(name: &str) -> StoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation("name must not be empty".to_string()));
    }
    Ok(name)
}

/// Named watchlists. Symbol order is kept as given.
#[derive(Clone)]
pub struct CustomListManager {
    db: DashboardDb,
}

impl CustomListManager {
    pub fn new(db: DashboardDb) -> Self {
        Self { db }
    }

    pub async fn create_list(&self, user_id: i64, name: &str, stocks: &[String]) -> StoreResult<i64> {
        let name = validate_name(name)?;
        let stocks = serde_json::to_string(stocks)?;
        let now = Utc::now();

        let mut tx = self.db.pool().begin().await?;
        ensure_user(&mut tx, user_id).await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO custom_lists (user_id, name, stocks, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(&stocks)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    pub async fn list_lists(&self, user_id: i64) -> StoreResult<Vec<CustomList>> {
        let rows = sqlx::query_as::<_, CustomListRow>(
            "SELECT * FROM custom_lists WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(CustomListRow::into_list).collect()
    }

    pub async fn get_list(&self, user_id: i64, id: i64) -> StoreResult<CustomList> {
        sqlx::query_as::<_, CustomListRow>("SELECT * FROM custom_lists WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| StoreError::not_found("Custom list", id))?
            .into_list()
    }

    /// Change only the supplied fields
    pub async fn update_list(
        &self,
        user_id: i64,
        id: i64,
        name: Option<&str>,
        stocks: Option<&[String]>,
    ) -> StoreResult<()> {
        let name = name.map(validate_name).transpose()?;
        let stocks = stocks.map(serde_json::to_string).transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE custom_lists SET
                name = COALESCE(?, name),
                stocks = COALESCE(?, stocks),
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(name)
        .bind(stocks)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Custom list", id));
        }
        Ok(())
    }

    pub async fn delete_list(&self, user_id: i64, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM custom_lists WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Custom list", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn manager() -> CustomListManager {
        CustomListManager::new(DashboardDb::in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_round_trip_keeps_order() {
        let lists = manager().await;
        let stocks = symbols(&["WIPRO", "TCS", "INFY"]);
        let id = lists.create_list(3, "IT", &stocks).await.unwrap();

        let list = lists.get_list(3, id).await.unwrap();
        assert_eq!(list.name, "IT");
        assert_eq!(list.stocks, stocks);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_stocks() {
        let lists = manager().await;
        let id = lists.create_list(1, "Banks", &symbols(&["SBIN", "PNB"])).await.unwrap();

        lists.update_list(1, id, Some("PSU Banks"), None).await.unwrap();
        let list = lists.get_list(1, id).await.unwrap();
        assert_eq!(list.name, "PSU Banks");
        assert_eq!(list.stocks, symbols(&["SBIN", "PNB"]));

        lists.update_list(1, id, None, Some(&symbols(&[]))).await.unwrap();
        let list = lists.get_list(1, id).await.unwrap();
        assert_eq!(list.name, "PSU Banks");
        assert!(list.stocks.is_empty());
    }

    #[tokio::test]
    async fn test_lists_are_user_scoped() {
        let lists = manager().await;
        let id = lists.create_list(1, "Mine", &symbols(&["TCS"])).await.unwrap();

        assert!(lists.list_lists(2).await.unwrap().is_empty());
        assert!(matches!(
            lists.update_list(2, id, Some("Stolen"), None).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(lists.delete_list(2, id).await, Err(StoreError::NotFound { .. })));
        assert_eq!(lists.list_lists(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let lists = manager().await;
        let err = lists.create_list(1, "   ", &symbols(&["TCS"])).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let lists = manager().await;
        let id = lists.create_list(1, "Temp", &symbols(&[])).await.unwrap();
        lists.delete_list(1, id).await.unwrap();
        assert!(matches!(lists.get_list(1, id).await, Err(StoreError::NotFound { .. })));
    }
}
