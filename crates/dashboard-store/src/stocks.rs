use chrono::Utc;
use sqlx::SqliteConnection;

use crate::error::{StoreError, StoreResult};
use crate::models::Stock;

pub const DEFAULT_EXCHANGE: &str = "NSE";

/// Trimmed upper-case symbol; empty input is a validation error
pub fn normalize_symbol(symbol: &str) -> StoreResult<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(StoreError::Validation("stock_symbol must not be empty".to_string()));
    }
    Ok(symbol)
}

/// Return the id for `symbol`, inserting a row on first reference.
///
/// `symbol` must already be normalised. Runs on the caller's connection so it
/// can share a transaction with the insert that needs the id.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    symbol: &str,
    name: Option<&str>,
) -> StoreResult<i64> {
    let now = Utc::now();
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(symbol);

    sqlx::query(
        r#"
        INSERT INTO stocks (symbol, name, exchange, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(symbol) DO NOTHING
        "#,
    )
    .bind(symbol)
    .bind(name)
    .bind(DEFAULT_EXCHANGE)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT id FROM stocks WHERE symbol = ?")
        .bind(symbol)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

pub async fn get_by_symbol(conn: &mut SqliteConnection, symbol: &str) -> StoreResult<Option<Stock>> {
    let stock = sqlx::query_as::<_, Stock>("SELECT * FROM stocks WHERE symbol = ?")
        .bind(symbol)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(stock)
}
