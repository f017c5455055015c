use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::StatusCode};

use crate::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken from the `X-User-Id` header.
///
/// User-scoped routes take this as an argument; a missing or malformed header
/// is rejected with 401 before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| unauthorized("Missing X-User-Id header"))?;

        raw.to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(CallerId)
            .ok_or_else(|| unauthorized("X-User-Id must be a positive integer"))
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::with_status(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CallerId, AppError> {
        let mut builder = Request::builder().uri("/api/alerts");
        if let Some(value) = header {
            builder = builder.header("X-User-Id", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CallerId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header() {
        assert_eq!(extract(Some("42")).await.unwrap(), CallerId(42));
        assert_eq!(extract(Some(" 7 ")).await.unwrap(), CallerId(7));
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_header_is_unauthorized() {
        for value in ["abc", "0", "-3", ""] {
            let err = extract(Some(value)).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "accepted {:?}", value);
        }
    }
}
