/// 쓰기 경로 에러 분류
/// 호출자에게 노출되는 것은 검증/미존재/권한/저장 실패뿐이다.
/// 전달 실패와 투영 실패는 각각 outbox, search 모듈에서 내부적으로 처리한다.
// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Auction Error
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("잘못된 요청입니다: {0}")]
    Validation(String),

    #[error("경매를 찾을 수 없습니다: {0}")]
    NotFound(Uuid),

    #[error("판매자만 경매를 수정하거나 삭제할 수 있습니다.")]
    Forbidden,

    #[error("데이터베이스 저장 실패: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl AuctionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Persistence(_) => "PERSISTENCE",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            // 저장 실패는 400 (DB에 반영되지 않음)
            Self::Persistence(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Persistence(_)) {
            error!("{:<12} --> 저장 실패: {:?}", "Error", self);
        }
        (
            self.status_code(),
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
// endregion: --- Auction Error

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuctionError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuctionError::NotFound(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AuctionError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuctionError::Persistence(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
// endregion: --- Tests
