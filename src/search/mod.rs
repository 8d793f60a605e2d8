/// 검색 서비스 읽기 모델
/// 1. model: 검색 레코드와 상태
/// 2. projector: 이벤트 → 레코드 반영 규칙 (순서/중복에 무관)
/// 3. repository: Postgres 저장소
/// 4. consumer: 채널 메시지 처리 (재시도, 보관)
/// 5. reconcile: 경매 서비스 조회를 통한 백필
use thiserror::Error;
use uuid::Uuid;

pub mod consumer;
pub mod model;
pub mod projector;
pub mod reconcile;
pub mod repository;

pub use consumer::SearchProjector;
pub use model::{AuctionStatus, SearchRecord};
pub use projector::{project, Projection};

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("메시지 해석 실패: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("잘못된 이벤트 (auction={auction_id}): {reason}")]
    Malformed { auction_id: Uuid, reason: String },

    #[error("알 수 없는 상태 값: {0}")]
    InvalidStatus(String),

    #[error("검색 저장소 오류: {0}")]
    Storage(#[from] sqlx::Error),
}

impl ProjectionError {
    /// 다시 시도하면 성공할 수 있는 오류인지
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
