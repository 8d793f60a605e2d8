// region:    --- Imports
use super::queries;
use crate::auction::model::AuctionRecord;
use crate::database::DatabaseManager;
use chrono::{DateTime, Utc};
use sqlx::Error as SqlxError;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Query Handlers

/// 경매 목록 조회 (since 이후 수정분, 없으면 전체)
pub async fn get_auctions(
    db_manager: &DatabaseManager,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<AuctionRecord>, SqlxError> {
    info!("{:<12} --> 경매 목록 조회 since: {:?}", "Query", since);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionRecord>(queries::GET_AUCTIONS_SINCE)
                    .bind(since)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    id: Uuid,
) -> Result<Option<AuctionRecord>, SqlxError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionRecord>(queries::GET_AUCTION)
                    .bind(id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
