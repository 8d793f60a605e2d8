// region:    --- Imports
use crate::database::DatabaseManager;
use crate::query::queries;
use crate::search::model::{AuctionStatus, SearchRecord, SearchRow};
use crate::search::ProjectionError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

// endregion: --- Imports

const DEFAULT_SEARCH_LIMIT: i64 = 50;
const MAX_SEARCH_LIMIT: i64 = 500;

/// 검색 조건
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchFilter {
    pub status: Option<AuctionStatus>,
    pub seller: Option<String>,
    pub winner: Option<String>,
    pub limit: Option<i64>,
}

impl SearchFilter {
    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT)
    }
}

/// 경매 id → advisory lock 키
pub fn lock_key(auction_id: Uuid) -> i64 {
    auction_id.as_u64_pair().0 as i64
}

// region:    --- Transactional

/// 같은 경매에 대한 반영을 직렬화 (트랜잭션 종료 시 해제)
pub async fn lock_auction(
    tx: &mut Transaction<'_, Postgres>,
    auction_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(queries::LOCK_AUCTION_KEY)
        .bind(lock_key(auction_id))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn load(
    tx: &mut Transaction<'_, Postgres>,
    auction_id: Uuid,
) -> Result<Option<SearchRecord>, ProjectionError> {
    let row = sqlx::query_as::<_, SearchRow>(queries::GET_SEARCH_ITEM)
        .bind(auction_id)
        .fetch_optional(&mut **tx)
        .await?;
    row.map(SearchRecord::try_from).transpose()
}

pub async fn save(
    tx: &mut Transaction<'_, Postgres>,
    record: &SearchRecord,
) -> Result<(), sqlx::Error> {
    let item = record.item.as_ref();
    sqlx::query(queries::UPSERT_SEARCH_ITEM)
        .bind(record.id)
        .bind(&record.seller)
        .bind(item.map(|i| i.make.as_str()))
        .bind(item.map(|i| i.model.as_str()))
        .bind(item.map(|i| i.year))
        .bind(item.map(|i| i.color.as_str()))
        .bind(item.map(|i| i.mileage))
        .bind(item.and_then(|i| i.image_url.as_deref()))
        .bind(record.reserve_price)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(record.auction_end)
        .bind(record.version)
        .bind(record.current_high_bid)
        .bind(record.status.as_str())
        .bind(&record.winner)
        .bind(record.sold_amount)
        .bind(record.needs_backfill)
        .bind(record.deleted_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

// endregion: --- Transactional

// region:    --- Queries

/// 검색 레코드 조회 (삭제된 레코드는 None)
pub async fn get_item(
    db_manager: &DatabaseManager,
    auction_id: Uuid,
) -> Result<Option<SearchRecord>, ProjectionError> {
    let row = sqlx::query_as::<_, SearchRow>(queries::GET_SEARCH_ITEM)
        .bind(auction_id)
        .fetch_optional(db_manager.pool())
        .await?;
    let record = row.map(SearchRecord::try_from).transpose()?;
    Ok(record.filter(|r| !r.is_deleted()))
}

pub async fn search(
    db_manager: &DatabaseManager,
    filter: &SearchFilter,
) -> Result<Vec<SearchRecord>, ProjectionError> {
    let rows = sqlx::query_as::<_, SearchRow>(queries::SEARCH_ITEMS)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(&filter.seller)
        .bind(&filter.winner)
        .bind(filter.limit())
        .fetch_all(db_manager.pool())
        .await?;
    rows.into_iter().map(SearchRecord::try_from).collect()
}

/// 백필이 필요한 레코드 id
pub async fn backfill_candidates(
    db_manager: &DatabaseManager,
    limit: i64,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar(queries::GET_BACKFILL_CANDIDATES)
        .bind(limit)
        .fetch_all(db_manager.pool())
        .await
}

/// 읽기 모델이 알고 있는 가장 최근 수정 시각
pub async fn last_updated(
    db_manager: &DatabaseManager,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar(queries::GET_LAST_UPDATED)
        .fetch_one(db_manager.pool())
        .await
}

/// 처리할 수 없는 메시지 보관
pub async fn park(
    db_manager: &DatabaseManager,
    event_id: Option<Uuid>,
    auction_id: Option<Uuid>,
    payload: &str,
    reason: &str,
) -> Result<(), sqlx::Error> {
    warn!(
        "{:<12} --> 메시지 보관: event_id={:?}, auction_id={:?}, 사유={}",
        "Projector", event_id, auction_id, reason
    );
    sqlx::query(queries::INSERT_PARKED_EVENT)
        .bind(event_id)
        .bind(auction_id)
        .bind(payload)
        .bind(reason)
        .execute(db_manager.pool())
        .await?;
    Ok(())
}

// endregion: --- Queries

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_key_is_stable_per_auction() {
        let id = Uuid::new_v4();
        assert_eq!(lock_key(id), lock_key(id));
        assert_eq!(lock_key(Uuid::nil()), 0);
    }

    #[test]
    fn search_limit_is_clamped() {
        assert_eq!(SearchFilter::default().limit(), DEFAULT_SEARCH_LIMIT);
        let huge = SearchFilter {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(huge.limit(), MAX_SEARCH_LIMIT);
        let zero = SearchFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.limit(), 1);
    }
}
