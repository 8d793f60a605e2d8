/// 경매 관련 커맨드 처리 (쓰기 측)
/// 1. 경매 생성
/// 2. 경매 수정 (판매자만)
/// 3. 경매 삭제 (판매자만)
/// 레코드 변경과 이벤트 적재는 항상 같은 트랜잭션에서 커밋된다.
// region:    --- Imports
use crate::auction::events::EventEnvelope;
use crate::auction::model::{AuctionRecord, CreateAuction, Identity, UpdateAuction};
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use crate::outbox;
use crate::query::queries;
use chrono::{SubsecRound, Utc};
use sqlx::{Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Commands

/// 1. 경매 생성
pub async fn create_auction(
    db_manager: &DatabaseManager,
    cmd: CreateAuction,
    identity: &Identity,
) -> Result<AuctionRecord, AuctionError> {
    info!(
        "{:<12} --> 경매 생성 요청: seller={}",
        "Command",
        identity.name()
    );
    let now = Utc::now();
    cmd.validate(now)?;

    let record = cmd.into_record(identity, now);
    let envelope = EventEnvelope::created(&record);
    let saved = record.clone();

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query(queries::INSERT_AUCTION)
                    .bind(record.id)
                    .bind(&record.seller)
                    .bind(&record.make)
                    .bind(&record.model)
                    .bind(record.year)
                    .bind(&record.color)
                    .bind(record.mileage)
                    .bind(&record.image_url)
                    .bind(record.reserve_price)
                    .bind(record.auction_end)
                    .bind(record.version)
                    .bind(record.created_at)
                    .bind(record.updated_at)
                    .execute(&mut **tx)
                    .await?;
                outbox::enqueue(tx, &envelope).await?;
                Ok::<_, AuctionError>(())
            })
        })
        .await?;

    info!("{:<12} --> 경매 생성 완료: id={}", "Command", saved.id);
    Ok(saved)
}

/// 2. 경매 수정
/// 지정된 필드만 바꾸며, 바뀐 값이 없으면 이벤트도 남기지 않는다.
pub async fn update_auction(
    db_manager: &DatabaseManager,
    id: Uuid,
    patch: UpdateAuction,
    identity: &Identity,
) -> Result<AuctionRecord, AuctionError> {
    info!(
        "{:<12} --> 경매 수정 요청: id={}, actor={}",
        "Command",
        id,
        identity.name()
    );
    let now = Utc::now().trunc_subsecs(6);
    patch.validate(now)?;
    let identity = identity.clone();

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let mut record = lock_owned(tx, id, &identity).await?;
                if !patch.apply_to(&mut record) {
                    info!("{:<12} --> 변경 사항 없음: id={}", "Command", id);
                    return Ok(record);
                }

                let updated = sqlx::query_as::<_, AuctionRecord>(queries::UPDATE_AUCTION)
                    .bind(id)
                    .bind(&record.make)
                    .bind(&record.model)
                    .bind(record.year)
                    .bind(&record.color)
                    .bind(record.mileage)
                    .bind(now)
                    .fetch_one(&mut **tx)
                    .await?;
                outbox::enqueue(tx, &EventEnvelope::updated(&updated)).await?;

                info!(
                    "{:<12} --> 경매 수정 완료: id={}, version={}",
                    "Command", id, updated.version
                );
                Ok::<_, AuctionError>(updated)
            })
        })
        .await
}

/// 3. 경매 삭제
pub async fn delete_auction(
    db_manager: &DatabaseManager,
    id: Uuid,
    identity: &Identity,
) -> Result<(), AuctionError> {
    info!(
        "{:<12} --> 경매 삭제 요청: id={}, actor={}",
        "Command",
        id,
        identity.name()
    );
    let identity = identity.clone();

    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                lock_owned(tx, id, &identity).await?;
                sqlx::query(queries::DELETE_AUCTION)
                    .bind(id)
                    .execute(&mut **tx)
                    .await?;
                outbox::enqueue(tx, &EventEnvelope::deleted(id, Utc::now())).await?;
                Ok::<_, AuctionError>(())
            })
        })
        .await?;

    info!("{:<12} --> 경매 삭제 완료: id={}", "Command", id);
    Ok(())
}

/// 행 잠금 후 존재 여부와 소유자 확인
async fn lock_owned(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    identity: &Identity,
) -> Result<AuctionRecord, AuctionError> {
    let record = sqlx::query_as::<_, AuctionRecord>(queries::GET_AUCTION_FOR_UPDATE)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AuctionError::NotFound(id))?;
    record.ensure_owner(identity)?;
    Ok(record)
}

// endregion: --- Commands
