/// 트랜잭셔널 아웃박스
/// 1. 적재: 경매 변경과 같은 트랜잭션에서 outbox_events에 기록
/// 2. 발행: 별도 태스크가 주기적으로 미발행 이벤트를 채널로 전달
/// 전달에 실패한 이벤트는 지수 백오프로 재시도하며 삭제하지 않는다.
// region:    --- Imports
use crate::auction::events::EventEnvelope;
use crate::database::DatabaseManager;
use crate::query::queries;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, Transaction};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// endregion: --- Imports

// 재시도 간격 (최초, 상한)
const BASE_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

// 발행 완료 이벤트 보관 기간
const PUBLISHED_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

// region:    --- Delivery
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("채널을 사용할 수 없습니다: {0}")]
    Unavailable(String),

    #[error("발행 시간 초과: {0:?}")]
    Timeout(Duration),

    #[error("이벤트 직렬화 실패: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 이벤트 채널 발행자
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope) -> Result<(), DeliveryError>;
}

/// n번째 실패 후 다음 시도까지 대기 시간
pub fn retry_delay(attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
    BASE_RETRY_DELAY
        .saturating_mul(2u32.saturating_pow(exponent))
        .min(MAX_RETRY_DELAY)
}
// endregion: --- Delivery

// region:    --- Enqueue
/// 호출자의 트랜잭션 안에서 이벤트 적재
pub async fn enqueue(
    tx: &mut Transaction<'_, Postgres>,
    envelope: &EventEnvelope,
) -> Result<(), sqlx::Error> {
    sqlx::query(queries::INSERT_OUTBOX_EVENT)
        .bind(envelope.event_id)
        .bind(envelope.auction_id)
        .bind(envelope.event_type())
        .bind(Json(envelope))
        .bind(envelope.occurred_at)
        .execute(&mut **tx)
        .await?;
    debug!(
        "{:<12} --> 적재: {} auction={}",
        "Outbox",
        envelope.event_type(),
        envelope.auction_id
    );
    Ok(())
}

/// 미발행 이벤트 수
pub async fn pending_count(db_manager: &DatabaseManager) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(queries::COUNT_PENDING_OUTBOX_EVENTS)
        .fetch_one(db_manager.pool())
        .await
}
// endregion: --- Enqueue

// region:    --- Outbox Publisher
#[derive(Debug, FromRow)]
struct OutboxRow {
    id: i64,
    event_id: Uuid,
    auction_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    attempts: i32,
}

/// 한 번의 발행 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub published: usize,
    pub failed: usize,
}

pub struct OutboxPublisher<P: EventPublisher + 'static> {
    db_manager: Arc<DatabaseManager>,
    publisher: Arc<P>,
    batch_size: i64,
    poll_interval: Duration,
    publish_timeout: Duration,
}

impl<P: EventPublisher + 'static> OutboxPublisher<P> {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        publisher: Arc<P>,
        batch_size: i64,
        poll_interval: Duration,
    ) -> Self {
        Self {
            db_manager,
            publisher,
            batch_size,
            // tokio interval은 0을 허용하지 않는다
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            publish_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_publish_timeout(mut self, publish_timeout: Duration) -> Self {
        self.publish_timeout = publish_timeout;
        self
    }

    /// 발행 루프 시작
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut drain_tick = interval(self.poll_interval);
            drain_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut purge_tick = interval(PURGE_INTERVAL);
            purge_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!("{:<12} --> 아웃박스 발행 시작", "Outbox");
            loop {
                tokio::select! {
                    _ = drain_tick.tick() => {
                        match self.drain_once().await {
                            Ok(report) if report.published > 0 || report.failed > 0 => {
                                info!(
                                    "{:<12} --> 발행 {}건, 실패 {}건",
                                    "Outbox", report.published, report.failed
                                );
                            }
                            Ok(_) => {}
                            Err(e) => error!("{:<12} --> 아웃박스 조회 오류: {:?}", "Outbox", e),
                        }
                    }
                    _ = purge_tick.tick() => {
                        if let Err(e) = self.purge_published().await {
                            error!("{:<12} --> 발행 완료 이벤트 정리 오류: {:?}", "Outbox", e);
                        }
                    }
                }
            }
        })
    }

    /// 미발행 이벤트를 한 배치 발행
    /// 채널 오류가 나면 배치를 중단한다 (나머지는 다음 주기에).
    pub async fn drain_once(&self) -> Result<DrainReport, sqlx::Error> {
        let publisher = Arc::clone(&self.publisher);
        let batch_size = self.batch_size;
        let publish_timeout = self.publish_timeout;

        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    let rows = sqlx::query_as::<_, OutboxRow>(queries::GET_PENDING_OUTBOX_EVENTS)
                        .bind(batch_size)
                        .fetch_all(&mut **tx)
                        .await?;

                    let mut report = DrainReport::default();
                    for row in rows {
                        let attempts = row.attempts + 1;
                        let envelope = match serde_json::from_value::<EventEnvelope>(row.payload) {
                            Ok(envelope) => envelope,
                            Err(e) => {
                                warn!(
                                    "{:<12} --> 페이로드 해석 실패 id={} event_id={}: {}",
                                    "Outbox", row.id, row.event_id, e
                                );
                                mark_failed(tx, row.id, attempts, &e.to_string()).await?;
                                report.failed += 1;
                                continue;
                            }
                        };

                        let result = match timeout(publish_timeout, publisher.publish(&envelope)).await
                        {
                            Ok(result) => result,
                            Err(_) => Err(DeliveryError::Timeout(publish_timeout)),
                        };

                        match result {
                            Ok(()) => {
                                sqlx::query(queries::MARK_OUTBOX_PUBLISHED)
                                    .bind(row.id)
                                    .execute(&mut **tx)
                                    .await?;
                                debug!(
                                    "{:<12} --> 발행 완료: {} auction={}",
                                    "Outbox", row.event_type, row.auction_id
                                );
                                report.published += 1;
                            }
                            Err(e) => {
                                warn!(
                                    "{:<12} --> 발행 실패 (시도 {}회, {:?} 후 재시도): {}",
                                    "Outbox",
                                    attempts,
                                    retry_delay(attempts),
                                    e
                                );
                                mark_failed(tx, row.id, attempts, &e.to_string()).await?;
                                report.failed += 1;
                                break;
                            }
                        }
                    }
                    Ok::<_, sqlx::Error>(report)
                })
            })
            .await
    }

    /// 보관 기간이 지난 발행 완료 이벤트 삭제
    pub async fn purge_published(&self) -> Result<u64, sqlx::Error> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(PUBLISHED_RETENTION).unwrap_or(chrono::Duration::days(1));
        let result = sqlx::query(queries::PURGE_PUBLISHED_OUTBOX_EVENTS)
            .bind(cutoff)
            .execute(self.db_manager.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

async fn mark_failed(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    attempts: i32,
    reason: &str,
) -> Result<(), sqlx::Error> {
    let delay = chrono::Duration::from_std(retry_delay(attempts))
        .unwrap_or_else(|_| chrono::Duration::seconds(60));
    sqlx::query(queries::MARK_OUTBOX_FAILED)
        .bind(id)
        .bind(attempts)
        .bind(reason)
        .bind(Utc::now() + delay)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
// endregion: --- Outbox Publisher

// endregion: --- Tests
