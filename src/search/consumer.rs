/// 검색 읽기 모델 프로젝터
/// 메시지 하나를 받아 반영하거나, 해석할 수 없는 메시지는 parked_events에 보관한다.
/// 저장소 오류는 보관하지 않고 복구될 때까지 재시도한다 (그동안 오프셋은 커밋되지 않음).
/// 어떤 경우에도 메시지를 조용히 버리지 않는다.
// region:    --- Imports
use crate::auction::events::EventEnvelope;
use crate::database::DatabaseManager;
use crate::message_broker::{KafkaConsumer, ReceivedMessage};
use crate::outbox::retry_delay;
use crate::search::projector::{project, Projection};
use crate::search::{repository, ProjectionError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// 이 횟수를 넘기면 재시도 로그를 error로 올린다
const ESCALATE_AFTER_ATTEMPTS: i32 = 5;

/// 반영 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Unchanged,
}

/// 메시지 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    Applied,
    Unchanged,
    Parked,
}

pub struct SearchProjector {
    db_manager: Arc<DatabaseManager>,
}

impl SearchProjector {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }

    /// 소비 시작
    pub fn start(self: Arc<Self>, consumer: Arc<KafkaConsumer>, topic: String) -> JoinHandle<()> {
        tokio::spawn(async move {
            let projector = Arc::clone(&self);
            if let Err(e) = consumer
                .consume_events(&topic, move |message| {
                    let projector = Arc::clone(&projector);
                    async move {
                        projector.handle_message(message).await;
                    }
                })
                .await
            {
                error!("{:<12} --> 이벤트 소비 오류: {:?}", "Projector", e);
            }
        })
    }

    /// 이벤트 한 건 반영 (경매 단위 잠금 안에서 읽기-반영-저장)
    pub async fn apply(&self, envelope: &EventEnvelope) -> Result<ApplyOutcome, ProjectionError> {
        let envelope = envelope.clone();
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    repository::lock_auction(tx, envelope.auction_id).await?;
                    let current = repository::load(tx, envelope.auction_id).await?;
                    let outcome = match project(current, &envelope)? {
                        Projection::Save(record) => {
                            repository::save(tx, &record).await?;
                            ApplyOutcome::Applied
                        }
                        Projection::Unchanged => ApplyOutcome::Unchanged,
                    };
                    Ok::<_, ProjectionError>(outcome)
                })
            })
            .await
    }

    /// 수신 메시지 처리
    /// 반영되거나 보관될 때까지 반환하지 않는다.
    pub async fn handle_message(&self, message: ReceivedMessage) -> HandleOutcome {
        let raw = String::from_utf8_lossy(&message.payload).into_owned();

        let envelope = match serde_json::from_slice::<EventEnvelope>(&message.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                let auction_id = message.key.as_deref().and_then(|k| k.parse().ok());
                self.park(None, auction_id, &raw, &ProjectionError::Decode(e))
                    .await;
                return HandleOutcome::Parked;
            }
        };

        info!(
            "{:<12} --> {} 처리: auction={}, partition={}, offset={}",
            "Projector",
            envelope.event_type(),
            envelope.auction_id,
            message.partition,
            message.offset
        );

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.apply(&envelope).await {
                Ok(ApplyOutcome::Applied) => {
                    debug!("{:<12} --> 반영 완료: {}", "Projector", envelope.event_id);
                    return HandleOutcome::Applied;
                }
                Ok(ApplyOutcome::Unchanged) => {
                    debug!(
                        "{:<12} --> 변경 없음 (중복 또는 지난 이벤트): {}",
                        "Projector", envelope.event_id
                    );
                    return HandleOutcome::Unchanged;
                }
                Err(e) if e.is_retryable() => {
                    let delay = retry_delay(attempts);
                    if attempts > ESCALATE_AFTER_ATTEMPTS {
                        error!(
                            "{:<12} --> 저장소 장애 지속 (시도 {}), {:?} 후 재시도: {}",
                            "Projector", attempts, delay, e
                        );
                    } else {
                        warn!(
                            "{:<12} --> 반영 실패 (시도 {}), {:?} 후 재시도: {}",
                            "Projector", attempts, delay, e
                        );
                    }
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    self.park(Some(envelope.event_id), Some(envelope.auction_id), &raw, &e)
                        .await;
                    return HandleOutcome::Parked;
                }
            }
        }
    }

    /// 보관 (보관 자체가 실패하면 성공할 때까지 재시도)
    async fn park(
        &self,
        event_id: Option<uuid::Uuid>,
        auction_id: Option<uuid::Uuid>,
        raw: &str,
        reason: &ProjectionError,
    ) {
        let reason = reason.to_string();
        let mut attempts = 0;
        while let Err(e) =
            repository::park(&self.db_manager, event_id, auction_id, raw, &reason).await
        {
            attempts += 1;
            let delay = retry_delay(attempts);
            error!(
                "{:<12} --> 메시지 보관 실패 (시도 {}), {:?} 후 재시도: {:?}",
                "Projector", attempts, delay, e
            );
            tokio::time::sleep(delay).await;
        }
    }
}
