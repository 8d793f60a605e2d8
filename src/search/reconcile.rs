/// 읽기 모델 백필 (주기마다 두 단계)
/// 1. 경매 서비스의 GET /auctions?since=... 로 놓친 변경분 동기화
/// 2. needs_backfill 레코드를 GET /auctions/{id} 로 채움 (404는 삭제로 처리)
/// 가져온 경매는 합성 이벤트(생성 + 수정)로 프로젝터에 넣어 같은 규칙으로 반영한다.
// region:    --- Imports
use crate::auction::events::EventEnvelope;
use crate::auction::model::AuctionRecord;
use crate::database::DatabaseManager;
use crate::search::consumer::SearchProjector;
use crate::search::{repository, ProjectionError};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

// endregion: --- Imports

const BACKFILL_BATCH_SIZE: i64 = 100;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("경매 서비스 호출 실패: {0}")]
    Http(#[from] reqwest::Error),

    #[error("반영 실패: {0}")]
    Projection(#[from] ProjectionError),

    #[error("검색 저장소 오류: {0}")]
    Storage(#[from] sqlx::Error),
}

/// 한 번의 백필 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub fetched: usize,
    pub removed: usize,
    pub failed: usize,
}

enum Backfilled {
    Fetched,
    Removed,
}

pub struct Reconciler {
    db_manager: Arc<DatabaseManager>,
    projector: Arc<SearchProjector>,
    client: Client,
    auction_service_url: String,
    interval: Duration,
}

impl Reconciler {
    pub fn new(
        db_manager: Arc<DatabaseManager>,
        projector: Arc<SearchProjector>,
        auction_service_url: &str,
        interval: Duration,
    ) -> Result<Self, ReconcileError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            db_manager,
            projector,
            client,
            auction_service_url: auction_service_url.trim_end_matches('/').to_string(),
            interval: interval.max(MIN_INTERVAL),
        })
    }

    /// 주기적 동기화 + 백필 (첫 주기는 즉시 실행)
    /// 동기화가 실패해도 다음 주기에 같은 시각부터 다시 시도한다.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(self.interval);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                match self.sync_since_last_update().await {
                    Ok(0) => {}
                    Ok(count) => info!("{:<12} --> 변경분 동기화: {}건", "Reconcile", count),
                    Err(e) => warn!("{:<12} --> 변경분 동기화 실패: {}", "Reconcile", e),
                }
                match self.backfill_pending().await {
                    Ok(report) if report != ReconcileReport::default() => info!(
                        "{:<12} --> 백필: 조회 {}건, 삭제 {}건, 실패 {}건",
                        "Reconcile", report.fetched, report.removed, report.failed
                    ),
                    Ok(_) => {}
                    Err(e) => error!("{:<12} --> 백필 오류: {}", "Reconcile", e),
                }
            }
        })
    }

    /// 읽기 모델의 마지막 수정 시각 이후 변경된 경매 동기화
    pub async fn sync_since_last_update(&self) -> Result<usize, ReconcileError> {
        let since = repository::last_updated(&self.db_manager).await?;
        let auctions = self.fetch_auctions(since).await?;
        let count = auctions.len();
        for auction in &auctions {
            self.fold(auction).await?;
        }
        Ok(count)
    }

    /// needs_backfill 레코드 채우기
    pub async fn backfill_pending(&self) -> Result<ReconcileReport, ReconcileError> {
        let ids = repository::backfill_candidates(&self.db_manager, BACKFILL_BATCH_SIZE).await?;
        let mut report = ReconcileReport::default();

        for id in ids {
            match self.backfill_one(id).await {
                Ok(Backfilled::Fetched) => report.fetched += 1,
                Ok(Backfilled::Removed) => report.removed += 1,
                Err(e) => {
                    warn!("{:<12} --> 백필 실패 id={}: {}", "Reconcile", id, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn backfill_one(&self, id: Uuid) -> Result<Backfilled, ReconcileError> {
        match self.fetch_auction(id).await? {
            Some(auction) => {
                self.fold(&auction).await?;
                Ok(Backfilled::Fetched)
            }
            None => {
                self.projector
                    .apply(&EventEnvelope::deleted(id, Utc::now()))
                    .await?;
                Ok(Backfilled::Removed)
            }
        }
    }

    /// 경매 스냅샷을 생성 + 수정 이벤트로 반영
    async fn fold(&self, auction: &AuctionRecord) -> Result<(), ProjectionError> {
        self.projector.apply(&EventEnvelope::created(auction)).await?;
        if auction.version > 1 {
            self.projector.apply(&EventEnvelope::updated(auction)).await?;
        }
        Ok(())
    }

    async fn fetch_auctions(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AuctionRecord>, ReconcileError> {
        let mut request = self
            .client
            .get(format!("{}/auctions", self.auction_service_url));
        if let Some(since) = since {
            request = request.query(&[("since", since.to_rfc3339())]);
        }
        let auctions = request
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<AuctionRecord>>()
            .await?;
        Ok(auctions)
    }

    async fn fetch_auction(&self, id: Uuid) -> Result<Option<AuctionRecord>, ReconcileError> {
        let response = self
            .client
            .get(format!("{}/auctions/{}", self.auction_service_url, id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let auction = response.error_for_status()?.json::<AuctionRecord>().await?;
        Ok(Some(auction))
    }
}
