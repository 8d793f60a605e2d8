// region:    --- Imports
use auction_marketplace::config::Config;
use auction_marketplace::database::DatabaseManager;
use auction_marketplace::handlers;
use auction_marketplace::message_broker::KafkaManager;
use auction_marketplace::outbox::OutboxPublisher;
use auction_marketplace::search::reconcile::Reconciler;
use auction_marketplace::search::SearchProjector;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드
    let config = Config::from_env().inspect_err(|e| {
        error!("{:<12} --> 설정 로드 실패: {}", "Main", e);
    })?;

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new(&config).await.inspect_err(|e| {
        error!("{:<12} --> 데이터베이스 연결 실패: {:?}", "Main", e);
    })?);

    // 스키마 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성
    let kafka_manager = KafkaManager::new(
        &config.kafka_brokers,
        &config.events_topic,
        &config.consumer_group,
    )?;

    // 토픽 생성 (브로커 장애여도 쓰기 경로는 아웃박스로 계속 동작)
    if let Err(e) = kafka_manager.create_topic(&config.events_topic, 5, 1).await {
        warn!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Main", e);
    }

    // 아웃박스 발행
    OutboxPublisher::new(
        Arc::clone(&db_manager),
        kafka_manager.get_producer(),
        config.outbox_batch_size,
        config.outbox_poll_interval,
    )
    .start();

    // 검색 읽기 모델 반영
    let projector = Arc::new(SearchProjector::new(Arc::clone(&db_manager)));
    Arc::clone(&projector).start(kafka_manager.get_consumer(), config.events_topic.clone());

    // cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = handlers::routes(Arc::clone(&db_manager))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024));

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 백필 (자기 자신의 HTTP 서버를 조회할 수 있으므로 바인딩 이후 시작)
    Reconciler::new(
        Arc::clone(&db_manager),
        Arc::clone(&projector),
        &config.auction_service_url,
        config.reconcile_interval,
    )?
    .start();

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
