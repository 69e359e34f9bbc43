// region:    --- Imports
use crate::bidding::commands::BidPolicy;
use crate::catalog::HttpCatalogClient;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::database::DatabaseManager;
use crate::handlers::AppState;
use crate::identity::HttpIdentityClient;
use crate::lifecycle::AuctionScheduler;
use crate::notifier::{EventPublisher, KafkaPublisher, UPDATES_TOPIC};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod auction;
mod bidding;
mod catalog;
mod clock;
mod config;
mod database;
mod error;
mod handlers;
mod identity;
mod lifecycle;
mod notifier;
mod store;

// endregion: --- Modules

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
    let config = Config::from_env();

    // DatabaseManager 생성
    let db_manager = match DatabaseManager::new(&config.database_url).await {
        Ok(db_manager) => Arc::new(db_manager),
        Err(e) => {
            error!("{:<12} --> 데이터베이스 연결 실패: {:?}", "Main", e);
            return Err(e.into());
        }
    };

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 이벤트 발행자 생성 및 업데이트 토픽 생성
    let publisher = Arc::new(KafkaPublisher::new(&config.kafka_brokers));
    publisher.create_topic(UPDATES_TOPIC, 5, 1).await?;
    info!("{:<12} --> 이벤트 발행자 초기화 성공", "Main");

    // 경매 수명 주기 스케줄러 시작
    let scheduler = AuctionScheduler::new(
        db_manager.get_pool(),
        Arc::clone(&publisher) as Arc<dyn EventPublisher>,
    );
    scheduler.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 핸들러 공유 상태
    let state = AppState {
        db_manager,
        publisher,
        identity: Arc::new(HttpIdentityClient::new(&config.identity_service_url)),
        catalog: Arc::new(HttpCatalogClient::new(&config.catalog_service_url)),
        clock: Arc::new(SystemClock),
        policy: BidPolicy::new(config.min_increment, config.max_bid_retries),
    };

    // 라우터 설정
    let routes_all = Router::new()
        .route("/auctions", post(handlers::handle_create_auction))
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route(
            "/auctions/:id/bids",
            post(handlers::handle_bid).get(handlers::handle_get_bid_history),
        )
        .route("/auctions/:id/settle", post(handlers::handle_settle))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20)) // 동시성을 위한 바디 사이즈 10배 증가(20MB)
        .with_state(state);

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
