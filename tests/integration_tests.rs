use async_trait::async_trait;
use chrono::{Duration, Utc};
use farm_auction_service::auction::events::AuctionEvent;
use farm_auction_service::auction::model::{settlement, status};
use farm_auction_service::bidding::commands::{handle_place_bid, BidPolicy, PlaceBidCommand};
use farm_auction_service::clock::SystemClock;
use farm_auction_service::database::DatabaseManager;
use farm_auction_service::error::AuctionError;
use farm_auction_service::identity::User;
use farm_auction_service::lifecycle::AuctionScheduler;
use farm_auction_service::notifier::EventPublisher;
use farm_auction_service::store::{AuctionStore, NewAuction, PostgresAuctionStore};
use std::sync::{Arc, Mutex};
use tracing::info;

/// 트레이싱 초기화
fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 데이터베이스 매니저 설정. 스키마가 없으면 생성한다(드롭은 하지 않는다).
async fn setup() -> Arc<DatabaseManager> {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db_manager = Arc::new(
        DatabaseManager::new(&database_url)
            .await
            .expect("데이터베이스 연결 실패"),
    );

    let schema_sql = include_str!("../src/sql/01-create-schema.sql");
    for query in schema_sql.split(';') {
        let query = query.trim();
        if !query.is_empty() {
            sqlx::query(query)
                .execute(db_manager.pool())
                .await
                .expect("스키마 생성 실패");
        }
    }

    db_manager
}

/// 발행된 이벤트를 수집하는 테스트용 발행자
struct CollectingPublisher {
    events: Mutex<Vec<AuctionEvent>>,
}

impl CollectingPublisher {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn events(&self) -> Vec<AuctionEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for CollectingPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

fn bidder(n: u32) -> User {
    User {
        id: format!("bidder-{}", n),
        display_name: format!("입찰자 {}", n),
        role: "consumer".to_string(),
    }
}

/// 테스트용 경매 생성
async fn create_test_auction(
    store: &PostgresAuctionStore,
    start_price: i64,
    open_for: Duration,
) -> farm_auction_service::auction::model::Auction {
    let now = Utc::now();
    store
        .create_auction(
            NewAuction {
                product_id: format!("test-product-{}", now.timestamp_nanos_opt().unwrap_or(0)),
                start_price,
                reserve_price: None,
                start_time: now - Duration::minutes(1),
                end_time: now + open_for,
            },
            now,
        )
        .await
        .expect("테스트용 경매 생성 실패")
}

/// 입찰 수락/거절 시나리오 테스트
#[tokio::test]
async fn test_try_apply_bid_scenario() {
    let db_manager = setup().await;
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    let auction = create_test_auction(&store, 15000, Duration::hours(1)).await;
    let now = Utc::now();

    // 현재 가격을 175.00으로 올려 둔다.
    let updated = store
        .try_apply_bid(auction.id, "bidder-0", "입찰자 0", 17500, 1, now)
        .await
        .unwrap();
    assert_eq!(updated.current_price, 17500);

    // 더 낮은 입찰은 거절
    let result = store
        .try_apply_bid(auction.id, "bidder-1", "입찰자 1", 17000, 1, now)
        .await;
    assert!(matches!(result, Err(AuctionError::BidTooLow { .. })));

    // 더 높은 입찰은 수락
    let updated = store
        .try_apply_bid(auction.id, "bidder-1", "입찰자 1", 18000, 1, now)
        .await
        .unwrap();
    assert_eq!(updated.current_price, 18000);
    assert_eq!(updated.bid_count, 2);
    assert_eq!(updated.highest_bidder_id.as_deref(), Some("bidder-1"));

    // 같은 금액의 재입찰은 거절(strict 비교)
    let result = store
        .try_apply_bid(auction.id, "bidder-2", "입찰자 2", 18000, 1, now)
        .await;
    assert!(matches!(result, Err(AuctionError::BidTooLow { .. })));
}

/// 동시성 입찰 테스트
/// 50개의 동시 입찰이 경합해도 최종 가격은 최고 입찰 금액이어야 하고,
/// bid_count는 입찰 로그 수와 정확히 일치해야 한다.
#[tokio::test]
async fn test_concurrent_bidding() {
    init_tracing();

    let db_manager = setup().await;
    let store = Arc::new(PostgresAuctionStore::new(Arc::clone(&db_manager)));
    let publisher = Arc::new(CollectingPublisher::new());
    let auction = create_test_auction(&store, 10000, Duration::hours(1)).await;

    // 경합이 심하므로 재시도 상한을 넉넉하게 준다.
    let policy = BidPolicy::new(1, 100);

    let mut handles = vec![];
    for i in 1..=50i64 {
        let store = Arc::clone(&store);
        let publisher = Arc::clone(&publisher);
        let auction_id = auction.id;
        let handle = tokio::spawn(async move {
            handle_place_bid(
                PlaceBidCommand {
                    auction_id,
                    amount: 10000 + i * 1000,
                },
                &bidder(i as u32),
                &*store,
                &*publisher,
                policy,
                &SystemClock,
            )
            .await
        });
        handles.push(handle);
    }

    let mut successful_bids = 0;
    let mut failed_bids = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successful_bids += 1,
            Err(AuctionError::BidTooLow { .. }) => failed_bids += 1,
            Err(e) => panic!("예상하지 못한 오류: {:?}", e),
        }
    }

    info!(
        "성공한 입찰 수: {}, 실패한 입찰 수: {}",
        successful_bids, failed_bids
    );

    // 최고 금액 입찰은 처리 순서와 무관하게 수락된다.
    let final_auction = store.get_auction(auction.id).await.unwrap();
    assert_eq!(final_auction.current_price, 60000);
    assert_eq!(final_auction.bid_count, successful_bids);

    // bid_count == COUNT(bids) 불변식을 SQL로 직접 검증한다.
    let bid_log_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM bids WHERE auction_id = $1")
            .bind(auction.id)
            .fetch_one(db_manager.pool())
            .await
            .unwrap();
    assert_eq!(final_auction.bid_count, bid_log_count);

    // 수락된 입찰 금액은 커밋 순서대로 강증가한다.
    let amounts: Vec<i64> =
        sqlx::query_scalar("SELECT amount FROM bids WHERE auction_id = $1 ORDER BY id ASC")
            .bind(auction.id)
            .fetch_all(db_manager.pool())
            .await
            .unwrap();
    for pair in amounts.windows(2) {
        assert!(pair[1] > pair[0], "가격 단조 증가 위반: {:?}", pair);
    }

    // 발행된 이벤트 수는 수락된 입찰 수와 같다.
    assert_eq!(publisher.events().len() as i64, successful_bids);
}

/// 경매 수명 주기 테스트(종료 전이, 종료 이벤트, 정산)
#[tokio::test]
async fn test_auction_lifecycle() {
    let db_manager = setup().await;
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    let publisher = CollectingPublisher::new();
    let auction = create_test_auction(&store, 10000, Duration::seconds(2)).await;
    assert_eq!(auction.status, status::OPEN);

    // 종료 전 입찰은 수락된다.
    store
        .try_apply_bid(auction.id, "bidder-1", "입찰자 1", 12000, 1, Utc::now())
        .await
        .unwrap();

    // 경매 종료 대기 후 스윕 실행
    tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;
    AuctionScheduler::sweep(db_manager.pool(), &publisher)
        .await
        .unwrap();

    let closed = store.get_auction(auction.id).await.unwrap();
    assert_eq!(closed.status, status::CLOSED);

    // 종료 이벤트가 발행되었는지 확인
    let closed_event = publisher
        .events()
        .into_iter()
        .find(|e| e.auction_id() == auction.id);
    assert!(matches!(
        closed_event,
        Some(AuctionEvent::AuctionClosed {
            current_price: 12000,
            ..
        })
    ));

    // 종료 후 입찰은 금액과 무관하게 거절된다.
    let result = store
        .try_apply_bid(auction.id, "bidder-2", "입찰자 2", 99999, 1, Utc::now())
        .await;
    assert!(matches!(result, Err(AuctionError::AuctionClosed)));

    // 정산: 예약가가 없고 입찰이 있으므로 낙찰
    let settled = store.settle_auction(auction.id, Utc::now()).await.unwrap();
    assert_eq!(settled.status, status::SETTLED);
    assert_eq!(settled.settlement.as_deref(), Some(settlement::SOLD));

    // 재정산은 거절된다.
    let result = store.settle_auction(auction.id, Utc::now()).await;
    assert!(matches!(result, Err(AuctionError::AlreadySettled)));
}

/// 입찰 이력 페이지네이션 테스트(최신순, 커서 기반)
#[tokio::test]
async fn test_bid_history_pagination() {
    let db_manager = setup().await;
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    let auction = create_test_auction(&store, 10000, Duration::hours(1)).await;

    // 25건의 입찰을 순서대로 쌓는다.
    for i in 1..=25i64 {
        store
            .try_apply_bid(
                auction.id,
                &format!("bidder-{}", i),
                &format!("입찰자 {}", i),
                10000 + i * 100,
                1,
                Utc::now(),
            )
            .await
            .unwrap();
    }

    // 10건씩 세 페이지로 나눠 전체 이력을 순회한다.
    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = store.list_bids(auction.id, cursor, 10).await.unwrap();
        if page.is_empty() {
            break;
        }
        // 각 페이지는 최신순이다.
        for pair in page.windows(2) {
            assert!(pair[0].id > pair[1].id);
        }
        cursor = page.last().map(|b| b.id);
        seen.extend(page);
    }

    assert_eq!(seen.len(), 25);
    // 첫 항목이 가장 최근 입찰이다.
    assert_eq!(seen[0].amount, 12500);
    assert_eq!(seen[24].amount, 10100);
    // 중복 없이 전체를 순회했는지 확인
    let mut ids: Vec<i64> = seen.iter().map(|b| b.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 25);
}

/// 경매 생성 검증 테스트
#[tokio::test]
async fn test_create_auction_validation() {
    let db_manager = setup().await;
    let store = PostgresAuctionStore::new(Arc::clone(&db_manager));
    let now = Utc::now();

    // 종료 시간이 시작 시간보다 빠르면 거절
    let result = store
        .create_auction(
            NewAuction {
                product_id: "test-product".to_string(),
                start_price: 10000,
                reserve_price: None,
                start_time: now + Duration::hours(2),
                end_time: now + Duration::hours(1),
            },
            now,
        )
        .await;
    assert!(matches!(result, Err(AuctionError::InvalidPeriod)));

    // 시작가가 0 이하이면 거절
    let result = store
        .create_auction(
            NewAuction {
                product_id: "test-product".to_string(),
                start_price: 0,
                reserve_price: None,
                start_time: now,
                end_time: now + Duration::hours(1),
            },
            now,
        )
        .await;
    assert!(matches!(result, Err(AuctionError::InvalidAmount)));

    // 시작 시간이 미래이면 SCHEDULED로 생성되고 입찰이 거절된다.
    let scheduled = store
        .create_auction(
            NewAuction {
                product_id: "test-product".to_string(),
                start_price: 10000,
                reserve_price: None,
                start_time: now + Duration::hours(1),
                end_time: now + Duration::hours(2),
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(scheduled.status, status::SCHEDULED);

    let result = store
        .try_apply_bid(scheduled.id, "bidder-1", "입찰자 1", 20000, 1, now)
        .await;
    assert!(matches!(result, Err(AuctionError::NotStarted)));
}
