/// 경매 수명 주기 스케줄러
/// 시간 경과에 따라 SCHEDULED -> OPEN, OPEN -> CLOSED 전이를 수행한다.
/// 이 스케줄러는 status 컬럼만 쓴다. 가격/입찰자/입찰 수는 저장소의
/// 입찰 반영 트랜잭션만 쓰므로 두 컴포넌트 사이에 쓰기 충돌이 없다.
/// 마감 판정 자체는 입찰 트랜잭션의 시간 검증이 맡으므로,
/// 스케줄러가 지연되어도 마감 후 입찰이 끼어들 수 없다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::Auction;
use crate::notifier::EventPublisher;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Auction Scheduler

/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler {
    pool: Arc<PgPool>,
    publisher: Arc<dyn EventPublisher>,
}

impl AuctionScheduler {
    pub fn new(pool: Arc<PgPool>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { pool, publisher }
    }

    /// 경매 상태 업데이트 스케줄러 시작
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        let publisher = Arc::clone(&self.publisher);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1)); // 1초마다 실행
            loop {
                interval.tick().await;
                if let Err(e) = Self::sweep(&pool, publisher.as_ref()).await {
                    error!(
                        "{:<12} --> 경매 상태 업데이트 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        });
    }

    /// 상태 전이 1회 수행
    pub async fn sweep(
        pool: &PgPool,
        publisher: &dyn EventPublisher,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now();

        // SCHEDULED -> OPEN 상태 변경
        sqlx::query(
            "UPDATE auctions SET status = 'OPEN'
             WHERE status = 'SCHEDULED' AND start_time <= $1",
        )
        .bind(now)
        .execute(pool)
        .await?;

        // OPEN -> CLOSED 상태 변경. 닫힌 경매마다 종료 이벤트를 발행한다.
        let closed = sqlx::query_as::<_, Auction>(
            "UPDATE auctions SET status = 'CLOSED', version = version + 1
             WHERE status = 'OPEN' AND end_time <= $1
             RETURNING id, product_id, start_price, current_price, reserve_price, start_time, end_time, bid_count, highest_bidder_id, status, settlement, version, created_at",
        )
        .bind(now)
        .fetch_all(pool)
        .await?;

        for auction in &closed {
            info!(
                "{:<12} --> 경매 종료 id: {}, 최종 가격: {}",
                "Scheduler", auction.id, auction.current_price
            );
            let event = AuctionEvent::AuctionClosed {
                auction_id: auction.id,
                current_price: auction.current_price,
                bid_count: auction.bid_count,
                highest_bidder_id: auction.highest_bidder_id.clone(),
                timestamp: now,
            };
            if let Err(e) = publisher.publish(&event).await {
                error!(
                    "{:<12} --> 종료 이벤트 발행 실패 id: {}: {}",
                    "Scheduler", auction.id, e
                );
            }
        }

        debug!(
            "{:<12} --> 경매 상태가 성공적으로 업데이트되었습니다.",
            "Scheduler"
        );

        Ok(())
    }
}

// endregion: --- Auction Scheduler
