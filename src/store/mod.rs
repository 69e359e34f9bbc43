/// 경매 저장소
/// 경매의 가격/입찰자/입찰 수와 입찰 로그의 유일한 쓰기 주체.
/// "현재 가격 확인 -> 입찰 수락 -> 가격 갱신"은 반드시 하나의 트랜잭션으로 처리한다.
// region:    --- Imports
use crate::auction::model::{self, status, Auction, Bid};
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

pub mod queries;

// endregion: --- Imports

// region:    --- Auction Store Trait

/// 경매 생성 입력
#[derive(Debug, Clone)]
pub struct NewAuction {
    pub product_id: String,
    pub start_price: i64,
    pub reserve_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// 경매 저장소 트레이트
/// 입찰 엔진은 이 트레이트에만 의존하며, 테스트에서는 인메모리 구현으로 대체한다.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 경매 스냅샷 조회
    async fn get_auction(&self, auction_id: i64) -> Result<Auction, AuctionError>;

    /// 입찰 반영 시도. 검증과 갱신, 입찰 기록 추가를 하나의 트랜잭션으로 수행한다.
    /// 버전 충돌 시 ConcurrentModification을 반환하며, 재시도는 호출자의 몫이다.
    async fn try_apply_bid(
        &self,
        auction_id: i64,
        bidder_id: &str,
        bidder_name: &str,
        amount: i64,
        min_increment: i64,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError>;

    /// 입찰 이력 조회(최신순). cursor는 마지막으로 본 입찰 id이며 커서 이전 id만 반환한다.
    async fn list_bids(
        &self,
        auction_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Bid>, AuctionError>;

    /// 경매 생성
    async fn create_auction(
        &self,
        new_auction: NewAuction,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError>;

    /// 경매 정산. 종료된 경매만 정산할 수 있고 정산은 1회만 가능하다.
    async fn settle_auction(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError>;
}

// endregion: --- Auction Store Trait

// region:    --- Postgres Auction Store

/// 경매 저장소 Postgres 구현체
pub struct PostgresAuctionStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn get_auction(&self, auction_id: i64) -> Result<Auction, AuctionError> {
        info!("{:<12} --> 경매 조회 id: {}", "Store", auction_id);
        self.db_manager
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                        .bind(auction_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(AuctionError::NotFound)
                })
            })
            .await
    }

    async fn try_apply_bid(
        &self,
        auction_id: i64,
        bidder_id: &str,
        bidder_name: &str,
        amount: i64,
        min_increment: i64,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        info!(
            "{:<12} --> 입찰 반영 시도 id: {}, 금액: {}",
            "Store", auction_id, amount
        );
        let bidder_id = bidder_id.to_string();
        let bidder_name = bidder_name.to_string();

        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                        .bind(auction_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(AuctionError::NotFound)?;

                    // 시간 검증이 status 컬럼보다 우선한다.
                    // 스케줄러가 지연되어도 마감 이후의 입찰이 끼어들 수 없다.
                    if auction.status == status::CLOSED
                        || auction.status == status::SETTLED
                        || auction.is_ended(now)
                    {
                        return Err(AuctionError::AuctionClosed);
                    }
                    if auction.is_not_started(now) {
                        return Err(AuctionError::NotStarted);
                    }
                    if amount < auction.current_price + min_increment {
                        return Err(AuctionError::BidTooLow {
                            current_price: auction.current_price,
                            min_increment,
                        });
                    }

                    // version 조건부 갱신. 0건 갱신이면 다른 입찰이 먼저 커밋된 것이다.
                    let updated = sqlx::query_as::<_, Auction>(queries::APPLY_BID)
                        .bind(auction_id)
                        .bind(amount)
                        .bind(&bidder_id)
                        .bind(auction.version)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(AuctionError::ConcurrentModification)?;

                    // 입찰 기록은 가격 갱신과 같은 트랜잭션에 속한다.
                    sqlx::query(queries::INSERT_BID)
                        .bind(auction_id)
                        .bind(&bidder_id)
                        .bind(&bidder_name)
                        .bind(amount)
                        .bind(now)
                        .execute(&mut **tx)
                        .await?;

                    Ok(updated)
                })
            })
            .await
    }

    async fn list_bids(
        &self,
        auction_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Bid>, AuctionError> {
        info!(
            "{:<12} --> 입찰 이력 조회 id: {}, cursor: {:?}",
            "Store", auction_id, cursor
        );
        let limit = limit.clamp(1, 100);
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let bids = match cursor {
                        Some(cursor) => {
                            sqlx::query_as::<_, Bid>(queries::LIST_BIDS_AFTER)
                                .bind(auction_id)
                                .bind(cursor)
                                .bind(limit)
                                .fetch_all(&mut **tx)
                                .await?
                        }
                        None => {
                            sqlx::query_as::<_, Bid>(queries::LIST_BIDS_FIRST)
                                .bind(auction_id)
                                .bind(limit)
                                .fetch_all(&mut **tx)
                                .await?
                        }
                    };
                    Ok(bids)
                })
            })
            .await
    }

    async fn create_auction(
        &self,
        new_auction: NewAuction,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        info!(
            "{:<12} --> 경매 생성 product_id: {}",
            "Store", new_auction.product_id
        );
        if new_auction.end_time <= new_auction.start_time {
            return Err(AuctionError::InvalidPeriod);
        }
        if new_auction.start_price <= 0 {
            return Err(AuctionError::InvalidAmount);
        }

        // 시작 시간이 이미 지났다면 바로 OPEN으로 생성한다.
        let initial_status = if now >= new_auction.start_time {
            status::OPEN
        } else {
            status::SCHEDULED
        };

        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let auction = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
                        .bind(&new_auction.product_id)
                        .bind(new_auction.start_price)
                        .bind(new_auction.reserve_price)
                        .bind(new_auction.start_time)
                        .bind(new_auction.end_time)
                        .bind(initial_status)
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?;
                    Ok(auction)
                })
            })
            .await
    }

    async fn settle_auction(
        &self,
        auction_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        info!("{:<12} --> 경매 정산 id: {}", "Store", auction_id);
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let auction = sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
                        .bind(auction_id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(AuctionError::NotFound)?;

                    // SETTLED는 종결 상태다. 어떤 변경도 허용하지 않는다.
                    if auction.status == status::SETTLED {
                        return Err(AuctionError::AlreadySettled);
                    }
                    // 스케줄러가 아직 CLOSED로 바꾸지 않았더라도 종료 시간이 지났으면 정산 가능
                    if !auction.is_ended(now) {
                        return Err(AuctionError::NotClosed);
                    }

                    let outcome = model::settlement_outcome(&auction);

                    let settled = sqlx::query_as::<_, Auction>(queries::SETTLE_AUCTION)
                        .bind(auction_id)
                        .bind(outcome)
                        .bind(auction.version)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(AuctionError::ConcurrentModification)?;

                    info!(
                        "{:<12} --> 정산 완료 id: {}, 결과: {}",
                        "Store", auction_id, outcome
                    );
                    Ok(settled)
                })
            })
            .await
    }
}

// endregion: --- Postgres Auction Store
