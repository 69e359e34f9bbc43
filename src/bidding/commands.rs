/// 입찰 관련 커맨드 처리
/// 1. 입찰
/// 2. 경매 생성
/// 3. 정산
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::{status, Auction};
use crate::clock::Clock;
use crate::error::AuctionError;
use crate::identity::User;
use crate::notifier::EventPublisher;
use crate::store::{AuctionStore, NewAuction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
/// 입찰자 정보는 페이로드가 아니라 인증된 사용자에게서 가져온다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: i64,
    pub amount: i64,
}

/// 경매 생성 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateAuctionCommand {
    pub product_id: String,
    pub start_price: i64,
    pub reserve_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// 입찰 정책
#[derive(Debug, Clone, Copy)]
pub struct BidPolicy {
    /// 최소 입찰 증가 단위. 1 미만으로는 설정할 수 없다.
    pub min_increment: i64,
    /// 버전 충돌 시 재시도 횟수 상한
    pub max_retries: u32,
}

impl BidPolicy {
    pub fn new(min_increment: i64, max_retries: u32) -> Self {
        Self {
            min_increment: min_increment.max(1),
            max_retries: max_retries.max(1),
        }
    }
}

impl Default for BidPolicy {
    fn default() -> Self {
        Self::new(1, 3)
    }
}

/// 1. 입찰
/// 저장소 접근 전에 금액을 검증하고, 버전 충돌은 상한 내에서 재시도한다.
/// 성공 시 가격 갱신 이벤트를 발행하고 갱신된 경매 스냅샷을 반환한다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    bidder: &User,
    store: &impl AuctionStore,
    publisher: &impl EventPublisher,
    policy: BidPolicy,
    clock: &dyn Clock,
) -> Result<Auction, AuctionError> {
    info!(
        "{:<12} --> 입찰 요청 처리 시작: {:?}, 입찰자: {}",
        "Command", cmd, bidder.id
    );

    // 저장소에 닿기 전의 검증. 재시도 대상이 아니다.
    if cmd.amount <= 0 {
        return Err(AuctionError::InvalidAmount);
    }

    let mut retries = 0;
    loop {
        // 시도마다 시간을 다시 읽는다. 충돌로 지연된 재시도가 요청 진입
        // 시점의 시계로 마감 검증을 통과하면 안 된다.
        let now = clock.now();
        match store
            .try_apply_bid(
                cmd.auction_id,
                &bidder.id,
                &bidder.display_name,
                cmd.amount,
                policy.min_increment,
                now,
            )
            .await
        {
            Ok(auction) => {
                let event = AuctionEvent::PriceUpdated {
                    auction_id: auction.id,
                    current_price: auction.current_price,
                    bid_count: auction.bid_count,
                    highest_bidder_id: auction.highest_bidder_id.clone(),
                    timestamp: now,
                };
                // 입찰은 이미 커밋되었으므로 발행 실패가 입찰 실패로 바뀌면 안 된다.
                if let Err(e) = publisher.publish(&event).await {
                    error!("{:<12} --> 이벤트 발행 실패: {}", "Command", e);
                }
                return Ok(auction);
            }
            Err(e) if e.is_transient() => {
                retries += 1;
                if retries >= policy.max_retries {
                    return Err(AuctionError::RetriesExhausted);
                }
                warn!(
                    "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도 ({}/{})",
                    "Command", retries, policy.max_retries
                );
            }
            Err(e) => return Err(e),
        }
    }
}

/// 2. 경매 생성(판매자 전용)
pub async fn handle_create_auction(
    cmd: CreateAuctionCommand,
    seller: &User,
    store: &impl AuctionStore,
    now: DateTime<Utc>,
) -> Result<Auction, AuctionError> {
    info!("{:<12} --> 경매 생성 요청 처리 시작: {:?}", "Command", cmd);

    if !seller.is_farmer() {
        return Err(AuctionError::Forbidden);
    }

    store
        .create_auction(
            NewAuction {
                product_id: cmd.product_id,
                start_price: cmd.start_price,
                reserve_price: cmd.reserve_price,
                start_time: cmd.start_time,
                end_time: cmd.end_time,
            },
            now,
        )
        .await
}

/// 3. 정산(판매자 전용)
/// 종료된 경매의 낙찰/유찰 여부를 확정한다.
/// 스윕보다 먼저 정산되는 경매는 CLOSED 상태를 거치지 않으므로
/// 종료 이벤트를 여기서 보전해 발행한다.
pub async fn handle_settle_auction(
    auction_id: i64,
    seller: &User,
    store: &impl AuctionStore,
    publisher: &impl EventPublisher,
    now: DateTime<Utc>,
) -> Result<Auction, AuctionError> {
    info!(
        "{:<12} --> 정산 요청 처리 시작 id: {}",
        "Command", auction_id
    );

    if !seller.is_farmer() {
        return Err(AuctionError::Forbidden);
    }

    let before = store.get_auction(auction_id).await?;
    let settled = store.settle_auction(auction_id, now).await?;

    // CLOSED를 거쳐 온 경매는 스윕이 이미 종료 이벤트를 발행했다.
    // 중복 발행은 at-least-once 계약 안에서 허용된다.
    if before.status != status::CLOSED {
        let event = AuctionEvent::AuctionClosed {
            auction_id: settled.id,
            current_price: settled.current_price,
            bid_count: settled.bid_count,
            highest_bidder_id: settled.highest_bidder_id.clone(),
            timestamp: now,
        };
        if let Err(e) = publisher.publish(&event).await {
            error!("{:<12} --> 종료 이벤트 발행 실패: {}", "Command", e);
        }
    }

    Ok(settled)
}

// endregion: --- Commands

// region:    --- Tests


// endregion: --- Tests
