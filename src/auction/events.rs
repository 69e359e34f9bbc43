use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 구독자(실시간 UI)에게 전파되는 경매 이벤트
/// 같은 경매에 대한 이벤트는 커밋 순서대로 전달되어야 한다.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum AuctionEvent {
    // 입찰 성공으로 현재 가격이 갱신된 경우
    PriceUpdated {
        auction_id: i64,
        current_price: i64,
        bid_count: i64,
        highest_bidder_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
    // 경매가 종료된 경우(Open -> Closed 전이)
    AuctionClosed {
        auction_id: i64,
        current_price: i64,
        bid_count: i64,
        highest_bidder_id: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    /// 이벤트가 속한 경매 id. 발행 시 파티션 키로 사용한다.
    pub fn auction_id(&self) -> i64 {
        match self {
            AuctionEvent::PriceUpdated { auction_id, .. } => *auction_id,
            AuctionEvent::AuctionClosed { auction_id, .. } => *auction_id,
        }
    }
}
