use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 상태. 시간 비교가 항상 우선이며 status 컬럼은 캐시로만 취급한다.
pub mod status {
    pub const SCHEDULED: &str = "SCHEDULED";
    pub const OPEN: &str = "OPEN";
    pub const CLOSED: &str = "CLOSED";
    pub const SETTLED: &str = "SETTLED";
}

// 정산 결과
pub mod settlement {
    pub const SOLD: &str = "SOLD";
    pub const UNSOLD: &str = "UNSOLD";
}

// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    /// 카탈로그 서비스가 소유한 상품 식별자. 본 서비스에서는 불투명 키로만 다룬다.
    pub product_id: String,
    /// 금액은 모두 통화 최소 단위의 정수(부동소수점 오차 방지)
    pub start_price: i64,
    pub current_price: i64,
    pub reserve_price: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub bid_count: i64,
    pub highest_bidder_id: Option<String>,
    pub status: String,
    pub settlement: Option<String>,
    /// 낙관적 동시성 제어용 버전
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// 종료 시간이 지났는지 여부. status 컬럼보다 이 판정이 우선한다.
    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    /// 아직 시작 전인지 여부
    pub fn is_not_started(&self, now: DateTime<Utc>) -> bool {
        now < self.start_time
    }
}

// 입찰 모델. 생성 이후 불변이며 append-only 로그로만 쌓인다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub bidder_id: String,
    /// 입찰 시점에 아이덴티티 서비스에서 가져와 비정규화한 표시 이름.
    /// 클라이언트가 보낸 값을 절대 그대로 저장하지 않는다.
    pub bidder_name: String,
    pub amount: i64,
    pub bid_time: DateTime<Utc>,
}

/// 종료된 경매의 정산 결과 판정
/// 입찰이 없거나 최종 가격이 예약가에 미달하면 유찰(UNSOLD)로 정산한다.
/// 유찰은 오류가 아니라 명시적인 종결 상태다.
pub fn settlement_outcome(auction: &Auction) -> &'static str {
    let reserve_met = auction
        .reserve_price
        .map_or(true, |reserve| auction.current_price >= reserve);
    if auction.bid_count > 0 && reserve_met {
        settlement::SOLD
    } else {
        settlement::UNSOLD
    }
}

// region:    --- Tests


// endregion: --- Tests
