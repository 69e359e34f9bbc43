// region:    --- Imports
use axum::http::StatusCode;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Auction Error

/// 경매 서비스 오류 타입
/// 비즈니스 거절(입찰 거절 등)은 예외가 아니라 일반적인 결과 값으로 취급한다.
/// 저장소 오류는 절대 빈 결과로 변환하지 않고 그대로 상위로 전파한다.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("존재하지 않는 경매입니다.")]
    NotFound,

    #[error("입찰 금액이 올바르지 않습니다.")]
    InvalidAmount,

    #[error("경매 종료 시간은 시작 시간 이후여야 합니다.")]
    InvalidPeriod,

    #[error("입찰 금액이 현재 가격보다 높아야 합니다.")]
    BidTooLow {
        current_price: i64,
        min_increment: i64,
    },

    #[error("경매가 아직 시작되지 않았습니다.")]
    NotStarted,

    #[error("경매가 이미 종료되었습니다.")]
    AuctionClosed,

    #[error("경매가 아직 종료되지 않았습니다.")]
    NotClosed,

    #[error("이미 정산된 경매입니다.")]
    AlreadySettled,

    #[error("로그인이 필요합니다.")]
    Unauthenticated,

    #[error("판매자만 수행할 수 있는 작업입니다.")]
    Forbidden,

    // 낙관적 동시성 제어로 인한 버전 충돌. 입찰 엔진이 내부적으로 재시도한다.
    #[error("버전 충돌")]
    ConcurrentModification,

    #[error("최대 재시도 횟수 초과")]
    RetriesExhausted,

    #[error("외부 서비스 호출 실패: {0}")]
    Upstream(String),

    #[error("저장소 오류: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AuctionError {
    /// UI가 문자열 매칭 없이 분기할 수 있도록 기계 판독용 코드를 제공한다.
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::NotFound => "NOT_FOUND",
            AuctionError::InvalidAmount => "INVALID_AMOUNT",
            AuctionError::InvalidPeriod => "INVALID_PERIOD",
            AuctionError::BidTooLow { .. } => "LOW_BID",
            AuctionError::NotStarted => "NOT_STARTED",
            AuctionError::AuctionClosed => "ALREADY_ENDED",
            AuctionError::NotClosed => "NOT_CLOSED",
            AuctionError::AlreadySettled => "ALREADY_SETTLED",
            AuctionError::Unauthenticated => "UNAUTHENTICATED",
            AuctionError::Forbidden => "FORBIDDEN",
            AuctionError::ConcurrentModification => "VERSION_CONFLICT",
            AuctionError::RetriesExhausted => "MAX_RETRIES_EXCEEDED",
            AuctionError::Upstream(_) => "UPSTREAM_ERROR",
            AuctionError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// HTTP 상태 코드 매핑
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuctionError::NotFound => StatusCode::NOT_FOUND,
            AuctionError::InvalidAmount | AuctionError::InvalidPeriod => StatusCode::BAD_REQUEST,
            AuctionError::BidTooLow { .. } => StatusCode::CONFLICT,
            AuctionError::NotStarted
            | AuctionError::NotClosed
            | AuctionError::AlreadySettled
            | AuctionError::ConcurrentModification
            | AuctionError::RetriesExhausted => StatusCode::CONFLICT,
            AuctionError::AuctionClosed => StatusCode::GONE,
            AuctionError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuctionError::Forbidden => StatusCode::FORBIDDEN,
            AuctionError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AuctionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 오류 응답 바디. 코드와 사람이 읽을 수 있는 사유를 항상 함께 내려준다.
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            AuctionError::BidTooLow {
                current_price,
                min_increment,
            } => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
                "current_price": current_price,
                "min_increment": min_increment,
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        }
    }

    /// 재시도 가능한 일시적 충돌인지 여부
    pub fn is_transient(&self) -> bool {
        matches!(self, AuctionError::ConcurrentModification)
    }
}

// endregion: --- Auction Error

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bid_too_low_body_carries_context() {
        let err = AuctionError::BidTooLow {
            current_price: 17500,
            min_increment: 25,
        };
        let body = err.to_body();
        assert_eq!(body["code"], "LOW_BID");
        assert_eq!(body["current_price"], 17500);
        assert_eq!(body["min_increment"], 25);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuctionError::AuctionClosed.status_code(), StatusCode::GONE);
        assert_eq!(
            AuctionError::NotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuctionError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert!(AuctionError::ConcurrentModification.is_transient());
        assert!(!AuctionError::AuctionClosed.is_transient());
    }
}

// endregion: --- Tests
