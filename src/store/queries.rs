/// 경매 단건 조회
pub const GET_AUCTION: &str = "SELECT id, product_id, start_price, current_price, reserve_price, start_time, end_time, bid_count, highest_bidder_id, status, settlement, version, created_at FROM auctions WHERE id = $1";

/// 경매 생성
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (product_id, start_price, current_price, reserve_price, start_time, end_time, status, created_at)
    VALUES ($1, $2, $2, $3, $4, $5, $6, $7)
    RETURNING id, product_id, start_price, current_price, reserve_price, start_time, end_time, bid_count, highest_bidder_id, status, settlement, version, created_at
"#;

/// 입찰 반영(가격/입찰자/입찰 수를 한 번에 갱신)
/// version 조건이 맞지 않으면 0건이 갱신되며, 이는 동시 수정 충돌을 의미한다.
/// SCHEDULED 상태로 남아 있던 경매도 이 갱신으로 OPEN 처리된다(지연 전이).
pub const APPLY_BID: &str = r#"
    UPDATE auctions
    SET current_price = $2,
        highest_bidder_id = $3,
        bid_count = bid_count + 1,
        status = 'OPEN',
        version = version + 1
    WHERE id = $1 AND version = $4
    RETURNING id, product_id, start_price, current_price, reserve_price, start_time, end_time, bid_count, highest_bidder_id, status, settlement, version, created_at
"#;

/// 입찰 기록 추가(가격 갱신과 같은 트랜잭션에서 실행)
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (auction_id, bidder_id, bidder_name, amount, bid_time)
    VALUES ($1, $2, $3, $4, $5)
"#;

/// 입찰 이력 첫 페이지 조회(최신순)
pub const LIST_BIDS_FIRST: &str = r#"
    SELECT id, auction_id, bidder_id, bidder_name, amount, bid_time
    FROM bids
    WHERE auction_id = $1
    ORDER BY id DESC
    LIMIT $2
"#;

/// 입찰 이력 커서 이후 페이지 조회(최신순, 커서는 마지막으로 본 입찰 id)
pub const LIST_BIDS_AFTER: &str = r#"
    SELECT id, auction_id, bidder_id, bidder_name, amount, bid_time
    FROM bids
    WHERE auction_id = $1 AND id < $2
    ORDER BY id DESC
    LIMIT $3
"#;

/// 정산 반영
pub const SETTLE_AUCTION: &str = r#"
    UPDATE auctions
    SET status = 'SETTLED',
        settlement = $2,
        version = version + 1
    WHERE id = $1 AND version = $3
    RETURNING id, product_id, start_price, current_price, reserve_price, start_time, end_time, bid_count, highest_bidder_id, status, settlement, version, created_at
"#;
