// region:    --- Imports
use crate::bidding::commands::{
    handle_create_auction as command_handle_create_auction,
    handle_place_bid as command_handle_place_bid,
    handle_settle_auction as command_handle_settle_auction, BidPolicy, CreateAuctionCommand,
    PlaceBidCommand,
};
use crate::catalog::CatalogClient;
use crate::clock::Clock;
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use crate::identity::{IdentityClient, User};
use crate::notifier::KafkaPublisher;
use crate::store::{AuctionStore, PostgresAuctionStore};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- App State

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    pub db_manager: Arc<DatabaseManager>,
    pub publisher: Arc<KafkaPublisher>,
    pub identity: Arc<dyn IdentityClient>,
    pub catalog: Arc<dyn CatalogClient>,
    pub clock: Arc<dyn Clock>,
    pub policy: BidPolicy,
}

/// 오류를 {error, code} 형태의 응답으로 변환
fn error_response(err: AuctionError) -> Response {
    match &err {
        AuctionError::Storage(e) => error!("{:<12} --> 저장소 오류: {:?}", "Handler", e),
        AuctionError::Upstream(e) => error!("{:<12} --> 외부 서비스 오류: {}", "Handler", e),
        _ => {}
    }
    (err.status_code(), Json(err.to_body())).into_response()
}

/// Authorization 헤더의 Bearer 토큰으로 현재 사용자 조회
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, AuctionError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuctionError::Unauthenticated)?;
    state.identity.current_user(token).await
}

// endregion: --- App State

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<BidRequest>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 입찰 요청 처리 시작 id: {}, 금액: {}",
        "Command", auction_id, body.amount
    );

    let bidder = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };

    let store = PostgresAuctionStore::new(Arc::clone(&state.db_manager));
    let cmd = PlaceBidCommand {
        auction_id,
        amount: body.amount,
    };

    match command_handle_place_bid(
        cmd,
        &bidder,
        &store,
        &*state.publisher,
        state.policy,
        state.clock.as_ref(),
    )
    .await
    {
        Ok(auction) => (StatusCode::OK, Json(auction)).into_response(),
        Err(e) => error_response(e),
    }
}

/// 입찰 요청 바디. 입찰자 정보는 받지 않는다.
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: i64,
}

/// 경매 생성 요청 처리(판매자 전용)
pub async fn handle_create_auction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(cmd): Json<CreateAuctionCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 생성 요청 처리 시작: {:?}", "Command", cmd);

    let seller = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };

    let store = PostgresAuctionStore::new(Arc::clone(&state.db_manager));

    match command_handle_create_auction(cmd, &seller, &store, state.clock.now()).await {
        Ok(auction) => (StatusCode::CREATED, Json(auction)).into_response(),
        Err(e) => error_response(e),
    }
}

/// 정산 요청 처리(판매자 전용)
pub async fn handle_settle(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    info!("{:<12} --> 정산 요청 처리 시작 id: {}", "Command", auction_id);

    let seller = match authenticate(&state, &headers).await {
        Ok(user) => user,
        Err(e) => return error_response(e),
    };

    let store = PostgresAuctionStore::new(Arc::clone(&state.db_manager));

    match command_handle_settle_auction(
        auction_id,
        &seller,
        &store,
        &*state.publisher,
        state.clock.now(),
    )
    .await
    {
        Ok(auction) => (StatusCode::OK, Json(auction)).into_response(),
        Err(e) => error_response(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 경매 스냅샷 조회. 카탈로그 서비스의 상품 요약을 함께 내려준다.
/// 상품 요약 조회 실패는 경고만 남기고 null로 내려주며, 경매 데이터 자체는
/// 절대 기본값으로 대체하지 않는다.
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);

    let store = PostgresAuctionStore::new(Arc::clone(&state.db_manager));
    let auction = match store.get_auction(auction_id).await {
        Ok(auction) => auction,
        Err(e) => return error_response(e),
    };

    let product = match state.catalog.get_product(&auction.product_id).await {
        Ok(product) => Some(product),
        Err(e) => {
            warn!(
                "{:<12} --> 상품 요약 조회 실패 product_id: {}: {}",
                "HandlerQuery", auction.product_id, e
            );
            None
        }
    };

    Json(serde_json::json!({
        "auction": auction,
        "product": product,
    }))
    .into_response()
}

/// 입찰 이력 페이지 파라미터
#[derive(Debug, Deserialize)]
pub struct BidHistoryParams {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

/// 입찰 이력 조회(최신순)
/// cursor는 직전 페이지 마지막 입찰의 id이며, 응답의 next_cursor를 그대로 넘기면 된다.
pub async fn handle_get_bid_history(
    State(state): State<AppState>,
    Path(auction_id): Path<i64>,
    Query(params): Query<BidHistoryParams>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 입찰 이력 조회 id: {}, cursor: {:?}",
        "HandlerQuery", auction_id, params.cursor
    );

    let store = PostgresAuctionStore::new(Arc::clone(&state.db_manager));
    let limit = params.limit.unwrap_or(50).clamp(1, 100);

    // 존재하지 않는 경매의 이력 요청은 빈 목록이 아니라 NOT_FOUND로 거절한다.
    if let Err(e) = store.get_auction(auction_id).await {
        return error_response(e);
    }

    match store.list_bids(auction_id, params.cursor, limit).await {
        Ok(bids) => {
            let next_cursor = if bids.len() as i64 == limit {
                bids.last().map(|b| b.id)
            } else {
                None
            };
            Json(serde_json::json!({
                "bids": bids,
                "next_cursor": next_cursor,
            }))
            .into_response()
        }
        Err(e) => error_response(e),
    }
}

// endregion: --- Query Handlers
