/// 아이덴티티 서비스 클라이언트
/// 입찰자 인증과 표시 이름 귀속에만 사용한다. 입찰자 이름은 항상 여기서 가져오며
/// 클라이언트가 보낸 값을 신뢰하지 않는다.
// region:    --- Imports
use crate::error::AuctionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Identity Client

/// 판매자(농가) 역할
pub const ROLE_FARMER: &str = "farmer";

/// 인증된 사용자
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub role: String,
}

impl User {
    pub fn is_farmer(&self) -> bool {
        self.role == ROLE_FARMER
    }
}

/// 아이덴티티 서비스 트레이트
#[async_trait]
pub trait IdentityClient: Send + Sync {
    /// 토큰으로 현재 사용자 조회. 유효하지 않은 토큰은 Unauthenticated로 거절된다.
    async fn current_user(&self, token: &str) -> Result<User, AuctionError>;
}

/// 아이덴티티 서비스 HTTP 구현체
pub struct HttpIdentityClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpIdentityClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    async fn current_user(&self, token: &str) -> Result<User, AuctionError> {
        info!("{:<12} --> 현재 사용자 조회", "Identity");
        let response = self
            .client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuctionError::Upstream(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuctionError::Unauthenticated);
        }
        if !response.status().is_success() {
            return Err(AuctionError::Upstream(format!(
                "아이덴티티 서비스 응답 오류: {}",
                response.status()
            )));
        }

        response
            .json::<User>()
            .await
            .map_err(|e| AuctionError::Upstream(e.to_string()))
    }
}

// endregion: --- Identity Client
