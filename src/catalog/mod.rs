/// 카탈로그 서비스 클라이언트
/// 경매 화면에 붙일 상품 요약 정보를 읽기 전용으로 가져온다.
/// 본 서비스는 카탈로그 상태를 절대 변경하지 않는다.
// region:    --- Imports
use crate::error::AuctionError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

// endregion: --- Imports

// region:    --- Catalog Client

/// 상품 요약 정보
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub name: String,
    pub image: String,
    pub farmer_name: String,
}

/// 카탈로그 서비스 트레이트
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn get_product(&self, product_id: &str) -> Result<ProductSummary, AuctionError>;
}

/// 카탈로그 서비스 HTTP 구현체
pub struct HttpCatalogClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn get_product(&self, product_id: &str) -> Result<ProductSummary, AuctionError> {
        info!("{:<12} --> 상품 조회 id: {}", "Catalog", product_id);
        let response = self
            .client
            .get(format!("{}/products/{}", self.base_url, product_id))
            .send()
            .await
            .map_err(|e| AuctionError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuctionError::Upstream(format!(
                "카탈로그 서비스 응답 오류: {}",
                response.status()
            )));
        }

        response
            .json::<ProductSummary>()
            .await
            .map_err(|e| AuctionError::Upstream(e.to_string()))
    }
}

// endregion: --- Catalog Client
