// region:    --- Imports
use tracing::warn;

// endregion: --- Imports

// region:    --- Config

/// 서비스 설정
/// 환경 변수에서 로드한다. DATABASE_URL만 필수이며 나머지는 기본값을 가진다.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub kafka_brokers: String,
    pub bind_addr: String,
    pub identity_service_url: String,
    pub catalog_service_url: String,
    /// 최소 입찰 증가 단위(통화 최소 단위 기준). 기본값은 1(0.01)이며
    /// 프론트의 0.25 단위 입찰에 맞추려면 25로 설정한다.
    pub min_increment: i64,
    /// 버전 충돌 시 입찰 재시도 횟수 상한
    pub max_bid_retries: u32,
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            kafka_brokers: std::env::var("KAFKA_BROKERS")
                .unwrap_or_else(|_| "localhost:9092".to_string()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            identity_service_url: std::env::var("IDENTITY_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            catalog_service_url: std::env::var("CATALOG_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:3002".to_string()),
            min_increment: parse_env("BID_MIN_INCREMENT", 1i64),
            max_bid_retries: parse_env("BID_MAX_RETRIES", 3u32),
        }
    }
}

/// 숫자 환경 변수 파싱. 파싱 실패(음수 포함) 시 경고 후 기본값 사용
fn parse_env<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(
                "{:<12} --> 환경 변수 {} 파싱 실패, 기본값 {} 사용",
                "Config", key, default
            );
            default
        }),
        Err(_) => default,
    }
}

// endregion: --- Config

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_rejects_negative_retry_count() {
        // u32로 직접 파싱하므로 음수는 거대한 재시도 예산으로 순환하지 않는다.
        std::env::set_var("TEST_RETRY_BUDGET_NEG", "-5");
        assert_eq!(parse_env("TEST_RETRY_BUDGET_NEG", 3u32), 3);
        std::env::remove_var("TEST_RETRY_BUDGET_NEG");
    }

    #[test]
    fn test_parse_env_valid_and_missing() {
        std::env::set_var("TEST_RETRY_BUDGET_OK", "7");
        assert_eq!(parse_env("TEST_RETRY_BUDGET_OK", 3u32), 7);
        std::env::remove_var("TEST_RETRY_BUDGET_OK");

        assert_eq!(parse_env("TEST_RETRY_BUDGET_UNSET", 3u32), 3);
        assert_eq!(parse_env("TEST_INCREMENT_UNSET", 1i64), 1);
    }
}

// endregion: --- Tests
