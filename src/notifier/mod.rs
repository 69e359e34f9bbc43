/// 알림 발행자
/// 입찰 커밋 직후의 가격 갱신 이벤트와 경매 종료 이벤트를 구독자에게 전파한다.
/// 전달 보장은 at-least-once이며, 같은 경매의 이벤트는 커밋 순서를 따른다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Event Publisher Trait

/// 경매 업데이트 토픽 이름. 구독 채널(SUBSCRIBE auctions/{id})의 구현 기반이 된다.
pub const UPDATES_TOPIC: &str = "auction-updates";

/// 이벤트 발행 트레이트
/// 전송 계층(WebSocket 등)은 구독 측의 책임이며 본 서비스는 발행 계약만 구현한다.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String>;
}

// endregion: --- Event Publisher Trait

// region:    --- Kafka Publisher

/// 이벤트 발행 Kafka 구현체
/// 경매 id를 메시지 키로 사용하여 같은 경매의 이벤트가 한 파티션에 순서대로 쌓이게 한다.
pub struct KafkaPublisher {
    producer: Arc<FutureProducer>,
    brokers: String,
}

impl KafkaPublisher {
    pub fn new(brokers: &str) -> Self {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .expect("Producer creation error");

        KafkaPublisher {
            producer: Arc::new(producer),
            brokers: brokers.to_string(),
        }
    }

    /// 토픽 생성
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), String> {
        info!(
            "{:<12} --> Kafka 토픽 생성 시작: {}",
            "Publisher", topic_name
        );

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| format!("AdminClient 생성 실패: {:?}", e))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        match admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
        {
            Ok(_) => {
                info!(
                    "{:<12} --> Kafka 토픽 생성 성공: {}",
                    "Publisher", topic_name
                );
                Ok(())
            }
            Err(e) => {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Publisher", e);
                Err(format!("토픽 생성 실패: {:?}", e))
            }
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String> {
        let key = event.auction_id().to_string();
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;

        info!(
            "{:<12} --> 이벤트 발행: topic={}, key={}",
            "Publisher", UPDATES_TOPIC, key
        );

        let record = FutureRecord::to(UPDATES_TOPIC).key(&key).payload(&payload);

        self.producer
            .send(record, std::time::Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }
}

// endregion: --- Kafka Publisher
