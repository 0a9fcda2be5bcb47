//! Durable candle egress to Kafka (feature `kafka`).
//!
//! Candles go out JSON-serialized, keyed by symbol, with the message
//! timestamp set to the last trade time. Delivery is fire-and-forget:
//! failures are logged and never stall the hub or the aggregator.

use rdkafka::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use vela_core::Candle;

/// JSON-over-Kafka publisher for aggregated candles.
pub struct CandlePublisher {
    producer: FutureProducer,
    topic: String,
}

impl CandlePublisher {
    /// Create a producer against `brokers` writing to `topic`.
    ///
    /// # Errors
    /// Fails when the client configuration is rejected; callers treat this
    /// as a fatal startup error.
    pub fn new(brokers: &str, topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    /// Enqueue one candle without waiting for delivery.
    pub fn publish(&self, candle: &Candle) {
        let payload = match serde_json::to_vec(candle) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "candle serialization failed");
                return;
            }
        };
        let record = FutureRecord::to(&self.topic)
            .key(&candle.symbol)
            .payload(&payload)
            .timestamp(candle.last_trade_ts);
        match self.producer.send_result(record) {
            Ok(delivery) => {
                // Log delivery failures off the hot path.
                tokio::spawn(async move {
                    match delivery.await {
                        Ok(Err((e, _msg))) => {
                            tracing::warn!(error = %e, "kafka delivery failed");
                        }
                        Err(_canceled) => {
                            tracing::warn!("kafka delivery dropped before completion");
                        }
                        Ok(Ok(_)) => {}
                    }
                });
            }
            Err((e, _record)) => {
                tracing::warn!(error = %e, "kafka enqueue failed; candle dropped");
            }
        }
    }
}
