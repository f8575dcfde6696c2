/// Messaging handler abstraction
///
/// The component hands finished payloads to a `MessagePublisher` and does not
/// care how they reach the broker. Publishing is fire-and-forget: the caller
/// only learns whether the message was accepted for sending.
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::PublishError;

/// MQTT delivery-assurance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QoS {
    /// Fire and forget (0)
    #[default]
    AtMostOnce,
    /// Acknowledged delivery (1)
    AtLeastOnce,
    /// Assured single delivery (2)
    ExactlyOnce,
}

impl QoS {
    pub fn level(&self) -> u8 {
        match self {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// Messaging client used to publish telemetry
pub trait MessagePublisher: Send + Sync {
    /// Queue `payload` for delivery on `topic`
    fn publish(&self, topic: &str, payload: &str, retain: bool, qos: QoS)
        -> Result<(), PublishError>;
}

/// Publisher that only writes messages to the log (for testing / dry runs)
pub struct LogPublisher;

impl MessagePublisher for LogPublisher {
    fn publish(
        &self,
        topic: &str,
        payload: &str,
        retain: bool,
        qos: QoS,
    ) -> Result<(), PublishError> {
        log::info!(
            "[PUBLISH] {} (qos {}, retain {}): {}",
            topic,
            qos.level(),
            retain,
            payload
        );
        Ok(())
    }
}

/// Sent / failed publish counters
#[derive(Debug, Default)]
pub struct PublishStats {
    sent: AtomicU32,
    failed: AtomicU32,
}

impl PublishStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// (sent, failed)
    pub fn get(&self) -> (u32, u32) {
        (
            self.sent.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }

    pub fn reset(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }
}
