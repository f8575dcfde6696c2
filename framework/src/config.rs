/// Publisher timing and delivery settings
use std::time::Duration;

use crate::publisher::QoS;

/// Periodic publisher configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublisherConfig {
    /// Time between publishes
    pub interval_ms: u64,
    /// Time from enable to the first publish
    pub initial_delay_ms: u64,
    pub retain: bool,
    pub qos: QoS,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000, // 1 Hz
            initial_delay_ms: 1000,
            retain: false,
            qos: QoS::AtMostOnce,
        }
    }
}

impl PublisherConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}
