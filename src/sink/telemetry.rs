//! Telemetry channel publisher

use crate::transport::SessionLink;
use station_shared::codec::{encode_telemetry, telemetry_topic};
use station_shared::Reading;
use tracing::{info, warn};

/// Publishes readings to a telemetry channel over the MQTT session
pub struct TelemetrySink {
    topic: String,
}

impl TelemetrySink {
    pub fn new(channel_id: u64) -> Self {
        Self {
            topic: telemetry_topic(channel_id),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish one reading. A failed publish is logged and dropped.
    pub async fn publish(&self, reading: &Reading, session: &mut dyn SessionLink) -> bool {
        let payload = encode_telemetry(reading);
        match session.publish(&self.topic, payload).await {
            Ok(()) => {
                info!("[TELEMETRY] Data has been published to {}", self.topic);
                true
            }
            Err(e) => {
                warn!(
                    "[TELEMETRY] Publishing to {} failed: {:#}",
                    self.topic, e
                );
                false
            }
        }
    }
}
