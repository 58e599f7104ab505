//! Payload codec for the two downstream sinks
//!
//! Telemetry is published as a URL-encoded field string:
//! ```text
//! field1=<temperature>&field2=<light>&field3=<pressure>
//! ```
//! Notifications are posted as a webhook embed document.

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::{json, Value};

use crate::Reading;

/// Accent color of the notification embed
pub const EMBED_COLOR: u32 = 4176032;

/// Headline of the notification embed
pub const EMBED_DESCRIPTION: &str = "**NEW MEASUREMENT**";

/// Unit label shown next to the pressure value in notifications.
///
/// Kept as "lux" to match the deployed notifier output even though the value
/// is a pressure in Pascal.
pub const PRESSURE_UNIT_LABEL: &str = "lux";

/// HTTP status codes the webhook answers with on success
pub const WEBHOOK_SUCCESS_CODES: [u16; 3] = [200, 201, 204];

/// Topic a telemetry channel accepts publishes on
pub fn telemetry_topic(channel_id: u64) -> String {
    format!("channels/{}/publish", channel_id)
}

/// Encode a reading as the telemetry field string.
///
/// Values are already rounded by [`Reading::from_raw`]; field3 carries the
/// pressure in Pascal.
pub fn encode_telemetry(reading: &Reading) -> Bytes {
    let fields = [
        reading.temperature_c(),
        reading.light_lux(),
        reading.pressure_pa(),
    ];

    let mut buf = BytesMut::with_capacity(64);
    for (index, value) in fields.iter().enumerate() {
        if index > 0 {
            buf.put_u8(b'&');
        }
        let field = format!("field{}={:.2}", index + 1, value);
        buf.put_slice(field.as_bytes());
    }
    buf.freeze()
}

/// Build the webhook embed document for a reading
pub fn webhook_embed(reading: &Reading) -> Value {
    json!({
        "content": null,
        "embeds": [{
            "description": EMBED_DESCRIPTION,
            "color": EMBED_COLOR,
            "fields": [
                embed_field("Temperature", reading.temperature_c(), "°C"),
                embed_field("Light intensity", reading.light_lux(), "lux"),
                embed_field("Air pressure", reading.pressure_pa(), PRESSURE_UNIT_LABEL),
            ]
        }],
        "attachments": []
    })
}

/// Check whether a webhook response code means the message was delivered
pub fn is_webhook_success(status: u16) -> bool {
    WEBHOOK_SUCCESS_CODES.contains(&status)
}

fn embed_field(name: &str, value: f32, unit: &str) -> Value {
    json!({
        "name": name,
        "value": format!("`{:.1} {}`", value, unit),
        "inline": true
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reading() -> Reading {
        Reading::from_raw(21.436, 350.0, 101325.0)
    }

    #[test]
    fn test_telemetry_topic() {
        assert_eq!(telemetry_topic(1973314), "channels/1973314/publish");
    }

    #[test]
    fn test_encode_telemetry_fields() {
        let payload = encode_telemetry(&sample_reading());
        assert_eq!(
            std::str::from_utf8(&payload).expect("payload is utf-8"),
            "field1=21.43&field2=350.00&field3=101325.00"
        );
    }

    #[test]
    fn test_encode_telemetry_negative_temperature() {
        let reading = Reading::from_raw(-1.005, 0.0, 98000.0);
        let payload = encode_telemetry(&reading);
        let text = std::str::from_utf8(&payload).expect("payload is utf-8");
        assert!(text.starts_with("field1=-1.01&"), "got {text}");
    }

    #[test]
    fn test_webhook_embed_shape() {
        let body = webhook_embed(&sample_reading());

        assert!(body["content"].is_null());
        assert_eq!(body["attachments"], json!([]));

        let embed = &body["embeds"][0];
        assert_eq!(embed["description"], "**NEW MEASUREMENT**");
        assert_eq!(embed["color"], 4176032);

        let fields = embed["fields"].as_array().expect("fields array");
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0]["name"], "Temperature");
        assert_eq!(fields[0]["value"], "`21.4 °C`");
        assert_eq!(fields[1]["name"], "Light intensity");
        assert_eq!(fields[1]["value"], "`350.0 lux`");
        assert_eq!(fields[2]["name"], "Air pressure");
        assert_eq!(fields[2]["value"], "`101325.0 lux`");
        assert!(fields.iter().all(|f| f["inline"] == true));
    }

    #[test]
    fn test_webhook_embed_key_order() {
        let body = webhook_embed(&sample_reading()).to_string();
        let content = body.find("\"content\"").expect("content key");
        let embeds = body.find("\"embeds\"").expect("embeds key");
        let attachments = body.find("\"attachments\"").expect("attachments key");
        assert!(content < embeds && embeds < attachments);
    }

    #[test]
    fn test_webhook_success_codes() {
        assert!(is_webhook_success(200));
        assert!(is_webhook_success(201));
        assert!(is_webhook_success(204));
        assert!(!is_webhook_success(202));
        assert!(!is_webhook_success(400));
        assert!(!is_webhook_success(500));
    }
}
