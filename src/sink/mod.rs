//! Downstream sinks a reading is forwarded to

mod notify;
mod telemetry;

pub use notify::NotifySink;
pub use telemetry::TelemetrySink;
