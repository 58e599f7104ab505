//! Station lifecycle and the measurement cycle

mod orchestrator;

pub use orchestrator::{CycleReport, Orchestrator, SinkOutcome};
