//! Connectivity management for the station
//!
//! This module handles:
//! - Bounded retry when bringing a transport up
//! - Diagnosing why the network link failed to come up
//! - Gating the MQTT session on the network link
//! - Remembering the first attempt of each transport

mod retry;
mod state;

pub use retry::RetryPolicy;
pub use state::{
    classify_failure, ConnectionState, FailureCause, LinkState, TransportLink,
};
