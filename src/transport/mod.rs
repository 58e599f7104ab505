pub mod mqtt;
pub mod probe;
pub mod simulated;
pub mod traits;
pub mod webhook;

pub use mqtt::MqttSession;
pub use probe::ProbeNetwork;
pub use simulated::{SimulatedNetwork, SimulatedSession, SimulatedWebhook};
pub use traits::{
    Endpoint, NetworkLink, NetworkStatus, ScanOutcome, SessionCredentials, SessionLink,
    VisibleNetwork, WebhookClient,
};
pub use webhook::HttpWebhook;
