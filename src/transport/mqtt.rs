//! MQTT session transport on top of rumqttc
//!
//! The station runs a single sequential loop, so the rumqttc event loop is
//! not spawned. It is polled inline: until CONNACK on connect, until the
//! PUBLISH packet has been written on publish, and without waiting on every
//! liveness check so a connection the broker closed is noticed.

use crate::transport::traits::{Endpoint, SessionCredentials, SessionLink};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use rumqttc::{
    AsyncClient, ConnAck, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Keep-alive interval negotiated with the broker
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Capacity of the client request queue
const REQUEST_CAPACITY: usize = 10;

/// MQTT session driven inline by the station loop
pub struct MqttSession {
    client: Option<AsyncClient>,
    eventloop: Option<EventLoop>,
    connected: bool,
    io_timeout: Duration,
}

impl MqttSession {
    /// Create a disconnected session; `io_timeout` bounds every broker exchange
    pub fn new(io_timeout: Duration) -> Self {
        Self {
            client: None,
            eventloop: None,
            connected: false,
            io_timeout,
        }
    }

    fn reset(&mut self) {
        self.client = None;
        self.eventloop = None;
        self.connected = false;
    }
}

#[async_trait]
impl SessionLink for MqttSession {
    async fn connect(
        &mut self,
        credentials: &SessionCredentials,
        endpoint: &Endpoint,
    ) -> Result<()> {
        self.reset();

        let mut options =
            MqttOptions::new(credentials.client_id.clone(), endpoint.host.clone(), endpoint.port);
        options.set_credentials(credentials.username.clone(), credentials.password.clone());
        options.set_keep_alive(KEEP_ALIVE);

        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);

        let connack = timeout(self.io_timeout, wait_for_connack(&mut eventloop))
            .await
            .map_err(|_| anyhow!("timed out waiting for CONNACK from {}", endpoint))??;

        if connack.code != ConnectReturnCode::Success {
            bail!("broker refused the connection: {:?}", connack.code);
        }

        self.client = Some(client);
        self.eventloop = Some(eventloop);
        self.connected = true;
        Ok(())
    }

    async fn is_connected(&mut self) -> bool {
        if !self.connected {
            return false;
        }

        let lost = match self.eventloop.as_mut() {
            Some(eventloop) => drain_pending(eventloop).await.err(),
            None => None,
        };
        if let Some(e) = lost {
            warn!("[MQTT] Connection to the broker was lost: {}", e);
            self.reset();
        }
        self.connected
    }

    async fn publish(&mut self, topic: &str, payload: Bytes) -> Result<()> {
        let (client, eventloop) = match (self.client.as_ref(), self.eventloop.as_mut()) {
            (Some(client), Some(eventloop)) if self.connected => (client, eventloop),
            _ => bail!("MQTT session is not connected"),
        };

        client
            .publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .await?;

        let flushed = timeout(self.io_timeout, wait_for_publish(eventloop)).await;
        match flushed {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                // The event loop is unusable after a connection error
                self.reset();
                Err(e)
            }
            Err(_) => Err(anyhow!("timed out writing PUBLISH to {}", topic)),
        }
    }

    fn name(&self) -> &'static str {
        "MQTT"
    }
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<ConnAck> {
    loop {
        match eventloop.poll().await? {
            Event::Incoming(Packet::ConnAck(connack)) => return Ok(connack),
            event => debug!("[MQTT] Waiting for CONNACK, got {:?}", event),
        }
    }
}

/// Handle every event the broker already delivered without waiting for more
async fn drain_pending(eventloop: &mut EventLoop) -> Result<(), ConnectionError> {
    loop {
        match timeout(Duration::ZERO, eventloop.poll()).await {
            Ok(Ok(event)) => debug!("[MQTT] Pending event {:?}", event),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Ok(()),
        }
    }
}

async fn wait_for_publish(eventloop: &mut EventLoop) -> Result<()> {
    loop {
        match eventloop.poll().await? {
            Event::Outgoing(Outgoing::Publish(_)) => return Ok(()),
            event => debug!("[MQTT] Waiting for PUBLISH, got {:?}", event),
        }
    }
}
