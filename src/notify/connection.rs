//! Observer connection
//!
//! Wraps one duplex message channel to a remote watcher:
//! - outbound pump: drains the observer queue and control replies, sends a
//!   keep-alive ping every heartbeat interval regardless of traffic
//! - inbound pump: applies subscribe/unsubscribe to the topic filter, answers
//!   pings, enforces a sliding read deadline
//!
//! Whichever pump finishes first ends the connection; the other is dropped and
//! the observer is unregistered from the bus.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use chrono::Utc;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::bus::{NotificationBus, ObserverId, SharedEvent, Subscription, TopicFilter};
use crate::config::{bounded_interval, Config};
use crate::error::ObserverError;
use crate::models::{ClientMessage, EventEnvelope, ServerMessage};

/// Control replies waiting for the outbound pump
const CONTROL_QUEUE_SIZE: usize = 16;

// == Connection Config ==
/// Liveness timers for one observer connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Period of the keep-alive ping
    pub heartbeat_interval: Duration,
    /// Sliding deadline reset by any inbound frame
    pub read_timeout: Duration,
    /// Bound on every outbound write
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(54),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        }
    }
}

// == Serve ==
/// Registers an observer and runs both pumps until the connection ends.
pub async fn serve_observer<V, Si, St, E>(
    bus: Arc<NotificationBus<V>>,
    remote: String,
    topic: Option<String>,
    sink: Si,
    stream: St,
    config: ConnectionConfig,
) where
    V: Serialize + Send + Sync + 'static,
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let Subscription { id, topic, events } = bus.register(remote.clone(), topic);
    let (control_tx, control_rx) = mpsc::channel(CONTROL_QUEUE_SIZE);

    let result = tokio::select! {
        result = outbound_pump(id, events, control_rx, sink, &config) => result,
        result = inbound_pump(id, stream, &topic, control_tx, config.read_timeout) => result,
    };

    bus.unregister(id);
    match result {
        Ok(()) => info!(observer = id, remote = %remote, "Observer disconnected"),
        Err(e) => warn!(observer = id, remote = %remote, error = %e, "Observer connection closed"),
    }
}

// == Outbound Pump ==
async fn outbound_pump<V, Si>(
    id: ObserverId,
    mut events: mpsc::Receiver<SharedEvent<V>>,
    mut control: mpsc::Receiver<ServerMessage>,
    mut sink: Si,
    config: &ConnectionConfig,
) -> Result<(), ObserverError>
where
    V: Serialize,
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    // Fixed schedule; event writes never push the next ping back
    let period = bounded_interval(config.heartbeat_interval);
    let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => match EventEnvelope::new(&event).to_json() {
                    Ok(text) => send(&mut sink, Message::Text(text), config.write_timeout).await?,
                    Err(e) => warn!(observer = id, error = %e, "Failed to encode event, skipped"),
                },
                None => {
                    // Dropped by the bus: tell the peer and stop
                    debug!(observer = id, "Observer queue closed");
                    let _ = send(&mut sink, Message::Close(None), config.write_timeout).await;
                    return Ok(());
                }
            },
            Some(reply) = control.recv() => match reply.to_json() {
                Ok(text) => send(&mut sink, Message::Text(text), config.write_timeout).await?,
                Err(e) => warn!(observer = id, error = %e, "Failed to encode control reply"),
            },
            _ = heartbeat.tick() => {
                trace!(observer = id, "Sending keep-alive ping");
                send(&mut sink, Message::Ping(Vec::new()), config.write_timeout).await?;
            }
        }
    }
}

async fn send<Si>(sink: &mut Si, message: Message, timeout: Duration) -> Result<(), ObserverError>
where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    match tokio::time::timeout(timeout, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ObserverError::Transport(e.to_string())),
        Err(_) => Err(ObserverError::WriteTimeout),
    }
}

// == Inbound Pump ==
async fn inbound_pump<St, E>(
    id: ObserverId,
    mut stream: St,
    topic: &TopicFilter,
    control: mpsc::Sender<ServerMessage>,
    read_timeout: Duration,
) -> Result<(), ObserverError>
where
    St: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        let frame = match tokio::time::timeout(read_timeout, stream.next()).await {
            Err(_) => return Err(ObserverError::ReadTimeout(read_timeout)),
            Ok(None) => return Ok(()),
            Ok(Some(Err(e))) => return Err(ObserverError::Transport(e.to_string())),
            Ok(Some(Ok(frame))) => frame,
        };

        match frame {
            Message::Text(text) => {
                let reply = handle_client_message(id, &text, topic);
                if control.try_send(reply).is_err() {
                    debug!(observer = id, "Control reply dropped, outbound backlog");
                }
            }
            Message::Close(_) => {
                debug!(observer = id, "Peer closed connection");
                return Ok(());
            }
            // Pings, pongs and binary frames only count as activity
            _ => trace!(observer = id, "Inbound activity"),
        }
    }
}

/// Applies one control frame and returns the reply to send.
fn handle_client_message(id: ObserverId, text: &str, topic: &TopicFilter) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(observer = id, error = %e, "Invalid client message");
            return ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            };
        }
    };

    match message {
        ClientMessage::Subscribe { topic: new_topic } if new_topic.is_empty() => {
            ServerMessage::Error {
                message: "Topic cannot be empty".to_string(),
            }
        }
        ClientMessage::Subscribe { topic: new_topic } => {
            *topic.write() = Some(new_topic.clone());
            info!(observer = id, topic = %new_topic, "Observer subscribed");
            ServerMessage::Subscribed { topic: new_topic }
        }
        ClientMessage::Unsubscribe => {
            *topic.write() = None;
            info!(observer = id, "Observer unsubscribed");
            ServerMessage::Unsubscribed
        }
        ClientMessage::Ping => ServerMessage::Pong {
            timestamp: Utc::now(),
        },
    }
}
