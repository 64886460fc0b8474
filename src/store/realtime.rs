//! Change notifications over the backend's Phoenix-channel websocket.
//!
//! One socket per table. The socket task joins a `postgres_changes` channel,
//! keeps it alive with heartbeats, and forwards decoded events to the
//! [`ChangeFeed`]. Aborting the task (dropping the feed) closes the socket.

use std::time::Duration;

use chrono::{
    DateTime,
    Utc,
};
use futures_util::{
    SinkExt,
    StreamExt,
};
use reqwest::Url;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    json,
    Value,
};
use tokio::{
    sync::mpsc,
    time::sleep,
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
};
use tracing::{
    debug,
    info,
    warn,
};

use super::{
    ChangeFeed,
    FeedEvent,
};
use crate::core::{
    errors::Result,
    models::{
        CardRow,
        SetRow,
    },
    ChangeEvent,
    ChangeKind,
    FlashdeckError,
    Row,
    Table,
};

const SOCKET_PATH: &str = "realtime/v1/websocket";
const PROTOCOL_VERSION: &str = "1.0.0";
const MAX_BACKOFF_SECS: u64 = 30;
const FEED_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub base_url: String,
    pub api_key: String,
    pub access_token: Option<String>,
    pub heartbeat_interval: Duration,
}

impl RealtimeConfig {
    pub fn socket_url(&self) -> Result<String> {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(FlashdeckError::Config(format!(
                "backend url must start with http:// or https://, got {}",
                self.base_url
            )));
        };
        let mut url = Url::parse(&format!("{base}/{SOCKET_PATH}"))
            .map_err(|e| FlashdeckError::Config(format!("invalid backend url {}: {}", self.base_url, e)))?;
        url.query_pairs_mut().append_pair("apikey", &self.api_key).append_pair("vsn", PROTOCOL_VERSION);
        Ok(url.to_string())
    }
}

/// What a single inbound frame asks of the socket task.
#[derive(Debug, PartialEq)]
enum Inbound {
    Event(FeedEvent),
    /// Our channel was errored or closed by the server. The socket must be
    /// reopened and the channel joined again.
    Rejoin,
    Ignore,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub msg_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePayload {
    pub data: ChangeData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangeData {
    pub table: String,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub record: Option<Value>,
    #[serde(default)]
    pub old_record: Option<Value>,
    #[serde(default)]
    pub commit_timestamp: Option<String>,
}

pub struct RealtimeChannel {
    config: RealtimeConfig,
    table: Table,
    next_ref: u64,
}

impl RealtimeChannel {
    pub fn new(config: RealtimeConfig, table: Table) -> Self {
        Self { config, table, next_ref: 0 }
    }

    fn topic(&self) -> String {
        format!("realtime:{}-changes", self.table)
    }

    fn make_ref(&mut self) -> String {
        self.next_ref += 1;
        self.next_ref.to_string()
    }

    pub(crate) fn join_message(&mut self) -> PhoenixMessage {
        let mut payload = json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": self.table.name() }
                ]
            }
        });
        if let Some(token) = &self.config.access_token {
            payload["access_token"] = Value::String(token.clone());
        }
        PhoenixMessage {
            topic: self.topic(),
            event: "phx_join".to_string(),
            payload,
            msg_ref: Some(self.make_ref()),
        }
    }

    fn heartbeat_message(&mut self) -> PhoenixMessage {
        PhoenixMessage {
            topic: "phoenix".to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            msg_ref: Some(self.make_ref()),
        }
    }

    /// Starts the socket task and returns the feed that owns it.
    pub fn spawn(self) -> Result<ChangeFeed> {
        let url = self.config.socket_url()?;
        let table = self.table;
        let (tx, rx) = mpsc::channel::<FeedEvent>(FEED_BUFFER);

        let producer = tokio::spawn(self.run(url, tx));

        let events = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed();

        Ok(ChangeFeed::new(table, events).with_producer(producer))
    }

    async fn run(mut self, url: String, tx: mpsc::Sender<FeedEvent>) {
        let mut attempts: u64 = 0;
        let mut connected_before = false;

        while !tx.is_closed() {
            match self.session(&url, &tx, connected_before).await {
                Ok(()) => {
                    attempts = 0;
                    connected_before = true;
                    info!(table = %self.table, "Realtime socket closed, reconnecting");
                }
                Err(e) => {
                    attempts += 1;
                    warn!(table = %self.table, attempt = attempts, "Realtime socket error: {}", e);
                }
            }

            let backoff = (2 * attempts).clamp(1, MAX_BACKOFF_SECS);
            sleep(Duration::from_secs(backoff)).await;
        }

        debug!(table = %self.table, "Realtime feed dropped, socket task exiting");
    }

    /// One connection lifetime. `Ok` means the server closed the socket.
    async fn session(
        &mut self,
        url: &str,
        tx: &mpsc::Sender<FeedEvent>,
        resync: bool,
    ) -> Result<()> {
        let (ws_stream, _) = connect_async(url).await?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        let join = serde_json::to_string(&self.join_message())?;
        ws_sender.send(Message::text(join)).await?;
        info!(table = %self.table, topic = %self.topic(), "Realtime channel joining");

        if resync {
            // Anything committed while we were away was missed.
            tx.send(FeedEvent::Resync).await?;
        }

        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    let beat = serde_json::to_string(&self.heartbeat_message())?;
                    ws_sender.send(Message::text(beat)).await?;
                }
                msg = ws_receiver.next() => match msg {
                    Some(Ok(Message::Text(text))) => match self.handle_text(text.as_str()) {
                        Inbound::Event(event) => tx.send(event).await?,
                        Inbound::Rejoin => {
                            let _ = ws_sender.send(Message::Close(None)).await;
                            return Ok(());
                        }
                        Inbound::Ignore => {}
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Err(e)) => return Err(e.into()),
                    _ => {}
                },
                _ = tx.closed() => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }

    fn handle_text(&self, text: &str) -> Inbound {
        let message = match serde_json::from_str::<PhoenixMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring unparseable realtime frame: {}", e);
                return Inbound::Ignore;
            }
        };

        match message.event.as_str() {
            "postgres_changes" => decode_change(message.payload, self.table)
                .map_or(Inbound::Ignore, |event| Inbound::Event(FeedEvent::Change(event))),
            "phx_reply" => {
                let status = message.payload.get("status").and_then(Value::as_str);
                if status != Some("ok") {
                    warn!(table = %self.table, payload = %message.payload, "Realtime request rejected");
                }
                Inbound::Ignore
            }
            "phx_error" | "phx_close" if message.topic == self.topic() => {
                warn!(table = %self.table, event = %message.event, "Realtime channel interrupted, rejoining");
                Inbound::Rejoin
            }
            _ => Inbound::Ignore,
        }
    }
}

/// Decodes a `postgres_changes` payload. A record that does not deserialize
/// into the row type is dropped, leaving a payload-less event.
pub(crate) fn decode_change(payload: Value, expected: Table) -> Option<ChangeEvent> {
    let ChangePayload { data } = match serde_json::from_value::<ChangePayload>(payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Malformed change payload: {}", e);
            return None;
        }
    };

    let table = Table::from_name(&data.table)?;
    if table != expected {
        return None;
    }

    let record = data.record.filter(|value| !is_empty_object(value)).and_then(|value| {
        let row = match table {
            Table::Sets => serde_json::from_value::<SetRow>(value).map(Row::Set),
            Table::Cards => serde_json::from_value::<CardRow>(value).map(Row::Card),
        };
        row.map_err(|e| debug!("Change record not decodable: {}", e)).ok()
    });

    let old_id = data
        .old_record
        .as_ref()
        .and_then(|old| old.get("id"))
        .and_then(|id| match id {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        });

    let commit_timestamp = data
        .commit_timestamp
        .as_deref()
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    Some(ChangeEvent { table, kind: data.kind, record, old_id, commit_timestamp })
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().map_or(false, |object| object.is_empty())
}
