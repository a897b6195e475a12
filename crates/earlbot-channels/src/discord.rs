//! Discord channel — raw Gateway WebSocket for receiving, REST for sending.
//!
//! - Gateway v10 with heartbeat, zombie detection and session resume
//! - Ignores bot authors (including ourselves) and users outside the
//!   allow-list
//! - Private replies go through a DM channel opened once per user
//! - Replies over 2000 characters are split at line boundaries
//! - HTTP 429 is retried after the advertised `retry_after`

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use earlbot_core::bus::{InboundMessage, MessageBus, OutboundMessage};
use earlbot_core::config::schema::DiscordConfig;
use earlbot_core::error::TransportError;

use crate::base::Channel;

// ─────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";
const GATEWAY_QUERY: &str = "?v=10&encoding=json";

/// Discord message length limit, in characters.
pub const DISCORD_MAX_LEN: usize = 2000;

/// GUILDS(1) + GUILD_MESSAGES(512) + DIRECT_MESSAGES(4096) + MESSAGE_CONTENT(32768).
const DEFAULT_INTENTS: u64 = 1 + 512 + 4096 + 32768;

/// Attempts per REST call when rate limited.
const MAX_SEND_ATTEMPTS: u32 = 5;
const MAX_RETRY_AFTER_SECS: f64 = 60.0;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);
const ERROR_RECONNECT_DELAY: Duration = Duration::from_secs(5);

// Gateway opcodes
const OP_DISPATCH: u64 = 0;
const OP_HEARTBEAT: u64 = 1;
const OP_IDENTIFY: u64 = 2;
const OP_RESUME: u64 = 6;
const OP_RECONNECT: u64 = 7;
const OP_INVALID_SESSION: u64 = 9;
const OP_HELLO: u64 = 10;
const OP_HEARTBEAT_ACK: u64 = 11;

// Gateway close codes that end the channel: authentication failed, invalid
// shard, sharding required, invalid API version, invalid or disallowed intents.
const FATAL_CLOSE_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];
// Close codes after which the old session cannot be resumed.
const SESSION_RESET_CLOSE_CODES: [u16; 2] = [4007, 4009];

/// How a gateway session ended.
#[derive(Debug, PartialEq, Eq)]
enum GatewayExit {
    Shutdown,
    Reconnect,
    /// Closed with a code that reconnecting cannot fix.
    Fatal { code: u16, reason: String },
}

// ─────────────────────────────────────────────
// DiscordChannel
// ─────────────────────────────────────────────

pub struct DiscordChannel {
    token: String,
    bus: Arc<MessageBus>,
    config: DiscordConfig,
    api_base: String,
    gateway_url: String,
    intents: u64,
    http: reqwest::Client,
    stopping: AtomicBool,
    shutdown: Notify,
    seq: Arc<Mutex<Option<u64>>>,
    heartbeat_acked: Arc<AtomicBool>,
    session_id: Mutex<Option<String>>,
    resume_url: Mutex<Option<String>>,
    /// Our own user id, learned from READY.
    bot_user_id: RwLock<Option<String>>,
    /// DM channel id per recipient user id.
    dm_channels: Mutex<HashMap<String, String>>,
}

impl DiscordChannel {
    pub fn new(config: &DiscordConfig, bus: Arc<MessageBus>) -> Self {
        Self {
            token: config.token.clone(),
            bus,
            config: config.clone(),
            api_base: DISCORD_API_BASE.into(),
            gateway_url: DEFAULT_GATEWAY_URL.into(),
            intents: DEFAULT_INTENTS,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            stopping: AtomicBool::new(false),
            shutdown: Notify::new(),
            seq: Arc::new(Mutex::new(None)),
            heartbeat_acked: Arc::new(AtomicBool::new(true)),
            session_id: Mutex::new(None),
            resume_url: Mutex::new(None),
            bot_user_id: RwLock::new(None),
            dm_channels: Mutex::new(HashMap::new()),
        }
    }

    /// Point REST calls at another base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    // ── Gateway ──────────────────────────────

    /// Run gateway sessions until `stop()`, reconnecting as needed.
    async fn run_gateway(&self) -> Result<(), TransportError> {
        while !self.stopping.load(Ordering::SeqCst) {
            let delay = match self.gateway_session().await {
                Ok(GatewayExit::Shutdown) => break,
                Ok(GatewayExit::Fatal { code, reason }) => {
                    error!(code, reason = %reason, "discord gateway refused the session, giving up");
                    return Err(TransportError::Rejected(format!(
                        "discord gateway closed with code {code}: {reason}"
                    )));
                }
                Ok(GatewayExit::Reconnect) => {
                    info!("discord gateway reconnecting");
                    RECONNECT_DELAY
                }
                Err(e) => {
                    warn!(error = %e, "discord gateway error, reconnecting in 5s");
                    ERROR_RECONNECT_DELAY
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.notified() => break,
            }
        }
        Ok(())
    }

    async fn gateway_session(&self) -> Result<GatewayExit, TransportError> {
        let url = match self.resume_url.lock().await.as_deref() {
            Some(resume) => format!("{}/{GATEWAY_QUERY}", resume.trim_end_matches('/')),
            None => self.gateway_url.clone(),
        };

        debug!(url = %url, "connecting to discord gateway");
        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let (mut sink, mut stream) = ws_stream.split();

        // All writes go through one task so the heartbeat can share the socket.
        let (out_tx, mut out_rx) = mpsc::channel::<WsMessage>(16);
        let writer = tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = sink.send(frame).await {
                    warn!(error = %e, "discord ws write error");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let mut heartbeat: Option<JoinHandle<()>> = None;

        let exit = loop {
            if self.stopping.load(Ordering::SeqCst) {
                let _ = out_tx.send(WsMessage::Close(None)).await;
                break Ok(GatewayExit::Shutdown);
            }

            let frame = tokio::select! {
                frame = stream.next() => frame,
                _ = self.shutdown.notified() => {
                    let _ = out_tx.send(WsMessage::Close(None)).await;
                    break Ok(GatewayExit::Shutdown);
                }
            };

            let text = match frame {
                Some(Ok(WsMessage::Text(t))) => t.to_string(),
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.as_str().to_string()))
                        .unwrap_or((1000, String::new()));
                    info!(code, reason = %reason, "discord gateway closed the connection");
                    if SESSION_RESET_CLOSE_CODES.contains(&code) {
                        *self.session_id.lock().await = None;
                        *self.resume_url.lock().await = None;
                    }
                    break Ok(close_exit(code, reason));
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => break Err(TransportError::Network(e.to_string())),
                None => {
                    debug!("discord ws stream ended");
                    break Ok(GatewayExit::Reconnect);
                }
            };

            let payload: Value = match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "discord gateway sent invalid json");
                    continue;
                }
            };

            if let Some(s) = payload["s"].as_u64() {
                *self.seq.lock().await = Some(s);
            }

            match payload["op"].as_u64().unwrap_or(u64::MAX) {
                OP_HELLO => {
                    let interval = payload["d"]["heartbeat_interval"].as_u64().unwrap_or(41_250);
                    debug!(interval_ms = interval, "discord HELLO");

                    if let Some(h) = heartbeat.take() {
                        h.abort();
                    }
                    self.heartbeat_acked.store(true, Ordering::SeqCst);
                    heartbeat = Some(self.spawn_heartbeat(interval, out_tx.clone()));

                    let handshake = self.handshake_frame().await;
                    if out_tx.send(WsMessage::text(handshake)).await.is_err() {
                        break Err(TransportError::Network("gateway writer closed".into()));
                    }
                }
                OP_HEARTBEAT_ACK => self.heartbeat_acked.store(true, Ordering::SeqCst),
                OP_HEARTBEAT => {
                    let frame = heartbeat_frame(*self.seq.lock().await);
                    let _ = out_tx.send(WsMessage::text(frame)).await;
                }
                OP_DISPATCH => {
                    let event = payload["t"].as_str().unwrap_or("");
                    self.handle_dispatch(event, &payload["d"]).await;
                }
                OP_RECONNECT => {
                    info!("discord requested a reconnect");
                    break Ok(GatewayExit::Reconnect);
                }
                OP_INVALID_SESSION => {
                    let resumable = payload["d"].as_bool().unwrap_or(false);
                    warn!(resumable, "discord invalid session");
                    if !resumable {
                        *self.session_id.lock().await = None;
                        *self.resume_url.lock().await = None;
                    }
                    break Ok(GatewayExit::Reconnect);
                }
                op => debug!(op, "discord gateway opcode ignored"),
            }
        };

        if let Some(h) = heartbeat {
            h.abort();
        }
        drop(out_tx);
        let _ = tokio::time::timeout(Duration::from_secs(2), writer).await;

        exit
    }

    fn spawn_heartbeat(&self, interval_ms: u64, out: mpsc::Sender<WsMessage>) -> JoinHandle<()> {
        let seq = Arc::clone(&self.seq);
        let acked = Arc::clone(&self.heartbeat_acked);

        tokio::spawn(async move {
            let first = (interval_ms as f64 * jitter()) as u64;
            tokio::time::sleep(Duration::from_millis(first)).await;

            loop {
                if !acked.swap(false, Ordering::SeqCst) {
                    warn!("discord heartbeat not acknowledged, closing connection");
                    let _ = out.send(WsMessage::Close(None)).await;
                    break;
                }

                let frame = heartbeat_frame(*seq.lock().await);
                if out.send(WsMessage::text(frame)).await.is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        })
    }

    /// RESUME when we hold a session, IDENTIFY otherwise.
    async fn handshake_frame(&self) -> String {
        let session = self.session_id.lock().await.clone();
        match session {
            Some(session_id) => {
                debug!("resuming discord session");
                resume_frame(&self.token, &session_id, *self.seq.lock().await)
            }
            None => identify_frame(&self.token, self.intents),
        }
    }

    async fn handle_dispatch(&self, event: &str, data: &Value) {
        match event {
            "READY" => {
                if let Some(sid) = data["session_id"].as_str() {
                    *self.session_id.lock().await = Some(sid.to_string());
                }
                if let Some(url) = data["resume_gateway_url"].as_str() {
                    *self.resume_url.lock().await = Some(url.to_string());
                }
                if let Some(id) = data["user"]["id"].as_str() {
                    *self.bot_user_id.write().await = Some(id.to_string());
                }
                let user = data["user"]["username"].as_str().unwrap_or("unknown");
                info!(user, "discord bot is live");
            }
            "RESUMED" => info!("discord session resumed"),
            "MESSAGE_CREATE" => self.handle_message_create(data).await,
            _ => debug!(event, "discord event ignored"),
        }
    }

    async fn handle_message_create(&self, data: &Value) {
        let author = &data["author"];
        if author["bot"].as_bool().unwrap_or(false) {
            return;
        }
        let Some(sender_id) = author["id"].as_str() else {
            return;
        };
        if self.bot_user_id.read().await.as_deref() == Some(sender_id) {
            return;
        }
        let Some(channel_id) = data["channel_id"].as_str() else {
            return;
        };

        if !self.config.is_allowed(sender_id) {
            warn!(sender = %sender_id, channel = %channel_id, "discord user not in allow-list, ignoring");
            return;
        }

        let content = data["content"].as_str().unwrap_or("");
        if content.trim().is_empty() {
            debug!(sender = %sender_id, "discord message without text, ignoring");
            return;
        }

        let mut inbound = InboundMessage::new("discord", sender_id, channel_id, content);
        if let Some(username) = author["username"].as_str() {
            inbound.metadata.insert("username".into(), username.to_string());
        }
        if let Some(message_id) = data["id"].as_str() {
            inbound.metadata.insert("message_id".into(), message_id.to_string());
        }
        if let Some(guild_id) = data["guild_id"].as_str() {
            inbound.metadata.insert("guild_id".into(), guild_id.to_string());
        }

        if let Err(e) = self.bus.publish_inbound(inbound).await {
            error!(error = %e, "failed to publish discord message to bus");
        }
    }

    // ── REST ─────────────────────────────────

    /// POST a JSON body, retrying while rate limited.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        let url = format!("{}{path}", self.api_base);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let resp = self
                .http
                .post(&url)
                .header("Authorization", format!("Bot {}", self.token))
                .json(body)
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;

            let status = resp.status();
            if status.is_success() {
                return Ok(resp.json::<Value>().await.unwrap_or(Value::Null));
            }

            let text = resp.text().await.unwrap_or_default();
            if status.as_u16() == 429 && attempt < MAX_SEND_ATTEMPTS {
                let wait = retry_after(&text);
                warn!(retry_after_ms = wait.as_millis() as u64, attempt, "discord rate limited");
                tokio::time::sleep(wait).await;
                continue;
            }

            return Err(TransportError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
    }

    /// DM channel for `user_id`, opened on first use.
    async fn dm_channel(&self, user_id: &str) -> Result<String, TransportError> {
        if let Some(id) = self.dm_channels.lock().await.get(user_id) {
            return Ok(id.clone());
        }

        let created = self
            .post_json("/users/@me/channels", &json!({ "recipient_id": user_id }))
            .await?;
        let id = created["id"]
            .as_str()
            .ok_or_else(|| TransportError::Rejected("DM channel response has no id".into()))?
            .to_string();

        debug!(user = %user_id, dm_channel = %id, "opened discord DM channel");
        self.dm_channels
            .lock()
            .await
            .insert(user_id.to_string(), id.clone());
        Ok(id)
    }
}

/// Split `text` into chunks of at most `max_chars` characters, preferring
/// to break after a newline.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut remaining = text;

    while let Some((limit, _)) = remaining.char_indices().nth(max_chars) {
        let split_at = remaining[..limit].rfind('\n').map_or(limit, |i| i + 1);
        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }
    if !remaining.is_empty() || chunks.is_empty() {
        chunks.push(remaining.to_string());
    }
    chunks
}

fn heartbeat_frame(seq: Option<u64>) -> String {
    json!({ "op": OP_HEARTBEAT, "d": seq }).to_string()
}

fn identify_frame(token: &str, intents: u64) -> String {
    json!({
        "op": OP_IDENTIFY,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "earlbot",
                "device": "earlbot"
            }
        }
    })
    .to_string()
}

fn resume_frame(token: &str, session_id: &str, seq: Option<u64>) -> String {
    json!({
        "op": OP_RESUME,
        "d": { "token": token, "session_id": session_id, "seq": seq }
    })
    .to_string()
}

/// Wait advertised by a 429 body, clamped.
fn retry_after(body: &str) -> Duration {
    let secs = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["retry_after"].as_f64())
        .filter(|s| s.is_finite())
        .unwrap_or(1.0)
        .clamp(0.0, MAX_RETRY_AFTER_SECS);
    Duration::from_secs_f64(secs)
}

/// Classify a gateway close frame.
fn close_exit(code: u16, reason: String) -> GatewayExit {
    if FATAL_CLOSE_CODES.contains(&code) {
        GatewayExit::Fatal { code, reason }
    } else {
        GatewayExit::Reconnect
    }
}

/// Fraction in [0, 1) for the first heartbeat delay.
fn jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    f64::from(nanos) / 1_000_000_000.0
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> Result<(), TransportError> {
        if self.token.is_empty() {
            return Err(TransportError::Rejected("discord token is empty".into()));
        }
        info!("starting discord channel (gateway v10)");
        self.run_gateway().await
    }

    async fn stop(&self) -> Result<(), TransportError> {
        info!("stopping discord channel");
        self.stopping.store(true, Ordering::SeqCst);
        self.shutdown.notify_waiters();
        Ok(())
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<(), TransportError> {
        if msg.content.trim().is_empty() {
            return Err(TransportError::Rejected("empty message".into()));
        }

        let (target, reply_to) = if msg.is_private() {
            if msg.recipient_id.is_empty() {
                return Err(TransportError::Rejected("private reply has no recipient".into()));
            }
            (self.dm_channel(&msg.recipient_id).await?, None)
        } else {
            (msg.chat_id.clone(), msg.metadata.get("reply_to"))
        };

        let chunks = split_message(&msg.content, DISCORD_MAX_LEN);
        let path = format!("/channels/{target}/messages");
        for (i, chunk) in chunks.iter().enumerate() {
            let mut body = json!({ "content": chunk });
            if let (0, Some(message_id)) = (i, reply_to) {
                body["message_reference"] = json!({ "message_id": message_id });
                body["allowed_mentions"] = json!({ "replied_user": false });
            }
            self.post_json(&path, &body).await?;
        }

        debug!(
            chat_id = %msg.chat_id,
            private = msg.is_private(),
            chunks = chunks.len(),
            "discord message sent"
        );
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
