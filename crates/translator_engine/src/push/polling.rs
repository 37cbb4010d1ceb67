use std::time::Duration;

use url::Url;
use serde_json::json;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use engine_logging::{engine_debug, engine_info, engine_warn};

use super::packet::{decode_payload, encode_event, Handshake, Packet, CLOSE, CONNECT, PONG};
use super::{PushError, PushEvent, PushTransport};
use crate::sink::EventSink;
use crate::EngineEvent;

#[derive(Debug, Clone)]
pub struct PushSettings {
    /// Server origin, e.g. `http://localhost:5001`.
    pub url: String,
    pub path: String,
    pub connect_timeout: Duration,
    /// Upper bound for one long-poll request; must exceed the server's
    /// ping interval.
    pub poll_timeout: Duration,
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5001".to_string(),
            path: "/socket.io/".to_string(),
            connect_timeout: Duration::from_secs(10),
            poll_timeout: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
        }
    }
}

/// How a session ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Cancelled,
    ClosedByServer,
    /// The join target moved to another task. Rooms cannot be left, so the
    /// session is closed and a fresh one joins the new task.
    TaskChanged,
}

/// Socket.IO client over Engine.IO HTTP long-polling.
#[derive(Debug, Clone)]
pub struct PollingTransport {
    settings: PushSettings,
    client: reqwest::Client,
}

impl PollingTransport {
    pub fn new(settings: PushSettings) -> Result<Self, PushError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.poll_timeout)
            .build()
            .map_err(|err| PushError::Http(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, sid: Option<&str>) -> Result<Url, PushError> {
        let mut url = Url::parse(&self.settings.url)
            .and_then(|base| base.join(&self.settings.path))
            .map_err(|err| PushError::InvalidUrl(err.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("EIO", "4");
            query.append_pair("transport", "polling");
            if let Some(sid) = sid {
                query.append_pair("sid", sid);
            }
        }
        Ok(url)
    }

    async fn poll(&self, sid: Option<&str>) -> Result<String, PushError> {
        let response = self
            .client
            .get(self.endpoint(sid)?)
            .send()
            .await
            .map_err(|err| PushError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PushError::Http(format!("poll returned {}", response.status())));
        }
        response
            .text()
            .await
            .map_err(|err| PushError::Http(err.to_string()))
    }

    async fn send(&self, sid: &str, packet: String) -> Result<(), PushError> {
        let response = self
            .client
            .post(self.endpoint(Some(sid))?)
            .header(reqwest::header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(packet)
            .send()
            .await
            .map_err(|err| PushError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PushError::Http(format!("send returned {}", response.status())));
        }
        Ok(())
    }

    async fn send_join(&self, sid: &str, task_id: &str) -> Result<(), PushError> {
        engine_info!("Joining notifications for task {}", task_id);
        self.send(sid, encode_event("join", &json!({ "task_id": task_id })))
            .await
    }

    /// Open an Engine.IO session and request the default namespace.
    pub async fn open(&self) -> Result<Handshake, PushError> {
        let body = self.poll(None).await?;
        let handshake = match decode_payload(&body).into_iter().next() {
            Some(Ok(Packet::Open(handshake))) => handshake,
            Some(Err(err)) => return Err(err),
            _ => return Err(PushError::Handshake(format!("unexpected open payload {body:?}"))),
        };
        self.send(&handshake.sid, CONNECT.to_string()).await?;
        Ok(handshake)
    }

    /// Drive one session until it is cancelled, closed, or fails. The join is
    /// sent once the namespace connect is acknowledged; a session only ever
    /// joins one task.
    pub async fn run_session(
        &self,
        handshake: &Handshake,
        joins: &mut watch::Receiver<Option<String>>,
        cancel: &CancellationToken,
        sink: &dyn EventSink,
    ) -> Result<SessionEnd, PushError> {
        let sid = handshake.sid.as_str();
        let mut connected = false;
        let mut joined: Option<String> = None;
        loop {
            let poll = self.poll(Some(sid));
            tokio::pin!(poll);
            let body = loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = self.send(sid, CLOSE.to_string()).await;
                        return Ok(SessionEnd::Cancelled);
                    }
                    changed = joins.changed() => {
                        if changed.is_err() {
                            return Ok(SessionEnd::Cancelled);
                        }
                        let task_id = joins.borrow_and_update().clone();
                        if joined.is_some() && task_id != joined {
                            engine_info!("Leaving push session {} for task {:?}", sid, task_id);
                            let _ = self.send(sid, CLOSE.to_string()).await;
                            return Ok(SessionEnd::TaskChanged);
                        }
                        if connected && joined.is_none() {
                            if let Some(task_id) = task_id {
                                self.send_join(sid, &task_id).await?;
                                joined = Some(task_id);
                            }
                        }
                    }
                    body = &mut poll => break body?,
                }
            };

            for packet in decode_payload(&body) {
                match packet {
                    Ok(Packet::Ping) => self.send(sid, PONG.to_string()).await?,
                    Ok(Packet::Connect) => {
                        connected = true;
                        sink.emit(EngineEvent::Push(PushEvent::Connected));
                        let task_id = joins.borrow_and_update().clone();
                        if let Some(task_id) = task_id {
                            self.send_join(sid, &task_id).await?;
                            joined = Some(task_id);
                        }
                    }
                    Ok(Packet::Event { name, payload }) => {
                        match PushEvent::from_event(&name, payload) {
                            Ok(Some(event)) => sink.emit(EngineEvent::Push(event)),
                            Ok(None) => engine_debug!("Ignoring push event {}", name),
                            Err(err) => engine_warn!("Dropping push event: {}", err),
                        }
                    }
                    Ok(Packet::Close) | Ok(Packet::Disconnect) => {
                        return Ok(SessionEnd::ClosedByServer);
                    }
                    Ok(Packet::ConnectError(message)) => {
                        return Err(PushError::Handshake(message));
                    }
                    Ok(Packet::Open(_)) | Ok(Packet::Pong) | Ok(Packet::Noop) => {}
                    Ok(Packet::Unsupported(raw)) => engine_debug!("Unsupported packet {:?}", raw),
                    Err(err) => engine_warn!("{}", err),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl PushTransport for PollingTransport {
    async fn run(
        &self,
        mut joins: watch::Receiver<Option<String>>,
        cancel: CancellationToken,
        sink: &dyn EventSink,
    ) {
        let mut delay = self.settings.reconnect_delay;
        while !cancel.is_cancelled() {
            match self.open().await {
                Ok(handshake) => {
                    engine_info!("Push session {} opened", handshake.sid);
                    delay = self.settings.reconnect_delay;
                    match self.run_session(&handshake, &mut joins, &cancel, sink).await {
                        Ok(SessionEnd::TaskChanged) => continue,
                        Ok(SessionEnd::Cancelled) => {
                            sink.emit(EngineEvent::Push(PushEvent::Disconnected));
                            break;
                        }
                        Ok(SessionEnd::ClosedByServer) => {
                            sink.emit(EngineEvent::Push(PushEvent::Disconnected));
                            engine_info!("Push session closed by server");
                        }
                        Err(err) => {
                            sink.emit(EngineEvent::Push(PushEvent::Disconnected));
                            engine_warn!("Push session lost: {}", err);
                        }
                    }
                }
                Err(err) => engine_warn!("Push connect failed: {}", err),
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = (delay * 2).min(self.settings.max_reconnect_delay);
        }
        engine_debug!("Push transport stopped");
    }
}
