//! WebSocket connection and event loop.
//!
//! This module owns the socket to the browser's DevTools endpoint and
//! demultiplexes everything that arrives on it.
//!
//! # Event Loop
//!
//! The connection spawns one tokio task that handles:
//!
//! - Incoming frames from the browser (responses, events)
//! - Outgoing commands queued by any number of callers
//! - Response correlation by command id
//! - Session teardown on target lifecycle events
//!
//! ```text
//! caller ──► correlation map ──► mpsc ──► event loop ──► socket
//!   ▲                                         │
//!   └────────── oneshot (by id) ◄─────────────┤
//!                broadcast (events) ◄─────────┘
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, client_async};
use tracing::{debug, error, trace, warn};

use crate::driver::ConnectionOptions;
use crate::error::{CDP_SESSION_NOT_FOUND, Error, Result};
use crate::identifiers::{CommandId, CommandIdGenerator, SessionId, TargetId};
use crate::protocol::{CommandEnvelope, Event, Incoming, ParsedEvent, ResponseEnvelope, decode};

use super::endpoint::Endpoint;

// ============================================================================
// Types
// ============================================================================

/// Map of command ids to waiting callers.
type CorrelationMap = FxHashMap<CommandId, PendingRequest>;

/// Attached sessions, keyed by session id.
type SessionTable = FxHashMap<SessionId, SessionEntry>;

/// Detach notices kept for sessions not registered yet.
const MAX_UNCLAIMED_DETACHES: usize = 64;

/// A caller waiting for its response.
struct PendingRequest {
    method: String,
    session_id: Option<SessionId>,
    response_tx: oneshot::Sender<Result<Value>>,
}

/// Bookkeeping for one attached session.
struct SessionEntry {
    target_id: TargetId,
    detached: Arc<AtomicBool>,
}

// ============================================================================
// Shared
// ============================================================================

/// State shared between the handles and the event loop.
struct Shared {
    correlation: Mutex<CorrelationMap>,
    sessions: Mutex<SessionTable>,
    /// Sessions detached before their attach response was handled, oldest
    /// first. Locked only while `sessions` is held.
    unclaimed_detaches: Mutex<VecDeque<SessionId>>,
    ids: CommandIdGenerator,
    /// Written only while `correlation` is locked.
    closed: AtomicBool,
    events: Mutex<Option<broadcast::Sender<Event>>>,
}

impl Shared {
    /// Marks the connection closed and fails every pending request.
    fn fail_pending(&self) {
        let pending: Vec<_> = {
            let mut correlation = self.correlation.lock();
            self.closed.store(true, Ordering::Release);
            correlation.drain().collect()
        };
        let count = pending.len();

        for (_, request) in pending {
            let _ = request.response_tx.send(Err(Error::ConnectionClosed));
        }

        {
            let mut sessions = self.sessions.lock();
            sessions.clear();
            self.unclaimed_detaches.lock().clear();
        }
        self.events.lock().take();

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }

    /// Detaches one session and fails its pending requests.
    ///
    /// An unknown session is remembered so a later registration of the same
    /// id starts detached.
    fn detach_session(&self, session_id: &SessionId) {
        {
            let mut sessions = self.sessions.lock();
            match sessions.remove(session_id) {
                Some(entry) => {
                    entry.detached.store(true, Ordering::Release);
                    debug!(%session_id, target_id = %entry.target_id, "Session detached");
                }
                None => {
                    let mut unclaimed = self.unclaimed_detaches.lock();
                    if unclaimed.len() == MAX_UNCLAIMED_DETACHES {
                        unclaimed.pop_front();
                    }
                    unclaimed.push_back(session_id.clone());
                    trace!(%session_id, "Detach for unregistered session");
                }
            }
        }
        self.fail_session_requests(session_id);
    }

    /// Detaches every session attached to a target.
    fn detach_target(&self, target_id: &TargetId) {
        let detached: Vec<SessionId> = self
            .sessions
            .lock()
            .extract_if(|_, entry| &entry.target_id == target_id)
            .map(|(session_id, entry)| {
                entry.detached.store(true, Ordering::Release);
                session_id
            })
            .collect();

        for session_id in &detached {
            debug!(%session_id, %target_id, "Session detached with its target");
            self.fail_session_requests(session_id);
        }
    }

    fn fail_session_requests(&self, session_id: &SessionId) {
        let failed: Vec<PendingRequest> = self
            .correlation
            .lock()
            .extract_if(|_, request| request.session_id.as_ref() == Some(session_id))
            .map(|(_, request)| request)
            .collect();

        for request in failed {
            trace!(method = %request.method, %session_id, "Failing request of detached session");
            let _ = request
                .response_tx
                .send(Err(Error::session_closed(session_id.clone())));
        }
    }
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write an encoded envelope. Its correlation entry already exists.
    Send { id: CommandId, text: String },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(CommandId),
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a browser's DevTools endpoint.
///
/// Handles command/response correlation, event fan-out and session
/// bookkeeping. Cloning is cheap; every clone drives the same socket.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. Any number of commands may be in flight
/// from any number of tasks.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// State shared with the event loop.
    shared: Arc<Shared>,
    /// Timeouts and limits.
    options: ConnectionOptions,
}

impl Connection {
    /// Dials a DevTools endpoint and performs the WebSocket handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `options` are invalid
    /// - [`Error::InvalidEndpoint`] if the endpoint is rejected
    /// - [`Error::Connection`] if the TCP connect or handshake fails
    /// - [`Error::ConnectionTimeout`] if either takes longer than `connect_timeout`
    pub async fn open(endpoint: &str, options: ConnectionOptions) -> Result<Self> {
        options.validate()?;
        let endpoint = Endpoint::parse(endpoint)?;
        let addr = endpoint.socket_addr();

        let handshake = async {
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|e| Error::connection(format!("connect to {addr} failed: {e}")))?;
            stream.set_nodelay(true)?;

            let (ws_stream, _response) = client_async(endpoint.as_str(), stream)
                .await
                .map_err(|e| Error::connection(format!("handshake with {endpoint} failed: {e}")))?;

            Ok::<_, Error>(ws_stream)
        };

        let ws_stream = timeout(options.connect_timeout, handshake)
            .await
            .map_err(|_| Error::connection_timeout(options.connect_timeout.as_millis() as u64))??;

        debug!(%endpoint, "Connected to DevTools endpoint");
        Ok(Self::from_stream(ws_stream, options))
    }

    /// Wraps an already-handshaken WebSocket.
    ///
    /// Zero timeouts or limits in `options` fall back to their defaults.
    /// Spawns the event loop task internally, so this must be called from
    /// within a tokio runtime.
    pub fn from_stream<S>(ws_stream: WebSocketStream<S>, options: ConnectionOptions) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let sanitized = options.sanitized();
        if sanitized != options {
            warn!(?options, "Replacing zero connection limits with defaults");
        }
        let options = sanitized;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(options.event_buffer);

        let shared = Arc::new(Shared {
            correlation: Mutex::new(CorrelationMap::default()),
            sessions: Mutex::new(SessionTable::default()),
            unclaimed_detaches: Mutex::new(VecDeque::new()),
            ids: CommandIdGenerator::new(),
            closed: AtomicBool::new(false),
            events: Mutex::new(Some(events_tx.clone())),
        });

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&shared),
            events_tx,
            options.max_malformed_messages,
        ));

        Self {
            command_tx,
            shared,
            options,
        }
    }

    /// Returns the options this connection was opened with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Sends a command and waits for its result with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::Cdp`] if the browser answers with an error object
    /// - [`Error::ConnectionClosed`] if the connection is closed
    /// - [`Error::SessionClosed`] if the session detaches while waiting
    /// - [`Error::RequestTimeout`] if no response arrives in time
    /// - [`Error::Protocol`] if too many requests are pending
    pub async fn send_command(
        &self,
        method: &str,
        params: Value,
        session_id: Option<SessionId>,
    ) -> Result<Value> {
        self.send_command_with_timeout(method, params, session_id, self.options.command_timeout)
            .await
    }

    /// Sends a command and waits for its result with a custom timeout.
    ///
    /// On timeout the correlation entry is dropped; a late response is then
    /// discarded as unknown.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn send_command_with_timeout(
        &self,
        method: &str,
        params: Value,
        session_id: Option<SessionId>,
        request_timeout: Duration,
    ) -> Result<Value> {
        let (response_tx, response_rx) = oneshot::channel();

        // Id allocation and enqueue happen under the correlation lock, so
        // ids reach the wire in increasing order.
        let id = {
            let mut correlation = self.shared.correlation.lock();

            if self.shared.closed.load(Ordering::Acquire) {
                return Err(Error::ConnectionClosed);
            }

            let max = self.options.max_pending_requests;
            if correlation.len() >= max {
                warn!(pending = correlation.len(), max, "Too many pending requests");
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    max
                )));
            }

            let id = self.shared.ids.next();
            let text = CommandEnvelope::new(id, method, params)
                .with_session(session_id.clone())
                .encode()?;

            self.command_tx
                .send(ConnectionCommand::Send { id, text })
                .map_err(|_| Error::ConnectionClosed)?;

            correlation.insert(
                id,
                PendingRequest {
                    method: method.to_string(),
                    session_id,
                    response_tx,
                },
            );
            id
        };

        trace!(%id, method, "Command queued");

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(id));

                Err(Error::request_timeout(
                    id,
                    method,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Subscribes to all events, across sessions.
    ///
    /// The receiver reports `Closed` once the connection is gone.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        match self.shared.events.lock().as_ref() {
            Some(tx) => tx.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.correlation.lock().len()
    }

    /// Returns `true` once the connection has been closed, locally or remotely.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Closes the connection.
    ///
    /// Every pending and future command fails with
    /// [`Error::ConnectionClosed`]. Safe to call more than once.
    pub fn close(&self) {
        self.shared.fail_pending();
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    // ========================================================================
    // Session Table
    // ========================================================================

    /// Registers an attached session.
    ///
    /// Returns the flag the reader sets when the session detaches. The flag
    /// starts set on a closed connection, or when the browser already
    /// reported this session detached.
    pub(crate) fn register_session(
        &self,
        session_id: SessionId,
        target_id: TargetId,
    ) -> Arc<AtomicBool> {
        let mut sessions = self.shared.sessions.lock();

        let already_detached = {
            let mut unclaimed = self.shared.unclaimed_detaches.lock();
            match unclaimed.iter().position(|id| id == &session_id) {
                Some(index) => {
                    unclaimed.remove(index);
                    true
                }
                None => false,
            }
        };

        if self.is_closed() || already_detached {
            debug!(%session_id, %target_id, "Session detached before registration");
            return Arc::new(AtomicBool::new(true));
        }

        let detached = Arc::new(AtomicBool::new(false));
        sessions.insert(
            session_id,
            SessionEntry {
                target_id,
                detached: Arc::clone(&detached),
            },
        );
        detached
    }

    /// Marks a session detached and fails its pending requests.
    pub(crate) fn detach_session(&self, session_id: &SessionId) {
        self.shared.detach_session(session_id);
    }

    /// Marks every session of a target detached.
    pub(crate) fn detach_target(&self, target_id: &TargetId) {
        self.shared.detach_target(target_id);
    }

    // ========================================================================
    // Event Loop
    // ========================================================================

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        shared: Arc<Shared>,
        events: broadcast::Sender<Event>,
        max_malformed: usize,
    ) where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut malformed = 0usize;

        loop {
            tokio::select! {
                // Incoming frames from the browser
                message = ws_read.next() => {
                    let text = match message {
                        Some(Ok(Message::Text(text))) => Some(text.to_string()),

                        Some(Ok(Message::Binary(bytes))) => {
                            String::from_utf8(bytes.to_vec()).ok()
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ping / Pong / raw frames
                        Some(Ok(_)) => continue,
                    };

                    let handled = match text {
                        Some(text) => Self::handle_incoming_message(&text, &shared, &events),
                        None => Err(Error::protocol("binary frame is not UTF-8")),
                    };

                    match handled {
                        Ok(()) => malformed = 0,
                        Err(e) => {
                            malformed += 1;
                            warn!(error = %e, malformed, "Skipping malformed message");

                            if malformed >= max_malformed {
                                error!(malformed, "Too many consecutive malformed messages, closing");
                                let _ = ws_write.close().await;
                                break;
                            }
                        }
                    }
                }

                // Commands from handles
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { id, text }) => {
                            Self::handle_send_command(id, text, &mut ws_write, &shared).await;
                        }

                        Some(ConnectionCommand::RemoveCorrelation(id)) => {
                            shared.correlation.lock().remove(&id);
                            debug!(%id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        shared.fail_pending();

        debug!("Event loop terminated");
    }

    /// Decodes one frame and dispatches it.
    fn handle_incoming_message(
        text: &str,
        shared: &Shared,
        events: &broadcast::Sender<Event>,
    ) -> Result<()> {
        match decode(text)? {
            Incoming::Response(response) => Self::handle_response(response, shared),
            Incoming::Event(event) => Self::handle_event(event, shared, events),
            Incoming::Malformed { id, reason } => {
                if let Some(request) = shared.correlation.lock().remove(&id) {
                    let _ = request
                        .response_tx
                        .send(Err(Error::protocol(format!("{reason} (id {id})"))));
                }
                return Err(Error::protocol(format!("{reason} (id {id})")));
            }
        }
        Ok(())
    }

    fn handle_response(response: ResponseEnvelope, shared: &Shared) {
        let id = response.id;
        let Some(request) = shared.correlation.lock().remove(&id) else {
            warn!(%id, "Response for unknown request");
            return;
        };

        let result = match (response.into_result(), &request.session_id) {
            (Err(e), Some(session_id)) if e.cdp_code() == Some(CDP_SESSION_NOT_FOUND) => {
                shared.detach_session(session_id);
                Err(Error::session_closed(session_id.clone()))
            }
            (result, _) => result,
        };

        trace!(%id, method = %request.method, ok = result.is_ok(), "Response received");
        let _ = request.response_tx.send(result);
    }

    fn handle_event(event: Event, shared: &Shared, events: &broadcast::Sender<Event>) {
        if event.domain() == "Target" {
            match event.parse() {
                ParsedEvent::TargetDetached { session_id } => shared.detach_session(&session_id),
                ParsedEvent::TargetDestroyed { target_id }
                | ParsedEvent::TargetCrashed { target_id, .. } => shared.detach_target(&target_id),
                _ => {}
            }
        }

        trace!(method = %event.method, session_id = ?event.session_id, "Event received");

        // Err only means nobody is subscribed.
        let _ = events.send(event);
    }

    /// Writes one encoded command.
    async fn handle_send_command<S>(
        id: CommandId,
        text: String,
        ws_write: &mut SplitSink<WebSocketStream<S>, Message>,
        shared: &Shared,
    ) where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
            if let Some(request) = shared.correlation.lock().remove(&id) {
                let _ = request.response_tx.send(Err(Error::connection(e.to_string())));
            }
            return;
        }

        trace!(%id, "Command sent");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::options::DEFAULT_MAX_MALFORMED_MESSAGES;
    use crate::transport::testing::{connected, connected_with};
    use serde_json::json;

    #[tokio::test]
    async fn test_ids_strictly_increase_on_the_wire() {
        let (connection, mut browser) = connected().await;

        let mut calls = Vec::new();
        for i in 0..5 {
            let connection = connection.clone();
            calls.push(tokio::spawn(async move {
                connection.send_command("Runtime.evaluate", json!({"expression": i.to_string()}), None).await
            }));
        }

        let mut last = 0;
        for _ in 0..5 {
            let command = browser.recv_command().await;
            let id = command["id"].as_u64().expect("id");
            assert!(id > last, "id {id} after {last}");
            last = id;
            browser.respond(id, json!({})).await;
        }

        for call in calls {
            call.await.expect("join").expect("result");
        }
    }

    #[tokio::test]
    async fn test_out_of_order_responses_reach_their_callers() {
        let (connection, mut browser) = connected().await;

        let mut calls = Vec::new();
        for i in 1..=3u64 {
            let connection = connection.clone();
            calls.push(tokio::spawn(async move {
                connection.send_command("Test.echo", json!({"n": i}), None).await
            }));
            // Keep wire order equal to spawn order.
            let command = browser.recv_command().await;
            assert_eq!(command["params"]["n"], i);
        }

        for id in [2u64, 3, 1] {
            browser.respond(id, json!({"answer": id})).await;
        }

        for (i, call) in calls.into_iter().enumerate() {
            let result = call.await.expect("join").expect("result");
            assert_eq!(result["answer"], i as u64 + 1);
        }
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_command_envelope_shape() {
        let (connection, mut browser) = connected().await;

        let call = tokio::spawn({
            let connection = connection.clone();
            async move {
                connection
                    .send_command("Page.navigate", json!({"url": "about:blank"}), Some(SessionId::new("S1")))
                    .await
            }
        });

        let command = browser.recv_command().await;
        assert_eq!(command["method"], "Page.navigate");
        assert_eq!(command["params"]["url"], "about:blank");
        assert_eq!(command["sessionId"], "S1");

        browser.respond(command["id"].as_u64().expect("id"), json!({"frameId": "F"})).await;
        assert_eq!(call.await.expect("join").expect("result")["frameId"], "F");
    }

    #[tokio::test]
    async fn test_unknown_and_duplicate_ids_are_dropped() {
        let (connection, mut browser) = connected().await;

        browser.respond(999, json!({})).await;

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Test.one", json!({}), None).await }
        });
        let id = browser.recv_command().await["id"].as_u64().expect("id");
        browser.respond(id, json!({"first": true})).await;
        browser.respond(id, json!({"first": false})).await;

        assert_eq!(call.await.expect("join").expect("result")["first"], true);

        // Still alive after the stray frames.
        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Test.two", json!({}), None).await }
        });
        let id = browser.recv_command().await["id"].as_u64().expect("id");
        browser.respond(id, json!({})).await;
        assert!(call.await.expect("join").is_ok());
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_error_response_is_cdp_error() {
        let (connection, mut browser) = connected().await;

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Page.navigate", json!({}), None).await }
        });
        let id = browser.recv_command().await["id"].as_u64().expect("id");
        browser.respond_error(id, -32602, "Invalid params").await;

        let err = call.await.expect("join").unwrap_err();
        assert!(matches!(
            err,
            Error::Cdp { code: -32602, ref message, .. } if message == "Invalid params"
        ));
    }

    #[tokio::test]
    async fn test_close_fails_pending_and_future_commands() {
        let (connection, mut browser) = connected().await;

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Test.slow", json!({}), None).await }
        });
        let _ = browser.recv_command().await;

        connection.close();

        assert!(matches!(call.await.expect("join"), Err(Error::ConnectionClosed)));
        assert!(connection.is_closed());
        assert!(matches!(
            connection.send_command("Test.after", json!({}), None).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_remote_close_fails_pending() {
        let (connection, mut browser) = connected().await;

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Test.slow", json!({}), None).await }
        });
        let _ = browser.recv_command().await;
        browser.close().await;

        assert!(matches!(call.await.expect("join"), Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_timeout_removes_correlation() {
        let (connection, mut browser) = connected().await;

        let result = tokio::join!(
            connection.send_command_with_timeout("Test.never", json!({}), None, Duration::from_millis(50)),
            browser.recv_command(),
        )
        .0;

        assert!(matches!(
            result,
            Err(Error::RequestTimeout { ref method, timeout_ms: 50, .. }) if method == "Test.never"
        ));

        // The late answer is ignored.
        browser.respond(1, json!({})).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(connection.pending_count(), 0);
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_pending_limit() {
        let options = ConnectionOptions::new().with_max_pending_requests(1);
        let (connection, mut browser) = connected_with(options).await;

        let first = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Test.one", json!({}), None).await }
        });
        let id = browser.recv_command().await["id"].as_u64().expect("id");

        assert!(matches!(
            connection.send_command("Test.two", json!({}), None).await,
            Err(Error::Protocol { .. })
        ));

        browser.respond(id, json!({})).await;
        assert!(first.await.expect("join").is_ok());
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let (connection, mut browser) = connected().await;
        let mut events = connection.subscribe();

        browser
            .send_json(json!({"method": "Page.loadEventFired", "params": {"timestamp": 1.5}, "sessionId": "S1"}))
            .await;

        let event = events.recv().await.expect("event");
        assert_eq!(event.method, "Page.loadEventFired");
        assert_eq!(event.session_id, Some(SessionId::new("S1")));
    }

    #[tokio::test]
    async fn test_malformed_messages_are_skipped() {
        let (connection, mut browser) = connected().await;
        let mut events = connection.subscribe();

        browser.send_raw("not json").await;
        browser.send_raw(r#"{"params": {}}"#).await;
        browser.send_json(json!({"method": "Page.domContentEventFired"})).await;

        assert_eq!(events.recv().await.expect("event").method, "Page.domContentEventFired");
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_response_with_both_result_and_error_fails_caller() {
        let (connection, mut browser) = connected().await;

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Test.both", json!({}), None).await }
        });
        let id = browser.recv_command().await["id"].as_u64().expect("id");
        browser
            .send_json(json!({"id": id, "result": {}, "error": {"code": -1, "message": "x"}}))
            .await;

        assert!(matches!(call.await.expect("join"), Err(Error::Protocol { .. })));
        assert_eq!(connection.pending_count(), 0);
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_response_without_result_or_error_fails_caller() {
        let (connection, mut browser) = connected().await;

        let call = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Test.neither", json!({}), None).await }
        });
        let id = browser.recv_command().await["id"].as_u64().expect("id");
        browser.send_json(json!({"id": id})).await;

        assert!(matches!(call.await.expect("join"), Err(Error::Protocol { .. })));
        assert!(!connection.is_closed());
    }

    #[tokio::test]
    async fn test_badly_shaped_responses_count_as_malformed() {
        let options = ConnectionOptions::new().with_max_malformed_messages(2);
        let (connection, mut browser) = connected_with(options).await;
        let mut events = connection.subscribe();

        browser.send_json(json!({"id": 50})).await;
        browser
            .send_json(json!({"id": 51, "result": {}, "error": {"code": -1, "message": "x"}}))
            .await;

        assert!(matches!(
            events.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(connection.is_closed());
    }

    #[tokio::test]
    async fn test_zero_malformed_limit_tolerates_one_bad_frame() {
        let options = ConnectionOptions::new().with_max_malformed_messages(0);
        let (connection, mut browser) = connected_with(options).await;
        let mut events = connection.subscribe();

        browser.send_raw("{broken").await;
        browser.send_json(json!({"method": "Page.loadEventFired"})).await;

        assert_eq!(events.recv().await.expect("event").method, "Page.loadEventFired");
        assert!(!connection.is_closed());
        assert_eq!(connection.options().max_malformed_messages, DEFAULT_MAX_MALFORMED_MESSAGES);
    }

    #[tokio::test]
    async fn test_detach_before_register_starts_detached() {
        let (connection, mut browser) = connected().await;
        let mut events = connection.subscribe();

        browser
            .send_json(json!({
                "method": "Target.detachedFromTarget",
                "params": {"sessionId": "S7", "targetId": "T7"}
            }))
            .await;
        let _ = events.recv().await.expect("event");

        let detached = connection.register_session(SessionId::new("S7"), TargetId::new("T7"));
        assert!(detached.load(Ordering::Acquire));

        // The record is consumed; a later attach of the same id is live.
        let again = connection.register_session(SessionId::new("S7"), TargetId::new("T7"));
        assert!(!again.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_repeated_malformed_messages_close_connection() {
        let options = ConnectionOptions::new().with_max_malformed_messages(16);
        let (connection, mut browser) = connected_with(options).await;
        let mut events = connection.subscribe();

        for _ in 0..16 {
            browser.send_raw("{broken").await;
        }

        assert!(matches!(
            events.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
        assert!(connection.is_closed());
    }

    #[tokio::test]
    async fn test_detach_event_fails_session_requests() {
        let (connection, mut browser) = connected().await;
        let detached = connection.register_session(SessionId::new("S1"), TargetId::new("T1"));

        let scoped = tokio::spawn({
            let connection = connection.clone();
            async move {
                connection
                    .send_command("Runtime.evaluate", json!({}), Some(SessionId::new("S1")))
                    .await
            }
        });
        let _ = browser.recv_command().await;

        let unscoped = tokio::spawn({
            let connection = connection.clone();
            async move { connection.send_command("Target.getTargets", json!({}), None).await }
        });
        let unscoped_id = browser.recv_command().await["id"].as_u64().expect("id");

        browser
            .send_json(json!({
                "method": "Target.detachedFromTarget",
                "params": {"sessionId": "S1", "targetId": "T1"}
            }))
            .await;

        assert!(matches!(
            scoped.await.expect("join"),
            Err(Error::SessionClosed { session_id }) if session_id.as_str() == "S1"
        ));
        assert!(detached.load(Ordering::Acquire));

        browser.respond(unscoped_id, json!({"targetInfos": []})).await;
        assert!(unscoped.await.expect("join").is_ok());
    }

    #[tokio::test]
    async fn test_target_destroyed_detaches_its_sessions() {
        let (connection, mut browser) = connected().await;
        let a = connection.register_session(SessionId::new("A"), TargetId::new("T1"));
        let b = connection.register_session(SessionId::new("B"), TargetId::new("T2"));

        let mut events = connection.subscribe();
        browser
            .send_json(json!({"method": "Target.targetDestroyed", "params": {"targetId": "T1"}}))
            .await;
        let _ = events.recv().await.expect("event");

        assert!(a.load(Ordering::Acquire));
        assert!(!b.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_session_not_found_error_detaches() {
        let (connection, mut browser) = connected().await;
        let detached = connection.register_session(SessionId::new("S9"), TargetId::new("T9"));

        let call = tokio::spawn({
            let connection = connection.clone();
            async move {
                connection
                    .send_command("Runtime.evaluate", json!({}), Some(SessionId::new("S9")))
                    .await
            }
        });
        let id = browser.recv_command().await["id"].as_u64().expect("id");
        browser
            .respond_error(id, CDP_SESSION_NOT_FOUND, "Session with given id not found.")
            .await;

        assert!(matches!(call.await.expect("join"), Err(Error::SessionClosed { .. })));
        assert!(detached.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_open_rejects_bad_endpoint_without_dialing() {
        let err = Connection::open("wss://127.0.0.1:1/devtools/browser/x", ConnectionOptions::new())
            .await
            .err()
            .expect("must fail");
        assert!(matches!(err, Error::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn test_open_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let endpoint = format!("ws://127.0.0.1:{port}/devtools/browser/x");
        let err = Connection::open(&endpoint, ConnectionOptions::new())
            .await
            .err()
            .expect("must fail");
        assert!(err.is_connection_error());
    }
}
