//! In-process fake browser for tests.
//!
//! A [`Connection`] and a server-side WebSocket joined over an in-memory
//! duplex pipe, so tests script the browser side frame by frame.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{DuplexStream, duplex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async, client_async};

use crate::driver::ConnectionOptions;

use super::Connection;

/// Browser side of a test connection.
pub(crate) struct FakeBrowser {
    ws: WebSocketStream<DuplexStream>,
}

/// Connects with default options.
pub(crate) async fn connected() -> (Connection, FakeBrowser) {
    connected_with(ConnectionOptions::new()).await
}

/// Connects with custom options.
pub(crate) async fn connected_with(options: ConnectionOptions) -> (Connection, FakeBrowser) {
    let (client_io, server_io) = duplex(64 * 1024);

    let (client, server) = tokio::join!(
        client_async("ws://127.0.0.1:9222/devtools/browser/test", client_io),
        accept_async(server_io),
    );
    let (client_ws, _response) = client.expect("client handshake");
    let server_ws = server.expect("server handshake");

    (
        Connection::from_stream(client_ws, options),
        FakeBrowser { ws: server_ws },
    )
}

impl FakeBrowser {
    /// Waits for the next command frame.
    pub(crate) async fn recv_command(&mut self) -> Value {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).expect("command is JSON");
                }
                Some(Ok(_)) => continue,
                other => panic!("connection ended while waiting for a command: {other:?}"),
            }
        }
    }

    pub(crate) async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("send frame");
    }

    pub(crate) async fn send_json(&mut self, value: Value) {
        self.send_raw(&value.to_string()).await;
    }

    pub(crate) async fn respond(&mut self, id: u64, result: Value) {
        self.send_json(json!({"id": id, "result": result})).await;
    }

    pub(crate) async fn respond_error(&mut self, id: u64, code: i64, message: &str) {
        self.send_json(json!({"id": id, "error": {"code": code, "message": message}}))
            .await;
    }

    pub(crate) async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }

    /// Answers every command with `handler(method, params, session_id)`.
    ///
    /// `Err((code, message))` is sent as a CDP error object. Runs until the
    /// connection closes.
    pub(crate) fn serve<F>(mut self, mut handler: F) -> JoinHandle<()>
    where
        F: FnMut(&str, &Value, Option<&str>) -> Result<Value, (i64, String)> + Send + 'static,
    {
        tokio::spawn(async move {
            loop {
                let command = match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => {
                        serde_json::from_str::<Value>(text.as_str()).expect("command is JSON")
                    }
                    Some(Ok(_)) => continue,
                    _ => return,
                };

                let id = command["id"].as_u64().expect("command id");
                let method = command["method"].as_str().unwrap_or_default();
                let session = command.get("sessionId").and_then(Value::as_str);

                match handler(method, &command["params"], session) {
                    Ok(result) => self.respond(id, result).await,
                    Err((code, message)) => self.respond_error(id, code, &message).await,
                }
            }
        })
    }
}
