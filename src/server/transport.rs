//! Line framing between the client's byte stream and the rmcp service.
//!
//! ```text
//! reader ──▶ gate ──▶ pipe ──▶ rmcp service ──▶ pipe ──▶ relay ──┐
//!             │                                                  ├─▶ writer
//!             └── error replies for lines rmcp cannot decode ────┘
//! ```
//!
//! The gate reads raw bytes, so one malformed line costs one `-32700`
//! reply instead of the session. Every request forwarded to the service is
//! tracked until its response passes the relay; on end of input the gate
//! waits for those before closing the service's input.

use crate::error::BrickFinderError;
use rmcp::model::{ClientJsonRpcMessage, ErrorCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tracing::{debug, warn};

const PIPE_CAPACITY: usize = 64 * 1024;

/// What to do with one inbound line.
#[derive(Debug, PartialEq)]
pub(crate) enum Screened {
    /// Hand to the service. `request_id` is set when a reply is owed.
    Forward {
        line: String,
        request_id: Option<String>,
    },
    /// Answer directly with this serialised error response.
    Reject(String),
    /// A malformed notification; nothing is owed.
    Ignore,
}

pub(crate) fn screen(raw: &[u8]) -> Screened {
    let value: Value = match serde_json::from_slice(raw) {
        Ok(v) => v,
        Err(e) => {
            return Screened::Reject(error_line(
                Value::Null,
                ErrorCode::PARSE_ERROR,
                format!("Parse error: {e}"),
            ))
        }
    };

    let id = value.get("id").filter(|id| !id.is_null()).cloned();
    let method = value.get("method").and_then(Value::as_str);

    if let (Some(id), Some(m)) = (&id, method) {
        if m.starts_with("notifications/") {
            return Screened::Reject(error_line(
                id.clone(),
                ErrorCode::METHOD_NOT_FOUND,
                format!("Method not found: {m} is a notification and takes no id"),
            ));
        }
    }

    if let Err(e) = serde_json::from_value::<ClientJsonRpcMessage>(value.clone()) {
        return match id {
            Some(id) => Screened::Reject(error_line(
                id,
                ErrorCode::INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
            None if value.is_object() && method.is_some() => Screened::Ignore,
            None => Screened::Reject(error_line(
                Value::Null,
                ErrorCode::INVALID_REQUEST,
                format!("Invalid request: {e}"),
            )),
        };
    }

    let request_id = match (&id, method) {
        (Some(id), Some(_)) => Some(id.to_string()),
        _ => None,
    };
    Screened::Forward {
        line: value.to_string(),
        request_id,
    }
}

fn error_line(id: Value, code: ErrorCode, message: String) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code.0, "message": message }
    })
    .to_string()
}

/// Id of a response line, keyed the same way as [`Screened::Forward`].
fn response_id(line: &str) -> Option<String> {
    let value: Value = serde_json::from_str(line).ok()?;
    if value.get("method").is_some() {
        return None;
    }
    value
        .get("id")
        .filter(|id| !id.is_null())
        .map(Value::to_string)
}

/// Requests forwarded to the service and not yet answered.
#[derive(Debug, Clone, Default)]
struct Pending(Arc<PendingInner>);

#[derive(Debug, Default)]
struct PendingInner {
    ids: Mutex<HashMap<String, usize>>,
    notify: Notify,
}

impl Pending {
    fn add(&self, id: String) {
        let mut ids = self.0.ids.lock().unwrap_or_else(PoisonError::into_inner);
        *ids.entry(id).or_default() += 1;
    }

    fn answered(&self, id: &str) {
        let mut ids = self.0.ids.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(n) = ids.get_mut(id) {
            *n -= 1;
            if *n == 0 {
                ids.remove(id);
            }
        }
        if ids.is_empty() {
            self.0.notify.notify_waiters();
        }
    }

    fn is_empty(&self) -> bool {
        self.0
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    async fn drained(&self) {
        loop {
            let notified = self.0.notify.notified();
            if self.is_empty() {
                return;
            }
            notified.await;
        }
    }
}

/// Run a service behind the line gate until `reader` reaches EOF (or the
/// output side dies) and every accepted request has been answered.
///
/// `start` receives the service's input and output pipes.
pub(crate) async fn serve_guarded<R, W, F, Fut>(
    reader: R,
    writer: W,
    start: F,
) -> Result<(), BrickFinderError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
    F: FnOnce(DuplexStream, DuplexStream) -> Fut,
    Fut: Future<Output = Result<(), BrickFinderError>> + Send + 'static,
{
    let (mut to_service, service_input) = tokio::io::duplex(PIPE_CAPACITY);
    let (service_output, from_service) = tokio::io::duplex(PIPE_CAPACITY);
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let pending = Pending::default();

    let writer_task = tokio::spawn(write_lines(writer, rx));
    let relay_task = tokio::spawn(relay(from_service, tx.clone(), pending.clone()));
    let mut service_task = tokio::spawn(start(service_input, service_output));

    let gated = gate(reader, &mut to_service, &tx, &pending).await;

    let finished = tokio::select! {
        () = pending.drained() => None,
        () = tx.closed() => None,
        joined = &mut service_task => Some(joined),
    };
    debug!("Input closed; stopping tool service");
    drop(to_service);
    let joined = match finished {
        Some(joined) => joined,
        None => service_task.await,
    };
    let served = joined
        .unwrap_or_else(|e| Err(BrickFinderError::Session(format!("service task failed: {e}"))));

    if let Err(e) = relay_task.await {
        warn!("Reply relay failed: {}", e);
    }
    drop(tx);
    let written = writer_task.await.unwrap_or_else(|e| Err(io::Error::other(e)));

    gated?;
    served?;
    written?;
    Ok(())
}

/// Read lines until EOF or until nothing can be written any more.
async fn gate<R: AsyncRead + Unpin>(
    reader: R,
    to_service: &mut DuplexStream,
    tx: &UnboundedSender<String>,
    pending: &Pending,
) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => read?,
            () = tx.closed() => {
                warn!("Output closed; no longer reading requests");
                return Ok(());
            }
        };
        if read == 0 {
            return Ok(());
        }
        let raw = buf.trim_ascii();
        if raw.is_empty() {
            continue;
        }

        match screen(raw) {
            Screened::Forward { line, request_id } => {
                if let Some(id) = request_id {
                    pending.add(id);
                }
                let sent = async {
                    to_service.write_all(line.as_bytes()).await?;
                    to_service.write_all(b"\n").await?;
                    to_service.flush().await
                };
                if let Err(e) = sent.await {
                    debug!("Tool service stopped accepting input: {}", e);
                    return Ok(());
                }
            }
            Screened::Reject(reply) => {
                warn!("Rejected inbound message");
                if tx.send(reply).is_err() {
                    return Ok(());
                }
            }
            Screened::Ignore => debug!("Dropped malformed notification"),
        }
    }
}

async fn relay(from_service: DuplexStream, tx: UnboundedSender<String>, pending: Pending) {
    let mut lines = BufReader::new(from_service).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let id = response_id(&line);
                let sent = tx.send(line).is_ok();
                if let Some(id) = id {
                    pending.answered(&id);
                }
                if !sent {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Unreadable output from tool service: {}", e);
                break;
            }
        }
    }
}

async fn write_lines<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut rx: UnboundedReceiver<String>,
) -> io::Result<()> {
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
