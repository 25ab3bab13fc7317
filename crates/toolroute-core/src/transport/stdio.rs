//! Process-pipe transport
//!
//! Spawns the configured server command and speaks newline-delimited
//! JSON-RPC 2.0 over its stdin/stdout. Responses are correlated to pending
//! requests by numeric id, so out-of-order replies are handled correctly.
//! Non-JSON lines (startup banners, stray prints) and responses without a
//! matching pending id are discarded.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::framing::LineDecoder;
use super::{parse_response, request_envelope, Transport, TransportError, TransportResult};
use crate::logging::SharedLogger;

type PendingMap = parking_lot::Mutex<HashMap<u64, oneshot::Sender<TransportResult<Value>>>>;

/// JSON-RPC session over a spawned child process
pub struct StdioTransport {
    name: String,
    stdin: tokio::sync::Mutex<Option<ChildStdin>>,
    child: tokio::sync::Mutex<Option<Child>>,
    pending: Arc<PendingMap>,
    next_id: AtomicU64,
    closed: Arc<AtomicBool>,
    reader: parking_lot::Mutex<Option<JoinHandle<()>>>,
    logger: SharedLogger,
}

impl StdioTransport {
    /// Spawn the server process and start the response reader
    pub fn spawn(
        name: impl Into<String>,
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        logger: SharedLogger,
    ) -> TransportResult<Self> {
        let name = name.into();
        logger.info(&format!("[StdioTransport] Spawning '{}' for server '{}'", command, name));

        let mut child = Command::new(command)
            .args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("failed to spawn '{}': {}", command, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::ConnectionFailed("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::ConnectionFailed("child stdout unavailable".to_string()))?;

        let pending: Arc<PendingMap> = Arc::new(parking_lot::Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(read_loop(
            stdout,
            Arc::clone(&pending),
            Arc::clone(&closed),
            logger.clone(),
            name.clone(),
        ));

        Ok(Self {
            name,
            stdin: tokio::sync::Mutex::new(Some(stdin)),
            child: tokio::sync::Mutex::new(Some(child)),
            pending,
            next_id: AtomicU64::new(1),
            closed,
            reader: parking_lot::Mutex::new(Some(reader)),
            logger,
        })
    }

    fn remove_pending(&self, id: u64) {
        self.pending.lock().remove(&id);
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> TransportResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let mut line = serde_json::to_string(&request_envelope(id, method, &params))?;
        line.push('\n');

        {
            let mut guard = self.stdin.lock().await;
            let stdin = match guard.as_mut() {
                Some(stdin) => stdin,
                None => {
                    self.remove_pending(id);
                    return Err(TransportError::NotConnected);
                }
            };
            if let Err(e) = stdin.write_all(line.as_bytes()).await {
                self.remove_pending(id);
                return Err(TransportError::ConnectionFailed(format!("write failed: {}", e)));
            }
            if let Err(e) = stdin.flush().await {
                self.remove_pending(id);
                return Err(TransportError::ConnectionFailed(format!("flush failed: {}", e)));
            }
        }

        self.logger.debug(&format!(
            "[StdioTransport] Sent request id={} method={} to '{}'",
            id, method, self.name
        ));

        match tokio::time::timeout(timeout, rx).await {
            // Expiry removes the pending entry; a late response for this id
            // will be discarded by the reader.
            Err(_) => {
                self.remove_pending(id);
                Err(TransportError::Timeout)
            }
            Ok(Err(_)) => Err(TransportError::ConnectionFailed(
                "connection closed while waiting for response".to_string(),
            )),
            Ok(Ok(response)) => response.and_then(parse_response),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);

        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }

        // Dropping stdin closes the pipe; killing covers servers that
        // ignore it.
        self.stdin.lock().await.take();
        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.kill().await;
        }

        fail_pending(&self.pending, &self.name);
        self.logger.info(&format!("[StdioTransport] Closed session '{}'", self.name));
    }
}

async fn read_loop(
    mut stdout: ChildStdout,
    pending: Arc<PendingMap>,
    closed: Arc<AtomicBool>,
    logger: SharedLogger,
    name: String,
) {
    let mut decoder = LineDecoder::new();
    let mut chunk = [0u8; 4096];

    loop {
        match stdout.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                decoder.push(&chunk[..n]);
                while let Some(line) = decoder.next_line() {
                    dispatch_line(&line, &pending, &logger);
                }
            }
            Err(e) => {
                logger.warn(&format!("[StdioTransport] Read error on '{}': {}", name, e));
                break;
            }
        }
    }

    // Unexpected process exit: fail everything in flight and refuse new
    // requests until the manager reconnects.
    closed.store(true, Ordering::SeqCst);
    fail_pending(&pending, &name);
    logger.info(&format!("[StdioTransport] Server '{}' closed its output stream", name));
}

/// Route one complete output line to the pending request it answers
fn dispatch_line(line: &str, pending: &PendingMap, logger: &SharedLogger) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return;
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => {
            logger.debug(&format!("[StdioTransport] Discarding non-JSON line: {}", trimmed));
            return;
        }
    };

    let id = match value.get("id").and_then(|v| v.as_u64()) {
        Some(id) => id,
        None => {
            logger.debug("[StdioTransport] Discarding message without numeric id");
            return;
        }
    };

    let sender = match pending.lock().remove(&id) {
        Some(sender) => sender,
        None => {
            logger.debug(&format!("[StdioTransport] Discarding response with unknown id {}", id));
            return;
        }
    };

    // The caller may have timed out and dropped the receiver.
    let _ = sender.send(Ok(value));
}

fn fail_pending(pending: &PendingMap, name: &str) {
    let senders: Vec<_> = pending.lock().drain().collect();
    for (_, sender) in senders {
        let _ = sender.send(Err(TransportError::ConnectionFailed(format!(
            "server '{}' closed the connection",
            name
        ))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use serde_json::json;

    fn test_logger() -> SharedLogger {
        Arc::new(NoOpLogger::new())
    }

    fn register(pending: &Arc<PendingMap>, id: u64) -> oneshot::Receiver<TransportResult<Value>> {
        let (tx, rx) = oneshot::channel();
        pending.lock().insert(id, tx);
        rx
    }

    #[tokio::test]
    async fn test_dispatch_matches_by_id() {
        let pending: Arc<PendingMap> = Arc::new(parking_lot::Mutex::new(HashMap::new()));
        let logger = test_logger();
        let rx1 = register(&pending, 1);
        let rx2 = register(&pending, 2);

        // Out-of-order responses still reach the request that created them.
        dispatch_line(r#"{"jsonrpc":"2.0","id":2,"result":"second"}"#, &pending, &logger);
        dispatch_line(r#"{"jsonrpc":"2.0","id":1,"result":"first"}"#, &pending, &logger);

        let first = rx1.await.unwrap().unwrap();
        let second = rx2.await.unwrap().unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(first["result"], "first");
        assert_eq!(second["id"], 2);
        assert_eq!(second["result"], "second");
    }

    #[tokio::test]
    async fn test_dispatch_discards_junk() {
        let pending: Arc<PendingMap> = Arc::new(parking_lot::Mutex::new(HashMap::new()));
        let logger = test_logger();
        let rx = register(&pending, 1);

        dispatch_line("starting server v1.2...", &pending, &logger);
        dispatch_line(r#"{"jsonrpc":"2.0","method":"notify"}"#, &pending, &logger);
        dispatch_line(r#"{"jsonrpc":"2.0","id":99,"result":null}"#, &pending, &logger);
        assert_eq!(pending.lock().len(), 1);

        dispatch_line(r#"{"jsonrpc":"2.0","id":1,"result":null}"#, &pending, &logger);
        assert!(rx.await.unwrap().is_ok());
        assert!(pending.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fail_pending_reports_connection_error() {
        let pending: Arc<PendingMap> = Arc::new(parking_lot::Mutex::new(HashMap::new()));
        let rx = register(&pending, 5);

        fail_pending(&pending, "calc");
        match rx.await.unwrap() {
            Err(TransportError::ConnectionFailed(message)) => assert!(message.contains("calc")),
            other => panic!("expected ConnectionFailed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_request_against_scripted_server() {
        // Responds to two requests; ids are deterministic per transport.
        let script = concat!(
            "read line\n",
            "printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"ok\":true}}'\n",
            "read line\n",
            "printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"tools\":[]}}'\n",
        );
        let transport = StdioTransport::spawn(
            "mock",
            "sh",
            &["-c".to_string(), script.to_string()],
            &HashMap::new(),
            test_logger(),
        )
        .unwrap();

        let first = transport
            .request("initialize", json!({}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(first["ok"], true);

        let second = transport
            .request("tools/list", json!({}), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(second["tools"].as_array().unwrap().is_empty());

        transport.close().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_banner_lines_are_skipped() {
        let script = concat!(
            "printf '%s\\n' 'mock server booting'\n",
            "read line\n",
            "printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":42}'\n",
        );
        let transport = StdioTransport::spawn(
            "mock",
            "sh",
            &["-c".to_string(), script.to_string()],
            &HashMap::new(),
            test_logger(),
        )
        .unwrap();

        let result = transport
            .request("ping", json!({}), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result, 42);
        transport.close().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_removes_pending_entry() {
        let transport = StdioTransport::spawn(
            "slow",
            "sh",
            &["-c".to_string(), "read line; sleep 5".to_string()],
            &HashMap::new(),
            test_logger(),
        )
        .unwrap();

        let result = transport
            .request("tools/call", json!({}), Duration::from_millis(100))
            .await;
        assert!(matches!(result, Err(TransportError::Timeout)));
        assert!(transport.pending.lock().is_empty());
        transport.close().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_exit_fails_pending_request() {
        let transport = StdioTransport::spawn(
            "flaky",
            "sh",
            &["-c".to_string(), "read line".to_string()],
            &HashMap::new(),
            test_logger(),
        )
        .unwrap();

        let result = transport
            .request("tools/call", json!({}), Duration::from_secs(5))
            .await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));

        // The session is marked for teardown: later requests fail fast.
        let again = transport
            .request("tools/call", json!({}), Duration::from_secs(5))
            .await;
        assert!(matches!(again, Err(TransportError::NotConnected)));
        transport.close().await;
    }

    #[test]
    fn test_spawn_missing_command_fails() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let _guard = runtime.enter();
        let result = StdioTransport::spawn(
            "ghost",
            "definitely-not-a-real-command-7f3a",
            &[],
            &HashMap::new(),
            test_logger(),
        );
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }
}
