//! Per-socket connection worker.
//!
//! Every accepted socket gets one [`Connection`]: a tokio task running the
//! message cycle: read until the terminator (or end-of-stream), validate
//! against the endpoint's expectation, reply ACK/NAK/nothing, dispatch any
//! registered forwards, and either loop for the next message or close.
//!
//! The handle kept by the listener exposes the observable side of the worker:
//! how many messages arrived, the last expectation failure, and the record of
//! every outbound dispatch.  `close()` force-unblocks an in-progress read and
//! joins the task before returning, so "closed" always means "fully stopped".

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use hostmock_core::{ExpectationFailure, MessageStream, ResponseRegistry};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{EndpointOptions, ReceivedMessage, ReplyMode};
use crate::infrastructure::network::dispatch::{DispatchRecord, OutboundDispatcher};
use crate::infrastructure::network::hooks::ConnectionHooks;

/// Error type for a connection worker's serve loop.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from the peer failed.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),
    /// Writing the reply failed.
    #[error("reply write failed: {0}")]
    Write(#[source] std::io::Error),
}

impl SessionError {
    /// `true` for peer-initiated transport faults (reset, aborted pipe),
    /// which close the connection locally without counting as server errors.
    fn is_transport_fault(&self) -> bool {
        match self {
            SessionError::Read(e) | SessionError::Write(e) => is_transport_error(e),
        }
    }
}

/// Returns `true` for I/O error kinds that mean "the peer went away".
fn is_transport_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::UnexpectedEof
    )
}

// ── Observable state ──────────────────────────────────────────────────────────

/// Counters and records a connection exposes to tests and callers.
///
/// Shared between the worker task (writer) and the handle (reader); the locks
/// are held only for short copy-in/copy-out sections.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    messages: AtomicU64,
    last_failure: StdMutex<Option<ExpectationFailure>>,
    dispatches: StdMutex<Vec<DispatchRecord>>,
}

impl ConnectionStats {
    fn new() -> Self {
        Self::default()
    }

    /// Number of completed messages this connection has received.
    pub fn messages_received(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    /// The expectation failure recorded for the most recent message, if any.
    pub fn last_failure(&self) -> Option<ExpectationFailure> {
        self.last_failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Every outbound dispatch attempted on behalf of this connection.
    pub fn dispatch_records(&self) -> Vec<DispatchRecord> {
        self.dispatches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Replaces the assertion record for the message just validated; `None`
    /// clears a failure left over from an earlier message.
    fn store_failure(&self, failure: Option<ExpectationFailure>) {
        *self.last_failure.lock().unwrap_or_else(|e| e.into_inner()) = failure;
    }

    fn record_dispatch(&self, record: DispatchRecord) {
        self.dispatches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }
}

// ── Connection handle ─────────────────────────────────────────────────────────

/// Handle to one accepted connection and its worker task.
pub struct Connection {
    id: Uuid,
    peer_addr: SocketAddr,
    stats: Arc<ConnectionStats>,
    shutdown: watch::Sender<bool>,
    worker: TokioMutex<Option<JoinHandle<()>>>,
}

impl Connection {
    /// Spawns the worker task for an accepted socket and returns its handle.
    pub fn spawn(
        stream: TcpStream,
        peer_addr: SocketAddr,
        options: EndpointOptions,
        registry: Arc<ResponseRegistry>,
        hooks: Arc<dyn ConnectionHooks>,
    ) -> Arc<Self> {
        let id = Uuid::new_v4();
        let stats = Arc::new(ConnectionStats::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let session = Session {
            id,
            peer_addr,
            options,
            registry,
            hooks,
            stats: Arc::clone(&stats),
            dispatcher: OutboundDispatcher::new(),
        };
        let worker = tokio::spawn(session.run(stream, shutdown_rx));

        Arc::new(Self {
            id,
            peer_addr,
            stats,
            shutdown: shutdown_tx,
            worker: TokioMutex::new(Some(worker)),
        })
    }

    /// Identifier carried in every log event for this connection.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Number of completed messages received so far.
    pub fn messages_received(&self) -> u64 {
        self.stats.messages_received()
    }

    /// The expectation failure from the most recent message, if any.
    pub fn last_failure(&self) -> Option<ExpectationFailure> {
        self.stats.last_failure()
    }

    /// Every outbound dispatch this connection has attempted.
    pub fn dispatch_records(&self) -> Vec<DispatchRecord> {
        self.stats.dispatch_records()
    }

    /// Stops the worker and waits for it to finish.
    ///
    /// Unblocks an in-progress read, joins the task, and releases the socket.
    /// Idempotent: later calls return once the first close has completed, and
    /// a connection that already ended on its own joins immediately.
    pub async fn close(&self) {
        let _ = self.shutdown.send(true);
        // The slot stays locked for the whole join: a concurrent close()
        // must block here until the worker has actually stopped, not find
        // an emptied slot and return early.
        let mut slot = self.worker.lock().await;
        if let Some(handle) = slot.take() {
            if let Err(e) = handle.await {
                error!("connection {} worker panicked: {e}", self.id);
            }
        }
    }

    /// `true` once the worker task has fully stopped.
    pub fn is_closed(&self) -> bool {
        match self.worker.try_lock() {
            Ok(slot) => slot.as_ref().map_or(true, JoinHandle::is_finished),
            // Someone is mid-close; not fully stopped yet.
            Err(_) => false,
        }
    }
}

// ── Worker ────────────────────────────────────────────────────────────────────

/// How one read phase ended.
enum ReadEnd {
    /// The tail matched the terminator.
    Terminated,
    /// The peer closed its write side.
    Eof,
    /// `close()` was requested.
    Shutdown,
}

/// Everything the worker task needs: the endpoint behavior plus the shared
/// registry, hooks, and observable state.
struct Session {
    id: Uuid,
    peer_addr: SocketAddr,
    options: EndpointOptions,
    registry: Arc<ResponseRegistry>,
    hooks: Arc<dyn ConnectionHooks>,
    stats: Arc<ConnectionStats>,
    dispatcher: OutboundDispatcher,
}

impl Session {
    /// Task entry point: runs the serve loop and classifies how it ended.
    async fn run(self, stream: TcpStream, mut shutdown: watch::Receiver<bool>) {
        let id = self.id;
        info!("connection {id}: accepted from {}", self.peer_addr);
        match self.serve(stream, &mut shutdown).await {
            Ok(()) => info!("connection {id}: closed"),
            Err(e) if e.is_transport_fault() => {
                warn!("connection {id}: closed by transport fault: {e}");
            }
            Err(e) => error!("connection {id}: failed: {e}"),
        }
    }

    /// The message cycle.  Returns when the connection should close;
    /// transport faults surface as errors for `run` to classify.
    async fn serve(
        &self,
        stream: TcpStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), SessionError> {
        let id = self.id;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        loop {
            let mut message = MessageStream::new(self.options.terminator.clone());

            let end = self.read_message(&mut reader, &mut message, shutdown).await?;
            if matches!(end, ReadEnd::Shutdown) {
                debug!("connection {id}: shutdown requested");
                return Ok(());
            }
            if message.is_empty() {
                // Bare connect-and-disconnect probe; not a protocol error.
                debug!("connection {id}: peer closed without sending data");
                return Ok(());
            }

            self.stats.record_message();
            let key = message.key();
            debug!(
                "connection {id}: message complete ({} byte(s), key {key:?})",
                message.len()
            );

            // Validate.  The record is replaced wholesale so a match clears
            // any failure left over from an earlier message.
            let failure = self
                .options
                .expectation
                .as_ref()
                .and_then(|expected| expected.check(&key).err());
            if let Some(f) = &failure {
                warn!("connection {id}: {f}");
            }
            self.stats.store_failure(failure.clone());

            let received = ReceivedMessage {
                connection_id: id,
                peer_addr: self.peer_addr,
                bytes: message.to_vec(),
                key: key.clone(),
                terminated: matches!(end, ReadEnd::Terminated),
            };
            self.hooks.on_message(&received).await;

            let reply: Option<&[u8]> = match self.options.reply_mode {
                ReplyMode::None => None,
                ReplyMode::AlwaysNak => Some(&self.options.nak),
                ReplyMode::Ack if failure.is_some() => Some(&self.options.nak),
                ReplyMode::Ack => Some(&self.options.ack),
            };
            if let Some(bytes) = reply {
                write_reply(&mut write_half, bytes).await?;
                debug!("connection {id}: wrote {} reply byte(s)", bytes.len());
            }
            self.hooks.after_response(&received, reply).await;

            let deliveries = self.registry.lookup(&key);
            if !deliveries.is_empty() {
                info!(
                    "connection {id}: key {key:?} triggers {} deliver{}",
                    deliveries.len(),
                    if deliveries.len() == 1 { "y" } else { "ies" }
                );
                for delivery in deliveries {
                    let record = self.dispatcher.dispatch(delivery).await;
                    debug!(
                        "connection {id}: delivery to {}:{} {}",
                        record.host,
                        record.port,
                        if record.outcome.is_delivered() {
                            "delivered"
                        } else {
                            "failed"
                        }
                    );
                    self.stats.record_dispatch(record);
                }
            }

            if self.options.close_after_reply {
                debug!("connection {id}: closing after reply");
                return Ok(());
            }
            if matches!(end, ReadEnd::Eof) {
                debug!("connection {id}: peer closed the stream");
                return Ok(());
            }
        }
    }

    /// Reads bytes one at a time until the message completes, the peer
    /// closes, or shutdown is requested.  An idle timeout is logged and
    /// reading resumes.
    async fn read_message(
        &self,
        reader: &mut BufReader<OwnedReadHalf>,
        message: &mut MessageStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<ReadEnd, SessionError> {
        let id = self.id;
        let mut byte = [0u8; 1];
        loop {
            tokio::select! {
                _ = shutdown.changed() => return Ok(ReadEnd::Shutdown),
                read = timeout(self.options.read_timeout, reader.read(&mut byte)) => match read {
                    Err(_) => {
                        warn!(
                            "connection {id}: no data for {:?}, still waiting",
                            self.options.read_timeout
                        );
                    }
                    Ok(Ok(0)) => return Ok(ReadEnd::Eof),
                    Ok(Ok(_)) => {
                        message.write(byte[0]);
                        if message.is_complete() {
                            return Ok(ReadEnd::Terminated);
                        }
                    }
                    Ok(Err(e)) => return Err(SessionError::Read(e)),
                }
            }
        }
    }
}

async fn write_reply(write_half: &mut OwnedWriteHalf, bytes: &[u8]) -> Result<(), SessionError> {
    write_half
        .write_all(bytes)
        .await
        .map_err(SessionError::Write)?;
    write_half.flush().await.map_err(SessionError::Write)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::network::hooks::LogHooks;
    use tokio::net::TcpListener;

    #[test]
    fn test_is_transport_error_recognises_connection_reset() {
        let e = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(is_transport_error(&e));
    }

    #[test]
    fn test_is_transport_error_recognises_broken_pipe() {
        let e = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert!(is_transport_error(&e));
    }

    #[test]
    fn test_is_transport_error_rejects_other_kinds() {
        let e = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!is_transport_error(&e));
    }

    #[test]
    fn test_session_error_classifies_through_both_variants() {
        let read = SessionError::Read(std::io::Error::new(
            std::io::ErrorKind::ConnectionAborted,
            "gone",
        ));
        let write = SessionError::Write(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(read.is_transport_fault());
        assert!(!write.is_transport_fault());
    }

    #[test]
    fn test_stats_start_empty() {
        let stats = ConnectionStats::new();
        assert_eq!(stats.messages_received(), 0);
        assert!(stats.last_failure().is_none());
        assert!(stats.dispatch_records().is_empty());
    }

    #[test]
    fn test_stats_store_failure_replaces_previous_record() {
        let stats = ConnectionStats::new();
        let failure = ExpectationFailure {
            expected: "^ping$".to_string(),
            received: "pong".to_string(),
        };

        stats.store_failure(Some(failure.clone()));
        assert_eq!(stats.last_failure(), Some(failure));

        // A later matching message clears the record.
        stats.store_failure(None);
        assert!(stats.last_failure().is_none());
    }

    #[test]
    fn test_stats_count_and_dispatches_accumulate() {
        use crate::infrastructure::network::dispatch::{DispatchOutcome, DispatchRecord};

        let stats = ConnectionStats::new();
        stats.record_message();
        stats.record_message();
        stats.record_dispatch(DispatchRecord {
            host: "127.0.0.1".to_string(),
            port: 9,
            payload: b"pong".to_vec(),
            outcome: DispatchOutcome::Delivered,
        });

        assert_eq!(stats.messages_received(), 2);
        let records = stats.dispatch_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, b"pong".to_vec());
    }

    async fn accepted_connection() -> (Arc<Connection>, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (socket, peer_addr) = listener.accept().await.unwrap();
        let conn = Connection::spawn(
            socket,
            peer_addr,
            EndpointOptions::default(),
            Arc::new(ResponseRegistry::new()),
            Arc::new(LogHooks),
        );
        (conn, client)
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_joins_the_worker() {
        let (conn, _client) = accepted_connection().await;

        conn.close().await;
        assert!(conn.is_closed());

        // A second close must return immediately, not hang or panic.
        conn.close().await;
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_close_unblocks_a_connection_waiting_for_data() {
        let (conn, _client) = accepted_connection().await;

        // The worker is blocked reading; close() must still complete quickly.
        timeout(std::time::Duration::from_secs(2), conn.close())
            .await
            .expect("close must unblock the pending read");
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_probe_disconnect_records_no_messages() {
        let (conn, client) = accepted_connection().await;

        drop(client);
        conn.close().await;

        assert_eq!(conn.messages_received(), 0);
        assert!(conn.last_failure().is_none());
    }
}
