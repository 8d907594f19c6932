//! Connection lifecycle for the persistent backend channel.
//!
//! The socket itself lives outside this crate: an embedding application
//! supplies a [`Transport`] that knows how to open one framed, bidirectional
//! link to the backend address. [`ConnectionManager`] owns everything above
//! that — readiness signalling, the unconditional fixed-interval retry loop,
//! outbound command delivery, and pumping inbound frames into the single
//! consumer queue drained by the reducer.
//!
//! The retry task is cancellable ([`ConnectionManager::shutdown`]) so tests
//! terminate deterministically instead of leaking a live timer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::DashboardConfig;

/// Three-valued readiness of the backend channel.
///
/// `Closed` is only reached by deliberate shutdown; a dropped link goes back
/// to `Connecting` and retries forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closed,
}

/// Errors surfaced by the transport layer.
#[derive(Debug, Error, Diagnostic)]
pub enum TransportError {
    /// A send was attempted while the channel was not open. Signalled to the
    /// caller as ineligible, never a crash.
    #[error("transport is not open")]
    #[diagnostic(
        code(auditboard::transport::not_open),
        help("wait for ReadyState::Open before sending")
    )]
    NotOpen,

    /// A connect attempt failed; the manager will retry.
    #[error("connect failed: {message}")]
    #[diagnostic(code(auditboard::transport::connect))]
    Connect { message: String },

    /// The link (or the manager itself) has gone away.
    #[error("transport link closed")]
    #[diagnostic(code(auditboard::transport::closed))]
    Closed,

    /// An outbound command could not be JSON-encoded.
    #[error("failed to encode outbound command: {source}")]
    #[diagnostic(code(auditboard::transport::encode))]
    Encode {
        #[from]
        source: serde_json::Error,
    },
}

/// Factory for backend links. Implemented outside the crate for real
/// sockets; [`ChannelTransport`] ships for tests and demos.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn TransportLink>, TransportError>;
}

/// One live, framed, bidirectional link to the backend.
#[async_trait]
pub trait TransportLink: Send {
    /// Send one text frame to the backend.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Receive the next raw inbound frame. `None` means the link dropped.
    async fn recv(&mut self) -> Option<Vec<u8>>;
}

/// Owns the lifecycle of the persistent backend channel.
///
/// Spawned once per dashboard process. Exposes the readiness signal through
/// a `watch` channel, accepts outbound frames whenever the link is open, and
/// feeds inbound frames into the flume receiver returned by
/// [`spawn`](Self::spawn).
pub struct ConnectionManager {
    ready_rx: watch::Receiver<ReadyState>,
    outbound_tx: mpsc::UnboundedSender<String>,
    lifecycle: Mutex<Option<Lifecycle>>,
}

struct Lifecycle {
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ConnectionManager {
    /// Spawn the background connect/pump/retry loop over `transport`.
    ///
    /// Returns the manager plus the inbound frame queue; exactly one
    /// consumer should drain that queue.
    pub fn spawn<T: Transport>(
        transport: T,
        config: &DashboardConfig,
    ) -> (Self, flume::Receiver<Vec<u8>>) {
        let (frame_tx, frame_rx) = flume::unbounded();
        let (ready_tx, ready_rx) = watch::channel(ReadyState::Connecting);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let retry_interval = config.retry_interval;
        let handle = tokio::spawn(run_loop(
            transport,
            ready_tx,
            outbound_rx,
            frame_tx,
            retry_interval,
            shutdown_rx,
        ));

        let manager = Self {
            ready_rx,
            outbound_tx,
            lifecycle: Mutex::new(Some(Lifecycle {
                shutdown_tx,
                handle,
            })),
        };
        (manager, frame_rx)
    }

    /// Current readiness of the channel.
    pub fn ready_state(&self) -> ReadyState {
        *self.ready_rx.borrow()
    }

    /// Subscribe to readiness changes (for the connection indicator).
    pub fn ready_changes(&self) -> watch::Receiver<ReadyState> {
        self.ready_rx.clone()
    }

    /// Queue one text frame for the backend.
    ///
    /// Fails with [`TransportError::NotOpen`] unless the channel is
    /// currently open.
    pub fn send_frame(&self, frame: String) -> Result<(), TransportError> {
        if self.ready_state() != ReadyState::Open {
            return Err(TransportError::NotOpen);
        }
        self.outbound_tx
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    /// Stop the background task and mark the channel closed.
    pub async fn shutdown(&self) {
        let lifecycle = {
            let mut guard = self.lifecycle.lock().expect("lifecycle poisoned");
            guard.take()
        };
        if let Some(lifecycle) = lifecycle {
            let _ = lifecycle.shutdown_tx.send(());
            let _ = lifecycle.handle.await;
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.lifecycle.lock() {
            if let Some(lifecycle) = guard.take() {
                let _ = lifecycle.shutdown_tx.send(());
                lifecycle.handle.abort();
            }
        }
    }
}

async fn run_loop<T: Transport>(
    transport: T,
    ready_tx: watch::Sender<ReadyState>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    frame_tx: flume::Sender<Vec<u8>>,
    retry_interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    'run: loop {
        ready_tx.send_replace(ReadyState::Connecting);

        let connected = tokio::select! {
            _ = &mut shutdown_rx => break 'run,
            connected = transport.connect() => connected,
        };

        match connected {
            Ok(mut link) => {
                ready_tx.send_replace(ReadyState::Open);
                tracing::info!("backend channel open");

                loop {
                    tokio::select! {
                        _ = &mut shutdown_rx => break 'run,
                        inbound = link.recv() => match inbound {
                            Some(raw) => {
                                if frame_tx.send(raw).is_err() {
                                    // Consumer dropped; nothing left to feed.
                                    break 'run;
                                }
                            }
                            None => {
                                tracing::warn!("backend channel dropped, retrying");
                                break;
                            }
                        },
                        command = outbound_rx.recv() => match command {
                            Some(frame) => {
                                if let Err(err) = link.send(frame).await {
                                    tracing::warn!(error = %err, "outbound send failed, retrying link");
                                    break;
                                }
                            }
                            None => break 'run,
                        },
                    }
                }

                // Link is gone; show Connecting for the whole retry window.
                ready_tx.send_replace(ReadyState::Connecting);
            }
            Err(err) => {
                tracing::warn!(error = %err, "connect attempt failed");
            }
        }

        tokio::select! {
            _ = &mut shutdown_rx => break 'run,
            _ = tokio::time::sleep(retry_interval) => {}
        }
    }

    ready_tx.send_replace(ReadyState::Closed);
    tracing::debug!("connection manager stopped");
}

/// In-memory [`Transport`] for tests and demos.
///
/// Each staged link yields a [`ChannelPeer`] playing the backend role: push
/// frames toward the dashboard, observe outbound commands, or drop the link
/// to exercise the retry path.
#[derive(Clone, Default)]
pub struct ChannelTransport {
    staged: Arc<Mutex<VecDeque<ChannelLink>>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage one link for the manager's next connect attempt.
    pub fn stage_link(&self) -> ChannelPeer {
        let (to_client_tx, to_client_rx) = mpsc::unbounded_channel();
        let (to_server_tx, to_server_rx) = mpsc::unbounded_channel();
        self.staged.lock().expect("staged links poisoned").push_back(ChannelLink {
            inbound: to_client_rx,
            outbound: to_server_tx,
        });
        ChannelPeer {
            to_client: to_client_tx,
            from_client: to_server_rx,
        }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn connect(&self) -> Result<Box<dyn TransportLink>, TransportError> {
        let link = self.staged.lock().expect("staged links poisoned").pop_front();
        link.map(|link| Box::new(link) as Box<dyn TransportLink>)
            .ok_or_else(|| TransportError::Connect {
                message: "no staged link".to_string(),
            })
    }
}

struct ChannelLink {
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl TransportLink for ChannelLink {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.outbound.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inbound.recv().await
    }
}

/// Backend side of a [`ChannelTransport`] link.
pub struct ChannelPeer {
    to_client: mpsc::UnboundedSender<Vec<u8>>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl ChannelPeer {
    /// Push one raw frame toward the dashboard.
    pub fn push_raw(&self, raw: impl Into<Vec<u8>>) -> Result<(), TransportError> {
        self.to_client
            .send(raw.into())
            .map_err(|_| TransportError::Closed)
    }

    /// Push a JSON value as a frame toward the dashboard.
    pub fn push_json(&self, value: &serde_json::Value) -> Result<(), TransportError> {
        self.push_raw(value.to_string().into_bytes())
    }

    /// Next command the dashboard sent, if the link is still up.
    pub async fn next_command(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Drop the link, as a backend disconnect would.
    pub fn disconnect(self) {}
}
