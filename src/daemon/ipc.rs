//! IPC Server for the Serenity daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for mixer commands
//! - Dispatch into the `Session` that owns the controller

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use crate::mixer::MixerError;
use crate::types::{IpcRequest, IpcResponse, ResponseData, Snapshot, TrackId};

use super::session::{Session, StopOrigin};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Reads until the client shuts down its write side, the buffer limit is
    /// exceeded, or the read timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(512);
        let mut chunk = [0u8; 1024];

        loop {
            let read_result = timeout(
                Duration::from_secs(READ_TIMEOUT_SECS),
                stream.read(&mut chunk),
            )
            .await;

            let n = match read_result {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
                Err(_) => return Err(IpcError::Timeout.into()),
            };

            if n == 0 {
                break;
            }
            if buffer.len() + n > MAX_REQUEST_SIZE {
                return Err(IpcError::RequestTooLarge.into());
            }
            buffer.extend_from_slice(&chunk[..n]);

            // A complete JSON document ends the request even if the client
            // keeps its write side open.
            if serde_json::from_slice::<serde_json::Value>(&buffer).is_ok() {
                break;
            }
        }

        if buffer.is_empty() {
            anyhow::bail!("Connection closed by client");
        }

        let request: IpcRequest = serde_json::from_slice(&buffer)
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the session.
#[derive(Clone)]
pub struct RequestHandler {
    session: Arc<Session>,
}

impl RequestHandler {
    /// Creates a new request handler for the given session.
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        debug!("Handling request: {:?}", request);

        match request {
            IpcRequest::SetVolume { track, volume } => self.handle_set_volume(track, volume).await,
            IpcRequest::StopAll => {
                respond(
                    self.session.stop_all(StopOrigin::Local).await,
                    "Stopped all sounds",
                )
            }
            IpcRequest::SurfaceStop => {
                respond(
                    self.session.stop_all(StopOrigin::Surface).await,
                    "Stopped all sounds",
                )
            }
            IpcRequest::StartTimer { minutes } => self.handle_start_timer(minutes).await,
            IpcRequest::CancelTimer => {
                respond(self.session.cancel_timer().await, "Sleep timer cancelled")
            }
            IpcRequest::Lock => {
                self.session.set_locked(true);
                IpcResponse::success("Controls locked", Some(self.session.status().await))
            }
            IpcRequest::Unlock => {
                self.session.set_locked(false);
                IpcResponse::success("Controls unlocked", Some(self.session.status().await))
            }
            IpcRequest::Status => IpcResponse::success("", Some(self.session.status().await)),
        }
    }

    async fn handle_set_volume(&self, track: TrackId, volume: f32) -> IpcResponse {
        let message = format!("Volume of {} set to {:.0}%", track, volume * 100.0);
        respond(self.session.set_volume(&track, volume).await, message)
    }

    async fn handle_start_timer(&self, minutes: u32) -> IpcResponse {
        let message = if minutes == 0 {
            "Sleep timer cancelled".to_string()
        } else {
            format!("Sleep timer set for {} minutes", minutes)
        };
        respond(self.session.start_timer(minutes).await, message)
    }

    /// Serves a single connection: one request, one response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be read or the response
    /// cannot be written.
    pub async fn serve(&self, mut stream: UnixStream) -> Result<()> {
        let response = match IpcServer::receive_request(&mut stream).await {
            Ok(request) => self.handle(request).await,
            Err(e) => IpcResponse::error(format!("{:#}", e)),
        };
        IpcServer::send_response(&mut stream, &response).await
    }
}

fn respond(result: Result<Snapshot, MixerError>, message: impl Into<String>) -> IpcResponse {
    match result {
        Ok(snapshot) => {
            IpcResponse::success(message, Some(ResponseData::from_snapshot(&snapshot)))
        }
        Err(e) => {
            if e.is_caller_error() {
                debug!("Rejected request: {}", e);
            } else {
                info!("Request refused: {}", e);
            }
            IpcResponse::error(e.to_string())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
