//! IPC Client for communicating with the Serenity daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - One method per mixer request
//! - Timeout handling
//!
//! Requests are sent exactly once. A volume or stop command that times out
//! may already have been applied, so the client never replays it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::types::{IpcRequest, IpcResponse, TrackId, DEFAULT_SOCKET_PATH};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
#[derive(Debug, Clone)]
pub struct IpcClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(Self::default_socket_path()?))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Uses `socket_path` when given, the default path otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if no path is given and the home directory cannot be
    /// determined.
    pub fn from_option(socket_path: Option<PathBuf>) -> Result<Self> {
        match socket_path {
            Some(path) => Ok(Self::with_socket_path(path)),
            None => Self::new(),
        }
    }

    /// Returns the default socket path.
    fn default_socket_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine the home directory")?;
        Ok(home.join(DEFAULT_SOCKET_PATH))
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn set_volume(&self, track: &str, volume: f32) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::SetVolume {
            track: TrackId::new(track),
            volume,
        })
        .await
    }

    pub async fn stop_all(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::StopAll).await
    }

    /// Sends the lock-screen surface's stop request.
    pub async fn surface_stop(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::SurfaceStop).await
    }

    pub async fn start_timer(&self, minutes: u32) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::StartTimer { minutes }).await
    }

    pub async fn cancel_timer(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::CancelTimer).await
    }

    pub async fn lock(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Lock).await
    }

    pub async fn unlock(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Unlock).await
    }

    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Status).await
    }

    /// Sends a single request to the daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon is unreachable, times out, or answers
    /// with an error response.
    pub async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to the daemon at {:?}. Start it with 'serenity daemon'",
                    self.socket_path
                )
            })?;

        let request_json = serde_json::to_vec(request).context("Failed to serialize request")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(&request_json),
        )
        .await
        .context("Write timed out")?
        .context("Failed to send request")?;

        timeout(Duration::from_secs(IO_TIMEOUT_SECS), stream.flush())
            .await
            .context("Flush timed out")?
            .context("Failed to flush request")?;

        // Shutdown write side to signal end of request
        stream.shutdown().await.context("Failed to shut down write side")?;

        let mut buffer = Vec::new();
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("The daemon closed the connection without answering");
        }

        let response: IpcResponse =
            serde_json::from_slice(&buffer).context("Failed to parse response")?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
