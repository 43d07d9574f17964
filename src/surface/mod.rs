//! Lock-screen surface boundary.
//!
//! The controller pushes a `Snapshot` to every registered listener after each
//! mutation. Delivery is at-least-once and last-write-wins; listeners never
//! feed back into the controller. The reverse direction (the surface asking
//! to stop all sounds) arrives as an IPC request, see `daemon::ipc`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::Snapshot;

/// Receives playback snapshots.
pub trait SnapshotListener: Send + Sync {
    /// Called with the latest snapshot. Must not block.
    fn publish(&self, snapshot: &Snapshot);
}

// ============================================================================
// WatchPublisher
// ============================================================================

/// In-process listener backed by a `tokio::sync::watch` channel.
///
/// Receivers only ever observe the newest snapshot.
#[derive(Debug, Clone)]
pub struct WatchPublisher {
    tx: Arc<watch::Sender<Snapshot>>,
}

impl WatchPublisher {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Snapshot {
        self.tx.borrow().clone()
    }
}

impl Default for WatchPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotListener for WatchPublisher {
    fn publish(&self, snapshot: &Snapshot) {
        self.tx.send_replace(snapshot.clone());
    }
}

// ============================================================================
// SurfaceFile
// ============================================================================

/// Out-of-process listener: writes each snapshot as JSON to a shared file.
///
/// The write goes to a sibling temporary file first and is renamed into
/// place, so a reader never sees a torn snapshot.
#[derive(Debug, Clone)]
pub struct SurfaceFile {
    path: PathBuf,
}

impl SurfaceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create surface directory: {:?}", parent))?;
            }
        }

        let json = serde_json::to_vec(snapshot).context("Failed to serialize snapshot")?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = std::fs::File::create(&tmp)
            .with_context(|| format!("Failed to create {:?}", tmp))?;
        file.write_all(&json)
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        if let Err(e) = file.sync_all() {
            warn!("Failed to sync {:?}: {}", tmp, e);
        }

        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move snapshot into {:?}", self.path))?;

        Ok(())
    }

    /// Reads back the last written snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn read(&self) -> Result<Snapshot> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read surface file: {:?}", self.path))?;
        serde_json::from_slice(&bytes).context("Failed to parse surface snapshot")
    }
}

// ============================================================================
// SurfaceMirror
// ============================================================================

/// Keeps a `SurfaceFile` in step with the controller from a background task.
///
/// The controller only ever touches the watch channel. File I/O runs on the
/// blocking pool one write at a time, always with the newest snapshot, so
/// snapshots published during a slow write collapse into one.
#[derive(Debug)]
pub struct SurfaceMirror {
    publisher: WatchPublisher,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SurfaceMirror {
    /// Starts the writer task. Must be called within a tokio runtime.
    pub fn spawn(file: SurfaceFile) -> Self {
        let publisher = WatchPublisher::new();
        let rx = publisher.subscribe();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(mirror_loop(file, rx, shutdown_rx));

        Self {
            publisher,
            shutdown,
            task,
        }
    }

    /// Listener to register with the controller.
    pub fn listener(&self) -> WatchPublisher {
        self.publisher.clone()
    }

    /// Writes the pending snapshot, if any, and stops the writer task.
    pub async fn finish(self) {
        let Self {
            publisher,
            shutdown,
            task,
        } = self;

        let _ = shutdown.send(());
        if let Err(e) = task.await {
            warn!("Surface writer task failed: {}", e);
        }
        drop(publisher);
    }
}

async fn mirror_loop(
    file: SurfaceFile,
    mut rx: watch::Receiver<Snapshot>,
    mut shutdown: oneshot::Receiver<()>,
) {
    // The initial value counts as unseen so the file exists from the start.
    rx.mark_changed();

    loop {
        tokio::select! {
            biased;
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let snapshot = rx.borrow_and_update().clone();
                write_off_thread(&file, snapshot).await;
            }
            _ = &mut shutdown => break,
        }
    }

    if rx.has_changed().unwrap_or(false) {
        let snapshot = rx.borrow_and_update().clone();
        write_off_thread(&file, snapshot).await;
    }
}

async fn write_off_thread(file: &SurfaceFile, snapshot: Snapshot) {
    let writer = file.clone();
    match tokio::task::spawn_blocking(move || writer.write(&snapshot)).await {
        Ok(Ok(())) => debug!("Surface snapshot written to {:?}", file.path()),
        Ok(Err(e)) => warn!("Failed to update surface: {:#}", e),
        Err(e) => warn!("Surface write task failed: {}", e),
    }
}
