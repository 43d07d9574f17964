//! Daemon module for the Serenity mixer.
//!
//! This module contains the long-running side of the mixer:
//! - `session`: Shared controller, screen lock and the timer ticker task
//! - `ipc`: Unix socket server and request dispatch

pub mod ipc;
pub mod session;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::mixer::{ChannelRegistry, PlaybackController};
use crate::sound::{try_create_backend, MediaBackend, MediaLibrary};
use crate::surface::{SurfaceFile, SurfaceMirror};
use crate::types::DaemonConfig;

pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use session::{Session, StopOrigin};
pub use crate::mixer::timer::{
    format_preset, format_remaining, SleepTimer, TimerTick, PRESET_MINUTES,
};

/// Binds the catalog against a backend and wraps the result in a session.
///
/// A surface mirror, when given, receives every snapshot starting with the
/// initial silent one.
pub fn build_session(
    catalog: Catalog,
    backend: &dyn MediaBackend,
    surface: Option<&SurfaceMirror>,
) -> Session {
    let registry = ChannelRegistry::initialize(&catalog, backend);
    let mut controller = PlaybackController::new(catalog, registry);
    if let Some(surface) = surface {
        controller.add_listener(Box::new(surface.listener()));
    }
    Session::new(controller)
}

/// Accepts connections until `shutdown` resolves, serving each on its own
/// task.
///
/// # Errors
///
/// Returns an error if accepting a connection fails.
pub async fn serve<F>(server: &IpcServer, handler: RequestHandler, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Shutdown requested");
                return Ok(());
            }
            accepted = server.accept() => {
                let stream = accepted?;
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Err(e) = handler.serve(stream).await {
                        warn!("Failed to serve request: {:#}", e);
                    }
                });
            }
        }
    }
}

/// Runs the daemon until Ctrl-C.
///
/// All channels are silenced before returning.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the socket cannot be
/// bound.
pub async fn run(config: DaemonConfig) -> Result<()> {
    config
        .validate()
        .map_err(|msg| anyhow::anyhow!("Invalid configuration: {}", msg))?;

    // The backend owns the output stream and must outlive every channel.
    let backend = try_create_backend(MediaLibrary::new(&config.media_dir), config.silent);
    let surface = config.surface_path.as_ref().map(|path| {
        info!("Mirroring playback state to {:?}", path);
        SurfaceMirror::spawn(SurfaceFile::new(path))
    });
    let session = Arc::new(build_session(
        Catalog::builtin(),
        backend.as_ref(),
        surface.as_ref(),
    ));

    let server = IpcServer::new(&config.socket_path).context("Failed to start IPC server")?;
    info!("Listening on {:?}", server.socket_path());

    let handler = RequestHandler::new(Arc::clone(&session));
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    serve(&server, handler, shutdown).await?;

    if let Err(e) = session.stop_all(StopOrigin::Surface).await {
        warn!("Failed to stop sounds on shutdown: {}", e);
    }
    if let Some(surface) = surface {
        surface.finish().await;
    }
    info!("Daemon stopped");
    Ok(())
}
