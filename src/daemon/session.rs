//! Mixer session.
//!
//! A session owns the playback controller behind one async lock (all state
//! mutation is serialized through it) and drives the sleep timer with a
//! cancellable one-second ticker task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use crate::mixer::timer::{TimerTick, TICK_PERIOD};
use crate::mixer::{MixerError, PlaybackController};
use crate::types::{ResponseData, Snapshot, TrackId};

/// Where a stop request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOrigin {
    /// The user's own controls (gated by the screen lock)
    Local,
    /// The lock-screen surface (never gated)
    Surface,
}

/// Shared handle to a running mixer.
pub struct Session {
    controller: Arc<Mutex<PlaybackController>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    locked: AtomicBool,
}

impl Session {
    pub fn new(controller: PlaybackController) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            ticker: Mutex::new(None),
            locked: AtomicBool::new(false),
        }
    }

    /// Shared reference to the controller.
    pub fn controller(&self) -> Arc<Mutex<PlaybackController>> {
        Arc::clone(&self.controller)
    }

    // ------------------------------------------------------------------------
    // Screen lock
    // ------------------------------------------------------------------------

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
        debug!("Screen lock {}", if locked { "engaged" } else { "released" });
    }

    fn ensure_unlocked(&self) -> Result<(), MixerError> {
        if self.is_locked() {
            Err(MixerError::Locked)
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------------
    // Playback
    // ------------------------------------------------------------------------

    /// Sets one channel's volume.
    ///
    /// # Errors
    ///
    /// Returns `MixerError::Locked` while the screen lock is engaged, or the
    /// controller's error for unknown tracks and out-of-range volumes.
    pub async fn set_volume(&self, id: &TrackId, volume: f32) -> Result<Snapshot, MixerError> {
        self.ensure_unlocked()?;
        let mut controller = self.controller.lock().await;
        controller.set_volume(id, volume)?;
        Ok(controller.snapshot())
    }

    /// Stops every channel.
    ///
    /// # Errors
    ///
    /// Returns `MixerError::Locked` for local requests while the screen lock
    /// is engaged. Surface requests always go through.
    pub async fn stop_all(&self, origin: StopOrigin) -> Result<Snapshot, MixerError> {
        if origin == StopOrigin::Local {
            self.ensure_unlocked()?;
        }
        let mut controller = self.controller.lock().await;
        controller.stop_all();
        Ok(controller.snapshot())
    }

    pub async fn volume(&self, id: &TrackId) -> f32 {
        self.controller.lock().await.volume(id)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.controller.lock().await.snapshot()
    }

    /// Full status for IPC responses.
    pub async fn status(&self) -> ResponseData {
        let controller = self.controller.lock().await;
        let mut data = ResponseData::from_snapshot(&controller.snapshot());
        if controller.timer_active() {
            data.timer_remaining_seconds = Some(controller.timer_remaining().as_secs());
        }
        data.locked = self.is_locked();
        data.channels = Some(controller.channel_statuses());
        data
    }

    // ------------------------------------------------------------------------
    // Sleep timer
    // ------------------------------------------------------------------------

    /// Arms the sleep timer, replacing any running countdown. Zero minutes
    /// cancels.
    ///
    /// # Errors
    ///
    /// Returns `MixerError::Locked` while the screen lock is engaged.
    pub async fn start_timer(&self, minutes: u32) -> Result<Snapshot, MixerError> {
        self.ensure_unlocked()?;

        let mut ticker = self.ticker.lock().await;
        if let Some(old) = ticker.take() {
            old.abort();
        }

        let (generation, snapshot) = {
            let mut controller = self.controller.lock().await;
            let generation = controller.start_timer(minutes);
            (generation, controller.snapshot())
        };

        if let Some(generation) = generation {
            *ticker = Some(tokio::spawn(run_ticker(
                Arc::clone(&self.controller),
                generation,
            )));
        }

        Ok(snapshot)
    }

    /// Disarms the sleep timer and stops its ticker. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `MixerError::Locked` while the screen lock is engaged.
    pub async fn cancel_timer(&self) -> Result<Snapshot, MixerError> {
        self.ensure_unlocked()?;

        let mut ticker = self.ticker.lock().await;
        if let Some(old) = ticker.take() {
            old.abort();
        }

        let mut controller = self.controller.lock().await;
        controller.cancel_timer();
        Ok(controller.snapshot())
    }

    pub async fn timer_remaining(&self) -> Duration {
        self.controller.lock().await.timer_remaining()
    }

    /// Returns true while a ticker task is alive.
    pub async fn ticker_running(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.get_mut().take() {
            handle.abort();
        }
    }
}

/// Checks the sleep timer once per second until it expires or the
/// countdown it was started for is cancelled or replaced.
async fn run_ticker(controller: Arc<Mutex<PlaybackController>>, generation: u64) {
    let mut ticker = interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let tick = controller.lock().await.tick_timer(generation, Instant::now());
        match tick {
            TimerTick::Pending => continue,
            TimerTick::Expired => {
                debug!("Ticker {} finished on expiry", generation);
                break;
            }
            TimerTick::Stale => {
                debug!("Ticker {} superseded", generation);
                break;
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::mixer::ChannelRegistry;
    use crate::sound::{LoopCall, MockBackend};
    use crate::types::{Category, Track};
    use tokio::time::sleep;

    fn create_session() -> (Session, MockBackend) {
        let backend = MockBackend::new();
        let catalog = Catalog::new(vec![
            Track::new("a", "A", "a", "waveform", Category::AntiNoise),
            Track::new("b", "B", "b", "wind", Category::Nature),
            Track::new("c", "C", "c", "boat", Category::Travel),
        ]);
        let registry = ChannelRegistry::initialize(&catalog, &backend);
        let session = Session::new(PlaybackController::new(catalog, registry));
        (session, backend)
    }

    fn id(s: &str) -> TrackId {
        TrackId::new(s)
    }

    // ------------------------------------------------------------------------
    // Playback and lock
    // ------------------------------------------------------------------------

    mod playback_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_volume_returns_snapshot() {
            let (session, _backend) = create_session();

            session.set_volume(&id("a"), 0.5).await.unwrap();
            let snapshot = session.set_volume(&id("b"), 0.8).await.unwrap();

            assert_eq!(snapshot.active_track_names, vec!["A", "B"]);
            assert!(snapshot.is_playing);
            assert_eq!(session.volume(&id("b")).await, 0.8);

            let snapshot = session.stop_all(StopOrigin::Local).await.unwrap();
            assert!(snapshot.active_track_names.is_empty());
            assert!(!snapshot.is_playing);
        }

        #[tokio::test]
        async fn test_lock_rejects_local_controls() {
            let (session, _backend) = create_session();
            session.set_volume(&id("a"), 0.5).await.unwrap();
            session.set_locked(true);

            assert!(matches!(
                session.set_volume(&id("a"), 0.9).await,
                Err(MixerError::Locked)
            ));
            assert!(matches!(
                session.stop_all(StopOrigin::Local).await,
                Err(MixerError::Locked)
            ));
            assert!(matches!(session.start_timer(5).await, Err(MixerError::Locked)));
            assert!(matches!(session.cancel_timer().await, Err(MixerError::Locked)));

            assert_eq!(session.volume(&id("a")).await, 0.5);
        }

        #[tokio::test]
        async fn test_surface_stop_bypasses_lock() {
            let (session, _backend) = create_session();
            session.set_volume(&id("c"), 0.5).await.unwrap();
            session.set_locked(true);

            let snapshot = session.stop_all(StopOrigin::Surface).await.unwrap();
            assert!(!snapshot.is_playing);
            assert!(session.is_locked());
        }

        #[tokio::test]
        async fn test_unlock_restores_controls() {
            let (session, _backend) = create_session();
            session.set_locked(true);
            session.set_locked(false);
            assert!(session.set_volume(&id("a"), 0.2).await.is_ok());
        }

        #[tokio::test]
        async fn test_status_contents() {
            let (session, _backend) = create_session();
            session.set_volume(&id("b"), 0.4).await.unwrap();
            session.start_timer(30).await.unwrap();

            let status = session.status().await;
            assert_eq!(status.active_track_names, vec!["B"]);
            assert!(status.is_playing);
            assert!(status.timer_deadline.is_some());
            let remaining = status.timer_remaining_seconds.unwrap();
            assert!((1799..=1800).contains(&remaining));
            assert!(!status.locked);
            assert_eq!(status.channels.unwrap().len(), 3);
        }
    }

    // ------------------------------------------------------------------------
    // Sleep timer with a paused clock
    // ------------------------------------------------------------------------

    mod timer_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_expiry_stops_all_exactly_once() {
            let (session, backend) = create_session();
            session.set_volume(&id("a"), 0.5).await.unwrap();
            session.start_timer(1).await.unwrap();
            backend.clear_calls();

            sleep(Duration::from_secs(61)).await;

            assert_eq!(backend.count("a", &LoopCall::Rewind), 1);
            assert_eq!(backend.count("b", &LoopCall::Rewind), 1);
            assert!(!session.snapshot().await.is_playing);
            assert_eq!(session.snapshot().await.timer_deadline, None);
            assert_eq!(session.timer_remaining().await, Duration::ZERO);
            assert!(!session.ticker_running().await);

            // No further stops once idle.
            sleep(Duration::from_secs(120)).await;
            assert_eq!(backend.count("a", &LoopCall::Rewind), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_not_expired_before_deadline() {
            let (session, backend) = create_session();
            session.set_volume(&id("a"), 0.5).await.unwrap();
            session.start_timer(1).await.unwrap();
            backend.clear_calls();

            sleep(Duration::from_secs(50)).await;

            assert!(backend.calls().is_empty());
            assert!(session.snapshot().await.is_playing);
            assert_eq!(session.timer_remaining().await, Duration::from_secs(10));
        }

        #[tokio::test(start_paused = true)]
        async fn test_cancel_before_deadline_never_stops() {
            let (session, backend) = create_session();
            session.set_volume(&id("a"), 0.5).await.unwrap();
            session.start_timer(1).await.unwrap();
            backend.clear_calls();

            sleep(Duration::from_secs(30)).await;
            session.cancel_timer().await.unwrap();
            sleep(Duration::from_secs(90)).await;

            assert_eq!(backend.count("a", &LoopCall::Rewind), 0);
            assert!(session.snapshot().await.is_playing);
            assert!(!session.ticker_running().await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_start_zero_cancels_immediately() {
            let (session, backend) = create_session();
            session.set_volume(&id("a"), 0.5).await.unwrap();
            session.start_timer(1).await.unwrap();
            backend.clear_calls();

            let snapshot = session.start_timer(0).await.unwrap();
            assert_eq!(snapshot.timer_deadline, None);
            assert!(!session.ticker_running().await);

            sleep(Duration::from_secs(120)).await;
            assert!(backend.calls().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_restart_replaces_deadline() {
            let (session, backend) = create_session();
            session.set_volume(&id("a"), 0.5).await.unwrap();
            session.start_timer(1).await.unwrap();
            sleep(Duration::from_secs(30)).await;
            session.start_timer(2).await.unwrap();
            backend.clear_calls();

            // The first deadline passes without effect.
            sleep(Duration::from_secs(60)).await;
            assert_eq!(backend.count("a", &LoopCall::Rewind), 0);

            // The second one fires once.
            sleep(Duration::from_secs(61)).await;
            assert_eq!(backend.count("a", &LoopCall::Rewind), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_expiry_ignores_lock() {
            let (session, backend) = create_session();
            session.set_volume(&id("b"), 0.5).await.unwrap();
            session.start_timer(1).await.unwrap();
            session.set_locked(true);
            backend.clear_calls();

            sleep(Duration::from_secs(61)).await;

            assert_eq!(backend.count("b", &LoopCall::Rewind), 1);
            assert!(!session.snapshot().await.is_playing);
        }
    }
}
