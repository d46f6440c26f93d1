//! Deferred one-shot start of the batch.
//!
//! [`StartupHandshake`] is a two-state machine (`NotReady -> Ready`) with a
//! single registration slot. The registered action runs at most once per
//! handshake, either immediately (host already ready) or on the first
//! readiness notification.

use futures::future::BoxFuture;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Work to run once the host is ready.
pub type ReadyAction<T> = Box<dyn FnOnce() -> BoxFuture<'static, T> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupState {
    NotReady,
    Ready,
}

pub struct StartupHandshake<T> {
    state: StartupState,
    pending: Option<ReadyAction<T>>,
    fired: bool,
}

impl<T> Default for StartupHandshake<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> StartupHandshake<T> {
    pub fn new() -> Self {
        Self {
            state: StartupState::NotReady,
            pending: None,
            fired: false,
        }
    }

    pub fn state(&self) -> StartupState {
        self.state
    }

    /// Whether an action is registered and waiting for readiness.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether the registered action has already run.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Run `action` now if `ready_now`, otherwise hold it until [`notify_ready`].
    ///
    /// Only the first registration counts; later calls are ignored and
    /// return `None`.
    ///
    /// [`notify_ready`]: StartupHandshake::notify_ready
    pub async fn start(&mut self, ready_now: bool, action: ReadyAction<T>) -> Option<T> {
        if self.fired || self.pending.is_some() {
            warn!("Startup action already registered, ignoring");
            return None;
        }

        if ready_now {
            self.state = StartupState::Ready;
            self.fired = true;
            debug!("Host ready, starting immediately");
            return Some(action().await);
        }

        debug!("Host not ready, deferring start");
        self.pending = Some(action);
        None
    }

    /// Move to `Ready` and run the pending action, if any.
    pub async fn notify_ready(&mut self) -> Option<T> {
        self.state = StartupState::Ready;
        let action = self.pending.take()?;
        self.fired = true;
        debug!("Host became ready, running deferred start");
        Some(action().await)
    }
}

/// Run `action` once the host readiness signal reads `true`.
///
/// Returns `None` if the signal's sender goes away before the host is ready.
pub async fn run_when_ready<T>(
    mut ready: watch::Receiver<bool>,
    action: ReadyAction<T>,
) -> Option<T> {
    let mut handshake = StartupHandshake::new();
    let ready_now = *ready.borrow_and_update();
    if ready_now {
        return handshake.start(true, action).await;
    }
    handshake.start(false, action).await;

    let became_ready = ready.wait_for(|ready| *ready).await.is_ok();
    if !became_ready {
        warn!("Host readiness signal closed before the host became ready");
        return None;
    }
    handshake.notify_ready().await
}
