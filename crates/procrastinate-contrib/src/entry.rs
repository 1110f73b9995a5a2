//! Process-wide entry point and its readiness transition
//!
//! The entry point is a two-state machine: it starts `NotReady`, serving a
//! [`FutureApp`], and moves once to `Ready`, serving the real app, when the
//! host integration calls [`EntryPoint::mark_ready`]. Callers hold an
//! `Arc<dyn App>` snapshot; the swap happens under a single write lock.

use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

use procrastinate_core::ContribError;

use crate::app::App;
use crate::placeholder::FutureApp;

enum Readiness {
    NotReady(Arc<FutureApp>),
    Ready(Arc<dyn App>),
}

pub struct EntryPoint {
    state: RwLock<Readiness>,
}

impl EntryPoint {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Readiness::NotReady(Arc::new(FutureApp::new()))),
        }
    }

    /// The app currently installed: the placeholder before readiness, the
    /// real app after.
    pub fn current(&self) -> Arc<dyn App> {
        match &*self.state.read() {
            Readiness::NotReady(future) => future.clone(),
            Readiness::Ready(app) => app.clone(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.state.read(), Readiness::Ready(_))
    }

    /// The placeholder, while the entry point is not ready.
    pub fn future_app(&self) -> Option<Arc<FutureApp>> {
        match &*self.state.read() {
            Readiness::NotReady(future) => Some(future.clone()),
            Readiness::Ready(_) => None,
        }
    }

    /// Replace the placeholder with the real app.
    ///
    /// The placeholder hands its declared tasks over to `app` (no namespace)
    /// under the same write lock as the swap, and forwards declarations made
    /// later through handles taken before the swap. One-way: a second call
    /// fails with [`ContribError::AlreadyReady`] and leaves the installed app
    /// untouched; a task name clash fails without swapping.
    pub fn mark_ready(&self, app: Arc<dyn App>) -> Result<(), ContribError> {
        let mut state = self.state.write();
        let declared = match &*state {
            Readiness::NotReady(future) => future.hand_over(app.clone())?,
            Readiness::Ready(_) => {
                tracing::warn!("Entry point already marked ready, ignoring new app");
                return Err(ContribError::AlreadyReady);
            }
        };
        *state = Readiness::Ready(app);
        tracing::info!(declared_tasks = declared, "Procrastinate app is ready");
        Ok(())
    }
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoint")
            .field("ready", &self.is_ready())
            .finish()
    }
}

static ENTRY_POINT: OnceLock<EntryPoint> = OnceLock::new();

/// The process-wide entry point, created not-ready on first access.
pub fn entry_point() -> &'static EntryPoint {
    ENTRY_POINT.get_or_init(EntryPoint::new)
}

/// The process-wide app: declare tasks on it at any time, run it once the host
/// is ready.
pub fn app() -> Arc<dyn App> {
    entry_point().current()
}
