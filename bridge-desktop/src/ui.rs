//! Headless UI bridges for desktop and command-line hosts.

use bridge_traits::ui::{
    Alert, AlertPresenter, InteractionLock, NetworkActivityIndicator, ProgressOverlay,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// UI bridge with no window behind it.
///
/// Every call is logged and the resulting state is kept so a desktop shell
/// (or a test) can poll it. Alerts are logged at `warn` and retained in
/// presentation order.
#[derive(Debug)]
pub struct HeadlessUi {
    activity_visible: AtomicBool,
    overlay_visible: AtomicBool,
    interaction_enabled: AtomicBool,
    alerts: Mutex<Vec<Alert>>,
}

impl HeadlessUi {
    pub fn new() -> Self {
        Self {
            activity_visible: AtomicBool::new(false),
            overlay_visible: AtomicBool::new(false),
            interaction_enabled: AtomicBool::new(true),
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn is_activity_visible(&self) -> bool {
        self.activity_visible.load(Ordering::SeqCst)
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible.load(Ordering::SeqCst)
    }

    pub fn is_interaction_enabled(&self) -> bool {
        self.interaction_enabled.load(Ordering::SeqCst)
    }

    /// Alerts presented so far, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for HeadlessUi {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkActivityIndicator for HeadlessUi {
    fn set_visible(&self, visible: bool) {
        debug!(visible, "Network activity indicator");
        self.activity_visible.store(visible, Ordering::SeqCst);
    }
}

impl ProgressOverlay for HeadlessUi {
    fn show(&self) {
        debug!("Progress overlay shown");
        self.overlay_visible.store(true, Ordering::SeqCst);
    }

    fn dismiss(&self) {
        debug!("Progress overlay dismissed");
        self.overlay_visible.store(false, Ordering::SeqCst);
    }
}

impl InteractionLock for HeadlessUi {
    fn set_interaction_enabled(&self, enabled: bool) {
        debug!(enabled, "User interaction");
        self.interaction_enabled.store(enabled, Ordering::SeqCst);
    }
}

impl AlertPresenter for HeadlessUi {
    fn present(&self, alert: Alert) {
        warn!(title = %alert.title, message = %alert.message, "Alert");
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(alert);
    }
}
