//! UI Side-Effect Abstractions
//!
//! Requests can touch a handful of host UI affordances while they are in
//! flight. The core only decides *when*; each host decides *how*:
//!
//! | Trait | iOS | Android | Desktop |
//! |-------|-----|---------|---------|
//! | [`NetworkActivityIndicator`] | status bar spinner | toolbar progress | log line |
//! | [`ProgressOverlay`] | HUD | modal progress dialog | log line |
//! | [`InteractionLock`] | key window interaction | window touch flags | no-op |
//! | [`AlertPresenter`] | alert on topmost controller | `AlertDialog` | stderr |
//!
//! All calls are fire-and-forget and may arrive from any thread. Hosts that
//! need the main thread must dispatch there themselves.

/// Network activity indicator (e.g. the status bar spinner).
pub trait NetworkActivityIndicator: Send + Sync {
    fn set_visible(&self, visible: bool);
}

/// Blocking progress overlay shown above the current screen.
pub trait ProgressOverlay: Send + Sync {
    fn show(&self);
    fn dismiss(&self);
}

/// Global switch for user input handling.
pub trait InteractionLock: Send + Sync {
    fn set_interaction_enabled(&self, enabled: bool);
}

/// Style of an alert button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertActionStyle {
    #[default]
    Default,
    Cancel,
    Destructive,
}

/// A button on a modal alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertAction {
    pub title: String,
    pub style: AlertActionStyle,
}

impl AlertAction {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: AlertActionStyle::Default,
        }
    }

    pub fn cancel(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: AlertActionStyle::Cancel,
        }
    }

    pub fn destructive(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: AlertActionStyle::Destructive,
        }
    }
}

/// Modal alert content.
///
/// An empty `actions` list means the host shows a single dismiss button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub actions: Vec<AlertAction>,
}

/// Presents modal alerts on the topmost visible screen.
///
/// Walking the host's presentation stack to find that screen is the
/// implementation's job.
pub trait AlertPresenter: Send + Sync {
    fn present(&self, alert: Alert);
}

/// UI bridge that ignores every call.
///
/// Default for hosts without a visible UI (tests, CLI tools, background
/// services).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUi;

impl NetworkActivityIndicator for NoopUi {
    fn set_visible(&self, _visible: bool) {}
}

impl ProgressOverlay for NoopUi {
    fn show(&self) {}
    fn dismiss(&self) {}
}

impl InteractionLock for NoopUi {
    fn set_interaction_enabled(&self, _enabled: bool) {}
}
