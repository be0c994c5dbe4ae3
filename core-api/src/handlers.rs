//! Handler lists attached to a request.

use crate::error::ApiError;
use serde_json::Value;

/// Called with the full response body when the request succeeds.
pub type CompletionHandler = Box<dyn FnOnce(&Value) + Send + 'static>;

/// Called when the request fails, whatever the kind of failure.
pub type FailureHandler = Box<dyn FnOnce(&ApiError) + Send + 'static>;

/// Called after the completion or failure handlers, on either path.
pub type FinishHandler = Box<dyn FnOnce() + Send + 'static>;

/// Ordered handlers of one request. Each list is consumed when it runs, so
/// nothing can fire twice.
#[derive(Default)]
pub(crate) struct Handlers {
    completion: Vec<CompletionHandler>,
    failure: Vec<FailureHandler>,
    alert: Option<FailureHandler>,
    finish: Vec<FinishHandler>,
}

impl Handlers {
    pub(crate) fn push_completion(&mut self, handler: CompletionHandler) {
        self.completion.push(handler);
    }

    pub(crate) fn push_failure(&mut self, handler: FailureHandler) {
        self.failure.push(handler);
    }

    pub(crate) fn push_finish(&mut self, handler: FinishHandler) {
        self.finish.push(handler);
    }

    /// Installs the alert handler unless one is already set.
    pub(crate) fn set_alert(&mut self, handler: FailureHandler) -> bool {
        if self.alert.is_some() {
            return false;
        }
        self.alert = Some(handler);
        true
    }

    pub(crate) fn has_alert(&self) -> bool {
        self.alert.is_some()
    }

    pub(crate) fn counts(&self) -> (usize, usize, usize) {
        (self.completion.len(), self.failure.len(), self.finish.len())
    }

    /// Runs the completion or failure side for `outcome` and hands back the
    /// finish handlers, which the caller runs once network activity has been
    /// released.
    pub(crate) fn resolve(self, outcome: &Result<Value, ApiError>) -> FinishHandlers {
        match outcome {
            Ok(body) => {
                for handler in self.completion {
                    handler(body);
                }
            }
            Err(err) => {
                for handler in self.failure {
                    handler(err);
                }
                if let Some(alert) = self.alert {
                    alert(err);
                }
            }
        }
        FinishHandlers(self.finish)
    }
}

#[must_use = "finish handlers only run when `run` is called"]
pub(crate) struct FinishHandlers(Vec<FinishHandler>);

impl FinishHandlers {
    pub(crate) fn run(self) {
        for handler in self.0 {
            handler();
        }
    }
}
