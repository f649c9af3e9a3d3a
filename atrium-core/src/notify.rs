//! Notifier collaborator - toast/notification presentation
//!
//! Presentation is out of scope; the core reports outcomes through this
//! seam with generic messages and logs originals via `tracing`.

/// Surface user-facing success/error messages
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Discards every message; useful where no surface exists
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn success(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
