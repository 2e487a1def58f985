use crate::controller::ConversationController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single live conversation; the session state machine enforces one
    /// active session at a time
    pub controller: Arc<ConversationController>,
}

impl AppState {
    pub fn new(controller: Arc<ConversationController>) -> Self {
        Self { controller }
    }
}
