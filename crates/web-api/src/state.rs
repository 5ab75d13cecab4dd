use std::sync::Arc;

use application::{MessageService, PresenceService};

#[derive(Clone)]
pub struct AppState {
    pub presence_service: Arc<PresenceService>,
    pub message_service: Arc<MessageService>,
}

impl AppState {
    pub fn new(presence_service: Arc<PresenceService>, message_service: Arc<MessageService>) -> Self {
        Self {
            presence_service,
            message_service,
        }
    }
}
