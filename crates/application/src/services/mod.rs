mod message_service;
mod presence_service;


pub use message_service::{
    EditMessageRequest, MessageService, MessageServiceDependencies, SendMessageRequest,
};
pub use presence_service::{PresenceService, PresenceServiceDependencies};
