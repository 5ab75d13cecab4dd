//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：在线注册表、消息存储与可见性过滤、
//! 以及后台的不活跃参与者清理任务。持久化通过 `repository` 中的接口注入。

pub mod clock;
pub mod error;
pub mod memory;
pub mod reaper;
pub mod repository;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ApplicationError;
pub use memory::{MemoryMessageRepository, MemoryParticipantRepository};
pub use reaper::{IdleReaper, ReapReport, ReaperDependencies, ReaperSettings};
pub use repository::{MessageRepository, ParticipantRepository};
pub use services::{
    EditMessageRequest, MessageService, MessageServiceDependencies, PresenceService,
    PresenceServiceDependencies, SendMessageRequest,
};
