//! 聊天室在线状态与消息可见性的核心领域模型
//!
//! 包含参与者、消息等实体，入站载荷校验，以及按请求者过滤消息的可见性规则。

pub mod errors;
pub mod message;
pub mod participant;
pub mod validation;
pub mod value_objects;
pub mod visibility;

// 重新导出常用类型
pub use errors::*;
pub use message::{Message, MessageKind, UnknownMessageKind, ARRIVAL_TEXT, DEPARTURE_TEXT};
pub use participant::{stale_cutoff, Participant};
pub use validation::{
    validate_message, validate_participant, MessagePayload, ParticipantPayload, ValidMessage,
};
pub use value_objects::*;
pub use visibility::{parse_limit, take_last, VisibilityFilter};
