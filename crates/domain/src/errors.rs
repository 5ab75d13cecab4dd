//! 领域模型错误定义
//!
//! 定义了在线状态与消息可见性引擎中所有可能的错误类型。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 载荷校验失败，包含全部违反的规则（而不只是第一条）
    #[error("validation failed: {}", .violations.join("; "))]
    ValidationFailed { violations: Vec<String> },

    /// 同名参与者已经在线
    #[error("participant already exists: {name}")]
    ParticipantAlreadyExists { name: String },

    /// 发送者不是当前在线的参与者
    #[error("sender is not an active participant: {name}")]
    UnknownSender { name: String },

    /// 参与者不存在
    #[error("participant not found: {name}")]
    ParticipantNotFound { name: String },

    /// 消息不存在
    #[error("message not found: {id}")]
    MessageNotFound { id: String },

    /// 非消息发送者尝试修改或删除消息
    #[error("participant {requester} does not own message {id}")]
    NotMessageOwner { requester: String, id: String },
}

impl DomainError {
    /// 创建校验错误
    pub fn validation_failed(violations: Vec<String>) -> Self {
        Self::ValidationFailed { violations }
    }

    pub fn participant_already_exists(name: impl Into<String>) -> Self {
        Self::ParticipantAlreadyExists { name: name.into() }
    }

    pub fn unknown_sender(name: impl Into<String>) -> Self {
        Self::UnknownSender { name: name.into() }
    }

    pub fn participant_not_found(name: impl Into<String>) -> Self {
        Self::ParticipantNotFound { name: name.into() }
    }

    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::MessageNotFound { id: id.into() }
    }

    pub fn not_message_owner(requester: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotMessageOwner {
            requester: requester.into(),
            id: id.into(),
        }
    }
}

/// 持久化网关错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    /// 唯一约束冲突（例如重复的参与者名称）
    #[error("record already exists")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = DomainError::validation_failed(vec![
            "to must not be empty".into(),
            "text must not be empty".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: to must not be empty; text must not be empty"
        );
    }
}
