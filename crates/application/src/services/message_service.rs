use std::sync::Arc;

use domain::{
    take_last, validate_message, DomainError, Message, MessageId, MessagePayload,
    ParticipantName, RepositoryError, ValidMessage, VisibilityFilter,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub from: String, // 发送者（来自请求头）
    pub to: String,
    pub text: String,
    pub kind: String,
}

#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub id: String,
    pub requester: String, // 操作者（来自请求头）
    pub to: String,
    pub text: String,
    pub kind: String,
}

pub struct MessageServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
    pub broadcast_target: String,
}

/// 消息存储与可见性过滤
pub struct MessageService {
    deps: MessageServiceDependencies,
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    async fn ensure_registered(&self, name: &ParticipantName) -> Result<(), ApplicationError> {
        self.deps
            .participant_repository
            .find_by_name(name)
            .await?
            .ok_or_else(|| DomainError::unknown_sender(name.as_str()))?;
        Ok(())
    }

    async fn find_owned(&self, id: &str, requester: &str) -> Result<Message, ApplicationError> {
        let message_id = MessageId::parse(id).ok_or_else(|| DomainError::message_not_found(id))?;
        let message = self
            .deps
            .message_repository
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| DomainError::message_not_found(id))?;

        if !message.is_sent_by(requester) {
            return Err(DomainError::not_message_owner(requester, id).into());
        }
        Ok(message)
    }

    pub async fn send(&self, request: SendMessageRequest) -> Result<Message, ApplicationError> {
        let ValidMessage {
            from,
            to,
            text,
            kind,
        } = validate_message(&MessagePayload {
            from: request.from,
            to: request.to,
            text: request.text,
            kind: request.kind,
        })?;

        self.ensure_registered(&from).await?;

        let message = Message::new(
            MessageId::generate(),
            from,
            to,
            text,
            kind,
            self.deps.clock.now(),
        );
        let stored = self.deps.message_repository.insert(message).await?;

        tracing::debug!(message_id = %stored.id, sender = %stored.from, "message stored");
        Ok(stored)
    }

    /// 按写入顺序返回请求者可见的消息；`limit` 只保留最后若干条
    pub async fn list(
        &self,
        requester: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let filter = VisibilityFilter::new(requester, self.deps.broadcast_target.as_str());
        let visible = self.deps.message_repository.list_visible(&filter).await?;
        Ok(take_last(visible, limit))
    }

    /// 检查顺序：消息存在 -> 所有权 -> 载荷校验 -> 注册状态
    pub async fn edit(&self, request: EditMessageRequest) -> Result<Message, ApplicationError> {
        let mut message = self.find_owned(&request.id, &request.requester).await?;

        let ValidMessage { to, text, kind, .. } = validate_message(&MessagePayload {
            from: request.requester,
            to: request.to,
            text: request.text,
            kind: request.kind,
        })?;

        self.ensure_registered(&message.from).await?;

        message.edit(to, text, kind);
        self.deps
            .message_repository
            .update(message)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => DomainError::message_not_found(&request.id).into(),
                other => other.into(),
            })
    }

    pub async fn delete(&self, id: &str, requester: &str) -> Result<(), ApplicationError> {
        let message = self.find_owned(id, requester).await?;

        let removed = self.deps.message_repository.delete(message.id).await?;
        if !removed {
            return Err(DomainError::message_not_found(id).into());
        }

        tracing::debug!(message_id = %message.id, "message deleted");
        Ok(())
    }
}
