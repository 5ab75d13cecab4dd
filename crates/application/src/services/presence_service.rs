use std::sync::Arc;

use domain::{
    validate_participant, DomainError, Message, Participant, ParticipantName,
    ParticipantPayload, RepositoryError,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

pub struct PresenceServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
    pub broadcast_target: String,
}

/// 在线参与者注册表：加入、心跳与列表
pub struct PresenceService {
    deps: PresenceServiceDependencies,
}

impl PresenceService {
    pub fn new(deps: PresenceServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn join(&self, payload: ParticipantPayload) -> Result<Participant, ApplicationError> {
        let name = validate_participant(&payload)?;
        let now = self.deps.clock.now();

        // 依赖网关的 insert-if-absent，避免先查后插的竞争
        let participant = self
            .deps
            .participant_repository
            .insert_if_absent(Participant::join(name.clone(), now))
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    ApplicationError::from(DomainError::participant_already_exists(name.as_str()))
                }
                other => other.into(),
            })?;

        let arrival = Message::arrival(name.clone(), &self.deps.broadcast_target, now);
        if let Err(err) = self.deps.message_repository.insert(arrival).await {
            // 加入是整体操作：通知写入失败时撤销注册，允许客户端重试
            if let Err(rollback_err) = self.deps.participant_repository.remove(&name).await {
                tracing::error!(
                    participant = %name,
                    error = %rollback_err,
                    "failed to roll back participant after arrival note failure"
                );
            }
            return Err(err.into());
        }

        tracing::info!(participant = %name, "participant joined");
        Ok(participant)
    }

    pub async fn heartbeat(&self, name: &str) -> Result<(), ApplicationError> {
        let name = ParticipantName::new(name);
        let now = self.deps.clock.now();

        let refreshed = self
            .deps
            .participant_repository
            .touch(&name, now)
            .await?;
        if !refreshed {
            return Err(DomainError::participant_not_found(name.as_str()).into());
        }

        tracing::debug!(participant = %name, "heartbeat received");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        Ok(self.deps.participant_repository.list().await?)
    }
}
