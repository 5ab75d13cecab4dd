//! 内存实现的持久化网关
//!
//! 未配置数据库时使用，也用于测试。每个方法只持有一次锁，不跨越 await。

use std::collections::BTreeMap;

use async_trait::async_trait;
use domain::{
    Message, MessageId, Participant, ParticipantName, RepositoryError, Timestamp,
    VisibilityFilter,
};
use tokio::sync::RwLock;

use crate::repository::{MessageRepository, ParticipantRepository};

#[derive(Default)]
pub struct MemoryParticipantRepository {
    participants: RwLock<BTreeMap<ParticipantName, Participant>>,
}

impl MemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryParticipantRepository {
    async fn insert_if_absent(
        &self,
        participant: Participant,
    ) -> Result<Participant, RepositoryError> {
        use std::collections::btree_map::Entry;

        let mut participants = self.participants.write().await;
        match participants.entry(participant.name.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict),
            Entry::Vacant(slot) => Ok(slot.insert(participant).clone()),
        }
    }

    async fn find_by_name(
        &self,
        name: &ParticipantName,
    ) -> Result<Option<Participant>, RepositoryError> {
        Ok(self.participants.read().await.get(name).cloned())
    }

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self.participants.read().await.values().cloned().collect())
    }

    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> Result<bool, RepositoryError> {
        let mut participants = self.participants.write().await;
        match participants.get_mut(name) {
            Some(participant) => {
                participant.heartbeat(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_stale(&self, cutoff: Timestamp) -> Result<Vec<Participant>, RepositoryError> {
        Ok(self
            .participants
            .read()
            .await
            .values()
            .filter(|participant| participant.is_stale(cutoff))
            .cloned()
            .collect())
    }

    async fn delete_stale(
        &self,
        names: &[ParticipantName],
        cutoff: Timestamp,
    ) -> Result<Vec<ParticipantName>, RepositoryError> {
        let mut participants = self.participants.write().await;
        let mut removed = Vec::new();
        for name in names {
            let still_stale = participants
                .get(name)
                .is_some_and(|participant| participant.is_stale(cutoff));
            if still_stale {
                participants.remove(name);
                removed.push(name.clone());
            }
        }
        Ok(removed)
    }

    async fn remove(&self, name: &ParticipantName) -> Result<bool, RepositoryError> {
        Ok(self.participants.write().await.remove(name).is_some())
    }
}

#[derive(Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 全部消息（按写入顺序），不经过可见性过滤
    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn insert(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        if messages.iter().any(|existing| existing.id == message.id) {
            return Err(RepositoryError::Conflict);
        }
        messages.push(message.clone());
        Ok(message)
    }

    async fn insert_many(&self, batch: Vec<Message>) -> Result<usize, RepositoryError> {
        let count = batch.len();
        self.messages.write().await.extend(batch);
        Ok(count)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .find(|message| message.id == id)
            .cloned())
    }

    async fn list_visible(
        &self,
        filter: &VisibilityFilter,
    ) -> Result<Vec<Message>, RepositoryError> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|message| filter.matches(message))
            .cloned()
            .collect())
    }

    async fn update(&self, message: Message) -> Result<Message, RepositoryError> {
        let mut messages = self.messages.write().await;
        let slot = messages
            .iter_mut()
            .find(|existing| existing.id == message.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = message.clone();
        Ok(message)
    }

    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|message| message.id != id);
        Ok(messages.len() != before)
    }
}
