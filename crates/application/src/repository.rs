//! 持久化网关接口
//!
//! 每个方法对应一次网关调用，单次调用视为原子操作。

use async_trait::async_trait;
use domain::{
    Message, MessageId, Participant, ParticipantName, RepositoryError, Timestamp,
    VisibilityFilter,
};

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// 名称不存在时插入，否则返回 `RepositoryError::Conflict`。
    /// 存在性检查与插入必须在同一次调用内完成。
    async fn insert_if_absent(&self, participant: Participant)
        -> Result<Participant, RepositoryError>;

    async fn find_by_name(
        &self,
        name: &ParticipantName,
    ) -> Result<Option<Participant>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError>;

    /// 刷新最近活动时间，参与者不存在时返回 `false`
    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> Result<bool, RepositoryError>;

    /// `last_status <= cutoff` 的参与者
    async fn find_stale(&self, cutoff: Timestamp) -> Result<Vec<Participant>, RepositoryError>;

    /// 删除给定名称中仍满足 `last_status <= cutoff` 的参与者，返回实际删除的名称
    async fn delete_stale(
        &self,
        names: &[ParticipantName],
        cutoff: Timestamp,
    ) -> Result<Vec<ParticipantName>, RepositoryError>;

    /// 无条件删除参与者，不存在时返回 `false`
    async fn remove(&self, name: &ParticipantName) -> Result<bool, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: Message) -> Result<Message, RepositoryError>;

    /// 批量写入，返回写入数量
    async fn insert_many(&self, messages: Vec<Message>) -> Result<usize, RepositoryError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError>;

    /// 按写入顺序返回对请求者可见的消息
    async fn list_visible(&self, filter: &VisibilityFilter)
        -> Result<Vec<Message>, RepositoryError>;

    /// 消息不存在时返回 `RepositoryError::NotFound`
    async fn update(&self, message: Message) -> Result<Message, RepositoryError>;

    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError>;
}
