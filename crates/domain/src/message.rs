use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value_objects::{format_clock_time, MessageId, ParticipantName, Timestamp};

/// 参与者加入时系统生成的状态消息正文
pub const ARRIVAL_TEXT: &str = "entra na sala...";
/// 参与者被清理时系统生成的状态消息正文
pub const DEPARTURE_TEXT: &str = "sai da sala...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// 公开消息：对所有人可见
    Message,
    PrivateMessage,
    /// 系统生成的进入/离开通知，客户端不可提交
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// 客户端允许提交的类型
    pub fn is_client_settable(&self) -> bool {
        matches!(self, MessageKind::Message | MessageKind::PrivateMessage)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message type: {0}")]
pub struct UnknownMessageKind(pub String);

impl FromStr for MessageKind {
    type Err = UnknownMessageKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            "status" => Ok(MessageKind::Status),
            other => Err(UnknownMessageKind(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: ParticipantName,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// 服务端生成的展示时间（HH:MM:SS）
    pub time: String,
}

impl Message {
    pub fn new(
        id: MessageId,
        from: ParticipantName,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: MessageKind,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id,
            from,
            to: to.into(),
            text: text.into(),
            kind,
            time: format_clock_time(sent_at),
        }
    }

    pub fn arrival(from: ParticipantName, broadcast_target: &str, at: Timestamp) -> Self {
        Self::new(
            MessageId::generate(),
            from,
            broadcast_target,
            ARRIVAL_TEXT,
            MessageKind::Status,
            at,
        )
    }

    pub fn departure(from: ParticipantName, broadcast_target: &str, at: Timestamp) -> Self {
        Self::new(
            MessageId::generate(),
            from,
            broadcast_target,
            DEPARTURE_TEXT,
            MessageKind::Status,
            at,
        )
    }

    pub fn is_sent_by(&self, requester: &str) -> bool {
        self.from.as_str() == requester
    }

    /// 替换收件人、正文与类型；发送者和时间保持不变
    pub fn edit(&mut self, to: String, text: String, kind: MessageKind) {
        self.to = to;
        self.text = text;
        self.kind = kind;
    }
}
