//! 消息可见性规则
//!
//! 对请求者而言，满足以下任一条件的消息可见：
//! 发往广播目标、发给自己、自己发出、或类型为公开消息（`message`）。
//! 最后一条对所有 `message` 类型生效，与收发双方无关。

use crate::message::{Message, MessageKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    pub requester: String,
    pub broadcast_target: String,
}

impl VisibilityFilter {
    pub fn new(requester: impl Into<String>, broadcast_target: impl Into<String>) -> Self {
        Self {
            requester: requester.into(),
            broadcast_target: broadcast_target.into(),
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        message.to == self.broadcast_target
            || message.to == self.requester
            || message.from.as_str() == self.requester
            || message.kind == MessageKind::Message
    }
}

/// 解析 `limit` 查询参数：只接受正整数，其余情况视为不限制
pub fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|limit| *limit > 0)
}

/// 保留按时间顺序排列的最后 `limit` 条消息
pub fn take_last(mut messages: Vec<Message>, limit: Option<usize>) -> Vec<Message> {
    if let Some(limit) = limit {
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
    }
    messages
}
