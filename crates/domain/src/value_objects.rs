use std::fmt;

use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

/// 统一的时间戳类型。
pub type Timestamp = OffsetDateTime;

/// 默认的广播目标：发往该目标的消息对所有人可见。
pub const DEFAULT_BROADCAST_TARGET: &str = "Todos";

/// 消息唯一标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// 解析外部传入的标识，格式不合法时返回 `None`
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<MessageId> for Uuid {
    fn from(value: MessageId) -> Self {
        value.0
    }
}

/// 参与者名称，同时也是参与者的唯一标识。
///
/// 只能通过校验层（`validation`）构造出合法值；这里不重复校验规则。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 消息展示用的时间格式 `HH:MM:SS`。
pub fn format_clock_time(at: Timestamp) -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    at.format(format)
        .unwrap_or_else(|_| format!("{:02}:{:02}:{:02}", at.hour(), at.minute(), at.second()))
}

/// 以 Unix 毫秒序列化时间戳（`lastStatus` 字段的对外格式）。
pub mod unix_millis {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = value.unix_timestamp_nanos() / 1_000_000;
        serializer.serialize_i64(millis as i64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = i64::deserialize(deserializer)?;
        OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
            .map_err(D::Error::custom)
    }
}
