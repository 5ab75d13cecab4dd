use serde::{Deserialize, Serialize};
use time::Duration;

use crate::value_objects::{unix_millis, ParticipantName, Timestamp};

/// 在线参与者。名称唯一，`last_status` 为最近一次活动时间。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: ParticipantName,
    #[serde(rename = "lastStatus", with = "unix_millis")]
    pub last_status: Timestamp,
}

impl Participant {
    pub fn join(name: ParticipantName, now: Timestamp) -> Self {
        Self {
            name,
            last_status: now,
        }
    }

    pub fn heartbeat(&mut self, now: Timestamp) {
        self.last_status = now;
    }

    /// 截止时间之前（含）没有活动即视为过期
    pub fn is_stale(&self, cutoff: Timestamp) -> bool {
        self.last_status <= cutoff
    }
}

/// 根据当前时间与不活跃阈值计算过期截止时间。
pub fn stale_cutoff(now: Timestamp, stale_after: std::time::Duration) -> Timestamp {
    let stale_after = Duration::try_from(stale_after).unwrap_or(Duration::MAX);
    now.checked_sub(stale_after).unwrap_or(Timestamp::UNIX_EPOCH)
}
