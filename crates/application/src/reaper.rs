//! 不活跃参与者清理任务
//!
//! 每个周期：计算截止时间，找出过期参与者，先批量写入离开通知，
//! 写入成功后才删除这些参与者。写入失败则放弃本轮删除，等待下一轮。
//! 删除时仍按截止时间过滤；期间发过心跳的参与者保留，其离开通知随即撤回。

use std::sync::Arc;
use std::time::Duration;

use domain::{stale_cutoff, Message, ParticipantName, Timestamp};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    error::ApplicationError,
    repository::{MessageRepository, ParticipantRepository},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaperSettings {
    pub interval: Duration,
    pub stale_after: Duration,
    pub broadcast_target: String,
}

impl From<&config::PresenceConfig> for ReaperSettings {
    fn from(config: &config::PresenceConfig) -> Self {
        Self {
            interval: config.sweep_interval(),
            stale_after: config.stale_after(),
            broadcast_target: config.broadcast_target.clone(),
        }
    }
}

pub struct ReaperDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 单次清理的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapReport {
    pub cutoff: Timestamp,
    /// 已删除的参与者，每人恰好一条离开通知
    pub departed: Vec<ParticipantName>,
    /// 查询后、删除前刷新了心跳而被保留的参与者
    pub spared: Vec<ParticipantName>,
}

pub struct IdleReaper {
    deps: ReaperDependencies,
    settings: ReaperSettings,
}

impl IdleReaper {
    pub fn new(deps: ReaperDependencies, settings: ReaperSettings) -> Self {
        Self { deps, settings }
    }

    pub async fn sweep(&self) -> Result<ReapReport, ApplicationError> {
        let now = self.deps.clock.now();
        let cutoff = stale_cutoff(now, self.settings.stale_after);

        let stale = self.deps.participant_repository.find_stale(cutoff).await?;
        if stale.is_empty() {
            return Ok(ReapReport {
                cutoff,
                departed: Vec::new(),
                spared: Vec::new(),
            });
        }

        let candidates: Vec<ParticipantName> =
            stale.into_iter().map(|participant| participant.name).collect();
        let notes: Vec<Message> = candidates
            .iter()
            .cloned()
            .map(|name| Message::departure(name, &self.settings.broadcast_target, now))
            .collect();
        let note_ids: Vec<_> = notes.iter().map(|note| (note.from.clone(), note.id)).collect();

        // 离开通知必须先落库，否则本轮不删除
        self.deps.message_repository.insert_many(notes).await?;

        let departed = self
            .deps
            .participant_repository
            .delete_stale(&candidates, cutoff)
            .await?;

        let mut spared = Vec::new();
        for (name, note_id) in note_ids {
            if departed.contains(&name) {
                continue;
            }
            self.deps.message_repository.delete(note_id).await?;
            tracing::debug!(
                participant = %name,
                "participant refreshed during sweep, departure retracted"
            );
            spared.push(name);
        }

        Ok(ReapReport {
            cutoff,
            departed,
            spared,
        })
    }

    /// 按固定间隔执行清理，直到收到取消信号
    pub async fn run(&self, shutdown: CancellationToken) {
        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = period.as_secs_f64(),
            stale_after_secs = self.settings.stale_after.as_secs_f64(),
            "idle reaper started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("idle reaper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match self.sweep().await {
                        Ok(report) if report.departed.is_empty() => {}
                        Ok(report) => tracing::info!(
                            departed = report.departed.len(),
                            spared = report.spared.len(),
                            "removed idle participants"
                        ),
                        // 单轮失败不影响后续周期
                        Err(err) => tracing::error!(error = %err, "idle sweep failed"),
                    }
                }
            }
        }
    }

    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
