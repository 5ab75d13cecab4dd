//! 主应用程序入口
//!
//! 加载配置，选择持久化后端，启动不活跃清理任务与 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{
    Clock, IdleReaper, MemoryMessageRepository, MemoryParticipantRepository, MessageRepository,
    MessageService, MessageServiceDependencies, ParticipantRepository, PresenceService,
    PresenceServiceDependencies, ReaperDependencies, ReaperSettings, SystemClock,
};
use config::AppConfig;
use infrastructure::Infrastructure;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

struct Storage {
    participants: Arc<dyn ParticipantRepository>,
    messages: Arc<dyn MessageRepository>,
}

async fn build_storage(config: &AppConfig) -> anyhow::Result<Storage> {
    if config.database.url.is_none() {
        tracing::warn!("未配置数据库，使用内存存储，重启后数据丢失");
        return Ok(Storage {
            participants: Arc::new(MemoryParticipantRepository::new()),
            messages: Arc::new(MemoryMessageRepository::new()),
        });
    }

    tracing::info!(
        database = config.sanitized_database_url().as_deref().unwrap_or("unknown"),
        "连接数据库"
    );
    let infrastructure = Infrastructure::connect(&config.database)
        .await
        .context("failed to initialise database")?;

    Ok(Storage {
        participants: infrastructure.participant_repository_trait(),
        messages: infrastructure.message_repository_trait(),
    })
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("收到停止信号，开始关闭");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let storage = build_storage(&config).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let broadcast_target = config.presence.broadcast_target.clone();

    let presence_service = PresenceService::new(PresenceServiceDependencies {
        participant_repository: storage.participants.clone(),
        message_repository: storage.messages.clone(),
        clock: clock.clone(),
        broadcast_target: broadcast_target.clone(),
    });
    let message_service = MessageService::new(MessageServiceDependencies {
        participant_repository: storage.participants.clone(),
        message_repository: storage.messages.clone(),
        clock: clock.clone(),
        broadcast_target,
    });

    let shutdown = CancellationToken::new();
    let reaper = Arc::new(IdleReaper::new(
        ReaperDependencies {
            participant_repository: storage.participants,
            message_repository: storage.messages,
            clock,
        },
        ReaperSettings::from(&config.presence),
    ));
    let reaper_handle = reaper.spawn(shutdown.clone());

    let state = AppState::new(Arc::new(presence_service), Arc::new(message_service));
    let app = router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!("聊天服务启动在 http://{address}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // 服务器因其他原因退出时也要停止清理任务
    shutdown.cancel();
    if let Err(err) = reaper_handle.await {
        tracing::error!(error = %err, "idle reaper task failed");
    }

    tracing::info!("服务已停止");
    Ok(())
}
