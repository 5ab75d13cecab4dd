//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - HTTP 服务监听地址
//! - 数据库连接（未配置时使用内存存储）
//! - 在线状态清理参数
//!
//! 加载顺序：默认值 -> 可选配置文件（`CHAT_CONFIG_FILE`）-> 环境变量（`CHAT_*`，以 `__` 分隔层级）

use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 指向配置文件的环境变量
pub const CONFIG_FILE_ENV: &str = "CHAT_CONFIG_FILE";
/// 环境变量前缀
pub const ENV_PREFIX: &str = "CHAT_";

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 为空时使用内存存储
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

/// 在线状态与清理任务配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// 广播目标，发往该目标的消息对所有人可见
    pub broadcast_target: String,
    /// 清理任务执行间隔（秒）
    pub sweep_interval_secs: u64,
    /// 超过该时长（秒）没有心跳即视为离线
    pub stale_after_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            broadcast_target: "Todos".to_string(),
            sweep_interval_secs: 15,
            stale_after_secs: 10,
        }
    }
}

impl PresenceConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

impl AppConfig {
    /// 按默认值、配置文件、环境变量的顺序加载并校验配置
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// 组装配置来源，便于测试时替换
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                figment = figment.merge(Yaml::file(path));
            } else {
                figment = figment.merge(Toml::file(path));
            }
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.database.url {
            if url.trim().is_empty() {
                return Err(ConfigError::InvalidDatabaseConfig(
                    "database url cannot be blank".to_string(),
                ));
            }
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidDatabaseConfig(
                "max connections must be greater than 0".to_string(),
            ));
        }

        if self.presence.broadcast_target.is_empty() {
            return Err(ConfigError::InvalidPresenceConfig(
                "broadcast target cannot be empty".to_string(),
            ));
        }
        if self.presence.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidPresenceConfig(
                "sweep interval must be greater than 0".to_string(),
            ));
        }
        if self.presence.stale_after_secs == 0 {
            return Err(ConfigError::InvalidPresenceConfig(
                "stale threshold must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// 隐藏数据库密码后的连接串（用于日志）
    pub fn sanitized_database_url(&self) -> Option<String> {
        self.database.url.as_deref().map(|url| match url.rfind('@') {
            Some(at) => {
                let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
                format!("{}[REDACTED]{}", &url[..scheme_end], &url[at..])
            }
            None => url.to_string(),
        })
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid database configuration: {0}")]
    InvalidDatabaseConfig(String),
    #[error("Invalid presence configuration: {0}")]
    InvalidPresenceConfig(String),
}
