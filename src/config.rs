//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置，环境变量可覆盖数据源设置

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 行情数据源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// 新浪财经
    Sina,
    /// Tushare（需要 Token）
    Tushare,
    /// 离线模式，始终使用模拟数据
    Mock,
}

impl ProviderKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sina" => Some(Self::Sina),
            "tushare" => Some(Self::Tushare),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// 数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    /// Tushare Token
    #[serde(default)]
    pub tushare_token: Option<String>,
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// 历史数据回溯年数，加载时限制在 1 ~ MAX_HISTORY_YEARS
    #[serde(default = "default_history_years")]
    pub history_years: u32,
}

/// 历史数据回溯年数上限
pub const MAX_HISTORY_YEARS: u32 = 30;

/// 将回溯年数限制在 1 ~ MAX_HISTORY_YEARS
pub fn clamp_history_years(years: u32) -> u32 {
    years.clamp(1, MAX_HISTORY_YEARS)
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data_source: DataSourceConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// 加载过程中的提示，日志初始化后输出
    #[serde(skip)]
    pub load_notes: Vec<String>,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_provider() -> ProviderKind { ProviderKind::Sina }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_history_years() -> u32 { 3 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            tushare_token: None,
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            history_years: default_history_years(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置，优先从文件，失败则使用默认值，最后应用环境变量覆盖
    ///
    /// 在日志初始化之前调用，加载提示记录在 `load_notes` 中
    pub fn load() -> Self {
        let config_paths = ["config.json", "config/config.json"];
        let mut notes = Vec::new();
        let mut loaded = None;

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        notes.push(format!("从 {} 加载配置成功", path));
                        loaded = Some(config);
                        break;
                    }
                    Err(e) => {
                        notes.push(format!("加载配置文件 {} 失败: {}", path, e));
                    }
                }
            }
        }

        let mut config = loaded.unwrap_or_else(|| {
            notes.push("使用默认配置".to_string());
            Self::default()
        });
        config.load_notes = notes;
        config.normalize();
        config.apply_env_overrides(
            env::var("VALUATION_PROVIDER").ok(),
            env::var("TUSHARE_TOKEN").ok(),
        );
        config
    }

    /// 修正超出范围的配置项
    fn normalize(&mut self) {
        let years = clamp_history_years(self.data_source.history_years);
        if years != self.data_source.history_years {
            self.load_notes.push(format!(
                "history_years={} 超出范围，改为 {}",
                self.data_source.history_years, years
            ));
            self.data_source.history_years = years;
        }
    }

    /// 环境变量覆盖数据源设置
    fn apply_env_overrides(&mut self, provider: Option<String>, token: Option<String>) {
        if let Some(name) = provider {
            match ProviderKind::from_name(&name) {
                Some(kind) => self.data_source.provider = kind,
                None => self
                    .load_notes
                    .push(format!("忽略未知的数据源 VALUATION_PROVIDER={}", name)),
            }
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.data_source.tushare_token = Some(token);
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.data_source.provider, ProviderKind::Sina);
        assert_eq!(config.data_source.history_years, 3);
        assert_eq!(config.data_source.timeout_secs, 30);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{"server":{"port":9000},"data_source":{"provider":"tushare","tushare_token":"abc"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.data_source.provider, ProviderKind::Tushare);
        assert_eq!(config.data_source.tushare_token.as_deref(), Some("abc"));
        assert_eq!(config.data_source.connect_timeout_secs, 10);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(Some("MOCK".to_string()), Some("  ".to_string()));
        assert_eq!(config.data_source.provider, ProviderKind::Mock);
        assert!(config.data_source.tushare_token.is_none());

        config.apply_env_overrides(Some("unknown".to_string()), Some("tok".to_string()));
        assert_eq!(config.data_source.provider, ProviderKind::Mock);
        assert_eq!(config.data_source.tushare_token.as_deref(), Some("tok"));
        assert_eq!(config.load_notes.len(), 1);
    }

    #[test]
    fn test_history_years_clamped() {
        let json = r#"{"data_source":{"history_years":0}}"#;
        let mut config: AppConfig = serde_json::from_str(json).unwrap();
        config.normalize();
        assert_eq!(config.data_source.history_years, 1);
        assert_eq!(config.load_notes.len(), 1);

        config.data_source.history_years = 1000;
        config.normalize();
        assert_eq!(config.data_source.history_years, MAX_HISTORY_YEARS);

        let mut config = AppConfig::default();
        config.normalize();
        assert_eq!(config.data_source.history_years, 3);
        assert!(config.load_notes.is_empty());
    }
}
