//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件
//!
//! The loaded config is owned by the caller and injected into `AppState`;
//! there is no global instance. / 配置由调用方持有并注入，不使用全局实例

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::search::process::ProcessLimits;

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    pub server: ServerConfig,
    /// Notes storage configuration / 笔记存储配置
    pub notes: NotesConfig,
    /// Search configuration / 搜索配置
    pub search: SearchConfig,
    /// Client search aggregator configuration / 客户端搜索配置
    pub client: ClientConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Notes configuration / 笔记配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Notes root directory / 笔记根目录
    pub root: String,
    /// Extensions treated as notes, without dot / 笔记文件扩展名
    pub note_extensions: Vec<String>,
    /// Include dot-prefixed entries in search / 是否搜索隐藏条目
    pub include_hidden: bool,
}

/// Search backend selection / 搜索后端选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBackendKind {
    /// In-process walk and grep / 进程内实现
    Native,
    /// find/grep or PowerShell only / 仅外部命令
    External,
    /// External with native fallback / 外部命令，失败时回退
    Auto,
}

/// Search configuration / 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub backend: SearchBackendKind,
    /// Result cap for /api/search / 主搜索结果上限
    pub max_results: usize,
    /// Per-phase cap for /api/quick-search / 快速搜索每阶段上限
    pub legacy_max_results: usize,
    /// Context characters on each side of a content match / 片段上下文长度
    pub snippet_context: usize,
    /// External process timeout (seconds) / 外部进程超时
    pub process_timeout_secs: u64,
    /// External process stdout limit (bytes) / 外部进程输出上限
    pub max_output_bytes: usize,
}

/// Client aggregator configuration / 客户端聚合配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debounce delay (ms) / 防抖延迟
    pub debounce_ms: u64,
    /// Max wait before a request is forced (ms) / 最长等待
    pub max_wait_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8180,
        }
    }
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            root: "data/notes".to_string(),
            note_extensions: vec!["md".to_string()],
            include_hidden: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend: SearchBackendKind::Native,
            max_results: 10,
            legacy_max_results: 5,
            snippet_context: 50,
            process_timeout_secs: 30,
            max_output_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            max_wait_ms: 1500,
        }
    }
}

impl AppConfig {
    /// Get the notes root path / 获取笔记根目录
    pub fn get_notes_root(&self) -> PathBuf {
        PathBuf::from(&self.notes.root)
    }

    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Limits for external search processes / 外部进程限制
    pub fn get_process_limits(&self) -> ProcessLimits {
        ProcessLimits {
            timeout: Duration::from_secs(self.search.process_timeout_secs.max(1)),
            max_output_bytes: self.search.max_output_bytes,
        }
    }

    /// Apply environment overrides / 应用环境变量覆盖
    pub fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("NOTES_ROOT") {
            if !root.trim().is_empty() {
                self.notes.root = root;
            }
        }
    }
}

/// Get the config file path / 获取配置文件路径
pub fn get_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config_path: &Path, config: &AppConfig) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_creates_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = load_config(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.legacy_max_results, 5);
        assert_eq!(config.client.debounce_ms, 500);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"notes":{"root":"/srv/notes"},"search":{"backend":"auto"}}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.get_notes_root(), PathBuf::from("/srv/notes"));
        assert_eq!(config.notes.note_extensions, vec!["md"]);
        assert_eq!(config.search.backend, SearchBackendKind::Auto);
        assert_eq!(config.search.snippet_context, 50);
        assert_eq!(config.server.port, 8180);
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_config(&path).is_err());
    }
}
