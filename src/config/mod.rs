// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// SDK 配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkConfig {
    /// API 端点配置
    #[serde(default)]
    pub api: ApiConfig,
    /// HTTP 客户端配置
    #[serde(default)]
    pub http: HttpConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// API 端点配置
///
/// 上传走独立的上传域名，其余请求走标准 API 域名
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 标准 API 根地址
    #[serde(default = "default_base_api_url")]
    pub base_api_url: String,
    /// 上传 API 根地址
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
}

fn default_base_api_url() -> String {
    "https://api.box.com/2.0".to_string()
}

fn default_upload_url() -> String {
    "https://upload.box.com/api/2.0".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_api_url: default_base_api_url(),
            upload_url: default_upload_url(),
        }
    }
}

impl ApiConfig {
    /// 使用自定义根地址（去掉末尾的 `/`）
    pub fn new(base_api_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        Self {
            base_api_url: base_api_url.into(),
            upload_url: upload_url.into(),
        }
        .normalized()
    }

    /// 去掉根地址末尾的 `/`
    pub fn normalized(mut self) -> Self {
        self.base_api_url = self.base_api_url.trim_end_matches('/').to_string();
        self.upload_url = self.upload_url.trim_end_matches('/').to_string();
        self
    }

    /// 拼接标准 API 地址
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_api_url, path.trim_start_matches('/'))
    }

    /// 把标准 API 地址映射到上传域名
    ///
    /// 例如 `https://api.box.com/2.0/files/1/content`
    /// -> `https://upload.box.com/api/2.0/files/1/content`
    pub fn upload_url_for(&self, api_url: &str) -> String {
        match api_url.strip_prefix(&self.base_api_url) {
            Some(rest) => format!("{}{}", self.upload_url, rest),
            None => api_url.to_string(),
        }
    }
}

/// HTTP 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 代理地址（支持 http/https/socks5）
    #[serde(default)]
    pub proxy: Option<String>,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("box-content-rust/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            proxy: None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否额外输出到日志文件
    #[serde(default)]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志级别（默认 info，RUST_LOG 优先）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            level: default_log_level(),
        }
    }
}

impl SdkConfig {
    /// 从文件加载配置
    pub async fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;

        let mut config: SdkConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        config.api = config.api.normalized();

        if config.api.base_api_url.is_empty() || config.api.upload_url.is_empty() {
            anyhow::bail!("配置文件中的 API 地址不能为空");
        }

        Ok(config)
    }

    /// 保存配置到文件
    pub async fn save_to_file(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // 确保父目录存在
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        fs::write(path, content)
            .await
            .context("Failed to write config file")?;

        tracing::info!("配置已保存: {}", path);
        Ok(())
    }

    /// 加载配置，失败时使用默认配置
    pub async fn load_or_default(path: &str) -> Self {
        match Self::load_from_file(path).await {
            Ok(config) => {
                tracing::info!("配置文件加载成功: {}", path);
                config
            }
            Err(e) => {
                tracing::warn!("配置文件加载失败，使用默认配置: {:#}", e);
                Self::default()
            }
        }
    }
}
