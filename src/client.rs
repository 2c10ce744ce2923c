// 客户端入口

use crate::config::{ApiConfig, SdkConfig};
use crate::error::Result;
use crate::object::{File, Folder, Task};
use crate::session::{ApiRequest, ApiResponse, HttpSession, OAuthToken, Session};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Box 客户端
///
/// 持有传输会话和 API 地址配置，负责创建对象句柄。克隆开销很小，
/// 每个句柄都持有一份
#[derive(Clone)]
pub struct BoxClient {
    session: Arc<dyn Session>,
    api: Arc<ApiConfig>,
}

impl BoxClient {
    /// 使用访问令牌创建客户端（reqwest 传输）
    pub fn new(token: OAuthToken, config: &SdkConfig) -> Result<Self> {
        let session = HttpSession::new(token, &config.http)?;
        info!(
            "初始化 Box 客户端: api={}, upload={}",
            config.api.base_api_url, config.api.upload_url
        );
        Ok(Self::with_session(Arc::new(session), config.api.clone()))
    }

    /// 注入任意传输会话
    pub fn with_session(session: Arc<dyn Session>, api: ApiConfig) -> Self {
        Self {
            session,
            api: Arc::new(api.normalized()),
        }
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    /// 文件句柄（只有 id，不发请求）
    pub fn file(&self, file_id: impl Into<String>) -> File {
        File::new(self.clone(), file_id)
    }

    /// 文件夹句柄（只有 id，不发请求）
    pub fn folder(&self, folder_id: impl Into<String>) -> Folder {
        Folder::new(self.clone(), folder_id)
    }

    /// 任务句柄（只有 id，不发请求）
    pub fn task(&self, task_id: impl Into<String>) -> Task {
        Task::new(self.clone(), task_id)
    }

    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.session.send(request).await
    }
}

impl fmt::Debug for BoxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxClient").field("api", &self.api).finish()
    }
}
