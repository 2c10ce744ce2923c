// Box Content API Rust Library
// Box 内容 API 的 Rust 客户端核心库

// 配置管理模块
pub mod config;

// 日志模块
pub mod logging;

// 错误类型
pub mod error;

// 传输会话模块
pub mod session;

// 远端对象模块（文件、文件夹、任务、上传协议）
pub mod object;

// 客户端入口
pub mod client;

// 导出常用类型
pub use client::BoxClient;
pub use config::{ApiConfig, HttpConfig, LogConfig, SdkConfig};
pub use error::{BoxApiError, BoxError, Result};
pub use logging::{init_logging, LogGuard};
pub use object::{
    File, Folder, ItemInfo, ItemRef, LockState, SharedLinkAccess, SharedLinkSettings, Task,
    TaskInfo, UploadOptions,
};
pub use session::{ApiRequest, ApiResponse, ByteStream, HttpSession, Method, OAuthToken, Session};
