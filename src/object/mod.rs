// 远端对象模块
//
// 句柄是不可变快照：变更操作返回新句柄，原句柄保持不变

pub mod conditional;
pub mod file;
pub mod folder;
pub mod item;
pub mod pagination;
pub mod shared_link;
pub mod task;
pub mod upload;

pub use conditional::{conditional_headers, Conditional, IF_MATCH};
pub use file::File;
pub use folder::Folder;
pub use item::{ItemInfo, ItemRef, LockInfo, LockState, SharedLinkInfo};
pub use pagination::{LimitOffsetPager, DEFAULT_PAGE_LIMIT};
pub use shared_link::{SharedLinkAccess, SharedLinkPermissions, SharedLinkSettings};
pub use task::{Task, TaskInfo};
pub use upload::{
    preflight, resolve_upload_target, PreflightRequest, UploadDestination, UploadOptions,
    UploadTarget,
};

use crate::client::BoxClient;
use crate::error::Result;
use serde_json::Value;

/// 可以从响应 JSON 构造的对象句柄
pub trait ApiObject: Sized {
    fn from_value(client: &BoxClient, value: Value) -> Result<Self>;
}
