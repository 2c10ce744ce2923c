// 共享链接请求体
//
// 只序列化调用方给出的字段，未给出的键整体省略（不会发送 null）

use chrono::{DateTime, SecondsFormat, TimeZone};
use serde::Serialize;
use std::fmt::Display;

/// 共享链接访问级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SharedLinkAccess {
    /// 任何人可访问
    Open,
    /// 同一企业内可访问
    Company,
    /// 仅协作者可访问
    Collaborators,
}

/// 共享链接权限
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SharedLinkPermissions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_download: Option<bool>,
}

/// 共享链接设置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SharedLinkSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    access: Option<SharedLinkAccess>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unshared_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    permissions: Option<SharedLinkPermissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

impl SharedLinkSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access(mut self, access: SharedLinkAccess) -> Self {
        self.access = Some(access);
        self
    }

    /// 链接失效时间，按 ISO-8601（带时区偏移）发送
    pub fn unshared_at<Tz>(mut self, at: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.unshared_at = Some(at.to_rfc3339_opts(SecondsFormat::AutoSi, false));
        self
    }

    pub fn allow_preview(mut self, allow: bool) -> Self {
        self.permissions.get_or_insert_with(Default::default).can_preview = Some(allow);
        self
    }

    pub fn allow_download(mut self, allow: bool) -> Self {
        self.permissions.get_or_insert_with(Default::default).can_download = Some(allow);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// PUT 请求体：`{"shared_link": {...}}`
#[derive(Debug, Serialize)]
pub(crate) struct SharedLinkUpdate<'a> {
    pub shared_link: Option<&'a SharedLinkSettings>,
}
