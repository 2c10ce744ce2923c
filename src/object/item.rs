// 远端对象快照
//
// 已知字段有类型化访问方法，未知字段原样保存在 extra 中

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// 反序列化 id：服务端返回字符串，部分旧接口返回数字
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Str(String),
        Num(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Str(s) => s,
        RawId::Num(n) => n.to_string(),
    })
}

/// 对象引用（type + id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
}

impl ItemRef {
    pub fn file(id: impl Into<String>) -> Self {
        Self {
            item_type: "file".to_string(),
            id: id.into(),
        }
    }

    pub fn folder(id: impl Into<String>) -> Self {
        Self {
            item_type: "folder".to_string(),
            id: id.into(),
        }
    }
}

/// 文件锁信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// 禁止下载
    #[serde(default)]
    pub is_download_prevented: bool,
    /// 过期时间（ISO-8601）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 文件的锁状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { prevent_download: bool },
}

/// 共享链接信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedLinkInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 文件/文件夹快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    #[serde(rename = "type")]
    pub item_type: String,

    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// 版本标记，用于 If-Match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<LockInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_link: Option<SharedLinkInfo>,

    /// 其他未建模字段
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ItemInfo {
    /// 只有 type + id 的快照
    pub fn new(item_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            id: id.into(),
            etag: None,
            sequence_id: None,
            name: None,
            size: None,
            sha1: None,
            lock: None,
            shared_link: None,
            extra: Map::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// 按名称读取未建模字段
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn lock_state(&self) -> LockState {
        match &self.lock {
            Some(lock) => LockState::Locked {
                prevent_download: lock.is_download_prevented,
            },
            None => LockState::Unlocked,
        }
    }

    pub fn to_ref(&self) -> ItemRef {
        ItemRef {
            item_type: self.item_type.clone(),
            id: self.id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_and_unknown_fields() {
        let info: ItemInfo = serde_json::from_value(json!({
            "type": "file",
            "id": "12345",
            "etag": "3",
            "name": "report.pdf",
            "size": 2048,
            "description": "季度报告",
            "path_collection": {"total_count": 0, "entries": []}
        }))
        .unwrap();

        assert_eq!(info.id, "12345");
        assert_eq!(info.etag(), Some("3"));
        assert_eq!(info.name(), Some("report.pdf"));
        assert_eq!(info.size, Some(2048));
        assert_eq!(info.field("description"), Some(&json!("季度报告")));
        assert!(info.field("etag").is_none());
        assert_eq!(info.lock_state(), LockState::Unlocked);
    }

    #[test]
    fn test_numeric_id_accepted() {
        let info: ItemInfo = serde_json::from_value(json!({"type": "file", "id": 42})).unwrap();
        assert_eq!(info.id, "42");
    }

    #[test]
    fn test_lock_state() {
        let info: ItemInfo = serde_json::from_value(json!({
            "type": "file",
            "id": "1",
            "lock": {"type": "lock", "id": "9", "is_download_prevented": true}
        }))
        .unwrap();
        assert_eq!(
            info.lock_state(),
            LockState::Locked {
                prevent_download: true
            }
        );

        let info: ItemInfo =
            serde_json::from_value(json!({"type": "file", "id": "1", "lock": null})).unwrap();
        assert_eq!(info.lock_state(), LockState::Unlocked);
    }

    #[test]
    fn test_unknown_fields_survive_serialization() {
        let value = json!({"type": "file", "id": "1", "custom": {"a": 1}});
        let info: ItemInfo = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&info).unwrap(), value);
    }
}
