// 任务句柄

use super::item::{deserialize_id, ItemRef};
use super::ApiObject;
use crate::client::BoxClient;
use crate::error::Result;
use crate::session::ApiRequest;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// 任务快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    #[serde(rename = "type", default = "default_task_type")]
    pub item_type: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// 任务关联的文件
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_task_type() -> String {
    "task".to_string()
}

impl TaskInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            item_type: default_task_type(),
            id: id.into(),
            item: None,
            action: None,
            message: None,
            due_at: None,
            is_completed: None,
            extra: Map::new(),
        }
    }
}

/// 任务句柄
#[derive(Debug, Clone)]
pub struct Task {
    client: BoxClient,
    info: TaskInfo,
}

impl Task {
    pub(crate) fn new(client: BoxClient, task_id: impl Into<String>) -> Self {
        Self {
            client,
            info: TaskInfo::new(task_id),
        }
    }

    pub fn from_info(client: BoxClient, info: TaskInfo) -> Self {
        Self { client, info }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    pub fn item(&self) -> Option<&ItemRef> {
        self.info.item.as_ref()
    }

    fn url(&self) -> String {
        self.client
            .api()
            .api_url(&format!("tasks/{}", urlencoding::encode(self.id())))
    }

    /// 重新获取任务信息
    pub async fn get(&self) -> Result<Task> {
        let request = ApiRequest::get(self.url());
        let value: Value = self.client.send(request).await?.json().await?;
        Task::from_value(&self.client, value)
    }

    /// 删除任务
    pub async fn delete(&self) -> Result<()> {
        info!("删除任务: id={}", self.id());
        let request = ApiRequest::delete(self.url()).expect_json(false);
        self.client.send(request).await?;
        Ok(())
    }
}

impl ApiObject for Task {
    fn from_value(client: &BoxClient, value: Value) -> Result<Self> {
        Ok(Task::from_info(client.clone(), serde_json::from_value(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::error::BoxError;
    use crate::session::testing::FakeSession;
    use crate::session::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<FakeSession>, BoxClient) {
        let session = Arc::new(FakeSession::new());
        let client = BoxClient::with_session(session.clone(), ApiConfig::default());
        (session, client)
    }

    #[test]
    fn test_task_info_numeric_id_and_extra() {
        let info: TaskInfo = serde_json::from_value(json!({
            "type": "task",
            "id": 77,
            "item": {"type": "file", "id": 9},
            "action": "review",
            "is_completed": false,
            "created_by": {"type": "user", "id": "3"}
        }))
        .unwrap();

        assert_eq!(info.id, "77");
        assert_eq!(info.item, Some(ItemRef::file("9")));
        assert_eq!(info.is_completed, Some(false));
        assert!(info.extra.contains_key("created_by"));
    }

    #[tokio::test]
    async fn test_get_task() {
        let (session, client) = setup();
        session.reply_json(
            Method::Get,
            json!({
                "type": "task",
                "id": "12",
                "message": "看一下",
                "item": {"type": "file", "id": "4"}
            }),
        );

        let task = client.task("12");
        let fresh = task.get().await.unwrap();

        assert_eq!(session.requests()[0].url, "https://api.box.com/2.0/tasks/12");
        assert_eq!(fresh.info().message.as_deref(), Some("看一下"));
        assert_eq!(fresh.item().map(|i| i.id.as_str()), Some("4"));
        // 原句柄不变
        assert!(task.info().message.is_none());
    }

    #[tokio::test]
    async fn test_delete_task() {
        let (session, client) = setup();
        session.reply_bytes(Method::Delete, 204, b"");

        client.task("12").delete().await.unwrap();

        let req = &session.requests()[0];
        assert_eq!(req.method, Method::Delete);
        assert_eq!(req.url, "https://api.box.com/2.0/tasks/12");
        assert!(!req.expect_json_response);
    }

    #[tokio::test]
    async fn test_delete_missing_task() {
        let (session, client) = setup();
        session.reply_error(Method::Delete, 404);

        let err = client.task("12").delete().await.unwrap_err();
        assert!(matches!(err, BoxError::Api(ref api) if api.status == 404));
    }
}
