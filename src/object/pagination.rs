// limit/offset 分页

use super::ApiObject;
use crate::client::BoxClient;
use crate::error::Result;
use crate::session::ApiRequest;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

/// 默认每页数量
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    entries: Vec<Value>,
    #[serde(default)]
    total_count: Option<u64>,
}

/// limit/offset 分页迭代器
///
/// 按需拉取下一页；收到不足一页的结果、空页或达到 total_count 时结束
pub struct LimitOffsetPager<T> {
    client: BoxClient,
    url: String,
    limit: u32,
    offset: u64,
    buffer: VecDeque<T>,
    done: bool,
}

impl<T: ApiObject> LimitOffsetPager<T> {
    pub fn new(client: BoxClient, url: String, limit: u32) -> Self {
        Self {
            client,
            url,
            limit: limit.max(1),
            offset: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// 下一项，没有更多时返回 None
    pub async fn next(&mut self) -> Result<Option<T>> {
        if self.buffer.is_empty() && !self.done {
            self.fetch_page().await?;
        }
        Ok(self.buffer.pop_front())
    }

    /// 拉取剩余全部项
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let mut request = ApiRequest::get(&self.url).param("limit", self.limit.to_string());
        if self.offset > 0 {
            request = request.param("offset", self.offset.to_string());
        }

        let page: Page = self.client.send(request).await?.json().await?;
        let count = page.entries.len() as u64;
        debug!(
            "分页: url={}, offset={}, 本页 {} 项, total_count={:?}",
            self.url, self.offset, count, page.total_count
        );

        for entry in page.entries {
            self.buffer.push_back(T::from_value(&self.client, entry)?);
        }

        self.offset += count;
        self.done = count == 0
            || count < self.limit as u64
            || page.total_count.map_or(false, |total| self.offset >= total);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::object::Task;
    use crate::session::testing::FakeSession;
    use crate::session::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn task(id: u32) -> Value {
        json!({"type": "task", "id": id.to_string(), "item": {"type": "file", "id": "1"}})
    }

    #[tokio::test]
    async fn test_pages_until_total_count() {
        let session = Arc::new(FakeSession::new());
        session.reply_json(Method::Get, json!({"total_count": 3, "entries": [task(1), task(2)]}));
        session.reply_json(Method::Get, json!({"total_count": 3, "entries": [task(3)]}));
        let client = BoxClient::with_session(session.clone(), ApiConfig::default());

        let pager: LimitOffsetPager<Task> =
            LimitOffsetPager::new(client, "https://api.box.com/2.0/files/1/tasks".into(), 2);
        let tasks = pager.collect_all().await.unwrap();

        let ids: Vec<&str> = tasks.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let requests = session.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].params, vec![("limit".to_string(), "2".to_string())]);
        assert_eq!(
            requests[1].params,
            vec![
                ("limit".to_string(), "2".to_string()),
                ("offset".to_string(), "2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_page_ends() {
        let session = Arc::new(FakeSession::new());
        session.reply_json(Method::Get, json!({"entries": []}));
        let client = BoxClient::with_session(session.clone(), ApiConfig::default());

        let mut pager: LimitOffsetPager<Task> =
            LimitOffsetPager::new(client, "https://api.box.com/2.0/files/1/tasks".into(), 100);
        assert!(pager.next().await.unwrap().is_none());
        assert!(pager.next().await.unwrap().is_none());
        assert_eq!(session.requests().len(), 1);
    }
}
