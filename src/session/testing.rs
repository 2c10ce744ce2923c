// 测试用的假会话：记录请求、按方法回放预设响应

use super::request::{ApiRequest, ApiResponse, FormField, Method, RequestBody};
use super::{check_json_body, Session};
use crate::error::{BoxApiError, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::io::AsyncReadExt;

/// 已记录的 multipart 字段（文件内容已读出）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        length: Option<u64>,
        data: Vec<u8>,
    },
}

/// 已记录的请求
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub json: Option<String>,
    pub multipart: Vec<RecordedField>,
    pub stream: bool,
    pub expect_json_response: bool,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn json_value(&self) -> Option<Value> {
        self.json.as_deref().and_then(|s| serde_json::from_str(s).ok())
    }
}

/// 预设响应
enum Reply {
    Body(u16, Vec<u8>),
    ApiError(u16),
}

/// 假会话
#[derive(Default)]
pub struct FakeSession {
    requests: Mutex<Vec<RecordedRequest>>,
    replies: Mutex<HashMap<Method, VecDeque<Reply>>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(reply);
    }

    /// 预设 JSON 响应
    pub fn reply_json(&self, method: Method, value: Value) {
        self.push(method, Reply::Body(200, value.to_string().into_bytes()));
    }

    /// 预设原始响应体
    pub fn reply_bytes(&self, method: Method, status: u16, body: &[u8]) {
        self.push(method, Reply::Body(status, body.to_vec()));
    }

    /// 预设 API 错误
    pub fn reply_error(&self, method: Method, status: u16) {
        self.push(method, Reply::ApiError(status));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_with(&self, method: Method) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    async fn record(request: ApiRequest) -> Result<RecordedRequest> {
        let mut json = None;
        let mut multipart = Vec::new();
        match request.body {
            Some(RequestBody::Json(s)) => json = Some(s),
            Some(RequestBody::Multipart(fields)) => {
                for field in fields {
                    multipart.push(match field {
                        FormField::Text { name, value } => RecordedField::Text { name, value },
                        FormField::File {
                            name,
                            file_name,
                            length,
                            mut stream,
                        } => {
                            let mut data = Vec::new();
                            stream.read_to_end(&mut data).await?;
                            RecordedField::File {
                                name,
                                file_name,
                                length,
                                data,
                            }
                        }
                    });
                }
            }
            None => {}
        }

        Ok(RecordedRequest {
            method: request.method,
            url: request.url,
            params: request.params,
            headers: request.headers,
            json,
            multipart,
            stream: request.stream,
            expect_json_response: request.expect_json_response,
        })
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let recorded = Self::record(request).await?;
        let (method, url, streaming, expect_json) = (
            recorded.method,
            recorded.url.clone(),
            recorded.stream,
            recorded.expect_json_response,
        );
        self.requests.lock().unwrap().push(recorded);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&method)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Reply::Body(200, b"{}".to_vec()));

        match reply {
            Reply::ApiError(status) => {
                Err(BoxApiError::with_status(status, method.as_str(), &url).into())
            }
            Reply::Body(status, body) if !(200..300).contains(&status) => {
                Err(BoxApiError::from_response(status, method.as_str(), &url, &body).into())
            }
            Reply::Body(status, body) if streaming => {
                // 按 3 字节切块，模拟分块到达
                let chunks: Vec<Result<Vec<u8>>> =
                    body.chunks(3).map(|c| Ok(c.to_vec())).collect();
                Ok(ApiResponse::streamed(status, stream::iter(chunks).boxed()))
            }
            Reply::Body(status, body) => {
                if expect_json {
                    check_json_body(status, method, &url, &body)?;
                }
                Ok(ApiResponse::new(status, body))
            }
        }
    }
}
