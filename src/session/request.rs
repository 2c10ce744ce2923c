// 请求/响应数据类型

use crate::error::{BoxError, Result};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use tokio::io::AsyncRead;

/// 上传字节流
pub type ByteStream = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// 下载字节流（逐块产出响应体）
pub type BodyStream = BoxStream<'static, Result<Vec<u8>>>;

/// HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// multipart 表单字段
pub enum FormField {
    /// 文本字段
    Text { name: String, value: String },
    /// 文件字段（内容以流的方式发送）
    ///
    /// `length` 已知时整个表单带 Content-Length 发送，否则分块发送
    File {
        name: String,
        file_name: String,
        length: Option<u64>,
        stream: ByteStream,
    },
}

impl fmt::Debug for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            FormField::File {
                name,
                file_name,
                length,
                ..
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("length", length)
                .finish_non_exhaustive(),
        }
    }
}

/// 请求体
#[derive(Debug)]
pub enum RequestBody {
    /// JSON 字符串
    Json(String),
    /// multipart 表单
    Multipart(Vec<FormField>),
}

/// 一次 API 请求
///
/// 每次调用新建，不跨调用复用
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    /// 响应体是否以流的方式返回
    pub stream: bool,
    /// 响应体是否必须是 JSON
    pub expect_json_response: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
            body: None,
            stream: false,
            expect_json_response: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    pub fn options(url: impl Into<String>) -> Self {
        Self::new(Method::Options, url)
    }

    /// 添加查询参数
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// 添加请求头
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// 以 JSON 序列化请求体
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(RequestBody::Json(serde_json::to_string(body)?));
        Ok(self)
    }

    /// 使用 multipart 表单请求体
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = Some(RequestBody::Multipart(fields));
        self
    }

    /// 流式读取响应体
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn expect_json(mut self, expect: bool) -> Self {
        self.expect_json_response = expect;
        self
    }

    /// 按名称查找请求头（大小写不敏感）
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 某个请求头出现的次数（大小写不敏感）
    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .count()
    }

    /// JSON 请求体（如果有）
    pub fn json_body(&self) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Json(s)) => Some(s),
            _ => None,
        }
    }
}

/// 响应体
pub enum ResponseBody {
    Bytes(Vec<u8>),
    Stream(BodyStream),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            ResponseBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// 一次 API 响应
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    body: ResponseBody,
}

impl ApiResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ResponseBody::Bytes(body),
        }
    }

    /// 以 JSON 值构造响应
    pub fn from_json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string().into_bytes())
    }

    pub fn streamed(status: u16, stream: BodyStream) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: ResponseBody::Stream(stream),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 读取完整响应体
    pub async fn bytes(self) -> Result<Vec<u8>> {
        match self.body {
            ResponseBody::Bytes(b) => Ok(b),
            ResponseBody::Stream(s) => {
                let chunks: Vec<Vec<u8>> = s.try_collect().await?;
                Ok(chunks.concat())
            }
        }
    }

    /// 将响应体解析为 JSON
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.bytes().await?;
        serde_json::from_slice(&body).map_err(BoxError::from)
    }

    /// 转换为字节流（非流式响应产出单个块）
    pub fn into_stream(self) -> BodyStream {
        match self.body {
            ResponseBody::Bytes(b) => stream::once(async move { Ok(b) }).boxed(),
            ResponseBody::Stream(s) => s,
        }
    }
}
