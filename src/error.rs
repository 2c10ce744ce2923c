// 错误类型定义
//
// 对象层只有一种“远端错误”：BoxApiError，携带 HTTP 状态码和响应体。
// 其余变体都是本地错误（网络、IO、JSON、参数校验）。

use serde::Deserialize;
use thiserror::Error;

/// SDK 统一错误类型
#[derive(Debug, Error)]
pub enum BoxError {
    /// 远端 API 返回非成功状态
    #[error("{0}")]
    Api(#[from] BoxApiError),

    /// 网络请求错误（连接失败、读取响应流中断等）
    #[error("网络错误: {0}")]
    Network(#[from] reqwest::Error),

    /// 本地 IO 错误（打开上传文件、写入下载目标等）
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 响应格式不符合预期
    #[error("响应格式无效: {0}")]
    InvalidResponse(String),

    /// 调用参数无效（未发出任何请求）
    #[error("参数无效: {0}")]
    InvalidArgument(String),
}

impl BoxError {
    /// API 错误的 HTTP 状态码（其他错误返回 None）
    pub fn status(&self) -> Option<u16> {
        match self {
            BoxError::Api(e) => Some(e.status),
            _ => None,
        }
    }

    /// 是否为远端 API 错误
    pub fn is_api_error(&self) -> bool {
        matches!(self, BoxError::Api(_))
    }
}

/// 远端 API 错误
#[derive(Debug, Clone, Error)]
#[error("API 错误 {status} ({method} {url}): code={code:?}, message={message:?}")]
pub struct BoxApiError {
    /// HTTP 状态码
    pub status: u16,
    /// 错误码（如 "item_name_in_use"）
    pub code: Option<String>,
    /// 错误信息
    pub message: Option<String>,
    /// 请求ID（排查问题时提供给服务端）
    pub request_id: Option<String>,
    /// 请求方法
    pub method: String,
    /// 请求 URL
    pub url: String,
    /// 原始响应体
    pub body: String,
}

/// 错误响应体中可识别的字段
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

impl BoxApiError {
    /// 根据响应构造 API 错误
    ///
    /// 响应体是 JSON 时尽量提取 code/message/request_id，否则只保留原文
    pub fn from_response(status: u16, method: &str, url: &str, body: &[u8]) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        Self {
            status,
            code: parsed.code,
            message: parsed.message,
            request_id: parsed.request_id,
            method: method.to_string(),
            url: url.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// 构造只带状态码的错误
    pub fn with_status(status: u16, method: &str, url: &str) -> Self {
        Self::from_response(status, method, url, b"")
    }

    /// 是否为冲突（409）
    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }

    /// 是否为 If-Match 前置条件失败（412）
    pub fn is_precondition_failed(&self) -> bool {
        self.status == 412
    }
}

/// SDK 结果类型
pub type Result<T> = std::result::Result<T, BoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_parses_json_body() {
        let body = br#"{"type":"error","status":412,"code":"precondition_failed","message":"The resource has been modified.","request_id":"abc123"}"#;
        let err = BoxApiError::from_response(412, "PUT", "https://api.box.com/2.0/files/1", body);

        assert_eq!(err.status, 412);
        assert_eq!(err.code.as_deref(), Some("precondition_failed"));
        assert_eq!(err.request_id.as_deref(), Some("abc123"));
        assert!(err.is_precondition_failed());
        assert!(!err.is_conflict());
        assert!(err.body.contains("precondition_failed"));
    }

    #[test]
    fn test_api_error_keeps_non_json_body() {
        let url = "https://api.box.com/2.0/files/1";
        let err = BoxApiError::from_response(502, "GET", url, b"Bad Gateway");

        assert_eq!(err.status, 502);
        assert!(err.code.is_none());
        assert_eq!(err.body, "Bad Gateway");
    }

    #[test]
    fn test_box_error_status() {
        let err: BoxError = BoxApiError::with_status(409, "DELETE", "u").into();
        assert_eq!(err.status(), Some(409));
        assert!(err.is_api_error());

        let err = BoxError::InvalidArgument("x".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_api_error());
    }
}
