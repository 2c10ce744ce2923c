// 传输会话模块
//
// 对象层只依赖 Session trait，测试时可以注入假实现

pub mod http;
pub mod request;
pub mod token;

#[cfg(test)]
pub mod testing;

pub use http::HttpSession;
pub use request::{
    ApiRequest, ApiResponse, BodyStream, ByteStream, FormField, Method, RequestBody, ResponseBody,
};
pub use token::OAuthToken;

use crate::error::{BoxApiError, Result};
use async_trait::async_trait;

/// 传输会话
///
/// 发出一次请求并返回响应；非成功状态必须以 `BoxError::Api` 返回
#[async_trait]
pub trait Session: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// 要求 JSON 响应但响应体不是 JSON 时，按 API 错误处理（保留状态码）
pub(crate) fn check_json_body(status: u16, method: Method, url: &str, body: &[u8]) -> Result<()> {
    if serde_json::from_slice::<serde::de::IgnoredAny>(body).is_err() {
        let mut err = BoxApiError::from_response(status, method.as_str(), url, body);
        err.message = Some("Non-json response received, while expecting json response.".into());
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_json_body() {
        assert!(check_json_body(200, Method::Get, "u", br#"{"a":1}"#).is_ok());

        let err = check_json_body(200, Method::Get, "u", b"<html>").unwrap_err();
        assert_eq!(err.status(), Some(200));
    }
}
