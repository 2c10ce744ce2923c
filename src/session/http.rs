// 基于 reqwest 的传输会话实现

use super::request::{ApiRequest, ApiResponse, FormField, Method, RequestBody};
use super::token::OAuthToken;
use super::{check_json_body, Session};
use crate::config::HttpConfig;
use crate::error::{BoxApiError, BoxError, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{multipart, Body, Client};
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

/// HTTP 传输会话
#[derive(Debug, Clone)]
pub struct HttpSession {
    /// HTTP客户端
    client: Client,
    /// 访问令牌
    token: OAuthToken,
}

impl HttpSession {
    /// 创建新的 HTTP 会话
    ///
    /// # 参数
    /// * `token` - 访问令牌
    /// * `config` - HTTP 配置（超时、UA、代理）
    pub fn new(token: OAuthToken, config: &HttpConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| BoxError::InvalidArgument(format!("代理地址无效: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        info!(
            "初始化 HTTP 会话: timeout={}s, proxy={}",
            config.timeout_secs,
            if config.proxy.is_some() { "已设置" } else { "未设置" }
        );

        Ok(Self { client, token })
    }

    fn reqwest_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }

    /// 把 ApiRequest 转换为 reqwest 请求
    fn build(&self, request: ApiRequest) -> Result<reqwest::RequestBuilder> {
        let mut builder = self
            .client
            .request(Self::reqwest_method(request.method), &request.url)
            .bearer_auth(self.token.access_token());

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| BoxError::InvalidArgument(format!("请求头名称无效 {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                BoxError::InvalidArgument(format!("请求头 {} 的值无效: {}", name, e))
            })?;
            builder = builder.header(name, value);
        }

        match request.body {
            Some(RequestBody::Json(body)) => {
                builder = builder.header(CONTENT_TYPE, "application/json").body(body);
            }
            Some(RequestBody::Multipart(fields)) => {
                let mut form = multipart::Form::new();
                for field in fields {
                    form = match field {
                        FormField::Text { name, value } => form.text(name, value),
                        FormField::File {
                            name,
                            file_name,
                            length,
                            stream,
                        } => {
                            let body = Body::wrap_stream(ReaderStream::new(stream));
                            // 长度已知时表单可以计算出 Content-Length
                            let part = match length {
                                Some(length) => multipart::Part::stream_with_length(body, length),
                                None => multipart::Part::stream(body),
                            };
                            let part = part
                                .file_name(file_name)
                                .mime_str("application/octet-stream")?;
                            form.part(name, part)
                        }
                    };
                }
                builder = builder.multipart(form);
            }
            None => {}
        }

        Ok(builder)
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let method = request.method;
        let url = request.url.clone();
        let stream = request.stream;
        let expect_json = request.expect_json_response;

        debug!("发送请求: {} {}", method, url);

        let response = self.build(request)?.send().await?;
        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        if !response.status().is_success() {
            let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            let api_error = BoxApiError::from_response(status, method.as_str(), &url, &body);
            error!(
                "API 请求失败: {} {}, status={}, code={:?}, request_id={:?}",
                method, url, status, api_error.code, api_error.request_id
            );
            return Err(api_error.into());
        }

        if stream {
            debug!("流式响应: {} {}, status={}", method, url, status);
            let body = response
                .bytes_stream()
                .map_ok(|chunk| chunk.to_vec())
                .map_err(BoxError::from)
                .boxed();
            return Ok(ApiResponse::streamed(status, body).with_headers(headers));
        }

        let body = response.bytes().await?.to_vec();
        debug!(
            "响应: {} {}, status={}, {} bytes",
            method,
            url,
            status,
            body.len()
        );

        if expect_json {
            check_json_body(status, method, &url, &body)?;
        }

        Ok(ApiResponse::new(status, body).with_headers(headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = HttpSession::new(OAuthToken::new("t"), &HttpConfig::default());
        assert!(session.is_ok());
    }

    #[test]
    fn test_proxy_invalid() {
        let config = HttpConfig {
            proxy: Some(":::::::".to_string()),
            ..HttpConfig::default()
        };
        let res = HttpSession::new(OAuthToken::new("t"), &config);
        assert!(matches!(res, Err(BoxError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let session = HttpSession::new(OAuthToken::new("t"), &HttpConfig::default()).unwrap();
        let req = ApiRequest::get("http://127.0.0.1/x").header("If-Match", "bad\nvalue");
        assert!(matches!(session.build(req), Err(BoxError::InvalidArgument(_))));
    }
}
