// 访问令牌

use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth2 访问令牌
///
/// Debug 输出不包含令牌内容，避免写进日志
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthToken {
    access_token: String,
}

impl OAuthToken {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthToken")
            .field("access_token", &"***")
            .finish()
    }
}
