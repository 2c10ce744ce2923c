// 条件更新（乐观并发）
//
// 所有变更类请求（删除、更新内容、加锁/解锁、共享链接）都通过这里附加
// If-Match。冲突由服务端判定，本层只透传服务端返回的错误

use crate::session::ApiRequest;

/// 条件请求头名称
pub const IF_MATCH: &str = "If-Match";

/// 根据 etag 生成条件请求头
///
/// 提供 etag 时返回恰好一个 `If-Match: <etag>`，否则为空（无条件覆盖）
pub fn conditional_headers(etag: Option<&str>) -> Vec<(String, String)> {
    match etag {
        Some(etag) => vec![(IF_MATCH.to_string(), etag.to_string())],
        None => Vec::new(),
    }
}

/// 给请求附加条件头
pub trait Conditional: Sized {
    fn if_match(self, etag: Option<&str>) -> Self;
}

impl Conditional for ApiRequest {
    fn if_match(mut self, etag: Option<&str>) -> Self {
        // 同名头只保留一个
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(IF_MATCH));
        self.headers.extend(conditional_headers(etag));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_etag_no_header() {
        let req = ApiRequest::delete("https://api.box.com/2.0/files/1").if_match(None);
        assert_eq!(req.header_count(IF_MATCH), 0);
        assert!(conditional_headers(None).is_empty());
    }

    #[test]
    fn test_existing_header_replaced() {
        let req = ApiRequest::put("u")
            .header("if-match", "old")
            .if_match(Some("new"));
        assert_eq!(req.header_count(IF_MATCH), 1);
        assert_eq!(req.header_value(IF_MATCH), Some("new"));
    }

    proptest! {
        #[test]
        fn prop_etag_sent_verbatim_once(etag in "[!-~]{1,32}") {
            let req = ApiRequest::put("u").if_match(Some(&etag));
            prop_assert_eq!(req.header_count(IF_MATCH), 1);
            prop_assert_eq!(req.header_value(IF_MATCH), Some(etag.as_str()));
        }
    }
}
