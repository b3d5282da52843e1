//! Request and response bodies for the Toncenter-style JSON API
//!
//! Responses keep every field optional: providers disagree on which fields
//! they populate and the client decides what is fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic response wrapper: `ok`, then either `result` or `error`
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub(crate) ok: bool,
    pub(crate) result: Option<T>,
    pub(crate) error: Option<Value>,
    pub(crate) code: Option<i64>,
    #[serde(rename = "@extra")]
    pub(crate) extra: Option<String>,
}

impl<T> ApiResponse<T> {
    /// The error payload rendered as plain text, verbatim where possible
    pub(crate) fn error_text(&self) -> String {
        match &self.error {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => match self.code {
                Some(code) => format!("provider error code {code}"),
                None => "unknown provider error".to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunGetMethodRequest {
    pub(crate) address: String,
    pub(crate) method: String,
    pub(crate) stack: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RunGetMethodResult {
    pub(crate) exit_code: Option<i64>,
    /// Stack entries come as `[type, value]` pairs, e.g. `["num", "0x3"]`
    pub(crate) stack: Option<Vec<(String, Value)>>,
}

#[derive(Debug, Deserialize)]
pub struct MasterchainInfo {
    pub(crate) last: Option<BlockHeader>,
}

#[derive(Debug, Deserialize)]
pub struct BlockHeader {
    pub(crate) utime: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SendBocRequest {
    pub(crate) boc: String,
}

#[derive(Debug, Deserialize)]
pub struct SendBocResult {
    pub(crate) hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_get_method_response_parses() {
        let body = r#"{
            "ok": true,
            "result": {"exit_code": 0, "stack": [["num", "0x3"]]},
            "@extra": "1700000000.123:0:0.5"
        }"#;
        let resp: ApiResponse<RunGetMethodResult> = serde_json::from_str(body).unwrap();
        assert!(resp.ok);
        let stack = resp.result.unwrap().stack.unwrap();
        assert_eq!(stack[0].0, "num");
        assert_eq!(stack[0].1.as_str().unwrap(), "0x3");
    }

    #[test]
    fn test_error_response_parses() {
        let body = r#"{"ok": false, "error": "LITE_SERVER_UNKNOWN: account not found", "code": 500}"#;
        let resp: ApiResponse<RunGetMethodResult> = serde_json::from_str(body).unwrap();
        assert!(!resp.ok);
        assert!(resp.error_text().contains("account not found"));
    }

    #[test]
    fn test_structured_error_rendered() {
        let body = r#"{"ok": false, "error": {"exitcode": 33}}"#;
        let resp: ApiResponse<SendBocResult> = serde_json::from_str(body).unwrap();
        assert!(resp.error_text().contains("33"));
    }

    #[test]
    fn test_masterchain_info_parses() {
        let body = r#"{"ok": true, "result": {"last": {"utime": 1700000000, "seqno": 12345}}}"#;
        let resp: ApiResponse<MasterchainInfo> = serde_json::from_str(body).unwrap();
        assert_eq!(resp.result.unwrap().last.unwrap().utime, Some(1700000000));
    }
}
