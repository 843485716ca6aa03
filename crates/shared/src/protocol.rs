use serde::{Deserialize, Serialize};

/// Response body of `GET /oauth2/client_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfoResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ClientInfoResponse {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Structured result handed back to callers of a launch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchResult {
    pub success: bool,
    pub message: String,
}

impl LaunchResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_info_without_data_or_msg_parses() {
        let body: ClientInfoResponse = serde_json::from_str(r#"{"code":0}"#).expect("parse");
        assert!(body.is_ok());
        assert!(body.msg.is_empty());
        assert!(body.data.is_none());
    }

    #[test]
    fn non_zero_code_is_not_ok() {
        let body: ClientInfoResponse =
            serde_json::from_str(r#"{"code":40001,"msg":"unknown client","data":null}"#)
                .expect("parse");
        assert!(!body.is_ok());
        assert_eq!(body.msg, "unknown client");
    }

    #[test]
    fn launch_result_serializes_to_wire_shape() {
        let json = serde_json::to_value(LaunchResult::failed("nope")).expect("serialize");
        assert_eq!(json, serde_json::json!({ "success": false, "message": "nope" }));
    }
}
