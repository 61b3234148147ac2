//! Gateway HTTP request/response bodies.

use crate::classifier::ClassificationResult;
use crate::tickets::TicketDetails;
use serde::{Deserialize, Serialize};

/// Body of `POST /classify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub text: String,
    #[serde(default)]
    pub sender_phone: String,
}

/// Response of `POST /classify`: the classification plus reply previews (no ticket is stored).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub classification: ClassificationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_notification: Option<String>,
}

/// Query of `GET /whatsapp/webhook` (Meta verification handshake).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Query of `GET /tickets`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketsQuery {
    pub limit: Option<usize>,
}

impl WebhookVerifyQuery {
    /// The challenge to echo when mode is "subscribe" and the token matches `expected`.
    pub fn accept(&self, expected: Option<&str>) -> Option<&str> {
        let expected = expected?;
        if self.mode.as_deref() != Some("subscribe") {
            return None;
        }
        if self.verify_token.as_deref() != Some(expected) {
            return None;
        }
        self.challenge.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(mode: &str, token: &str) -> WebhookVerifyQuery {
        WebhookVerifyQuery {
            mode: Some(mode.to_string()),
            verify_token: Some(token.to_string()),
            challenge: Some("1158201444".to_string()),
        }
    }

    #[test]
    fn verify_accepts_matching_subscribe() {
        assert_eq!(query("subscribe", "v").accept(Some("v")), Some("1158201444"));
    }

    #[test]
    fn verify_rejects_wrong_token_mode_or_unset_token() {
        assert_eq!(query("subscribe", "x").accept(Some("v")), None);
        assert_eq!(query("unsubscribe", "v").accept(Some("v")), None);
        assert_eq!(query("subscribe", "v").accept(None), None);
    }

    #[test]
    fn classify_request_phone_defaults_empty() {
        let req: ClassifyRequest = serde_json::from_str(r#"{ "text": "hola" }"#).unwrap();
        assert_eq!(req.sender_phone, "");
    }
}
