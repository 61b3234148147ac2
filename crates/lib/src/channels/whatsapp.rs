//! WhatsApp channel: Cloud API webhook payloads in, `/{phone-number-id}/messages` out.

use crate::channels::inbound::InboundMessage;
use crate::channels::registry::ChatTransport;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::atomic::{AtomicBool, Ordering};

pub const WHATSAPP_CHANNEL_ID: &str = "whatsapp";

const WHATSAPP_API_BASE: &str = "https://graph.facebook.com";
const WHATSAPP_API_VERSION: &str = "v19.0";

#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    #[error("whatsapp request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("whatsapp api error: {0}")]
    Api(String),
    #[error("whatsapp channel stopped")]
    Stopped,
}

/// Header Meta signs webhook deliveries with (HMAC-SHA256 of the raw body, keyed by the app secret).
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

fn webhook_mac(app_secret: &str, body: &[u8]) -> Option<Hmac<Sha256>> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(app_secret.as_bytes()).ok()?;
    mac.update(body);
    Some(mac)
}

/// `sha256=<hex>` signature of `body`, as sent in `X-Hub-Signature-256`.
pub fn webhook_signature(app_secret: &str, body: &[u8]) -> Option<String> {
    let digest = webhook_mac(app_secret, body)?.finalize().into_bytes();
    Some(format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest)))
}

/// Check an `X-Hub-Signature-256` header value against `body`. Missing or malformed headers fail.
pub fn verify_webhook_signature(app_secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(digest) = header
        .map(str::trim)
        .and_then(|h| h.strip_prefix(SIGNATURE_PREFIX))
        .and_then(|h| hex::decode(h).ok())
    else {
        return false;
    };
    webhook_mac(app_secret, body)
        .map(|mac| mac.verify_slice(&digest).is_ok())
        .unwrap_or(false)
}

/// Webhook POST body (`object: "whatsapp_business_account"`).
#[derive(Debug, Deserialize)]
pub struct WhatsAppWebhook {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    /// Absent for status callbacks (sent/delivered/read).
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub from: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<WebhookText>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookText {
    pub body: String,
}

impl WhatsAppWebhook {
    /// Text messages carried by this payload. Media, reactions and status updates are skipped.
    pub fn into_inbound(self) -> Vec<InboundMessage> {
        self.entry
            .into_iter()
            .flat_map(|e| e.changes)
            .flat_map(|c| c.value.messages)
            .filter(|m| m.kind.as_deref().unwrap_or("text") == "text")
            .filter_map(|m| {
                let text = m.text?.body;
                Some(InboundMessage {
                    channel_id: WHATSAPP_CHANNEL_ID.to_string(),
                    conversation_id: m.from.clone(),
                    sender_phone: m.from,
                    text,
                })
            })
            .collect()
    }
}

/// WhatsApp Cloud API connector. Inbound arrives through the gateway webhook; this sends replies.
pub struct WhatsAppChannel {
    access_token: String,
    phone_number_id: String,
    api_base: String,
    api_version: String,
    running: AtomicBool,
    client: reqwest::Client,
}

impl WhatsAppChannel {
    pub fn new(
        access_token: String,
        phone_number_id: String,
        api_base: Option<String>,
        api_version: Option<String>,
    ) -> Self {
        let api_base = api_base
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| WHATSAPP_API_BASE.to_string());
        let api_version = api_version
            .map(|v| v.trim().trim_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| WHATSAPP_API_VERSION.to_string());
        Self {
            access_token,
            phone_number_id,
            api_base,
            api_version,
            running: AtomicBool::new(true),
            client: reqwest::Client::new(),
        }
    }

    /// Build from config when both the access token and phone number id are set.
    pub fn from_config(config: &crate::config::Config) -> Option<Self> {
        let token = crate::config::resolve_whatsapp_token(config)?;
        let wa = &config.channels.whatsapp;
        let phone_number_id = wa
            .phone_number_id
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())?;
        Some(Self::new(
            token,
            phone_number_id,
            wa.api_base.clone(),
            wa.api_version.clone(),
        ))
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.api_base, self.api_version, self.phone_number_id
        )
    }

    /// Send a text message via the Cloud API messages endpoint.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(WhatsAppError::Stopped);
        }
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": body }
        });
        let res = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api(format!("{} {}", status, body)));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for WhatsAppChannel {
    fn id(&self) -> &str {
        WHATSAPP_CHANNEL_ID
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn send(&self, target: &str, payload: &str) -> Result<(), String> {
        self.send_text(target, payload).await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEBHOOK: &str = r#"{
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "display_phone_number": "595210000000", "phone_number_id": "1234" },
                    "contacts": [{ "profile": { "name": "Recepción" }, "wa_id": "595981123456" }],
                    "messages": [
                        { "from": "595981123456", "id": "wamid.A", "timestamp": "1760860800", "type": "text",
                          "text": { "body": "URGENTE: Hydrafacial no funciona" } },
                        { "from": "595981123456", "id": "wamid.B", "timestamp": "1760860801", "type": "image",
                          "image": { "id": "media-1" } }
                    ]
                }
            }]
        }]
    }"#;

    #[test]
    fn webhook_yields_text_messages_only() {
        let hook: WhatsAppWebhook = serde_json::from_str(WEBHOOK).unwrap();
        let msgs = hook.into_inbound();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].channel_id, "whatsapp");
        assert_eq!(msgs[0].sender_phone, "595981123456");
        assert_eq!(msgs[0].conversation_id, "595981123456");
        assert_eq!(msgs[0].text, "URGENTE: Hydrafacial no funciona");
    }

    #[test]
    fn status_callbacks_yield_nothing() {
        let json = r#"{ "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "field": "messages",
                "value": { "statuses": [{ "id": "wamid.A", "status": "delivered" }] } }] }] }"#;
        let hook: WhatsAppWebhook = serde_json::from_str(json).unwrap();
        assert!(hook.into_inbound().is_empty());
    }

    #[test]
    fn signature_matches_known_hmac() {
        let body = b"The quick brown fox jumps over the lazy dog";
        assert_eq!(
            webhook_signature("key", body).as_deref(),
            Some("sha256=f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8")
        );
    }

    #[test]
    fn signature_verification() {
        let body = WEBHOOK.as_bytes();
        let good = webhook_signature("app-secret", body).unwrap();
        assert!(verify_webhook_signature("app-secret", body, Some(&good)));
        assert!(!verify_webhook_signature("other-secret", body, Some(&good)));
        assert!(!verify_webhook_signature("app-secret", b"{}", Some(&good)));
        assert!(!verify_webhook_signature("app-secret", body, None));
        assert!(!verify_webhook_signature("app-secret", body, Some("sha256=zz")));
        let bare = good.trim_start_matches("sha256=");
        assert!(!verify_webhook_signature("app-secret", body, Some(bare)));
    }

    #[test]
    fn messages_url_uses_base_and_version() {
        let ch = WhatsAppChannel::new(
            "t".into(),
            "1234".into(),
            Some("http://127.0.0.1:9999/".into()),
            None,
        );
        assert_eq!(ch.messages_url(), "http://127.0.0.1:9999/v19.0/1234/messages");
    }

    #[tokio::test]
    async fn send_after_stop_fails() {
        let ch = WhatsAppChannel::new("t".into(), "1234".into(), None, None);
        ch.stop();
        assert!(matches!(
            ch.send_text("595981123456", "hola").await,
            Err(WhatsAppError::Stopped)
        ));
    }
}
