//! Chat transports (e.g. WhatsApp).
//!
//! `ChatTransport` trait and registry so the gateway can look up the transport a
//! message came from and deliver replies through it. Inbound messages are sent
//! to the dispatcher for classification.

mod inbound;
mod registry;
mod whatsapp;

pub use inbound::InboundMessage;
pub use registry::{ChatTransport, TransportRegistry};
pub use whatsapp::{
    verify_webhook_signature, webhook_signature, WhatsAppChannel, WhatsAppError, WhatsAppWebhook,
    SIGNATURE_HEADER, WHATSAPP_CHANNEL_ID,
};
