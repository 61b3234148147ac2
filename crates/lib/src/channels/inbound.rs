//! Inbound message from a channel: delivered to the dispatcher for classification.

/// A chat message received by a transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub channel_id: String,
    /// Chat the message arrived in (a group or a direct chat).
    pub conversation_id: String,
    /// Sender's phone as reported by the transport; normalized later.
    pub sender_phone: String,
    pub text: String,
}
