//! Gateway: HTTP server for WhatsApp webhooks and the classification/ticket API.
//!
//! Single port. Webhook deliveries are queued to the dispatcher and acknowledged
//! immediately; API routes require a bearer token when token auth is configured.

mod protocol;
mod server;

pub use protocol::{ClassifyRequest, ClassifyResponse, TicketsQuery, WebhookVerifyQuery};
pub use server::{build_router, run_gateway, GatewayState};
