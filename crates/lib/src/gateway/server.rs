//! Gateway HTTP server (single port).

use crate::channels::{
    verify_webhook_signature, InboundMessage, TransportRegistry, WhatsAppChannel, WhatsAppWebhook,
    SIGNATURE_HEADER,
};
use crate::classifier::MessageClassifier;
use crate::compose::ResponseComposer;
use crate::config::{self, Config};
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::gateway::protocol::{ClassifyRequest, ClassifyResponse, TicketsQuery, WebhookVerifyQuery};
use crate::init;
use crate::tickets::{TicketDetails, TicketStore, PREVIEW_TICKET_NUMBER};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

const PROTOCOL_VERSION: u32 = 1;

const DEFAULT_TICKETS_LIMIT: usize = 20;
const MAX_TICKETS_LIMIT: usize = 200;

/// Shared state for the gateway (config, dispatcher, transports).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// When Some, API routes require `Authorization: Bearer <token>`.
    pub required_token: Option<String>,
    /// Token expected during WhatsApp webhook verification. None rejects verification.
    pub verify_token: Option<String>,
    /// When Some, webhook POSTs must carry a valid `X-Hub-Signature-256`.
    pub app_secret: Option<String>,
    /// Sender for inbound chat messages (webhook POSTs). Processor task receives.
    pub inbound_tx: mpsc::Sender<InboundMessage>,
    pub dispatcher: Arc<Dispatcher>,
    pub transports: Arc<TransportRegistry>,
}

/// When auth mode is token and a token is configured, returns it for API route checks.
fn require_api_token(config: &Config) -> Option<String> {
    if config.gateway.auth.mode == config::GatewayAuthMode::Token {
        config::resolve_gateway_token(config)
    } else {
        None
    }
}

fn authorized(state: &GatewayState, headers: &HeaderMap) -> bool {
    let Some(expected) = state.required_token.as_deref() else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim() == expected)
        .unwrap_or(false)
}

/// Build the router over an already-assembled state.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/whatsapp/webhook", get(whatsapp_verify).post(whatsapp_webhook))
        .route("/classify", post(classify_http))
        .route("/tickets", get(tickets_http))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// When bind is not loopback, token auth and the WhatsApp app secret must be configured or startup fails.
/// Blocks until shutdown (e.g. Ctrl+C).
/// `config_path` is the path to the config file (used to resolve the tickets file).
pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    init::require_initialized(&config_path)?;
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        let token = config::resolve_gateway_token(&config);
        if token.is_none() || config.gateway.auth.mode != config::GatewayAuthMode::Token {
            anyhow::bail!(
                "refusing to bind gateway to {} without auth (set gateway.auth.mode to \"token\" and gateway.auth.token or ARES_GATEWAY_TOKEN)",
                bind
            );
        }
        if config::resolve_whatsapp_app_secret(&config).is_none() {
            anyhow::bail!(
                "refusing to bind gateway to {} without webhook signature checks (set channels.whatsapp.appSecret or WHATSAPP_APP_SECRET)",
                bind
            );
        }
    }

    let tickets_path = config::resolve_tickets_path(&config, &config_path);
    let tickets = TicketStore::load(&tickets_path)
        .await
        .with_context(|| format!("loading tickets from {}", tickets_path.display()))?;
    log::info!(
        "ticket store at {} ({} ticket(s))",
        tickets_path.display(),
        tickets.len().await
    );

    let classifier = Arc::new(MessageClassifier::from_config(&config.registry));
    log::info!(
        "classifier registry: {} client(s), {} equipment entries",
        config.registry.clients.len(),
        config.registry.equipment.len()
    );
    let composer = ResponseComposer::from_config(&config.notify);
    if composer.include_phone_in_group {
        log::debug!("group acknowledgments include the sender's phone (notify.includePhoneInGroup)");
    }

    let transports = Arc::new(TransportRegistry::new());
    match WhatsAppChannel::from_config(&config) {
        Some(whatsapp) => {
            transports.register(Arc::new(whatsapp)).await;
            log::info!("whatsapp channel registered (webhook mode)");
        }
        None => {
            log::warn!(
                "whatsapp channel not configured (channels.whatsapp.phoneNumberId and accessToken or WHATSAPP_ACCESS_TOKEN); tickets are stored but replies are not delivered"
            );
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(
        classifier,
        composer,
        Arc::new(tickets),
        transports.clone(),
        config.notify.clone(),
    ));

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<InboundMessage>(64);
    {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            while let Some(msg) = inbound_rx.recv().await {
                match dispatcher.handle(&msg).await {
                    Ok(DispatchOutcome::Ignored) => {}
                    Ok(DispatchOutcome::Ticketed {
                        ticket,
                        group_sent,
                        technician_sent,
                    }) => {
                        log::debug!(
                            "inbound: {} delivered group={} technician={}",
                            ticket.ticket_number,
                            group_sent,
                            technician_sent
                        );
                    }
                    Err(e) => log::warn!("inbound: failed to store ticket: {}", e),
                }
            }
        });
    }

    let state = GatewayState {
        config: Arc::new(config.clone()),
        required_token: require_api_token(&config),
        verify_token: config::resolve_whatsapp_verify_token(&config),
        app_secret: config::resolve_whatsapp_app_secret(&config),
        inbound_tx,
        dispatcher,
        transports: transports.clone(),
    };
    if state.verify_token.is_none() {
        log::warn!("whatsapp verify token not set; webhook verification requests will be rejected");
    }
    if state.app_secret.is_none() {
        log::warn!("whatsapp app secret not set; webhook POSTs are accepted without signature checks");
    }

    let app = build_router(state);
    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(transports))
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM), then stops transports.
async fn shutdown_signal(transports: Arc<TransportRegistry>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, stopping transports");
    transports.stop_all().await;
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "protocol": PROTOCOL_VERSION,
        "port": state.config.gateway.port,
        "transports": state.transports.ids().await,
    }))
}

/// GET /whatsapp/webhook: Meta verification handshake; echoes hub.challenge.
async fn whatsapp_verify(
    State(state): State<GatewayState>,
    Query(query): Query<WebhookVerifyQuery>,
) -> Response {
    match query.accept(state.verify_token.as_deref()) {
        Some(challenge) => (StatusCode::OK, challenge.to_string()).into_response(),
        None => StatusCode::FORBIDDEN.into_response(),
    }
}

/// POST /whatsapp/webhook: receives Cloud API update JSON and queues text messages.
/// The signature is checked on the raw body before anything is parsed.
async fn whatsapp_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = state.app_secret.as_deref() {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
        if !verify_webhook_signature(secret, &body, signature) {
            log::warn!("whatsapp webhook: rejected delivery with missing or bad signature");
            return StatusCode::UNAUTHORIZED;
        }
    }
    let hook: WhatsAppWebhook = match serde_json::from_slice(&body) {
        Ok(h) => h,
        Err(e) => {
            log::debug!("whatsapp webhook: bad payload: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };
    for inbound in hook.into_inbound() {
        if state.inbound_tx.send(inbound).await.is_err() {
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    }
    StatusCode::OK
}

/// POST /classify: classify a message and render reply previews. Nothing is stored or sent.
async fn classify_http(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(req): Json<ClassifyRequest>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let classification = state
        .dispatcher
        .classifier()
        .classify(&req.text, &req.sender_phone);
    let response = if classification.is_service_request {
        let ticket = TicketDetails::from_classification(&classification, &req.sender_phone);
        let composer = state.dispatcher.composer();
        ClassifyResponse {
            group_response: Some(composer.render_group_response(PREVIEW_TICKET_NUMBER, &ticket)),
            technician_notification: Some(
                composer.render_technician_notification(PREVIEW_TICKET_NUMBER, &ticket),
            ),
            ticket: Some(ticket),
            classification,
        }
    } else {
        ClassifyResponse {
            classification,
            ticket: None,
            group_response: None,
            technician_notification: None,
        }
    };
    Json(response).into_response()
}

/// GET /tickets: most recent tickets first.
async fn tickets_http(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<TicketsQuery>,
) -> Response {
    if !authorized(&state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TICKETS_LIMIT)
        .min(MAX_TICKETS_LIMIT);
    let tickets = state.dispatcher.tickets().list(limit).await;
    Json(json!({ "tickets": tickets })).into_response()
}
