//! Inbound message handling: classify, open a ticket, deliver both replies.
//!
//! Delivery is best effort. A failed send is logged and reported in the outcome;
//! it never undoes the stored ticket.

use crate::channels::{ChatTransport, InboundMessage, TransportRegistry};
use crate::classifier::MessageClassifier;
use crate::compose::ResponseComposer;
use crate::config::NotifyConfig;
use crate::tickets::{TicketDetails, TicketDraft, TicketStore, TicketStoreError};
use std::sync::Arc;

/// What happened to one inbound message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a service request; nothing stored or sent.
    Ignored,
    Ticketed {
        ticket: TicketDraft,
        group_sent: bool,
        technician_sent: bool,
    },
}

/// Classifier, composer, ticket store, and transports for the inbound path.
pub struct Dispatcher {
    classifier: Arc<MessageClassifier>,
    composer: ResponseComposer,
    tickets: Arc<TicketStore>,
    transports: Arc<TransportRegistry>,
    notify: NotifyConfig,
}

impl Dispatcher {
    pub fn new(
        classifier: Arc<MessageClassifier>,
        composer: ResponseComposer,
        tickets: Arc<TicketStore>,
        transports: Arc<TransportRegistry>,
        notify: NotifyConfig,
    ) -> Self {
        Self {
            classifier,
            composer,
            tickets,
            transports,
            notify,
        }
    }

    pub fn classifier(&self) -> &MessageClassifier {
        &self.classifier
    }

    pub fn composer(&self) -> &ResponseComposer {
        &self.composer
    }

    pub fn tickets(&self) -> &TicketStore {
        &self.tickets
    }

    /// Handle one message. Errors only when the ticket cannot be stored.
    pub async fn handle(&self, msg: &InboundMessage) -> Result<DispatchOutcome, TicketStoreError> {
        let result = self.classifier.classify(&msg.text, &msg.sender_phone);
        if !result.is_service_request {
            log::debug!(
                "dispatch: ignoring message on {}/{}",
                msg.channel_id,
                msg.conversation_id
            );
            return Ok(DispatchOutcome::Ignored);
        }

        let details = TicketDetails::from_classification(&result, &msg.sender_phone);
        let ticket = self.tickets.create(details, chrono::Local::now()).await?;
        log::info!(
            "dispatch: opened {} (prioridad {})",
            ticket.ticket_number,
            ticket
                .details
                .prioridad
                .map(|p| p.label())
                .unwrap_or("-")
        );

        let transport = self.transports.get(&msg.channel_id).await;
        let Some(transport) = transport else {
            log::warn!(
                "dispatch: no transport registered for {}, {} not delivered",
                msg.channel_id,
                ticket.ticket_number
            );
            return Ok(DispatchOutcome::Ticketed {
                ticket,
                group_sent: false,
                technician_sent: false,
            });
        };

        let group_target = self
            .notify
            .group_chat_id
            .as_deref()
            .unwrap_or(&msg.conversation_id);
        let group_text = self
            .composer
            .render_group_response(&ticket.ticket_number, &ticket.details);
        let group_sent = deliver(transport.as_ref(), group_target, &group_text, "group").await;

        let technician_sent = match self.notify.technician_chat_id.as_deref() {
            Some(target) => {
                let text = self
                    .composer
                    .render_technician_notification(&ticket.ticket_number, &ticket.details);
                deliver(transport.as_ref(), target, &text, "technician").await
            }
            None => {
                log::warn!(
                    "dispatch: notify.technicianChatId not set, skipping technician notification for {}",
                    ticket.ticket_number
                );
                false
            }
        };

        Ok(DispatchOutcome::Ticketed {
            ticket,
            group_sent,
            technician_sent,
        })
    }
}

async fn deliver(transport: &dyn ChatTransport, target: &str, text: &str, what: &str) -> bool {
    match transport.send(target, text).await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("dispatch: {} send via {} failed: {}", what, transport.id(), e);
            false
        }
    }
}
