//! Reply templates for a registered service request.
//!
//! Two texts per ticket: a short acknowledgment for the shared group chat and a
//! detailed notification for the on-call technician. Rendering never fails;
//! missing fields show `No especificado`.

use crate::tickets::TicketDetails;

/// Shown in place of any missing ticket field.
pub const PLACEHOLDER: &str = "No especificado";

/// Problem preview length in the group acknowledgment.
pub const DEFAULT_PREVIEW_CHARS: usize = 50;

/// Renders the group acknowledgment and technician notification.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    /// Include the sender's phone in the group acknowledgment (pending privacy review; on by default).
    pub include_phone_in_group: bool,
    pub preview_chars: usize,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self {
            include_phone_in_group: true,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

fn field(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(PLACEHOLDER)
}

impl ResponseComposer {
    pub fn from_config(notify: &crate::config::NotifyConfig) -> Self {
        Self {
            include_phone_in_group: notify.include_phone_in_group,
            ..Self::default()
        }
    }

    /// Short acknowledgment for the group chat.
    pub fn render_group_response(&self, ticket_number: &str, ticket: &TicketDetails) -> String {
        let problema = match field(&ticket.problema) {
            PLACEHOLDER => PLACEHOLDER.to_string(),
            p => crate::text::truncate_chars(p, self.preview_chars),
        };
        let prioridad = ticket.prioridad.map(|p| p.label()).unwrap_or(PLACEHOLDER);

        let mut out = String::from("✅ *Solicitud de servicio registrada*\n\n");
        out.push_str(&format!("🎫 *Ticket:* {}\n", ticket_number));
        out.push_str(&format!("🏥 *Cliente:* {}\n", field(&ticket.cliente)));
        out.push_str(&format!("⚡ *Prioridad:* {}\n", prioridad));
        out.push_str(&format!("📝 *Problema:* {}\n", problema));
        if self.include_phone_in_group {
            out.push_str(&format!("📞 *Contacto:* {}\n", field(&ticket.telefono)));
        }
        out.push_str("\nUn técnico se comunicará a la brevedad.");
        out
    }

    /// Detailed notification for the technician, with the full problem text.
    pub fn render_technician_notification(
        &self,
        ticket_number: &str,
        ticket: &TicketDetails,
    ) -> String {
        let prioridad = match ticket.prioridad {
            Some(p) => format!("{} {}", p.marker(), p.label()),
            None => PLACEHOLDER.to_string(),
        };
        let mut out = String::from("🔧 *NUEVO TICKET DE SERVICIO*\n\n");
        out.push_str(&format!("🎫 *Ticket:* {}\n", ticket_number));
        out.push_str(&format!("⚡ *Prioridad:* {}\n", prioridad));
        out.push_str(&format!("🏥 *Cliente:* {}\n", field(&ticket.cliente)));
        out.push_str(&format!("🩺 *Equipo:* {}\n", field(&ticket.equipo)));
        out.push_str(&format!("📞 *Teléfono de contacto:* {}\n", field(&ticket.telefono)));
        out.push_str("\n📝 *Descripción del problema:*\n");
        out.push_str(field(&ticket.problema));
        out.push_str("\n\nPor favor, contactar al cliente y actualizar el estado del ticket.");
        out
    }
}
