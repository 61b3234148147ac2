//! Service tickets: numbering (`TKT-YYYYMMDD-NNN`) and a JSON-file-backed store.
//!
//! The store is the only place ticket numbers are assigned. Assignment and the
//! following save happen under one write lock, so concurrent handlers never get
//! the same number.

use crate::classifier::{ClassificationResult, Priority};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

const TICKET_PREFIX: &str = "TKT";

/// Ticket number used when rendering previews that are not stored.
pub const PREVIEW_TICKET_NUMBER: &str = "TKT-PREVIEW";

/// Highest sequence that fits the three-digit `NNN` field.
pub const MAX_DAILY_SEQUENCE: u32 = 999;

/// Format a ticket number: `TKT-` + date as `YYYYMMDD` + `-` + sequence padded to three digits.
pub fn format_ticket_number(date: NaiveDate, seq: u32) -> String {
    format!("{}-{}-{:03}", TICKET_PREFIX, date.format("%Y%m%d"), seq)
}

/// Split a ticket number back into (date, sequence). None when malformed.
pub fn parse_ticket_number(s: &str) -> Option<(NaiveDate, u32)> {
    let mut parts = s.trim().splitn(3, '-');
    if parts.next()? != TICKET_PREFIX {
        return None;
    }
    let date = parts.next()?;
    if date.len() != 8 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    let seq = parts.next()?;
    if seq.len() < 3 || !seq.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((date, seq.parse().ok()?))
}

/// Fields shared by the renderer and the stored ticket. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliente: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioridad: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
}

impl TicketDetails {
    /// Copy the extracted fields and attach the sender's phone (normalized; empty → None).
    pub fn from_classification(result: &ClassificationResult, sender_phone: &str) -> Self {
        let phone = crate::text::normalize_phone(sender_phone);
        Self {
            cliente: result.cliente.clone(),
            equipo: result.equipo_info.clone(),
            problema: result.problema.clone(),
            prioridad: result.prioridad,
            telefono: (!phone.is_empty()).then_some(phone),
        }
    }
}

/// A stored ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    pub id: uuid::Uuid,
    pub ticket_number: String,
    pub created_at: DateTime<Local>,
    #[serde(flatten)]
    pub details: TicketDetails,
}

#[derive(Debug, thiserror::Error)]
pub enum TicketStoreError {
    #[error("ticket store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("ticket store json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ticket sequence exhausted for {0}")]
    SequenceExhausted(NaiveDate),
}

/// Tickets held in memory; persisted to `path` after every insert when a path is set.
pub struct TicketStore {
    path: Option<PathBuf>,
    tickets: RwLock<Vec<TicketDraft>>,
}

impl TicketStore {
    /// Store without a backing file (tests, previews).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tickets: RwLock::new(Vec::new()),
        }
    }

    /// Load from `path`. A missing file starts empty; an unreadable one is an error so
    /// existing numbers are never reissued.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TicketStoreError> {
        let path = path.as_ref().to_path_buf();
        let tickets = match tokio::fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => Vec::new(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("loaded {} ticket(s) from {}", tickets.len(), path.display());
        Ok(Self {
            path: Some(path),
            tickets: RwLock::new(tickets),
        })
    }

    async fn save(&self, tickets: &[TicketDraft]) -> Result<(), TicketStoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(tickets)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Assign the next number for `now`'s date, store the ticket, and return it.
    /// Nothing is kept in memory if persisting fails.
    pub async fn create(
        &self,
        details: TicketDetails,
        now: DateTime<Local>,
    ) -> Result<TicketDraft, TicketStoreError> {
        let date = now.date_naive();
        let mut tickets = self.tickets.write().await;
        let last = tickets
            .iter()
            .filter_map(|t| parse_ticket_number(&t.ticket_number))
            .filter(|(d, _)| *d == date)
            .map(|(_, seq)| seq)
            .max()
            .unwrap_or(0);
        let seq = last + 1;
        if seq > MAX_DAILY_SEQUENCE {
            return Err(TicketStoreError::SequenceExhausted(date));
        }
        let ticket = TicketDraft {
            id: uuid::Uuid::new_v4(),
            ticket_number: format_ticket_number(date, seq),
            created_at: now,
            details,
        };
        tickets.push(ticket.clone());
        if let Err(e) = self.save(&tickets).await {
            tickets.pop();
            return Err(e);
        }
        Ok(ticket)
    }

    /// Most recent tickets first, at most `limit`.
    pub async fn list(&self, limit: usize) -> Vec<TicketDraft> {
        self.tickets
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get(&self, ticket_number: &str) -> Option<TicketDraft> {
        self.tickets
            .read()
            .await
            .iter()
            .find(|t| t.ticket_number == ticket_number)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }
}
