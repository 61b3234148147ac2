//! Ticket priority tiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Urgency of a service request. Ordered `Baja < Media < Alta < Crítica`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Baja,
    Media,
    Alta,
    #[serde(rename = "Crítica")]
    Critica,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Baja,
        Priority::Media,
        Priority::Alta,
        Priority::Critica,
    ];

    /// Display label as used in chat messages and stored tickets.
    pub fn label(self) -> &'static str {
        match self {
            Priority::Baja => "Baja",
            Priority::Media => "Media",
            Priority::Alta => "Alta",
            Priority::Critica => "Crítica",
        }
    }

    /// Marker shown next to the label in technician notifications.
    pub fn marker(self) -> &'static str {
        match self {
            Priority::Baja => "🟢",
            Priority::Media => "🟡",
            Priority::Alta => "🟠",
            Priority::Critica => "🔴",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    /// Case- and accent-insensitive ("critica", "CRÍTICA" both parse).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match crate::text::fold(s.trim()).as_str() {
            "baja" => Ok(Priority::Baja),
            "media" => Ok(Priority::Media),
            "alta" => Ok(Priority::Alta),
            "critica" => Ok(Priority::Critica),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_urgency() {
        assert!(Priority::Baja < Priority::Media);
        assert!(Priority::Media < Priority::Alta);
        assert!(Priority::Alta < Priority::Critica);
    }

    #[test]
    fn serializes_spanish_labels() {
        assert_eq!(
            serde_json::to_string(&Priority::Critica).unwrap(),
            "\"Crítica\""
        );
        let p: Priority = serde_json::from_str("\"Alta\"").unwrap();
        assert_eq!(p, Priority::Alta);
    }

    #[test]
    fn parses_without_accents() {
        assert_eq!("critica".parse::<Priority>().unwrap(), Priority::Critica);
        assert_eq!(" CRÍTICA ".parse::<Priority>().unwrap(), Priority::Critica);
        assert!("urgente".parse::<Priority>().is_err());
    }

    #[test]
    fn labels_round_trip_through_from_str() {
        for p in Priority::ALL {
            assert_eq!(p.label().parse::<Priority>().unwrap(), p);
        }
    }
}
