//! Known clients and equipment: canonical name → surface-form aliases.
//!
//! Loaded from config (`registry.clients`, `registry.equipment`) and handed to the
//! classifier at construction. The canonical name always matches itself.

use crate::text::Term;
use serde::{Deserialize, Serialize};

/// One registry entry as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEntry {
    /// Name reported in classifications and tickets (e.g. "Clínica San Roque").
    pub name: String,
    /// Extra spellings that refer to the same entity (e.g. "san roque").
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl EntityEntry {
    pub fn new(name: &str, aliases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Client and equipment tables as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    #[serde(default = "default_clients")]
    pub clients: Vec<EntityEntry>,
    #[serde(default = "default_equipment")]
    pub equipment: Vec<EntityEntry>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            clients: default_clients(),
            equipment: default_equipment(),
        }
    }
}

fn default_clients() -> Vec<EntityEntry> {
    vec![
        EntityEntry::new("Ares Paraguay", &["ares"]),
        EntityEntry::new("Clínica San Roque", &["san roque"]),
        EntityEntry::new("Sanatorio Migone", &["migone"]),
        EntityEntry::new("Centro Médico Bautista", &["hospital bautista", "bautista"]),
        EntityEntry::new("Clínica Dermalaser", &["dermalaser"]),
        EntityEntry::new("Estética Belleza Integral", &["belleza integral"]),
    ]
}

fn default_equipment() -> Vec<EntityEntry> {
    vec![
        EntityEntry::new("Hydrafacial", &["hydra facial", "hidrafacial"]),
        EntityEntry::new("Ultraformer", &["ultraformer iii", "hifu"]),
        EntityEntry::new("Candela GentleMax", &["gentlemax", "candela"]),
        EntityEntry::new("Lumenis M22", &["m22", "lumenis"]),
        EntityEntry::new("CoolSculpting", &["cool sculpting", "criolipolisis"]),
        EntityEntry::new("Venus Legacy", &["venus"]),
        EntityEntry::new("Láser", &["laser"]),
    ]
}

struct CompiledEntity {
    name: String,
    terms: Vec<Term>,
}

/// Compiled lookup table for one kind of entity.
pub struct EntityTable {
    entries: Vec<CompiledEntity>,
}

impl EntityTable {
    pub fn new(entries: &[EntityEntry]) -> Self {
        let entries = entries
            .iter()
            .map(|e| {
                let terms = std::iter::once(e.name.as_str())
                    .chain(e.aliases.iter().map(String::as_str))
                    .map(Term::new)
                    .filter(|t| !t.is_empty())
                    .collect();
                CompiledEntity {
                    name: e.name.clone(),
                    terms,
                }
            })
            .collect();
        Self { entries }
    }

    /// Canonical name of the entity mentioned earliest in `tokens`.
    /// Ties at the same position go to the longer alias, then to table order.
    pub fn first_match(&self, tokens: &[String]) -> Option<&str> {
        let mut best: Option<(usize, usize, &str)> = None;
        for entity in &self.entries {
            for term in &entity.terms {
                let Some(pos) = term.find_in(tokens, &[]) else {
                    continue;
                };
                let better = match best {
                    None => true,
                    Some((best_pos, best_len, _)) => {
                        pos < best_pos || (pos == best_pos && term.len() > best_len)
                    }
                };
                if better {
                    best = Some((pos, term.len(), entity.name.as_str()));
                }
            }
        }
        best.map(|(_, _, name)| name)
    }
}

/// Client and equipment tables used by the classifier.
pub struct EntityRegistry {
    pub clients: EntityTable,
    pub equipment: EntityTable,
}

impl EntityRegistry {
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            clients: EntityTable::new(&config.clients),
            equipment: EntityTable::new(&config.equipment),
        }
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}
