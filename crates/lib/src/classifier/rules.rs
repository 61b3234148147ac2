//! Keyword tables and the ordered priority rules.
//!
//! Priority is decided by walking `priority_rules()` top-down; the first rule whose
//! signal set matches wins. `Media` is the fallback when nothing matches.

use super::priority::Priority;
use crate::text::Term;

/// Problem and service vocabulary. Any hit makes the message a service request.
pub(crate) const SERVICE_TRIGGERS: &[&str] = &[
    // problem reports
    "problema",
    "problemas",
    "falla",
    "fallas",
    "fallan",
    "fallando",
    "fallo",
    "averia",
    "averiado",
    "averiada",
    "error",
    "roto",
    "rota",
    "se rompio",
    "se descompuso",
    "descompuesto",
    "descompuesta",
    "se dano",
    "danado",
    "no funciona",
    "no funcionan",
    "no esta funcionando",
    "no estan funcionando",
    "no anda",
    "no andan",
    "no sirve",
    "no sirven",
    "no enciende",
    "no prende",
    "no arranca",
    "no responde",
    "dejo de funcionar",
    "se apago",
    "se trabo",
    "se cuelga",
    "pantalla en negro",
    // service needs
    "urgente",
    "mantenimiento",
    "reparacion",
    "reparar",
    "revisar",
    "revision",
    "servicio tecnico",
    "soporte tecnico",
    "calibrar",
    "calibracion",
];

/// Equipment-down or emergency states. Critical, and a service request on their own.
pub(crate) const CRITICAL_STATES: &[&str] = &[
    "equipo parado",
    "esta parado",
    "esta parada",
    "quedo parado",
    "quedo parada",
    "emergencia",
    "urgencia",
    "paciente esperando",
    "pacientes esperando",
];

/// Urgent or severe wording. Critical only alongside some other request signal.
pub(crate) const CRITICAL_WORDING: &[&str] = &[
    "urgente",
    "critico",
    "critica",
    "grave",
    "inmediato",
    "inmediatamente",
    "ahora mismo",
    "ya mismo",
    "urgente ya",
    "lo necesitamos ya",
    "necesitamos ya",
    "lo necesito ya",
    "necesito ya",
    "vengan ya",
    "venga ya",
];

/// Several devices affected at once. High priority, and a service request on their own.
pub(crate) const IMPORTANCE_STATES: &[&str] = &[
    "varios equipos",
    "todos los equipos",
    "ambos equipos",
];

/// Importance wording. High priority only alongside some other request signal.
pub(crate) const IMPORTANCE_WORDING: &[&str] = &[
    "importante",
    "rapido",
    "pronto",
    "lo antes posible",
    "cuanto antes",
    "prioridad",
    "prioritario",
];

/// Explicit no-rush wording, including negated urgency.
pub(crate) const NO_RUSH_SIGNALS: &[&str] = &[
    "cuando puedas",
    "cuando pueda",
    "cuando puedan",
    "sin apuro",
    "sin prisa",
    "no es urgente",
    "nada urgente",
    "no es critico",
    "no es grave",
    "no es importante",
    "no urge",
    "consulta",
];

/// Phrases whose tokens must not count toward critical or importance signals.
pub(crate) const NEGATED_URGENCY: &[&str] = &[
    "no es urgente",
    "nada urgente",
    "no es critico",
    "no es grave",
    "no es importante",
];

/// Compiled term list.
pub(crate) struct SignalSet {
    terms: Vec<Term>,
}

impl SignalSet {
    pub(crate) fn new(phrases: &[&str]) -> Self {
        Self::from_lists(&[phrases])
    }

    pub(crate) fn from_lists(lists: &[&[&str]]) -> Self {
        Self {
            terms: lists
                .iter()
                .flat_map(|l| l.iter())
                .map(|p| Term::new(p))
                .collect(),
        }
    }

    pub(crate) fn matches(&self, tokens: &[String], mask: &[bool]) -> bool {
        self.terms.iter().any(|t| t.find_in(tokens, mask).is_some())
    }

    /// Mark every token covered by a match of this set.
    pub(crate) fn mask(&self, tokens: &[String]) -> Vec<bool> {
        let mut mask = vec![false; tokens.len()];
        for term in &self.terms {
            let mut from = 0;
            while from < tokens.len() {
                match term.find_in(&tokens[from..], &[]) {
                    Some(pos) => {
                        let start = from + pos;
                        for m in &mut mask[start..start + term.len()] {
                            *m = true;
                        }
                        from = start + 1;
                    }
                    None => break,
                }
            }
        }
        mask
    }
}

/// One entry of the precedence list.
pub(crate) struct PriorityRule {
    pub priority: Priority,
    pub signals: SignalSet,
}

/// Everything that makes a message a service request: problem and service vocabulary
/// plus the device states that also raise priority.
pub(crate) fn service_triggers() -> SignalSet {
    SignalSet::from_lists(&[SERVICE_TRIGGERS, CRITICAL_STATES, IMPORTANCE_STATES])
}

/// Precedence order: Crítica, then Alta, then the Baja override. Media is the default.
pub(crate) fn priority_rules() -> Vec<PriorityRule> {
    vec![
        PriorityRule {
            priority: Priority::Critica,
            signals: SignalSet::from_lists(&[CRITICAL_STATES, CRITICAL_WORDING]),
        },
        PriorityRule {
            priority: Priority::Alta,
            signals: SignalSet::from_lists(&[IMPORTANCE_STATES, IMPORTANCE_WORDING]),
        },
        PriorityRule {
            priority: Priority::Baja,
            signals: SignalSet::new(NO_RUSH_SIGNALS),
        },
    ]
}

/// Walk `rules` top-down. Critical and importance rules skip tokens in `negated`.
pub(crate) fn decide_priority(rules: &[PriorityRule], tokens: &[String], negated: &[bool]) -> Priority {
    rules
        .iter()
        .find(|rule| {
            let mask: &[bool] = if rule.priority > Priority::Media {
                negated
            } else {
                &[]
            };
            rule.signals.matches(tokens, mask)
        })
        .map(|rule| rule.priority)
        .unwrap_or(Priority::Media)
}
