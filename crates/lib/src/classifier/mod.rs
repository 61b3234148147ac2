//! Inbound message classification: is this a service request, how urgent, and
//! which client and equipment does it mention.
//!
//! Classification is pure and total. Every input, including the empty string,
//! yields a `ClassificationResult`; "not a service request" is a normal outcome.

mod priority;
mod registry;
mod rules;

pub use priority::{ParsePriorityError, Priority};
pub use registry::{EntityEntry, EntityRegistry, EntityTable, RegistryConfig};

use crate::text::{collapse_whitespace, normalize_phone, tokenize};
use rules::{decide_priority, priority_rules, service_triggers, PriorityRule, SignalSet};
use serde::{Deserialize, Serialize};

/// Outcome of classifying one message. `prioridad` is set iff `is_service_request`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_service_request: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cliente: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipo_info: Option<String>,
    /// Full problem text; display truncation is left to the renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioridad: Option<Priority>,
}

impl ClassificationResult {
    /// Result for a message that carries no service-request signal.
    pub fn not_a_request() -> Self {
        Self::default()
    }
}

/// Keyword classifier over an injected client/equipment registry. Stateless once built;
/// share it behind an `Arc` across concurrent message handlers.
pub struct MessageClassifier {
    registry: EntityRegistry,
    triggers: SignalSet,
    negated: SignalSet,
    rules: Vec<PriorityRule>,
}

impl Default for MessageClassifier {
    fn default() -> Self {
        Self::new(EntityRegistry::default())
    }
}

impl MessageClassifier {
    pub fn new(registry: EntityRegistry) -> Self {
        Self {
            registry,
            triggers: service_triggers(),
            negated: SignalSet::new(rules::NEGATED_URGENCY),
            rules: priority_rules(),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(EntityRegistry::from_config(config))
    }

    /// Classify `text` sent by `sender_phone`. The phone does not influence the decision;
    /// it is accepted so callers can hand over the inbound message as-is.
    pub fn classify(&self, text: &str, sender_phone: &str) -> ClassificationResult {
        let tokens = tokenize(text);
        let negated = self.negated.mask(&tokens);
        if !self.triggers.matches(&tokens, &negated) {
            log::debug!(
                "classifier: no service signal from {}",
                normalize_phone(sender_phone)
            );
            return ClassificationResult::not_a_request();
        }

        let prioridad = decide_priority(&self.rules, &tokens, &negated);
        let problema = collapse_whitespace(text);
        ClassificationResult {
            is_service_request: true,
            cliente: self.registry.clients.first_match(&tokens).map(str::to_string),
            equipo_info: self.registry.equipment.first_match(&tokens).map(str::to_string),
            problema: (!problema.is_empty()).then_some(problema),
            prioridad: Some(prioridad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHONE: &str = "+595981123456";

    fn classify(text: &str) -> ClassificationResult {
        MessageClassifier::default().classify(text, PHONE)
    }

    #[test]
    fn urgent_message_is_critical() {
        let r = classify("URGENTE: Hydrafacial no funciona");
        assert!(r.is_service_request);
        assert_eq!(r.prioridad, Some(Priority::Critica));
        assert_eq!(r.equipo_info.as_deref(), Some("Hydrafacial"));
    }

    #[test]
    fn importance_message_is_high() {
        let r = classify("Favor revisar equipo rápido");
        assert!(r.is_service_request);
        assert_eq!(r.prioridad, Some(Priority::Alta));
    }

    #[test]
    fn no_rush_overrides_default() {
        let r = classify("Consulta sobre mantenimiento cuando puedas");
        assert!(r.is_service_request);
        assert_eq!(r.prioridad, Some(Priority::Baja));
    }

    #[test]
    fn plain_problem_is_medium_with_entities() {
        let r = classify("Problema con el Hydrafacial de Ares Paraguay");
        assert!(r.is_service_request);
        assert_eq!(r.prioridad, Some(Priority::Media));
        assert_eq!(r.cliente.as_deref(), Some("Ares Paraguay"));
        assert_eq!(r.equipo_info.as_deref(), Some("Hydrafacial"));
        assert_eq!(
            r.problema.as_deref(),
            Some("Problema con el Hydrafacial de Ares Paraguay")
        );
    }

    #[test]
    fn greeting_is_not_a_request() {
        let r = classify("Hola, ¿cómo están todos?");
        assert_eq!(r, ClassificationResult::not_a_request());
        assert!(r.cliente.is_none());
        assert!(r.equipo_info.is_none());
        assert!(r.problema.is_none());
        assert!(r.prioridad.is_none());
    }

    #[test]
    fn empty_input_is_not_a_request() {
        assert_eq!(classify(""), ClassificationResult::not_a_request());
        assert_eq!(classify("   \n "), ClassificationResult::not_a_request());
    }

    #[test]
    fn negated_urgency_alone_is_not_a_request() {
        assert!(!classify("tranquilos, no es urgente").is_service_request);
    }

    #[test]
    fn common_failure_reports_are_requests() {
        let cases = [
            ("Fallan varios equipos en Migone", Priority::Alta),
            ("El láser no está funcionando", Priority::Media),
            ("El Hydrafacial está parado, pacientes esperando", Priority::Critica),
            ("Emergencia en San Roque con el Ultraformer", Priority::Critica),
            ("Se descompuso el Hydrafacial", Priority::Media),
            ("El equipo está fallando", Priority::Media),
            ("La Venus no sirve desde ayer", Priority::Media),
        ];
        for (text, tier) in cases {
            let r = classify(text);
            assert!(r.is_service_request, "{}", text);
            assert_eq!(r.prioridad, Some(tier), "{}", text);
        }
        assert_eq!(
            classify("Fallan varios equipos en Migone").cliente.as_deref(),
            Some("Sanatorio Migone")
        );
    }

    #[test]
    fn device_states_alone_open_a_request() {
        let tiers = [
            (rules::CRITICAL_STATES, Priority::Critica),
            (rules::IMPORTANCE_STATES, Priority::Alta),
        ];
        for (signals, tier) in tiers {
            for signal in signals {
                let text = format!("Hoy en el Sanatorio Migone: {}.", signal);
                let r = classify(&text);
                assert!(r.is_service_request, "{}", text);
                assert_eq!(r.prioridad, Some(tier), "{}", text);
            }
        }
    }

    #[test]
    fn every_priority_signal_sets_its_tier() {
        let tiers = [
            (rules::CRITICAL_WORDING, Priority::Critica),
            (rules::IMPORTANCE_WORDING, Priority::Alta),
            (rules::NO_RUSH_SIGNALS, Priority::Baja),
        ];
        for (signals, tier) in tiers {
            for signal in signals {
                let text = format!("{}, el Hydrafacial de San Roque no enciende", signal);
                let r = classify(&text);
                assert!(r.is_service_request, "{}", text);
                assert_eq!(r.prioridad, Some(tier), "{}", text);
            }
        }
    }

    #[test]
    fn urgency_wording_alone_is_not_a_request() {
        assert!(!classify("Ya llegamos a la clínica").is_service_request);
        assert!(!classify("Es importante confirmar la reunión de mañana").is_service_request);
    }

    #[test]
    fn already_does_not_make_a_request_critical() {
        let r = classify("Ya revisaron el problema?");
        assert!(r.is_service_request);
        assert_eq!(r.prioridad, Some(Priority::Media));
    }

    #[test]
    fn negated_severity_is_low_priority() {
        assert_eq!(classify("no es grave, falla el laser").prioridad, Some(Priority::Baja));
    }

    #[test]
    fn problem_keeps_full_text() {
        let long = "Falla en el equipo de la sala dos,   la pantalla queda en negro después de encender y no responde al panel táctil";
        let r = classify(long);
        let problema = r.problema.unwrap();
        assert!(problema.len() > 50);
        assert!(problema.ends_with("panel táctil"));
        assert!(!problema.contains("  "));
    }

    #[test]
    fn client_mention_is_accent_insensitive() {
        let r = classify("En la clinica san roque el laser no enciende");
        assert_eq!(r.cliente.as_deref(), Some("Clínica San Roque"));
        assert_eq!(r.equipo_info.as_deref(), Some("Láser"));
    }

    #[test]
    fn injected_registry_replaces_defaults() {
        let config = RegistryConfig {
            clients: vec![EntityEntry::new("Clínica Norte", &["norte"])],
            equipment: vec![],
        };
        let classifier = MessageClassifier::from_config(&config);
        let r = classifier.classify("Falla el Hydrafacial en Norte", PHONE);
        assert_eq!(r.cliente.as_deref(), Some("Clínica Norte"));
        assert_eq!(r.equipo_info, None);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = MessageClassifier::default();
        let text = "Importante: el Ultraformer de Migone no arranca";
        assert_eq!(c.classify(text, PHONE), c.classify(text, PHONE));
    }

    #[test]
    fn serializes_with_wire_names() {
        let r = classify("URGENTE: Hydrafacial no funciona");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["isServiceRequest"], true);
        assert_eq!(json["prioridad"], "Crítica");
        assert_eq!(json["equipoInfo"], "Hydrafacial");
        assert!(json.get("cliente").is_none());
    }
}
