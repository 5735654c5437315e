//! Keyword-heuristic intent classification.
//!
//! The checks run in a fixed order and short-circuit: domain gate, then
//! promotional filter, then repair detection, then installation detection.
//! Patterns lean towards false negatives; contacting an advertiser or an
//! unrelated account costs more than missing a lead.

use crate::domain::values::classification::Classification;
use crate::domain::values::intent::Intent;
use crate::domain::values::source_kind::SourceKind;
use regex::Regex;
use std::sync::LazyLock;

/// Bare "solar" is ambiguous (astronomy, solar flares) and so is bare "panel"
/// (breaker panels), so the gate wants the two together or a PV term.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)solar\s*(?:panels?|power|energy|install\w*|system|array|roof|permit|rebate|incentive|company|quote)|photovoltaic|\bpv\b|\binverters?\b",
    )
    .expect("valid domain regex")
});

static PROMOTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)we offer|our company|our team|our services?\b|free estimates?|free quotes?|call us|contact us|visit our|licensed and|years of experience|family owned|check us out|\b(?:dm|pm) (?:for|me for)|click here|www\.|https?://|\.com\b|special offer|discount|promotion",
    )
    .expect("valid promotional regex")
});

static REPAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)not working|broken|stopped|no power|\berrors?\b|\bfault|\bfailed|\brepair|\bfix|troubleshoot|system\s+(?:is\s+|went\s+)?down|\boffline\b|\bdead\b",
    )
    .expect("valid repair regex")
});

static INSTALLATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:looking for|need|hire|hiring|recommend|seeking)\b.{0,60}\binstall|anyone install|who installs|installer recommendations?",
    )
    .expect("valid installation regex")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> Classification {
        if !DOMAIN_RE.is_match(text) {
            return Classification::rejected();
        }
        if PROMOTIONAL_RE.is_match(text) {
            return Classification::promotional();
        }
        // Repair wins over installation when both appear.
        if REPAIR_RE.is_match(text) {
            return Classification::matched(Intent::RepairService);
        }
        if INSTALLATION_RE.is_match(text) {
            return Classification::matched(Intent::Installation);
        }
        Classification::rejected()
    }

    /// Permit and incentive records describe installations already under
    /// way; they skip the text heuristics.
    pub fn classify_for(&self, kind: SourceKind, text: &str) -> Classification {
        if kind.is_verified_installation() {
            Classification::matched(Intent::Installation)
        } else {
            self.classify(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Classification {
        IntentClassifier::new().classify(text)
    }

    #[test]
    fn test_domain_gate_rejects_non_solar_text() {
        let c = classify("my roof is broken, please fix it ASAP");
        assert!(!c.matches);
        assert!(!c.is_promotional);
        assert_eq!(c.intent, None);
    }

    #[test]
    fn test_bare_solar_does_not_pass_gate() {
        assert!(!classify("The solar eclipse broke my telescope, need a fix").matches);
    }

    #[test]
    fn test_promotional_beats_repair() {
        let c = classify("We offer emergency solar panel repair services, call us now!");
        assert!(!c.matches);
        assert!(c.is_promotional);
    }

    #[test]
    fn test_repair_beats_installation() {
        let c = classify("My solar panels are broken, need a new installer");
        assert!(c.matches);
        assert_eq!(c.intent, Some(Intent::RepairService));
    }

    #[test]
    fn test_installation_request() {
        let c = classify("Looking for a good solar installer near Savannah, any recommendations?");
        assert!(c.matches);
        assert_eq!(c.intent, Some(Intent::Installation));
    }

    #[test]
    fn test_breaker_panel_is_not_solar() {
        let c = classify("My breaker panel is broken, need an electrician to fix it");
        assert!(!c.matches);
        assert_eq!(c.intent, None);
    }

    #[test]
    fn test_commentary_is_dropped() {
        let c = classify("Solar panels are getting cheaper every year, amazing times");
        assert!(!c.matches);
        assert!(!c.is_promotional);
    }

    #[test]
    fn test_inverter_fault() {
        let c = classify("Inverter shows fault code 23 since the storm");
        assert_eq!(c.accepted_intent(), Some(Intent::RepairService));
    }

    #[test]
    fn test_verified_sources_skip_heuristics() {
        let c = IntentClassifier::new().classify_for(SourceKind::Permit, "Permit #123 issued");
        assert_eq!(c.accepted_intent(), Some(Intent::Installation));
    }
}
