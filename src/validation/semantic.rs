//! Semantic per-record validation (spec §4.4): flags combinations that are individually
//! legal but operationally risky. Operates on the crate's own typed `Entity`, not raw CSV
//! rows, since by the time a record reaches this check it has already passed structural
//! validation and formula/vocabulary parsing.

use crate::model::{Entity, HazardClass, RiskLevel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct SemanticFinding {
    pub severity: Severity,
    pub message: String,
}

impl SemanticFinding {
    fn warning(message: impl Into<String>) -> Self {
        SemanticFinding { severity: Severity::Warning, message: message.into() }
    }

    fn error(message: impl Into<String>) -> Self {
        SemanticFinding { severity: Severity::Error, message: message.into() }
    }
}

/// Runs every semantic check applicable to `entity`'s kind. Order follows spec §4.4's
/// listing; unrelated entity kinds simply produce no findings.
pub fn validate_record(entity: &Entity) -> Vec<SemanticFinding> {
    let mut findings = Vec::new();

    match entity {
        Entity::HazardousSubstance(substance) => {
            if let Some(flash_point) = substance.flash_point.as_deref().and_then(|s| s.parse::<f64>().ok()) {
                if flash_point < 23.0 {
                    findings.push(SemanticFinding::warning(format!(
                        "'{}' has a flash point of {} (<23): highly flammable",
                        substance.name, flash_point
                    )));
                }
            }

            if substance.hazard_class == HazardClass::Toxic {
                if let Some(mw) = substance.molecular_weight {
                    if mw < 100.0 {
                        findings.push(SemanticFinding::warning(format!(
                            "'{}' is toxic with molecular weight {} (<100): elevated absorption risk",
                            substance.name, mw
                        )));
                    }
                }
            }

            if substance.hazard_class == HazardClass::Corrosive {
                findings.push(SemanticFinding::warning(format!(
                    "'{}' is corrosive: confirm PPE requirements before handling",
                    substance.name
                )));
            }
        }
        Entity::Container(container) => {
            if container.material == crate::model::Material::Plastic {
                if let Some(rating) = container.pressure_rating {
                    if rating > 100.0 {
                        findings.push(SemanticFinding::warning(format!(
                            "'{}' is a plastic container rated for {} pressure: verify material suitability",
                            container.name, rating
                        )));
                    }
                }
            }
        }
        Entity::RiskAssessment(assessment) => {
            let emergency_ok = assessment
                .emergency_procedures
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            let ppe_ok = assessment.ppe.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);

            if assessment.risk_level == RiskLevel::High && !emergency_ok {
                findings.push(SemanticFinding::error(format!(
                    "'{}' is a high-risk assessment without emergency_procedures",
                    assessment.title
                )));
            }
            if assessment.risk_level == RiskLevel::Critical && !ppe_ok {
                findings.push(SemanticFinding::error(format!(
                    "'{}' is a critical assessment without ppe",
                    assessment.title
                )));
            }
        }
        Entity::SafetyTest(_) | Entity::Location(_) => {}
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityMeta, HazardousSubstance, RiskAssessment};

    fn sample_substance() -> HazardousSubstance {
        HazardousSubstance {
            meta: EntityMeta::new("s1"),
            name: "Acetone".to_string(),
            chemical_formula: Some("C3H6O".to_string()),
            molecular_weight: Some(58.08),
            hazard_class: HazardClass::Flammable,
            flash_point: Some("-20".to_string()),
            boiling_point: None,
            melting_point: None,
            density: None,
            cas_number: None,
            description: None,
        }
    }

    #[test]
    fn flags_low_flash_point_as_warning() {
        let findings = validate_record(&Entity::HazardousSubstance(sample_substance()));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn corrosive_substance_always_warns_ppe_reminder() {
        let mut substance = sample_substance();
        substance.hazard_class = HazardClass::Corrosive;
        substance.flash_point = None;
        let findings = validate_record(&Entity::HazardousSubstance(substance));
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("PPE"));
    }

    #[test]
    fn high_risk_without_emergency_procedures_is_an_error() {
        let assessment = RiskAssessment {
            meta: EntityMeta::new("ra1"),
            title: "Tank handling".to_string(),
            substance_id: "s1".to_string(),
            risk_level: RiskLevel::High,
            hazards: None,
            mitigation: None,
            ppe: None,
            storage_requirements: None,
            emergency_procedures: None,
            assessor: None,
            date: None,
        };
        let findings = validate_record(&Entity::RiskAssessment(assessment));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
    }
}
