//! The hazardous-substance data model (spec §3): entity kinds, their vocabularies,
//! and the typed relationship edges between them.
//!
//! The teacher's generic model (`core::entity::TraceableEntity`, a `HashMap<String,
//! PropertyValue>` bag tagged with a runtime `EntityType`) is deliberately not reused here.
//! Required-ness and vocabulary membership are invariants of this domain (spec §3,
//! invariant 5), and a tagged variant per kind lets the compiler enforce them; a dynamic
//! bag would only let the validation engine enforce them at runtime, which is what the
//! validation engine already exists to catch for *externally supplied* data, not for data
//! this crate itself constructs.

mod relationship;
mod vocab;

pub use relationship::{Relationship, RelationshipKind};
pub use vocab::{HazardClass, Material, RiskLevel, TestType, VocabError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Common identity and lifecycle fields carried by every entity kind (spec §3: "each has
/// an identifier, creation timestamp, last-modified timestamp").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityMeta {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The RDF subject URI this entity was materialized from, if any (spec §9 open
    /// question: retain the source URI as the natural key instead of discarding it for a
    /// fresh UUID).
    pub source_uri: Option<String>,
}

impl EntityMeta {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        EntityMeta {
            id: id.into(),
            created_at: now,
            updated_at: now,
            source_uri: None,
        }
    }

    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }

    /// Bumps `updated_at`; invariant 6 requires `updated_at >= created_at`, which holds
    /// trivially since `Utc::now()` is monotonic across a process's wall clock reads.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HazardousSubstance {
    pub meta: EntityMeta,
    pub name: String,
    pub chemical_formula: Option<String>,
    pub molecular_weight: Option<f64>,
    pub hazard_class: HazardClass,
    pub flash_point: Option<String>,
    pub boiling_point: Option<f64>,
    pub melting_point: Option<f64>,
    pub density: Option<f64>,
    pub cas_number: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Container {
    pub meta: EntityMeta,
    pub name: String,
    pub material: Material,
    pub capacity: f64,
    pub capacity_unit: String,
    pub pressure_rating: Option<f64>,
    pub temperature_rating: Option<f64>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SafetyTest {
    pub meta: EntityMeta,
    pub name: String,
    pub test_type: TestType,
    pub standard: Option<String>,
    pub method: Option<String>,
    pub duration: Option<f64>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub meta: EntityMeta,
    pub title: String,
    pub substance_id: String,
    pub risk_level: RiskLevel,
    pub hazards: Option<String>,
    pub mitigation: Option<String>,
    pub ppe: Option<String>,
    pub storage_requirements: Option<String>,
    pub emergency_procedures: Option<String>,
    pub assessor: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl RiskAssessment {
    /// Invariant 3: `high` requires emergency_procedures; `critical` additionally requires PPE.
    pub fn check_required_fields(&self) -> Result<(), String> {
        match self.risk_level {
            RiskLevel::High => {
                if self.emergency_procedures.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(
                        "risk level 'high' requires non-empty emergency_procedures".to_string()
                    );
                }
            }
            RiskLevel::Critical => {
                if self.emergency_procedures.as_deref().unwrap_or("").trim().is_empty() {
                    return Err(
                        "risk level 'critical' requires non-empty emergency_procedures"
                            .to_string(),
                    );
                }
                if self.ppe.as_deref().unwrap_or("").trim().is_empty() {
                    return Err("risk level 'critical' requires non-empty ppe".to_string());
                }
            }
            RiskLevel::Low | RiskLevel::Medium => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub meta: EntityMeta,
    pub name: String,
    /// Not drawn from a fixed vocabulary per spec §3/§4.4 (only hazard_class, material,
    /// test_type and risk_level are vocabulary-checked fields).
    pub location_type: String,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub room: Option<String>,
}

/// The five admitted entity kinds, as a closed sum type rather than a string tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum Entity {
    HazardousSubstance(HazardousSubstance),
    Container(Container),
    SafetyTest(SafetyTest),
    RiskAssessment(RiskAssessment),
    Location(Location),
}

impl Entity {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::HazardousSubstance(_) => "HazardousSubstance",
            Entity::Container(_) => "Container",
            Entity::SafetyTest(_) => "SafetyTest",
            Entity::RiskAssessment(_) => "RiskAssessment",
            Entity::Location(_) => "Location",
        }
    }

    pub fn meta(&self) -> &EntityMeta {
        match self {
            Entity::HazardousSubstance(e) => &e.meta,
            Entity::Container(e) => &e.meta,
            Entity::SafetyTest(e) => &e.meta,
            Entity::RiskAssessment(e) => &e.meta,
            Entity::Location(e) => &e.meta,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta().id
    }

    /// The display name used for node labels and duplicate-name detection (spec §4.4
    /// check 5). `RiskAssessment` uses `title` in its place.
    pub fn display_name(&self) -> &str {
        match self {
            Entity::HazardousSubstance(e) => &e.name,
            Entity::Container(e) => &e.name,
            Entity::SafetyTest(e) => &e.name,
            Entity::RiskAssessment(e) => &e.title,
            Entity::Location(e) => &e.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_assessment(risk: RiskLevel) -> RiskAssessment {
        RiskAssessment {
            meta: EntityMeta::new("ra-1"),
            title: "Sulfuric acid handling".to_string(),
            substance_id: "sub-1".to_string(),
            risk_level: risk,
            hazards: None,
            mitigation: None,
            ppe: None,
            storage_requirements: None,
            emergency_procedures: None,
            assessor: None,
            date: None,
        }
    }

    #[test]
    fn high_risk_without_emergency_procedures_fails() {
        let assessment = sample_assessment(RiskLevel::High);
        assert!(assessment.check_required_fields().is_err());
    }

    #[test]
    fn critical_risk_requires_ppe_even_with_procedures() {
        let mut assessment = sample_assessment(RiskLevel::Critical);
        assessment.emergency_procedures = Some("Evacuate area".to_string());
        assert!(assessment.check_required_fields().is_err());
        assessment.ppe = Some("Full face respirator".to_string());
        assert!(assessment.check_required_fields().is_ok());
    }

    #[test]
    fn low_risk_has_no_required_fields() {
        let assessment = sample_assessment(RiskLevel::Low);
        assert!(assessment.check_required_fields().is_ok());
    }

    #[test]
    fn entity_meta_touch_keeps_updated_at_monotonic() {
        let mut meta = EntityMeta::new("x");
        let created = meta.created_at;
        meta.touch();
        assert!(meta.updated_at >= created);
    }
}
