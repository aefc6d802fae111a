//! Typed relationship edges (spec §3): `HAS_HAZARD_CLASS`, `STORED_IN`, `TESTED_WITH`,
//! `ASSESSED_FOR`, `COMPATIBLE_WITH`/`INCOMPATIBLE_WITH`, `REQUIRES_PPE`, `LOCATED_AT`,
//! `MANUFACTURED_BY`, `CONTAINS`, `SIMILAR_TO`, `REPLACES`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    HasHazardClass,
    StoredIn,
    TestedWith,
    AssessedFor,
    CompatibleWith,
    IncompatibleWith,
    RequiresPpe,
    LocatedAt,
    ManufacturedBy,
    Contains,
    SimilarTo,
    Replaces,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::HasHazardClass => "HAS_HAZARD_CLASS",
            RelationshipKind::StoredIn => "STORED_IN",
            RelationshipKind::TestedWith => "TESTED_WITH",
            RelationshipKind::AssessedFor => "ASSESSED_FOR",
            RelationshipKind::CompatibleWith => "COMPATIBLE_WITH",
            RelationshipKind::IncompatibleWith => "INCOMPATIBLE_WITH",
            RelationshipKind::RequiresPpe => "REQUIRES_PPE",
            RelationshipKind::LocatedAt => "LOCATED_AT",
            RelationshipKind::ManufacturedBy => "MANUFACTURED_BY",
            RelationshipKind::Contains => "CONTAINS",
            RelationshipKind::SimilarTo => "SIMILAR_TO",
            RelationshipKind::Replaces => "REPLACES",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed edge between two nodes, identified by `(kind, id)` pairs on each side so the
/// graph store can check existence independent of label collisions across entity kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub source_kind: String,
    pub source_id: String,
    pub target_kind: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
    /// Edge-carried properties, e.g. `quantity`/`date_stored` on STORED_IN, `date`/`result`
    /// on TESTED_WITH, `notes` on COMPATIBLE_WITH/INCOMPATIBLE_WITH.
    pub properties: HashMap<String, String>,
}

impl Relationship {
    pub fn new(
        kind: RelationshipKind,
        source_kind: impl Into<String>,
        source_id: impl Into<String>,
        target_kind: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Relationship {
            kind,
            source_kind: source_kind.into(),
            source_id: source_id.into(),
            target_kind: target_kind.into(),
            target_id: target_id.into(),
            created_at: Utc::now(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_kind_serializes_as_screaming_snake_case() {
        assert_eq!(RelationshipKind::StoredIn.as_str(), "STORED_IN");
        assert_eq!(RelationshipKind::HasHazardClass.as_str(), "HAS_HAZARD_CLASS");
    }

    #[test]
    fn carries_edge_properties() {
        let rel = Relationship::new(
            RelationshipKind::StoredIn,
            "HazardousSubstance",
            "sub-1",
            "Container",
            "cont-1",
        )
        .with_property("quantity", "50L")
        .with_property("date_stored", "2026-01-01");

        assert_eq!(rel.properties.get("quantity").map(String::as_str), Some("50L"));
    }
}
