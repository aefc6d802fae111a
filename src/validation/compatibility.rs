//! Compatibility rules (C5): substance↔container admissibility (spec §4.5) plus the
//! supplemented substance↔substance shape check described in SPEC_FULL §C.

use crate::graph::GraphStore;
use crate::model::{Container, HazardClass, HazardousSubstance, Material};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityIssue {
    Forbidden { hazard_class: HazardClass, material: Material },
    BoilingPointExceedsRating { boiling_point: f64, rating: f64 },
    LowPressureRating { rating: f64 },
    MutualSubstanceIncompatibility,
}

#[derive(Debug, Clone, Default)]
pub struct CompatibilityReport {
    pub compatible: bool,
    pub errors: Vec<CompatibilityIssue>,
    pub warnings: Vec<CompatibilityIssue>,
}

pub struct CompatibilityRules;

impl CompatibilityRules {
    /// The fixed incompatibility table (spec §4.5): hazard class to forbidden container
    /// materials.
    fn forbidden_materials(hazard_class: HazardClass) -> &'static [Material] {
        match hazard_class {
            HazardClass::Corrosive => &[Material::Aluminum, Material::CarbonSteel],
            HazardClass::Oxidizing => &[Material::Plastic],
            HazardClass::Flammable => &[Material::Plastic],
            _ => &[],
        }
    }

    /// Checks whether `substance` may be stored in `container` (spec §4.5 `check`
    /// operation). A forbidden pair is an error (invariant 4: a STORED_IN edge may only
    /// exist if the pair is not forbidden); the boiling-point and low-pressure-rating
    /// findings are advisory warnings only.
    pub fn check(substance: &HazardousSubstance, container: &Container) -> CompatibilityReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if Self::forbidden_materials(substance.hazard_class).contains(&container.material) {
            errors.push(CompatibilityIssue::Forbidden {
                hazard_class: substance.hazard_class,
                material: container.material,
            });
        }

        if let (Some(boiling_point), Some(rating)) = (substance.boiling_point, container.temperature_rating) {
            if boiling_point > rating {
                warnings.push(CompatibilityIssue::BoilingPointExceedsRating { boiling_point, rating });
            }
        }

        if let Some(rating) = container.pressure_rating {
            if rating < 1.0 {
                warnings.push(CompatibilityIssue::LowPressureRating { rating });
            }
        }

        CompatibilityReport {
            compatible: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Supplemented check (SPEC_FULL §C): flags a warning when a STORED_IN is attempted
    /// between a substance and a container that each individually pass `check`, but the
    /// substance is recorded as `INCOMPATIBLE_WITH` another substance already stored in
    /// the same container. This is a direct consequence of the spec's own
    /// `COMPATIBLE_WITH`/`INCOMPATIBLE_WITH` relationship vocabulary, not a new relation.
    pub fn check_mutual_incompatibility(
        graph: &GraphStore,
        substance_id: &str,
        other_substance_id: &str,
    ) -> Option<CompatibilityIssue> {
        let forward = graph.relationship_exists(
            ("HazardousSubstance", substance_id),
            "INCOMPATIBLE_WITH",
            ("HazardousSubstance", other_substance_id),
        );
        let backward = graph.relationship_exists(
            ("HazardousSubstance", other_substance_id),
            "INCOMPATIBLE_WITH",
            ("HazardousSubstance", substance_id),
        );
        if forward || backward {
            Some(CompatibilityIssue::MutualSubstanceIncompatibility)
        } else {
            None
        }
    }
}
