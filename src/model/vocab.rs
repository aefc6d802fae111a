//! Fixed vocabularies for the four enumerated fields named in spec §3/§4.4: hazard_class,
//! material, test_type, risk_level. Each is a closed Rust enum with a `FromStr` impl that
//! rejects anything outside the vocabulary, so "enumerated fields are never outside their
//! vocabulary" (invariant 5) is enforced by the type system for data this crate
//! constructs, and by the `FromStr` error for data read from CSV/RDF.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A value did not match any member of a fixed vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabError {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for VocabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a valid {} (not in the fixed vocabulary)",
            self.value, self.field
        )
    }
}

impl std::error::Error for VocabError {}

macro_rules! closed_vocab {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = VocabError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase();
                $(if normalized == $text { return Ok($name::$variant); })+
                Err(VocabError { field: $field, value: s.to_string() })
            }
        }
    };
}

closed_vocab!(HazardClass, "hazard_class", {
    Flammable => "flammable",
    Toxic => "toxic",
    Corrosive => "corrosive",
    Explosive => "explosive",
    Oxidizing => "oxidizing",
    Environmental => "environmental",
    Health => "health",
    Irritant => "irritant",
    Sensitizer => "sensitizer",
    Carcinogen => "carcinogen",
    Mutagen => "mutagen",
    ReproductiveToxin => "reproductive_toxin",
});

closed_vocab!(Material, "material", {
    StainlessSteel => "stainless_steel",
    Glass => "glass",
    Plastic => "plastic",
    Aluminum => "aluminum",
    CarbonSteel => "carbon_steel",
    Titanium => "titanium",
    Ceramic => "ceramic",
});

closed_vocab!(TestType, "test_type", {
    PressureTest => "pressure_test",
    LeakTest => "leak_test",
    MaterialCompatibility => "material_compatibility",
    TemperatureTest => "temperature_test",
    CorrosionTest => "corrosion_test",
    ImpactTest => "impact_test",
});

closed_vocab!(RiskLevel, "risk_level", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_hazard_classes_case_insensitively() {
        assert_eq!(HazardClass::from_str("Corrosive"), Ok(HazardClass::Corrosive));
        assert_eq!(HazardClass::from_str("  toxic "), Ok(HazardClass::Toxic));
    }

    #[test]
    fn rejects_unknown_values() {
        let err = HazardClass::from_str("unknown_hazard").unwrap_err();
        assert_eq!(err.field, "hazard_class");
        assert_eq!(err.value, "unknown_hazard");
    }

    #[test]
    fn round_trips_display_and_parse() {
        for material in Material::ALL {
            assert_eq!(Material::from_str(material.as_str()).unwrap(), *material);
        }
    }
}
