use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for {field}: {value}")]
pub struct InvalidEnumValue {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnumValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Other => "other",
});

str_enum!(BloodGroup {
    APositive => "A+",
    ANegative => "A-",
    BPositive => "B+",
    BNegative => "B-",
    AbPositive => "AB+",
    AbNegative => "AB-",
    OPositive => "O+",
    ONegative => "O-",
});

str_enum!(DraftKind {
    SymptomAnalysis => "symptom_analysis",
    ReportSummary => "report_summary",
    Note => "note",
    Prescription => "prescription",
});

impl DraftKind {
    /// JSON name of the field that carries the free text for this kind.
    pub fn primary_field(&self) -> &'static str {
        match self {
            Self::SymptomAnalysis => "symptoms",
            Self::ReportSummary => "reportText",
            Self::Note => "keywords",
            Self::Prescription => "diagnosis",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn gender_round_trip() {
        for (variant, s) in [
            (Gender::Male, "male"),
            (Gender::Female, "female"),
            (Gender::Other, "other"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Gender::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn gender_rejects_unknown_and_wrong_case() {
        assert!(Gender::from_str("unknown").is_err());
        let err = Gender::from_str("Male").unwrap_err();
        assert_eq!(err.field, "Gender");
        assert_eq!(err.value, "Male");
    }

    #[test]
    fn eight_standard_blood_groups() {
        assert_eq!(BloodGroup::all().len(), 8);
        assert_eq!(BloodGroup::from_str("AB-").unwrap(), BloodGroup::AbNegative);
        assert!(BloodGroup::from_str("C+").is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&BloodGroup::OPositive).unwrap();
        assert_eq!(json, "\"O+\"");
        let kind: DraftKind = serde_json::from_str("\"report_summary\"").unwrap();
        assert_eq!(kind, DraftKind::ReportSummary);
    }

    #[test]
    fn primary_fields_per_kind() {
        assert_eq!(DraftKind::SymptomAnalysis.primary_field(), "symptoms");
        assert_eq!(DraftKind::ReportSummary.primary_field(), "reportText");
        assert_eq!(DraftKind::Note.primary_field(), "keywords");
        assert_eq!(DraftKind::Prescription.primary_field(), "diagnosis");
    }
}
