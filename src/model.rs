use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of sales territories a rate applies to. Rows carrying any
/// other code never enter the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// MAE, the state-wide aggregate zone.
    Statewide,
    /// MAI, the interior aggregate zone.
    Interior,
    /// MA1, São Luís.
    SaoLuis,
    /// IMP, Imperatriz.
    Imperatriz,
    /// BAS, Balsas.
    Balsas,
    /// CDO, Codó.
    Codo,
}

impl Region {
    /// Every known region, in the order reports are generated.
    pub const ALL: [Region; 6] = [
        Region::Statewide,
        Region::Interior,
        Region::SaoLuis,
        Region::Imperatriz,
        Region::Balsas,
        Region::Codo,
    ];

    /// Short code used in source data and report file names.
    pub fn code(self) -> &'static str {
        match self {
            Region::Statewide => "MAE",
            Region::Interior => "MAI",
            Region::SaoLuis => "MA1",
            Region::Imperatriz => "IMP",
            Region::Balsas => "BAS",
            Region::Codo => "CDO",
        }
    }

    /// Display name stamped into the report header.
    pub fn name(self) -> &'static str {
        match self {
            Region::Statewide => "Statewide",
            Region::Interior => "Interior",
            Region::SaoLuis => "São Luís",
            Region::Imperatriz => "Imperatriz",
            Region::Balsas => "Balsas",
            Region::Codo => "Codó",
        }
    }

    /// Resolves a raw code, tolerating stray whitespace and lowercase input.
    pub fn from_code(raw: &str) -> Option<Region> {
        let code = raw.trim().to_uppercase();
        Region::ALL.into_iter().find(|region| region.code() == code)
    }
}

/// Canonical label for a set of broadcast days after order-independent
/// token matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonicalDay {
    Mon,
    MonFri,
    MonSat,
    MonSun,
    Tue,
    TueThu,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
    /// A spec that matched no reference set; carries the normalized tokens.
    Unknown(String),
    /// Empty or placeholder input.
    Missing,
}

impl fmt::Display for CanonicalDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalDay::Mon => write!(f, "MON"),
            CanonicalDay::MonFri => write!(f, "MON-FRI"),
            CanonicalDay::MonSat => write!(f, "MON-SAT"),
            CanonicalDay::MonSun => write!(f, "MON-SUN"),
            CanonicalDay::Tue => write!(f, "TUE"),
            CanonicalDay::TueThu => write!(f, "TUE-THU"),
            CanonicalDay::Wed => write!(f, "WED"),
            CanonicalDay::Thu => write!(f, "THU"),
            CanonicalDay::Fri => write!(f, "FRI"),
            CanonicalDay::Sat => write!(f, "SAT"),
            CanonicalDay::Sun => write!(f, "SUN"),
            CanonicalDay::Unknown(raw) => write!(f, "{raw}"),
            CanonicalDay::Missing => write!(f, "-"),
        }
    }
}

/// Coarse weekday/Saturday/Sunday partition selecting the template block a
/// record lands in. Independent from, and coarser than, [`CanonicalDay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayGroup {
    Weekday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayGroup::Weekday => write!(f, "weekday"),
            DayGroup::Saturday => write!(f, "Saturday"),
            DayGroup::Sunday => write!(f, "Sunday"),
        }
    }
}

/// One advertising rate entry after region filtering and time normalization.
///
/// `day_spec` keeps the raw schedule string; canonical labels are derived on
/// demand and never persisted. Prices are `None` when the source left them
/// blank; they stay empty on display, zero is a legitimate present value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub program_code: String,
    pub program_name: String,
    pub day_spec: String,
    /// Normalized `HH:MM`, or `None` for the `-` sentinel.
    pub time: Option<String>,
    pub region: Region,
    pub genre: String,
    pub price_30s: Option<f64>,
    pub price_15s: Option<f64>,
    pub price_10s: Option<f64>,
}

impl RateRecord {
    /// Display form of the time field.
    pub fn time_label(&self) -> &str {
        self.time.as_deref().unwrap_or("-")
    }

    /// Identity key used for deduplication. Region is deliberately not part
    /// of the key: dedup runs after the record set is filtered to a single
    /// region.
    pub fn identity_key(&self) -> (String, String, String, String) {
        (
            self.program_code.clone(),
            self.program_name.clone(),
            self.day_spec.clone(),
            self.time_label().to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_codes_round_trip() {
        for region in Region::ALL {
            assert_eq!(Region::from_code(region.code()), Some(region));
        }
    }

    #[test]
    fn region_code_resolution_is_forgiving() {
        assert_eq!(Region::from_code(" mae "), Some(Region::Statewide));
        assert_eq!(Region::from_code("ma1"), Some(Region::SaoLuis));
        assert_eq!(Region::from_code("XYZ"), None);
        assert_eq!(Region::from_code(""), None);
    }

    #[test]
    fn canonical_day_labels() {
        assert_eq!(CanonicalDay::MonFri.to_string(), "MON-FRI");
        assert_eq!(CanonicalDay::Missing.to_string(), "-");
        assert_eq!(
            CanonicalDay::Unknown("WED/SUN".to_string()).to_string(),
            "WED/SUN"
        );
    }
}
