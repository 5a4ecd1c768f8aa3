use serde::{ Deserialize, Deserializer, Serialize, Serializer };
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const SPEC_KEYS: [&str; 5] = [
    "GPU intensity",
    "Display quality",
    "Portability",
    "Multitasking",
    "Processing speed",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    Low,
    Medium,
    High,
    Unknown,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Low => "low",
            Rating::Medium => "medium",
            Rating::High => "high",
            Rating::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Rating::Low),
            "medium" => Ok(Rating::Medium),
            "high" => Ok(Rating::High),
            "unknown" => Ok(Rating::Unknown),
            _ => Err(format!("Invalid rating: '{}'", s)),
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Qualitative ratings for the five feature categories a laptop is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRatings {
    #[serde(rename = "GPU intensity")]
    pub gpu_intensity: Rating,
    #[serde(rename = "Display quality")]
    pub display_quality: Rating,
    #[serde(rename = "Portability")]
    pub portability: Rating,
    #[serde(rename = "Multitasking")]
    pub multitasking: Rating,
    #[serde(rename = "Processing speed")]
    pub processing_speed: Rating,
}

impl SpecRatings {
    pub fn unknown() -> Self {
        Self {
            gpu_intensity: Rating::Unknown,
            display_quality: Rating::Unknown,
            portability: Rating::Unknown,
            multitasking: Rating::Unknown,
            processing_speed: Rating::Unknown,
        }
    }

    pub fn values(&self) -> [Rating; 5] {
        [
            self.gpu_intensity,
            self.display_quality,
            self.portability,
            self.multitasking,
            self.processing_speed,
        ]
    }

    pub fn has_unknown(&self) -> bool {
        self.values().contains(&Rating::Unknown)
    }
}

pub const PERSONA_VALUES: [Persona; 8] = [
    Persona::Gamer,
    Persona::Student,
    Persona::Business,
    Persona::ProfessionalCreator,
    Persona::Developer,
    Persona::CasualUser,
    Persona::Traveler,
    Persona::BudgetConscious,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Persona {
    Gamer,
    Student,
    Business,
    ProfessionalCreator,
    Developer,
    CasualUser,
    Traveler,
    BudgetConscious,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Gamer => "gamer",
            Persona::Student => "student",
            Persona::Business => "business",
            Persona::ProfessionalCreator => "professional_creator",
            Persona::Developer => "developer",
            Persona::CasualUser => "casual_user",
            Persona::Traveler => "traveler",
            Persona::BudgetConscious => "budget_conscious",
        }
    }

    pub fn names() -> Vec<&'static str> {
        PERSONA_VALUES.iter().map(|p| p.as_str()).collect()
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PERSONA_VALUES.iter()
            .find(|p| p.as_str() == wanted)
            .copied()
            .ok_or_else(|| format!("Invalid persona: '{}'", s))
    }
}

impl Serialize for Persona {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Persona {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One catalog row after price normalisation and enrichment.
///
/// `attributes` keeps every raw column that has no dedicated field, keyed by
/// its header, so a lookup can hand back the full record.
#[derive(Debug, Clone, PartialEq)]
pub struct Laptop {
    pub brand: Option<String>,
    pub model_name: Option<String>,
    pub price: f64,
    pub ram_size: Option<String>,
    pub graphics_processor: Option<String>,
    pub description: Option<String>,
    pub specification_ratings: Option<SpecRatings>,
    pub persona: Vec<Persona>,
    pub attributes: BTreeMap<String, Option<String>>,
}

impl Laptop {
    pub fn matches_model(&self, needle_lower: &str) -> bool {
        self.model_name
            .as_deref()
            .map(|name| name.to_lowercase().contains(needle_lower))
            .unwrap_or(false)
    }

    pub fn matches_any_persona(&self, wanted: &[Persona]) -> bool {
        self.persona.iter().any(|p| wanted.contains(p))
    }
}
