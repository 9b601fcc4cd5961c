use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

use super::values::normalize_concept;
use crate::analysis::units::ParsedUnit;

/// Declared precision of a numeric fact.
///
/// `Finite(-3)` means "accurate to the nearest thousand", `Finite(2)` to the
/// nearest hundredth. `Unbounded` is the `INF` attribute (or an absent one)
/// and imposes no rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decimals {
    Finite(i32),
    Unbounded,
}

impl Default for Decimals {
    fn default() -> Self {
        Decimals::Unbounded
    }
}

impl Decimals {
    /// Parses an attribute value: an integer, or `INF`/`infinity` in any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("inf") || trimmed.eq_ignore_ascii_case("infinity") {
            return Some(Decimals::Unbounded);
        }
        trimmed.parse::<i32>().ok().map(Decimals::Finite)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Decimals::Unbounded)
    }

    /// The less precise of the two. `Unbounded` defers to the other side.
    pub fn lesser(self, other: Self) -> Self {
        self.min(other)
    }
}

// Precision ordering: Finite(-6) < Finite(0) < Finite(2) < Unbounded.
impl Ord for Decimals {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Decimals::Finite(a), Decimals::Finite(b)) => a.cmp(b),
            (Decimals::Finite(_), Decimals::Unbounded) => Ordering::Less,
            (Decimals::Unbounded, Decimals::Finite(_)) => Ordering::Greater,
            (Decimals::Unbounded, Decimals::Unbounded) => Ordering::Equal,
        }
    }
}

impl PartialOrd for Decimals {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Decimals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decimals::Finite(d) => write!(f, "{}", d),
            Decimals::Unbounded => f.write_str("INF"),
        }
    }
}

impl Serialize for Decimals {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Decimals::Finite(d) => serializer.serialize_i32(*d),
            Decimals::Unbounded => serializer.serialize_str("INF"),
        }
    }
}

impl<'de> Deserialize<'de> for Decimals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(d) => Ok(Decimals::Finite(d)),
            Raw::Text(s) => Decimals::parse(&s)
                .ok_or_else(|| D::Error::custom(format!("invalid decimals attribute '{}'", s))),
        }
    }
}

/// A unit of measure as reported (`iso4217:USD`, `USD/shares`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit(pub String);

impl Unit {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Canonical form used for U-Equal. Falls back to the trimmed,
    /// lowercased text when the measure does not parse.
    pub fn canonical(&self) -> String {
        match ParsedUnit::from_measure(&self.0) {
            Ok(parsed) => parsed.to_string(),
            Err(_) => self.0.trim().to_ascii_lowercase(),
        }
    }

    /// U-Equal. An unknown unit on either side never blocks a match.
    pub fn matches(a: Option<&Unit>, b: Option<&Unit>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => a.0 == b.0 || a.canonical() == b.canonical(),
            _ => true,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single reported numeric fact, immutable once extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fact {
    /// Normalized concept name used for all lookups.
    pub concept: String,
    /// Concept name as it appeared in the source.
    pub original_concept: String,
    pub value: f64,
    pub unit: Option<Unit>,
    pub decimals: Decimals,
    pub context_id: String,
    pub is_nil: bool,
    /// Name of the statement the fact was mapped into, when known.
    pub statement: Option<String>,
}

impl Fact {
    pub fn new(concept: impl Into<String>, value: f64, context_id: impl Into<String>) -> Self {
        let original_concept = concept.into();
        Self {
            concept: normalize_concept(&original_concept),
            original_concept,
            value,
            unit: None,
            decimals: Decimals::Unbounded,
            context_id: context_id.into(),
            is_nil: false,
            statement: None,
        }
    }

    pub fn with_decimals(mut self, decimals: Decimals) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(Unit::new(unit));
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    pub fn nil(mut self) -> Self {
        self.is_nil = true;
        self
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A filer-declared parent→child summation relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationArc {
    pub parent_concept: String,
    pub child_concept: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub order: f64,
    /// Extended link role URI. Empty means "inherit from the network".
    #[serde(default)]
    pub role: String,
}

impl CalculationArc {
    pub fn new(parent: impl Into<String>, child: impl Into<String>, weight: f64) -> Self {
        Self {
            parent_concept: parent.into(),
            child_concept: child.into(),
            weight,
            order: 0.0,
            role: String::new(),
        }
    }

    pub fn in_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}

/// The arcs declared under one extended link role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationNetwork {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub arcs: Vec<CalculationArc>,
}

impl CalculationNetwork {
    pub fn new(role: impl Into<String>, arcs: Vec<CalculationArc>) -> Self {
        Self { role: role.into(), arcs }
    }
}
