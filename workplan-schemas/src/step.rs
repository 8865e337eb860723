use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four fixed operations a work plan can be composed of.
///
/// The declaration order is significant: it is the tie-break order when two
/// enabled steps share a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Drilling,
    Assembly,
    Weighing,
    Coding,
}

impl StepId {
    pub const ALL: [StepId; 4] = [
        StepId::Drilling,
        StepId::Assembly,
        StepId::Weighing,
        StepId::Coding,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StepId::Drilling => "drilling",
            StepId::Assembly => "assembly",
            StepId::Weighing => "weighing",
            StepId::Coding => "coding",
        }
    }

    /// Name shown to operators and used to build plan names.
    pub fn display_name(self) -> &'static str {
        match self {
            StepId::Drilling => "钻孔",
            StepId::Assembly => "装配",
            StepId::Weighing => "称重",
            StepId::Coding => "喷码",
        }
    }

    pub fn default_priority(self) -> u8 {
        self.index() as u8 + 1
    }

    pub fn index(self) -> usize {
        match self {
            StepId::Drilling => 0,
            StepId::Assembly => 1,
            StepId::Weighing => 2,
            StepId::Coding => 3,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Numeric parameter keys across all step schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterName {
    Time,
    Weight,
    Count,
}

impl ParameterName {
    pub fn key(self) -> &'static str {
        match self {
            ParameterName::Time => "time",
            ParameterName::Weight => "weight",
            ParameterName::Count => "count",
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ParameterName {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "time" => Ok(ParameterName::Time),
            "weight" => Ok(ParameterName::Weight),
            "count" => Ok(ParameterName::Count),
            other => Err(UnknownKey::new("parameter", other)),
        }
    }
}

/// Returned when a step or parameter key does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey {
    pub kind: &'static str,
    pub key: String,
}

impl UnknownKey {
    fn new(kind: &'static str, key: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
        }
    }
}

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.key)
    }
}

impl std::error::Error for UnknownKey {}

/// Parameter record of a step. The variant is fixed by the step identity:
/// weighing is the only step measured by weight, every other step by time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepParameters {
    Timed { time: f64, count: u32 },
    Weighed { weight: f64, count: u32 },
}

impl StepParameters {
    pub fn defaults_for(id: StepId) -> Self {
        match id {
            StepId::Drilling => StepParameters::Timed { time: 5.0, count: 3 },
            StepId::Assembly => StepParameters::Timed { time: 10.0, count: 1 },
            StepId::Weighing => StepParameters::Weighed { weight: 2.0, count: 1 },
            StepId::Coding => StepParameters::Timed { time: 3.0, count: 1 },
        }
    }

    pub fn get(&self, name: ParameterName) -> Option<f64> {
        match (self, name) {
            (StepParameters::Timed { time, .. }, ParameterName::Time) => Some(*time),
            (StepParameters::Weighed { weight, .. }, ParameterName::Weight) => Some(*weight),
            (StepParameters::Timed { count, .. }, ParameterName::Count)
            | (StepParameters::Weighed { count, .. }, ParameterName::Count) => Some(f64::from(*count)),
            _ => None,
        }
    }

    pub fn supports(&self, name: ParameterName) -> bool {
        self.get(name).is_some()
    }

    pub fn count(&self) -> u32 {
        match self {
            StepParameters::Timed { count, .. } | StepParameters::Weighed { count, .. } => *count,
        }
    }
}

/// A single step inside a process configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub id: StepId,
    pub enabled: bool,
    pub priority: u8,
    pub parameters: StepParameters,
}

impl ProcessStep {
    /// The step as it exists at the start of a fresh configuration session.
    pub fn with_defaults(id: StepId) -> Self {
        Self {
            id,
            enabled: false,
            priority: id.default_priority(),
            parameters: StepParameters::defaults_for(id),
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.id.display_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_their_serialized_form() {
        for id in StepId::ALL {
            assert_eq!(serde_json::to_value(id).unwrap(), id.key());
        }
        assert_eq!(" count ".parse::<ParameterName>().unwrap(), ParameterName::Count);
        let err = "height".parse::<ParameterName>().unwrap_err();
        assert_eq!(err.to_string(), "unknown parameter 'height'");
    }

    #[test]
    fn default_priorities_follow_declaration_order() {
        let priorities: Vec<u8> = StepId::ALL.iter().map(|id| id.default_priority()).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
    }

    #[test]
    fn weighing_schema_has_no_time() {
        let weighing = StepParameters::defaults_for(StepId::Weighing);
        assert!(!weighing.supports(ParameterName::Time));
        assert_eq!(weighing.get(ParameterName::Weight), Some(2.0));
        assert_eq!(weighing.get(ParameterName::Count), Some(1.0));

        let drilling = StepParameters::defaults_for(StepId::Drilling);
        assert!(!drilling.supports(ParameterName::Weight));
        assert_eq!(drilling.count(), 3);
    }

    #[test]
    fn parameters_serialize_with_kind_tag() {
        let json = serde_json::to_value(StepParameters::defaults_for(StepId::Weighing)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "weighed", "weight": 2.0, "count": 1 }));
    }
}
