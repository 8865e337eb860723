use crate::step::StepId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value typed into a numeric field. Session scripts may give either a
/// YAML number or the raw text an operator entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInput {
    Number(f64),
    Text(String),
}

impl RawInput {
    /// The value as a whole number, if it is one. Text is trimmed first;
    /// fractions and non-numeric text give `None`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RawInput::Number(n) if n.is_finite() && n.fract() == 0.0 => {
                if (i64::MIN as f64..=i64::MAX as f64).contains(n) {
                    Some(*n as i64)
                } else {
                    None
                }
            }
            RawInput::Number(_) => None,
            RawInput::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawInput::Number(n) => write!(f, "{}", n),
            RawInput::Text(s) => f.write_str(s),
        }
    }
}

/// One editing action against the work plan table. Plans are addressed by
/// their 1-based row number in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    OpenNew,
    OpenExisting {
        plan: usize,
    },
    Toggle {
        step: StepId,
    },
    SetPriority {
        step: StepId,
        value: RawInput,
    },
    SetParameter {
        step: StepId,
        name: String,
        value: RawInput,
    },
    Reset,
    Save,
    Cancel,
    Delete {
        plan: usize,
    },
    AttachImage {
        plan: usize,
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_accept_whole_numbers_only() {
        assert_eq!(RawInput::Number(3.0).as_integer(), Some(3));
        assert_eq!(RawInput::Number(-1.0).as_integer(), Some(-1));
        assert_eq!(RawInput::Text(" 3 ".into()).as_integer(), Some(3));
        assert_eq!(RawInput::Number(2.5).as_integer(), None);
        assert_eq!(RawInput::Number(f64::NAN).as_integer(), None);
        assert_eq!(RawInput::Number(1e300).as_integer(), None);
        assert_eq!(RawInput::Text("2.5".into()).as_integer(), None);
        assert_eq!(RawInput::Text("high".into()).as_integer(), None);
    }

    #[test]
    fn set_priority_reads_numbers_and_text() {
        let command: Command =
            serde_json::from_str(r#"{"type":"set_priority","step":"coding","value":"3"}"#).unwrap();
        assert_eq!(
            command,
            Command::SetPriority { step: StepId::Coding, value: RawInput::Text("3".into()) }
        );
        let command: Command =
            serde_json::from_str(r#"{"type":"set_priority","step":"coding","value":2.5}"#).unwrap();
        assert_eq!(
            command,
            Command::SetPriority { step: StepId::Coding, value: RawInput::Number(2.5) }
        );
    }
}
