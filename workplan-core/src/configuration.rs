use crate::error::WorkPlanError;
use serde::{Deserialize, Serialize};
use std::mem;
use tracing::debug;
use workplan_schemas::step::{ParameterName, ProcessStep, StepId, StepParameters};

/// Name shown for a configuration that has no enabled step.
pub const UNCONFIGURED_NAME: &str = "未配置工序";

pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 4;

/// The editable draft of a work plan: all four steps, always present.
///
/// Mutations never block on the soft priority invariant; duplicates among
/// enabled steps are reported by [`ProcessConfiguration::validate_priorities`]
/// and rejected only when the configuration is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredConfiguration")]
pub struct ProcessConfiguration {
    steps: [ProcessStep; 4],
}

/// Wire shape of a configuration. Deserialized data only becomes a
/// [`ProcessConfiguration`] through [`ProcessConfiguration::from_steps`].
#[derive(Deserialize)]
struct StoredConfiguration {
    steps: Vec<ProcessStep>,
}

impl TryFrom<StoredConfiguration> for ProcessConfiguration {
    type Error = WorkPlanError;

    fn try_from(stored: StoredConfiguration) -> Result<Self, Self::Error> {
        Self::from_steps(stored.steps)
    }
}

/// Everything a renderer needs to refresh after a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationPreview {
    pub name: String,
    pub priority_conflict: bool,
    pub coding_locked: bool,
}

impl Default for ProcessConfiguration {
    fn default() -> Self {
        Self {
            steps: StepId::ALL.map(ProcessStep::with_defaults),
        }
    }
}

impl ProcessConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from steps in any order.
    ///
    /// Each id must appear exactly once, priorities must lie in `1..=4` and the
    /// parameter record must match the step's schema. Measures and counts are
    /// coerced the same way [`ProcessConfiguration::set_parameter`] coerces input.
    pub fn from_steps(steps: Vec<ProcessStep>) -> Result<Self, WorkPlanError> {
        let mut configuration = Self::default();
        let mut seen = [false; 4];

        for mut step in steps {
            let id = step.id;
            if seen[id.index()] {
                return Err(WorkPlanError::InvalidSnapshot(format!(
                    "step '{}' appears more than once",
                    id
                )));
            }
            if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&i64::from(step.priority)) {
                return Err(WorkPlanError::InvalidSnapshot(format!(
                    "priority {} of step '{}' is outside {}..={}",
                    step.priority, id, MIN_PRIORITY, MAX_PRIORITY
                )));
            }
            if mem::discriminant(&step.parameters) != mem::discriminant(&StepParameters::defaults_for(id)) {
                return Err(WorkPlanError::InvalidSnapshot(format!(
                    "step '{}' carries parameters of another step kind",
                    id
                )));
            }
            match &mut step.parameters {
                StepParameters::Timed { time: measure, count }
                | StepParameters::Weighed { weight: measure, count } => {
                    *measure = clamp_measure(*measure);
                    *count = (*count).max(1);
                }
            }
            seen[id.index()] = true;
            configuration.steps[id.index()] = step;
        }

        if let Some(id) = StepId::ALL.into_iter().find(|id| !seen[id.index()]) {
            return Err(WorkPlanError::InvalidSnapshot(format!("step '{}' is missing", id)));
        }
        Ok(configuration)
    }

    pub fn step(&self, id: StepId) -> &ProcessStep {
        &self.steps[id.index()]
    }

    fn step_mut(&mut self, id: StepId) -> &mut ProcessStep {
        &mut self.steps[id.index()]
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &ProcessStep> {
        self.steps.iter()
    }

    /// Enabled steps ordered by priority; equal priorities keep declaration order.
    pub fn enabled_steps(&self) -> Vec<&ProcessStep> {
        let mut enabled: Vec<&ProcessStep> = self.steps.iter().filter(|s| s.enabled).collect();
        enabled.sort_by_key(|s| s.priority);
        enabled
    }

    pub fn has_enabled_step(&self) -> bool {
        self.steps.iter().any(|s| s.enabled)
    }

    /// Restores every step to disabled with default priority and parameters.
    pub fn reset(&mut self) {
        *self = Self::default();
        debug!("process configuration reset to defaults");
    }

    /// Flips `enabled` for a step and returns whether anything changed.
    ///
    /// Disabling assembly also disables coding. Coding cannot be toggled while
    /// assembly is disabled.
    pub fn toggle(&mut self, id: StepId) -> bool {
        if !self.is_toggle_available(id) {
            debug!(step = %id, "toggle ignored: assembly is disabled");
            return false;
        }

        let enabled = !self.step(id).enabled;
        self.step_mut(id).enabled = enabled;
        if id == StepId::Assembly && !enabled {
            self.step_mut(StepId::Coding).enabled = false;
        }
        debug!(step = %id, enabled, "step toggled");
        true
    }

    pub fn is_toggle_available(&self, id: StepId) -> bool {
        id != StepId::Coding || self.step(StepId::Assembly).enabled
    }

    /// Sets the priority of a step. Values outside `1..=4` leave the state
    /// unchanged and come back as an advisory.
    pub fn set_priority(&mut self, id: StepId, value: i64) -> Result<(), WorkPlanError> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&value) {
            return Err(WorkPlanError::InvalidInput(format!(
                "priority {} for step '{}' is outside {}..={}",
                value, id, MIN_PRIORITY, MAX_PRIORITY
            )));
        }
        self.step_mut(id).priority = value as u8;
        debug!(step = %id, priority = value, "priority updated");
        Ok(())
    }

    /// Stores a parameter parsed from raw field text and returns the stored value.
    ///
    /// Unparseable, non-finite or negative input becomes 0; `count` is then
    /// floored to a whole number of at least 1. A parameter outside the step's
    /// schema is an advisory and nothing is stored.
    pub fn set_parameter(
        &mut self,
        id: StepId,
        name: ParameterName,
        raw: &str,
    ) -> Result<f64, WorkPlanError> {
        let value = coerce_parameter(name, raw);
        let step = self.step_mut(id);
        let stored = match (&mut step.parameters, name) {
            (StepParameters::Timed { time, .. }, ParameterName::Time) => {
                *time = value;
                value
            }
            (StepParameters::Weighed { weight, .. }, ParameterName::Weight) => {
                *weight = value;
                value
            }
            (StepParameters::Timed { count, .. }, ParameterName::Count)
            | (StepParameters::Weighed { count, .. }, ParameterName::Count) => {
                *count = value as u32;
                f64::from(*count)
            }
            _ => {
                return Err(WorkPlanError::InvalidInput(format!(
                    "step '{}' has no parameter '{}'",
                    id, name
                )))
            }
        };
        debug!(step = %id, parameter = %name, raw, stored, "parameter updated");
        Ok(stored)
    }

    /// Display names of the enabled steps in priority order, joined by `-`.
    pub fn generate_name(&self) -> String {
        let enabled = self.enabled_steps();
        if enabled.is_empty() {
            return UNCONFIGURED_NAME.to_string();
        }
        enabled
            .iter()
            .map(|s| s.display_name())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// True when no two enabled steps share a priority.
    pub fn validate_priorities(&self) -> bool {
        let mut seen: Vec<u8> = Vec::with_capacity(self.steps.len());
        for step in self.steps.iter().filter(|s| s.enabled) {
            if seen.contains(&step.priority) {
                return false;
            }
            seen.push(step.priority);
        }
        true
    }

    /// True unless coding is enabled without assembly.
    pub fn validate_dependency(&self) -> bool {
        !(self.step(StepId::Coding).enabled && !self.step(StepId::Assembly).enabled)
    }

    /// Commit-time checks, in the order they are reported.
    pub fn validate(&self) -> Result<(), WorkPlanError> {
        if !self.validate_priorities() {
            return Err(WorkPlanError::PriorityConflict);
        }
        if !self.has_enabled_step() {
            return Err(WorkPlanError::EmptyPlan);
        }
        if !self.validate_dependency() {
            return Err(WorkPlanError::UnsatisfiedDependency);
        }
        Ok(())
    }

    pub fn preview(&self) -> ConfigurationPreview {
        ConfigurationPreview {
            name: self.generate_name(),
            priority_conflict: !self.validate_priorities(),
            coding_locked: !self.is_toggle_available(StepId::Coding),
        }
    }

    /// An independent deep copy of the current state.
    pub fn snapshot(&self) -> ProcessConfiguration {
        self.clone()
    }

    /// Replaces the current state with a deep copy of `snapshot`.
    pub fn restore(&mut self, snapshot: &ProcessConfiguration) {
        self.steps.clone_from(&snapshot.steps);
    }
}

/// Non-finite, negative and negative-zero measures all become 0.
fn clamp_measure(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn coerce_parameter(name: ParameterName, raw: &str) -> f64 {
    let value = parse_leading_number(raw).map(clamp_measure).unwrap_or(0.0);
    match name {
        ParameterName::Count => value.floor().clamp(1.0, f64::from(u32::MAX)),
        ParameterName::Time | ParameterName::Weight => value,
    }
}

/// Reads the longest numeric prefix of a field, ignoring leading whitespace,
/// so "12 kg" reads as 12.
fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos = 1;
            true
        }
        Some(b'+') => {
            pos = 1;
            false
        }
        _ => false,
    };

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_part = &s[int_start..pos];

    let mut frac_part = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if !int_part.is_empty() || frac_end > frac_start {
            frac_part = &s[frac_start..frac_end];
            pos = frac_end;
        }
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut exp_part = "";
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp_end = pos + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            exp_part = &s[pos + 1..exp_end];
        }
    }

    let mut normalized = String::with_capacity(pos + 3);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        normalized.push('.');
        normalized.push_str(frac_part);
    }
    if !exp_part.is_empty() {
        normalized.push('e');
        normalized.push_str(exp_part);
    }
    normalized.parse::<f64>().ok()
}
