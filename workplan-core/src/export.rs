use crate::{error::WorkPlanError, store::WorkPlan};
use csv::Writer;
use serde::Serialize;
use std::fs;
use std::io;

#[derive(Debug, Serialize)]
struct PlanRow<'a> {
    number: usize,
    id: String,
    name: &'a str,
    steps: String,
    image_name: &'a str,
    created_at: String,
    updated_at: String,
}

impl<'a> PlanRow<'a> {
    fn from_plan(number: usize, plan: &'a WorkPlan) -> Self {
        let steps = plan
            .processes
            .enabled_steps()
            .iter()
            .map(|s| format!("{}:{}", s.id, s.priority))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            number,
            id: plan.id.to_string(),
            name: &plan.name,
            steps,
            image_name: plan.image_name().unwrap_or(""),
            created_at: plan.created_at.to_rfc3339(),
            updated_at: plan.updated_at.to_rfc3339(),
        }
    }
}

/// Writes the plan table as CSV, one row per plan in table order.
pub struct PlanTableWriter<W: io::Write> {
    writer: Writer<W>,
}

impl PlanTableWriter<fs::File> {
    pub fn create(path: &str) -> Result<Self, WorkPlanError> {
        let writer = Writer::from_path(path).map_err(|e| WorkPlanError::CsvError(path.to_string(), e))?;
        Ok(Self { writer })
    }
}

impl<W: io::Write> PlanTableWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self {
            writer: Writer::from_writer(inner),
        }
    }

    pub fn write_plans(&mut self, plans: &[WorkPlan]) -> Result<(), WorkPlanError> {
        for (i, plan) in plans.iter().enumerate() {
            self.writer
                .serialize(PlanRow::from_plan(i + 1, plan))
                .map_err(|e| WorkPlanError::CsvError("<plan table>".to_string(), e))?;
        }
        self.writer
            .flush()
            .map_err(|e| WorkPlanError::FileIO("<plan table>".to_string(), e))?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, WorkPlanError> {
        self.writer
            .into_inner()
            .map_err(|e| {
                let source = io::Error::new(e.error().kind(), e.error().to_string());
                WorkPlanError::FileIO("<plan table>".to_string(), source)
            })
    }
}

/// Pretty JSON of the full plan records, images included.
pub fn plans_to_json(plans: &[WorkPlan]) -> Result<String, WorkPlanError> {
    Ok(serde_json::to_string_pretty(plans)?)
}
