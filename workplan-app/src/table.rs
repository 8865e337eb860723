use std::fmt::{self, Write};
use workplan_core::{ProcessConfiguration, WorkPlan};
use workplan_schemas::step::{ParameterName, StepParameters};

const EMPTY_TABLE: &str = "暂无工作计划";

pub fn render_plans(plans: &[WorkPlan]) -> Result<String, fmt::Error> {
    if plans.is_empty() {
        return Ok(format!("{}\n", EMPTY_TABLE));
    }

    let mut out = String::new();
    writeln!(out, "{:>4}  {:<24}  {:<20}  {}", "No.", "Name", "Image", "Id")?;
    for (i, plan) in plans.iter().enumerate() {
        let image = match &plan.image {
            Some(image) => format!("{} ({} B)", image.title(), image.size_bytes),
            None => "-".to_string(),
        };
        writeln!(out, "{:>4}  {:<24}  {:<20}  {}", i + 1, plan.name, image, plan.id)?;
        for step in plan.processes.enabled_steps() {
            writeln!(
                out,
                "{:>6}{} [{}] priority {}, {}",
                "",
                step.display_name(),
                step.id,
                step.priority,
                describe_parameters(&step.parameters)
            )?;
        }
    }
    Ok(out)
}

pub fn render_configuration(configuration: &ProcessConfiguration) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let preview = configuration.preview();
    writeln!(out, "Preview: {}", preview.name)?;
    for step in configuration.steps() {
        writeln!(
            out,
            "  {:<9} {} enabled={} priority={} {}",
            step.id.key(),
            step.display_name(),
            step.enabled,
            step.priority,
            describe_parameters(&step.parameters)
        )?;
    }
    if preview.coding_locked {
        writeln!(out, "  (coding requires assembly)")?;
    }
    Ok(out)
}

fn describe_parameters(parameters: &StepParameters) -> String {
    let measure = match parameters {
        StepParameters::Timed { time, .. } => format!("{}={}", ParameterName::Time, time),
        StepParameters::Weighed { weight, .. } => format!("{}={}", ParameterName::Weight, weight),
    };
    format!("{} {}={}", measure, ParameterName::Count, parameters.count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use workplan_core::PlanStore;
    use workplan_schemas::step::StepId;

    #[test]
    fn empty_table_shows_placeholder() {
        assert_eq!(render_plans(&[]).unwrap(), "暂无工作计划\n");
    }

    #[test]
    fn rows_are_numbered_with_step_details() {
        let mut store = PlanStore::new();
        let mut config = ProcessConfiguration::new();
        config.toggle(StepId::Weighing);
        store.save(&config, None).unwrap();

        let text = render_plans(store.list()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_start().starts_with("1  称重"));
        assert!(lines[2].contains("称重 [weighing] priority 3, weight=2 count=1"));
    }

    #[test]
    fn defaults_list_every_step() {
        let text = render_configuration(&ProcessConfiguration::new()).unwrap();
        assert!(text.starts_with("Preview: 未配置工序\n"));
        assert!(text.contains("drilling  钻孔 enabled=false priority=1 time=5 count=3"));
        assert!(text.contains("(coding requires assembly)"));
    }
}
