use crate::{
    configuration::{ConfigurationPreview, ProcessConfiguration},
    error::WorkPlanError,
    image::ImageData,
    store::{PlanId, PlanStore, WorkPlan},
};
use tracing::{debug, info};
use workplan_schemas::{command::Command, step::ParameterName};

/// Reads image files for `attach_image` commands. The front end owns the
/// filesystem; the workbench only sees the loaded bytes.
pub trait ImageSource {
    fn load(&self, path: &str) -> Result<(ImageData, Option<String>), WorkPlanError>;
}

#[derive(Debug, Clone, PartialEq)]
enum SessionState {
    Idle,
    Editing {
        configuration: ProcessConfiguration,
        target: Option<PlanId>,
    },
}

/// Result of a single command, for the front end to render.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Opened { target: Option<PlanId> },
    Edited(ConfigurationPreview),
    Ignored(ConfigurationPreview),
    Saved(WorkPlan),
    Cancelled,
    Deleted(bool),
    ImageAttached(bool),
}

/// A plan store plus the single configuration being edited, if any.
#[derive(Debug)]
pub struct Workbench {
    store: PlanStore,
    state: SessionState,
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(PlanStore::new())
    }
}

impl Workbench {
    pub fn new(store: PlanStore) -> Self {
        Self {
            store,
            state: SessionState::Idle,
        }
    }

    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PlanStore {
        &mut self.store
    }

    pub fn into_store(self) -> PlanStore {
        self.store
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, SessionState::Editing { .. })
    }

    pub fn editing_target(&self) -> Option<&PlanId> {
        match &self.state {
            SessionState::Editing { target, .. } => target.as_ref(),
            SessionState::Idle => None,
        }
    }

    pub fn open_new(&mut self) -> Result<&mut ProcessConfiguration, WorkPlanError> {
        self.begin(ProcessConfiguration::new(), None)
    }

    /// Starts editing a copy of a stored plan's configuration.
    pub fn open_existing(&mut self, id: &PlanId) -> Result<&mut ProcessConfiguration, WorkPlanError> {
        let mut configuration = ProcessConfiguration::new();
        let plan = self.store.get(id).ok_or(WorkPlanError::PlanNotFound(*id))?;
        configuration.restore(&plan.processes);
        self.begin(configuration, Some(*id))
    }

    fn begin(
        &mut self,
        configuration: ProcessConfiguration,
        target: Option<PlanId>,
    ) -> Result<&mut ProcessConfiguration, WorkPlanError> {
        if self.is_editing() {
            return Err(WorkPlanError::SessionInProgress);
        }
        debug!(plan = ?target, "editing session opened");
        self.state = SessionState::Editing {
            configuration,
            target,
        };
        self.configuration_mut()
    }

    pub fn configuration(&self) -> Result<&ProcessConfiguration, WorkPlanError> {
        match &self.state {
            SessionState::Editing { configuration, .. } => Ok(configuration),
            SessionState::Idle => Err(WorkPlanError::NoActiveSession),
        }
    }

    pub fn configuration_mut(&mut self) -> Result<&mut ProcessConfiguration, WorkPlanError> {
        match &mut self.state {
            SessionState::Editing { configuration, .. } => Ok(configuration),
            SessionState::Idle => Err(WorkPlanError::NoActiveSession),
        }
    }

    /// Commits the live configuration. On a validation error the session stays
    /// open so the configuration can be corrected.
    pub fn save(&mut self) -> Result<WorkPlan, WorkPlanError> {
        let plan = match &self.state {
            SessionState::Editing {
                configuration,
                target,
            } => self.store.save(configuration, target.as_ref())?,
            SessionState::Idle => return Err(WorkPlanError::NoActiveSession),
        };
        self.state = SessionState::Idle;
        Ok(plan)
    }

    /// Discards the live configuration. Returns whether a session was open.
    pub fn cancel(&mut self) -> bool {
        let was_editing = self.is_editing();
        self.state = SessionState::Idle;
        if was_editing {
            debug!("editing session cancelled");
        }
        was_editing
    }

    fn plan_id_at(&self, row: usize) -> Option<PlanId> {
        self.store.at_position(row).map(|p| p.id)
    }

    pub fn execute<S: ImageSource + ?Sized>(
        &mut self,
        command: Command,
        images: &S,
    ) -> Result<CommandOutcome, WorkPlanError> {
        match command {
            Command::OpenNew => {
                self.open_new()?;
                Ok(CommandOutcome::Opened { target: None })
            }
            Command::OpenExisting { plan } => {
                let id = self.plan_id_at(plan).ok_or(WorkPlanError::RowNotFound(plan))?;
                self.open_existing(&id)?;
                Ok(CommandOutcome::Opened { target: Some(id) })
            }
            Command::Toggle { step } => {
                let configuration = self.configuration_mut()?;
                if configuration.toggle(step) {
                    Ok(CommandOutcome::Edited(configuration.preview()))
                } else {
                    Ok(CommandOutcome::Ignored(configuration.preview()))
                }
            }
            Command::SetPriority { step, value } => {
                let configuration = self.configuration_mut()?;
                let priority = value.as_integer().ok_or_else(|| {
                    WorkPlanError::InvalidInput(format!("priority '{}' is not a whole number", value))
                })?;
                configuration.set_priority(step, priority)?;
                Ok(CommandOutcome::Edited(configuration.preview()))
            }
            Command::SetParameter { step, name, value } => {
                let configuration = self.configuration_mut()?;
                let name: ParameterName = name
                    .parse()
                    .map_err(|e| WorkPlanError::InvalidInput(format!("{}", e)))?;
                configuration.set_parameter(step, name, &value.to_string())?;
                Ok(CommandOutcome::Edited(configuration.preview()))
            }
            Command::Reset => {
                let configuration = self.configuration_mut()?;
                configuration.reset();
                Ok(CommandOutcome::Edited(configuration.preview()))
            }
            Command::Save => self.save().map(CommandOutcome::Saved),
            Command::Cancel => {
                self.cancel();
                Ok(CommandOutcome::Cancelled)
            }
            Command::Delete { plan } => {
                let removed = match self.plan_id_at(plan) {
                    Some(id) => self.store.delete(&id),
                    None => false,
                };
                Ok(CommandOutcome::Deleted(removed))
            }
            Command::AttachImage { plan, path } => {
                let (data, name) = images.load(&path)?;
                let attached = match self.plan_id_at(plan) {
                    Some(id) => self.store.attach_image(&id, data, name)?,
                    None => {
                        data.validate(self.store.image_limit_bytes())?;
                        false
                    }
                };
                if attached {
                    info!(row = plan, path = %path, "image attached from file");
                }
                Ok(CommandOutcome::ImageAttached(attached))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use workplan_schemas::{command::RawInput, step::StepId};

    #[derive(Default)]
    struct MemoryImages(HashMap<String, ImageData>);

    impl ImageSource for MemoryImages {
        fn load(&self, path: &str) -> Result<(ImageData, Option<String>), WorkPlanError> {
            self.0
                .get(path)
                .cloned()
                .map(|data| (data, Some(path.to_string())))
                .ok_or_else(|| {
                    WorkPlanError::FileIO(
                        path.to_string(),
                        std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                    )
                })
        }
    }

    fn run(bench: &mut Workbench, commands: Vec<Command>) -> Vec<Result<CommandOutcome, WorkPlanError>> {
        let images = MemoryImages::default();
        commands.into_iter().map(|c| bench.execute(c, &images)).collect()
    }

    #[test]
    fn editing_requires_an_open_session() {
        let mut bench = Workbench::default();
        assert!(matches!(bench.configuration(), Err(WorkPlanError::NoActiveSession)));
        assert!(matches!(bench.save(), Err(WorkPlanError::NoActiveSession)));
        let results = run(&mut bench, vec![Command::Toggle { step: StepId::Drilling }]);
        assert!(matches!(results[0], Err(WorkPlanError::NoActiveSession)));
        assert!(!bench.cancel());
    }

    #[test]
    fn only_one_session_at_a_time() {
        let mut bench = Workbench::default();
        bench.open_new().unwrap();
        assert!(matches!(bench.open_new(), Err(WorkPlanError::SessionInProgress)));
    }

    #[test]
    fn failed_save_keeps_session_open() {
        let mut bench = Workbench::default();
        bench.open_new().unwrap();
        assert!(matches!(bench.save(), Err(WorkPlanError::EmptyPlan)));
        assert!(bench.is_editing());

        bench.configuration_mut().unwrap().toggle(StepId::Weighing);
        let plan = bench.save().unwrap();
        assert_eq!(plan.name, "称重");
        assert!(!bench.is_editing());
        assert_eq!(bench.store().len(), 1);
    }

    #[test]
    fn cancel_discards_edits() {
        let mut bench = Workbench::default();
        bench.open_new().unwrap().toggle(StepId::Drilling);
        let plan = bench.save().unwrap();

        let config = bench.open_existing(&plan.id).unwrap();
        config.toggle(StepId::Weighing);
        assert!(bench.cancel());
        assert_eq!(bench.store().get(&plan.id).unwrap().name, "钻孔");

        let config = bench.open_existing(&plan.id).unwrap();
        assert!(!config.step(StepId::Weighing).enabled);
        assert_eq!(bench.editing_target(), Some(&plan.id));
    }

    #[test]
    fn open_existing_unknown_plan() {
        let mut bench = Workbench::default();
        let id = PlanId::new();
        assert!(matches!(bench.open_existing(&id), Err(WorkPlanError::PlanNotFound(missing)) if missing == id));
        assert!(!bench.is_editing());
    }

    #[test]
    fn scripted_commands_edit_and_update_a_plan() {
        let mut bench = Workbench::default();
        let results = run(
            &mut bench,
            vec![
                Command::OpenNew,
                Command::Toggle { step: StepId::Drilling },
                Command::SetParameter {
                    step: StepId::Drilling,
                    name: "count".into(),
                    value: RawInput::Number(5.0),
                },
                Command::Save,
                Command::OpenExisting { plan: 1 },
                Command::Toggle { step: StepId::Assembly },
                Command::SetPriority { step: StepId::Assembly, value: RawInput::Number(9.0) },
                Command::SetParameter {
                    step: StepId::Assembly,
                    name: "weight".into(),
                    value: RawInput::Text("2".into()),
                },
                Command::Save,
                Command::Delete { plan: 7 },
            ],
        );

        assert!(matches!(results[6], Err(ref e) if e.is_advisory()));
        assert!(matches!(results[7], Err(ref e) if e.is_advisory()));
        let first = match &results[3] {
            Ok(CommandOutcome::Saved(plan)) => plan.clone(),
            other => panic!("expected save, got {:?}", other),
        };
        match &results[8] {
            Ok(CommandOutcome::Saved(plan)) => {
                assert_eq!(plan.id, first.id);
                assert_eq!(plan.name, "钻孔-装配");
                assert_eq!(plan.processes.step(StepId::Drilling).parameters.count(), 5);
            }
            other => panic!("expected save, got {:?}", other),
        }
        assert!(matches!(results[9], Ok(CommandOutcome::Deleted(false))));
        assert_eq!(bench.store().len(), 1);
    }

    #[test]
    fn priority_must_be_a_whole_number() {
        let mut bench = Workbench::default();
        let results = run(
            &mut bench,
            vec![
                Command::OpenNew,
                Command::SetPriority { step: StepId::Coding, value: RawInput::Text("3".into()) },
                Command::SetPriority { step: StepId::Drilling, value: RawInput::Text("2.5".into()) },
                Command::SetPriority { step: StepId::Drilling, value: RawInput::Number(2.5) },
            ],
        );

        assert!(results[1].is_ok());
        for result in &results[2..] {
            let err = result.as_ref().unwrap_err();
            assert!(err.is_advisory(), "{}", err);
            assert!(err.to_string().contains("not a whole number"));
        }
        let configuration = bench.configuration().unwrap();
        assert_eq!(configuration.step(StepId::Coding).priority, 3);
        assert_eq!(configuration.step(StepId::Drilling).priority, 1);
    }

    #[test]
    fn attach_image_through_source() {
        let mut bench = Workbench::default();
        bench.open_new().unwrap().toggle(StepId::Drilling);
        bench.save().unwrap();

        let mut images = MemoryImages::default();
        images.0.insert("part.png".into(), ImageData::new("image/png", vec![1, 2]));
        images.0.insert("notes.txt".into(), ImageData::new("text/plain", vec![1]));

        let outcome = bench
            .execute(Command::AttachImage { plan: 1, path: "part.png".into() }, &images)
            .unwrap();
        assert_eq!(outcome, CommandOutcome::ImageAttached(true));
        assert_eq!(bench.store().at_position(1).unwrap().image_name(), Some("part.png"));

        let err = bench
            .execute(Command::AttachImage { plan: 1, path: "notes.txt".into() }, &images)
            .unwrap_err();
        assert!(matches!(err, WorkPlanError::UnsupportedImageType(_)));

        let outcome = bench
            .execute(Command::AttachImage { plan: 4, path: "part.png".into() }, &images)
            .unwrap();
        assert_eq!(outcome, CommandOutcome::ImageAttached(false));

        assert!(matches!(
            bench.execute(Command::AttachImage { plan: 1, path: "gone.png".into() }, &images),
            Err(WorkPlanError::FileIO(..))
        ));
    }
}
