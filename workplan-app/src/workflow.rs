use crate::config::AppConfig;
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;
use workplan_core::{
    export::PlanTableWriter, CommandOutcome, ImageData, ImageSource, PlanStore, WorkPlanError,
    Workbench,
};
use workplan_schemas::file_formats::SessionFile;

/// Reads image files relative to the session script and sniffs their type
/// from the file contents.
pub struct FileImageSource {
    base_dir: PathBuf,
}

impl FileImageSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ImageSource for FileImageSource {
    fn load(&self, path: &str) -> Result<(ImageData, Option<String>), WorkPlanError> {
        let full_path = self.base_dir.join(path);
        let bytes = fs::read(&full_path)
            .map_err(|e| WorkPlanError::FileIO(full_path.display().to_string(), e))?;
        let mime_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");
        let name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok((ImageData::new(mime_type, bytes), name))
    }
}

/// Totals reported at the end of a replay.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplaySummary {
    pub executed: usize,
    pub advisories: usize,
    pub rejected: usize,
}

pub fn load_session(path: &Path) -> Result<SessionFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read session file: {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML from {:?}", path))
}

/// Replays every command of a session against a fresh store. A failing
/// command is reported and the replay moves on, as an operator would.
pub fn replay_session(
    session: &SessionFile,
    config: &AppConfig,
    images: &dyn ImageSource,
) -> (PlanStore, ReplaySummary) {
    println!("\n--- [Session] Replaying {} command(s) ---", session.commands.len());
    if let Some(description) = &session.description {
        println!("{}", description);
    }

    let mut bench = Workbench::new(PlanStore::new().with_image_limit(config.image_limit_bytes));
    let mut summary = ReplaySummary::default();

    for (i, command) in session.commands.iter().enumerate() {
        summary.executed += 1;
        let label = format!("{:>3}. {:?}", i + 1, command);
        match bench.execute(command.clone(), images) {
            Ok(outcome) => println!("{} -> {}", label, describe(&outcome)),
            Err(e) if e.is_advisory() => {
                summary.advisories += 1;
                println!("{} -> ignored: {}", label, e);
            }
            Err(e) => {
                summary.rejected += 1;
                warn!(command = i + 1, error = %e, "command rejected");
                println!("{} -> rejected: {}", label, e);
            }
        }
    }

    if bench.is_editing() {
        println!("Session ended with unsaved edits; they were discarded.");
        bench.cancel();
    }

    (bench.into_store(), summary)
}

fn describe(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Opened { target: None } => "editing new plan".to_string(),
        CommandOutcome::Opened { target: Some(id) } => format!("editing plan {}", id),
        CommandOutcome::Edited(preview) => {
            let mut text = format!("preview '{}'", preview.name);
            if preview.priority_conflict {
                text.push_str(" [priority conflict]");
            }
            if preview.coding_locked {
                text.push_str(" [coding requires assembly]");
            }
            text
        }
        CommandOutcome::Ignored(preview) => format!("no change, preview '{}'", preview.name),
        CommandOutcome::Saved(plan) => format!("saved '{}' ({})", plan.name, plan.id),
        CommandOutcome::Cancelled => "cancelled".to_string(),
        CommandOutcome::Deleted(true) => "deleted".to_string(),
        CommandOutcome::Deleted(false) => "nothing to delete".to_string(),
        CommandOutcome::ImageAttached(true) => "image attached".to_string(),
        CommandOutcome::ImageAttached(false) => "no plan at that row".to_string(),
    }
}

/// Writes the plan table to `explicit`, or to a timestamped file in the
/// configured export directory. Returns the path written, if any.
pub fn export_plans(
    store: &PlanStore,
    explicit: Option<&Path>,
    config: &AppConfig,
) -> Result<Option<PathBuf>> {
    let path = match (explicit, &config.export_dir) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(dir)) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create export directory: {:?}", dir))?;
            dir.join(format!("plans_{}.csv", chrono::Utc::now().format("%Y%m%d_%H%M%S")))
        }
        (None, None) => return Ok(None),
    };

    let path_str = path
        .to_str()
        .with_context(|| format!("Export path is not valid UTF-8: {:?}", path))?;
    let mut table = PlanTableWriter::create(path_str)?;
    table.write_plans(store.list())?;
    Ok(Some(path))
}
