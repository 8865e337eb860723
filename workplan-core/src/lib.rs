pub mod configuration;
pub mod error;
pub mod export;
pub mod image;
pub mod session;
pub mod store;

pub use configuration::{ConfigurationPreview, ProcessConfiguration, UNCONFIGURED_NAME};
pub use error::WorkPlanError;
pub use image::{ImageData, PlanImage, DEFAULT_IMAGE_LIMIT_BYTES};
pub use session::{CommandOutcome, ImageSource, Workbench};
pub use store::{PlanId, PlanStore, WorkPlan};
