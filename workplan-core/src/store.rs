use crate::{
    configuration::ProcessConfiguration,
    error::WorkPlanError,
    image::{ImageData, PlanImage, DEFAULT_IMAGE_LIMIT_BYTES},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(Uuid);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A committed work plan. `name` is frozen at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPlan {
    pub id: PlanId,
    pub name: String,
    pub processes: ProcessConfiguration,
    pub image: Option<PlanImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkPlan {
    pub fn image_name(&self) -> Option<&str> {
        self.image.as_ref().and_then(|i| i.name.as_deref())
    }
}

/// Owns every committed work plan, in insertion order.
#[derive(Debug, Clone)]
pub struct PlanStore {
    plans: Vec<WorkPlan>,
    image_limit_bytes: usize,
}

impl Default for PlanStore {
    fn default() -> Self {
        Self {
            plans: Vec::new(),
            image_limit_bytes: DEFAULT_IMAGE_LIMIT_BYTES,
        }
    }
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image_limit(mut self, limit_bytes: usize) -> Self {
        self.image_limit_bytes = limit_bytes;
        self
    }

    pub fn image_limit_bytes(&self) -> usize {
        self.image_limit_bytes
    }

    pub fn list(&self) -> &[WorkPlan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn get(&self, id: &PlanId) -> Option<&WorkPlan> {
        self.plans.iter().find(|p| &p.id == id)
    }

    /// 1-based row number of a plan, as shown in the plan table.
    pub fn position(&self, id: &PlanId) -> Option<usize> {
        self.plans.iter().position(|p| &p.id == id).map(|i| i + 1)
    }

    /// Plan at a 1-based row number.
    pub fn at_position(&self, number: usize) -> Option<&WorkPlan> {
        number.checked_sub(1).and_then(|i| self.plans.get(i))
    }

    /// Validates and commits a snapshot of `configuration`.
    ///
    /// With an `existing_id` that matches a stored plan, that plan is updated
    /// in place and keeps its id, position and image. Otherwise a new plan is
    /// appended.
    pub fn save(
        &mut self,
        configuration: &ProcessConfiguration,
        existing_id: Option<&PlanId>,
    ) -> Result<WorkPlan, WorkPlanError> {
        self.commit(configuration, existing_id, None)
    }

    /// Like [`PlanStore::save`], replacing the image with `image`.
    pub fn save_with_image(
        &mut self,
        configuration: &ProcessConfiguration,
        existing_id: Option<&PlanId>,
        image: ImageData,
        image_name: Option<String>,
    ) -> Result<WorkPlan, WorkPlanError> {
        image.validate(self.image_limit_bytes)?;
        self.commit(configuration, existing_id, Some(PlanImage::encode(&image, image_name)))
    }

    fn commit(
        &mut self,
        configuration: &ProcessConfiguration,
        existing_id: Option<&PlanId>,
        image: Option<PlanImage>,
    ) -> Result<WorkPlan, WorkPlanError> {
        if let Err(e) = configuration.validate() {
            warn!(error = %e, "work plan rejected");
            return Err(e);
        }

        let name = configuration.generate_name();
        let now = Utc::now();

        if let Some(plan) = existing_id.and_then(|id| self.plans.iter_mut().find(|p| &p.id == id)) {
            plan.name = name;
            plan.processes = configuration.snapshot();
            plan.updated_at = now;
            if image.is_some() {
                plan.image = image;
            }
            info!(id = %plan.id, name = %plan.name, "work plan updated");
            return Ok(plan.clone());
        }

        if let Some(id) = existing_id {
            debug!(%id, "editing target no longer exists; saving as a new plan");
        }
        let plan = WorkPlan {
            id: PlanId::new(),
            name,
            processes: configuration.snapshot(),
            image,
            created_at: now,
            updated_at: now,
        };
        info!(id = %plan.id, name = %plan.name, "work plan created");
        self.plans.push(plan.clone());
        Ok(plan)
    }

    /// Removes a plan. Absent ids are ignored. Returns whether a plan was removed.
    pub fn delete(&mut self, id: &PlanId) -> bool {
        let before = self.plans.len();
        self.plans.retain(|p| &p.id != id);
        let removed = self.plans.len() != before;
        if removed {
            info!(%id, "work plan deleted");
        } else {
            debug!(%id, "delete ignored: no such work plan");
        }
        removed
    }

    /// Validates and attaches an image. Returns whether a plan was updated;
    /// an unknown id is not an error.
    pub fn attach_image(
        &mut self,
        id: &PlanId,
        data: ImageData,
        image_name: Option<String>,
    ) -> Result<bool, WorkPlanError> {
        if let Err(e) = data.validate(self.image_limit_bytes) {
            warn!(%id, error = %e, "image rejected");
            return Err(e);
        }
        match self.plans.iter_mut().find(|p| &p.id == id) {
            Some(plan) => {
                plan.image = Some(PlanImage::encode(&data, image_name));
                plan.updated_at = Utc::now();
                info!(%id, bytes = data.len(), "image attached");
                Ok(true)
            }
            None => {
                debug!(%id, "image ignored: no such work plan");
                Ok(false)
            }
        }
    }
}
