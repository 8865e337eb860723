use crate::command::Command;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    pub schema_version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub commands: Vec<Command>,
}
