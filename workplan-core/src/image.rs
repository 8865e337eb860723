use crate::error::WorkPlanError;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Uploads larger than this are refused unless the store is configured otherwise.
pub const DEFAULT_IMAGE_LIMIT_BYTES: usize = 5 * 1024 * 1024;

/// Raw bytes of an uploaded file together with the MIME type it was read as.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageData {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Parses a base64 `data:` URI as produced by a browser file reader.
    pub fn from_data_uri(uri: &str) -> Result<Self, WorkPlanError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| WorkPlanError::InvalidDataUri("missing 'data:' scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| WorkPlanError::InvalidDataUri("missing ',' separator".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| WorkPlanError::InvalidDataUri("only base64 payloads are supported".to_string()))?;
        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| WorkPlanError::InvalidDataUri(e.to_string()))?;
        Ok(Self::new(mime_type, bytes))
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Size is checked before type, matching the order operators see the messages in.
    pub fn validate(&self, limit_bytes: usize) -> Result<(), WorkPlanError> {
        if self.len() > limit_bytes {
            return Err(WorkPlanError::ImageTooLarge {
                size: self.len(),
                limit: limit_bytes,
            });
        }
        if !self.is_image() {
            return Err(WorkPlanError::UnsupportedImageType(self.mime_type.clone()));
        }
        Ok(())
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Image attached to a committed work plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanImage {
    pub data_uri: String,
    pub mime_type: String,
    pub size_bytes: usize,
    pub name: Option<String>,
}

impl PlanImage {
    pub fn encode(data: &ImageData, name: Option<String>) -> Self {
        Self {
            data_uri: data.to_data_uri(),
            mime_type: data.mime_type.clone(),
            size_bytes: data.len(),
            name,
        }
    }

    pub fn decode(&self) -> Result<ImageData, WorkPlanError> {
        ImageData::from_data_uri(&self.data_uri)
    }

    /// Caption for the image viewer; falls back to a generic title.
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or("工作计划图片")
    }
}
