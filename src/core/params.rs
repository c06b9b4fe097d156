use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_DIMENSION: u32 = 2000;
pub const DEFAULT_DOWNLOAD_NAME: &str = "fixed.png";

/// Pipeline parameters suitable for preset files and the GUI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Largest accepted upload in bytes
    pub max_file_size: usize,
    /// Longest side, in pixels, an image is processed at
    pub max_dimension: u32,
    /// Tried in order when nothing was uploaded
    pub default_images: Vec<PathBuf>,
    /// U2-Net ONNX model file
    pub model_path: PathBuf,
    /// Maximum cached results; 0 means unbounded
    pub cache_capacity: usize,
    pub download_name: String,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_dimension: DEFAULT_MAX_DIMENSION,
            default_images: vec![PathBuf::from("./cow.jpg")],
            model_path: PathBuf::from("models/u2net.onnx"),
            cache_capacity: 0,
            download_name: DEFAULT_DOWNLOAD_NAME.to_string(),
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(Error::InvalidArgument {
                arg: "max_file_size",
                value: self.max_file_size.to_string(),
            });
        }
        if self.max_dimension == 0 {
            return Err(Error::InvalidArgument {
                arg: "max_dimension",
                value: self.max_dimension.to_string(),
            });
        }
        if self.download_name.trim().is_empty() {
            return Err(Error::InvalidArgument {
                arg: "download_name",
                value: self.download_name.clone(),
            });
        }
        Ok(())
    }

    /// Preset file body: a comment header followed by pretty JSON.
    pub fn to_preset_string(&self) -> Result<String> {
        let mut content = String::new();
        content.push_str("// ==========================================\n");
        content.push_str("// Cowwy Background Remover Preset\n");
        content.push_str(&format!("// Version: {}\n", env!("CARGO_PKG_VERSION")));
        content.push_str(&format!("// Generated: {}\n", chrono::Utc::now().to_rfc3339()));
        content.push_str("// ==========================================\n\n");
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Preset(e.to_string()))?;
        content.push_str(&json);
        Ok(content)
    }

    pub fn from_preset_str(content: &str) -> Result<Self> {
        // Header lines are comments; the JSON starts at the first '{'
        let json_start = content
            .find('{')
            .ok_or_else(|| Error::Preset("no JSON content found".to_string()))?;
        let params: PipelineParams = serde_json::from_str(&content[json_start..])
            .map_err(|e| Error::Preset(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }
}
