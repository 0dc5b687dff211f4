use crate::foundation::error::{MaterialError, MaterialResult};
use crate::types::FeatureLevel;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Material quality level a quality switch node selects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum QualityLevel {
    Low,
    Medium,
    #[default]
    High,
}

/// Settings of one translation that do not belong to the material itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TranslatorOptions {
    /// Hardware feature level the shader targets.
    pub feature_level: FeatureLevel,
    /// Also emit the compute shader emissive variant (light functions).
    pub compile_for_compute_shader: bool,
    /// The project renders with forward shading, so GBuffer reads are unavailable.
    pub forward_shading: bool,
    /// The project enables DBuffer decals.
    pub dbuffer_decals: bool,
    /// Quality level selected by quality switch nodes.
    pub quality_level: QualityLevel,
}

impl TranslatorOptions {
    /// Parse options from a JSON reader.
    pub fn from_reader(reader: impl Read) -> MaterialResult<Self> {
        serde_json::from_reader(reader)
            .map_err(|e| MaterialError::validation(format!("invalid translator options: {e}")))
    }

    /// Read options from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> MaterialResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            MaterialError::validation(format!("open options '{}': {e}", path.display()))
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

#[cfg(test)]
#[path = "../tests/unit/options.rs"]
mod tests;
