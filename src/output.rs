//! Results of a translation.

use crate::translator::ShaderEnvironment;
use crate::uniform::set::UniformExpressionSet;
use serde::{Deserialize, Serialize};

/// What a translation produced besides code: the uniform layout and the usage flags the
/// renderer needs to pick passes and bind resources.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialCompilationOutput {
    /// The scene color must be copied before this material renders.
    pub requires_scene_color_copy: bool,
    /// Scene textures are read through scene texture lookups.
    pub needs_scene_textures: bool,
    #[allow(missing_docs)]
    pub uses_eye_adaptation: bool,
    /// World position offset or pixel depth offset are in use.
    pub modifies_mesh_position: bool,
    #[allow(missing_docs)]
    pub uses_pixel_depth_offset: bool,
    /// A scene texture lookup reads GBuffer data.
    pub needs_gbuffer: bool,
    #[allow(missing_docs)]
    pub uses_scene_depth: bool,
    /// Never set by the node set implemented here.
    pub uses_global_distance_field: bool,
    /// Uniform expressions and the buffer layout built from them.
    pub uniform_expression_set: UniformExpressionSet,
}

/// Final product of translating one material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslatedMaterial {
    /// Material name.
    pub name: String,
    /// Filled shader template.
    pub shader_code: String,
    #[allow(missing_docs)]
    pub environment: ShaderEnvironment,
    #[allow(missing_docs)]
    pub output: MaterialCompilationOutput,
}
