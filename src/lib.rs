#![forbid(unsafe_code)]
#![warn(missing_docs)]
//! Material node-graph to HLSL translation.
//!
//! A [`MaterialDef`] is normalized into a [`MaterialGraph`], translated by an
//! [`HlslTranslator`] into per-property HLSL and a [`UniformExpressionSet`], and spliced into a
//! [`MaterialTemplate`]. Uniform expressions stay evaluable on the CPU so the uniform buffer can
//! be rebuilt every frame without recompiling the shader.

pub mod batch;
pub(crate) mod chunk;
pub mod fingerprint;
pub(crate) mod foundation;
pub mod graph;
pub mod options;
pub mod output;
pub mod template;
pub mod translator;
pub mod types;
pub(crate) mod uniform;

pub use batch::{BatchOutcome, translate_many};
pub use fingerprint::{CacheKey, material_key};
pub use foundation::error::{MaterialError, MaterialResult};
pub use foundation::ids::UniformExprId;
pub use foundation::math::LinearColor;
pub use graph::model::MaterialDef;
pub use graph::normalize::MaterialGraph;
pub use options::{QualityLevel, TranslatorOptions};
pub use output::{MaterialCompilationOutput, TranslatedMaterial};
pub use template::MaterialTemplate;
pub use translator::{
    HlslTranslator, ShaderDefine, ShaderEnvironment, UniformBufferDeclaration, translate,
};
pub use types::{FeatureLevel, MaterialProperty, ShaderFrequency, ValueType};
pub use uniform::eval::{
    MaterialInstance, NoParameters, ParameterSource, RenderContext, TextureResource,
};
pub use uniform::expr::{
    FoldedMathOp, SamplerSource, TextureKind, TextureProperty, UniformArena, UniformExpr,
};
pub use uniform::overrides::{
    GameThreadOverrides, OverrideCommand, RenderThreadOverrides, override_channel,
};
pub use uniform::set::{
    BoundResource, MemberKind, PerFrameValues, ResourceBinding, SamplerBinding,
    UniformBuffer, UniformBufferMember, UniformBufferStruct, UniformExpressionSet,
};
