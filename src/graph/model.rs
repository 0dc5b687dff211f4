use crate::foundation::error::{MaterialError, MaterialResult};
use crate::foundation::ids::NodeIdx;
use crate::foundation::math::LinearColor;
use crate::types::{MaterialProperty, ValueType};
use crate::uniform::expr::{SamplerSource, TextureKind, TextureProperty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn zero() -> f32 {
    0.0
}

fn one() -> f32 {
    1.0
}

fn two() -> f32 {
    2.0
}

fn half() -> f32 {
    0.5
}

fn yes() -> bool {
    true
}

fn if_threshold() -> f32 {
    0.00001
}

fn default_clip_value() -> f32 {
    0.3333
}

fn default_shadow_density() -> f32 {
    0.5
}

fn default_self_shadow_density() -> f32 {
    2.0
}

fn default_self_shadow_second_density() -> f32 {
    10.0
}

fn default_backscattering_exponent() -> f32 {
    30.0
}

fn default_extinction() -> [f32; 3] {
    [1.0, 0.833, 0.588]
}

fn default_preview() -> [f32; 4] {
    [0.0; 4]
}

/// Where a material is used in the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum MaterialDomain {
    #[default]
    Surface,
    DeferredDecal,
    LightFunction,
    PostProcess,
}

impl MaterialDomain {
    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Surface => "MD_Surface",
            Self::DeferredDecal => "MD_DeferredDecal",
            Self::LightFunction => "MD_LightFunction",
            Self::PostProcess => "MD_PostProcess",
        }
    }
}

/// How the material output is composited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum BlendMode {
    #[default]
    Opaque,
    Masked,
    Translucent,
    Additive,
    Modulate,
}

impl BlendMode {
    /// Translucent, additive and modulate blending all read the scene behind the surface.
    pub fn is_translucent(self) -> bool {
        matches!(self, Self::Translucent | Self::Additive | Self::Modulate)
    }
}

/// Lighting model of the material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ShadingModel {
    Unlit,
    #[default]
    DefaultLit,
    Subsurface,
    PreintegratedSkin,
    ClearCoat,
    SubsurfaceProfile,
    TwoSidedFoliage,
}

impl ShadingModel {
    /// Shading models that consume the subsurface color property.
    pub fn uses_subsurface_color(self) -> bool {
        matches!(
            self,
            Self::Subsurface | Self::PreintegratedSkin | Self::SubsurfaceProfile | Self::TwoSidedFoliage
        )
    }
}

/// Blend mode of a deferred decal material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum DecalBlendMode {
    #[default]
    Translucent,
    Stain,
    Normal,
    Emissive,
    DbufferTranslucentColorNormalRoughness,
    DbufferTranslucentColor,
    DbufferTranslucentColorNormal,
    DbufferTranslucentColorRoughness,
    DbufferTranslucentNormal,
    DbufferTranslucentNormalRoughness,
    DbufferTranslucentRoughness,
}

impl DecalBlendMode {
    /// True for the modes that write into the shared decal buffer.
    pub fn is_dbuffer(self) -> bool {
        matches!(
            self,
            Self::DbufferTranslucentColorNormalRoughness
                | Self::DbufferTranslucentColor
                | Self::DbufferTranslucentColorNormal
                | Self::DbufferTranslucentColorRoughness
                | Self::DbufferTranslucentNormal
                | Self::DbufferTranslucentNormalRoughness
                | Self::DbufferTranslucentRoughness
        )
    }
}

/// How a texture sample is post-processed after the lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum SamplerType {
    #[default]
    Color,
    Grayscale,
    Alpha,
    Normal,
    Masks,
    DistanceFieldFont,
    LinearColor,
    LinearGrayscale,
}

impl SamplerType {
    /// Name used in diagnostics.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Color => "Color",
            Self::Grayscale => "Grayscale",
            Self::Alpha => "Alpha",
            Self::Normal => "Normal",
            Self::Masks => "Masks",
            Self::DistanceFieldFont => "Distance Field Font",
            Self::LinearColor => "Linear Color",
            Self::LinearGrayscale => "Linear Grayscale",
        }
    }
}

/// Mip selection of a texture sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum MipValueMode {
    #[default]
    None,
    MipLevel,
    MipBias,
    Derivative,
}

/// Scene texture a lookup reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum SceneTextureId {
    #[default]
    SceneColor,
    SceneDepth,
    DiffuseColor,
    SpecularColor,
    SubsurfaceColor,
    BaseColor,
    Specular,
    Metallic,
    WorldNormal,
    SeparateTranslucency,
    Opacity,
    Roughness,
    MaterialAo,
    CustomDepth,
    PostProcessInput0,
    PostProcessInput1,
    PostProcessInput2,
    PostProcessInput3,
    PostProcessInput4,
    PostProcessInput5,
    PostProcessInput6,
    DecalMask,
    ShadingModel,
    AmbientOcclusion,
    CustomStencil,
}

impl SceneTextureId {
    /// Id passed to the shader-side lookup helpers.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Post process inputs (and scene color) are only bound in post process passes.
    pub fn is_post_process_input(self) -> bool {
        matches!(
            self,
            Self::SceneColor
                | Self::PostProcessInput0
                | Self::PostProcessInput1
                | Self::PostProcessInput2
                | Self::PostProcessInput3
                | Self::PostProcessInput4
                | Self::PostProcessInput5
                | Self::PostProcessInput6
        )
    }

    /// Ids that read the GBuffer.
    pub fn reads_gbuffer(self) -> bool {
        matches!(
            self,
            Self::DiffuseColor
                | Self::SpecularColor
                | Self::SubsurfaceColor
                | Self::BaseColor
                | Self::Specular
                | Self::Metallic
                | Self::WorldNormal
                | Self::Opacity
                | Self::Roughness
                | Self::MaterialAo
                | Self::DecalMask
                | Self::ShadingModel
        )
    }
}

/// Meaning of the UV input of scene depth and scene color nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum SceneInputMode {
    #[default]
    Coordinates,
    OffsetFraction,
}

/// Which bounds a clamp node applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ClampMode {
    #[default]
    Clamp,
    ClampMin,
    ClampMax,
}

/// Which world position a world position node reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum WorldPositionMode {
    #[default]
    Default,
    ExcludeAllShaderOffsets,
    CameraRelative,
    CameraRelativeExcludeOffsets,
}

/// Coordinate space of a transform node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum CoordSpace {
    #[default]
    Tangent,
    Local,
    TranslatedWorld,
    World,
    Camera,
    View,
    MeshParticle,
}

/// Declared type of a material function input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum FunctionInputType {
    Scalar,
    Vector2,
    #[default]
    Vector3,
    Vector4,
    Texture2d,
    TextureCube,
    StaticBool,
    MaterialAttributes,
}

impl FunctionInputType {
    /// Value type the bound input is cast to.
    pub fn value_type(self) -> ValueType {
        match self {
            Self::Scalar => ValueType::FLOAT1,
            Self::Vector2 => ValueType::FLOAT2,
            Self::Vector3 => ValueType::FLOAT3,
            Self::Vector4 => ValueType::FLOAT4,
            Self::Texture2d => ValueType::TEXTURE2D,
            Self::TextureCube => ValueType::TEXTURE_CUBE,
            Self::StaticBool => ValueType::STATIC_BOOL,
            Self::MaterialAttributes => ValueType::MATERIAL_ATTRIBUTES,
        }
    }
}

/// Return type of a custom expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum CustomOutputType {
    #[default]
    Float1,
    Float2,
    Float3,
    Float4,
}

impl CustomOutputType {
    /// Value type of the call result.
    pub fn value_type(self) -> ValueType {
        match self {
            Self::Float1 => ValueType::FLOAT,
            Self::Float2 => ValueType::FLOAT2,
            Self::Float3 => ValueType::FLOAT3,
            Self::Float4 => ValueType::FLOAT4,
        }
    }
}

/// Connection from a node input (or material property) to an output of another node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputRef {
    /// Id of the source node, in the same material or function.
    pub node: String,
    /// Output of the source node.
    #[serde(default)]
    pub output: u32,
    /// Explicit `[r, g, b, a]` mask applied after the output's own mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<[bool; 4]>,
    #[serde(skip)]
    pub(crate) target: Option<NodeIdx>,
}

impl InputRef {
    /// Connection to output 0 of `node`.
    pub fn to(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            output: 0,
            mask: None,
            target: None,
        }
    }
}

/// Value wired into a material property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyInput {
    /// Inline constant; extra components are ignored, missing ones read as zero.
    Constant {
        /// Constant components.
        constant: Vec<f32>,
    },
    /// Expression output.
    Expression(InputRef),
}

/// Texture referenced by the material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDef {
    /// Asset name nodes refer to.
    pub name: String,
    /// 2D or cube.
    pub kind: TextureKind,
    /// Width in texels.
    #[serde(default)]
    pub width: u32,
    /// Height in texels.
    #[serde(default)]
    pub height: u32,
    /// Sampler type the texture was authored for; unchecked when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampler_type: Option<SamplerType>,
    /// Texture is stored in sRGB space.
    #[serde(default)]
    pub srgb: bool,
}

/// Material parameter collection: named scalars and vectors packed into float4 slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterCollectionDef {
    /// Asset name.
    pub name: String,
    /// Scalar parameter names, four per slot.
    #[serde(default)]
    pub scalars: Vec<String>,
    /// Vector parameter names, one slot each after the scalar slots.
    #[serde(default)]
    pub vectors: Vec<String>,
}

impl ParameterCollectionDef {
    /// `(vector index, component)` of a parameter; vectors report no component.
    pub fn parameter_index(&self, name: &str) -> Option<(u32, Option<u32>)> {
        if let Some(i) = self.scalars.iter().position(|s| s == name) {
            return Some(((i / 4) as u32, Some((i % 4) as u32)));
        }
        let scalar_slots = self.scalars.len().div_ceil(4);
        self.vectors
            .iter()
            .position(|v| v == name)
            .map(|i| ((scalar_slots + i) as u32, None))
    }
}

/// Override of a static parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaticParameterValue {
    /// Static switch value.
    Bool(bool),
    /// Static component mask value.
    Mask([bool; 4]),
}

/// Fields shared by every texture sampling node.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureSampleNode {
    /// Parameter name for the parameter variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_name: Option<String>,
    /// Referenced texture by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    /// Texture object input; takes precedence over `texture`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_object: Option<InputRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub coordinates: Option<InputRef>,
    /// Texture coordinate index used when `coordinates` is not connected.
    #[serde(default)]
    pub const_coordinate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub mip_value: Option<InputRef>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub const_mip_value: f32,
    /// DDX of the coordinates for derivative sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates_dx: Option<InputRef>,
    /// DDY of the coordinates for derivative sampling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates_dy: Option<InputRef>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub mip_value_mode: MipValueMode,
    #[serde(default)]
    #[allow(missing_docs)]
    pub sampler_type: SamplerType,
    #[serde(default)]
    #[allow(missing_docs)]
    pub sampler_source: SamplerSource,
}

/// Named input of a custom expression.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomInput {
    /// HLSL parameter name; unnamed inputs are skipped.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub input: Option<InputRef>,
}

/// Node payload, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum NodeKind {
    Constant {
        #[serde(default)]
        value: f32,
    },
    Constant2Vector {
        #[serde(default)]
        value: [f32; 2],
    },
    Constant3Vector {
        #[serde(default)]
        value: [f32; 3],
    },
    Constant4Vector {
        #[serde(default)]
        value: [f32; 4],
    },
    ScalarParameter {
        parameter_name: String,
        #[serde(default)]
        default_value: f32,
    },
    VectorParameter {
        parameter_name: String,
        #[serde(default)]
        default_value: LinearColor,
    },
    StaticBool {
        #[serde(default)]
        value: bool,
    },
    StaticBoolParameter {
        parameter_name: String,
        #[serde(default)]
        default_value: bool,
    },
    StaticSwitch {
        #[serde(default)]
        default_value: bool,
        a: Option<InputRef>,
        b: Option<InputRef>,
        value: Option<InputRef>,
    },
    StaticSwitchParameter {
        parameter_name: String,
        #[serde(default)]
        default_value: bool,
        a: Option<InputRef>,
        b: Option<InputRef>,
    },
    StaticComponentMaskParameter {
        parameter_name: String,
        input: Option<InputRef>,
        #[serde(default)]
        default_mask: [bool; 4],
    },
    Time {
        #[serde(default)]
        ignore_pause: bool,
        #[serde(default)]
        override_period: bool,
        #[serde(default)]
        period: f32,
    },
    Add {
        a: Option<InputRef>,
        b: Option<InputRef>,
        #[serde(default = "zero")]
        const_a: f32,
        #[serde(default = "one")]
        const_b: f32,
    },
    Subtract {
        a: Option<InputRef>,
        b: Option<InputRef>,
        #[serde(default = "one")]
        const_a: f32,
        #[serde(default = "one")]
        const_b: f32,
    },
    Multiply {
        a: Option<InputRef>,
        b: Option<InputRef>,
        #[serde(default = "zero")]
        const_a: f32,
        #[serde(default = "one")]
        const_b: f32,
    },
    Divide {
        a: Option<InputRef>,
        b: Option<InputRef>,
        #[serde(default = "one")]
        const_a: f32,
        #[serde(default = "two")]
        const_b: f32,
    },
    Sine {
        input: Option<InputRef>,
        #[serde(default = "one")]
        period: f32,
    },
    Cosine {
        input: Option<InputRef>,
        #[serde(default = "one")]
        period: f32,
    },
    Floor {
        input: Option<InputRef>,
    },
    Ceil {
        input: Option<InputRef>,
    },
    Frac {
        input: Option<InputRef>,
    },
    Abs {
        input: Option<InputRef>,
    },
    SquareRoot {
        input: Option<InputRef>,
    },
    Saturate {
        input: Option<InputRef>,
    },
    Length {
        input: Option<InputRef>,
    },
    Logarithm2 {
        input: Option<InputRef>,
    },
    Fmod {
        a: Option<InputRef>,
        b: Option<InputRef>,
    },
    Power {
        base: Option<InputRef>,
        exponent: Option<InputRef>,
        #[serde(default = "two")]
        const_exponent: f32,
    },
    DotProduct {
        a: Option<InputRef>,
        b: Option<InputRef>,
    },
    CrossProduct {
        a: Option<InputRef>,
        b: Option<InputRef>,
    },
    LinearInterpolate {
        a: Option<InputRef>,
        b: Option<InputRef>,
        alpha: Option<InputRef>,
        #[serde(default = "zero")]
        const_a: f32,
        #[serde(default = "one")]
        const_b: f32,
        #[serde(default = "half")]
        const_alpha: f32,
    },
    Min {
        a: Option<InputRef>,
        b: Option<InputRef>,
        #[serde(default = "zero")]
        const_a: f32,
        #[serde(default = "one")]
        const_b: f32,
    },
    Max {
        a: Option<InputRef>,
        b: Option<InputRef>,
        #[serde(default = "zero")]
        const_a: f32,
        #[serde(default = "one")]
        const_b: f32,
    },
    Clamp {
        input: Option<InputRef>,
        min: Option<InputRef>,
        max: Option<InputRef>,
        #[serde(default)]
        clamp_mode: ClampMode,
        #[serde(default = "zero")]
        min_default: f32,
        #[serde(default = "one")]
        max_default: f32,
    },
    ComponentMask {
        input: Option<InputRef>,
        #[serde(default)]
        r: bool,
        #[serde(default)]
        g: bool,
        #[serde(default)]
        b: bool,
        #[serde(default)]
        a: bool,
    },
    AppendVector {
        a: Option<InputRef>,
        b: Option<InputRef>,
    },
    If {
        a: Option<InputRef>,
        b: Option<InputRef>,
        a_greater_than_b: Option<InputRef>,
        a_equals_b: Option<InputRef>,
        a_less_than_b: Option<InputRef>,
        #[serde(default = "if_threshold")]
        equals_threshold: f32,
        #[serde(default)]
        const_b: f32,
    },
    Panner {
        coordinate: Option<InputRef>,
        time: Option<InputRef>,
        speed: Option<InputRef>,
        #[serde(default)]
        speed_x: f32,
        #[serde(default)]
        speed_y: f32,
        #[serde(default)]
        const_coordinate: u32,
        #[serde(default)]
        fractional_part: bool,
    },
    TextureCoordinate {
        #[serde(default)]
        coordinate_index: u32,
        #[serde(default = "one")]
        u_tiling: f32,
        #[serde(default = "one")]
        v_tiling: f32,
        #[serde(default)]
        un_mirror_u: bool,
        #[serde(default)]
        un_mirror_v: bool,
    },
    TextureObject {
        texture: Option<String>,
        #[serde(default)]
        sampler_type: SamplerType,
    },
    TextureObjectParameter {
        parameter_name: String,
        texture: Option<String>,
        #[serde(default)]
        sampler_type: SamplerType,
    },
    TextureSample(TextureSampleNode),
    TextureSampleParameter2d(TextureSampleNode),
    TextureSampleParameterCube(TextureSampleNode),
    TextureProperty {
        texture_object: Option<InputRef>,
        #[serde(default = "texture_size")]
        property: TextureProperty,
    },
    PixelDepth,
    SceneDepth {
        input: Option<InputRef>,
        #[serde(default)]
        input_mode: SceneInputMode,
        #[serde(default)]
        const_input: [f32; 2],
    },
    SceneTexture {
        #[serde(default)]
        scene_texture_id: SceneTextureId,
        #[serde(default)]
        filtered: bool,
        coordinates: Option<InputRef>,
        /// Clamp the coordinates to the valid scene texture region.
        #[serde(default)]
        clamp_uvs: bool,
    },
    SceneColor {
        input: Option<InputRef>,
        #[serde(default)]
        input_mode: SceneInputMode,
        #[serde(default)]
        const_input: [f32; 2],
    },
    ScreenPosition,
    ViewSize,
    SceneTexelSize,
    VertexColor,
    ParticleColor,
    ParticlePositionWs,
    ParticleRadius,
    ParticleRelativeTime,
    ParticleMotionBlurFade,
    ParticleDirection,
    ParticleSpeed,
    ParticleSize,
    DynamicParameter,
    ParticleMacroUv,
    ParticleSubUv {
        texture: Option<String>,
        #[serde(default)]
        sampler_type: SamplerType,
        #[serde(default = "yes")]
        blend: bool,
    },
    SphericalParticleOpacity {
        density: Option<InputRef>,
        #[serde(default = "one")]
        constant_density: f32,
    },
    WorldPosition {
        #[serde(default)]
        shader_offset: WorldPositionMode,
    },
    ObjectPositionWs,
    ObjectRadius,
    ObjectBounds,
    ActorPositionWs,
    CameraVectorWs,
    CameraPositionWs,
    ReflectionVectorWs,
    LightVector,
    VertexNormalWs,
    PixelNormalWs,
    Ddx {
        value: Option<InputRef>,
    },
    Ddy {
        value: Option<InputRef>,
    },
    TwoSidedSign,
    PerInstanceRandom,
    EyeAdaptation,
    LightmapUvs,
    AtmosphericFogColor {
        world_position: Option<InputRef>,
    },
    BlackBody {
        temp: Option<InputRef>,
    },
    CollectionParameter {
        collection: Option<String>,
        parameter_name: String,
    },
    Transform {
        input: Option<InputRef>,
        #[serde(default)]
        source: CoordSpace,
        #[serde(default = "world_space")]
        destination: CoordSpace,
    },
    TransformPosition {
        input: Option<InputRef>,
        #[serde(default = "local_space")]
        source: CoordSpace,
        #[serde(default = "world_space")]
        destination: CoordSpace,
    },
    Custom {
        #[serde(default)]
        code: String,
        #[serde(default)]
        output_type: CustomOutputType,
        #[serde(default = "custom_description")]
        description: String,
        #[serde(default)]
        inputs: Vec<CustomInput>,
    },
    CustomOutput {
        function_name: String,
        #[serde(default)]
        inputs: Vec<Option<InputRef>>,
    },
    ClearCoatNormalCustomOutput {
        input: Option<InputRef>,
    },
    MakeMaterialAttributes {
        #[serde(default)]
        inputs: BTreeMap<MaterialProperty, InputRef>,
    },
    FeatureLevelSwitch {
        default: Option<InputRef>,
        #[serde(default)]
        es2: Option<InputRef>,
        #[serde(default)]
        es3_1: Option<InputRef>,
        #[serde(default)]
        sm4: Option<InputRef>,
        #[serde(default)]
        sm5: Option<InputRef>,
    },
    QualitySwitch {
        default: Option<InputRef>,
        #[serde(default)]
        low: Option<InputRef>,
        #[serde(default)]
        medium: Option<InputRef>,
        #[serde(default)]
        high: Option<InputRef>,
    },
    FunctionInput {
        input_name: String,
        #[serde(default)]
        input_type: FunctionInputType,
        preview: Option<InputRef>,
        #[serde(default)]
        use_preview_value_as_default: bool,
        #[serde(default = "default_preview")]
        preview_value: [f32; 4],
        #[serde(default)]
        sort_priority: i32,
    },
    FunctionOutput {
        output_name: String,
        a: Option<InputRef>,
        #[serde(default)]
        sort_priority: i32,
    },
    MaterialFunctionCall {
        function: Option<String>,
        #[serde(default)]
        inputs: BTreeMap<String, InputRef>,
    },
}

fn texture_size() -> TextureProperty {
    TextureProperty::TextureSize
}

fn world_space() -> CoordSpace {
    CoordSpace::World
}

fn local_space() -> CoordSpace {
    CoordSpace::Local
}

fn custom_description() -> String {
    "Custom".to_string()
}

// Output masks as (r, g, b, a).
const RGB: [bool; 4] = [true, true, true, false];
const R: [bool; 4] = [true, false, false, false];
const G: [bool; 4] = [false, true, false, false];
const B: [bool; 4] = [false, false, true, false];
const A: [bool; 4] = [false, false, false, true];

impl NodeKind {
    /// Class name used when attributing compile errors, e.g. `Multiply`.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Constant { .. } => "Constant",
            Self::Constant2Vector { .. } => "Constant2Vector",
            Self::Constant3Vector { .. } => "Constant3Vector",
            Self::Constant4Vector { .. } => "Constant4Vector",
            Self::ScalarParameter { .. } => "ScalarParameter",
            Self::VectorParameter { .. } => "VectorParameter",
            Self::StaticBool { .. } => "StaticBool",
            Self::StaticBoolParameter { .. } => "StaticBoolParameter",
            Self::StaticSwitch { .. } => "StaticSwitch",
            Self::StaticSwitchParameter { .. } => "StaticSwitchParameter",
            Self::StaticComponentMaskParameter { .. } => "StaticComponentMaskParameter",
            Self::Time { .. } => "Time",
            Self::Add { .. } => "Add",
            Self::Subtract { .. } => "Subtract",
            Self::Multiply { .. } => "Multiply",
            Self::Divide { .. } => "Divide",
            Self::Sine { .. } => "Sine",
            Self::Cosine { .. } => "Cosine",
            Self::Floor { .. } => "Floor",
            Self::Ceil { .. } => "Ceil",
            Self::Frac { .. } => "Frac",
            Self::Abs { .. } => "Abs",
            Self::SquareRoot { .. } => "SquareRoot",
            Self::Saturate { .. } => "Saturate",
            Self::Length { .. } => "Length",
            Self::Logarithm2 { .. } => "Logarithm2",
            Self::Fmod { .. } => "Fmod",
            Self::Power { .. } => "Power",
            Self::DotProduct { .. } => "DotProduct",
            Self::CrossProduct { .. } => "CrossProduct",
            Self::LinearInterpolate { .. } => "LinearInterpolate",
            Self::Min { .. } => "Min",
            Self::Max { .. } => "Max",
            Self::Clamp { .. } => "Clamp",
            Self::ComponentMask { .. } => "ComponentMask",
            Self::AppendVector { .. } => "AppendVector",
            Self::If { .. } => "If",
            Self::Panner { .. } => "Panner",
            Self::TextureCoordinate { .. } => "TextureCoordinate",
            Self::TextureObject { .. } => "TextureObject",
            Self::TextureObjectParameter { .. } => "TextureObjectParameter",
            Self::TextureSample(_) => "TextureSample",
            Self::TextureSampleParameter2d(_) => "TextureSampleParameter2D",
            Self::TextureSampleParameterCube(_) => "TextureSampleParameterCube",
            Self::TextureProperty { .. } => "TextureProperty",
            Self::PixelDepth => "PixelDepth",
            Self::SceneDepth { .. } => "SceneDepth",
            Self::SceneTexture { .. } => "SceneTexture",
            Self::SceneColor { .. } => "SceneColor",
            Self::ScreenPosition => "ScreenPosition",
            Self::ViewSize => "ViewSize",
            Self::SceneTexelSize => "SceneTexelSize",
            Self::VertexColor => "VertexColor",
            Self::ParticleColor => "ParticleColor",
            Self::ParticlePositionWs => "ParticlePositionWS",
            Self::ParticleRadius => "ParticleRadius",
            Self::ParticleRelativeTime => "ParticleRelativeTime",
            Self::ParticleMotionBlurFade => "ParticleMotionBlurFade",
            Self::ParticleDirection => "ParticleDirection",
            Self::ParticleSpeed => "ParticleSpeed",
            Self::ParticleSize => "ParticleSize",
            Self::DynamicParameter => "DynamicParameter",
            Self::ParticleMacroUv => "ParticleMacroUV",
            Self::ParticleSubUv { .. } => "ParticleSubUV",
            Self::SphericalParticleOpacity { .. } => "SphericalParticleOpacity",
            Self::WorldPosition { .. } => "WorldPosition",
            Self::ObjectPositionWs => "ObjectPositionWS",
            Self::ObjectRadius => "ObjectRadius",
            Self::ObjectBounds => "ObjectBounds",
            Self::ActorPositionWs => "ActorPositionWS",
            Self::CameraVectorWs => "CameraVectorWS",
            Self::CameraPositionWs => "CameraPositionWS",
            Self::ReflectionVectorWs => "ReflectionVectorWS",
            Self::LightVector => "LightVector",
            Self::VertexNormalWs => "VertexNormalWS",
            Self::PixelNormalWs => "PixelNormalWS",
            Self::Ddx { .. } => "DDX",
            Self::Ddy { .. } => "DDY",
            Self::TwoSidedSign => "TwoSidedSign",
            Self::PerInstanceRandom => "PerInstanceRandom",
            Self::EyeAdaptation => "EyeAdaptation",
            Self::LightmapUvs => "LightmapUVs",
            Self::AtmosphericFogColor { .. } => "AtmosphericFogColor",
            Self::BlackBody { .. } => "BlackBody",
            Self::CollectionParameter { .. } => "CollectionParameter",
            Self::Transform { .. } => "Transform",
            Self::TransformPosition { .. } => "TransformPosition",
            Self::Custom { .. } => "Custom",
            Self::CustomOutput { .. } => "CustomOutput",
            Self::ClearCoatNormalCustomOutput { .. } => "ClearCoatNormalCustomOutput",
            Self::MakeMaterialAttributes { .. } => "MakeMaterialAttributes",
            Self::FeatureLevelSwitch { .. } => "FeatureLevelSwitch",
            Self::QualitySwitch { .. } => "QualitySwitch",
            Self::FunctionInput { .. } => "FunctionInput",
            Self::FunctionOutput { .. } => "FunctionOutput",
            Self::MaterialFunctionCall { .. } => "MaterialFunctionCall",
        }
    }

    /// Component mask of an output; `None` passes the value through.
    pub fn output_mask(&self, output: u32) -> Option<[bool; 4]> {
        match self {
            Self::VectorParameter { .. } | Self::VertexColor | Self::ParticleColor => {
                [Some(RGB), Some(R), Some(G), Some(B), Some(A)]
                    .get(output as usize)
                    .copied()
                    .flatten()
            }
            Self::TextureSample(_)
            | Self::TextureSampleParameter2d(_)
            | Self::TextureSampleParameterCube(_)
            | Self::ParticleSubUv { .. } => [Some(RGB), Some(R), Some(G), Some(B), Some(A), None]
                .get(output as usize)
                .copied()
                .flatten(),
            Self::DynamicParameter => [Some(R), Some(G), Some(B), Some(A), Some(RGB)]
                .get(output as usize)
                .copied()
                .flatten(),
            Self::Constant2Vector { .. } => [None, Some(R), Some(G)]
                .get(output as usize)
                .copied()
                .flatten(),
            Self::Constant3Vector { .. } => [None, Some(R), Some(G), Some(B)]
                .get(output as usize)
                .copied()
                .flatten(),
            Self::Constant4Vector { .. } => [None, Some(R), Some(G), Some(B), Some(A)]
                .get(output as usize)
                .copied()
                .flatten(),
            _ => None,
        }
    }

    pub(crate) fn inputs_mut(&mut self) -> Vec<&mut InputRef> {
        let mut out: Vec<&mut InputRef> = Vec::new();
        macro_rules! push {
            ($($e:expr),*) => {{ $( if let Some(i) = $e.as_mut() { out.push(i); } )* }};
        }
        match self {
            Self::StaticSwitch { a, b, value, .. } => push!(a, b, value),
            Self::StaticSwitchParameter { a, b, .. } => push!(a, b),
            Self::StaticComponentMaskParameter { input, .. }
            | Self::Sine { input, .. }
            | Self::Cosine { input, .. }
            | Self::Floor { input }
            | Self::Ceil { input }
            | Self::Frac { input }
            | Self::Abs { input }
            | Self::SquareRoot { input }
            | Self::Saturate { input }
            | Self::Length { input }
            | Self::Logarithm2 { input }
            | Self::ComponentMask { input, .. }
            | Self::Transform { input, .. }
            | Self::TransformPosition { input, .. }
            | Self::ClearCoatNormalCustomOutput { input } => push!(input),
            Self::Add { a, b, .. }
            | Self::Subtract { a, b, .. }
            | Self::Multiply { a, b, .. }
            | Self::Divide { a, b, .. }
            | Self::Fmod { a, b }
            | Self::DotProduct { a, b }
            | Self::CrossProduct { a, b }
            | Self::Min { a, b, .. }
            | Self::Max { a, b, .. }
            | Self::AppendVector { a, b } => push!(a, b),
            Self::Power { base, exponent, .. } => push!(base, exponent),
            Self::LinearInterpolate { a, b, alpha, .. } => push!(a, b, alpha),
            Self::Clamp { input, min, max, .. } => push!(input, min, max),
            Self::If {
                a,
                b,
                a_greater_than_b,
                a_equals_b,
                a_less_than_b,
                ..
            } => push!(a, b, a_greater_than_b, a_equals_b, a_less_than_b),
            Self::Panner {
                coordinate,
                time,
                speed,
                ..
            } => push!(coordinate, time, speed),
            Self::TextureSample(s)
            | Self::TextureSampleParameter2d(s)
            | Self::TextureSampleParameterCube(s) => push!(
                s.texture_object,
                s.coordinates,
                s.mip_value,
                s.coordinates_dx,
                s.coordinates_dy
            ),
            Self::TextureProperty { texture_object, .. } => push!(texture_object),
            Self::SceneDepth { input, .. } | Self::SceneColor { input, .. } => push!(input),
            Self::SceneTexture { coordinates, .. } => push!(coordinates),
            Self::SphericalParticleOpacity { density, .. } => push!(density),
            Self::Ddx { value } | Self::Ddy { value } => push!(value),
            Self::AtmosphericFogColor { world_position } => push!(world_position),
            Self::BlackBody { temp } => push!(temp),
            Self::Custom { inputs, .. } => {
                for ci in inputs.iter_mut() {
                    push!(ci.input);
                }
            }
            Self::CustomOutput { inputs, .. } => {
                for i in inputs.iter_mut() {
                    push!(i);
                }
            }
            Self::MakeMaterialAttributes { inputs } => out.extend(inputs.values_mut()),
            Self::FeatureLevelSwitch {
                default,
                es2,
                es3_1,
                sm4,
                sm5,
            } => push!(default, es2, es3_1, sm4, sm5),
            Self::QualitySwitch {
                default,
                low,
                medium,
                high,
            } => push!(default, low, medium, high),
            Self::FunctionInput { preview, .. } => push!(preview),
            Self::FunctionOutput { a, .. } => push!(a),
            Self::MaterialFunctionCall { inputs, .. } => out.extend(inputs.values_mut()),
            _ => {}
        }
        out
    }

    /// Referenced texture names.
    pub fn texture_names(&self) -> Vec<&str> {
        match self {
            Self::TextureObject { texture, .. }
            | Self::TextureObjectParameter { texture, .. }
            | Self::ParticleSubUv { texture, .. } => texture.iter().map(String::as_str).collect(),
            Self::TextureSample(s)
            | Self::TextureSampleParameter2d(s)
            | Self::TextureSampleParameterCube(s) => s.texture.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// One node of a material or material function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionDef {
    /// Id, unique within its material or function.
    pub id: String,
    /// Optional user description; custom expressions use their own.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    /// Node payload.
    #[serde(flatten)]
    pub node: NodeKind,
}

/// Reusable node graph called through `material_function_call` nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Name used by calls and in error prefixes.
    pub name: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub description: String,
    /// Nodes, including its `function_input`/`function_output` nodes.
    #[serde(default)]
    pub expressions: Vec<ExpressionDef>,
}

/// A material as authored: settings, properties and the expression graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    #[allow(missing_docs)]
    pub name: String,
    #[serde(default)]
    #[allow(missing_docs)]
    pub domain: MaterialDomain,
    #[serde(default)]
    #[allow(missing_docs)]
    pub blend_mode: BlendMode,
    #[serde(default)]
    #[allow(missing_docs)]
    pub shading_model: ShadingModel,
    #[serde(default)]
    #[allow(missing_docs)]
    pub decal_blend_mode: DecalBlendMode,

    #[serde(default = "default_clip_value")]
    #[allow(missing_docs)]
    pub opacity_mask_clip_value: f32,
    #[serde(default = "one")]
    #[allow(missing_docs)]
    pub translucency_directional_lighting_intensity: f32,
    #[serde(default = "default_shadow_density")]
    #[allow(missing_docs)]
    pub translucent_shadow_density_scale: f32,
    #[serde(default = "default_self_shadow_density")]
    #[allow(missing_docs)]
    pub translucent_self_shadow_density_scale: f32,
    #[serde(default = "default_self_shadow_second_density")]
    #[allow(missing_docs)]
    pub translucent_self_shadow_second_density_scale: f32,
    #[serde(default)]
    #[allow(missing_docs)]
    pub translucent_self_shadow_second_opacity: f32,
    #[serde(default = "default_backscattering_exponent")]
    #[allow(missing_docs)]
    pub translucent_backscattering_exponent: f32,
    #[serde(default = "default_extinction")]
    #[allow(missing_docs)]
    pub translucent_multiple_scattering_extinction: [f32; 3],
    #[serde(default)]
    #[allow(missing_docs)]
    pub max_displacement: f32,
    #[serde(default)]
    #[allow(missing_docs)]
    pub refraction_depth_bias: f32,

    #[serde(default)]
    #[allow(missing_docs)]
    pub separate_translucency: bool,
    #[serde(default = "yes")]
    #[allow(missing_docs)]
    pub use_translucency_vertex_fog: bool,
    #[serde(default)]
    #[allow(missing_docs)]
    pub generate_spherical_particle_normals: bool,
    /// Properties are read from the single `material_attributes` input.
    #[serde(default)]
    pub use_material_attributes: bool,

    /// Textures in referenced-texture order.
    #[serde(default)]
    pub textures: Vec<TextureDef>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub parameter_collections: Vec<ParameterCollectionDef>,
    /// Static switch / mask overrides by parameter name.
    #[serde(default)]
    pub static_parameters: BTreeMap<String, StaticParameterValue>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub expressions: Vec<ExpressionDef>,
    /// Property connections.
    #[serde(default)]
    pub inputs: BTreeMap<MaterialProperty, PropertyInput>,
    #[serde(default)]
    #[allow(missing_docs)]
    pub functions: Vec<FunctionDef>,
}

impl MaterialDef {
    /// Parse a material from JSON text.
    pub fn from_json(text: &str) -> MaterialResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| MaterialError::validation(format!("invalid material json: {e}")))
    }

    /// Read and parse a material file.
    pub fn from_path(path: impl AsRef<Path>) -> MaterialResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MaterialError::validation(format!("read material '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> MaterialResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MaterialError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/model.rs"]
mod tests;
