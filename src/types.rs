//! Value-type lattice and the small enums every layer of the translator shares.

use serde::{Deserialize, Serialize};

/// Bitmask over the value kinds a code chunk can carry.
///
/// `FLOAT` is the union of the four sized float types: a generic scalar that broadcasts to
/// any arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueType(u32);

impl ValueType {
    /// One-component float.
    pub const FLOAT1: Self = Self(1);
    /// Two-component float.
    pub const FLOAT2: Self = Self(2);
    /// Three-component float.
    pub const FLOAT3: Self = Self(4);
    /// Four-component float.
    pub const FLOAT4: Self = Self(8);
    /// Generic float of any arity.
    pub const FLOAT: Self = Self(15);
    /// 2D texture object.
    pub const TEXTURE2D: Self = Self(16);
    /// Cube texture object.
    pub const TEXTURE_CUBE: Self = Self(32);
    /// Any texture object.
    pub const TEXTURE: Self = Self(48);
    /// Compile-time boolean.
    pub const STATIC_BOOL: Self = Self(64);
    /// Unresolved.
    pub const UNKNOWN: Self = Self(128);
    /// Material attributes bundle.
    pub const MATERIAL_ATTRIBUTES: Self = Self(256);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// True when the two masks share any bit.
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True for every sized or generic float type.
    pub fn is_float(self) -> bool {
        self.intersects(Self::FLOAT)
    }

    /// Component count of a float type; 0 for everything else.
    pub fn num_components(self) -> u32 {
        match self {
            Self::FLOAT | Self::FLOAT1 => 1,
            Self::FLOAT2 => 2,
            Self::FLOAT3 => 3,
            Self::FLOAT4 => 4,
            _ => 0,
        }
    }

    /// Float type for a component count; `UNKNOWN` outside 1..=4.
    pub fn vector_type(num_components: u32) -> Self {
        match num_components {
            1 => Self::FLOAT,
            2 => Self::FLOAT2,
            3 => Self::FLOAT3,
            4 => Self::FLOAT4,
            _ => Self::UNKNOWN,
        }
    }

    /// Human-readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Self::FLOAT1 | Self::FLOAT => "float",
            Self::FLOAT2 => "float2",
            Self::FLOAT3 => "float3",
            Self::FLOAT4 => "float4",
            Self::TEXTURE2D => "texture2D",
            Self::TEXTURE_CUBE => "textureCube",
            Self::STATIC_BOOL => "static bool",
            Self::MATERIAL_ATTRIBUTES => "MaterialAttributes",
            _ => "unknown",
        }
    }

    /// Type name emitted into shader code.
    pub fn hlsl_type(self) -> &'static str {
        match self {
            Self::FLOAT1 | Self::FLOAT => "MaterialFloat",
            Self::FLOAT2 => "MaterialFloat2",
            Self::FLOAT3 => "MaterialFloat3",
            Self::FLOAT4 => "MaterialFloat4",
            Self::TEXTURE2D => "texture2D",
            Self::TEXTURE_CUBE => "textureCube",
            Self::STATIC_BOOL => "static bool",
            Self::MATERIAL_ATTRIBUTES => "MaterialAttributes",
            _ => "unknown",
        }
    }
}

/// Result type of a binary arithmetic op, or the diagnostic that explains why there is none.
pub fn arithmetic_result_type(a: ValueType, b: ValueType) -> Result<ValueType, String> {
    if !a.is_float() || !b.is_float() {
        return Err(format!(
            "Attempting to perform arithmetic on non-numeric types: {} {}",
            a.describe(),
            b.describe()
        ));
    }

    if a == b {
        Ok(a)
    } else if a.intersects(b) {
        if a == ValueType::FLOAT {
            Ok(b)
        } else {
            Ok(a)
        }
    } else {
        Err(format!(
            "Arithmetic between types {} and {} are undefined",
            a.describe(),
            b.describe()
        ))
    }
}

/// Component index addressed by a swizzle letter (`xyzw` or `rgba`, any case).
pub fn swizzle_component(letter: char) -> Option<usize> {
    match letter.to_ascii_lowercase() {
        'x' | 'r' => Some(0),
        'y' | 'g' => Some(1),
        'z' | 'b' => Some(2),
        'w' | 'a' => Some(3),
        _ => None,
    }
}

/// Mask that narrows any wider float to `num_components`.
pub(crate) fn narrowing_mask(num_components: u32) -> &'static str {
    match num_components {
        1 => ".r",
        2 => ".rg",
        3 => ".rgb",
        _ => "",
    }
}

/// Shader stage a chunk is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderFrequency {
    /// Vertex shader.
    Vertex,
    /// Hull shader.
    Hull,
    /// Domain shader.
    Domain,
    /// Pixel shader.
    Pixel,
    /// Compute shader.
    Compute,
}

impl ShaderFrequency {
    /// Number of stages.
    pub const COUNT: usize = 5;

    /// Dense index of the stage.
    pub fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn parameters_kind(self) -> &'static str {
        if self == Self::Vertex { "Vertex" } else { "Pixel" }
    }
}

/// Hardware feature level the material is compiled for.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum FeatureLevel {
    /// Mobile, OpenGL ES 2.
    #[serde(rename = "es2")]
    Es2,
    /// Mobile, OpenGL ES 3.1 / Metal.
    #[serde(rename = "es3_1")]
    Es31,
    /// Shader model 4.
    #[serde(rename = "sm4")]
    Sm4,
    /// Shader model 5.
    #[default]
    #[serde(rename = "sm5")]
    Sm5,
}

impl FeatureLevel {
    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Es2 => "ES2",
            Self::Es31 => "ES3_1",
            Self::Sm4 => "SM4",
            Self::Sm5 => "SM5",
        }
    }
}

/// Semantic output a material resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum MaterialProperty {
    EmissiveColor,
    Opacity,
    OpacityMask,
    DiffuseColor,
    SpecularColor,
    BaseColor,
    Metallic,
    Specular,
    Roughness,
    Normal,
    WorldPositionOffset,
    WorldDisplacement,
    TessellationMultiplier,
    SubsurfaceColor,
    CustomData0,
    CustomData1,
    AmbientOcclusion,
    Refraction,
    CustomizedUvs0,
    CustomizedUvs1,
    CustomizedUvs2,
    CustomizedUvs3,
    CustomizedUvs4,
    CustomizedUvs5,
    CustomizedUvs6,
    CustomizedUvs7,
    PixelDepthOffset,
    MaterialAttributes,
}

impl MaterialProperty {
    /// Number of properties.
    pub const COUNT: usize = 28;

    /// Every property in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::EmissiveColor,
        Self::Opacity,
        Self::OpacityMask,
        Self::DiffuseColor,
        Self::SpecularColor,
        Self::BaseColor,
        Self::Metallic,
        Self::Specular,
        Self::Roughness,
        Self::Normal,
        Self::WorldPositionOffset,
        Self::WorldDisplacement,
        Self::TessellationMultiplier,
        Self::SubsurfaceColor,
        Self::CustomData0,
        Self::CustomData1,
        Self::AmbientOcclusion,
        Self::Refraction,
        Self::CustomizedUvs0,
        Self::CustomizedUvs1,
        Self::CustomizedUvs2,
        Self::CustomizedUvs3,
        Self::CustomizedUvs4,
        Self::CustomizedUvs5,
        Self::CustomizedUvs6,
        Self::CustomizedUvs7,
        Self::PixelDepthOffset,
        Self::MaterialAttributes,
    ];

    /// Dense index of the property.
    pub fn index(self) -> usize {
        self as usize
    }

    /// `CustomizedUVs<i>` for `i` in 0..8.
    pub fn customized_uv(i: u32) -> Option<Self> {
        let base = Self::CustomizedUvs0.index();
        (i < 8).then(|| Self::ALL[base + i as usize])
    }

    /// Texture coordinate index of a customized-UV property.
    pub fn customized_uv_index(self) -> Option<u32> {
        let i = self.index();
        let base = Self::CustomizedUvs0.index();
        (base..base + 8).contains(&i).then(|| (i - base) as u32)
    }

    /// Display name used in diagnostics.
    pub fn name(self) -> String {
        if let Some(i) = self.customized_uv_index() {
            return format!("CustomizedUVs{i}");
        }
        match self {
            Self::EmissiveColor => "EmissiveColor",
            Self::Opacity => "Opacity",
            Self::OpacityMask => "OpacityMask",
            Self::DiffuseColor => "DiffuseColor",
            Self::SpecularColor => "SpecularColor",
            Self::BaseColor => "BaseColor",
            Self::Metallic => "Metallic",
            Self::Specular => "Specular",
            Self::Roughness => "Roughness",
            Self::Normal => "Normal",
            Self::WorldPositionOffset => "WorldPositionOffset",
            Self::WorldDisplacement => "WorldDisplacement",
            Self::TessellationMultiplier => "TessellationMultiplier",
            Self::SubsurfaceColor => "SubsurfaceColor",
            Self::CustomData0 => "CustomData0",
            Self::CustomData1 => "CustomData1",
            Self::AmbientOcclusion => "AmbientOcclusion",
            Self::Refraction => "Refraction",
            Self::PixelDepthOffset => "PixelDepthOffset",
            _ => "",
        }
        .to_string()
    }

    /// Value type the property's result is cast to.
    pub fn value_type(self) -> ValueType {
        if self.customized_uv_index().is_some() {
            return ValueType::FLOAT2;
        }
        match self {
            Self::EmissiveColor
            | Self::DiffuseColor
            | Self::SpecularColor
            | Self::BaseColor
            | Self::Normal
            | Self::WorldPositionOffset
            | Self::WorldDisplacement
            | Self::SubsurfaceColor => ValueType::FLOAT3,
            Self::Opacity
            | Self::OpacityMask
            | Self::Metallic
            | Self::Specular
            | Self::Roughness
            | Self::TessellationMultiplier
            | Self::CustomData0
            | Self::CustomData1
            | Self::AmbientOcclusion
            | Self::PixelDepthOffset => ValueType::FLOAT,
            Self::Refraction => ValueType::FLOAT2,
            Self::MaterialAttributes => ValueType::MATERIAL_ATTRIBUTES,
            _ => ValueType::UNKNOWN,
        }
    }

    /// Stage the property is evaluated in.
    pub fn frequency(self) -> ShaderFrequency {
        if self == Self::WorldPositionOffset || self.customized_uv_index().is_some() {
            ShaderFrequency::Vertex
        } else if self == Self::WorldDisplacement {
            ShaderFrequency::Domain
        } else if self == Self::TessellationMultiplier {
            ShaderFrequency::Hull
        } else {
            ShaderFrequency::Pixel
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/types.rs"]
mod tests;
