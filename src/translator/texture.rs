//! Texture objects, texture sampling and the scene texture, depth and color lookups.

use super::HlslTranslator;
use super::nodes::SampleVariant;
use crate::foundation::ids::{Code, NodeIdx};
use crate::graph::model::{
    InputRef, MipValueMode, NodeKind, SamplerType, SceneInputMode, SceneTextureId,
    TextureSampleNode,
};
use crate::types::{FeatureLevel, ShaderFrequency, ValueType};
use crate::uniform::expr::{SamplerSource, TextureKind, TextureProperty, UniformExpr};

impl<'a> HlslTranslator<'a> {
    /// Label used by node-level checks: the description, else `fallback`.
    fn node_label(&self, node: NodeIdx, fallback: &str) -> String {
        let desc = &self.graph.node(node).desc;
        if desc.is_empty() {
            fallback.to_string()
        } else {
            desc.clone()
        }
    }

    /// False (after an error) when `sampler` does not suit the texture named `texture`.
    fn verify_sampler_type(&mut self, label: &str, texture: &str, sampler: SamplerType) -> bool {
        let graph = self.graph;
        let Some(def) = graph
            .texture_index(texture)
            .and_then(|i| graph.def.textures.get(i as usize))
        else {
            return true;
        };
        if let Some(correct) = def.sampler_type {
            if correct != sampler {
                self.error(format!(
                    "{label}> Sampler type is {}, should be {} for {}",
                    sampler.display_name(),
                    correct.display_name(),
                    def.name
                ));
                return false;
            }
        }
        if matches!(sampler, SamplerType::Normal | SamplerType::Masks) && def.srgb {
            self.error(format!(
                "{label}> To use '{}' as sampler type, SRGB must be disabled for {}",
                sampler.display_name(),
                def.name
            ));
            return false;
        }
        true
    }

    /// Texture and sampler type behind a texture object input, looking through function input
    /// previews.
    fn texture_object_source(&self, input: &InputRef) -> Option<(&'a str, SamplerType)> {
        let graph = self.graph;
        let mut node = input.target?;
        while let NodeKind::FunctionInput {
            preview: Some(preview),
            ..
        } = &graph.node(node).kind
        {
            node = preview.target?;
        }
        match &graph.node(node).kind {
            NodeKind::TextureObject {
                texture: Some(texture),
                sampler_type,
            }
            | NodeKind::TextureObjectParameter {
                texture: Some(texture),
                sampler_type,
                ..
            } => Some((texture.as_str(), *sampler_type)),
            _ => None,
        }
    }

    fn texture_kind(&self, texture_index: u32) -> TextureKind {
        self.graph
            .def
            .textures
            .get(texture_index as usize)
            .map_or(TextureKind::Texture2d, |t| t.kind)
    }

    pub(crate) fn texture_object_node(
        &mut self,
        node: NodeIdx,
        texture: Option<&str>,
        parameter: Option<&String>,
    ) -> Code {
        let Some(index) = texture.and_then(|t| self.graph.texture_index(t)) else {
            return self.compiler_error(node, "Requires valid texture");
        };
        match parameter {
            Some(name) => self.texture_parameter(name, index, SamplerSource::FromTextureAsset),
            None => self.texture(index, SamplerSource::FromTextureAsset),
        }
    }

    pub(crate) fn texture_sample_node(
        &mut self,
        node: NodeIdx,
        sample: &TextureSampleNode,
        variant: SampleVariant,
    ) -> Code {
        let graph = self.graph;
        if let SampleVariant::Parameter(kind) = variant {
            let requirement = match kind {
                TextureKind::Texture2d => "Requires Texture2D",
                TextureKind::TextureCube => "Requires TextureCube",
            };
            let Some(index) = sample.texture.as_deref().and_then(|t| graph.texture_index(t))
            else {
                return self.compiler_error(node, requirement);
            };
            if self.texture_kind(index) != kind {
                return self.compiler_error(node, requirement);
            }
            let label = self.node_label(node, "TextureSampleParameter");
            let texture = sample.texture.as_deref().unwrap_or_default();
            if !self.verify_sampler_type(&label, texture, sample.sampler_type) {
                return None;
            }
            if let Some(name) = &sample.parameter_name {
                let mip0 = self.compile_mip_value0(sample);
                let mip1 = self.compile_mip_value1(sample);
                let texture = self.texture_parameter(name, index, sample.sampler_source);
                let coordinates = self.compile_sample_coordinates(sample);
                return self.texture_sample(
                    texture,
                    coordinates,
                    sample.sampler_type,
                    mip0,
                    mip1,
                    sample.mip_value_mode,
                    sample.sampler_source,
                );
            }
        }

        let (texture_code, effective) = match (&sample.texture_object, &sample.texture) {
            (Some(object), _) => {
                let code = self.compile_input(object, None);
                (code, self.texture_object_source(object))
            }
            (None, Some(texture)) => {
                let Some(index) = graph.texture_index(texture) else {
                    return self.compiler_error(node, "Missing input texture");
                };
                let code = self.texture(index, sample.sampler_source);
                (code, Some((texture.as_str(), sample.sampler_type)))
            }
            (None, None) => {
                let label = self.node_label(node, "TextureSample");
                return self.error(format!("{label}> Missing input texture"));
            }
        };

        // The texture object node reports its own missing texture.
        let Some((texture, sampler_type)) = effective else {
            return None;
        };
        let label = self.node_label(node, "TextureSample");
        if !self.verify_sampler_type(&label, texture, sampler_type) {
            return None;
        }
        let coordinates = self.compile_sample_coordinates(sample);
        let mip0 = self.compile_mip_value0(sample);
        let mip1 = self.compile_mip_value1(sample);
        self.texture_sample(
            texture_code,
            coordinates,
            sampler_type,
            mip0,
            mip1,
            sample.mip_value_mode,
            sample.sampler_source,
        )
    }

    fn compile_sample_coordinates(&mut self, sample: &TextureSampleNode) -> Code {
        match &sample.coordinates {
            Some(c) => self.compile_input(c, None),
            None => self.texture_coordinate(sample.const_coordinate, false, false),
        }
    }

    fn compile_mip_value0(&mut self, sample: &TextureSampleNode) -> Code {
        if sample.mip_value_mode == MipValueMode::Derivative {
            return self.compile_opt(&sample.coordinates_dx);
        }
        self.compile_or_constant(&sample.mip_value, sample.const_mip_value)
    }

    fn compile_mip_value1(&mut self, sample: &TextureSampleNode) -> Code {
        if sample.mip_value_mode == MipValueMode::Derivative {
            return self.compile_opt(&sample.coordinates_dy);
        }
        None
    }

    /// Uniform chunk of a referenced texture.
    pub(crate) fn texture(&mut self, texture_index: u32, sampler_source: SamplerSource) -> Code {
        if self.stage != ShaderFrequency::Pixel && !self.feature_level_supported(FeatureLevel::Sm4)
        {
            return None;
        }
        let texture_kind = self.texture_kind(texture_index);
        self.add_uniform_expression(
            UniformExpr::Texture {
                texture_index,
                texture_kind,
                sampler_source,
            },
            texture_kind.value_type(),
            String::new(),
        )
    }

    /// Uniform chunk of a texture parameter defaulting to a referenced texture.
    pub(crate) fn texture_parameter(
        &mut self,
        name: &str,
        texture_index: u32,
        sampler_source: SamplerSource,
    ) -> Code {
        if self.stage != ShaderFrequency::Pixel && !self.feature_level_supported(FeatureLevel::Sm4)
        {
            return None;
        }
        let texture_kind = self.texture_kind(texture_index);
        self.add_uniform_expression(
            UniformExpr::TextureParameter {
                name: name.to_string(),
                texture_index,
                texture_kind,
                sampler_source,
            },
            texture_kind.value_type(),
            String::new(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn texture_sample(
        &mut self,
        texture: Code,
        coordinates: Code,
        sampler_type: SamplerType,
        mip_value0: Code,
        mip_value1: Code,
        mut mip_value_mode: MipValueMode,
        sampler_source: SamplerSource,
    ) -> Code {
        let (texture, coordinates) = (texture?, coordinates?);
        if self.stage != ShaderFrequency::Pixel && !self.feature_level_supported(FeatureLevel::Sm4)
        {
            return None;
        }

        let ty = self.chunk(texture).ty;
        if ty != ValueType::TEXTURE2D && ty != ValueType::TEXTURE_CUBE {
            return self.error(format!("Sampling unknown texture type: {}", ty.describe()));
        }
        if self.stage != ShaderFrequency::Pixel && mip_value_mode == MipValueMode::MipBias {
            return self.error("MipBias is only supported in the pixel shader");
        }

        let mip_code = match mip_value0 {
            Some(mip) if mip_value_mode != MipValueMode::None => {
                self.coerce_parameter(mip, ValueType::FLOAT1)
            }
            _ => "0.0f".to_string(),
        };
        if self.stage != ShaderFrequency::Pixel && mip_value_mode != MipValueMode::Derivative {
            // Only the pixel shader has implicit derivatives.
            mip_value_mode = MipValueMode::MipLevel;
        }

        let tex = self.coerce_parameter(texture, ty);
        let uv_type = if ty == ValueType::TEXTURE_CUBE {
            ValueType::FLOAT3
        } else {
            ValueType::FLOAT2
        };
        let uv = self.coerce_parameter(coordinates, uv_type);
        let base = if ty == ValueType::TEXTURE_CUBE {
            "TextureCubeSample"
        } else {
            "Texture2DSample"
        };
        let sampler_state = match sampler_source {
            SamplerSource::FromTextureAsset => format!("{tex}Sampler"),
            SamplerSource::WrapWorldGroupSettings => format!(
                "GetMaterialSharedSampler({tex}Sampler,Material.Wrap_WorldGroupSettings)"
            ),
            SamplerSource::ClampWorldGroupSettings => format!(
                "GetMaterialSharedSampler({tex}Sampler,Material.Clamp_WorldGroupSettings)"
            ),
        };

        let lookup = match mip_value_mode {
            MipValueMode::None => format!("{base}({tex},{sampler_state},{uv})"),
            MipValueMode::MipLevel => {
                if self.options.feature_level < FeatureLevel::Es31 {
                    return self.error("Sampling for a specific mip-level is not supported for mobile");
                }
                format!("{base}Level({tex},{tex}Sampler,{uv},{mip_code})")
            }
            MipValueMode::MipBias => {
                format!("{base}Bias({tex},{sampler_state},{uv},{mip_code})")
            }
            MipValueMode::Derivative => {
                let (Some(ddx), Some(ddy)) = (mip_value0, mip_value1) else {
                    return self.error("Derivative sampling requires both DDX and DDY inputs");
                };
                let ddx = self.coerce_parameter(ddx, uv_type);
                let ddy = self.coerce_parameter(ddy, uv_type);
                format!("{base}Grad({tex},{sampler_state},{uv},{ddx},{ddy})")
            }
        };

        let code = match sampler_type {
            SamplerType::Color => format!("ProcessMaterialColorTextureLookup({lookup})"),
            SamplerType::LinearColor => {
                format!("ProcessMaterialLinearColorTextureLookup({lookup})")
            }
            SamplerType::Alpha | SamplerType::DistanceFieldFont => format!("({lookup}).rrrr"),
            SamplerType::Grayscale => {
                format!("ProcessMaterialGreyscaleTextureLookup(({lookup}).r).rrrr")
            }
            SamplerType::LinearGrayscale => {
                format!("ProcessMaterialLinearGreyscaleTextureLookup(({lookup}).r).rrrr")
            }
            SamplerType::Normal => format!("UnpackNormalMap({lookup})"),
            SamplerType::Masks => lookup,
        };
        self.add_code_chunk(ValueType::FLOAT4, code)
    }

    /// Size or texel size of a 2D texture, evaluated on the CPU.
    pub(crate) fn texture_property(&mut self, texture: Code, property: TextureProperty) -> Code {
        let texture = texture?;
        let ty = self.chunk(texture).ty;
        if ty != ValueType::TEXTURE2D {
            return self.error(format!(
                "Texture size only available for Texture2D, not {}",
                ty.describe()
            ));
        }
        let Some(id) = self.uniform_of(texture) else {
            return self.error("Texture size requires a texture object or parameter");
        };
        self.add_uniform_expression(
            UniformExpr::TextureProperty {
                texture: id,
                property,
            },
            ValueType::FLOAT2,
            String::new(),
        )
    }

    pub(crate) fn particle_sub_uv_node(
        &mut self,
        node: NodeIdx,
        texture: Option<&str>,
        sampler_type: SamplerType,
        blend: bool,
    ) -> Code {
        let Some(name) = texture else {
            return self.error("Missing ParticleSubUV input texture");
        };
        let label = self.node_label(node, "ParticleSubUV");
        if !self.verify_sampler_type(&label, name, sampler_type) {
            return None;
        }
        let Some(index) = self.graph.texture_index(name) else {
            return self.error("Missing ParticleSubUV input texture");
        };
        let texture = self.texture(index, SamplerSource::FromTextureAsset);
        self.particle_sub_uv(texture, sampler_type, blend)
    }

    fn particle_sub_uv(&mut self, texture: Code, sampler_type: SamplerType, blend: bool) -> Code {
        if !self.is_pixel_or_compute() {
            return self.non_pixel_shader_expression_error();
        }
        texture?;
        let uv0 = self.add_code_chunk(
            ValueType::FLOAT2,
            "Parameters.Particle.SubUVCoords[0].xy".to_string(),
        );
        let first = self.texture_sample(
            texture,
            uv0,
            sampler_type,
            None,
            None,
            MipValueMode::None,
            SamplerSource::FromTextureAsset,
        );
        let result = if blend {
            let uv1 = self.add_code_chunk(
                ValueType::FLOAT2,
                "Parameters.Particle.SubUVCoords[1].xy".to_string(),
            );
            let alpha =
                self.add_code_chunk(ValueType::FLOAT, "Parameters.Particle.SubUVLerp".to_string());
            let second = self.texture_sample(
                texture,
                uv1,
                sampler_type,
                None,
                None,
                MipValueMode::None,
                SamplerSource::FromTextureAsset,
            );
            self.lerp(first, second, alpha)
        } else {
            first
        };
        self.usage.uses_particle_sub_uvs = true;
        result
    }

    /// Screen UV of a scene lookup: an offset fraction, explicit coordinates or the pixel.
    fn screen_uv(&mut self, uv: Code, use_offset: bool) -> String {
        match uv {
            Some(offset) if use_offset => {
                let c = self.coerce_parameter(offset, ValueType::FLOAT2);
                let chunk = self.add_code_chunk(
                    ValueType::FLOAT2,
                    format!("CalcScreenUVFromOffsetFraction(Parameters.ScreenPosition, {c})"),
                );
                self.code_or_zero(chunk)
            }
            Some(uv) => {
                let c = self.coerce_parameter(uv, ValueType::FLOAT2);
                let chunk = self.add_inlined_code_chunk(ValueType::FLOAT2, c);
                self.code_or_zero(chunk)
            }
            None => "MaterialFloat2(ScreenAlignedPosition(Parameters.ScreenPosition).xy)"
                .to_string(),
        }
    }

    /// Offset (or coordinate) input of a scene depth or scene color node.
    fn scene_input(
        &mut self,
        input: &Option<InputRef>,
        mode: SceneInputMode,
        const_input: [f32; 2],
    ) -> (Code, bool) {
        match mode {
            SceneInputMode::OffsetFraction => {
                let offset = match input {
                    Some(i) => self.compile_input(i, None),
                    None => self.constant2(const_input[0], const_input[1]),
                };
                (offset, true)
            }
            SceneInputMode::Coordinates => (self.compile_opt(input), false),
        }
    }

    pub(crate) fn scene_depth_node(
        &mut self,
        input: &Option<InputRef>,
        mode: SceneInputMode,
        const_input: [f32; 2],
    ) -> Code {
        let (offset, use_offset) = self.scene_input(input, mode, const_input);
        self.scene_depth(offset, use_offset)
    }

    fn scene_depth(&mut self, offset: Code, use_offset: bool) -> Code {
        if !self.is_pixel_or_compute() {
            return self.non_pixel_shader_expression_error();
        }
        if offset.is_none() && use_offset {
            return None;
        }
        self.output.uses_scene_depth = true;
        let uv = self.screen_uv(offset, use_offset);
        self.add_code_chunk(ValueType::FLOAT, format!("CalcSceneDepth({uv})"))
    }

    pub(crate) fn scene_color_node(
        &mut self,
        input: &Option<InputRef>,
        mode: SceneInputMode,
        const_input: [f32; 2],
    ) -> Code {
        let (offset, use_offset) = self.scene_input(input, mode, const_input);
        self.scene_color(offset, use_offset)
    }

    fn scene_color(&mut self, offset: Code, use_offset: bool) -> Code {
        if offset.is_none() && use_offset {
            return None;
        }
        if self.stage != ShaderFrequency::Pixel {
            return self.non_pixel_shader_expression_error();
        }
        if !self.feature_level_supported(FeatureLevel::Sm4) {
            return None;
        }
        self.output.requires_scene_color_copy = true;
        self.usage.uses_scene_color = true;
        let uv = self.screen_uv(offset, use_offset);
        self.add_code_chunk(
            ValueType::FLOAT3,
            format!("DecodeSceneColorForMaterialNode({uv})"),
        )
    }

    fn use_scene_texture_id(&mut self, id: SceneTextureId, texture_lookup: bool) {
        self.output.needs_scene_textures = true;
        if texture_lookup && id.is_post_process_input() {
            self.usage.needs_scene_texture_post_process_inputs = true;
        }
        self.output.needs_gbuffer |= id.reads_gbuffer();
    }

    pub(crate) fn scene_texture_node(
        &mut self,
        output: u32,
        id: SceneTextureId,
        coordinates: &Option<InputRef>,
        clamp_uvs: bool,
    ) -> Code {
        let mut uv = self.compile_opt(coordinates);
        match output {
            0 => {
                if uv.is_some() && clamp_uvs {
                    let max = self.scene_texture_max(id);
                    let min = self.scene_texture_min(id);
                    uv = self.clamp(uv, min, max);
                }
                self.scene_texture_lookup(uv, id)
            }
            1 | 2 => self.scene_texture_size(id, output == 2),
            _ => self.error("Invalid intput parameter"),
        }
    }

    fn scene_texture_lookup(&mut self, uv: Code, id: SceneTextureId) -> Code {
        if !self.feature_level_supported(FeatureLevel::Sm4) {
            return None;
        }
        if self.stage != ShaderFrequency::Pixel {
            return self.non_pixel_shader_expression_error();
        }
        self.use_scene_texture_id(id, true);
        let uv = match uv {
            Some(uv) => self.coerce_parameter(uv, ValueType::FLOAT2),
            None => "ScreenAlignedPosition(Parameters.ScreenPosition).xy".to_string(),
        };
        self.add_code_chunk(
            ValueType::FLOAT4,
            format!("SceneTextureLookup({uv}, {}, false)", id.index()),
        )
    }

    fn scene_texture_size(&mut self, id: SceneTextureId, invert: bool) -> Code {
        if self.stage != ShaderFrequency::Pixel {
            return self.non_pixel_shader_expression_error();
        }
        self.use_scene_texture_id(id, false);
        if let Some(n) = post_process_input(id) {
            let swizzle = if invert { "zw" } else { "xy" };
            return self.add_code_chunk(
                ValueType::FLOAT2,
                format!("GetPostProcessInputSize({n}).{swizzle}"),
            );
        }
        let size = self.add_code_chunk(ValueType::FLOAT2, "View.RenderTargetSize".to_string());
        if invert {
            let one = self.constant(1.0);
            self.div(one, size)
        } else {
            size
        }
    }

    fn scene_texture_min(&mut self, id: SceneTextureId) -> Code {
        self.scene_texture_bound(id, "xy")
    }

    fn scene_texture_max(&mut self, id: SceneTextureId) -> Code {
        self.scene_texture_bound(id, "zw")
    }

    fn scene_texture_bound(&mut self, id: SceneTextureId, swizzle: &str) -> Code {
        if self.stage != ShaderFrequency::Pixel {
            return self.non_pixel_shader_expression_error();
        }
        self.use_scene_texture_id(id, false);
        let code = match post_process_input(id) {
            Some(n) => format!("GetPostProcessInputMinMax({n}).{swizzle}"),
            None => format!("View.SceneTextureMinMax.{swizzle}"),
        };
        self.add_code_chunk(ValueType::FLOAT2, code)
    }
}

/// Index of a post process input texture.
fn post_process_input(id: SceneTextureId) -> Option<u32> {
    let first = SceneTextureId::PostProcessInput0.index();
    let last = SceneTextureId::PostProcessInput6.index();
    (first..=last).contains(&id.index()).then(|| id.index() - first)
}
