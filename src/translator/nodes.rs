//! Per-node compile dispatch and the view, particle and object builtins.

use super::HlslTranslator;
use crate::foundation::ids::{Code, NodeIdx};
use crate::graph::model::{
    ClampMode, InputRef, MaterialDomain, NodeKind, StaticParameterValue, WorldPositionMode,
};
use crate::options::QualityLevel;
use crate::types::{FeatureLevel, MaterialProperty, ShaderFrequency, ValueType};
use crate::uniform::expr::TextureKind;
use std::f32::consts::PI;

/// Which texture sample node a sample comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SampleVariant {
    Plain,
    Parameter(TextureKind),
}

impl HlslTranslator<'_> {
    /// Compile one output of `node`. Only [`Self::call_expression`] calls this.
    pub(crate) fn compile_node(
        &mut self,
        node: NodeIdx,
        output: u32,
        multiplex: Option<MaterialProperty>,
    ) -> Code {
        let graph = self.graph;
        match &graph.node(node).kind {
            NodeKind::Constant { value } => self.constant(*value),
            NodeKind::Constant2Vector { value: [x, y] } => self.constant2(*x, *y),
            NodeKind::Constant3Vector { value: [x, y, z] } => self.constant3(*x, *y, *z),
            NodeKind::Constant4Vector {
                value: [x, y, z, w],
            } => self.constant4(*x, *y, *z, *w),
            NodeKind::ScalarParameter {
                parameter_name,
                default_value,
            } => self.scalar_parameter(parameter_name, *default_value),
            NodeKind::VectorParameter {
                parameter_name,
                default_value,
            } => self.vector_parameter(parameter_name, *default_value),

            NodeKind::StaticBool { value } => self.static_bool(*value),
            NodeKind::StaticBoolParameter {
                parameter_name,
                default_value,
            } => self.static_bool_parameter(parameter_name, *default_value),
            NodeKind::StaticSwitch {
                default_value,
                a,
                b,
                value,
            } => {
                let selected = match value {
                    Some(value) => {
                        let code = self.compile_input(value, None);
                        match self.static_bool_value(code) {
                            Some(v) => v,
                            None => return None,
                        }
                    }
                    None => *default_value,
                };
                // Only the taken branch compiles, so the other may be invalid.
                let branch = if selected { a } else { b };
                self.compile_multiplexed(branch, multiplex)
            }
            NodeKind::StaticSwitchParameter {
                parameter_name,
                default_value,
                a,
                b,
            } => {
                let code = self.static_bool_parameter(parameter_name, *default_value);
                let value = self.static_bool_value(code);
                let mut ok = value.is_some();
                if a.is_none() {
                    self.error("Missing A input");
                    ok = false;
                }
                if b.is_none() {
                    self.error("Missing B input");
                    ok = false;
                }
                match value {
                    Some(true) if ok => self.compile_multiplexed(a, multiplex),
                    Some(false) if ok => self.compile_multiplexed(b, multiplex),
                    _ => None,
                }
            }
            NodeKind::StaticComponentMaskParameter {
                parameter_name,
                input,
                default_mask,
            } => {
                let Some(input) = input else {
                    return self.error("Missing ComponentMaskParameter input");
                };
                let [r, g, b, a] = match graph.def.static_parameters.get(parameter_name) {
                    Some(StaticParameterValue::Mask(mask)) => *mask,
                    _ => *default_mask,
                };
                let code = self.compile_input(input, None);
                self.component_mask(code, r, g, b, a)
            }

            NodeKind::Time {
                ignore_pause,
                override_period,
                period,
            } => {
                if *ignore_pause {
                    self.real_time(*override_period, *period)
                } else {
                    self.game_time(*override_period, *period)
                }
            }

            NodeKind::Add {
                a,
                b,
                const_a,
                const_b,
            } => {
                let a = self.compile_or_constant(a, *const_a);
                let b = self.compile_or_constant(b, *const_b);
                self.add(a, b)
            }
            NodeKind::Subtract {
                a,
                b,
                const_a,
                const_b,
            } => {
                let a = self.compile_or_constant(a, *const_a);
                let b = self.compile_or_constant(b, *const_b);
                self.sub(a, b)
            }
            NodeKind::Multiply {
                a,
                b,
                const_a,
                const_b,
            } => {
                let a = self.compile_or_constant(a, *const_a);
                let b = self.compile_or_constant(b, *const_b);
                self.mul(a, b)
            }
            NodeKind::Divide {
                a,
                b,
                const_a,
                const_b,
            } => {
                let a = self.compile_or_constant(a, *const_a);
                let b = self.compile_or_constant(b, *const_b);
                self.div(a, b)
            }
            NodeKind::Sine { input, period } => self.periodic_trig(input, *period, false),
            NodeKind::Cosine { input, period } => self.periodic_trig(input, *period, true),
            NodeKind::Floor { input } => self.unary_node(input, "Missing Floor input", Self::floor),
            NodeKind::Ceil { input } => self.unary_node(input, "Missing Ceil input", Self::ceil),
            NodeKind::Frac { input } => self.unary_node(input, "Missing Frac input", Self::frac),
            NodeKind::Abs { input } => self.unary_node(input, "Missing Abs input", Self::abs),
            NodeKind::SquareRoot { input } => {
                self.unary_node(input, "Missing square root input", Self::square_root)
            }
            NodeKind::Saturate { input } => {
                self.unary_node(input, "Missing Saturate input", Self::saturate)
            }
            NodeKind::Length { input } => {
                self.unary_node(input, "Missing Length input", Self::length)
            }
            NodeKind::Logarithm2 { input } => {
                self.unary_node(input, "Missing Log2 X input", Self::logarithm2)
            }
            NodeKind::Fmod { a, b } => {
                let (Some(a), Some(b)) = (a, b) else {
                    let which = if a.is_none() { "A" } else { "B" };
                    return self.error(format!("Missing Fmod input {which}"));
                };
                let a = self.compile_input(a, None);
                let b = self.compile_input(b, None);
                self.fmod(a, b)
            }
            NodeKind::Power {
                base,
                exponent,
                const_exponent,
            } => {
                let Some(base) = base else {
                    return self.error("Missing Power Base input");
                };
                let base = self.compile_input(base, None);
                let exponent = self.compile_or_constant(exponent, *const_exponent);
                self.power(base, exponent)
            }
            NodeKind::DotProduct { a, b } => {
                let (Some(a), Some(b)) = (a, b) else {
                    let which = if a.is_none() { "A" } else { "B" };
                    return self.error(format!("Missing DotProduct input {which}"));
                };
                let a = self.compile_input(a, None);
                let b = self.compile_input(b, None);
                self.dot(a, b)
            }
            NodeKind::CrossProduct { a, b } => {
                let (Some(a), Some(b)) = (a, b) else {
                    let which = if a.is_none() { "A" } else { "B" };
                    return self.error(format!("Missing CrossProduct input {which}"));
                };
                let a = self.compile_input(a, None);
                let b = self.compile_input(b, None);
                self.cross(a, b)
            }
            NodeKind::LinearInterpolate {
                a,
                b,
                alpha,
                const_a,
                const_b,
                const_alpha,
            } => {
                let a = self.compile_or_constant(a, *const_a);
                let b = self.compile_or_constant(b, *const_b);
                let alpha = self.compile_or_constant(alpha, *const_alpha);
                self.lerp(a, b, alpha)
            }
            NodeKind::Min {
                a,
                b,
                const_a,
                const_b,
            } => {
                let a = self.compile_or_constant(a, *const_a);
                let b = self.compile_or_constant(b, *const_b);
                self.min(a, b)
            }
            NodeKind::Max {
                a,
                b,
                const_a,
                const_b,
            } => {
                let a = self.compile_or_constant(a, *const_a);
                let b = self.compile_or_constant(b, *const_b);
                self.max(a, b)
            }
            NodeKind::Clamp {
                input,
                min,
                max,
                clamp_mode,
                min_default,
                max_default,
            } => {
                let Some(input) = input else {
                    return self.error("Missing Clamp input");
                };
                let min = self.compile_or_constant(min, *min_default);
                let max = self.compile_or_constant(max, *max_default);
                let x = self.compile_input(input, None);
                match clamp_mode {
                    ClampMode::Clamp => self.clamp(x, min, max),
                    ClampMode::ClampMin => self.max(x, min),
                    ClampMode::ClampMax => self.min(x, max),
                }
            }
            NodeKind::ComponentMask { input, r, g, b, a } => {
                let Some(input) = input else {
                    return self.error("Missing ComponentMask input");
                };
                let code = self.compile_input(input, None);
                self.component_mask(code, *r, *g, *b, *a)
            }
            NodeKind::AppendVector { a, b } => {
                let (Some(a), Some(b)) = (a, b) else {
                    let which = if a.is_none() { "A" } else { "B" };
                    return self.error(format!("Missing AppendVector input {which}"));
                };
                let a = self.compile_input(a, None);
                let b = self.compile_input(b, None);
                self.append_vector(a, b)
            }
            NodeKind::If {
                a,
                b,
                a_greater_than_b,
                a_equals_b,
                a_less_than_b,
                equals_threshold,
                const_b,
            } => {
                let Some(a) = a else {
                    return self.error("Missing If A input");
                };
                let Some(greater) = a_greater_than_b else {
                    return self.error("Missing If AGreaterThanB input");
                };
                let Some(less) = a_less_than_b else {
                    return self.error("Missing If ALessThanB input");
                };
                let a = self.compile_input(a, None);
                let b = self.compile_or_constant(b, *const_b);
                if !is_scalar(self.ty(a)) {
                    return self.error("If input A must be of type float.");
                }
                if !is_scalar(self.ty(b)) {
                    return self.error("If input B must be of type float.");
                }
                let greater = self.compile_input(greater, None);
                let equal = self.compile_opt(a_equals_b);
                let less = self.compile_input(less, None);
                let threshold = self.constant(*equals_threshold);
                self.if_select(a, b, greater, equal, less, threshold)
            }
            NodeKind::Panner {
                coordinate,
                time,
                speed,
                speed_x,
                speed_y,
                const_coordinate,
                fractional_part,
            } => {
                let time = match time {
                    Some(t) => self.compile_input(t, None),
                    None => self.game_time(false, 0.0),
                };
                let (speed_u, speed_v) = match speed {
                    Some(s) => {
                        let s = self.compile_input(s, None);
                        (
                            self.component_mask(s, true, false, false, false),
                            self.component_mask(s, false, true, false, false),
                        )
                    }
                    None => (self.constant(*speed_x), self.constant(*speed_y)),
                };
                let mut u = self.mul(time, speed_u);
                let mut v = self.mul(time, speed_v);
                if *fractional_part {
                    u = self.frac(u);
                    v = self.frac(v);
                }
                let u = self.periodic_hint(u);
                let v = self.periodic_hint(v);
                let uv = match coordinate {
                    Some(c) => self.compile_input(c, None),
                    None => self.texture_coordinate(*const_coordinate, false, false),
                };
                let offset = self.append_vector(u, v);
                self.add(offset, uv)
            }
            NodeKind::TextureCoordinate {
                coordinate_index,
                u_tiling,
                v_tiling,
                un_mirror_u,
                un_mirror_v,
            } => {
                let uv = self.texture_coordinate(*coordinate_index, *un_mirror_u, *un_mirror_v);
                let tiling = if (u_tiling - v_tiling).abs() > 1e-8 {
                    self.constant2(*u_tiling, *v_tiling)
                } else {
                    self.constant(*u_tiling)
                };
                self.mul(uv, tiling)
            }

            NodeKind::TextureObject { texture, .. } => {
                self.texture_object_node(node, texture.as_deref(), None)
            }
            NodeKind::TextureObjectParameter {
                parameter_name,
                texture,
                ..
            } => self.texture_object_node(node, texture.as_deref(), Some(parameter_name)),
            NodeKind::TextureSample(sample) => {
                self.texture_sample_node(node, sample, SampleVariant::Plain)
            }
            NodeKind::TextureSampleParameter2d(sample) => self.texture_sample_node(
                node,
                sample,
                SampleVariant::Parameter(TextureKind::Texture2d),
            ),
            NodeKind::TextureSampleParameterCube(sample) => self.texture_sample_node(
                node,
                sample,
                SampleVariant::Parameter(TextureKind::TextureCube),
            ),
            NodeKind::TextureProperty {
                texture_object,
                property,
            } => {
                let Some(texture_object) = texture_object else {
                    return self.error("TextureSample> Missing input texture");
                };
                let texture = self.compile_input(texture_object, None);
                self.texture_property(texture, *property)
            }
            NodeKind::PixelDepth => {
                if !self.is_pixel_or_compute() {
                    return self.non_pixel_shader_expression_error();
                }
                self.add_inlined_code_chunk(
                    ValueType::FLOAT,
                    "Parameters.ScreenPosition.w".to_string(),
                )
            }
            NodeKind::SceneDepth {
                input,
                input_mode,
                const_input,
            } => self.scene_depth_node(input, *input_mode, *const_input),
            NodeKind::SceneTexture {
                scene_texture_id,
                coordinates,
                clamp_uvs,
                ..
            } => self.scene_texture_node(output, *scene_texture_id, coordinates, *clamp_uvs),
            NodeKind::SceneColor {
                input,
                input_mode,
                const_input,
            } => self.scene_color_node(input, *input_mode, *const_input),
            NodeKind::ScreenPosition => {
                if !self.is_pixel_or_compute() {
                    return self.non_pixel_shader_expression_error();
                }
                self.add_code_chunk(
                    ValueType::FLOAT2,
                    "ScreenAlignedPosition(Parameters.ScreenPosition).xy".to_string(),
                )
            }
            NodeKind::ViewSize => self.add_code_chunk(
                ValueType::FLOAT2,
                "View.ViewSizeAndSceneTexelSize.xy".to_string(),
            ),
            NodeKind::SceneTexelSize => self.add_code_chunk(
                ValueType::FLOAT2,
                "View.ViewSizeAndSceneTexelSize.zw".to_string(),
            ),
            NodeKind::VertexColor => {
                self.usage.uses_vertex_color |= self.stage != ShaderFrequency::Vertex;
                self.add_inlined_code_chunk(ValueType::FLOAT4, "Parameters.VertexColor".to_string())
            }

            NodeKind::ParticleColor
            | NodeKind::ParticlePositionWs
            | NodeKind::ParticleRadius
            | NodeKind::ParticleRelativeTime
            | NodeKind::ParticleMotionBlurFade
            | NodeKind::ParticleDirection
            | NodeKind::ParticleSpeed
            | NodeKind::ParticleSize
            | NodeKind::DynamicParameter => self.particle_attribute(&graph.node(node).kind),
            NodeKind::ParticleMacroUv => {
                if !self.is_pixel_or_compute() {
                    return self.non_pixel_shader_expression_error();
                }
                self.add_code_chunk(ValueType::FLOAT2, "GetParticleMacroUV(Parameters)".to_string())
            }
            NodeKind::ParticleSubUv {
                texture,
                sampler_type,
                blend,
            } => self.particle_sub_uv_node(node, texture.as_deref(), *sampler_type, *blend),
            NodeKind::SphericalParticleOpacity {
                density,
                constant_density,
            } => {
                let density = self.compile_or_constant(density, *constant_density);
                self.spherical_particle_opacity(density)
            }

            NodeKind::WorldPosition { shader_offset } => self.world_position(*shader_offset),
            NodeKind::ObjectPositionWs => self.add_inlined_code_chunk(
                ValueType::FLOAT3,
                "GetObjectWorldPosition(Parameters)".to_string(),
            ),
            NodeKind::ObjectRadius => self.add_inlined_code_chunk(
                ValueType::FLOAT,
                "Primitive.ObjectWorldPositionAndRadius.w".to_string(),
            ),
            NodeKind::ObjectBounds => self.add_inlined_code_chunk(
                ValueType::FLOAT3,
                "Primitive.ObjectBounds.xyz".to_string(),
            ),
            NodeKind::ActorPositionWs => self.add_inlined_code_chunk(
                ValueType::FLOAT3,
                "GetActorWorldPosition()".to_string(),
            ),
            NodeKind::CameraVectorWs => {
                if !self.is_pixel_compute_or_domain() {
                    return self.non_pixel_shader_expression_error();
                }
                self.usage.uses_transform_vector |= self.stage != ShaderFrequency::Vertex;
                self.add_inlined_code_chunk(ValueType::FLOAT3, "Parameters.CameraVector".to_string())
            }
            NodeKind::CameraPositionWs => {
                self.add_inlined_code_chunk(ValueType::FLOAT3, "View.ViewOrigin.xyz".to_string())
            }
            NodeKind::ReflectionVectorWs => {
                if !self.is_pixel_compute_or_domain() {
                    return self.non_pixel_shader_expression_error();
                }
                self.add_inlined_code_chunk(
                    ValueType::FLOAT3,
                    "Parameters.ReflectionVector".to_string(),
                )
            }
            NodeKind::LightVector => {
                if !self.is_pixel_or_compute() {
                    return self.non_pixel_shader_expression_error();
                }
                if !matches!(
                    graph.def.domain,
                    MaterialDomain::LightFunction | MaterialDomain::DeferredDecal
                ) {
                    return self
                        .error("LightVector can only be used in LightFunction or DeferredDecal materials");
                }
                self.add_inlined_code_chunk(ValueType::FLOAT3, "Parameters.LightVector".to_string())
            }
            NodeKind::VertexNormalWs => {
                self.usage.uses_transform_vector |= self.stage != ShaderFrequency::Vertex;
                self.add_inlined_code_chunk(
                    ValueType::FLOAT3,
                    "Parameters.TangentToWorld[2]".to_string(),
                )
            }
            NodeKind::PixelNormalWs => {
                if !self.is_pixel_or_compute() {
                    return self.non_pixel_shader_expression_error();
                }
                if self.material_property == Some(MaterialProperty::Normal) {
                    return self.error("Invalid node PixelNormalWS used for Normal input.");
                }
                self.usage.uses_transform_vector = true;
                self.add_inlined_code_chunk(ValueType::FLOAT3, "Parameters.WorldNormal".to_string())
            }
            NodeKind::Ddx { value } => {
                let code = self.compile_opt(value);
                self.derivative(code, "DDX")
            }
            NodeKind::Ddy { value } => {
                let code = self.compile_opt(value);
                self.derivative(code, "DDY")
            }
            NodeKind::TwoSidedSign => {
                if !self.is_pixel_or_compute() {
                    return self.non_pixel_shader_expression_error();
                }
                self.add_inlined_code_chunk(ValueType::FLOAT, "Parameters.TwoSidedSign".to_string())
            }
            NodeKind::PerInstanceRandom => {
                if !matches!(self.stage, ShaderFrequency::Pixel | ShaderFrequency::Vertex) {
                    return self.non_vertex_or_pixel_shader_expression_error();
                }
                self.add_inlined_code_chunk(
                    ValueType::FLOAT,
                    "GetPerInstanceRandom(Parameters)".to_string(),
                )
            }
            NodeKind::EyeAdaptation => {
                if !self.feature_level_supported(FeatureLevel::Sm5) {
                    return None;
                }
                if self.stage != ShaderFrequency::Pixel {
                    self.non_pixel_shader_expression_error();
                }
                self.output.uses_eye_adaptation = true;
                self.add_inlined_code_chunk(ValueType::FLOAT, "EyeAdaptationLookup()".to_string())
            }
            NodeKind::LightmapUvs => {
                if !self.is_pixel_or_compute() {
                    return self.non_pixel_shader_expression_error();
                }
                if !self.feature_level_supported(FeatureLevel::Sm4) {
                    return None;
                }
                self.usage.uses_lightmap_uvs = true;
                self.add_code_chunk(ValueType::FLOAT2, "GetLightmapUVs(Parameters)".to_string())
            }
            NodeKind::AtmosphericFogColor { world_position } => {
                let position = self.compile_opt(world_position);
                self.atmospheric_fog_color(position)
            }
            NodeKind::BlackBody { temp } => {
                let temp = self.compile_opt(temp)?;
                let c = self.parameter_code(temp);
                self.add_code_chunk(ValueType::FLOAT3, format!("MaterialExpressionBlackBody({c})"))
            }
            NodeKind::CollectionParameter {
                collection,
                parameter_name,
            } => self.collection_parameter(collection.as_deref(), parameter_name),

            NodeKind::Transform {
                input,
                source,
                destination,
            } => {
                let Some(input) = input else {
                    return self.error("Missing Transform input vector");
                };
                let code = self.compile_input(input, None);
                self.transform_vector(code, *source, *destination)
            }
            NodeKind::TransformPosition {
                input,
                source,
                destination,
            } => {
                let Some(input) = input else {
                    return self.error("Missing Transform Position input vector");
                };
                let code = self.compile_input(input, None);
                self.transform_position(code, *source, *destination)
            }
            NodeKind::Custom {
                code,
                output_type,
                description,
                inputs,
            } => self.custom_expression_node(code, *output_type, description, inputs),
            NodeKind::CustomOutput { inputs, .. } => match inputs.get(output as usize) {
                Some(Some(input)) => {
                    let code = self.compile_input(input, multiplex);
                    self.custom_output(node, output, code)
                }
                _ => self.compiler_error(node, "Input missing"),
            },
            NodeKind::ClearCoatNormalCustomOutput { input } => match input {
                Some(input) => {
                    let code = self.compile_input(input, multiplex);
                    self.custom_output(node, output, code)
                }
                None => self.compiler_error(node, "Input missing"),
            },

            NodeKind::MakeMaterialAttributes { inputs } => {
                let Some(property) = multiplex else {
                    return self.error(
                        "MaterialAttributes can only be connected to a MaterialAttributes pin.",
                    );
                };
                let input = inputs.get(&property)?;
                let code = self.compile_input(input, None);
                if code.is_none() {
                    return self.error(format!("Error on property {}", property.name()));
                }
                code
            }
            NodeKind::FeatureLevelSwitch {
                default,
                es2,
                es3_1,
                sm4,
                sm5,
            } => {
                let Some(default) = default else {
                    return self.error("Feature Level switch missing default input");
                };
                let selected = match self.options.feature_level {
                    FeatureLevel::Es2 => es2,
                    FeatureLevel::Es31 => es3_1,
                    FeatureLevel::Sm4 => sm4,
                    FeatureLevel::Sm5 => sm5,
                };
                self.compile_input(selected.as_ref().unwrap_or(default), multiplex)
            }
            NodeKind::QualitySwitch {
                default,
                low,
                medium,
                high,
            } => {
                let Some(default) = default else {
                    return self.error("Quality switch missing default input");
                };
                let selected = match self.options.quality_level {
                    QualityLevel::Low => low,
                    QualityLevel::Medium => medium,
                    QualityLevel::High => high,
                };
                self.compile_input(selected.as_ref().unwrap_or(default), multiplex)
            }
            NodeKind::FunctionInput { .. } => self.function_input(node, multiplex),
            NodeKind::FunctionOutput { .. } => self.function_output(node, multiplex),
            NodeKind::MaterialFunctionCall { .. } => self.function_call(node, output, multiplex),
        }
    }

    fn compile_multiplexed(
        &mut self,
        input: &Option<InputRef>,
        multiplex: Option<MaterialProperty>,
    ) -> Code {
        input.as_ref().and_then(|i| self.compile_input(i, multiplex))
    }

    fn unary_node(
        &mut self,
        input: &Option<InputRef>,
        missing: &str,
        op: fn(&mut Self, Code) -> Code,
    ) -> Code {
        let Some(input) = input else {
            return self.error(missing);
        };
        let code = self.compile_input(input, None);
        op(self, code)
    }

    fn periodic_trig(&mut self, input: &Option<InputRef>, period: f32, is_cosine: bool) -> Code {
        let Some(input) = input else {
            let name = if is_cosine { "Cosine" } else { "Sine" };
            return self.error(format!("Missing {name} input"));
        };
        let mut code = self.compile_input(input, None);
        if period > 0.0 {
            let scale = self.constant(2.0 * PI / period);
            code = self.mul(code, scale);
        }
        self.sine(code, is_cosine)
    }

    fn static_bool_parameter(&mut self, name: &str, default_value: bool) -> Code {
        let value = match self.graph.def.static_parameters.get(name) {
            Some(StaticParameterValue::Bool(v)) => *v,
            _ => default_value,
        };
        self.static_bool(value)
    }

    fn is_pixel_compute_or_domain(&self) -> bool {
        self.is_pixel_or_compute() || self.stage == ShaderFrequency::Domain
    }

    fn particle_attribute(&mut self, kind: &NodeKind) -> Code {
        if !self.is_vertex_pixel_or_compute() {
            return self.non_vertex_or_pixel_shader_expression_error();
        }
        let usage = &mut self.usage;
        let (ty, code) = match kind {
            NodeKind::ParticleColor => {
                usage.uses_particle_color |= self.stage != ShaderFrequency::Vertex;
                (ValueType::FLOAT4, "Parameters.Particle.Color")
            }
            NodeKind::ParticlePositionWs => {
                usage.needs_particle_position = true;
                (ValueType::FLOAT3, "Parameters.Particle.PositionAndSize.xyz")
            }
            NodeKind::ParticleRadius => {
                usage.needs_particle_position = true;
                (
                    ValueType::FLOAT,
                    "max(Parameters.Particle.PositionAndSize.w, .001f)",
                )
            }
            NodeKind::ParticleRelativeTime => {
                usage.needs_particle_time = true;
                (ValueType::FLOAT, "Parameters.Particle.RelativeTime")
            }
            NodeKind::ParticleMotionBlurFade => {
                usage.uses_particle_motion_blur = true;
                (ValueType::FLOAT, "Parameters.Particle.MotionBlurFade")
            }
            NodeKind::ParticleDirection => {
                usage.needs_particle_velocity = true;
                (ValueType::FLOAT3, "Parameters.Particle.Velocity.xyz")
            }
            NodeKind::ParticleSpeed => {
                usage.needs_particle_velocity = true;
                (ValueType::FLOAT, "Parameters.Particle.Velocity.w")
            }
            NodeKind::ParticleSize => {
                usage.needs_particle_size = true;
                (ValueType::FLOAT2, "Parameters.Particle.Size")
            }
            NodeKind::DynamicParameter => {
                usage.needs_particle_dynamic_parameter = true;
                (ValueType::FLOAT4, "Parameters.Particle.DynamicParameter")
            }
            _ => return None,
        };
        self.add_inlined_code_chunk(ty, code.to_string())
    }

    fn spherical_particle_opacity(&mut self, density: Code) -> Code {
        if !self.is_pixel_or_compute() {
            return self.non_pixel_shader_expression_error();
        }
        let density = density?;
        self.usage.needs_particle_position = true;
        self.usage.uses_spherical_particle_opacity = true;
        let d = self.parameter_code(density);
        self.add_code_chunk(
            ValueType::FLOAT,
            format!("GetSphericalParticleOpacity(Parameters,{d})"),
        )
    }

    fn world_position(&mut self, mode: WorldPositionMode) -> Code {
        let code = if self.stage == ShaderFrequency::Pixel {
            match mode {
                WorldPositionMode::Default => "Parameters.WorldPosition",
                WorldPositionMode::ExcludeAllShaderOffsets => {
                    self.usage.needs_world_position_excluding_shader_offsets = true;
                    "Parameters.WorldPosition_NoOffsets"
                }
                WorldPositionMode::CameraRelative => "Parameters.WorldPosition_CamRelative",
                WorldPositionMode::CameraRelativeExcludeOffsets => {
                    self.usage.needs_world_position_excluding_shader_offsets = true;
                    "Parameters.WorldPosition_NoOffsets_CamRelative"
                }
            }
        } else if self.compiling_previous_frame && self.stage == ShaderFrequency::Vertex {
            "Parameters.PrevWorldPosition"
        } else {
            "Parameters.WorldPosition"
        };
        self.add_inlined_code_chunk(ValueType::FLOAT3, code.to_string())
    }

    fn derivative(&mut self, code: Code, func: &str) -> Code {
        if !self.feature_level_supported(FeatureLevel::Es31) {
            return None;
        }
        let x = code?;
        if self.stage == ShaderFrequency::Compute {
            // No derivatives in compute shaders.
            return self.add_inlined_code_chunk(ValueType::FLOAT, "0".to_string());
        }
        if self.stage != ShaderFrequency::Pixel {
            return self.non_pixel_shader_expression_error();
        }
        let ty = self.chunk(x).ty;
        let c = self.parameter_code(x);
        self.add_code_chunk(ty, format!("{func}({c})"))
    }

    fn atmospheric_fog_color(&mut self, world_position: Code) -> Code {
        if !self.feature_level_supported(FeatureLevel::Sm4) {
            return None;
        }
        self.usage.uses_atmospheric_fog = true;
        let position = match world_position {
            Some(p) => self.coerce_parameter(p, ValueType::FLOAT3),
            None => "Parameters.WorldPosition".to_string(),
        };
        self.add_code_chunk(
            ValueType::FLOAT4,
            format!("MaterialExpressionAtmosphericFog(Parameters, {position})"),
        )
    }

    fn collection_parameter(&mut self, collection: Option<&str>, parameter_name: &str) -> Code {
        let graph = self.graph;
        let def = &graph.def;
        let Some(index) =
            collection.and_then(|name| def.parameter_collections.iter().position(|c| c.name == name))
        else {
            return self.error("CollectionParameter has invalid Collection!");
        };
        let Some((vector, component)) = def.parameter_collections[index].parameter_index(parameter_name)
        else {
            return self.error(format!(
                "CollectionParameter has invalid parameter {parameter_name}"
            ));
        };

        let slot = match self.parameter_collections.iter().position(|&c| c == index) {
            Some(slot) => slot,
            None => {
                if self.parameter_collections.len() >= super::MAX_PARAMETER_COLLECTIONS {
                    return self.error(
                        "Material references too many MaterialParameterCollections!  A material may only reference 2 different collections.",
                    );
                }
                self.parameter_collections.push(index);
                self.parameter_collections.len() - 1
            }
        };

        let vector_code =
            self.add_code_chunk(ValueType::FLOAT4, format!("MaterialCollection{slot}.Vectors[{vector}]"));
        match component {
            None => self.component_mask(vector_code, true, true, true, true),
            Some(c) => self.component_mask(vector_code, c == 0, c == 1, c == 2, c == 3),
        }
    }
}

fn is_scalar(ty: ValueType) -> bool {
    ty == ValueType::FLOAT || ty == ValueType::FLOAT1
}
