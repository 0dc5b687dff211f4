//! HLSL translation of a normalized material graph.
//!
//! [`HlslTranslator`] walks the graph once per material property, emitting code chunks into a
//! per-(property, stage) scope and collecting uniform expressions into a single
//! [`UniformExpressionSet`]. Errors never abort a translation: they accumulate and the walk
//! continues with `None` standing in for the failed chunk.

mod compiler;
mod custom;
mod environment;
mod nodes;
mod texture;
mod transform;
mod validate;

pub use environment::{ShaderDefine, ShaderEnvironment, UniformBufferDeclaration};

use crate::chunk::{ChunkScopes, FixedCode, Scope, ShaderCodeChunk, fixed_parameter_code};
use crate::foundation::error::{MaterialError, MaterialResult};
use crate::foundation::ids::{Code, NodeIdx};
use crate::foundation::math::LinearColor;
use crate::graph::model::{MaterialDomain, PropertyInput};
use crate::graph::normalize::MaterialGraph;
use crate::options::TranslatorOptions;
use crate::output::{MaterialCompilationOutput, TranslatedMaterial};
use crate::template::MaterialTemplate;
use crate::types::{FeatureLevel, MaterialProperty, ShaderFrequency, ValueType};
use crate::uniform::eval::RenderContext;
use std::collections::{BTreeMap, HashMap};

/// Memoization key of one node output compile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ExpressionKey {
    pub(crate) node: NodeIdx,
    pub(crate) output: u32,
    /// Property a material attributes bundle is being split for.
    pub(crate) multiplex: Option<MaterialProperty>,
}

/// Compile state of one material function call (the root frame has no call).
#[derive(Debug, Default)]
pub(crate) struct FunctionFrame {
    pub(crate) call: Option<NodeIdx>,
    pub(crate) expression_stack: Vec<ExpressionKey>,
    pub(crate) code_map: HashMap<ExpressionKey, Code>,
}

impl FunctionFrame {
    fn call(node: NodeIdx) -> Self {
        Self {
            call: Some(node),
            ..Self::default()
        }
    }
}

/// Usage collected while compiling; feeds validation, the environment and the output flags.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Usage {
    pub(crate) uses_scene_color: bool,
    pub(crate) needs_scene_texture_post_process_inputs: bool,
    pub(crate) uses_vertex_color: bool,
    pub(crate) uses_particle_color: bool,
    pub(crate) uses_transform_vector: bool,
    pub(crate) uses_atmospheric_fog: bool,
    pub(crate) needs_particle_position: bool,
    pub(crate) needs_particle_velocity: bool,
    pub(crate) needs_particle_dynamic_parameter: bool,
    pub(crate) needs_particle_time: bool,
    pub(crate) uses_particle_motion_blur: bool,
    pub(crate) needs_particle_size: bool,
    pub(crate) uses_spherical_particle_opacity: bool,
    pub(crate) uses_particle_sub_uvs: bool,
    pub(crate) uses_lightmap_uvs: bool,
    pub(crate) needs_world_position_excluding_shader_offsets: bool,
    pub(crate) uses_particle_transform: bool,
}

/// Translates one material graph into HLSL.
///
/// Single use: construct, call [`Self::translate`], then read the code, the environment and
/// the compilation output. The instance is not reentrant; translate materials in parallel by
/// giving each its own translator.
pub struct HlslTranslator<'a> {
    graph: &'a MaterialGraph,
    options: &'a TranslatorOptions,

    material_property: Option<MaterialProperty>,
    stage: ShaderFrequency,
    scope: Scope,
    scopes: ChunkScopes,
    function_stack: Vec<FunctionFrame>,
    compiling_previous_frame: bool,

    /// Every uniform chunk emitted so far, across all scopes.
    uniform_expressions: Vec<ShaderCodeChunk>,
    output: MaterialCompilationOutput,
    /// Indices into the material's parameter collections, in `MaterialCollection<i>` order.
    parameter_collections: Vec<usize>,
    next_symbol: u32,
    custom_expression_implementations: Vec<String>,
    custom_output_defines: String,
    custom_output_implementations: Vec<String>,

    errors: Vec<String>,
    success: bool,
    translated: bool,
    usage: Usage,
    num_user_vertex_tex_coords: u32,
    num_user_tex_coords: u32,

    results: [Code; MaterialProperty::COUNT],
    emissive_cs: Code,
    prev_world_position_offset: Code,
    fixed: Vec<FixedCode>,
    fixed_emissive_cs: FixedCode,
    fixed_prev_world_position_offset: FixedCode,
    resources: String,
}

const MAX_PARAMETER_COLLECTIONS: usize = 2;

const PROPERTY_ORDER: [MaterialProperty; 10] = [
    MaterialProperty::EmissiveColor,
    MaterialProperty::DiffuseColor,
    MaterialProperty::SpecularColor,
    MaterialProperty::BaseColor,
    MaterialProperty::Metallic,
    MaterialProperty::Specular,
    MaterialProperty::Roughness,
    MaterialProperty::Opacity,
    MaterialProperty::OpacityMask,
    MaterialProperty::WorldPositionOffset,
];

impl<'a> HlslTranslator<'a> {
    /// Fresh translator for `graph`.
    pub fn new(graph: &'a MaterialGraph, options: &'a TranslatorOptions) -> Self {
        Self {
            graph,
            options,
            material_property: None,
            stage: ShaderFrequency::Pixel,
            scope: Scope::CustomOutput,
            scopes: ChunkScopes::default(),
            function_stack: vec![FunctionFrame::default()],
            compiling_previous_frame: false,
            uniform_expressions: Vec::new(),
            output: MaterialCompilationOutput::default(),
            parameter_collections: Vec::new(),
            next_symbol: 0,
            custom_expression_implementations: Vec::new(),
            custom_output_defines: String::new(),
            custom_output_implementations: Vec::new(),
            errors: Vec::new(),
            success: true,
            translated: false,
            usage: Usage::default(),
            num_user_vertex_tex_coords: 0,
            num_user_tex_coords: 0,
            results: [None; MaterialProperty::COUNT],
            emissive_cs: None,
            prev_world_position_offset: None,
            fixed: vec![FixedCode::default(); MaterialProperty::COUNT],
            fixed_emissive_cs: FixedCode::default(),
            fixed_prev_world_position_offset: FixedCode::default(),
            resources: String::new(),
        }
    }

    /// Compile every property, validate the material and prepare the final code pieces.
    ///
    /// Returns the success flag; errors are available from [`Self::errors`] either way.
    #[tracing::instrument(skip_all, fields(material = %self.graph.def.name))]
    pub fn translate(&mut self) -> bool {
        use MaterialProperty as P;
        let def = &self.graph.def;

        // Normal goes first; later pixel properties may read the pixel normal.
        self.compile_and_store(P::Normal);
        for p in PROPERTY_ORDER {
            self.compile_and_store(p);
        }
        if self.options.feature_level >= FeatureLevel::Sm5 {
            self.compile_and_store(P::WorldDisplacement);
        } else {
            self.set_material_property(P::WorldDisplacement, None, false);
            self.results[P::WorldDisplacement.index()] = self.constant3(0.0, 0.0, 0.0);
        }
        self.compile_and_store(P::TessellationMultiplier);

        if def.domain == MaterialDomain::Surface && def.shading_model.uses_subsurface_color() {
            let color = self.compile_property(P::SubsurfaceColor, None, false);
            let color = self.force_cast(color, ValueType::FLOAT3, true, true);
            let profile = self.scalar_parameter("__SubsurfaceProfile", 1.0);
            let profile = self.force_cast(profile, ValueType::FLOAT1, false, false);
            self.results[P::SubsurfaceColor.index()] = self.append_vector(color, profile);
        }

        self.compile_and_store(P::CustomData0);
        self.compile_and_store(P::CustomData1);
        self.compile_and_store(P::AmbientOcclusion);

        if def.blend_mode.is_translucent() {
            let user = self.compile_property(P::Refraction, None, false);
            let user = self.force_cast(user, ValueType::FLOAT2, false, false);
            let bias = self.scalar_parameter("RefractionDepthBias", def.refraction_depth_bias);
            let bias = self.force_cast(bias, ValueType::FLOAT1, false, false);
            let user = self.force_cast(user, ValueType::FLOAT1, false, false);
            self.results[P::Refraction.index()] = self.append_vector(user, bias);
        }

        if self.options.compile_for_compute_shader {
            self.emissive_cs =
                self.compile_property(P::EmissiveColor, Some(ShaderFrequency::Compute), false);
        }

        if self.results[P::WorldPositionOffset.index()].is_some() {
            self.prev_world_position_offset = self.compile_property(
                P::WorldPositionOffset,
                Some(ShaderFrequency::Vertex),
                true,
            );
        }

        self.compile_and_store(P::PixelDepthOffset);

        // Only the UV channels the pixel properties asked for get customized.
        let saved_num_user_tex_coords = self.num_user_tex_coords;
        for i in 0..saved_num_user_tex_coords {
            if let Some(p) = MaterialProperty::customized_uv(i) {
                self.compile_and_store(p);
            }
        }

        self.settle_results();

        let uses_pixel_depth_offset = self.is_property_used(P::PixelDepthOffset, 1);
        let uses_world_position_offset = self.is_property_used(P::WorldPositionOffset, 3);
        self.output.uses_pixel_depth_offset = uses_pixel_depth_offset;
        self.output.modifies_mesh_position = uses_pixel_depth_offset || uses_world_position_offset;

        self.validate_material();
        self.gather_custom_outputs();
        self.build_fixed_code();
        self.build_resources();

        let names = self
            .parameter_collections
            .iter()
            .map(|&i| def.parameter_collections[i].name.clone())
            .collect();
        self.output.uniform_expression_set.set_parameter_collections(names);
        self.output.uniform_expression_set.create_buffer_struct();

        self.translated = true;
        tracing::debug!(
            success = self.success,
            errors = self.errors.len(),
            uniforms = %self.output.uniform_expression_set.summary_string(),
            "translated material"
        );
        self.success
    }

    /// False once any compile error was recorded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Compile errors in the order they were first reported, without duplicates.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Flags and uniform expressions of the translation.
    pub fn compilation_output(&self) -> &MaterialCompilationOutput {
        &self.output
    }

    /// Consume the translator, keeping the compilation output.
    pub fn into_output(self) -> MaterialCompilationOutput {
        self.output
    }

    /// Number of texture coordinate sets read by the pixel properties.
    pub fn num_user_tex_coords(&self) -> u32 {
        self.num_user_tex_coords
    }

    /// Number of texture coordinate sets read by the vertex properties.
    pub fn num_user_vertex_tex_coords(&self) -> u32 {
        self.num_user_vertex_tex_coords
    }

    /// Fill `template` with the translated code.
    pub fn material_shader_code(&self, template: &MaterialTemplate) -> MaterialResult<String> {
        if !self.translated {
            return Err(MaterialError::translation(
                "material shader code requested before translation",
            ));
        }
        if !self.success {
            return Err(MaterialError::translation(self.errors.join("\n")));
        }
        template.render(&self.slot_values(template))
    }

    fn slot_values(&self, template: &MaterialTemplate) -> BTreeMap<&'static str, String> {
        use MaterialProperty as P;
        let def = &self.graph.def;
        let body = |p: MaterialProperty| self.fixed[p.index()].function_body();
        let setting = |v: f32| format!("return {v:.5}");

        let mut slots = BTreeMap::new();
        slots.insert(
            "num_user_vertex_tex_coords",
            self.num_user_vertex_tex_coords.to_string(),
        );
        slots.insert("num_user_tex_coords", self.num_user_tex_coords.to_string());
        slots.insert("resources", self.resources.clone());
        slots.insert("normal", body(P::Normal));
        slots.insert("emissive_color", body(P::EmissiveColor));
        slots.insert(
            "emissive_color_cs",
            if self.options.compile_for_compute_shader {
                self.fixed_emissive_cs.function_body()
            } else {
                "return 0".to_string()
            },
        );
        slots.insert("base_color", body(P::BaseColor));
        slots.insert("metallic", body(P::Metallic));
        slots.insert("specular", body(P::Specular));
        slots.insert("roughness", body(P::Roughness));
        slots.insert(
            "translucency_directional_lighting_intensity",
            setting(def.translucency_directional_lighting_intensity),
        );
        slots.insert(
            "translucent_shadow_density_scale",
            setting(def.translucent_shadow_density_scale),
        );
        slots.insert(
            "translucent_self_shadow_density_scale",
            setting(def.translucent_self_shadow_density_scale),
        );
        slots.insert(
            "translucent_self_shadow_second_density_scale",
            setting(def.translucent_self_shadow_second_density_scale),
        );
        slots.insert(
            "translucent_self_shadow_second_opacity",
            setting(def.translucent_self_shadow_second_opacity),
        );
        slots.insert(
            "translucent_backscattering_exponent",
            setting(def.translucent_backscattering_exponent),
        );
        let [r, g, b] = def.translucent_multiple_scattering_extinction;
        slots.insert(
            "translucent_multiple_scattering_extinction",
            format!("return MaterialFloat3({r:.5}, {g:.5}, {b:.5})"),
        );
        slots.insert(
            "opacity_mask_clip_value",
            setting(def.opacity_mask_clip_value),
        );
        slots.insert("opacity", body(P::Opacity));
        slots.insert("opacity_mask", body(P::OpacityMask));
        slots.insert("world_position_offset", body(P::WorldPositionOffset));
        slots.insert(
            "prev_world_position_offset",
            self.fixed_prev_world_position_offset.function_body(),
        );
        slots.insert("world_displacement", body(P::WorldDisplacement));
        slots.insert("max_displacement", setting(def.max_displacement));
        slots.insert("tessellation_multiplier", body(P::TessellationMultiplier));
        slots.insert("subsurface_color", body(P::SubsurfaceColor));
        slots.insert("custom_data0", body(P::CustomData0));
        slots.insert("custom_data1", body(P::CustomData1));
        slots.insert("ambient_occlusion", body(P::AmbientOcclusion));
        slots.insert("refraction", body(P::Refraction));

        let mut uvs = String::new();
        for i in 0..self.num_user_tex_coords {
            if let Some(p) = MaterialProperty::customized_uv(i) {
                let fixed = &self.fixed[p.index()];
                uvs.push_str(&format!(
                    "{}\tOutTexCoords[{i}] = {};\r\n",
                    fixed.definitions, fixed.value
                ));
            }
        }
        slots.insert("customized_uvs", uvs);
        slots.insert("pixel_depth_offset", body(P::PixelDepthOffset));
        slots.insert("line_number", template.line_number().to_string());
        slots
    }

    /// Switch the active property (and stage) and start a fresh function stack.
    pub(crate) fn set_material_property(
        &mut self,
        property: MaterialProperty,
        stage: Option<ShaderFrequency>,
        previous_frame: bool,
    ) {
        self.material_property = Some(property);
        self.stage = stage.unwrap_or_else(|| property.frequency());
        self.compiling_previous_frame = previous_frame;
        self.scope = Scope::Property(property, self.stage);
        self.function_stack.clear();
        self.function_stack.push(FunctionFrame::default());
    }

    fn compile_and_store(&mut self, property: MaterialProperty) {
        self.results[property.index()] = self.compile_property(property, None, false);
    }

    fn compile_property(
        &mut self,
        property: MaterialProperty,
        stage: Option<ShaderFrequency>,
        previous_frame: bool,
    ) -> Code {
        self.set_material_property(property, stage, previous_frame);
        let code = self.compile_property_input(property);
        tracing::debug!(
            property = %property.name(),
            stage = ?self.stage,
            chunks = self.chunks().len(),
            "compiled material property"
        );
        if property == MaterialProperty::MaterialAttributes {
            return code;
        }
        self.force_cast(code, property.value_type(), false, true)
    }

    fn compile_property_input(&mut self, property: MaterialProperty) -> Code {
        let graph = self.graph;
        let def = &graph.def;
        if def.use_material_attributes {
            return match def.inputs.get(&MaterialProperty::MaterialAttributes) {
                Some(PropertyInput::Expression(input)) => {
                    let code = self.compile_input(input, Some(property));
                    let is_attributes = input
                        .target
                        .is_some_and(|t| graph.is_result_material_attributes(t, input.output));
                    if code.is_some() && !is_attributes {
                        self.error(
                            "Cannot connect a non MaterialAttributes node to a MaterialAttributes pin.",
                        );
                    }
                    // Unconnected attribute pins fall back to the property default.
                    match code {
                        Some(_) => code,
                        None => self.property_default(property),
                    }
                }
                _ => self.property_default(property),
            };
        }

        match def.inputs.get(&property) {
            Some(PropertyInput::Expression(input)) => self.compile_input(input, None),
            Some(PropertyInput::Constant { constant }) => {
                let c = |i: usize| constant.get(i).copied().unwrap_or(0.0);
                match property.value_type().num_components() {
                    1 => self.constant(c(0)),
                    2 => self.constant2(c(0), c(1)),
                    3 => self.constant3(c(0), c(1), c(2)),
                    _ => self.constant4(c(0), c(1), c(2), c(3)),
                }
            }
            None => self.property_default(property),
        }
    }

    /// Value an unconnected property compiles to.
    pub(crate) fn property_default(&mut self, property: MaterialProperty) -> Code {
        use MaterialProperty as P;
        if let Some(i) = property.customized_uv_index() {
            return self.texture_coordinate(i, false, false);
        }
        match property {
            P::Opacity
            | P::OpacityMask
            | P::TessellationMultiplier
            | P::CustomData0
            | P::AmbientOcclusion => self.constant(1.0),
            P::Metallic | P::PixelDepthOffset => self.constant(0.0),
            P::Specular | P::Roughness => self.constant(0.5),
            P::CustomData1 => self.constant(0.1),
            P::EmissiveColor
            | P::DiffuseColor
            | P::SpecularColor
            | P::BaseColor
            | P::WorldPositionOffset
            | P::WorldDisplacement => self.constant3(0.0, 0.0, 0.0),
            P::SubsurfaceColor => self.constant3(1.0, 1.0, 1.0),
            P::Normal => self.constant3(0.0, 0.0, 1.0),
            P::Refraction => self.constant2(1.0, 0.0),
            _ => None,
        }
    }

    /// Access every non-constant uniform result in its own scope, so the fixed code can read it.
    fn settle_results(&mut self) {
        for p in MaterialProperty::ALL {
            if p == MaterialProperty::MaterialAttributes {
                continue;
            }
            self.set_material_property(p, None, false);
            self.results[p.index()] = self.settle(self.results[p.index()]);
        }
        if self.emissive_cs.is_some() {
            self.set_material_property(
                MaterialProperty::EmissiveColor,
                Some(ShaderFrequency::Compute),
                false,
            );
            self.emissive_cs = self.settle(self.emissive_cs);
        }
        if self.prev_world_position_offset.is_some() {
            self.set_material_property(
                MaterialProperty::WorldPositionOffset,
                Some(ShaderFrequency::Vertex),
                true,
            );
            self.prev_world_position_offset = self.settle(self.prev_world_position_offset);
        }
    }

    fn settle(&mut self, code: Code) -> Code {
        let idx = code?;
        if self.is_non_constant_uniform(idx) {
            self.access_uniform_expression(idx)
        } else {
            Some(idx)
        }
    }

    /// False when the property result is a constant equal to zero in its first components.
    fn is_property_used(&self, property: MaterialProperty, num_components: usize) -> bool {
        let Some(idx) = self.results[property.index()] else {
            return false;
        };
        let scope = Scope::Property(property, property.frequency());
        let Some(chunk) = self.scopes.get(scope).get(idx.index()) else {
            return false;
        };
        let arena = self.output.uniform_expression_set.arena();
        match chunk.uniform {
            Some(id) if arena.is_constant(id) => {
                let ctx = RenderContext::new(0.0, 0.0, &[]);
                let value = arena.number_value(id, &ctx);
                let zero = LinearColor::BLACK;
                (0..num_components).any(|i| value.get(i) != zero.get(i))
            }
            _ => true,
        }
    }

    fn build_fixed_code(&mut self) {
        let arena = self.output.uniform_expression_set.arena();
        let is_constant = |id| arena.is_constant(id);
        for p in MaterialProperty::ALL {
            if p == MaterialProperty::MaterialAttributes {
                continue;
            }
            let chunks = self.scopes.get(Scope::Property(p, p.frequency()));
            self.fixed[p.index()] = fixed_parameter_code(self.results[p.index()], chunks, is_constant);
        }
        if self.options.compile_for_compute_shader {
            let chunks = self.scopes.get(Scope::Property(
                MaterialProperty::EmissiveColor,
                ShaderFrequency::Compute,
            ));
            self.fixed_emissive_cs = fixed_parameter_code(self.emissive_cs, chunks, is_constant);
        }
        let chunks = self.scopes.get(Scope::Property(
            MaterialProperty::WorldPositionOffset,
            ShaderFrequency::Vertex,
        ));
        self.fixed_prev_world_position_offset =
            fixed_parameter_code(self.prev_world_position_offset, chunks, is_constant);
    }

    fn build_resources(&mut self) {
        let mut resources = String::new();
        for implementation in &self.custom_expression_implementations {
            resources.push_str(implementation);
            resources.push_str("\r\n\r\n");
        }

        let set = &self.output.uniform_expression_set;
        let per_frame = [
            ("float", "PerFrameScalar", set.per_frame_scalar_expressions().len()),
            ("float4", "PerFrameVector", set.per_frame_vector_expressions().len()),
            ("float", "PerFramePrevScalar", set.per_frame_prev_scalar_expressions().len()),
            ("float4", "PerFramePrevVector", set.per_frame_prev_vector_expressions().len()),
        ];
        for (ty, kind, count) in per_frame {
            for i in 0..count {
                resources.push_str(&format!("{ty} UE_Material_{kind}Expression{i};\r\n\r\n"));
            }
        }

        resources.push_str(&self.custom_output_defines);
        for implementation in &self.custom_output_implementations {
            resources.push_str(implementation);
            resources.push_str("\r\n\r\n");
        }
        self.resources = resources;
    }
}

/// Normalize nothing further: translate `graph` and fill `template`.
///
/// Fails with [`MaterialError::Translation`] carrying every compile error, one per line.
pub fn translate(
    graph: &MaterialGraph,
    options: &TranslatorOptions,
    template: &MaterialTemplate,
) -> MaterialResult<TranslatedMaterial> {
    let mut translator = HlslTranslator::new(graph, options);
    if !translator.translate() {
        return Err(MaterialError::translation(translator.errors().join("\n")));
    }
    let shader_code = translator.material_shader_code(template)?;
    let environment = translator.shader_environment();
    Ok(TranslatedMaterial {
        name: graph.def.name.clone(),
        shader_code,
        environment,
        output: translator.into_output(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/translator/mod.rs"]
mod tests;
