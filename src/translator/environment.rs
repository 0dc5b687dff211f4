//! Shader compiler environment of a translated material.

use super::HlslTranslator;
use crate::types::MaterialProperty;
use serde::{Deserialize, Serialize};

/// One `#define` handed to the shader compiler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderDefine {
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub value: String,
}

/// Uniform buffer backing one referenced parameter collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformBufferDeclaration {
    /// Shader-side name, `MaterialCollection<i>`.
    pub name: String,
    /// Collection asset name.
    pub collection: String,
    /// Number of float4 slots.
    pub num_vectors: u32,
    /// HLSL declaring the buffer.
    pub declaration: String,
}

/// Defines and uniform buffers a material's shaders compile with, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderEnvironment {
    #[allow(missing_docs)]
    pub defines: Vec<ShaderDefine>,
    #[allow(missing_docs)]
    pub uniform_buffers: Vec<UniformBufferDeclaration>,
}

impl ShaderEnvironment {
    /// Value of the define `name`, if set.
    pub fn define(&self, name: &str) -> Option<&str> {
        self.defines
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    fn set(&mut self, name: &str, value: bool) {
        self.defines.push(ShaderDefine {
            name: name.to_string(),
            value: if value { "1" } else { "0" }.to_string(),
        });
    }

    fn set_if(&mut self, name: &str, condition: bool) {
        if condition {
            self.set(name, true);
        }
    }
}

fn uniform_buffer_declaration(name: &str, num_vectors: u32) -> String {
    let count = num_vectors.max(1);
    format!(
        "cbuffer {name}\r\n{{\r\n\tfloat4 {name}_Vectors[{count}];\r\n}}\r\nstatic const struct\r\n{{\r\n\tfloat4 Vectors[{count}];\r\n}} {name} = {{ {name}_Vectors }};\r\n"
    )
}

impl HlslTranslator<'_> {
    /// Defines derived from what the compiled code uses, followed by one uniform buffer per
    /// referenced parameter collection.
    pub fn shader_environment(&self) -> ShaderEnvironment {
        let def = &self.graph.def;
        let usage = &self.usage;
        let mut env = ShaderEnvironment::default();

        env.set_if(
            "NEEDS_PARTICLE_POSITION",
            usage.needs_particle_position
                || def.generate_spherical_particle_normals
                || usage.uses_spherical_particle_opacity,
        );
        env.set_if("NEEDS_PARTICLE_VELOCITY", usage.needs_particle_velocity);
        env.set_if("USE_DYNAMIC_PARAMETERS", usage.needs_particle_dynamic_parameter);
        env.set_if("NEEDS_PARTICLE_TIME", usage.needs_particle_time);
        env.set_if("USES_PARTICLE_MOTION_BLUR", usage.uses_particle_motion_blur);
        env.set_if("SPHERICAL_PARTICLE_OPACITY", usage.uses_spherical_particle_opacity);
        env.set_if("USE_PARTICLE_SUBUVS", usage.uses_particle_sub_uvs);
        env.set_if("USE_PARTICLE_TRANSFORM", usage.uses_particle_transform);
        env.set_if("LIGHTMAP_UV_ACCESS", usage.uses_lightmap_uvs);
        env.set_if(
            "NEEDS_WORLD_POSITION_EXCLUDING_SHADER_OFFSETS",
            usage.needs_world_position_excluding_shader_offsets,
        );
        env.set_if("NEEDS_PARTICLE_SIZE", usage.needs_particle_size);
        env.set_if("NEEDS_SCENE_TEXTURES", self.output.needs_scene_textures);
        env.set_if("USES_EYE_ADAPTATION", self.output.uses_eye_adaptation);

        env.set("MATERIAL_ATMOSPHERIC_FOG", usage.uses_atmospheric_fog);
        env.set("INTERPOLATE_VERTEX_COLOR", usage.uses_vertex_color);
        env.set("NEEDS_PARTICLE_COLOR", usage.uses_particle_color);
        env.set("USES_TRANSFORM_VECTOR", usage.uses_transform_vector);
        env.set("WANT_PIXEL_DEPTH_OFFSET", self.output.uses_pixel_depth_offset);
        env.set("USES_DISTORTION", self.is_distorted());
        env.set(
            "ENABLE_TRANSLUCENCY_VERTEX_FOG",
            def.use_translucency_vertex_fog,
        );

        for (slot, &index) in self.parameter_collections.iter().enumerate() {
            let collection = &def.parameter_collections[index];
            let num_vectors = collection.scalars.len().div_ceil(4) + collection.vectors.len();
            let name = format!("MaterialCollection{slot}");
            env.uniform_buffers.push(UniformBufferDeclaration {
                declaration: uniform_buffer_declaration(&name, num_vectors as u32),
                name,
                collection: collection.name.clone(),
                num_vectors: num_vectors as u32,
            });
        }
        env
    }

    /// Translucent materials with a connected refraction input.
    fn is_distorted(&self) -> bool {
        let def = &self.graph.def;
        let refraction = if def.use_material_attributes {
            MaterialProperty::MaterialAttributes
        } else {
            MaterialProperty::Refraction
        };
        def.blend_mode.is_translucent() && def.inputs.contains_key(&refraction)
    }
}
