//! Domain, blend mode and project setting checks run once every property is compiled.

use super::HlslTranslator;
use crate::graph::model::{BlendMode, MaterialDomain, ShadingModel};

impl HlslTranslator<'_> {
    /// Record an error for every rule the compiled material breaks. Compilation carries on.
    pub(crate) fn validate_material(&mut self) {
        let def = &self.graph.def;
        let (domain, blend, shading) = (def.domain, def.blend_mode, def.shading_model);
        let mut errors: Vec<&'static str> = Vec::new();

        if blend == BlendMode::Modulate
            && shading != ShadingModel::Unlit
            && domain != MaterialDomain::DeferredDecal
        {
            errors.push("Dynamically lit translucency is not supported for BLEND_Modulate materials.");
        }
        if domain == MaterialDomain::Surface
            && blend == BlendMode::Modulate
            && def.separate_translucency
        {
            errors.push(
                "Separate translucency with BLEND_Modulate is not supported. Consider using BLEND_Translucent with black emissive",
            );
        }

        if self.output.uses_scene_depth
            && domain != MaterialDomain::PostProcess
            && !blend.is_translucent()
        {
            errors.push("Only transparent or postprocess materials can read from scene depth.");
        }

        if self.usage.uses_scene_color {
            if domain != MaterialDomain::Surface {
                errors.push("Only 'surface' material domain can use the scene color node.");
            } else if !blend.is_translucent() {
                errors.push("Only translucent materials can use the scene color node.");
            }
        }

        if domain == MaterialDomain::LightFunction && blend != BlendMode::Opaque {
            errors.push("Light function materials must be opaque.");
        }
        if domain == MaterialDomain::LightFunction && shading != ShadingModel::Unlit {
            errors.push("Light function materials must use unlit.");
        }
        if domain == MaterialDomain::PostProcess && shading != ShadingModel::Unlit {
            errors.push("Post process materials must use unlit.");
        }

        if self.output.needs_scene_textures && domain != MaterialDomain::PostProcess {
            if matches!(blend, BlendMode::Opaque | BlendMode::Masked) {
                errors.push("SceneTexture expressions cannot be used in opaque materials");
            } else if self.usage.needs_scene_texture_post_process_inputs {
                errors.push(
                    "SceneTexture expressions cannot use post process inputs or scene color in non post process domain materials",
                );
            }
        }

        if domain == MaterialDomain::DeferredDecal
            && def.decal_blend_mode.is_dbuffer()
            && !self.options.dbuffer_decals
        {
            errors.push(
                "DBuffer decal blend modes are only supported when the 'DBuffer Decals' project setting is enabled.",
            );
        }
        if self.output.needs_gbuffer && self.options.forward_shading {
            errors.push("GBuffer scene textures are not available when the project uses forward shading.");
        }

        for error in errors {
            self.error(error);
        }
    }
}
