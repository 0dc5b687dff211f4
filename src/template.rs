//! Shader template with named `%{slot}` substitution points.

use crate::foundation::error::{MaterialError, MaterialResult};
use std::collections::BTreeMap;
use std::path::Path;

/// Every slot a template may reference, in the order the built-in template uses them.
pub const SLOTS: [&str; 33] = [
    "num_user_vertex_tex_coords",
    "num_user_tex_coords",
    "resources",
    "normal",
    "emissive_color",
    "emissive_color_cs",
    "base_color",
    "metallic",
    "specular",
    "roughness",
    "translucency_directional_lighting_intensity",
    "translucent_shadow_density_scale",
    "translucent_self_shadow_density_scale",
    "translucent_self_shadow_second_density_scale",
    "translucent_self_shadow_second_opacity",
    "translucent_backscattering_exponent",
    "translucent_multiple_scattering_extinction",
    "opacity_mask_clip_value",
    "opacity",
    "opacity_mask",
    "world_position_offset",
    "prev_world_position_offset",
    "world_displacement",
    "max_displacement",
    "tessellation_multiplier",
    "subsurface_color",
    "custom_data0",
    "custom_data1",
    "ambient_occlusion",
    "refraction",
    "customized_uvs",
    "pixel_depth_offset",
    "line_number",
];

const BUILTIN: &str = include_str!("../shaders/MaterialTemplate.ush");

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(&'static str),
}

/// A parsed shader template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterialTemplate {
    segments: Vec<Segment>,
    line_number: u32,
}

impl MaterialTemplate {
    /// Parse template text. Unknown or unterminated slots and a missing `#line` marker are
    /// validation errors.
    pub fn parse(text: &str) -> MaterialResult<Self> {
        let Some(line_index) = text.find("#line") else {
            return Err(MaterialError::validation("template has no '#line' marker"));
        };
        // Newlines before the marker are one less than its line number; the shader compiler
        // wants two more on top.
        let line_number = text[..line_index].matches('\n').count() as u32 + 3;

        let mut segments = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find("%{") {
            if start > 0 {
                segments.push(Segment::Text(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                return Err(MaterialError::validation("unterminated template slot"));
            };
            let name = &after[..end];
            let Some(slot) = SLOTS.iter().find(|s| **s == name) else {
                return Err(MaterialError::validation(format!(
                    "unknown template slot '{name}'"
                )));
            };
            segments.push(Segment::Slot(slot));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }
        Ok(Self {
            segments,
            line_number,
        })
    }

    /// The template shipped with the crate.
    pub fn builtin() -> MaterialResult<Self> {
        Self::parse(BUILTIN)
    }

    /// Read and parse a template file.
    pub fn from_path(path: impl AsRef<Path>) -> MaterialResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MaterialError::validation(format!("read template '{}': {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Source line the shader compiler should attribute to the generated code.
    pub fn line_number(&self) -> u32 {
        self.line_number
    }

    /// Slots referenced by the template, in order of appearance.
    pub fn slots(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(name) => Some(*name),
            Segment::Text(_) => None,
        })
    }

    /// Substitute every slot. A slot without a value is a validation error.
    pub fn render(&self, values: &BTreeMap<&'static str, String>) -> MaterialResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = values.get(name).ok_or_else(|| {
                        MaterialError::validation(format!("template slot '{name}' has no value"))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../tests/unit/template.rs"]
mod tests;
