//! Vector and position transforms between coordinate spaces.
//!
//! Each space pair with a closed-form HLSL expression is a direct edge. Any other pair goes
//! through World (from Tangent, Local and TranslatedWorld) or TranslatedWorld (from World,
//! Camera and View). MeshParticle only transforms to World.

use super::HlslTranslator;
use crate::foundation::ids::{ChunkIdx, Code};
use crate::graph::model::{CoordSpace, MaterialDomain};
use crate::types::{ShaderFrequency, ValueType};

/// What is transformed: directions ignore translation, positions do not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operand {
    Vector,
    Position,
}

impl HlslTranslator<'_> {
    pub(crate) fn transform_vector(
        &mut self,
        code: Code,
        source: CoordSpace,
        destination: CoordSpace,
    ) -> Code {
        if !self.is_vertex_pixel_or_compute() && self.stage != ShaderFrequency::Domain {
            return self.non_pixel_shader_expression_error();
        }
        let mut code = code?;
        // A scalar tangent input is a height: float3(0, 0, x).
        if source == CoordSpace::Tangent && self.chunk(code).ty.intersects(ValueType::FLOAT1) {
            let zero = self.constant2(0.0, 0.0);
            code = self.append_vector(zero, Some(code))?;
        }
        if self.stage != ShaderFrequency::Vertex {
            self.usage.uses_transform_vector = true;
        }
        self.transform_operand(code, source, destination, Operand::Vector)
    }

    pub(crate) fn transform_position(
        &mut self,
        code: Code,
        source: CoordSpace,
        destination: CoordSpace,
    ) -> Code {
        if !self.is_vertex_pixel_or_compute() && self.stage != ShaderFrequency::Domain {
            return self.non_pixel_shader_expression_error();
        }
        let code = code?;
        if source == CoordSpace::Tangent || destination == CoordSpace::Tangent {
            return self.error("Positions cannot be transformed to or from tangent space");
        }
        self.transform_operand(code, source, destination, Operand::Position)
    }

    fn transform_operand(
        &mut self,
        code: ChunkIdx,
        source: CoordSpace,
        destination: CoordSpace,
        operand: Operand,
    ) -> Code {
        let ty = self.chunk(code).ty;
        if ty.num_components() < 3 {
            let parameter = self.parameter_code(code);
            return self.error(format!(
                "input must be a vector ({parameter}: {}) or a scalar (if source is Tangent)",
                ty.describe()
            ));
        }
        let local_or_tangent = |s| matches!(s, CoordSpace::Local | CoordSpace::Tangent);
        if !matches!(
            self.graph.def.domain,
            MaterialDomain::Surface | MaterialDomain::DeferredDecal
        ) && (local_or_tangent(source) || local_or_tangent(destination))
        {
            return self.error(
                "Local and tangent transforms are only supported in the Surface and Deferred Decal material domains!",
            );
        }
        self.transform_base(Some(code), source, destination, operand)
    }

    fn transform_base(
        &mut self,
        code: Code,
        source: CoordSpace,
        destination: CoordSpace,
        operand: Operand,
    ) -> Code {
        let code = code?;
        if source == destination {
            return Some(code);
        }
        if destination == CoordSpace::MeshParticle {
            return self.error("Can transform only to world space from particle space");
        }

        let position = operand == Operand::Position;
        let mut intermediary = CoordSpace::World;
        let template: Option<&str> = match source {
            CoordSpace::Tangent => match destination {
                CoordSpace::World if self.stage == ShaderFrequency::Domain => {
                    Some("TransformTangentVectorToWorld_PreScaled(Parameters, <A>)")
                }
                CoordSpace::World => Some("mul(<A>, <MATRIX>(Parameters.TangentToWorld))"),
                _ => None,
            },
            CoordSpace::Local => match destination {
                CoordSpace::World if self.compiling_previous_frame => {
                    Some("TransformPreviousLocal<TO>World(Parameters, <A>.xyz)")
                }
                CoordSpace::World => Some("TransformLocal<TO>World(Parameters, <A>.xyz)"),
                _ => None,
            },
            CoordSpace::TranslatedWorld => match destination {
                CoordSpace::World if position => {
                    Some("(<A>.xyz - ResolvedView.PreViewTranslation.xyz)")
                }
                CoordSpace::World => Some("<A>"),
                CoordSpace::Camera => {
                    Some("mul(<A>, <MATRIX>(ResolvedView.TranslatedWorldToCameraView))")
                }
                CoordSpace::View => Some("mul(<A>, <MATRIX>(ResolvedView.TranslatedWorldToView))"),
                _ => None,
            },
            CoordSpace::World => {
                intermediary = CoordSpace::TranslatedWorld;
                match destination {
                    CoordSpace::Tangent => Some("mul(Parameters.TangentToWorld, <A>)"),
                    CoordSpace::Local => {
                        if !self.is_vertex_pixel_or_compute() {
                            return self.error("Local space in only supported for vertex or pixel shader!");
                        }
                        Some("mul(<A>, <MATRIX>(Primitive.WorldToLocal))")
                    }
                    CoordSpace::TranslatedWorld if position => {
                        Some("(<A>.xyz + ResolvedView.PreViewTranslation.xyz)")
                    }
                    CoordSpace::TranslatedWorld => Some("<A>"),
                    _ => None,
                }
            }
            CoordSpace::Camera => {
                intermediary = CoordSpace::TranslatedWorld;
                match destination {
                    CoordSpace::TranslatedWorld => {
                        Some("mul(<A>, <MATRIX>(ResolvedView.CameraViewToTranslatedWorld))")
                    }
                    _ => None,
                }
            }
            CoordSpace::View => {
                intermediary = CoordSpace::TranslatedWorld;
                match destination {
                    CoordSpace::TranslatedWorld => {
                        Some("mul(<A>, <MATRIX>(ResolvedView.ViewToTranslatedWorld))")
                    }
                    _ => None,
                }
            }
            CoordSpace::MeshParticle => match destination {
                CoordSpace::World => {
                    self.usage.uses_particle_transform = true;
                    Some("mul(<A>, <MATRIX>(Parameters.Particle.LocalToWorld))")
                }
                _ => return self.error("Can transform only to world space from particle space"),
            },
        };

        let Some(template) = template else {
            debug_assert!(intermediary != source && intermediary != destination);
            let step = self.transform_base(Some(code), source, intermediary, operand);
            return self.transform_base(step, intermediary, destination, operand);
        };

        let parameter = self.coerce_parameter(code, ValueType::FLOAT3);
        let hlsl = if position {
            template
                .replace("<TO>", "PositionTo")
                .replace("<MATRIX>", "")
                .replace("<A>", &format!("MaterialFloat4({parameter}, 1)"))
        } else {
            template
                .replace("<TO>", "VectorTo")
                .replace("<MATRIX>", "(MaterialFloat3x3)")
                .replace("<A>", &parameter)
        };
        let hlsl = if self.compiling_previous_frame {
            hlsl.replace("ResolvedView.", "ResolvedView.Prev")
        } else {
            hlsl
        };
        let hlsl = if position && hlsl.starts_with("mul(") {
            format!("{hlsl}.xyz")
        } else {
            hlsl
        };
        self.add_code_chunk(ValueType::FLOAT3, hlsl)
    }
}
