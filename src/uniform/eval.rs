use crate::foundation::ids::UniformExprId;
use crate::foundation::math::{LinearColor, safe_divisor};
use crate::uniform::expr::{FoldedMathOp, TextureKind, TextureProperty, UniformArena, UniformExpr};
use crate::uniform::overrides::{GameThreadOverrides, RenderThreadOverrides};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A texture as seen by uniform evaluation: enough to bind it and to answer size queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureResource {
    /// Asset name.
    pub name: String,
    /// 2D or cube.
    pub kind: TextureKind,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

/// Per-draw parameter values supplied by the renderer.
pub trait ParameterSource {
    /// Override for a vector parameter.
    fn vector_value(&self, name: &str) -> Option<LinearColor>;
    /// Override for a scalar parameter.
    fn scalar_value(&self, name: &str) -> Option<f32>;
    /// Override for a texture parameter.
    fn texture_value(&self, name: &str) -> Option<Arc<TextureResource>>;
}

/// Source with no overrides: every parameter evaluates to its default.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoParameters;

impl ParameterSource for NoParameters {
    fn vector_value(&self, _name: &str) -> Option<LinearColor> {
        None
    }

    fn scalar_value(&self, _name: &str) -> Option<f32> {
        None
    }

    fn texture_value(&self, _name: &str) -> Option<Arc<TextureResource>> {
        None
    }
}

/// Material instance with parameter overrides, resolved through its parent chain.
#[derive(Clone, Debug, Default)]
pub struct MaterialInstance {
    /// Parent instance consulted when this one does not override a parameter.
    pub parent: Option<Arc<MaterialInstance>>,
    /// Scalar overrides.
    pub scalars: HashMap<String, f32>,
    /// Vector overrides.
    pub vectors: HashMap<String, LinearColor>,
    /// Texture overrides.
    pub textures: HashMap<String, Arc<TextureResource>>,
}

impl MaterialInstance {
    /// Instance without overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Child instance of `parent`.
    pub fn with_parent(parent: Arc<MaterialInstance>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    fn find<T>(&self, get: impl Fn(&MaterialInstance) -> Option<T>) -> Option<T> {
        let mut cur = Some(self);
        while let Some(inst) = cur {
            if let Some(v) = get(inst) {
                return Some(v);
            }
            cur = inst.parent.as_deref();
        }
        None
    }
}

impl ParameterSource for MaterialInstance {
    fn vector_value(&self, name: &str) -> Option<LinearColor> {
        self.find(|i| i.vectors.get(name).copied())
    }

    fn scalar_value(&self, name: &str) -> Option<f32> {
        self.find(|i| i.scalars.get(name).copied())
    }

    fn texture_value(&self, name: &str) -> Option<Arc<TextureResource>> {
        self.find(|i| i.textures.get(name).cloned())
    }
}

/// Everything a render-thread evaluation may read.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    /// Game time in seconds.
    pub time: f32,
    /// Real time in seconds.
    pub real_time: f32,
    /// Per-draw parameter overrides (the render proxy).
    pub parameters: &'a dyn ParameterSource,
    /// Textures the material referenced when it was translated.
    pub referenced_textures: &'a [Arc<TextureResource>],
    /// Render-side transient texture overrides.
    pub overrides: Option<&'a RenderThreadOverrides>,
}

impl<'a> RenderContext<'a> {
    /// Context with no overrides at the given times.
    pub fn new(
        time: f32,
        real_time: f32,
        referenced_textures: &'a [Arc<TextureResource>],
    ) -> Self {
        Self {
            time,
            real_time,
            parameters: &NoParameters,
            referenced_textures,
            overrides: None,
        }
    }
}

fn indexed_texture(
    referenced: &[Arc<TextureResource>],
    index: u32,
) -> Option<Arc<TextureResource>> {
    let tex = referenced.get(index as usize).cloned();
    if tex.is_none() {
        tracing::warn!(
            index,
            count = referenced.len(),
            "texture uniform expression has an invalid texture index"
        );
    }
    tex
}

impl UniformArena {
    /// Numeric value of a node; texture nodes evaluate to black.
    pub fn number_value(&self, id: UniformExprId, ctx: &RenderContext<'_>) -> LinearColor {
        self.cached_value(id, ctx, &mut HashMap::new())
    }

    /// Shared children are evaluated once per call.
    fn cached_value(
        &self,
        id: UniformExprId,
        ctx: &RenderContext<'_>,
        memo: &mut HashMap<UniformExprId, LinearColor>,
    ) -> LinearColor {
        if let Some(v) = memo.get(&id) {
            return *v;
        }
        let v = self.node_value(id, ctx, memo);
        memo.insert(id, v);
        v
    }

    fn node_value(
        &self,
        id: UniformExprId,
        ctx: &RenderContext<'_>,
        memo: &mut HashMap<UniformExprId, LinearColor>,
    ) -> LinearColor {
        match self.get(id) {
            UniformExpr::Constant { value, .. } => *value,
            UniformExpr::Time => LinearColor::splat(ctx.time),
            UniformExpr::RealTime => LinearColor::splat(ctx.real_time),
            UniformExpr::VectorParameter {
                name,
                default_value,
            } => ctx
                .parameters
                .vector_value(name)
                .unwrap_or_else(|| self.override_default(id).unwrap_or(*default_value)),
            UniformExpr::ScalarParameter {
                name,
                default_value,
            } => {
                let v = ctx.parameters.scalar_value(name).unwrap_or_else(|| {
                    self.override_default(id)
                        .map_or(default_value.0, |c| c.r)
                });
                LinearColor::splat(v)
            }
            UniformExpr::FoldedMath { a, b, op } => {
                let va = self.cached_value(*a, ctx, memo);
                let vb = self.cached_value(*b, ctx, memo);
                match op {
                    FoldedMathOp::Add => va.zip(vb, |x, y| x + y),
                    FoldedMathOp::Sub => va.zip(vb, |x, y| x - y),
                    FoldedMathOp::Mul => va.zip(vb, |x, y| x * y),
                    FoldedMathOp::Div => va.zip(vb, |x, y| x / safe_divisor(y)),
                    FoldedMathOp::Dot => {
                        LinearColor::splat(va.r * vb.r + va.g * vb.g + va.b * vb.b + va.a * vb.a)
                    }
                }
            }
            UniformExpr::Sine { x, is_cosine } => {
                let v = self.cached_value(*x, ctx, memo);
                if *is_cosine { v.map(f32::cos) } else { v.map(f32::sin) }
            }
            UniformExpr::SquareRoot { x } => self.cached_value(*x, ctx, memo).map(f32::sqrt),
            UniformExpr::Length { x } => {
                let v = self.cached_value(*x, ctx, memo);
                let len = (v.r * v.r + v.g * v.g + v.b * v.b).sqrt();
                LinearColor::new(len, len, len, 0.0)
            }
            UniformExpr::Logarithm2 { x } => self.cached_value(*x, ctx, memo).map(f32::log2),
            UniformExpr::Periodic { x } => {
                self.cached_value(*x, ctx, memo).map(|v| v - v.trunc())
            }
            UniformExpr::AppendVector {
                a,
                b,
                num_components_a,
            } => {
                let va = self.cached_value(*a, ctx, memo);
                let vb = self.cached_value(*b, ctx, memo);
                let n = *num_components_a as usize;
                let mut out = LinearColor::BLACK;
                for i in 0..4 {
                    out.set(i, if i < n { va.get(i) } else { vb.get(i - n) });
                }
                out
            }
            UniformExpr::Min { a, b } => {
                let va = self.cached_value(*a, ctx, memo);
                va.zip(self.cached_value(*b, ctx, memo), f32::min)
            }
            UniformExpr::Max { a, b } => {
                let va = self.cached_value(*a, ctx, memo);
                va.zip(self.cached_value(*b, ctx, memo), f32::max)
            }
            UniformExpr::Clamp { input, min, max } => {
                let v = self.cached_value(*input, ctx, memo);
                let lo = self.cached_value(*min, ctx, memo);
                let hi = self.cached_value(*max, ctx, memo);
                let mut out = LinearColor::BLACK;
                for i in 0..4 {
                    let (x, l, h) = (v.get(i), lo.get(i), hi.get(i));
                    out.set(i, if x < l { l } else if x < h { x } else { h });
                }
                out
            }
            UniformExpr::Saturate { x } => {
                self.cached_value(*x, ctx, memo).map(|v| v.clamp(0.0, 1.0))
            }
            UniformExpr::ComponentSwizzle {
                x,
                indices,
                num_elements,
            } => {
                let v = self.cached_value(*x, ctx, memo);
                let mut out = LinearColor::BLACK;
                for (i, &src) in indices.iter().enumerate().take(*num_elements as usize) {
                    out.set(i, v.get(src as usize));
                }
                out
            }
            UniformExpr::Floor { x } => self.cached_value(*x, ctx, memo).map(f32::floor),
            UniformExpr::Ceil { x } => self.cached_value(*x, ctx, memo).map(f32::ceil),
            UniformExpr::Frac { x } => self.cached_value(*x, ctx, memo).map(|v| v - v.floor()),
            UniformExpr::Fmod { a, b } => {
                let va = self.cached_value(*a, ctx, memo);
                let vb = self.cached_value(*b, ctx, memo);
                va.zip(vb, |x, y| if y == 0.0 { 0.0 } else { x % y })
            }
            UniformExpr::Abs { x } => self.cached_value(*x, ctx, memo).map(f32::abs),
            UniformExpr::Texture { .. } | UniformExpr::TextureParameter { .. } => {
                LinearColor::BLACK
            }
            UniformExpr::TextureProperty { texture, property } => {
                let Some(tex) = self.render_texture_value(*texture, ctx) else {
                    return LinearColor::BLACK;
                };
                let (w, h) = (tex.width as f32, tex.height as f32);
                match property {
                    TextureProperty::TextureSize => LinearColor::new(w, h, 0.0, 0.0),
                    TextureProperty::TexelSize => {
                        let inv = |d: f32| if d > 0.0 { 1.0 / d } else { 0.0 };
                        LinearColor::new(inv(w), inv(h), 0.0, 0.0)
                    }
                }
            }
        }
    }

    /// Texture bound to a texture node on the render thread: transient override, then the
    /// per-draw parameter, then the texture referenced at translation time.
    pub fn render_texture_value(
        &self,
        id: UniformExprId,
        ctx: &RenderContext<'_>,
    ) -> Option<Arc<TextureResource>> {
        if let Some(tex) = ctx.overrides.and_then(|o| o.get(id)) {
            return Some(tex.clone());
        }
        match self.get(id) {
            UniformExpr::Texture { texture_index, .. } => {
                indexed_texture(ctx.referenced_textures, *texture_index)
            }
            UniformExpr::TextureParameter {
                name,
                texture_index,
                ..
            } => ctx
                .parameters
                .texture_value(name)
                .or_else(|| indexed_texture(ctx.referenced_textures, *texture_index)),
            _ => None,
        }
    }

    /// Texture bound to a texture node on the game thread: transient override (when allowed),
    /// then the instance chain, then the texture referenced at translation time.
    pub fn game_texture_value(
        &self,
        id: UniformExprId,
        instance: &MaterialInstance,
        referenced_textures: &[Arc<TextureResource>],
        overrides: Option<&GameThreadOverrides>,
    ) -> Option<Arc<TextureResource>> {
        if let Some(tex) = overrides.and_then(|o| o.get(id)) {
            return Some(tex.clone());
        }
        match self.get(id) {
            UniformExpr::Texture { texture_index, .. } => {
                indexed_texture(referenced_textures, *texture_index)
            }
            UniformExpr::TextureParameter {
                name,
                texture_index,
                ..
            } => instance
                .texture_value(name)
                .or_else(|| indexed_texture(referenced_textures, *texture_index)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/uniform/eval.rs"]
mod tests;
