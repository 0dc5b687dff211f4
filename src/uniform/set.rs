use crate::foundation::error::{MaterialError, MaterialResult};
use crate::foundation::ids::UniformExprId;
use crate::foundation::math::LinearColor;
use crate::uniform::eval::{RenderContext, TextureResource};
use crate::uniform::expr::{SamplerSource, TextureKind, UniformArena, UniformExpr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const VECTOR_SIZE: u32 = 16;
const POINTER_SIZE: u32 = 8;
const STRUCT_ALIGNMENT: u32 = 16;

/// Kind of one member of the material uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// Array of float4.
    VectorArray {
        /// Element count.
        len: u32,
    },
    /// 2D texture slot.
    Texture2d,
    /// Cube texture slot.
    TextureCube,
    /// Sampler slot.
    Sampler,
}

/// Named, offset member of the buffer layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformBufferMember {
    /// Shader-visible name.
    pub name: String,
    /// Byte offset from the start of the buffer.
    pub offset: u32,
    /// Member kind.
    pub kind: MemberKind,
}

/// Layout of the material uniform buffer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniformBufferStruct {
    /// Struct name as referenced by generated code (`Material.*`).
    pub name: String,
    /// Shader-side struct type name.
    pub shader_struct_name: String,
    /// Members in declaration order.
    pub members: Vec<UniformBufferMember>,
    /// Total size, aligned to 16 bytes.
    pub size: u32,
}

impl UniformBufferStruct {
    /// Member by name.
    pub fn member(&self, name: &str) -> Option<&UniformBufferMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Resource bound into a pointer slot of a [`UniformBuffer`].
#[derive(Clone, Debug, PartialEq)]
pub enum BoundResource {
    /// A resolved texture.
    Texture(Arc<TextureResource>),
    /// Engine default white texture of the given kind, used when nothing resolves.
    DefaultWhite(TextureKind),
    /// Sampler state.
    Sampler(SamplerBinding),
}

/// Which sampler state a sampler slot holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SamplerBinding {
    /// Sampler of the named texture asset (or of the default texture).
    FromTexture(String),
    /// Shared wrap sampler.
    WrapWorldGroupSettings,
    /// Shared clamp sampler.
    ClampWorldGroupSettings,
}

/// Pointer slot of a uniform buffer and what it holds.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceBinding {
    /// Byte offset of the slot.
    pub offset: u32,
    /// Bound resource.
    pub resource: BoundResource,
}

/// Materialized uniform buffer for one draw.
///
/// Pointer slots in `data` hold the little-endian index of their entry in `bindings`.
#[derive(Clone, Debug, PartialEq)]
pub struct UniformBuffer {
    /// Raw bytes, exactly `UniformBufferStruct::size` long.
    pub data: Vec<u8>,
    /// Resources referenced by pointer slots.
    pub bindings: Vec<ResourceBinding>,
}

impl UniformBuffer {
    /// Four floats at `offset`.
    pub fn read_vector(&self, offset: u32) -> Option<[f32; 4]> {
        let mut out = [0.0; 4];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.read_f32(offset + 4 * i as u32)?;
        }
        Some(out)
    }

    /// One float at `offset`.
    pub fn read_f32(&self, offset: u32) -> Option<f32> {
        let o = offset as usize;
        let bytes: [u8; 4] = self.data.get(o..o + 4)?.try_into().ok()?;
        Some(f32::from_le_bytes(bytes))
    }

    /// Binding stored in the pointer slot at `offset`.
    pub fn binding_at(&self, offset: u32) -> Option<&ResourceBinding> {
        let o = offset as usize;
        let bytes: [u8; 8] = self.data.get(o..o + 8)?.try_into().ok()?;
        self.bindings.get(u64::from_le_bytes(bytes) as usize)
    }
}

/// Values of the per-frame uniforms, which live outside the uniform buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerFrameValues {
    /// `UE_Material_PerFrameScalarExpression*`.
    pub scalars: Vec<f32>,
    /// `UE_Material_PerFrameVectorExpression*`.
    pub vectors: Vec<LinearColor>,
    /// `UE_Material_PerFramePrevScalarExpression*`.
    pub prev_scalars: Vec<f32>,
    /// `UE_Material_PerFramePrevVectorExpression*`.
    pub prev_vectors: Vec<LinearColor>,
}

/// Deduplicated uniform expressions of one translated material, by storage class.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "StoredExpressionSet")]
pub struct UniformExpressionSet {
    pub(crate) arena: UniformArena,
    pub(crate) uniform_vector_expressions: Vec<UniformExprId>,
    pub(crate) uniform_scalar_expressions: Vec<UniformExprId>,
    pub(crate) uniform_2d_texture_expressions: Vec<UniformExprId>,
    pub(crate) uniform_cube_texture_expressions: Vec<UniformExprId>,
    pub(crate) per_frame_uniform_scalar_expressions: Vec<UniformExprId>,
    pub(crate) per_frame_uniform_vector_expressions: Vec<UniformExprId>,
    pub(crate) per_frame_prev_uniform_scalar_expressions: Vec<UniformExprId>,
    pub(crate) per_frame_prev_uniform_vector_expressions: Vec<UniformExprId>,
    pub(crate) parameter_collections: Vec<String>,
    #[serde(skip)]
    pub(crate) buffer_struct: Option<UniformBufferStruct>,
}

/// Serialized form of [`UniformExpressionSet`], checked before use.
#[derive(Deserialize)]
struct StoredExpressionSet {
    arena: UniformArena,
    uniform_vector_expressions: Vec<UniformExprId>,
    uniform_scalar_expressions: Vec<UniformExprId>,
    uniform_2d_texture_expressions: Vec<UniformExprId>,
    uniform_cube_texture_expressions: Vec<UniformExprId>,
    per_frame_uniform_scalar_expressions: Vec<UniformExprId>,
    per_frame_uniform_vector_expressions: Vec<UniformExprId>,
    per_frame_prev_uniform_scalar_expressions: Vec<UniformExprId>,
    per_frame_prev_uniform_vector_expressions: Vec<UniformExprId>,
    parameter_collections: Vec<String>,
}

impl TryFrom<StoredExpressionSet> for UniformExpressionSet {
    type Error = String;

    fn try_from(stored: StoredExpressionSet) -> Result<Self, Self::Error> {
        let set = Self {
            arena: stored.arena,
            uniform_vector_expressions: stored.uniform_vector_expressions,
            uniform_scalar_expressions: stored.uniform_scalar_expressions,
            uniform_2d_texture_expressions: stored.uniform_2d_texture_expressions,
            uniform_cube_texture_expressions: stored.uniform_cube_texture_expressions,
            per_frame_uniform_scalar_expressions: stored.per_frame_uniform_scalar_expressions,
            per_frame_uniform_vector_expressions: stored.per_frame_uniform_vector_expressions,
            per_frame_prev_uniform_scalar_expressions: stored
                .per_frame_prev_uniform_scalar_expressions,
            per_frame_prev_uniform_vector_expressions: stored
                .per_frame_prev_uniform_vector_expressions,
            parameter_collections: stored.parameter_collections,
            buffer_struct: None,
        };

        for (n, list) in set.lists().into_iter().enumerate() {
            if let Some(id) = list.iter().find(|&&id| !set.arena.contains(id)) {
                return Err(format!(
                    "uniform expression list {n} references node {} but the arena holds {}",
                    id.index(),
                    set.arena.len()
                ));
            }
        }
        for &id in set
            .uniform_2d_texture_expressions
            .iter()
            .chain(&set.uniform_cube_texture_expressions)
        {
            if !set.arena.get(id).is_texture() {
                return Err(format!("uniform expression {} is not a texture", id.index()));
            }
        }
        Ok(set)
    }
}

pub(crate) fn add_unique(list: &mut Vec<UniformExprId>, id: UniformExprId) -> usize {
    if let Some(i) = list.iter().position(|&x| x == id) {
        return i;
    }
    list.push(id);
    list.len() - 1
}

impl UniformExpressionSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Node storage shared by every array.
    pub fn arena(&self) -> &UniformArena {
        &self.arena
    }

    /// Mutable node storage, for transient parameter default overrides.
    pub fn arena_mut(&mut self) -> &mut UniformArena {
        &mut self.arena
    }

    /// Vector uniforms in buffer order.
    pub fn vector_expressions(&self) -> &[UniformExprId] {
        &self.uniform_vector_expressions
    }

    /// Scalar uniforms in buffer order.
    pub fn scalar_expressions(&self) -> &[UniformExprId] {
        &self.uniform_scalar_expressions
    }

    /// 2D texture uniforms in buffer order.
    pub fn texture_2d_expressions(&self) -> &[UniformExprId] {
        &self.uniform_2d_texture_expressions
    }

    /// Cube texture uniforms in buffer order.
    pub fn texture_cube_expressions(&self) -> &[UniformExprId] {
        &self.uniform_cube_texture_expressions
    }

    /// Per-frame scalar uniforms.
    pub fn per_frame_scalar_expressions(&self) -> &[UniformExprId] {
        &self.per_frame_uniform_scalar_expressions
    }

    /// Per-frame vector uniforms.
    pub fn per_frame_vector_expressions(&self) -> &[UniformExprId] {
        &self.per_frame_uniform_vector_expressions
    }

    /// Previous-frame scalar uniforms.
    pub fn per_frame_prev_scalar_expressions(&self) -> &[UniformExprId] {
        &self.per_frame_prev_uniform_scalar_expressions
    }

    /// Previous-frame vector uniforms.
    pub fn per_frame_prev_vector_expressions(&self) -> &[UniformExprId] {
        &self.per_frame_prev_uniform_vector_expressions
    }

    /// Referenced parameter collections, in `MaterialCollection<i>` order.
    pub fn parameter_collections(&self) -> &[String] {
        &self.parameter_collections
    }

    /// Replace the referenced parameter collections.
    pub fn set_parameter_collections(&mut self, collections: Vec<String>) {
        self.parameter_collections = collections;
    }

    /// Uniform buffer layout, once [`Self::create_buffer_struct`] ran.
    pub fn buffer_struct(&self) -> Option<&UniformBufferStruct> {
        self.buffer_struct.as_ref()
    }

    /// Shape summary used to decide whether a cached shader still matches.
    pub fn summary_string(&self) -> String {
        format!(
            "({} vectors, {} scalars, {} 2d tex, {} cube tex, {} scalars/frame, {} vectors/frame, {} collections)",
            self.uniform_vector_expressions.len(),
            self.uniform_scalar_expressions.len(),
            self.uniform_2d_texture_expressions.len(),
            self.uniform_cube_texture_expressions.len(),
            self.per_frame_uniform_scalar_expressions.len(),
            self.per_frame_uniform_vector_expressions.len(),
            self.parameter_collections.len(),
        )
    }

    /// Build the uniform buffer layout: vectors, packed scalars, texture/sampler pairs (2D then
    /// cube), then the two shared samplers.
    pub fn create_buffer_struct(&mut self) -> &UniformBufferStruct {
        let mut members = Vec::new();
        let mut offset = 0u32;

        if !self.uniform_vector_expressions.is_empty() {
            let len = self.uniform_vector_expressions.len() as u32;
            members.push(UniformBufferMember {
                name: "VectorExpressions".to_string(),
                offset,
                kind: MemberKind::VectorArray { len },
            });
            offset += len * VECTOR_SIZE;
        }

        if !self.uniform_scalar_expressions.is_empty() {
            let len = (self.uniform_scalar_expressions.len() as u32).div_ceil(4);
            members.push(UniformBufferMember {
                name: "ScalarExpressions".to_string(),
                offset,
                kind: MemberKind::VectorArray { len },
            });
            offset += len * VECTOR_SIZE;
        }

        debug_assert_eq!(offset % (2 * POINTER_SIZE), 0);

        for (prefix, kind, count) in [
            (
                "Texture2D",
                MemberKind::Texture2d,
                self.uniform_2d_texture_expressions.len(),
            ),
            (
                "TextureCube",
                MemberKind::TextureCube,
                self.uniform_cube_texture_expressions.len(),
            ),
        ] {
            for i in 0..count {
                members.push(UniformBufferMember {
                    name: format!("{prefix}_{i}"),
                    offset,
                    kind,
                });
                offset += POINTER_SIZE;
                members.push(UniformBufferMember {
                    name: format!("{prefix}_{i}Sampler"),
                    offset,
                    kind: MemberKind::Sampler,
                });
                offset += POINTER_SIZE;
            }
        }

        for name in ["Wrap_WorldGroupSettings", "Clamp_WorldGroupSettings"] {
            members.push(UniformBufferMember {
                name: name.to_string(),
                offset,
                kind: MemberKind::Sampler,
            });
            offset += POINTER_SIZE;
        }

        let size = offset.div_ceil(STRUCT_ALIGNMENT) * STRUCT_ALIGNMENT;
        self.buffer_struct.insert(UniformBufferStruct {
            name: "Material".to_string(),
            shader_struct_name: "MaterialUniforms".to_string(),
            members,
            size,
        })
    }

    /// Evaluate every uniform into a buffer laid out exactly like [`Self::create_buffer_struct`].
    #[tracing::instrument(skip_all)]
    pub fn create_uniform_buffer(&self, ctx: &RenderContext<'_>) -> MaterialResult<UniformBuffer> {
        let layout = self.buffer_struct.as_ref().ok_or_else(|| {
            MaterialError::evaluation("uniform buffer struct has not been created")
        })?;

        let mut writer = BufferWriter {
            data: vec![0u8; layout.size as usize],
            bindings: Vec::new(),
        };
        let mut offset = 0u32;

        for &id in &self.uniform_vector_expressions {
            let v = self.arena.number_value(id, ctx);
            writer.write_vector(offset, v);
            offset += VECTOR_SIZE;
        }

        for (i, &id) in self.uniform_scalar_expressions.iter().enumerate() {
            let v = self.arena.number_value(id, ctx);
            writer.write_f32(offset + (i as u32 % 4) * 4, v.r);
            if i % 4 == 3 {
                offset += VECTOR_SIZE;
            }
        }
        if self.uniform_scalar_expressions.len() % 4 != 0 {
            offset += VECTOR_SIZE;
        }

        for (kind, list) in [
            (TextureKind::Texture2d, &self.uniform_2d_texture_expressions),
            (
                TextureKind::TextureCube,
                &self.uniform_cube_texture_expressions,
            ),
        ] {
            for &id in list {
                let texture = self.arena.render_texture_value(id, ctx);
                let sampler = match self.sampler_source(id) {
                    SamplerSource::FromTextureAsset => SamplerBinding::FromTexture(
                        texture
                            .as_ref()
                            .map_or_else(|| "DefaultWhite".to_string(), |t| t.name.clone()),
                    ),
                    SamplerSource::WrapWorldGroupSettings => SamplerBinding::WrapWorldGroupSettings,
                    SamplerSource::ClampWorldGroupSettings => {
                        SamplerBinding::ClampWorldGroupSettings
                    }
                };
                let resource = texture.map_or(BoundResource::DefaultWhite(kind), BoundResource::Texture);
                writer.bind(offset, resource);
                offset += POINTER_SIZE;
                writer.bind(offset, BoundResource::Sampler(sampler));
                offset += POINTER_SIZE;
            }
        }

        writer.bind(
            offset,
            BoundResource::Sampler(SamplerBinding::WrapWorldGroupSettings),
        );
        offset += POINTER_SIZE;
        writer.bind(
            offset,
            BoundResource::Sampler(SamplerBinding::ClampWorldGroupSettings),
        );

        Ok(UniformBuffer {
            data: writer.data,
            bindings: writer.bindings,
        })
    }

    /// Evaluate the per-frame uniforms; previous-frame arrays use `prev_ctx`.
    pub fn evaluate_per_frame(
        &self,
        ctx: &RenderContext<'_>,
        prev_ctx: &RenderContext<'_>,
    ) -> PerFrameValues {
        let scalars = |list: &[UniformExprId], c: &RenderContext<'_>| {
            list.iter()
                .map(|&id| self.arena.number_value(id, c).r)
                .collect()
        };
        let vectors = |list: &[UniformExprId], c: &RenderContext<'_>| {
            list.iter()
                .map(|&id| self.arena.number_value(id, c))
                .collect()
        };
        PerFrameValues {
            scalars: scalars(&self.per_frame_uniform_scalar_expressions, ctx),
            vectors: vectors(&self.per_frame_uniform_vector_expressions, ctx),
            prev_scalars: scalars(&self.per_frame_prev_uniform_scalar_expressions, prev_ctx),
            prev_vectors: vectors(&self.per_frame_prev_uniform_vector_expressions, prev_ctx),
        }
    }

    fn sampler_source(&self, id: UniformExprId) -> SamplerSource {
        match self.arena.get(id) {
            UniformExpr::Texture { sampler_source, .. }
            | UniformExpr::TextureParameter { sampler_source, .. } => *sampler_source,
            _ => SamplerSource::FromTextureAsset,
        }
    }

    fn lists(&self) -> [&Vec<UniformExprId>; 8] {
        [
            &self.uniform_vector_expressions,
            &self.uniform_scalar_expressions,
            &self.uniform_2d_texture_expressions,
            &self.uniform_cube_texture_expressions,
            &self.per_frame_uniform_scalar_expressions,
            &self.per_frame_uniform_vector_expressions,
            &self.per_frame_prev_uniform_scalar_expressions,
            &self.per_frame_prev_uniform_vector_expressions,
        ]
    }
}

impl PartialEq for UniformExpressionSet {
    fn eq(&self, other: &Self) -> bool {
        if self.parameter_collections != other.parameter_collections {
            return false;
        }
        self.lists()
            .iter()
            .zip(other.lists().iter())
            .all(|(a, b)| {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(&x, &y)| self.arena.is_identical_across(x, &other.arena, y))
            })
    }
}

struct BufferWriter {
    data: Vec<u8>,
    bindings: Vec<ResourceBinding>,
}

impl BufferWriter {
    fn write_f32(&mut self, offset: u32, v: f32) {
        let o = offset as usize;
        if let Some(dst) = self.data.get_mut(o..o + 4) {
            dst.copy_from_slice(&v.to_le_bytes());
        }
    }

    fn write_vector(&mut self, offset: u32, v: LinearColor) {
        for (i, c) in v.to_array().into_iter().enumerate() {
            self.write_f32(offset + 4 * i as u32, c);
        }
    }

    fn bind(&mut self, offset: u32, resource: BoundResource) {
        let index = self.bindings.len() as u64;
        let o = offset as usize;
        if let Some(dst) = self.data.get_mut(o..o + 8) {
            dst.copy_from_slice(&index.to_le_bytes());
        }
        self.bindings.push(ResourceBinding { offset, resource });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/uniform/set.rs"]
mod tests;
