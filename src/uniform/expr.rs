use crate::foundation::ids::UniformExprId;
use crate::foundation::math::{F32Key, LinearColor};
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::collections::{HashMap, HashSet};

/// Binary operation folded into a single uniform node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum FoldedMathOp {
    Add,
    Sub,
    Mul,
    Div,
    Dot,
}

/// Texture object kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureKind {
    /// 2D texture.
    Texture2d,
    /// Cube map.
    TextureCube,
}

impl TextureKind {
    /// Value type of a texture object of this kind.
    pub fn value_type(self) -> ValueType {
        match self {
            Self::Texture2d => ValueType::TEXTURE2D,
            Self::TextureCube => ValueType::TEXTURE_CUBE,
        }
    }
}

/// Where a texture sample takes its sampler state from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerSource {
    /// The texture asset's own sampler.
    #[default]
    FromTextureAsset,
    /// Shared wrap sampler from the world group settings.
    WrapWorldGroupSettings,
    /// Shared clamp sampler from the world group settings.
    ClampWorldGroupSettings,
}

/// Texture property exposed as a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureProperty {
    /// Width and height in texels.
    TextureSize,
    /// Reciprocal of the size.
    TexelSize,
}

/// One node of the uniform expression DAG.
///
/// Children are arena handles, so two structurally identical nodes always intern to the same
/// [`UniformExprId`] and identity comparison doubles as the structural `IsIdentical` check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum UniformExpr {
    Constant {
        value: LinearColor,
        value_type: ValueType,
    },
    Time,
    RealTime,
    VectorParameter {
        name: String,
        default_value: LinearColor,
    },
    ScalarParameter {
        name: String,
        default_value: F32Key,
    },
    FoldedMath {
        a: UniformExprId,
        b: UniformExprId,
        op: FoldedMathOp,
    },
    Sine {
        x: UniformExprId,
        is_cosine: bool,
    },
    SquareRoot {
        x: UniformExprId,
    },
    Length {
        x: UniformExprId,
    },
    Logarithm2 {
        x: UniformExprId,
    },
    Periodic {
        x: UniformExprId,
    },
    AppendVector {
        a: UniformExprId,
        b: UniformExprId,
        num_components_a: u32,
    },
    Min {
        a: UniformExprId,
        b: UniformExprId,
    },
    Max {
        a: UniformExprId,
        b: UniformExprId,
    },
    Clamp {
        input: UniformExprId,
        min: UniformExprId,
        max: UniformExprId,
    },
    Saturate {
        x: UniformExprId,
    },
    ComponentSwizzle {
        x: UniformExprId,
        indices: [u8; 4],
        num_elements: u8,
    },
    Floor {
        x: UniformExprId,
    },
    Ceil {
        x: UniformExprId,
    },
    Frac {
        x: UniformExprId,
    },
    Fmod {
        a: UniformExprId,
        b: UniformExprId,
    },
    Abs {
        x: UniformExprId,
    },
    Texture {
        texture_index: u32,
        texture_kind: TextureKind,
        sampler_source: SamplerSource,
    },
    TextureParameter {
        name: String,
        texture_index: u32,
        texture_kind: TextureKind,
        sampler_source: SamplerSource,
    },
    TextureProperty {
        texture: UniformExprId,
        property: TextureProperty,
    },
}

impl UniformExpr {
    /// Swizzle node from up to four component indices; `None` entries are absent and a single
    /// index is replicated into every channel.
    pub fn component_swizzle(x: UniformExprId, indices: [Option<u8>; 4]) -> Self {
        let num_elements = indices.iter().take_while(|i| i.is_some()).count() as u8;
        let first = indices[0].unwrap_or(0);
        if num_elements <= 1 {
            return Self::ComponentSwizzle {
                x,
                indices: [first; 4],
                num_elements: 4,
            };
        }
        let mut out = [0u8; 4];
        for (slot, i) in out.iter_mut().zip(indices) {
            *slot = i.unwrap_or(0);
        }
        Self::ComponentSwizzle {
            x,
            indices: out,
            num_elements,
        }
    }

    /// Child handles in evaluation order.
    pub fn children(&self) -> SmallVec<[UniformExprId; 3]> {
        match self {
            Self::Constant { .. }
            | Self::Time
            | Self::RealTime
            | Self::VectorParameter { .. }
            | Self::ScalarParameter { .. }
            | Self::Texture { .. }
            | Self::TextureParameter { .. } => SmallVec::new(),
            Self::FoldedMath { a, b, .. }
            | Self::AppendVector { a, b, .. }
            | Self::Min { a, b }
            | Self::Max { a, b }
            | Self::Fmod { a, b } => smallvec![*a, *b],
            Self::Clamp { input, min, max } => smallvec![*input, *min, *max],
            Self::Sine { x, .. }
            | Self::SquareRoot { x }
            | Self::Length { x }
            | Self::Logarithm2 { x }
            | Self::Periodic { x }
            | Self::Saturate { x }
            | Self::ComponentSwizzle { x, .. }
            | Self::Floor { x }
            | Self::Ceil { x }
            | Self::Frac { x }
            | Self::Abs { x } => smallvec![*x],
            Self::TextureProperty { texture, .. } => smallvec![*texture],
        }
    }

    /// Same node with every child handle passed through `f`.
    pub fn map_children(&self, f: impl Fn(UniformExprId) -> UniformExprId) -> Self {
        let mut out = self.clone();
        match &mut out {
            Self::Constant { .. }
            | Self::Time
            | Self::RealTime
            | Self::VectorParameter { .. }
            | Self::ScalarParameter { .. }
            | Self::Texture { .. }
            | Self::TextureParameter { .. } => {}
            Self::FoldedMath { a, b, .. }
            | Self::AppendVector { a, b, .. }
            | Self::Min { a, b }
            | Self::Max { a, b }
            | Self::Fmod { a, b } => {
                *a = f(*a);
                *b = f(*b);
            }
            Self::Clamp { input, min, max } => {
                *input = f(*input);
                *min = f(*min);
                *max = f(*max);
            }
            Self::Sine { x, .. }
            | Self::SquareRoot { x }
            | Self::Length { x }
            | Self::Logarithm2 { x }
            | Self::Periodic { x }
            | Self::Saturate { x }
            | Self::ComponentSwizzle { x, .. }
            | Self::Floor { x }
            | Self::Ceil { x }
            | Self::Frac { x }
            | Self::Abs { x } => *x = f(*x),
            Self::TextureProperty { texture, .. } => *texture = f(*texture),
        }
        out
    }

    /// True for texture and texture parameter nodes.
    pub fn is_texture(&self) -> bool {
        matches!(self, Self::Texture { .. } | Self::TextureParameter { .. })
    }

    /// Parameter name of a parameter node.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Self::VectorParameter { name, .. }
            | Self::ScalarParameter { name, .. }
            | Self::TextureParameter { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Hash-consed storage for uniform expression nodes.
///
/// Nodes are append-only and children always precede their parents, so walking a node never
/// loops.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<UniformExpr>", into = "Vec<UniformExpr>")]
pub struct UniformArena {
    nodes: Vec<UniformExpr>,
    ids_by_node: HashMap<UniformExpr, UniformExprId>,
    /// Per-node `is_constant`, filled on intern.
    constant: Vec<bool>,
    /// Per-node `is_changing_per_frame`, filled on intern.
    per_frame: Vec<bool>,
    default_overrides: HashMap<UniformExprId, LinearColor>,
}

impl UniformArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a node, returning the existing handle when an identical node is present.
    pub fn intern(&mut self, expr: UniformExpr) -> UniformExprId {
        if let Some(&id) = self.ids_by_node.get(&expr) {
            return id;
        }
        let id = UniformExprId(self.nodes.len() as u32);
        let children = expr.children();
        let constant = match &expr {
            UniformExpr::Constant { .. } => true,
            UniformExpr::Time
            | UniformExpr::RealTime
            | UniformExpr::VectorParameter { .. }
            | UniformExpr::ScalarParameter { .. }
            | UniformExpr::Texture { .. }
            | UniformExpr::TextureParameter { .. }
            | UniformExpr::TextureProperty { .. } => false,
            _ => children
                .iter()
                .all(|c| self.constant.get(c.index()).copied().unwrap_or(false)),
        };
        let per_frame = matches!(expr, UniformExpr::Time | UniformExpr::RealTime)
            || children
                .iter()
                .any(|c| self.per_frame.get(c.index()).copied().unwrap_or(false));
        self.constant.push(constant);
        self.per_frame.push(per_frame);
        self.nodes.push(expr.clone());
        self.ids_by_node.insert(expr, id);
        id
    }

    /// Node behind a handle.
    pub fn get(&self, id: UniformExprId) -> &UniformExpr {
        &self.nodes[id.index()]
    }

    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node was interned.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Structural identity; interning makes this a handle comparison.
    pub fn is_identical(&self, a: UniformExprId, b: UniformExprId) -> bool {
        a == b
    }

    /// True when the node folds to a value that never changes at runtime.
    pub fn is_constant(&self, id: UniformExprId) -> bool {
        self.constant[id.index()]
    }

    /// True when the node depends on time and must be re-evaluated every frame.
    pub fn is_changing_per_frame(&self, id: UniformExprId) -> bool {
        self.per_frame[id.index()]
    }

    /// True when `id` names a node of this arena.
    pub fn contains(&self, id: UniformExprId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Structural identity of nodes living in two different arenas.
    pub fn is_identical_across(
        &self,
        a: UniformExprId,
        other: &UniformArena,
        b: UniformExprId,
    ) -> bool {
        let erase = |_: UniformExprId| UniformExprId(0);
        let mut seen = HashSet::new();
        let mut pending = vec![(a, b)];
        while let Some((a, b)) = pending.pop() {
            if !seen.insert((a, b)) {
                continue;
            }
            let (na, nb) = (self.get(a), other.get(b));
            if na.map_children(erase) != nb.map_children(erase) {
                return false;
            }
            pending.extend(na.children().into_iter().zip(nb.children()));
        }
        true
    }

    /// Editor-preview default for a scalar or vector parameter node; `None` clears it.
    pub fn set_transient_override_default(
        &mut self,
        id: UniformExprId,
        value: Option<LinearColor>,
    ) {
        match value {
            Some(v) => {
                self.default_overrides.insert(id, v);
            }
            None => {
                self.default_overrides.remove(&id);
            }
        }
    }

    pub(crate) fn override_default(&self, id: UniformExprId) -> Option<LinearColor> {
        self.default_overrides.get(&id).copied()
    }
}

impl TryFrom<Vec<UniformExpr>> for UniformArena {
    type Error = String;

    fn try_from(nodes: Vec<UniformExpr>) -> Result<Self, Self::Error> {
        let mut arena = Self::new();
        for (i, node) in nodes.into_iter().enumerate() {
            if let Some(c) = node.children().iter().find(|c| c.index() >= i) {
                return Err(format!(
                    "uniform expression {i} references later node {}",
                    c.index()
                ));
            }
            let id = arena.intern(node);
            if id.index() != i {
                return Err(format!("uniform expression {i} duplicates node {}", id.index()));
            }
        }
        Ok(arena)
    }
}

impl From<UniformArena> for Vec<UniformExpr> {
    fn from(arena: UniformArena) -> Self {
        arena.nodes
    }
}

#[cfg(test)]
#[path = "../../tests/unit/uniform/expr.rs"]
mod tests;
