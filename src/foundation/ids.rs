use serde::{Deserialize, Serialize};

/// Expression node in a normalized material graph (material and function nodes share one space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeIdx(pub(crate) u32);

/// Material function in a normalized material graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FunctionIdx(pub(crate) u32);

/// Slot in the current chunk scope. `None` in a [`Code`] plays the role of `INDEX_NONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ChunkIdx(pub(crate) u32);

/// Handle to a hash-consed node in a [`crate::UniformArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniformExprId(pub(crate) u32);

impl UniformExprId {
    /// Position of the node in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Result of one compiler operation.
pub(crate) type Code = Option<ChunkIdx>;

impl NodeIdx {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl FunctionIdx {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ChunkIdx {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
