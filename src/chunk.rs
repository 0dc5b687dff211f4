//! Per-stage intermediate representation: one code chunk per emitted expression.

use crate::foundation::ids::{ChunkIdx, UniformExprId};
use crate::types::{MaterialProperty, ShaderFrequency, ValueType};

/// One unit of generated shader text.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ShaderCodeChunk {
    /// Inline expression, or a full local variable declaration statement.
    pub(crate) definition: String,
    /// Local variable name; empty for inline and uniform chunks.
    pub(crate) symbol_name: String,
    /// Backing uniform expression when the value is the same for every pixel of a draw.
    pub(crate) uniform: Option<UniformExprId>,
    pub(crate) ty: ValueType,
    /// Callers must splice `definition` instead of referencing `symbol_name`.
    pub(crate) inline: bool,
}

impl ShaderCodeChunk {
    pub(crate) fn inline(definition: String, ty: ValueType) -> Self {
        Self {
            definition,
            symbol_name: String::new(),
            uniform: None,
            ty,
            inline: true,
        }
    }

    pub(crate) fn local(definition: String, symbol_name: String, ty: ValueType) -> Self {
        Self {
            definition,
            symbol_name,
            uniform: None,
            ty,
            inline: false,
        }
    }

    pub(crate) fn uniform(uniform: UniformExprId, definition: String, ty: ValueType) -> Self {
        Self {
            definition,
            symbol_name: String::new(),
            uniform: Some(uniform),
            ty,
            inline: false,
        }
    }
}

/// Which chunk array the compiler currently appends to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Property(MaterialProperty, ShaderFrequency),
    /// Throwaway scope of one custom output compile.
    CustomOutput,
}

/// Chunk arrays of one translation: one per (property, stage) plus the custom output scratch.
#[derive(Debug)]
pub(crate) struct ChunkScopes {
    property_chunks: Vec<[Vec<ShaderCodeChunk>; ShaderFrequency::COUNT]>,
    custom_output_chunks: Vec<ShaderCodeChunk>,
}

impl Default for ChunkScopes {
    fn default() -> Self {
        Self {
            property_chunks: (0..MaterialProperty::COUNT)
                .map(|_| std::array::from_fn(|_| Vec::new()))
                .collect(),
            custom_output_chunks: Vec::new(),
        }
    }
}

impl ChunkScopes {
    pub(crate) fn get(&self, scope: Scope) -> &Vec<ShaderCodeChunk> {
        match scope {
            Scope::Property(p, f) => &self.property_chunks[p.index()][f.index()],
            Scope::CustomOutput => &self.custom_output_chunks,
        }
    }

    pub(crate) fn get_mut(&mut self, scope: Scope) -> &mut Vec<ShaderCodeChunk> {
        match scope {
            Scope::Property(p, f) => &mut self.property_chunks[p.index()][f.index()],
            Scope::CustomOutput => &mut self.custom_output_chunks,
        }
    }

    /// Start a fresh custom output scope.
    pub(crate) fn reset_custom_output(&mut self) {
        self.custom_output_chunks.clear();
    }
}

/// Concatenated local variable declarations of a scope; uniform and inline chunks have none.
pub(crate) fn definitions(chunks: &[ShaderCodeChunk]) -> String {
    chunks
        .iter()
        .filter(|c| c.uniform.is_none() && !c.inline)
        .map(|c| c.definition.as_str())
        .collect()
}

/// `(definitions, value)` pair a template function slot is built from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FixedCode {
    pub(crate) definitions: String,
    pub(crate) value: String,
}

impl FixedCode {
    pub(crate) fn function_body(&self) -> String {
        format!("{}\treturn {};", self.definitions, self.value)
    }
}

/// Final code of a property result. A missing result reads as `0`; a constant uniform result
/// needs no definitions. The result must already have been accessed if it is a non-constant
/// uniform.
pub(crate) fn fixed_parameter_code(
    result: Option<ChunkIdx>,
    chunks: &[ShaderCodeChunk],
    is_constant: impl Fn(UniformExprId) -> bool,
) -> FixedCode {
    let Some(chunk) = result.and_then(|i| chunks.get(i.index())) else {
        return FixedCode {
            definitions: String::new(),
            value: "0".to_string(),
        };
    };
    if chunk.uniform.is_some_and(&is_constant) {
        return FixedCode {
            definitions: String::new(),
            value: chunk.definition.clone(),
        };
    }
    FixedCode {
        definitions: definitions(chunks),
        value: if chunk.inline {
            chunk.definition.clone()
        } else {
            chunk.symbol_name.clone()
        },
    }
}

#[cfg(test)]
#[path = "../tests/unit/chunk.rs"]
mod tests;
