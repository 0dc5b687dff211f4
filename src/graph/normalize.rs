use crate::foundation::error::{MaterialError, MaterialResult};
use crate::foundation::ids::{FunctionIdx, NodeIdx};
use crate::foundation::intern::StringInterner;
use crate::graph::model::{
    ExpressionDef, FunctionInputType, InputRef, MaterialDef, NodeKind, PropertyInput,
};
use crate::types::MaterialProperty;
use std::collections::{HashMap, HashSet};

/// A node of the normalized graph.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) id: String,
    pub(crate) desc: String,
    pub(crate) kind: NodeKind,
    /// Owning function; `None` for material nodes.
    pub(crate) function: Option<FunctionIdx>,
    /// Resolved callee of a `material_function_call` node.
    pub(crate) callee: Option<FunctionIdx>,
}

/// A material function after normalization.
#[derive(Clone, Debug)]
pub(crate) struct Function {
    pub(crate) name: String,
    /// `function_input` nodes by input name.
    pub(crate) inputs: HashMap<String, NodeIdx>,
    /// `function_output` nodes in output order.
    pub(crate) outputs: Vec<NodeIdx>,
}

/// Validated material graph: node ids resolved to indices, functions resolved, texture names
/// resolved to their referenced-texture slot.
#[derive(Clone, Debug)]
pub struct MaterialGraph {
    pub(crate) def: MaterialDef,
    pub(crate) nodes: Vec<Node>,
    pub(crate) functions: Vec<Function>,
    textures: HashMap<String, u32>,
}

impl MaterialGraph {
    /// Normalize `def`. Cycles between nodes are allowed here; the translator reports them.
    pub fn new(mut def: MaterialDef) -> MaterialResult<Self> {
        let textures = def
            .textures
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i as u32))
            .collect::<HashMap<_, _>>();
        if textures.len() != def.textures.len() {
            return Err(MaterialError::validation("duplicate texture name"));
        }

        let function_names = def
            .functions
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), FunctionIdx(i as u32)))
            .collect::<HashMap<_, _>>();
        if function_names.len() != def.functions.len() {
            return Err(MaterialError::validation("duplicate material function name"));
        }

        let mut nodes = Vec::new();
        let material_ids =
            push_scope(&mut nodes, std::mem::take(&mut def.expressions), None, "material")?;

        let mut functions = Vec::with_capacity(def.functions.len());
        let mut function_ids = Vec::with_capacity(def.functions.len());
        for (i, f) in def.functions.iter_mut().enumerate() {
            let base = nodes.len() as u32;
            let owner = FunctionIdx(i as u32);
            let scope = format!("function '{}'", f.name);
            let ids = push_scope(&mut nodes, std::mem::take(&mut f.expressions), Some(owner), &scope)?;

            let mut inputs = HashMap::new();
            let mut outputs = Vec::new();
            for (j, node) in nodes[base as usize..].iter().enumerate() {
                let idx = NodeIdx(base + j as u32);
                match &node.kind {
                    NodeKind::FunctionInput { input_name, .. } => {
                        if inputs.insert(input_name.clone(), idx).is_some() {
                            return Err(MaterialError::validation(format!(
                                "{scope} declares input '{input_name}' twice"
                            )));
                        }
                    }
                    NodeKind::FunctionOutput { sort_priority, .. } => {
                        outputs.push((*sort_priority, idx))
                    }
                    _ => {}
                }
            }
            // Stable: equal priorities keep declaration order.
            outputs.sort_by_key(|(priority, _)| *priority);
            functions.push(Function {
                name: f.name.clone(),
                inputs,
                outputs: outputs.into_iter().map(|(_, idx)| idx).collect(),
            });
            function_ids.push(ids);
        }

        for node in &mut nodes {
            let (ids, scope) = match node.function {
                Some(f) => (&function_ids[f.index()], functions[f.index()].name.as_str()),
                None => (&material_ids, "material"),
            };
            for input in node.kind.inputs_mut() {
                resolve(input, ids, scope, &node.id)?;
            }
            for name in node.kind.texture_names() {
                if !textures.contains_key(name) {
                    return Err(MaterialError::validation(format!(
                        "node '{}' references unknown texture '{name}'",
                        node.id
                    )));
                }
            }
            if let NodeKind::MaterialFunctionCall {
                function: Some(name),
                ..
            } = &node.kind
            {
                let callee = function_names.get(name).copied().ok_or_else(|| {
                    MaterialError::validation(format!(
                        "node '{}' calls unknown material function '{name}'",
                        node.id
                    ))
                })?;
                node.callee = Some(callee);
            }
        }

        for (property, input) in def.inputs.iter_mut() {
            if let PropertyInput::Expression(input) = input {
                let owner = format!("property {}", property_label(*property));
                resolve(input, &material_ids, "material", &owner)?;
            }
        }

        let graph = Self {
            def,
            nodes,
            functions,
            textures,
        };
        graph.check_function_recursion()?;
        tracing::debug!(
            nodes = graph.nodes.len(),
            functions = graph.functions.len(),
            "normalized material graph"
        );
        Ok(graph)
    }

    /// Parse and normalize a material document.
    pub fn from_json(text: &str) -> MaterialResult<Self> {
        Self::new(MaterialDef::from_json(text)?)
    }

    /// Material settings and property inputs.
    pub fn def(&self) -> &MaterialDef {
        &self.def
    }

    /// Number of nodes across the material and all of its functions.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, idx: NodeIdx) -> &Node {
        &self.nodes[idx.index()]
    }

    pub(crate) fn function(&self, idx: FunctionIdx) -> &Function {
        &self.functions[idx.index()]
    }

    /// Referenced-texture slot of a texture name.
    pub(crate) fn texture_index(&self, name: &str) -> Option<u32> {
        self.textures.get(name).copied()
    }

    /// Whether `output` of `node` carries a whole material attributes bundle.
    pub(crate) fn is_result_material_attributes(&self, node: NodeIdx, output: u32) -> bool {
        let mut visited = HashSet::new();
        self.is_material_attributes_rec(node, output, &mut visited)
    }

    fn is_material_attributes_rec(
        &self,
        node: NodeIdx,
        output: u32,
        visited: &mut HashSet<(NodeIdx, u32)>,
    ) -> bool {
        if !visited.insert((node, output)) {
            return false;
        }
        let follow = |input: &Option<InputRef>, visited: &mut HashSet<(NodeIdx, u32)>| {
            input
                .as_ref()
                .and_then(|i| i.target.map(|t| (t, i.output)))
                .is_some_and(|(t, o)| self.is_material_attributes_rec(t, o, visited))
        };
        let n = self.node(node);
        match &n.kind {
            NodeKind::MakeMaterialAttributes { .. } => true,
            NodeKind::FunctionInput { input_type, .. } => {
                *input_type == FunctionInputType::MaterialAttributes
            }
            NodeKind::FunctionOutput { a, .. } => follow(a, visited),
            NodeKind::StaticSwitch { a, .. } | NodeKind::StaticSwitchParameter { a, .. } => {
                follow(a, visited)
            }
            NodeKind::FeatureLevelSwitch { default, .. }
            | NodeKind::QualitySwitch { default, .. } => follow(default, visited),
            NodeKind::MaterialFunctionCall { .. } => n
                .callee
                .and_then(|f| self.function(f).outputs.get(output as usize).copied())
                .is_some_and(|out| self.is_material_attributes_rec(out, 0, visited)),
            _ => false,
        }
    }

    fn check_function_recursion(&self) -> MaterialResult<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        let mut callees = vec![Vec::new(); self.functions.len()];
        for node in &self.nodes {
            if let (Some(owner), Some(callee)) = (node.function, node.callee) {
                callees[owner.index()].push(callee.index());
            }
        }

        fn visit(
            f: usize,
            callees: &[Vec<usize>],
            marks: &mut [Mark],
            names: &[Function],
        ) -> MaterialResult<()> {
            match marks[f] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    return Err(MaterialError::validation(format!(
                        "material function '{}' calls itself recursively",
                        names[f].name
                    )));
                }
                Mark::Unvisited => {}
            }
            marks[f] = Mark::Active;
            for &c in &callees[f] {
                visit(c, callees, marks, names)?;
            }
            marks[f] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.functions.len()];
        for f in 0..self.functions.len() {
            visit(f, &callees, &mut marks, &self.functions)?;
        }
        Ok(())
    }
}

/// Ids of one scope (the material or a function); interner ids are scope-local positions.
struct ScopeIds {
    ids: StringInterner,
    base: u32,
}

fn push_scope(
    nodes: &mut Vec<Node>,
    expressions: Vec<ExpressionDef>,
    function: Option<FunctionIdx>,
    scope: &str,
) -> MaterialResult<ScopeIds> {
    let mut ids = StringInterner::new();
    let base = nodes.len() as u32;
    for e in expressions {
        if ids.lookup(&e.id).is_some() {
            return Err(MaterialError::validation(format!(
                "{scope} has duplicate node id '{}'",
                e.id
            )));
        }
        ids.intern(&e.id);
        nodes.push(Node {
            id: e.id,
            desc: e.desc,
            kind: e.node,
            function,
            callee: None,
        });
    }
    Ok(ScopeIds { ids, base })
}

fn resolve(input: &mut InputRef, ids: &ScopeIds, scope: &str, owner: &str) -> MaterialResult<()> {
    let local = ids.ids.lookup(&input.node).ok_or_else(|| {
        MaterialError::validation(format!(
            "{owner} in {scope} references unknown node '{}'",
            input.node
        ))
    })?;
    debug_assert_eq!(ids.ids.get(local), input.node);
    input.target = Some(NodeIdx(ids.base + local.0));
    Ok(())
}

fn property_label(p: MaterialProperty) -> String {
    if p == MaterialProperty::MaterialAttributes {
        "MaterialAttributes".to_string()
    } else {
        p.name()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/normalize.rs"]
mod tests;
