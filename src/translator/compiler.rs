//! Chunk emission, uniform expression bookkeeping, casts and the error channel.

use super::{ExpressionKey, FunctionFrame, HlslTranslator};
use crate::chunk::ShaderCodeChunk;
use crate::foundation::ids::{ChunkIdx, Code, NodeIdx, UniformExprId};
use crate::foundation::math::{F32Key, LinearColor};
use crate::graph::model::{InputRef, NodeKind};
use crate::types::{
    FeatureLevel, MaterialProperty, ShaderFrequency, ValueType, arithmetic_result_type,
    narrowing_mask, swizzle_component,
};
use crate::uniform::expr::{FoldedMathOp, UniformExpr};
use crate::uniform::set::add_unique;

const SCALAR_MASKS: [char; 4] = ['x', 'y', 'z', 'w'];

impl HlslTranslator<'_> {
    pub(crate) fn chunks(&self) -> &Vec<ShaderCodeChunk> {
        self.scopes.get(self.scope)
    }

    pub(crate) fn chunk(&self, idx: ChunkIdx) -> &ShaderCodeChunk {
        &self.chunks()[idx.index()]
    }

    /// Type of a compiled value; `UNKNOWN` for a failed one.
    pub(crate) fn ty(&self, code: Code) -> ValueType {
        code.map_or(ValueType::UNKNOWN, |idx| self.chunk(idx).ty)
    }

    pub(crate) fn uniform_of(&self, idx: ChunkIdx) -> Option<UniformExprId> {
        self.chunk(idx).uniform
    }

    pub(crate) fn is_non_constant_uniform(&self, idx: ChunkIdx) -> bool {
        self.uniform_of(idx)
            .is_some_and(|id| !self.output.uniform_expression_set.arena().is_constant(id))
    }

    fn push_chunk(&mut self, chunk: ShaderCodeChunk) -> ChunkIdx {
        let chunks = self.scopes.get_mut(self.scope);
        let idx = ChunkIdx(chunks.len() as u32);
        chunks.push(chunk);
        idx
    }

    /// Emit `code` into a local variable.
    pub(crate) fn add_code_chunk(&mut self, ty: ValueType, code: String) -> Code {
        self.add_code_chunk_inner(code, ty, false)
    }

    /// Emit `code` to be spliced into its users.
    pub(crate) fn add_inlined_code_chunk(&mut self, ty: ValueType, code: String) -> Code {
        self.add_code_chunk_inner(code, ty, true)
    }

    fn add_code_chunk_inner(&mut self, code: String, ty: ValueType, inlined: bool) -> Code {
        if ty == ValueType::UNKNOWN {
            return None;
        }
        if inlined {
            return Some(self.push_chunk(ShaderCodeChunk::inline(code, ty)));
        }
        if ty.is_float() {
            self.next_symbol += 1;
            let symbol = format!("Local{}", self.next_symbol);
            let definition = format!("\t{} {symbol} = {code};\r\n", ty.hlsl_type());
            return Some(self.push_chunk(ShaderCodeChunk::local(definition, symbol, ty)));
        }
        if ty == ValueType::MATERIAL_ATTRIBUTES {
            return self.error("Operation not supported on Material Attributes");
        }
        if ty.intersects(ValueType::TEXTURE) {
            return self.error("Operation not supported on a Texture");
        }
        if ty == ValueType::STATIC_BOOL {
            return self.error("Operation not supported on a Static Bool");
        }
        None
    }

    /// Emit a chunk backed by a uniform expression, sharing identical expressions across scopes.
    pub(crate) fn add_uniform_expression(
        &mut self,
        expr: UniformExpr,
        ty: ValueType,
        code: String,
    ) -> Code {
        if ty == ValueType::UNKNOWN {
            return None;
        }
        if ty.intersects(ValueType::TEXTURE) && !expr.is_texture() {
            return self.error("Operation not supported on a Texture");
        }
        if ty == ValueType::STATIC_BOOL {
            return self.error("Operation not supported on a Static Bool");
        }
        if ty == ValueType::MATERIAL_ATTRIBUTES {
            return self.error("Operation not supported on a MaterialAttributes");
        }

        let id = self.output.uniform_expression_set.arena_mut().intern(expr);
        let known = self.uniform_expressions.iter().any(|c| c.uniform == Some(id));
        if known {
            if let Some(i) = self.chunks().iter().position(|c| c.uniform == Some(id)) {
                return Some(ChunkIdx(i as u32));
            }
        } else {
            self.uniform_expressions
                .push(ShaderCodeChunk::uniform(id, code.clone(), ty));
        }
        Some(self.push_chunk(ShaderCodeChunk::uniform(id, code, ty)))
    }

    /// Register a non-constant uniform chunk in the set and emit the code reading it.
    pub(crate) fn access_uniform_expression(&mut self, idx: ChunkIdx) -> Code {
        let chunk = self.chunk(idx);
        let ty = chunk.ty;
        let id = chunk.uniform?;
        let previous = self.compiling_previous_frame;
        let set = &mut self.output.uniform_expression_set;
        let per_frame = set.arena().is_changing_per_frame(id);

        let code = if ty == ValueType::FLOAT {
            if per_frame && previous {
                let i = add_unique(&mut set.per_frame_prev_uniform_scalar_expressions, id);
                format!("UE_Material_PerFramePrevScalarExpression{i}")
            } else if per_frame {
                let i = add_unique(&mut set.per_frame_uniform_scalar_expressions, id);
                format!("UE_Material_PerFrameScalarExpression{i}")
            } else {
                let i = add_unique(&mut set.uniform_scalar_expressions, id);
                format!("Material.ScalarExpressions[{}].{}", i / 4, SCALAR_MASKS[i % 4])
            }
        } else if ty.is_float() {
            let mask = narrowing_mask(ty.num_components());
            if per_frame && previous {
                let i = add_unique(&mut set.per_frame_prev_uniform_vector_expressions, id);
                format!("UE_Material_PerFramePrevVectorExpression{i}{mask}")
            } else if per_frame {
                let i = add_unique(&mut set.per_frame_uniform_vector_expressions, id);
                format!("UE_Material_PerFrameVectorExpression{i}{mask}")
            } else {
                let i = add_unique(&mut set.uniform_vector_expressions, id);
                format!("Material.VectorExpressions[{i}]{mask}")
            }
        } else if ty == ValueType::TEXTURE2D {
            let i = add_unique(&mut set.uniform_2d_texture_expressions, id);
            format!("Material.Texture2D_{i}")
        } else if ty == ValueType::TEXTURE_CUBE {
            let i = add_unique(&mut set.uniform_cube_texture_expressions, id);
            format!("Material.TextureCube_{i}")
        } else {
            return self.error(format!("User input of unknown type: {}", ty.describe()));
        };
        self.add_inlined_code_chunk(ty, code)
    }

    /// Text a consumer splices in to read `idx`.
    pub(crate) fn parameter_code(&mut self, idx: ChunkIdx) -> String {
        if self.is_non_constant_uniform(idx) {
            return match self.access_uniform_expression(idx) {
                Some(access) => self.chunk(access).definition.clone(),
                None => String::new(),
            };
        }
        let chunk = self.chunk(idx);
        if chunk.uniform.is_some() || chunk.inline {
            chunk.definition.clone()
        } else {
            chunk.symbol_name.clone()
        }
    }

    /// Like [`Self::parameter_code`], with `0` standing in for a failed value.
    pub(crate) fn code_or_zero(&mut self, code: Code) -> String {
        code.map_or_else(|| "0".to_string(), |idx| self.parameter_code(idx))
    }

    /// Parameter code widened by replication to `dest`.
    pub(crate) fn coerce_parameter(&mut self, idx: ChunkIdx, dest: ValueType) -> String {
        let ty = self.chunk(idx).ty;
        if ty == dest {
            return self.parameter_code(idx);
        }
        if ty.intersects(dest) && ty.is_float() {
            let c = self.parameter_code(idx);
            return match dest {
                ValueType::FLOAT1 => format!("MaterialFloat({c})"),
                ValueType::FLOAT2 => format!("MaterialFloat2({c},{c})"),
                ValueType::FLOAT3 => format!("MaterialFloat3({c},{c},{c})"),
                ValueType::FLOAT4 => format!("MaterialFloat4({c},{c},{c},{c})"),
                _ => c,
            };
        }
        let definition = self.chunk(idx).definition.clone();
        self.error(format!(
            "Coercion failed: {definition}: {} -> {}",
            ty.describe(),
            dest.describe()
        ));
        String::new()
    }

    pub(crate) fn arithmetic_type(&mut self, a: ChunkIdx, b: ChunkIdx) -> ValueType {
        self.arithmetic_type_of(self.chunk(a).ty, self.chunk(b).ty)
    }

    pub(crate) fn arithmetic_type_of(&mut self, a: ValueType, b: ValueType) -> ValueType {
        match arithmetic_result_type(a, b) {
            Ok(ty) => ty,
            Err(msg) => {
                self.error(msg);
                ValueType::UNKNOWN
            }
        }
    }

    /// Record a compile error attributed to the node being compiled. Always returns `None`.
    pub(crate) fn error(&mut self, msg: impl Into<String>) -> Code {
        let graph = self.graph;
        let mut text = String::new();

        if let Some(call) = self.function_stack.get(1).and_then(|f| f.call) {
            if let Some(callee) = graph.node(call).callee {
                text.push_str(&format!("Function {}: ", graph.function(callee).name));
            }
        }

        if let Some(key) = self.frame().expression_stack.last() {
            let kind = &graph.node(key.node).kind;
            if !matches!(
                kind,
                NodeKind::MaterialFunctionCall { .. }
                    | NodeKind::FunctionInput { .. }
                    | NodeKind::FunctionOutput { .. }
            ) {
                text.push_str(&format!("(Node {}) ", kind.class_name()));
            }
        }

        text.push_str(&msg.into());
        tracing::debug!(error = %text, "material compile error");
        if !self.errors.contains(&text) {
            self.errors.push(text);
        }
        self.success = false;
        None
    }

    /// Error prefixed with the node description, used by node-level checks.
    pub(crate) fn compiler_error(&mut self, node: NodeIdx, msg: &str) -> Code {
        let n = self.graph.node(node);
        let label = if n.desc.is_empty() {
            n.kind.class_name().to_string()
        } else {
            n.desc.clone()
        };
        self.error(format!("{label}> {msg}"))
    }

    pub(crate) fn non_pixel_shader_expression_error(&mut self) -> Code {
        self.error("Invalid node used in vertex/hull/domain shader input!")
    }

    pub(crate) fn non_vertex_or_pixel_shader_expression_error(&mut self) -> Code {
        self.error("Invalid node used in hull/domain shader input!")
    }

    /// False (after recording an error) when the target feature level is below `required`.
    pub(crate) fn feature_level_supported(&mut self, required: FeatureLevel) -> bool {
        let current = self.options.feature_level;
        if current < required {
            self.error(format!("Node not supported in feature level {}", current.name()));
            return false;
        }
        true
    }

    pub(crate) fn is_pixel_or_compute(&self) -> bool {
        matches!(self.stage, ShaderFrequency::Pixel | ShaderFrequency::Compute)
    }

    pub(crate) fn is_vertex_pixel_or_compute(&self) -> bool {
        self.is_pixel_or_compute() || self.stage == ShaderFrequency::Vertex
    }

    /// Cast to `dest`, truncating wider floats and replicating a scalar; never pads otherwise.
    pub(crate) fn valid_cast(&mut self, code: Code, dest: ValueType) -> Code {
        let idx = code?;
        if self.is_non_constant_uniform(idx) {
            let accessed = self.access_uniform_expression(idx);
            return self.valid_cast(accessed, dest);
        }

        let source = self.chunk(idx).ty;
        if source.intersects(dest) {
            return Some(idx);
        }
        if source.is_float() && dest.is_float() {
            let (ns, nd) = (source.num_components(), dest.num_components());
            if ns > nd {
                let c = self.parameter_code(idx);
                return self.add_inlined_code_chunk(dest, format!("{c}{}", narrowing_mask(nd)));
            }
            if ns < nd {
                if ns != 1 {
                    return self.error(format!(
                        "Cannot cast from {} to {}.",
                        source.describe(),
                        dest.describe()
                    ));
                }
                let c = self.parameter_code(idx);
                let pad = format!(",{c}").repeat((nd - ns) as usize);
                return self.add_inlined_code_chunk(dest, format!("{}({c}{pad})", dest.hlsl_type()));
            }
            return Some(idx);
        }
        if dest == ValueType::MATERIAL_ATTRIBUTES {
            return Some(idx);
        }
        self.error(format!(
            "Cannot cast from {} to {}.",
            source.describe(),
            dest.describe()
        ))
    }

    /// Cast to `dest`, padding missing components with zeros (or the replicated scalar).
    pub(crate) fn force_cast(
        &mut self,
        code: Code,
        dest: ValueType,
        exact_match: bool,
        replicate_value: bool,
    ) -> Code {
        let idx = code?;
        if self.is_non_constant_uniform(idx) {
            let accessed = self.access_uniform_expression(idx);
            return self.force_cast(accessed, dest, exact_match, replicate_value);
        }

        let source = self.chunk(idx).ty;
        let matches = if exact_match {
            source == dest
        } else {
            source.intersects(dest)
        };
        if matches {
            return Some(idx);
        }
        if !(source.is_float() && dest.is_float()) {
            return self.error("Cannot force a cast between non-numeric types.");
        }

        let (ns, nd) = (source.num_components(), dest.num_components());
        if ns > nd {
            let c = self.parameter_code(idx);
            return self.add_inlined_code_chunk(dest, format!("{c}{}", narrowing_mask(nd)));
        }
        if ns < nd {
            let c = self.parameter_code(idx);
            let filler = if replicate_value && ns == 1 {
                format!(",{c}")
            } else {
                ",0".to_string()
            };
            let pad = filler.repeat((nd - ns) as usize);
            return self.add_inlined_code_chunk(dest, format!("{}({c}{pad})", dest.hlsl_type()));
        }
        Some(idx)
    }

    pub(crate) fn frame(&self) -> &FunctionFrame {
        &self.function_stack[self.function_stack.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut FunctionFrame {
        let last = self.function_stack.len() - 1;
        &mut self.function_stack[last]
    }

    /// Compile one node output once per function frame; a node already on the stack is a cycle.
    pub(crate) fn call_expression(&mut self, key: ExpressionKey) -> Code {
        if let Some(&code) = self.frame().code_map.get(&key) {
            return code;
        }
        if self.frame().expression_stack.contains(&key) {
            return self.error("Reentrant expression");
        }

        self.frame_mut().expression_stack.push(key);
        let depth = self.function_stack.len();
        let result = self.compile_node(key.node, key.output, key.multiplex);
        debug_assert_eq!(depth, self.function_stack.len());
        let popped = self.frame_mut().expression_stack.pop();
        debug_assert_eq!(popped, Some(key));
        self.frame_mut().code_map.insert(key, result);
        result
    }

    /// Compile a connection: the source output, its output mask, then the explicit mask.
    pub(crate) fn compile_input(
        &mut self,
        input: &InputRef,
        multiplex: Option<MaterialProperty>,
    ) -> Code {
        let Some(node) = input.target else {
            return self.error(format!("Unresolved input '{}'", input.node));
        };
        let key = ExpressionKey {
            node,
            output: input.output,
            multiplex,
        };
        let mut result = self.call_expression(key);
        if let Some([r, g, b, a]) = self.graph.node(node).kind.output_mask(input.output) {
            result = self.component_mask(result, r, g, b, a);
        }
        if let Some([r, g, b, a]) = input.mask {
            result = self.component_mask(result, r, g, b, a);
        }
        result
    }

    /// Compile an optional connection; `None` when unconnected.
    pub(crate) fn compile_opt(&mut self, input: &Option<InputRef>) -> Code {
        input.as_ref().and_then(|i| self.compile_input(i, None))
    }

    /// Compile a connection, or the constant when unconnected.
    pub(crate) fn compile_or_constant(&mut self, input: &Option<InputRef>, value: f32) -> Code {
        match input {
            Some(i) => self.compile_input(i, None),
            None => self.constant(value),
        }
    }

    /// Enter a material function: compile one of its outputs in a fresh frame.
    pub(crate) fn function_call(
        &mut self,
        call: NodeIdx,
        output: u32,
        multiplex: Option<MaterialProperty>,
    ) -> Code {
        let graph = self.graph;
        let Some(callee) = graph.node(call).callee else {
            return self.error("Missing Material Function");
        };
        let Some(&out) = graph.function(callee).outputs.get(output as usize) else {
            return self.error("Invalid function output");
        };
        self.function_stack.push(FunctionFrame::call(call));
        let result = self.call_expression(ExpressionKey {
            node: out,
            output: 0,
            multiplex,
        });
        self.function_stack.pop();
        result
    }

    /// Resolve a function input against the current call site.
    pub(crate) fn function_input(
        &mut self,
        node: NodeIdx,
        multiplex: Option<MaterialProperty>,
    ) -> Code {
        let graph = self.graph;
        let NodeKind::FunctionInput {
            input_name,
            input_type,
            preview,
            use_preview_value_as_default,
            preview_value,
            ..
        } = &graph.node(node).kind
        else {
            return None;
        };
        let ty = input_type.value_type();

        let bound = self.frame().call.and_then(|c| match &graph.node(c).kind {
            NodeKind::MaterialFunctionCall { inputs, .. } => inputs.get(input_name),
            _ => None,
        });

        if let Some(input) = bound {
            // The binding lives in the caller's frame.
            let frame = self.function_stack.pop();
            let result = self.compile_input(input, multiplex);
            if let Some(frame) = frame {
                self.function_stack.push(frame);
            }
            return self.valid_cast(result, ty);
        }

        if !use_preview_value_as_default {
            return self.error(format!("Missing function input '{input_name}'"));
        }

        // The preview is wired inside the function, so it compiles in the current frame.
        let result = match preview {
            Some(preview) => self.compile_input(preview, multiplex),
            None => {
                let [x, y, z, w] = *preview_value;
                match ty {
                    ValueType::FLOAT1 => self.constant(x),
                    ValueType::FLOAT2 => self.constant2(x, y),
                    ValueType::FLOAT3 => self.constant3(x, y, z),
                    ValueType::FLOAT4 => self.constant4(x, y, z, w),
                    _ => self.error(format!(
                        "Missing Preview connection for function input '{input_name}'"
                    )),
                }
            }
        };
        self.valid_cast(result, ty)
    }

    pub(crate) fn function_output(
        &mut self,
        node: NodeIdx,
        multiplex: Option<MaterialProperty>,
    ) -> Code {
        let graph = self.graph;
        let NodeKind::FunctionOutput { output_name, a, .. } = &graph.node(node).kind else {
            return None;
        };
        match a {
            Some(input) => self.compile_input(input, multiplex),
            None => self.error(format!("Missing function output '{output_name}'")),
        }
    }

    pub(crate) fn constant(&mut self, x: f32) -> Code {
        self.add_uniform_expression(
            UniformExpr::Constant {
                value: LinearColor::splat(x),
                value_type: ValueType::FLOAT,
            },
            ValueType::FLOAT,
            format!("{x:.8}"),
        )
    }

    pub(crate) fn constant2(&mut self, x: f32, y: f32) -> Code {
        self.add_uniform_expression(
            UniformExpr::Constant {
                value: LinearColor::new(x, y, 0.0, 0.0),
                value_type: ValueType::FLOAT2,
            },
            ValueType::FLOAT2,
            format!("MaterialFloat2({x:.8},{y:.8})"),
        )
    }

    pub(crate) fn constant3(&mut self, x: f32, y: f32, z: f32) -> Code {
        self.add_uniform_expression(
            UniformExpr::Constant {
                value: LinearColor::new(x, y, z, 0.0),
                value_type: ValueType::FLOAT3,
            },
            ValueType::FLOAT3,
            format!("MaterialFloat3({x:.8},{y:.8},{z:.8})"),
        )
    }

    pub(crate) fn constant4(&mut self, x: f32, y: f32, z: f32, w: f32) -> Code {
        self.add_uniform_expression(
            UniformExpr::Constant {
                value: LinearColor::new(x, y, z, w),
                value_type: ValueType::FLOAT4,
            },
            ValueType::FLOAT4,
            format!("MaterialFloat4({x:.8},{y:.8},{z:.8},{w:.8})"),
        )
    }

    pub(crate) fn scalar_parameter(&mut self, name: &str, default_value: f32) -> Code {
        self.add_uniform_expression(
            UniformExpr::ScalarParameter {
                name: name.to_string(),
                default_value: F32Key(default_value),
            },
            ValueType::FLOAT,
            String::new(),
        )
    }

    pub(crate) fn vector_parameter(&mut self, name: &str, default_value: LinearColor) -> Code {
        self.add_uniform_expression(
            UniformExpr::VectorParameter {
                name: name.to_string(),
                default_value,
            },
            ValueType::FLOAT4,
            String::new(),
        )
    }

    pub(crate) fn game_time(&mut self, periodic: bool, period: f32) -> Code {
        if !periodic {
            let name = if self.compiling_previous_frame {
                "View.PrevFrameGameTime"
            } else {
                "View.GameTime"
            };
            return self.add_inlined_code_chunk(ValueType::FLOAT, name.to_string());
        }
        if period == 0.0 {
            return self.constant(0.0);
        }
        self.periodic_time(UniformExpr::Time, period)
    }

    pub(crate) fn real_time(&mut self, periodic: bool, period: f32) -> Code {
        if !periodic {
            let name = if self.compiling_previous_frame {
                "View.PrevFrameRealTime"
            } else {
                "View.RealTime"
            };
            return self.add_inlined_code_chunk(ValueType::FLOAT, name.to_string());
        }
        if period == 0.0 {
            return self.constant(0.0);
        }
        self.periodic_time(UniformExpr::RealTime, period)
    }

    fn periodic_time(&mut self, time: UniformExpr, period: f32) -> Code {
        let arena = self.output.uniform_expression_set.arena_mut();
        let a = arena.intern(time);
        let b = arena.intern(UniformExpr::Constant {
            value: LinearColor::splat(period),
            value_type: ValueType::FLOAT,
        });
        self.add_uniform_expression(UniformExpr::Fmod { a, b }, ValueType::FLOAT, String::new())
    }

    pub(crate) fn periodic_hint(&mut self, code: Code) -> Code {
        let idx = code?;
        match self.uniform_of(idx) {
            Some(x) => {
                let ty = self.chunk(idx).ty;
                let c = self.parameter_code(idx);
                self.add_uniform_expression(UniformExpr::Periodic { x }, ty, c)
            }
            None => Some(idx),
        }
    }

    /// Unary op that folds into a uniform expression when its input is uniform.
    fn unary(
        &mut self,
        code: Code,
        func: &str,
        fold: impl FnOnce(UniformExprId) -> UniformExpr,
        result_type: Option<ValueType>,
    ) -> Code {
        let idx = code?;
        let ty = result_type.unwrap_or(self.chunk(idx).ty);
        let c = self.parameter_code(idx);
        match self.uniform_of(idx) {
            Some(x) => self.add_uniform_expression(fold(x), ty, format!("{func}({c})")),
            None => self.add_code_chunk(ty, format!("{func}({c})")),
        }
    }

    pub(crate) fn sine(&mut self, code: Code, is_cosine: bool) -> Code {
        let idx = code?;
        let func = if is_cosine { "cos" } else { "sin" };
        match self.uniform_of(idx) {
            Some(x) => {
                let c = self.coerce_parameter(idx, ValueType::FLOAT);
                self.add_uniform_expression(
                    UniformExpr::Sine { x, is_cosine },
                    ValueType::FLOAT,
                    format!("{func}({c})"),
                )
            }
            None => {
                let ty = self.chunk(idx).ty;
                let c = self.parameter_code(idx);
                self.add_code_chunk(ty, format!("{func}({c})"))
            }
        }
    }

    pub(crate) fn floor(&mut self, code: Code) -> Code {
        self.unary(code, "floor", |x| UniformExpr::Floor { x }, None)
    }

    pub(crate) fn ceil(&mut self, code: Code) -> Code {
        self.unary(code, "ceil", |x| UniformExpr::Ceil { x }, None)
    }

    pub(crate) fn frac(&mut self, code: Code) -> Code {
        self.unary(code, "frac", |x| UniformExpr::Frac { x }, None)
    }

    pub(crate) fn abs(&mut self, code: Code) -> Code {
        self.unary(code, "abs", |x| UniformExpr::Abs { x }, None)
    }

    pub(crate) fn square_root(&mut self, code: Code) -> Code {
        self.unary(code, "sqrt", |x| UniformExpr::SquareRoot { x }, None)
    }

    pub(crate) fn saturate(&mut self, code: Code) -> Code {
        self.unary(code, "saturate", |x| UniformExpr::Saturate { x }, None)
    }

    pub(crate) fn logarithm2(&mut self, code: Code) -> Code {
        self.unary(code, "log2", |x| UniformExpr::Logarithm2 { x }, None)
    }

    pub(crate) fn length(&mut self, code: Code) -> Code {
        self.unary(
            code,
            "length",
            |x| UniformExpr::Length { x },
            Some(ValueType::FLOAT),
        )
    }

    pub(crate) fn fmod(&mut self, a: Code, b: Code) -> Code {
        let (a, b) = (a?, b?);
        let ty = self.chunk(a).ty;
        let ca = self.parameter_code(a);
        let cb = self.coerce_parameter(b, ty);
        let code = format!("fmod({ca},{cb})");
        match (self.uniform_of(a), self.uniform_of(b)) {
            (Some(ua), Some(ub)) => {
                self.add_uniform_expression(UniformExpr::Fmod { a: ua, b: ub }, ty, code)
            }
            _ => self.add_code_chunk(ty, code),
        }
    }

    fn folded(&mut self, a: Code, b: Code, op: FoldedMathOp, symbol: &str) -> Code {
        let (a, b) = (a?, b?);
        let ty = self.arithmetic_type(a, b);
        let ca = self.parameter_code(a);
        let cb = self.parameter_code(b);
        let code = format!("({ca} {symbol} {cb})");
        match (self.uniform_of(a), self.uniform_of(b)) {
            (Some(ua), Some(ub)) => {
                self.add_uniform_expression(UniformExpr::FoldedMath { a: ua, b: ub, op }, ty, code)
            }
            _ => self.add_code_chunk(ty, code),
        }
    }

    pub(crate) fn add(&mut self, a: Code, b: Code) -> Code {
        self.folded(a, b, FoldedMathOp::Add, "+")
    }

    pub(crate) fn sub(&mut self, a: Code, b: Code) -> Code {
        self.folded(a, b, FoldedMathOp::Sub, "-")
    }

    pub(crate) fn mul(&mut self, a: Code, b: Code) -> Code {
        self.folded(a, b, FoldedMathOp::Mul, "*")
    }

    pub(crate) fn div(&mut self, a: Code, b: Code) -> Code {
        self.folded(a, b, FoldedMathOp::Div, "/")
    }

    pub(crate) fn dot(&mut self, a: Code, b: Code) -> Code {
        let (a, b) = (a?, b?);
        let (ta, tb) = (self.chunk(a).ty, self.chunk(b).ty);
        // Promote the scalar, or truncate the wider side.
        let promote_a = ta == ValueType::FLOAT
            || (tb != ValueType::FLOAT && ta.num_components() > tb.num_components());

        match (self.uniform_of(a), self.uniform_of(b)) {
            (Some(ua), Some(ub)) => {
                if ta == ValueType::FLOAT && tb == ValueType::FLOAT {
                    let (ca, cb) = (self.parameter_code(a), self.parameter_code(b));
                    return self.add_uniform_expression(
                        UniformExpr::FoldedMath {
                            a: ua,
                            b: ub,
                            op: FoldedMathOp::Mul,
                        },
                        ValueType::FLOAT,
                        format!("mul({ca},{cb})"),
                    );
                }
                let (ca, cb) = if ta == tb {
                    (self.parameter_code(a), self.parameter_code(b))
                } else if promote_a {
                    (self.coerce_parameter(a, tb), self.parameter_code(b))
                } else {
                    (self.parameter_code(a), self.coerce_parameter(b, ta))
                };
                self.add_uniform_expression(
                    UniformExpr::FoldedMath {
                        a: ua,
                        b: ub,
                        op: FoldedMathOp::Dot,
                    },
                    ValueType::FLOAT,
                    format!("dot({ca},{cb})"),
                )
            }
            _ => {
                let (ca, cb) = if promote_a {
                    (self.coerce_parameter(a, tb), self.parameter_code(b))
                } else {
                    (self.parameter_code(a), self.coerce_parameter(b, ta))
                };
                self.add_code_chunk(ValueType::FLOAT, format!("dot({ca}, {cb})"))
            }
        }
    }

    pub(crate) fn cross(&mut self, a: Code, b: Code) -> Code {
        let (a, b) = (a?, b?);
        let ca = self.coerce_parameter(a, ValueType::FLOAT3);
        let cb = self.coerce_parameter(b, ValueType::FLOAT3);
        self.add_code_chunk(ValueType::FLOAT3, format!("cross({ca},{cb})"))
    }

    pub(crate) fn power(&mut self, base: Code, exponent: Code) -> Code {
        let (base, exponent) = (base?, exponent?);
        let ty = self.chunk(base).ty;
        let cb = self.parameter_code(base);
        let ce = self.coerce_parameter(exponent, ValueType::FLOAT);
        self.add_code_chunk(ty, format!("ClampedPow({cb},{ce})"))
    }

    pub(crate) fn lerp(&mut self, x: Code, y: Code, alpha: Code) -> Code {
        let (x, y, alpha) = (x?, y?, alpha?);
        let ty = self.arithmetic_type(x, y);
        let alpha_ty = if self.chunk(alpha).ty == ty {
            ty
        } else {
            ValueType::FLOAT1
        };
        let cx = self.coerce_parameter(x, ty);
        let cy = self.coerce_parameter(y, ty);
        let ca = self.coerce_parameter(alpha, alpha_ty);
        self.add_code_chunk(ty, format!("lerp({cx},{cy},{ca})"))
    }

    fn min_max(&mut self, a: Code, b: Code, is_max: bool) -> Code {
        let (a, b) = (a?, b?);
        let ty = self.chunk(a).ty;
        let func = if is_max { "max" } else { "min" };
        let ca = self.parameter_code(a);
        let cb = self.coerce_parameter(b, ty);
        let code = format!("{func}({ca},{cb})");
        match (self.uniform_of(a), self.uniform_of(b)) {
            (Some(ua), Some(ub)) => {
                let expr = if is_max {
                    UniformExpr::Max { a: ua, b: ub }
                } else {
                    UniformExpr::Min { a: ua, b: ub }
                };
                self.add_uniform_expression(expr, ty, code)
            }
            _ => self.add_code_chunk(ty, code),
        }
    }

    pub(crate) fn min(&mut self, a: Code, b: Code) -> Code {
        self.min_max(a, b, false)
    }

    pub(crate) fn max(&mut self, a: Code, b: Code) -> Code {
        self.min_max(a, b, true)
    }

    pub(crate) fn clamp(&mut self, x: Code, min: Code, max: Code) -> Code {
        let (x, min, max) = (x?, min?, max?);
        let ty = self.chunk(x).ty;
        let cx = self.parameter_code(x);
        let cmin = self.coerce_parameter(min, ty);
        let cmax = self.coerce_parameter(max, ty);
        let code = format!("min(max({cx},{cmin}),{cmax})");
        match (self.uniform_of(x), self.uniform_of(min), self.uniform_of(max)) {
            (Some(input), Some(min), Some(max)) => {
                self.add_uniform_expression(UniformExpr::Clamp { input, min, max }, ty, code)
            }
            _ => self.add_code_chunk(ty, code),
        }
    }

    pub(crate) fn component_mask(
        &mut self,
        code: Code,
        r: bool,
        g: bool,
        b: bool,
        a: bool,
    ) -> Code {
        let idx = code?;
        let ty = self.chunk(idx).ty;
        let float_bits = ty.bits() & ValueType::FLOAT.bits();
        let flags = format!("{}{}{}{}", r as u8, g as u8, b as u8, a as u8);

        if (a && float_bits < ValueType::FLOAT4.bits())
            || (b && float_bits < ValueType::FLOAT3.bits())
            || (g && float_bits < ValueType::FLOAT2.bits())
            || (r && float_bits < ValueType::FLOAT1.bits())
        {
            let c = self.parameter_code(idx);
            return self.error(format!(
                "Not enough components in ({c}: {}) for component mask {flags}",
                ty.describe()
            ));
        }

        let count = [r, g, b, a].iter().filter(|&&on| on).count() as u32;
        if count == 0 {
            return self.error(format!(
                "Couldn't determine result type of component mask {flags}"
            ));
        }
        let result_type = ValueType::vector_type(count);

        // A generic float may be any width; treat it as a scalar.
        let generic = ty == ValueType::FLOAT;
        let mask: String = [(r, 'r'), (g, 'g'), (b, 'b'), (a, 'a')]
            .iter()
            .filter(|(on, _)| *on)
            .map(|&(_, letter)| if generic { 'r' } else { letter })
            .collect();

        let c = self.parameter_code(idx);
        match self.uniform_of(idx) {
            Some(x) => {
                let mut indices = [None; 4];
                for (slot, letter) in indices.iter_mut().zip(mask.chars()) {
                    *slot = swizzle_component(letter).map(|i| i as u8);
                }
                self.add_uniform_expression(
                    UniformExpr::component_swizzle(x, indices),
                    result_type,
                    format!("{c}.{mask}"),
                )
            }
            None => self.add_inlined_code_chunk(result_type, format!("{c}.{mask}")),
        }
    }

    pub(crate) fn append_vector(&mut self, a: Code, b: Code) -> Code {
        let (a, b) = (a?, b?);
        let (ta, tb) = (self.chunk(a).ty, self.chunk(b).ty);
        if !ta.is_float() || !tb.is_float() {
            return self.error("Cannot append non-float values");
        }
        let (na, nb) = (ta.num_components(), tb.num_components());
        let n = na + nb;
        if n > 4 {
            return self.error("Appended vector would have more than 4 components");
        }
        let result_type = ValueType::vector_type(n);
        let ca = self.parameter_code(a);
        let cb = self.parameter_code(b);
        let code = format!("MaterialFloat{n}({ca},{cb})");
        match (self.uniform_of(a), self.uniform_of(b)) {
            (Some(ua), Some(ub)) => self.add_uniform_expression(
                UniformExpr::AppendVector {
                    a: ua,
                    b: ub,
                    num_components_a: na,
                },
                result_type,
                code,
            ),
            _ => self.add_inlined_code_chunk(result_type, code),
        }
    }

    pub(crate) fn if_select(
        &mut self,
        a: Code,
        b: Code,
        greater: Code,
        equal: Code,
        less: Code,
        threshold: Code,
    ) -> Code {
        let (a, b, greater, less, threshold) = (a?, b?, greater?, less?, threshold?);

        if let Some(equal) = equal {
            let inner = self.arithmetic_type(equal, less);
            let ty = self.arithmetic_type_of(self.chunk(greater).ty, inner);
            let g = self.force_cast(Some(greater), ty, false, false)?;
            let e = self.force_cast(Some(equal), ty, false, false)?;
            let l = self.force_cast(Some(less), ty, false, false)?;
            let (ca, cb, ct) = (
                self.parameter_code(a),
                self.parameter_code(b),
                self.parameter_code(threshold),
            );
            let (cg, cl, ce) = (
                self.parameter_code(g),
                self.parameter_code(l),
                self.parameter_code(e),
            );
            return self.add_code_chunk(
                ty,
                format!("((abs({ca} - {cb}) > {ct}) ? ({ca} >= {cb} ? {cg} : {cl}) : {ce})"),
            );
        }

        let ty = self.arithmetic_type(greater, less);
        let g = self.force_cast(Some(greater), ty, false, false)?;
        let l = self.force_cast(Some(less), ty, false, false)?;
        let (ca, cb) = (self.parameter_code(a), self.parameter_code(b));
        let (cg, cl) = (self.parameter_code(g), self.parameter_code(l));
        self.add_code_chunk(ty, format!("(({ca} >= {cb}) ? {cg} : {cl})"))
    }

    pub(crate) fn texture_coordinate(
        &mut self,
        index: u32,
        un_mirror_u: bool,
        un_mirror_v: bool,
    ) -> Code {
        let max = if self.options.feature_level == FeatureLevel::Es2 {
            3
        } else {
            8
        };
        if index >= max {
            return self.error(format!(
                "Only {max} texture coordinate sets can be used by this feature level, currently using {}",
                index + 1
            ));
        }

        if self.stage == ShaderFrequency::Vertex {
            self.num_user_vertex_tex_coords = self.num_user_vertex_tex_coords.max(index + 1);
        } else {
            self.num_user_tex_coords = self.num_user_tex_coords.max(index + 1);
        }

        let uv = format!("Parameters.TexCoords[{index}].xy");
        let code = match (un_mirror_u, un_mirror_v) {
            (true, true) => format!("UnMirrorUV({uv}, Parameters)"),
            (true, false) => format!("UnMirrorU({uv}, Parameters)"),
            (false, true) => format!("UnMirrorV({uv}, Parameters)"),
            (false, false) => uv,
        };
        self.add_inlined_code_chunk(ValueType::FLOAT2, code)
    }

    pub(crate) fn static_bool(&mut self, value: bool) -> Code {
        let text = if value { "true" } else { "false" };
        self.add_inlined_code_chunk(ValueType::STATIC_BOOL, text.to_string())
    }

    /// Value of a compiled static bool; `None` (after an error when mistyped) otherwise.
    pub(crate) fn static_bool_value(&mut self, code: Code) -> Option<bool> {
        let idx = code?;
        let ty = self.chunk(idx).ty;
        if ty != ValueType::STATIC_BOOL {
            self.error(format!(
                "Failed to cast {} input to static bool type",
                ty.describe()
            ));
            return None;
        }
        Some(self.parameter_code(idx).contains("true"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/translator/compiler.rs"]
mod tests;
