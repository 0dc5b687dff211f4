//! Custom HLSL expressions and custom output functions.

use super::{ExpressionKey, FunctionFrame, HlslTranslator};
use crate::chunk::{FixedCode, Scope, fixed_parameter_code};
use crate::foundation::ids::{Code, NodeIdx};
use crate::graph::model::{CustomInput, CustomOutputType, NodeKind};
use crate::types::{ShaderFrequency, ValueType};
use std::collections::BTreeSet;

/// Function name and output count of a custom output node.
fn custom_output_signature(kind: &NodeKind) -> Option<(&str, u32)> {
    match kind {
        NodeKind::CustomOutput {
            function_name,
            inputs,
        } => Some((function_name.as_str(), inputs.len() as u32)),
        NodeKind::ClearCoatNormalCustomOutput { .. } => Some(("ClearCoatBottomNormal", 1)),
        _ => None,
    }
}

fn hlsl_float_type(ty: ValueType) -> Option<&'static str> {
    match ty {
        ValueType::FLOAT | ValueType::FLOAT1 => Some("MaterialFloat"),
        ValueType::FLOAT2 => Some("MaterialFloat2"),
        ValueType::FLOAT3 => Some("MaterialFloat3"),
        ValueType::FLOAT4 => Some("MaterialFloat4"),
        _ => None,
    }
}

impl HlslTranslator<'_> {
    fn parameters_struct(&self) -> &'static str {
        if self.stage == ShaderFrequency::Vertex {
            "Vertex"
        } else {
            "Pixel"
        }
    }

    /// Emit a uniquely named function wrapping the user code and a call to it.
    pub(crate) fn custom_expression_node(
        &mut self,
        code: &str,
        output_type: CustomOutputType,
        description: &str,
        inputs: &[CustomInput],
    ) -> Code {
        let mut compiled = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.iter().enumerate() {
            if input.name.is_empty() {
                continue;
            }
            let Some(source) = &input.input else {
                return self.error(format!(
                    "Custom material {description} missing input {} ({})",
                    i + 1,
                    input.name
                ));
            };
            let chunk = self.compile_input(source, None)?;
            compiled.push((input.name.as_str(), chunk));
        }

        let mut declarations = String::new();
        let mut arguments = String::new();
        for &(name, chunk) in &compiled {
            let ty = self.chunk(chunk).ty;
            let parameter = self.parameter_code(chunk);
            declarations.push(',');
            arguments.push(',');
            arguments.push_str(&parameter);
            match ty {
                ValueType::TEXTURE2D | ValueType::TEXTURE_CUBE => {
                    let texture = if ty == ValueType::TEXTURE2D {
                        "Texture2D"
                    } else {
                        "TextureCube"
                    };
                    declarations.push_str(&format!("{texture} {name}, sampler {name}Sampler "));
                    arguments.push_str(&format!(",{parameter}Sampler"));
                }
                _ => match hlsl_float_type(ty) {
                    Some(hlsl) => declarations.push_str(&format!("{hlsl} {name}")),
                    None => {
                        return self.error(format!(
                            "Bad type {} for {description} input {name}",
                            ty.describe()
                        ));
                    }
                },
            }
        }

        let index = self.custom_expression_implementations.len();
        let mut body = code.to_string();
        if !body.contains("return") {
            body = format!("return {body};");
        }
        let body = body.replace('\n', "\r\n");
        let ty = output_type.value_type();
        let return_type = hlsl_float_type(ty).unwrap_or("MaterialFloat");
        let implementation = format!(
            "{return_type} CustomExpression{index}(FMaterial{}Parameters Parameters{declarations})\r\n{{\r\n{body}\r\n}}\r\n",
            self.parameters_struct()
        );
        self.custom_expression_implementations.push(implementation);
        self.add_code_chunk(ty, format!("CustomExpression{index}(Parameters{arguments})"))
    }

    /// Emit the implementation of one custom output function. The result itself is unused.
    pub(crate) fn custom_output(&mut self, node: NodeIdx, output: u32, code: Code) -> Code {
        if let Some(property) = self.material_property {
            return self.error(format!(
                "A Custom Output node should not be attached to the {} material property",
                property.name()
            ));
        }
        let code = code?;
        let graph = self.graph;
        let kind = &graph.node(node).kind;
        let Some((function_name, _)) = custom_output_signature(kind) else {
            return None;
        };

        let ty = self.chunk(code).ty;
        let Some(return_type) = hlsl_float_type(ty) else {
            return self.error(format!("Bad type {} for {}", ty.describe(), kind.class_name()));
        };

        let fixed = if self.is_non_constant_uniform(code) {
            FixedCode {
                definitions: String::new(),
                value: self.parameter_code(code),
            }
        } else {
            let arena = self.output.uniform_expression_set.arena();
            fixed_parameter_code(Some(code), self.scopes.get(self.scope), |id| {
                arena.is_constant(id)
            })
        };
        let implementation = format!(
            "{return_type} {function_name}{output}(FMaterial{}Parameters Parameters)\r\n{{\r\n{} return {};\r\n}}\r\n",
            self.parameters_struct(),
            fixed.definitions,
            fixed.value
        );
        self.custom_output_implementations.push(implementation);
        None
    }

    /// Compile every output of each material-level custom output node in its own scratch
    /// scope. Only one node per function name is allowed.
    pub(crate) fn gather_custom_outputs(&mut self) {
        let graph = self.graph;
        let mut seen = BTreeSet::new();
        for (i, node) in graph.nodes.iter().enumerate() {
            if node.function.is_some() {
                continue;
            }
            let Some((function_name, count)) = custom_output_signature(&node.kind) else {
                continue;
            };
            if !seen.insert(function_name) {
                let description = if node.desc.is_empty() {
                    node.kind.class_name()
                } else {
                    node.desc.as_str()
                };
                self.error(format!("The material can contain only one {description} node"));
                continue;
            }

            self.custom_output_defines.push_str(&format!(
                "#define NUM_MATERIAL_OUTPUTS_{} {count}\r\n",
                function_name.to_uppercase()
            ));
            for output in 0..count {
                self.function_stack.clear();
                self.function_stack.push(FunctionFrame::default());
                self.material_property = None;
                self.stage = ShaderFrequency::Pixel;
                self.compiling_previous_frame = false;
                self.scope = Scope::CustomOutput;
                self.scopes.reset_custom_output();
                self.call_expression(ExpressionKey {
                    node: NodeIdx(i as u32),
                    output,
                    multiplex: None,
                });
            }
            tracing::debug!(function = function_name, outputs = count, "compiled custom output");
        }
    }
}
