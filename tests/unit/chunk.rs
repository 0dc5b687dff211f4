use super::*;

fn local(n: u32) -> ShaderCodeChunk {
    ShaderCodeChunk::local(
        format!("\tMaterialFloat Local{n} = sin(1.0);\r\n"),
        format!("Local{n}"),
        ValueType::FLOAT,
    )
}

#[test]
fn definitions_skip_inline_and_uniform_chunks() {
    let chunks = vec![
        local(0),
        ShaderCodeChunk::inline("Parameters.VertexColor".to_string(), ValueType::FLOAT4),
        ShaderCodeChunk::uniform(UniformExprId(0), "1.00000000".to_string(), ValueType::FLOAT),
        local(1),
    ];
    assert_eq!(
        definitions(&chunks),
        "\tMaterialFloat Local0 = sin(1.0);\r\n\tMaterialFloat Local1 = sin(1.0);\r\n"
    );
}

#[test]
fn missing_result_reads_as_zero() {
    let code = fixed_parameter_code(None, &[], |_| true);
    assert_eq!(code.value, "0");
    assert_eq!(code.function_body(), "\treturn 0;");
}

#[test]
fn constant_result_has_no_definitions() {
    let chunks = vec![
        local(0),
        ShaderCodeChunk::uniform(UniformExprId(3), "0.50000000".to_string(), ValueType::FLOAT),
    ];
    let code = fixed_parameter_code(Some(ChunkIdx(1)), &chunks, |_| true);
    assert_eq!(code.definitions, "");
    assert_eq!(code.value, "0.50000000");
}

#[test]
fn symbol_result_carries_every_definition() {
    let chunks = vec![local(0), local(1)];
    let code = fixed_parameter_code(Some(ChunkIdx(1)), &chunks, |_| false);
    assert_eq!(code.value, "Local1");
    assert!(code.function_body().ends_with("\treturn Local1;"));
    assert!(code.definitions.contains("Local0"));
}

#[test]
fn scopes_are_separate_per_property_and_stage() {
    let mut scopes = ChunkScopes::default();
    let pixel = Scope::Property(MaterialProperty::BaseColor, ShaderFrequency::Pixel);
    let vertex = Scope::Property(MaterialProperty::BaseColor, ShaderFrequency::Vertex);
    scopes.get_mut(pixel).push(local(0));
    assert_eq!(scopes.get(pixel).len(), 1);
    assert!(scopes.get(vertex).is_empty());

    scopes.get_mut(Scope::CustomOutput).push(local(1));
    scopes.reset_custom_output();
    assert!(scopes.get(Scope::CustomOutput).is_empty());
}
