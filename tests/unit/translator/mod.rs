use super::*;

fn translated_with(json: &str, options: &TranslatorOptions) -> TranslatedMaterial {
    let graph = MaterialGraph::from_json(json).unwrap();
    let template = MaterialTemplate::builtin().unwrap();
    match translate(&graph, options, &template) {
        Ok(t) => t,
        Err(e) => panic!("translation failed: {e}"),
    }
}

fn translated(json: &str) -> TranslatedMaterial {
    translated_with(json, &TranslatorOptions::default())
}

fn errors_with(json: &str, options: &TranslatorOptions) -> Vec<String> {
    let graph = MaterialGraph::from_json(json).unwrap();
    let mut translator = HlslTranslator::new(&graph, options);
    assert!(!translator.translate(), "expected translation to fail");
    translator.errors().to_vec()
}

fn errors(json: &str) -> Vec<String> {
    errors_with(json, &TranslatorOptions::default())
}

#[test]
fn constant_property_is_returned_directly() {
    let out = translated(
        r#"{ "name": "Red", "inputs": { "base_color": { "constant": [1, 0, 0] } } }"#,
    );
    assert_eq!(out.name, "Red");
    assert!(
        out.shader_code
            .contains("\treturn MaterialFloat3(1.00000000,0.00000000,0.00000000);"),
        "{}",
        out.shader_code
    );
    assert!(out.output.uniform_expression_set.scalar_expressions().is_empty());
    assert!(!out.output.modifies_mesh_position);
}

#[test]
fn scalar_parameter_becomes_a_uniform_buffer_scalar() {
    let out = translated(
        r#"{
            "name": "Tinted",
            "expressions": [
                { "id": "tint", "kind": "scalar_parameter", "parameter_name": "Tint",
                  "default_value": 0.5 }
            ],
            "inputs": { "roughness": { "node": "tint" } }
        }"#,
    );
    assert!(out.shader_code.contains("\treturn Material.ScalarExpressions[0].x;"));

    let set = &out.output.uniform_expression_set;
    assert_eq!(
        set.summary_string(),
        "(0 vectors, 1 scalars, 0 2d tex, 0 cube tex, 0 scalars/frame, 0 vectors/frame, 0 collections)"
    );
    let layout = set.buffer_struct().expect("layout is built");
    let scalars = layout.member("ScalarExpressions").expect("scalar member");
    let buffer = set
        .create_uniform_buffer(&RenderContext::new(0.0, 0.0, &[]))
        .unwrap();
    assert_eq!(buffer.read_f32(scalars.offset), Some(0.5));
}

#[test]
fn errors_name_the_failing_node() {
    let errors = errors(
        r#"{
            "name": "M",
            "expressions": [ { "id": "m", "kind": "fmod", "a": { "node": "c" } },
                             { "id": "c", "kind": "constant", "value": 1.0 } ],
            "inputs": { "roughness": { "node": "m" } }
        }"#,
    );
    assert_eq!(errors, vec!["(Node Fmod) Missing Fmod input B".to_string()]);
}

#[test]
fn errors_inside_functions_name_the_function() {
    let errors = errors(
        r#"{
            "name": "M",
            "expressions": [ { "id": "call", "kind": "material_function_call", "function": "F" } ],
            "inputs": { "roughness": { "node": "call" } },
            "functions": [{
                "name": "F",
                "expressions": [
                    { "id": "abs", "kind": "abs" },
                    { "id": "out", "kind": "function_output", "output_name": "Result",
                      "a": { "node": "abs" } }
                ]
            }]
        }"#,
    );
    assert_eq!(errors, vec!["Function F: (Node Abs) Missing Abs input".to_string()]);
}

#[test]
fn function_inputs_bind_to_the_call_site() {
    let out = translated(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "call", "kind": "material_function_call", "function": "Double",
                  "inputs": { "X": { "node": "quarter" } } },
                { "id": "quarter", "kind": "constant", "value": 0.25 }
            ],
            "inputs": { "roughness": { "node": "call" } },
            "functions": [{
                "name": "Double",
                "expressions": [
                    { "id": "x", "kind": "function_input", "input_name": "X",
                      "input_type": "scalar" },
                    { "id": "m", "kind": "multiply", "a": { "node": "x" }, "const_b": 2.0 },
                    { "id": "out", "kind": "function_output", "output_name": "Result",
                      "a": { "node": "m" } }
                ]
            }]
        }"#,
    );
    assert!(
        out.shader_code.contains("\treturn (0.25000000 * 2.00000000);"),
        "{}",
        out.shader_code
    );
}

#[test]
fn unbound_function_input_without_preview_is_an_error() {
    let errors = errors(
        r#"{
            "name": "M",
            "expressions": [ { "id": "call", "kind": "material_function_call", "function": "F" } ],
            "inputs": { "roughness": { "node": "call" } },
            "functions": [{
                "name": "F",
                "expressions": [
                    { "id": "x", "kind": "function_input", "input_name": "X",
                      "input_type": "scalar" },
                    { "id": "out", "kind": "function_output", "output_name": "Result",
                      "a": { "node": "x" } }
                ]
            }]
        }"#,
    );
    assert_eq!(errors, vec!["Function F: Missing function input 'X'".to_string()]);
}

#[test]
fn every_failing_property_reports_its_error() {
    let graph = MaterialGraph::from_json(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "m", "kind": "fmod" },
                { "id": "light", "kind": "light_vector" }
            ],
            "inputs": {
                "roughness": { "node": "m" },
                "emissive_color": { "node": "light" }
            }
        }"#,
    )
    .unwrap();
    let options = TranslatorOptions::default();
    let mut translator = HlslTranslator::new(&graph, &options);
    assert!(!translator.translate());
    assert!(!translator.success());
    let errors = translator.errors();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors.iter().any(|e| e.ends_with("Missing Fmod input A")));
    assert!(
        errors
            .iter()
            .any(|e| e.ends_with("LightVector can only be used in LightFunction or DeferredDecal materials"))
    );

    let template = MaterialTemplate::builtin().unwrap();
    let err = translator.material_shader_code(&template).unwrap_err();
    assert!(err.to_string().contains("Missing Fmod input A"), "{err}");
}

#[test]
fn shader_code_requires_a_translation() {
    let graph = MaterialGraph::from_json(r#"{ "name": "M" }"#).unwrap();
    let options = TranslatorOptions::default();
    let translator = HlslTranslator::new(&graph, &options);
    let template = MaterialTemplate::builtin().unwrap();
    assert!(translator.material_shader_code(&template).is_err());
}

#[test]
fn static_switch_compiles_only_the_selected_branch() {
    let json = r#"{
        "name": "M",
        "static_parameters": { "UseRed": true },
        "expressions": [
            { "id": "switch", "kind": "static_switch_parameter", "parameter_name": "UseRed",
              "a": { "node": "red" }, "b": { "node": "blue" } },
            { "id": "red", "kind": "constant3_vector", "value": [1, 0, 0] },
            { "id": "blue", "kind": "constant3_vector", "value": [0, 0, 1] },
            { "id": "gate", "kind": "static_switch", "value": { "node": "yes" },
              "a": { "node": "half" }, "b": { "node": "broken" } },
            { "id": "yes", "kind": "static_bool", "value": true },
            { "id": "half", "kind": "constant", "value": 0.5 },
            { "id": "broken", "kind": "fmod" }
        ],
        "inputs": {
            "base_color": { "node": "switch" },
            "metallic": { "node": "gate" }
        }
    }"#;
    let out = translated(json);
    assert!(
        out.shader_code
            .contains("return MaterialFloat3(1.00000000,0.00000000,0.00000000);")
    );
    assert!(out.shader_code.contains("return 0.50000000;"));
}

#[test]
fn switches_follow_feature_and_quality_levels() {
    let json = r#"{
        "name": "M",
        "expressions": [
            { "id": "fl", "kind": "feature_level_switch",
              "default": { "node": "one" }, "es2": { "node": "quarter" } },
            { "id": "q", "kind": "quality_switch",
              "default": { "node": "one" }, "low": { "node": "quarter" } },
            { "id": "one", "kind": "constant", "value": 1.0 },
            { "id": "quarter", "kind": "constant", "value": 0.25 }
        ],
        "inputs": { "roughness": { "node": "fl" }, "metallic": { "node": "q" } }
    }"#;

    let default = translated(json);
    assert!(!default.shader_code.contains("0.25000000"));

    let mobile = TranslatorOptions {
        feature_level: FeatureLevel::Es2,
        quality_level: crate::options::QualityLevel::Low,
        ..TranslatorOptions::default()
    };
    let out = translated_with(json, &mobile);
    assert_eq!(out.shader_code.matches("return 0.25000000;").count(), 2);
}

#[test]
fn light_functions_must_be_unlit() {
    let errors = errors(r#"{ "name": "M", "domain": "light_function" }"#);
    assert_eq!(errors, vec!["Light function materials must use unlit.".to_string()]);

    let out = translated(
        r#"{ "name": "M", "domain": "light_function", "shading_model": "unlit" }"#,
    );
    assert_eq!(out.environment.define("USES_DISTORTION"), Some("0"));
}

#[test]
fn scene_color_needs_a_translucent_surface() {
    let json = |blend: &str| {
        format!(
            r#"{{
                "name": "M",
                "blend_mode": "{blend}",
                "expressions": [ {{ "id": "sc", "kind": "scene_color" }} ],
                "inputs": {{ "emissive_color": {{ "node": "sc" }} }}
            }}"#
        )
    };
    assert_eq!(
        errors(&json("opaque")),
        vec!["Only translucent materials can use the scene color node.".to_string()]
    );

    let out = translated(&json("translucent"));
    assert!(out.output.requires_scene_color_copy);
    assert!(out.shader_code.contains("DecodeSceneColorForMaterialNode("));
}

#[test]
fn dbuffer_decals_depend_on_the_project_setting() {
    let json = r#"{
        "name": "Decal",
        "domain": "deferred_decal",
        "blend_mode": "translucent",
        "decal_blend_mode": "dbuffer_translucent_color"
    }"#;
    assert_eq!(
        errors(json),
        vec!["DBuffer decal blend modes are only supported when the 'DBuffer Decals' project setting is enabled.".to_string()]
    );

    let options = TranslatorOptions {
        dbuffer_decals: true,
        ..TranslatorOptions::default()
    };
    translated_with(json, &options);
}

#[test]
fn gbuffer_reads_fail_under_forward_shading() {
    let json = r#"{
        "name": "PP",
        "domain": "post_process",
        "shading_model": "unlit",
        "expressions": [ { "id": "st", "kind": "scene_texture", "scene_texture_id": "world_normal" } ],
        "inputs": { "emissive_color": { "node": "st" } }
    }"#;
    let out = translated(json);
    assert!(out.output.needs_gbuffer);
    assert!(out.output.needs_scene_textures);
    assert_eq!(out.environment.define("NEEDS_SCENE_TEXTURES"), Some("1"));

    let forward = TranslatorOptions {
        forward_shading: true,
        ..TranslatorOptions::default()
    };
    assert_eq!(
        errors_with(json, &forward),
        vec!["GBuffer scene textures are not available when the project uses forward shading.".to_string()]
    );
}

#[test]
fn custom_expression_emits_a_function_and_a_call() {
    let out = translated(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "custom", "kind": "custom", "code": "x * 2",
                  "inputs": [ { "name": "x", "input": { "node": "c" } } ] },
                { "id": "c", "kind": "constant", "value": 3.0 }
            ],
            "inputs": { "roughness": { "node": "custom" } }
        }"#,
    );
    assert!(out.shader_code.contains(
        "MaterialFloat CustomExpression0(FMaterialPixelParameters Parameters,MaterialFloat x)\r\n{\r\nreturn x * 2;\r\n}\r\n"
    ));
    assert!(out.shader_code.contains("CustomExpression0(Parameters,3.00000000)"));
}

#[test]
fn custom_expression_requires_named_inputs_to_be_connected() {
    let errors = errors(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "custom", "kind": "custom", "code": "return x;",
                  "inputs": [ { "name": "" }, { "name": "x" } ] }
            ],
            "inputs": { "roughness": { "node": "custom" } }
        }"#,
    );
    assert_eq!(
        errors,
        vec!["(Node Custom) Custom material Custom missing input 2 (x)".to_string()]
    );
}

#[test]
fn tangent_vectors_transform_through_the_tangent_basis() {
    let out = translated(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "t", "kind": "transform", "input": { "node": "up" },
                  "source": "tangent", "destination": "world" },
                { "id": "up", "kind": "constant3_vector", "value": [0, 0, 1] }
            ],
            "inputs": { "base_color": { "node": "t" } }
        }"#,
    );
    assert!(out.shader_code.contains(
        "mul(MaterialFloat3(0.00000000,0.00000000,1.00000000), (MaterialFloat3x3)(Parameters.TangentToWorld))"
    ));
    assert_eq!(out.environment.define("USES_TRANSFORM_VECTOR"), Some("1"));
}

#[test]
fn indirect_transforms_go_through_world_space() {
    let out = translated(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "t", "kind": "transform", "input": { "node": "up" },
                  "source": "tangent", "destination": "local" },
                { "id": "up", "kind": "constant3_vector", "value": [0, 0, 1] }
            ],
            "inputs": { "base_color": { "node": "t" } }
        }"#,
    );
    assert!(out.shader_code.contains("Parameters.TangentToWorld"));
    assert!(out.shader_code.contains("(MaterialFloat3x3)(Primitive.WorldToLocal)"));
}

#[test]
fn positions_cannot_use_tangent_space() {
    let errors = errors(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "t", "kind": "transform_position", "input": { "node": "p" },
                  "source": "tangent", "destination": "world" },
                { "id": "p", "kind": "constant3_vector" }
            ],
            "inputs": { "base_color": { "node": "t" } }
        }"#,
    );
    assert_eq!(
        errors,
        vec!["(Node TransformPosition) Positions cannot be transformed to or from tangent space".to_string()]
    );
}

#[test]
fn particle_space_transforms_request_the_particle_transform() {
    let out = translated(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "t", "kind": "transform_position", "input": { "node": "p" },
                  "source": "mesh_particle", "destination": "world" },
                { "id": "p", "kind": "constant3_vector", "value": [1, 2, 3] }
            ],
            "inputs": { "base_color": { "node": "t" } }
        }"#,
    );
    assert!(out.shader_code.contains(
        "mul(MaterialFloat4(MaterialFloat3(1.00000000,2.00000000,3.00000000), 1), (Parameters.Particle.LocalToWorld)).xyz"
    ));
    assert_eq!(out.environment.define("USE_PARTICLE_TRANSFORM"), Some("1"));
}

#[test]
fn texture_sample_reads_the_material_texture() {
    let out = translated(
        r#"{
            "name": "M",
            "textures": [ { "name": "Bricks", "kind": "texture2d" } ],
            "expressions": [ { "id": "tex", "kind": "texture_sample", "texture": "Bricks" } ],
            "inputs": { "base_color": { "node": "tex" } }
        }"#,
    );
    assert!(out.shader_code.contains(
        "ProcessMaterialColorTextureLookup(Texture2DSample(Material.Texture2D_0,Material.Texture2D_0Sampler,Parameters.TexCoords[0].xy))"
    ));
    assert!(out.shader_code.contains("#define NUM_MATERIAL_TEXCOORDS 1"));
    assert_eq!(out.output.uniform_expression_set.texture_2d_expressions().len(), 1);
}

#[test]
fn texture_sample_checks_the_sampler_type() {
    let errors = errors(
        r#"{
            "name": "M",
            "textures": [ { "name": "Bricks_N", "kind": "texture2d", "sampler_type": "normal" } ],
            "expressions": [ { "id": "tex", "kind": "texture_sample", "texture": "Bricks_N" } ],
            "inputs": { "base_color": { "node": "tex" } }
        }"#,
    );
    assert_eq!(
        errors,
        vec!["(Node TextureSample) TextureSample> Sampler type is Color, should be Normal for Bricks_N".to_string()]
    );
}

#[test]
fn texture_object_inputs_carry_their_sampler_type() {
    let errors = errors(
        r#"{
            "name": "M",
            "textures": [ { "name": "Bricks_N", "kind": "texture2d", "sampler_type": "normal" } ],
            "expressions": [
                { "id": "obj", "kind": "texture_object", "texture": "Bricks_N" },
                { "id": "tex", "kind": "texture_sample", "texture_object": { "node": "obj" } }
            ],
            "inputs": { "base_color": { "node": "tex" } }
        }"#,
    );
    assert_eq!(
        errors,
        vec!["(Node TextureSample) TextureSample> Sampler type is Color, should be Normal for Bricks_N".to_string()]
    );
}

#[test]
fn cube_parameter_rejects_a_2d_texture() {
    let errors = errors(
        r#"{
            "name": "M",
            "textures": [ { "name": "Bricks", "kind": "texture2d" } ],
            "expressions": [ { "id": "tex", "kind": "texture_sample_parameter_cube",
                               "parameter_name": "Env", "texture": "Bricks" } ],
            "inputs": { "base_color": { "node": "tex" } }
        }"#,
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with("TextureSampleParameterCube> Requires TextureCube"), "{errors:?}");
}

#[test]
fn derivative_sampling_needs_both_derivatives() {
    let errors = errors(
        r#"{
            "name": "M",
            "textures": [ { "name": "Bricks", "kind": "texture2d" } ],
            "expressions": [
                { "id": "tex", "kind": "texture_sample", "texture": "Bricks",
                  "mip_value_mode": "derivative", "coordinates_dx": { "node": "d" } },
                { "id": "d", "kind": "constant2_vector", "value": [0.01, 0.0] }
            ],
            "inputs": { "base_color": { "node": "tex" } }
        }"#,
    );
    assert!(
        errors
            .iter()
            .any(|e| e.ends_with("Derivative sampling requires both DDX and DDY inputs")),
        "{errors:?}"
    );
}

#[test]
fn particle_and_vertex_usage_reach_the_environment() {
    let out = translated(
        r#"{
            "name": "Sprite",
            "expressions": [
                { "id": "pc", "kind": "particle_color" },
                { "id": "speed", "kind": "particle_speed" },
                { "id": "m", "kind": "multiply", "a": { "node": "pc" }, "b": { "node": "speed" } }
            ],
            "inputs": { "base_color": { "node": "m" } }
        }"#,
    );
    let env = &out.environment;
    assert_eq!(env.define("NEEDS_PARTICLE_COLOR"), Some("1"));
    assert_eq!(env.define("NEEDS_PARTICLE_VELOCITY"), Some("1"));
    assert_eq!(env.define("INTERPOLATE_VERTEX_COLOR"), Some("0"));
    assert_eq!(env.define("NEEDS_PARTICLE_POSITION"), None);
    assert_eq!(env.define("ENABLE_TRANSLUCENCY_VERTEX_FOG"), Some("1"));
}

#[test]
fn collection_parameters_declare_a_uniform_buffer() {
    let out = translated(
        r#"{
            "name": "M",
            "parameter_collections": [
                { "name": "Globals", "scalars": ["Wind", "Rain"], "vectors": ["Sun"] }
            ],
            "expressions": [
                { "id": "sun", "kind": "collection_parameter", "collection": "Globals",
                  "parameter_name": "Sun" },
                { "id": "rain", "kind": "collection_parameter", "collection": "Globals",
                  "parameter_name": "Rain" }
            ],
            "inputs": { "emissive_color": { "node": "sun" }, "roughness": { "node": "rain" } }
        }"#,
    );
    assert!(out.shader_code.contains("MaterialCollection0.Vectors[1]"));
    assert!(out.shader_code.contains("MaterialCollection0.Vectors[0]"));

    let buffers = &out.environment.uniform_buffers;
    assert_eq!(buffers.len(), 1);
    assert_eq!(buffers[0].name, "MaterialCollection0");
    assert_eq!(buffers[0].collection, "Globals");
    assert_eq!(buffers[0].num_vectors, 2);
    assert!(buffers[0].declaration.starts_with("cbuffer MaterialCollection0\r\n"));
    assert_eq!(
        out.output.uniform_expression_set.parameter_collections(),
        ["Globals".to_string()]
    );
}

#[test]
fn at_most_two_parameter_collections() {
    let errors = errors(
        r#"{
            "name": "M",
            "parameter_collections": [
                { "name": "A", "scalars": ["X"] },
                { "name": "B", "scalars": ["X"] },
                { "name": "C", "scalars": ["X"] }
            ],
            "expressions": [
                { "id": "a", "kind": "collection_parameter", "collection": "A", "parameter_name": "X" },
                { "id": "b", "kind": "collection_parameter", "collection": "B", "parameter_name": "X" },
                { "id": "c", "kind": "collection_parameter", "collection": "C", "parameter_name": "X" }
            ],
            "inputs": {
                "metallic": { "node": "a" },
                "specular": { "node": "b" },
                "roughness": { "node": "c" }
            }
        }"#,
    );
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("A material may only reference 2 different collections."));
}

#[test]
fn clear_coat_custom_output_gets_its_own_function() {
    let out = translated(
        r#"{
            "name": "M",
            "shading_model": "clear_coat",
            "expressions": [
                { "id": "cc", "kind": "clear_coat_normal_custom_output", "input": { "node": "up" } },
                { "id": "up", "kind": "constant3_vector", "value": [0, 0, 1] }
            ]
        }"#,
    );
    assert!(
        out.shader_code
            .contains("#define NUM_MATERIAL_OUTPUTS_CLEARCOATBOTTOMNORMAL 1\r\n")
    );
    assert!(out.shader_code.contains(
        "MaterialFloat3 ClearCoatBottomNormal0(FMaterialPixelParameters Parameters)\r\n{\r\n return MaterialFloat3(0.00000000,0.00000000,1.00000000);\r\n}\r\n"
    ));
}

#[test]
fn duplicate_custom_outputs_are_rejected() {
    let errors = errors(
        r#"{
            "name": "M",
            "expressions": [
                { "id": "a", "kind": "custom_output", "function_name": "Foo",
                  "inputs": [ { "node": "c" } ] },
                { "id": "b", "kind": "custom_output", "function_name": "Foo",
                  "inputs": [ { "node": "c" } ] },
                { "id": "c", "kind": "constant", "value": 1.0 }
            ]
        }"#,
    );
    assert_eq!(
        errors,
        vec!["The material can contain only one CustomOutput node".to_string()]
    );
}

#[test]
fn material_attributes_split_per_property() {
    let out = translated(
        r#"{
            "name": "M",
            "use_material_attributes": true,
            "expressions": [
                { "id": "ma", "kind": "make_material_attributes",
                  "inputs": { "base_color": { "node": "red" } } },
                { "id": "red", "kind": "constant3_vector", "value": [1, 0, 0] }
            ],
            "inputs": { "material_attributes": { "node": "ma" } }
        }"#,
    );
    assert!(
        out.shader_code
            .contains("return MaterialFloat3(1.00000000,0.00000000,0.00000000);")
    );
    // Unset attributes keep their property defaults.
    assert!(out.shader_code.contains("return 0.50000000;"));
}

#[test]
fn material_attributes_pin_needs_an_attributes_node() {
    let errors = errors(
        r#"{
            "name": "M",
            "use_material_attributes": true,
            "expressions": [ { "id": "c", "kind": "constant", "value": 1.0 } ],
            "inputs": { "material_attributes": { "node": "c" } }
        }"#,
    );
    assert_eq!(
        errors,
        vec!["Cannot connect a non MaterialAttributes node to a MaterialAttributes pin.".to_string()]
    );
}

#[test]
fn tex_coords_used_by_pixel_inputs_are_customized() {
    let graph = MaterialGraph::from_json(
        r#"{
            "name": "M",
            "expressions": [ { "id": "uv", "kind": "texture_coordinate", "coordinate_index": 1 } ],
            "inputs": { "emissive_color": { "node": "uv" } }
        }"#,
    )
    .unwrap();
    let options = TranslatorOptions::default();
    let mut translator = HlslTranslator::new(&graph, &options);
    assert!(translator.translate(), "{:?}", translator.errors());
    assert_eq!(translator.num_user_tex_coords(), 2);
    assert_eq!(translator.num_user_vertex_tex_coords(), 2);

    let template = MaterialTemplate::builtin().unwrap();
    let code = translator.material_shader_code(&template).unwrap();
    assert!(code.contains("\tOutTexCoords[1] = Parameters.TexCoords[1].xy;\r\n"));
}

#[test]
fn world_position_offset_marks_the_mesh_as_modified() {
    let moved = translated(
        r#"{ "name": "M", "inputs": { "world_position_offset": { "constant": [0, 0, 10] } } }"#,
    );
    assert!(moved.output.modifies_mesh_position);

    let still = translated(
        r#"{ "name": "M", "inputs": { "world_position_offset": { "constant": [0, 0, 0] } } }"#,
    );
    assert!(!still.output.modifies_mesh_position);
    assert!(!still.output.uses_pixel_depth_offset);
}

#[test]
fn translucent_refraction_enables_distortion() {
    let out = translated(
        r#"{
            "name": "Glass",
            "blend_mode": "translucent",
            "inputs": { "refraction": { "constant": [1.3] } }
        }"#,
    );
    assert_eq!(out.environment.define("USES_DISTORTION"), Some("1"));
    // The refraction depth bias is a material parameter.
    let set = &out.output.uniform_expression_set;
    let arena = set.arena();
    assert!(
        set.scalar_expressions()
            .iter()
            .any(|&id| arena.get(id).parameter_name() == Some("RefractionDepthBias"))
    );
}
