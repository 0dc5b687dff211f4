use super::*;
use crate::graph::normalize::MaterialGraph;
use crate::options::TranslatorOptions;
use crate::uniform::eval::RenderContext;

const EMPTY: &str = r#"{ "name": "M" }"#;

fn with_translator(property: MaterialProperty, f: impl FnOnce(&mut HlslTranslator<'_>)) {
    let graph = MaterialGraph::from_json(EMPTY).unwrap();
    let options = TranslatorOptions::default();
    let mut t = HlslTranslator::new(&graph, &options);
    t.set_material_property(property, None, false);
    f(&mut t);
}

fn pixel(f: impl FnOnce(&mut HlslTranslator<'_>)) {
    with_translator(MaterialProperty::BaseColor, f);
}

#[test]
fn uniform_operands_fold_into_a_constant_expression() {
    pixel(|t| {
        let a = t.constant(1.0);
        let b = t.constant(2.0);
        let sum = t.add(a, b).unwrap();
        let id = t.uniform_of(sum).expect("folded");
        let arena = t.output.uniform_expression_set.arena();
        assert!(arena.is_constant(id));
        let ctx = RenderContext::new(0.0, 0.0, &[]);
        assert_eq!(arena.number_value(id, &ctx).get(0), 3.0);
        assert_eq!(t.parameter_code(sum), "(1.00000000 + 2.00000000)");
    });
}

#[test]
fn identical_uniform_expressions_share_a_chunk() {
    pixel(|t| {
        let a = t.constant3(1.0, 0.5, 0.0);
        let b = t.constant3(1.0, 0.5, 0.0);
        assert_eq!(a, b);
        assert_eq!(t.chunks().len(), 1);
        assert_eq!(t.uniform_expressions.len(), 1);
    });
}

#[test]
fn non_uniform_operands_emit_a_local() {
    pixel(|t| {
        let uv = t.texture_coordinate(0, false, false);
        let one = t.constant(1.0);
        let sum = t.add(uv, one).unwrap();
        let chunk = t.chunk(sum);
        assert_eq!(chunk.ty, ValueType::FLOAT2);
        assert_eq!(chunk.symbol_name, "Local1");
        assert_eq!(
            chunk.definition,
            "\tMaterialFloat2 Local1 = (Parameters.TexCoords[0].xy + 1.00000000);\r\n"
        );
        assert_eq!(t.parameter_code(sum), "Local1");
        assert_eq!(t.num_user_tex_coords, 1);
    });
}

#[test]
fn scalar_parameters_pack_four_per_vector() {
    pixel(|t| {
        let codes: Vec<String> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|name| {
                let p = t.scalar_parameter(name, 0.0).unwrap();
                t.parameter_code(p)
            })
            .collect();
        assert_eq!(codes[0], "Material.ScalarExpressions[0].x");
        assert_eq!(codes[1], "Material.ScalarExpressions[0].y");
        assert_eq!(codes[3], "Material.ScalarExpressions[0].w");
        assert_eq!(codes[4], "Material.ScalarExpressions[1].x");

        let again = t.scalar_parameter("A", 0.0).unwrap();
        assert_eq!(t.parameter_code(again), "Material.ScalarExpressions[0].x");
        assert_eq!(t.output.uniform_expression_set.scalar_expressions().len(), 5);
    });
}

#[test]
fn vector_parameters_read_the_vector_array() {
    pixel(|t| {
        let v = t.vector_parameter("Tint", LinearColor::new(1.0, 0.0, 0.0, 1.0));
        let rgb = t.component_mask(v, true, true, true, false).unwrap();
        assert_eq!(t.chunk(rgb).ty, ValueType::FLOAT3);
        let code = t.parameter_code(rgb);
        // Building the swizzle reads the parameter first, so it takes slot 0.
        assert_eq!(code, "Material.VectorExpressions[1].rgb");
        assert_eq!(t.output.uniform_expression_set.vector_expressions().len(), 2);
    });
}

#[test]
fn per_frame_expressions_live_outside_the_buffer() {
    pixel(|t| {
        let time = t.game_time(true, 2.0).unwrap();
        assert_eq!(t.parameter_code(time), "UE_Material_PerFrameScalarExpression0");
        assert_eq!(t.output.uniform_expression_set.per_frame_scalar_expressions().len(), 1);
        assert!(t.output.uniform_expression_set.scalar_expressions().is_empty());

        let zero_period = t.game_time(true, 0.0).unwrap();
        assert_eq!(t.parameter_code(zero_period), "0.00000000");
    });
}

#[test]
fn previous_frame_reads_previous_view_times() {
    let graph = MaterialGraph::from_json(EMPTY).unwrap();
    let options = TranslatorOptions::default();
    let mut t = HlslTranslator::new(&graph, &options);
    t.set_material_property(MaterialProperty::WorldPositionOffset, None, true);
    let time = t.game_time(false, 0.0).unwrap();
    assert_eq!(t.parameter_code(time), "View.PrevFrameGameTime");
    let real = t.real_time(false, 0.0).unwrap();
    assert_eq!(t.parameter_code(real), "View.PrevFrameRealTime");
}

#[test]
fn errors_are_recorded_once_and_clear_success() {
    pixel(|t| {
        assert!(t.error("boom").is_none());
        t.error("boom");
        t.error("bang");
        assert_eq!(t.errors, vec!["boom".to_string(), "bang".to_string()]);
        assert!(!t.success);
    });
}

#[test]
fn casts_truncate_and_replicate() {
    pixel(|t| {
        let v = t.constant3(1.0, 2.0, 3.0);
        let narrowed = t.valid_cast(v, ValueType::FLOAT2).unwrap();
        assert_eq!(
            t.parameter_code(narrowed),
            "MaterialFloat3(1.00000000,2.00000000,3.00000000).rg"
        );

        let s = t.constant(0.5);
        let splat = t.force_cast(s, ValueType::FLOAT3, true, true).unwrap();
        assert_eq!(
            t.parameter_code(splat),
            "MaterialFloat3(0.50000000,0.50000000,0.50000000)"
        );
        let padded = t.force_cast(s, ValueType::FLOAT3, true, false).unwrap();
        assert_eq!(t.parameter_code(padded), "MaterialFloat3(0.50000000,0,0)");

        let uv = t.texture_coordinate(0, false, false);
        assert!(t.valid_cast(uv, ValueType::FLOAT3).is_none());
        assert_eq!(t.errors, vec!["Cannot cast from float2 to float3.".to_string()]);
    });
}

#[test]
fn coercion_replicates_scalars() {
    pixel(|t| {
        let s = t.constant(2.0).unwrap();
        assert_eq!(
            t.coerce_parameter(s, ValueType::FLOAT2),
            "MaterialFloat2(2.00000000,2.00000000)"
        );
        let uv = t.texture_coordinate(1, true, false).unwrap();
        assert_eq!(
            t.coerce_parameter(uv, ValueType::FLOAT2),
            "UnMirrorU(Parameters.TexCoords[1].xy, Parameters)"
        );
    });
}

#[test]
fn component_mask_checks_the_source_width() {
    pixel(|t| {
        let v = t.constant3(1.0, 2.0, 3.0);
        let g = t.component_mask(v, false, true, false, false).unwrap();
        let id = t.uniform_of(g).expect("masked constant stays uniform");
        let ctx = RenderContext::new(0.0, 0.0, &[]);
        let value = t.output.uniform_expression_set.arena().number_value(id, &ctx);
        assert_eq!(value.get(0), 2.0);

        let uv = t.texture_coordinate(0, false, false);
        assert!(t.component_mask(uv, false, false, true, false).is_none());
        assert_eq!(
            t.errors.last().map(String::as_str),
            Some("Not enough components in (Parameters.TexCoords[0].xy: float2) for component mask 0010")
        );

        assert!(t.component_mask(v, false, false, false, false).is_none());
        assert!(t.errors.last().is_some_and(|e| e.contains("Couldn't determine result type")));
    });
}

#[test]
fn append_vector_is_limited_to_four_components() {
    pixel(|t| {
        let a = t.constant3(1.0, 2.0, 3.0);
        let b = t.constant(4.0);
        let ab = t.append_vector(a, b).unwrap();
        assert_eq!(t.chunk(ab).ty, ValueType::FLOAT4);

        let c = t.constant2(5.0, 6.0);
        assert!(t.append_vector(a, c).is_none());
        assert_eq!(
            t.errors,
            vec!["Appended vector would have more than 4 components".to_string()]
        );
    });
}

#[test]
fn static_bools_only_come_from_static_bool_chunks() {
    pixel(|t| {
        let yes = t.static_bool(true);
        assert_eq!(t.static_bool_value(yes), Some(true));
        let no = t.static_bool(false);
        assert_eq!(t.static_bool_value(no), Some(false));

        let f = t.constant(1.0);
        assert_eq!(t.static_bool_value(f), None);
        assert_eq!(
            t.errors,
            vec!["Failed to cast float input to static bool type".to_string()]
        );

        // Static bools never become locals.
        assert!(t.add_code_chunk(ValueType::STATIC_BOOL, "true".to_string()).is_none());
    });
}

#[test]
fn vertex_stage_counts_vertex_tex_coords() {
    with_translator(MaterialProperty::WorldPositionOffset, |t| {
        t.texture_coordinate(2, false, false);
        assert_eq!(t.num_user_vertex_tex_coords, 3);
        assert_eq!(t.num_user_tex_coords, 0);
    });
}

#[test]
fn feature_level_limits_tex_coord_sets() {
    let graph = MaterialGraph::from_json(EMPTY).unwrap();
    let options = TranslatorOptions {
        feature_level: FeatureLevel::Es2,
        ..TranslatorOptions::default()
    };
    let mut t = HlslTranslator::new(&graph, &options);
    t.set_material_property(MaterialProperty::BaseColor, None, false);
    assert!(t.texture_coordinate(3, false, false).is_none());
    assert_eq!(
        t.errors,
        vec!["Only 3 texture coordinate sets can be used by this feature level, currently using 4"
            .to_string()]
    );
    assert!(!t.feature_level_supported(FeatureLevel::Sm4));
    assert!(t.errors.contains(&"Node not supported in feature level ES2".to_string()));
}

#[test]
fn widening_then_narrowing_restores_the_source() {
    pixel(|t| {
        let uv = t.texture_coordinate(0, false, false).unwrap();
        let source = t.parameter_code(uv);
        for (dest, pad, mask) in [
            (ValueType::FLOAT3, ",0", ".rg"),
            (ValueType::FLOAT4, ",0,0", ".rg"),
        ] {
            let wide = t.force_cast(Some(uv), dest, true, false);
            let wide_code = t.parameter_code(wide.unwrap());
            assert_eq!(wide_code, format!("{}({source}{pad})", dest.hlsl_type()));
            let back = t.valid_cast(wide, ValueType::FLOAT2).unwrap();
            assert_eq!(t.chunk(back).ty, ValueType::FLOAT2);
            assert_eq!(t.parameter_code(back), format!("{wide_code}{mask}"));
        }

        // A scalar pads with zeros unless asked to replicate.
        let s = t.constant(0.25);
        let padded = t.force_cast(s, ValueType::FLOAT4, true, false).unwrap();
        assert_eq!(t.parameter_code(padded), "MaterialFloat4(0.25000000,0,0,0)");
        let back = t.valid_cast(Some(padded), ValueType::FLOAT1).unwrap();
        assert_eq!(t.parameter_code(back), "MaterialFloat4(0.25000000,0,0,0).r");
        assert!(t.errors.is_empty());
    });
}
