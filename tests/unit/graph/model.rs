use super::*;

#[test]
fn node_defaults_follow_node_kind() {
    let def: ExpressionDef =
        serde_json::from_str(r#"{ "id": "div", "kind": "divide" }"#).unwrap();
    match def.node {
        NodeKind::Divide {
            a,
            b,
            const_a,
            const_b,
        } => {
            assert!(a.is_none() && b.is_none());
            assert_eq!((const_a, const_b), (1.0, 2.0));
        }
        other => panic!("unexpected {other:?}"),
    }

    let lerp: ExpressionDef =
        serde_json::from_str(r#"{ "id": "l", "kind": "linear_interpolate" }"#).unwrap();
    assert!(matches!(
        lerp.node,
        NodeKind::LinearInterpolate { const_alpha, .. } if const_alpha == 0.5
    ));
}

#[test]
fn texture_sample_fields_sit_beside_the_kind_tag() {
    let def: ExpressionDef = serde_json::from_str(
        r#"{
            "id": "tex",
            "kind": "texture_sample",
            "texture": "Bricks",
            "coordinates": { "node": "uv" },
            "mip_value_mode": "mip_bias",
            "sampler_type": "normal"
        }"#,
    )
    .unwrap();
    let NodeKind::TextureSample(sample) = def.node else {
        panic!("expected texture sample");
    };
    assert_eq!(sample.texture.as_deref(), Some("Bricks"));
    assert_eq!(sample.coordinates.as_ref().unwrap().node, "uv");
    assert_eq!(sample.mip_value_mode, MipValueMode::MipBias);
    assert_eq!(sample.sampler_type, SamplerType::Normal);
    assert_eq!(sample.sampler_source, SamplerSource::FromTextureAsset);
}

#[test]
fn property_inputs_accept_constants_and_connections() {
    let def = MaterialDef::from_json(
        r#"{
            "name": "M",
            "inputs": {
                "base_color": { "node": "tint", "output": 1 },
                "roughness": { "constant": [0.25] }
            }
        }"#,
    )
    .unwrap();
    assert_eq!(
        def.inputs[&MaterialProperty::Roughness],
        PropertyInput::Constant {
            constant: vec![0.25]
        }
    );
    let PropertyInput::Expression(base) = &def.inputs[&MaterialProperty::BaseColor] else {
        panic!("expected connection");
    };
    assert_eq!((base.node.as_str(), base.output), ("tint", 1));
    assert_eq!(def.opacity_mask_clip_value, 0.3333);
    assert!(def.use_translucency_vertex_fog);
}

#[test]
fn output_masks_select_channels() {
    let color = NodeKind::VertexColor;
    assert_eq!(color.output_mask(0), Some([true, true, true, false]));
    assert_eq!(color.output_mask(4), Some([false, false, false, true]));
    assert_eq!(color.output_mask(5), None);

    let sample = NodeKind::TextureSample(TextureSampleNode::default());
    assert_eq!(sample.output_mask(5), None);
    assert_eq!(sample.output_mask(2), Some([false, true, false, false]));

    let c4 = NodeKind::Constant4Vector { value: [0.0; 4] };
    assert_eq!(c4.output_mask(0), None);
    assert_eq!(c4.output_mask(4), Some([false, false, false, true]));

    assert_eq!(NodeKind::DynamicParameter.output_mask(0), Some([true, false, false, false]));
}

#[test]
fn collection_parameters_pack_scalars_before_vectors() {
    let collection = ParameterCollectionDef {
        name: "Weather".to_string(),
        scalars: (0..5).map(|i| format!("S{i}")).collect(),
        vectors: vec!["Wind".to_string()],
    };
    assert_eq!(collection.parameter_index("S0"), Some((0, Some(0))));
    assert_eq!(collection.parameter_index("S4"), Some((1, Some(0))));
    assert_eq!(collection.parameter_index("Wind"), Some((2, None)));
    assert_eq!(collection.parameter_index("Rain"), None);
}

#[test]
fn malformed_documents_are_validation_errors() {
    let err = MaterialDef::from_json(r#"{ "name": 3 }"#).unwrap_err();
    assert!(matches!(err, MaterialError::Validation(_)));
}

#[test]
fn dbuffer_modes_are_flagged() {
    assert!(DecalBlendMode::DbufferTranslucentColor.is_dbuffer());
    assert!(!DecalBlendMode::Stain.is_dbuffer());
    assert!(BlendMode::Modulate.is_translucent());
    assert!(!BlendMode::Masked.is_translucent());
}
