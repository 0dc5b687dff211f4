use super::*;

const FLOATS: [ValueType; 5] = [
    ValueType::FLOAT,
    ValueType::FLOAT1,
    ValueType::FLOAT2,
    ValueType::FLOAT3,
    ValueType::FLOAT4,
];

#[test]
fn arithmetic_result_is_commutative_over_float_family() {
    for a in FLOATS {
        for b in FLOATS {
            let ab = arithmetic_result_type(a, b);
            let ba = arithmetic_result_type(b, a);
            assert_eq!(ab.is_ok(), ba.is_ok(), "{a:?} {b:?}");
            if let (Ok(x), Ok(y)) = (ab, ba) {
                assert_eq!(x, y, "{a:?} {b:?}");
            }
        }
    }
}

#[test]
fn generic_float_yields_the_specific_type() {
    assert_eq!(
        arithmetic_result_type(ValueType::FLOAT, ValueType::FLOAT3).unwrap(),
        ValueType::FLOAT3
    );
    assert_eq!(
        arithmetic_result_type(ValueType::FLOAT2, ValueType::FLOAT).unwrap(),
        ValueType::FLOAT2
    );
    assert_eq!(
        arithmetic_result_type(ValueType::FLOAT, ValueType::FLOAT).unwrap(),
        ValueType::FLOAT
    );
}

#[test]
fn disjoint_and_non_numeric_arithmetic_fails() {
    let err = arithmetic_result_type(ValueType::FLOAT2, ValueType::FLOAT3).unwrap_err();
    assert_eq!(err, "Arithmetic between types float2 and float3 are undefined");

    let err = arithmetic_result_type(ValueType::TEXTURE2D, ValueType::FLOAT).unwrap_err();
    assert_eq!(
        err,
        "Attempting to perform arithmetic on non-numeric types: texture2D float"
    );
}

#[test]
fn component_counts_round_trip_through_vector_type() {
    for n in 1..=4 {
        assert_eq!(ValueType::vector_type(n).num_components(), n);
    }
    assert_eq!(ValueType::vector_type(0), ValueType::UNKNOWN);
    assert_eq!(ValueType::vector_type(5), ValueType::UNKNOWN);
    assert_eq!(ValueType::TEXTURE2D.num_components(), 0);
    assert_eq!(ValueType::STATIC_BOOL.num_components(), 0);
}

#[test]
fn type_names() {
    assert_eq!(ValueType::FLOAT1.hlsl_type(), "MaterialFloat");
    assert_eq!(ValueType::FLOAT.hlsl_type(), "MaterialFloat");
    assert_eq!(ValueType::FLOAT4.hlsl_type(), "MaterialFloat4");
    assert_eq!(ValueType::TEXTURE_CUBE.describe(), "textureCube");
    assert_eq!(ValueType::STATIC_BOOL.describe(), "static bool");
    assert_eq!(ValueType::TEXTURE.describe(), "unknown");
}

#[test]
fn swizzle_letters_map_to_components() {
    let cases = [
        ('x', 0),
        ('R', 0),
        ('y', 1),
        ('g', 1),
        ('Z', 2),
        ('b', 2),
        ('w', 3),
        ('A', 3),
    ];
    for (c, i) in cases {
        assert_eq!(swizzle_component(c), Some(i));
    }
    assert_eq!(swizzle_component('q'), None);
}

#[test]
fn property_metadata() {
    assert_eq!(
        MaterialProperty::WorldPositionOffset.frequency(),
        ShaderFrequency::Vertex
    );
    assert_eq!(
        MaterialProperty::CustomizedUvs3.frequency(),
        ShaderFrequency::Vertex
    );
    assert_eq!(
        MaterialProperty::WorldDisplacement.frequency(),
        ShaderFrequency::Domain
    );
    assert_eq!(
        MaterialProperty::TessellationMultiplier.frequency(),
        ShaderFrequency::Hull
    );
    assert_eq!(MaterialProperty::BaseColor.frequency(), ShaderFrequency::Pixel);
    assert_eq!(
        MaterialProperty::customized_uv(5),
        Some(MaterialProperty::CustomizedUvs5)
    );
    assert_eq!(MaterialProperty::customized_uv(8), None);
    assert_eq!(MaterialProperty::CustomizedUvs7.name(), "CustomizedUVs7");
    assert_eq!(
        MaterialProperty::CustomizedUvs0.value_type(),
        ValueType::FLOAT2
    );
    for (i, p) in MaterialProperty::ALL.iter().enumerate() {
        assert_eq!(p.index(), i);
    }
}

#[test]
fn feature_levels_are_ordered() {
    assert!(FeatureLevel::Es2 < FeatureLevel::Es31);
    assert!(FeatureLevel::Sm4 < FeatureLevel::Sm5);
    let lvl: FeatureLevel = serde_json::from_str("\"es3_1\"").unwrap();
    assert_eq!(lvl, FeatureLevel::Es31);
}
