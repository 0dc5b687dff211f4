use super::*;

#[test]
fn empty_object_yields_defaults() {
    let opts = TranslatorOptions::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(opts, TranslatorOptions::default());
    assert_eq!(opts.feature_level, FeatureLevel::Sm5);
    assert_eq!(opts.quality_level, QualityLevel::High);
    assert!(!opts.compile_for_compute_shader);
}

#[test]
fn fields_parse_snake_case() {
    let text = r#"{
        "feature_level": "es3_1",
        "compile_for_compute_shader": true,
        "forward_shading": true,
        "dbuffer_decals": true,
        "quality_level": "low"
    }"#;
    let opts = TranslatorOptions::from_reader(text.as_bytes()).unwrap();
    assert_eq!(opts.feature_level, FeatureLevel::Es31);
    assert!(opts.compile_for_compute_shader);
    assert!(opts.forward_shading);
    assert!(opts.dbuffer_decals);
    assert_eq!(opts.quality_level, QualityLevel::Low);
}

#[test]
fn malformed_options_are_validation_errors() {
    let err = TranslatorOptions::from_reader(r#"{"feature_level": "sm9"}"#.as_bytes()).unwrap_err();
    assert!(matches!(err, MaterialError::Validation(_)));
    assert!(err.to_string().starts_with("validation error: invalid translator options"));
}

#[test]
fn missing_file_is_reported() {
    let err = TranslatorOptions::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("open options"));
}
