use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MaterialError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MaterialError::translation("x")
            .to_string()
            .contains("translation error:")
    );
    assert!(
        MaterialError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        MaterialError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MaterialError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
