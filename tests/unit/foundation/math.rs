use super::*;

#[test]
fn safe_divisor_keeps_sign_and_magnitude() {
    assert_eq!(safe_divisor(0.0), DELTA);
    assert_eq!(safe_divisor(-0.0), DELTA);
    assert_eq!(safe_divisor(-0.000001), -DELTA);
    assert_eq!(safe_divisor(0.000009), DELTA);
    assert_eq!(safe_divisor(2.0), 2.0);
    assert_eq!(safe_divisor(-3.5), -3.5);
}

#[test]
fn color_equality_is_bitwise() {
    let a = LinearColor::new(0.5, 1.0, 0.0, 0.0);
    let b = LinearColor::new(0.5, 1.0, 0.0, 0.0);
    assert_eq!(a, b);
    assert_ne!(a, LinearColor::new(0.5, 1.0, -0.0, 0.0));
}

#[test]
fn channel_access_by_index() {
    let mut c = LinearColor::BLACK;
    c.set(2, 3.0);
    c.set(7, 9.0);
    assert_eq!(c.get(2), 3.0);
    assert_eq!(c.get(7), 0.0);
    assert_eq!(c.to_array(), [0.0, 0.0, 3.0, 0.0]);
}

#[test]
fn color_accepts_array_and_object_forms() {
    let rgb: LinearColor = serde_json::from_str("[1.0, 0.5, 0.25]").unwrap();
    assert_eq!(rgb, LinearColor::new(1.0, 0.5, 0.25, 0.0));
    let rgba: LinearColor = serde_json::from_str("[1.0, 0.5, 0.25, 1.0]").unwrap();
    assert_eq!(rgba.a, 1.0);
    let obj: LinearColor = serde_json::from_str(r#"{"r":0.1,"g":0.2,"b":0.3}"#).unwrap();
    assert_eq!(obj, LinearColor::new(0.1, 0.2, 0.3, 0.0));
}
