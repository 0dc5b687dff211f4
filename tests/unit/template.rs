use super::*;

fn values(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
    pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

#[test]
fn builtin_template_uses_every_slot_once() {
    let template = MaterialTemplate::builtin().unwrap();
    let slots: Vec<_> = template.slots().collect();
    assert_eq!(slots.len(), SLOTS.len());
    for slot in SLOTS {
        assert_eq!(slots.iter().filter(|s| **s == slot).count(), 1, "{slot}");
    }
}

#[test]
fn line_number_counts_lines_before_the_marker() {
    let template = MaterialTemplate::parse("a\nb\n#line %{line_number}\n").unwrap();
    assert_eq!(template.line_number(), 5);

    let template = MaterialTemplate::parse("#line 1").unwrap();
    assert_eq!(template.line_number(), 3);
}

#[test]
fn render_substitutes_slots_in_place() {
    let template =
        MaterialTemplate::parse("x = %{base_color};\n#line %{line_number}\n").unwrap();
    let out = template
        .render(&values(&[("base_color", "1.0"), ("line_number", "4")]))
        .unwrap();
    assert_eq!(out, "x = 1.0;\n#line 4\n");
}

#[test]
fn malformed_templates_are_rejected() {
    let err = MaterialTemplate::parse("%{base_color}").unwrap_err();
    assert!(err.to_string().contains("no '#line' marker"), "{err}");

    let err = MaterialTemplate::parse("#line\n%{base_color").unwrap_err();
    assert!(err.to_string().contains("unterminated template slot"), "{err}");

    let err = MaterialTemplate::parse("#line\n%{bogus}").unwrap_err();
    assert!(err.to_string().contains("unknown template slot 'bogus'"), "{err}");
}

#[test]
fn render_requires_a_value_for_every_slot() {
    let template = MaterialTemplate::parse("#line %{line_number}").unwrap();
    let err = template.render(&BTreeMap::new()).unwrap_err();
    assert!(
        err.to_string().contains("template slot 'line_number' has no value"),
        "{err}"
    );
}
