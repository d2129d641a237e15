//! Console argument rendering
//!
//! Turns remote values into display text. The target has already rendered
//! multi-line strings, objects and arrays into `description`, so that text is
//! passed through untouched.

use serde_json::Value;

use crate::cdp::{ObjectSubtype, RemoteValue, ValueKind};

/// Render a single console argument
///
/// First match wins: `undefined`, `null`, description, literal value,
/// unserializable numeric, then a `[kind subtype]` placeholder.
pub fn format_argument(arg: &RemoteValue) -> String {
    match arg {
        RemoteValue { kind: Some(ValueKind::Undefined), .. } => "undefined".to_string(),
        RemoteValue { subtype: Some(ObjectSubtype::Null), .. } => "null".to_string(),
        RemoteValue { description: Some(description), .. } => description.clone(),
        RemoteValue { value: Some(value), .. } => value_to_text(value),
        RemoteValue { unserializable_value: Some(repr), .. } => repr.clone(),
        RemoteValue { subtype: Some(subtype), .. } => {
            format!("[{} {}]", arg.kind_name(), subtype)
        }
        RemoteValue { subtype: None, .. } => format!("[{}]", arg.kind_name()),
    }
}

/// Render all arguments of one console call, space separated in call order
pub fn format_arguments(args: &[RemoteValue]) -> String {
    args.iter()
        .map(format_argument)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Textual form of a literal, matching how the target would stringify it
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_to_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn number_to_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) => float_to_text(f),
        None => n.to_string(),
    }
}

/// Shortest round-trip digits, switching to exponent form below 1e-6 and
/// from 1e21 up, with an explicit `+` on positive exponents
fn float_to_text(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if (1e-6..1e21).contains(&magnitude) {
        // Display drops the fraction of integral floats (`3.0` -> `3`)
        return f.to_string();
    }
    let exp = format!("{:e}", f);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
        _ => exp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_undefined() {
        assert_eq!(format_argument(&RemoteValue::of_kind(ValueKind::Undefined)), "undefined");
    }

    #[test]
    fn test_undefined_wins_over_description() {
        let arg = RemoteValue::of_kind(ValueKind::Undefined).with_description("something");
        assert_eq!(format_argument(&arg), "undefined");
    }

    #[test]
    fn test_null_subtype() {
        let arg = RemoteValue::object(ObjectSubtype::Null).with_value(Value::Null);
        assert_eq!(format_argument(&arg), "null");
    }

    #[test]
    fn test_description_beats_value() {
        let arg = RemoteValue::string("value text").with_description("description text");
        assert_eq!(format_argument(&arg), "description text");
    }

    #[test]
    fn test_value_beats_unserializable() {
        let arg = RemoteValue::of_kind(ValueKind::Number)
            .with_value(json!(1))
            .with_unserializable("NaN");
        assert_eq!(format_argument(&arg), "1");
    }

    #[test]
    fn test_multiline_description_preserved() {
        let text = "first line\n  second line\r\n\tthird \"quoted\"";
        let arg = RemoteValue::object(ObjectSubtype::Array).with_description(text);
        assert_eq!(format_argument(&arg), text);
    }

    #[test]
    fn test_literal_values() {
        assert_eq!(format_argument(&RemoteValue::string("hello")), "hello");
        assert_eq!(
            format_argument(&RemoteValue::of_kind(ValueKind::Number).with_value(json!(42))),
            "42"
        );
        assert_eq!(
            format_argument(&RemoteValue::of_kind(ValueKind::Number).with_value(json!(-1.5))),
            "-1.5"
        );
        assert_eq!(
            format_argument(&RemoteValue::of_kind(ValueKind::Number).with_value(json!(3.0))),
            "3"
        );
        assert_eq!(
            format_argument(&RemoteValue::of_kind(ValueKind::Boolean).with_value(json!(false))),
            "false"
        );
    }

    #[test]
    fn test_float_exponent_thresholds() {
        let render = |v: Value| format_argument(&RemoteValue::of_kind(ValueKind::Number).with_value(v));
        assert_eq!(render(json!(1e21)), "1e+21");
        assert_eq!(render(json!(1.5e22)), "1.5e+22");
        assert_eq!(render(json!(1e20)), "100000000000000000000");
        assert_eq!(render(json!(1e-7)), "1e-7");
        assert_eq!(render(json!(-2.5e-8)), "-2.5e-8");
        assert_eq!(render(json!(0.000001)), "0.000001");
        assert_eq!(render(json!(-0.0)), "0");
    }

    #[test]
    fn test_missing_kind() {
        assert_eq!(format_argument(&RemoteValue::default()), "[undefined]");
        assert_eq!(
            format_argument(&RemoteValue::default().with_value(json!("hi"))),
            "hi"
        );
    }

    #[test]
    fn test_unserializable_numbers() {
        for repr in ["NaN", "Infinity", "-Infinity", "-0"] {
            let arg = RemoteValue::of_kind(ValueKind::Number).with_unserializable(repr);
            assert_eq!(format_argument(&arg), repr);
        }
    }

    #[test]
    fn test_fallback_placeholders() {
        assert_eq!(format_argument(&RemoteValue::of_kind(ValueKind::Function)), "[function]");
        assert_eq!(format_argument(&RemoteValue::object(ObjectSubtype::Error)), "[object error]");
        assert_eq!(format_argument(&RemoteValue::of_kind(ValueKind::Object)), "[object]");
        assert_eq!(
            format_argument(&RemoteValue::of_kind(ValueKind::Other("accessor".into()))),
            "[accessor]"
        );
    }

    #[test]
    fn test_every_shape_renders_non_empty() {
        let kinds = [
            ValueKind::Undefined,
            ValueKind::String,
            ValueKind::Number,
            ValueKind::Boolean,
            ValueKind::Symbol,
            ValueKind::Bigint,
            ValueKind::Function,
            ValueKind::Object,
        ];
        let subtypes = [
            None,
            Some(ObjectSubtype::Null),
            Some(ObjectSubtype::Array),
            Some(ObjectSubtype::Map),
            Some(ObjectSubtype::Promise),
        ];
        for kind in &kinds {
            for subtype in &subtypes {
                let arg = RemoteValue {
                    subtype: subtype.clone(),
                    ..RemoteValue::of_kind(kind.clone())
                };
                assert!(!format_argument(&arg).is_empty(), "{:?} {:?}", kind, subtype);
            }
        }
    }

    #[test]
    fn test_arguments_joined_with_space() {
        let args = vec![
            RemoteValue::string("count:"),
            RemoteValue::of_kind(ValueKind::Number).with_value(json!(3)),
            RemoteValue::of_kind(ValueKind::Undefined),
        ];
        assert_eq!(format_arguments(&args), "count: 3 undefined");
        assert_eq!(format_arguments(&[]), "");
    }
}
