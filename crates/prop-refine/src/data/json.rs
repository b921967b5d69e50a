//! Lossy JSON projection of [`Data`].
//!
//! Used by reporters and test fixtures. The projection is lossy by nature:
//! JSON has no `undefined`, holes, patterns, instants or placeholders.
//! Values without a JSON shape project to tagged marker objects (or `null`
//! for the absent-ish kinds), and [`from_json`] recognizes those markers on
//! the way back in.

use serde_json::{json, Map, Number, Value};

use super::{Data, Entries, Items, Pattern, PreservedSlot};
use prop_refine_path::parse_key;

const REGEX_TAG: &str = "$regex";
const FLAGS_TAG: &str = "$flags";
const INSTANT_TAG: &str = "$instant";
const PRESERVED_TAG: &str = "$preserved";

/// Project a data value into JSON.
pub fn to_json(data: &Data) -> Value {
    match data {
        Data::Undefined | Data::Null | Data::Hole => Value::Null,
        Data::Bool(b) => Value::Bool(*b),
        Data::Num(n) => num_to_json(*n),
        Data::Str(s) => Value::String(s.clone()),
        Data::Pattern(p) => json!({ REGEX_TAG: p.source, FLAGS_TAG: p.flags }),
        Data::Instant(ms) => json!({ INSTANT_TAG: ms }),
        Data::Preserved(slot) => json!({ PRESERVED_TAG: slot.key() }),
        Data::Arr(items) => Value::Array(items.iter().map(to_json).collect()),
        Data::Obj(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
    }
}

fn num_to_json(n: f64) -> Value {
    if n.is_finite() {
        if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0 {
            return Value::Number(Number::from(n as i64));
        }
        if let Some(num) = Number::from_f64(n) {
            return Value::Number(num);
        }
    }
    // Non-finite numbers keep their canonical token.
    Value::String(prop_refine_path::num_token(n))
}

/// Import a JSON value, recognizing the marker objects [`to_json`] emits.
pub fn from_json(value: &Value) -> Data {
    match value {
        Value::Null => Data::Null,
        Value::Bool(b) => Data::Bool(*b),
        Value::Number(n) => Data::Num(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => Data::Str(s.clone()),
        Value::Array(items) => {
            let items: Items = items.iter().map(from_json).collect();
            Data::arr(items)
        }
        Value::Object(map) => from_json_object(map),
    }
}

fn from_json_object(map: &Map<String, Value>) -> Data {
    if map.len() <= 2 {
        if let Some(Value::String(source)) = map.get(REGEX_TAG) {
            if map.len() == 1 || map.contains_key(FLAGS_TAG) {
                let flags = match map.get(FLAGS_TAG) {
                    Some(Value::String(f)) => f.clone(),
                    _ => String::new(),
                };
                return Data::Pattern(Pattern::new(source.clone(), flags));
            }
        }
        if map.len() == 1 {
            if let Some(ms) = map.get(INSTANT_TAG).and_then(Value::as_i64) {
                return Data::Instant(ms);
            }
            if let Some(Value::String(key)) = map.get(PRESERVED_TAG) {
                if let Ok(path) = parse_key(key) {
                    return Data::Preserved(PreservedSlot::at(&path));
                }
            }
        }
    }
    let entries: Entries = map
        .iter()
        .map(|(k, v)| (k.clone(), from_json(v)))
        .collect();
    Data::obj(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_roundtrip() {
        let doc = json!({"a": 1, "b": "x", "c": true, "d": null, "e": [1, 2]});
        assert_eq!(to_json(&from_json(&doc)), doc);
    }

    #[test]
    fn undefined_and_holes_project_to_null() {
        assert_eq!(to_json(&Data::Undefined), json!(null));
        assert_eq!(to_json(&Data::Hole), json!(null));
    }

    #[test]
    fn non_finite_numbers_project_to_tokens() {
        assert_eq!(to_json(&Data::Num(f64::NAN)), json!("NaN"));
        assert_eq!(to_json(&Data::Num(f64::NEG_INFINITY)), json!("-Infinity"));
    }

    #[test]
    fn markers_roundtrip() {
        let pattern = Data::Pattern(Pattern::new("ab+", "i"));
        assert_eq!(from_json(&to_json(&pattern)), pattern);

        let instant = Data::Instant(1_700_000_000_000);
        assert_eq!(from_json(&to_json(&instant)), instant);

        let slot = Data::Preserved(PreservedSlot::at(&[prop_refine_path::Step::key(
            "children",
        )]));
        assert_eq!(from_json(&to_json(&slot)), slot);
    }

    #[test]
    fn plain_object_with_similar_keys_is_not_a_marker() {
        let doc = json!({"$regex": 1});
        assert!(matches!(from_json(&doc), Data::Obj(_)));
    }

    #[test]
    fn integers_stay_integral() {
        assert_eq!(to_json(&Data::Num(3.0)), json!(3));
        assert_eq!(to_json(&Data::Num(1.5)), json!(1.5));
    }
}
