//! # Keyframe Simplification
//!
//! Reduces the verbosity of animated properties.
//!
//! ## Responsibilities
//! - **Per keyframe**: drop `h: 0`, drop default ease handles, round numbers,
//!   turn `s == e` segments into hold keyframes.
//! - **Per track**: a track with exactly one keyframe becomes a static value.
//! - **Per transform / subtree**: apply the above to every animatable property.

use crate::defaults::Policy;
use crate::precision::{round_number, round_value};
use serde_json::{Map, Value};

/// A keyframe is an object carrying a time `t`.
fn is_keyframe(value: &Value) -> bool {
    value.as_object().is_some_and(|kf| kf.contains_key("t"))
}

/// True for a non-empty array made only of keyframes.
pub fn is_keyframe_list(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty() && items.iter().all(is_keyframe),
        _ => false,
    }
}

fn is_number(value: &Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|x| x == expected)
}

fn near(value: &Value, expected: f64, tolerance: f64) -> bool {
    match value {
        Value::Number(n) => n.as_f64().is_some_and(|x| (x - expected).abs() <= tolerance),
        Value::Array(items) => {
            !items.is_empty() && items.iter().all(|v| near(v, expected, tolerance))
        }
        _ => false,
    }
}

/// `{x, y}` where both components (scalars or per-dimension arrays) match `expected`.
fn is_default_handle(handle: &Value, expected: f64, tolerance: f64) -> bool {
    let Some(map) = handle.as_object() else {
        return false;
    };
    map.len() == 2
        && map.get("x").is_some_and(|x| near(x, expected, tolerance))
        && map.get("y").is_some_and(|y| near(y, expected, tolerance))
}

/// Simplifies one keyframe in place.
pub fn simplify_keyframe(kf: &mut Map<String, Value>, policy: &Policy) {
    let defaults = &policy.defaults;

    if policy.hold_flag && kf.get("h").is_some_and(|h| is_number(h, defaults.hold)) {
        kf.remove("h");
    }

    // Matched before rounding: 0.833 would round to 0.83 at two places.
    if policy.default_easing {
        let tol = defaults.handle_tolerance;
        if kf.get("i").is_some_and(|i| is_default_handle(i, defaults.ease_in, tol)) {
            kf.remove("i");
        }
        if kf.get("o").is_some_and(|o| is_default_handle(o, defaults.ease_out, tol)) {
            kf.remove("o");
        }
    }

    for value in kf.values_mut() {
        round_value(value, policy.precision);
    }

    if policy.hold_collapse {
        // Rounded numbers are normalised, so `==` matches canonical serialization.
        let same = matches!((kf.get("s"), kf.get("e")), (Some(s), Some(e)) if s == e);
        if same {
            kf.remove("e");
            kf.insert("h".to_string(), Value::from(1));
        }
    }
}

/// Unwraps `[x]` to `x`. Scalar and shape path tracks store their values as
/// one-element arrays; static `k` holds the bare number or path object.
fn unwrap_scalar(value: Value) -> Value {
    match value {
        Value::Array(mut items)
            if items.len() == 1 && (items[0].is_number() || items[0].is_object()) =>
        {
            items.remove(0)
        }
        other => other,
    }
}

/// Simplifies a track (`k` of an animated property).
///
/// Anything that is not a non-empty keyframe list comes back unchanged.
pub fn simplify_keyframes(value: Value, policy: &Policy) -> Value {
    let mut frames = match value {
        Value::Array(frames) if !frames.is_empty() && frames.iter().all(is_keyframe) => frames,
        other => return other,
    };

    if policy.single_keyframe && frames.len() == 1 {
        if let Some(Value::Object(mut kf)) = frames.pop() {
            simplify_keyframe(&mut kf, policy);
            return match kf.remove("s") {
                Some(start) => unwrap_scalar(start),
                None => Value::Array(vec![Value::Object(kf)]),
            };
        }
    }

    for frame in frames.iter_mut() {
        if let Value::Object(kf) = frame {
            simplify_keyframe(kf, policy);
        }
    }
    Value::Array(frames)
}

/// An animatable property: `{ "a": 0 | 1, "k": ... }`.
pub fn is_property(map: &Map<String, Value>) -> bool {
    map.contains_key("a") && map.contains_key("k")
}

/// Simplifies an animatable property object in place.
///
/// A track collapsed to a static value flips `a` to 0.
pub fn simplify_property(prop: &mut Map<String, Value>, policy: &Policy) {
    let Some(k) = prop.remove("k") else {
        return;
    };
    let animated = is_keyframe_list(&k);
    let mut k = simplify_keyframes(k, policy);
    if animated {
        if !is_keyframe_list(&k) && prop.contains_key("a") {
            prop.insert("a".to_string(), Value::from(0));
        }
    } else {
        round_value(&mut k, policy.precision);
    }
    prop.insert("k".to_string(), k);
}

/// Simplifies every channel of a transform (`ks`) object.
///
/// Split positions (`{"s": true, "x": {...}, "y": {...}}`) are handled per axis.
pub fn simplify_transform(ks: &mut Value, policy: &Policy) {
    let Value::Object(channels) = ks else {
        return;
    };
    for channel in channels.values_mut() {
        let Value::Object(prop) = channel else {
            continue;
        };
        if prop.contains_key("k") {
            simplify_property(prop, policy);
        } else if prop.get("s").and_then(Value::as_bool) == Some(true) {
            for axis in ["x", "y", "z"] {
                if let Some(Value::Object(axis_prop)) = prop.get_mut(axis) {
                    simplify_property(axis_prop, policy);
                }
            }
        }
    }
}

/// Walks an arbitrary subtree (shapes, masks, effects, text) and simplifies
/// every animatable property found. Other numbers are rounded on the way.
pub fn simplify_animated_tree(value: &mut Value, policy: &Policy) {
    match value {
        Value::Object(map) => {
            if is_property(map) {
                simplify_property(map, policy);
                for (key, item) in map.iter_mut() {
                    if key != "k" {
                        simplify_animated_tree(item, policy);
                    }
                }
            } else {
                for item in map.values_mut() {
                    simplify_animated_tree(item, policy);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                simplify_animated_tree(item, policy);
            }
        }
        Value::Number(n) => {
            if let Some(rounded) = round_number(n, policy.precision) {
                *n = rounded;
            }
        }
        Value::String(_) | Value::Bool(_) | Value::Null => {}
    }
}

/// Counts `(animated properties, keyframes)` in a subtree.
pub fn count_keyframes(value: &Value) -> (usize, usize) {
    match value {
        Value::Object(map) => {
            let animated = is_property(map) && map.get("k").is_some_and(is_keyframe_list);
            let mut counts = match map.get("k") {
                Some(Value::Array(frames)) if animated => (1, frames.len()),
                _ => (0, 0),
            };
            for (key, item) in map {
                if animated && key == "k" {
                    continue;
                }
                let (p, k) = count_keyframes(item);
                counts.0 += p;
                counts.1 += k;
            }
            counts
        }
        Value::Array(items) => items.iter().map(count_keyframes).fold((0, 0), |acc, c| {
            (acc.0 + c.0, acc.1 + c.1)
        }),
        _ => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kf(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected object"),
        }
    }

    #[test]
    fn test_drops_default_hold_and_easing() {
        let mut k = kf(json!({
            "t": 0,
            "s": [10.123456],
            "e": [20.0],
            "i": { "x": 0.833, "y": 0.833 },
            "o": { "x": [0.167], "y": [0.167] },
            "h": 0
        }));
        simplify_keyframe(&mut k, &Policy::default());
        assert_eq!(Value::Object(k), json!({ "t": 0, "s": [10.12], "e": [20] }));
    }

    #[test]
    fn test_keeps_custom_easing() {
        let mut k = kf(json!({
            "t": 0, "s": [0], "e": [1],
            "i": { "x": [0.667], "y": [1] },
            "o": { "x": [0.333], "y": [0] }
        }));
        simplify_keyframe(&mut k, &Policy::default());
        assert_eq!(k["i"], json!({ "x": [0.67], "y": [1] }));
        assert_eq!(k["o"], json!({ "x": [0.33], "y": [0] }));
    }

    #[test]
    fn test_equal_start_end_becomes_hold() {
        let mut k = kf(json!({ "t": 5, "s": [100, 100, 100], "e": [100.0001, 100, 100] }));
        simplify_keyframe(&mut k, &Policy::default());
        assert_eq!(Value::Object(k), json!({ "t": 5, "s": [100, 100, 100], "h": 1 }));
    }

    #[test]
    fn test_single_keyframe_collapses_to_static() {
        let track = json!([{ "t": 12, "s": [256, 256, 0], "i": { "x": 0.833, "y": 0.833 } }]);
        assert_eq!(simplify_keyframes(track, &Policy::default()), json!([256, 256, 0]));

        let scalar = json!([{ "t": 0, "s": [45.0] }]);
        assert_eq!(simplify_keyframes(scalar, &Policy::default()), json!(45));
    }

    #[test]
    fn test_single_keyframe_path_collapses_to_bare_path() {
        let path = json!({
            "c": true,
            "i": [[0, 0], [0, 0]],
            "o": [[0, 0], [0, 0]],
            "v": [[0, 0], [10, 10]]
        });
        let mut shapes = json!([{
            "ty": "sh",
            "ks": { "a": 1, "k": [{ "t": 0, "s": [path.clone()] }] }
        }]);
        simplify_animated_tree(&mut shapes, &Policy::default());
        assert_eq!(shapes[0]["ks"]["a"], json!(0));
        assert_eq!(shapes[0]["ks"]["k"], path);
    }

    #[test]
    fn test_non_lists_untouched() {
        let policy = Policy::default();
        assert_eq!(simplify_keyframes(json!([]), &policy), json!([]));
        assert_eq!(simplify_keyframes(json!(100), &policy), json!(100));
        assert_eq!(simplify_keyframes(json!([1.23456, 2]), &policy), json!([1.23456, 2]));
        assert_eq!(simplify_keyframes(json!({ "t": 0 }), &policy), json!({ "t": 0 }));
    }

    #[test]
    fn test_property_flips_animated_flag() {
        let mut prop = kf(json!({ "a": 1, "k": [{ "t": 0, "s": [50] }], "ix": 11 }));
        simplify_property(&mut prop, &Policy::default());
        assert_eq!(Value::Object(prop), json!({ "a": 0, "k": 50, "ix": 11 }));
    }

    #[test]
    fn test_transform_channels_and_split_position() {
        let mut ks = json!({
            "o": { "a": 0, "k": 99.999 },
            "r": { "a": 1, "k": [
                { "t": 0, "s": [0], "e": [90], "h": 0 },
                { "t": 30 }
            ]},
            "p": { "s": true,
                "x": { "a": 1, "k": [{ "t": 0, "s": [12.3456] }] },
                "y": { "a": 0, "k": 7.0 }
            }
        });
        simplify_transform(&mut ks, &Policy::default());
        assert_eq!(
            ks,
            json!({
                "o": { "a": 0, "k": 100 },
                "r": { "a": 1, "k": [{ "t": 0, "s": [0], "e": [90] }, { "t": 30 }] },
                "p": { "s": true, "x": { "a": 0, "k": 12.35 }, "y": { "a": 0, "k": 7 } }
            })
        );
    }

    #[test]
    fn test_animated_tree_reaches_nested_shapes() {
        let mut shapes = json!([{
            "ty": "gr",
            "it": [
                { "ty": "el", "s": { "a": 1, "k": [{ "t": 0, "s": [10, 10] }] } },
                { "ty": "fl", "c": { "a": 0, "k": [0.9215686274509803, 0.4, 0.5, 1] }, "o": { "a": 0, "k": 100 } }
            ]
        }]);
        simplify_animated_tree(&mut shapes, &Policy::default());
        assert_eq!(shapes[0]["it"][0]["s"], json!({ "a": 0, "k": [10, 10] }));
        assert_eq!(shapes[0]["it"][1]["c"]["k"], json!([0.92, 0.4, 0.5, 1]));
    }

    #[test]
    fn test_count_keyframes() {
        let ks = json!({
            "o": { "a": 0, "k": 100 },
            "r": { "a": 1, "k": [{ "t": 0, "s": [0] }, { "t": 30, "s": [90] }] },
            "s": { "a": 1, "k": [{ "t": 0, "s": [100, 100] }] }
        });
        assert_eq!(count_keyframes(&ks), (2, 3));
    }

    #[test]
    fn test_hold_collapse_keeps_value_over_span() {
        // Holding s over the span renders the same as interpolating s -> s.
        let mut k = kf(json!({ "t": 0, "s": [3, 4], "e": [3, 4], "i": { "x": [0.2], "y": [1] }, "o": { "x": [0.8], "y": [0] } }));
        let start = k["s"].clone();
        simplify_keyframe(&mut k, &Policy::default());
        assert_eq!(k["s"], start);
        assert_eq!(k["h"], json!(1));
        assert!(!k.contains_key("e"));
    }
}
