//! # Default Stripping
//!
//! Removes layer and header keys whose value equals the implicit default from
//! [`crate::defaults::SchemaDefaults`]. A renderer reads an absent key the same
//! way as the default, so only bytes change.
//!
//! Transforms and animated subtrees go through [`crate::keyframes`] before a
//! layer's own keys are stripped.

use crate::assets::AssetTable;
use crate::defaults::{Policy, NAME_KEYS};
use crate::keyframes::{simplify_animated_tree, simplify_transform};
use lottie_data::model::{number_eq, number_from_f64, Layer, LottieJson};
use serde_json::{Number, Value};
use tracing::debug;

/// Layer keys (outside `ks`/`shapes`) that hold animatable content.
const ANIMATED_LAYER_KEYS: [&str; 4] = ["masksProperties", "ef", "t", "tm"];

/// Everything a layer needs to know about its surroundings.
#[derive(Debug, Clone, Copy)]
pub struct StripContext<'a> {
    pub policy: &'a Policy,
    /// Document `op`; layers ending there drop their own `op`.
    pub out_point: Option<f64>,
    /// Also simplify shapes, masks, effects and text, not just `ks`.
    pub simplify_shapes: bool,
}

fn strip_number(field: &mut Option<Number>, enabled: bool, default: f64) -> bool {
    if enabled && field.as_ref().is_some_and(|n| number_eq(n, default)) {
        *field = None;
        return true;
    }
    false
}

/// Optimizes a single layer in place. Returns how many keys were dropped.
pub fn strip_layer(layer: &mut Layer, ctx: &StripContext<'_>) -> usize {
    let policy = ctx.policy;
    let defaults = &policy.defaults;

    if let Some(ks) = layer.ks.as_mut() {
        simplify_transform(ks, policy);
    }
    if ctx.simplify_shapes {
        if let Some(shapes) = layer.shapes.as_mut() {
            simplify_animated_tree(shapes, policy);
        }
        for key in ANIMATED_LAYER_KEYS {
            if let Some(value) = layer.extra.get_mut(key) {
                simplify_animated_tree(value, policy);
            }
        }
    }

    let mut dropped = 0;
    if policy.sequential_parent {
        if let (Some(parent), Some(ind)) = (layer.parent.as_ref(), layer.index()) {
            if number_eq(parent, ind - 1.0) {
                layer.parent = None;
                dropped += 1;
            }
        }
    }
    dropped += strip_number(&mut layer.sr, policy.stretch, defaults.stretch) as usize;
    dropped += strip_number(&mut layer.ip, policy.in_point, defaults.in_point) as usize;
    dropped += strip_number(&mut layer.st, policy.start_time, defaults.start_time) as usize;
    dropped += strip_number(&mut layer.bm, policy.blend_mode, defaults.blend_mode) as usize;
    dropped += strip_number(&mut layer.ddd, policy.layer_three_d, defaults.three_d) as usize;
    if let Some(global_op) = ctx.out_point {
        dropped += strip_number(&mut layer.op, policy.out_point, global_op) as usize;
    }
    if policy.names {
        for key in NAME_KEYS {
            dropped += layer.extra.remove(key).is_some() as usize;
        }
    }
    dropped
}

/// Puts back every default [`strip_layer`] may have removed.
///
/// Used to check that stripping is reversible.
pub fn restore_layer_defaults(layer: &mut Layer, out_point: Option<f64>, policy: &Policy) {
    let defaults = &policy.defaults;
    let fill = |field: &mut Option<Number>, enabled: bool, value: f64| {
        if enabled && field.is_none() {
            *field = number_from_f64(value);
        }
    };

    if policy.sequential_parent && layer.parent.is_none() {
        if let Some(ind) = layer.index() {
            layer.parent = number_from_f64(ind - 1.0);
        }
    }
    fill(&mut layer.sr, policy.stretch, defaults.stretch);
    fill(&mut layer.ip, policy.in_point, defaults.in_point);
    fill(&mut layer.st, policy.start_time, defaults.start_time);
    fill(&mut layer.bm, policy.blend_mode, defaults.blend_mode);
    fill(&mut layer.ddd, policy.layer_three_d, defaults.three_d);
    if let Some(op) = out_point {
        fill(&mut layer.op, policy.out_point, op);
    }
}

/// Counters for a stripping run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StripStats {
    pub layers: usize,
    pub keys_dropped: usize,
    pub precomps: usize,
}

/// Strips the root layers, then every precomposition depth-first from the root.
///
/// Each precomposition is processed exactly once even when referenced many
/// times or from a cycle. Precompositions the root never reaches are processed
/// afterwards so that the whole document is covered.
pub fn strip_document(doc: &mut LottieJson, policy: &Policy, simplify_shapes: bool) -> StripStats {
    let ctx = StripContext {
        policy,
        out_point: doc.out_point(),
        simplify_shapes,
    };
    let mut stats = StripStats::default();

    for layer in doc.layers.iter_mut() {
        stats.keys_dropped += strip_layer(layer, &ctx);
        stats.layers += 1;
    }

    let mut order = AssetTable::new(&doc.assets).walk(&doc.layers).precomp_order;
    let mut queued = vec![false; doc.assets.len()];
    for &idx in &order {
        queued[idx] = true;
    }
    order.extend(
        doc.assets
            .iter()
            .enumerate()
            .filter(|(idx, asset)| !queued[*idx] && asset.layers.is_some())
            .map(|(idx, _)| idx),
    );

    for idx in order {
        let asset = &mut doc.assets[idx];
        let Some(layers) = asset.layers.as_mut() else {
            continue;
        };
        for layer in layers.iter_mut() {
            stats.keys_dropped += strip_layer(layer, &ctx);
            stats.layers += 1;
        }
        stats.precomps += 1;
        debug!(id = %asset.id, "stripped precomposition");
    }
    stats
}

/// Drops document-level keys equal to their defaults. Returns how many were dropped.
pub fn strip_header(doc: &mut LottieJson, policy: &Policy) -> usize {
    let defaults = &policy.defaults;
    let mut dropped = 0;

    dropped += strip_number(&mut doc.ddd, policy.header_three_d, defaults.three_d) as usize;
    dropped += strip_number(&mut doc.fr, policy.header_frame_rate, defaults.frame_rate) as usize;
    if policy.header_version && doc.v.as_deref() == Some(defaults.version.as_str()) {
        doc.v = None;
        dropped += 1;
    }
    if policy.empty_markers
        && matches!(&doc.markers, Some(Value::Array(markers)) if markers.is_empty())
    {
        doc.markers = None;
        dropped += 1;
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer(value: Value) -> Layer {
        serde_json::from_value(value).unwrap()
    }

    fn ctx(policy: &Policy) -> StripContext<'_> {
        StripContext {
            policy,
            out_point: Some(90.0),
            simplify_shapes: true,
        }
    }

    #[test]
    fn test_strips_layer_defaults() {
        let policy = Policy::default();
        let mut l = layer(json!({
            "ty": 3, "ind": 2, "parent": 1, "sr": 1, "ip": 0, "op": 90, "st": 0, "bm": 0, "ddd": 0,
            "nm": "Null 1",
            "ks": { "o": { "a": 0, "k": 100 } }
        }));
        assert_eq!(strip_layer(&mut l, &ctx(&policy)), 7);
        assert_eq!(
            serde_json::to_value(&l).unwrap(),
            json!({ "ty": 3, "ind": 2, "nm": "Null 1", "ks": { "o": { "a": 0, "k": 100 } } })
        );
    }

    #[test]
    fn test_keeps_non_defaults() {
        let policy = Policy::default();
        let mut l = layer(json!({ "ind": 5, "parent": 1, "sr": 2, "ip": 10, "op": 60, "st": -5, "bm": 3 }));
        assert_eq!(strip_layer(&mut l, &ctx(&policy)), 0);
        assert_eq!(l.parent.as_ref().and_then(Number::as_u64), Some(1));
        assert_eq!(l.bm.as_ref().and_then(Number::as_u64), Some(3));
    }

    #[test]
    fn test_names_only_when_enabled() {
        let policy = Policy {
            names: true,
            ..Policy::default()
        };
        let mut l = layer(json!({ "ind": 1, "nm": "Shape", "mn": "ADBE", "cl": "x", "hd": false }));
        strip_layer(&mut l, &ctx(&policy));
        assert_eq!(serde_json::to_value(&l).unwrap(), json!({ "ind": 1, "hd": false }));
    }

    #[test]
    fn test_restore_reverses_strip() {
        let policy = Policy::default();
        let original = layer(json!({
            "ty": 4, "ind": 3, "parent": 2, "sr": 1, "ip": 0, "op": 90, "st": 0, "bm": 0, "ddd": 0
        }));
        let mut l = original.clone();
        strip_layer(&mut l, &ctx(&policy));
        assert_ne!(l, original);
        restore_layer_defaults(&mut l, Some(90.0), &policy);
        assert_eq!(l, original);
    }

    #[test]
    fn test_header_scenario() {
        let policy = Policy::default();
        let mut doc: LottieJson = serde_json::from_value(json!({
            "v": "5.5.2", "fr": 30, "ddd": 0, "ip": 0, "op": 60, "w": 100, "h": 100,
            "layers": [], "markers": []
        }))
        .unwrap();
        assert_eq!(strip_header(&mut doc, &policy), 4);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({ "ip": 0, "op": 60, "w": 100, "h": 100, "layers": [] })
        );

        let mut other: LottieJson =
            serde_json::from_value(json!({ "v": "5.7.4", "fr": 60, "layers": [] })).unwrap();
        assert_eq!(strip_header(&mut other, &policy), 0);
    }

    #[test]
    fn test_strip_document_visits_each_precomp_once() {
        let mut doc: LottieJson = serde_json::from_value(json!({
            "op": 90,
            "layers": [
                { "ind": 1, "refId": "a", "sr": 1 },
                { "ind": 2, "refId": "a", "sr": 1 }
            ],
            "assets": [
                { "id": "a", "layers": [{ "ind": 1, "refId": "a", "ip": 0 }] },
                { "id": "orphan", "layers": [{ "ind": 1, "op": 90 }] }
            ]
        }))
        .unwrap();
        let stats = strip_document(&mut doc, &Policy::default(), true);
        assert_eq!(stats, StripStats { layers: 4, keys_dropped: 4, precomps: 2 });
        assert!(doc.assets[0].layers.as_ref().unwrap()[0].ip.is_none());
        assert!(doc.assets[1].layers.as_ref().unwrap()[0].op.is_none());
    }
}
