//! # Asset Graph
//!
//! Layers reference assets by `refId`, and precomposition assets carry layers of
//! their own, so the document is a graph rather than a tree. Nothing here follows
//! pointers: assets are addressed by their index in `LottieJson::assets`, and a
//! per-branch visiting set short-circuits precompositions that reference
//! themselves (directly or through others).
//!
//! ## Key Functions
//! - [`AssetTable::walk`]: reachability, nesting depth and cycle detection.
//! - [`usage_counts`]: how often each asset id is referenced.
//! - [`dedupe_assets`]: merge assets with identical content.
//! - [`remove_unused_assets`]: drop images and precomps the root never reaches.

use lottie_data::model::{Asset, AssetKind, Layer, LottieJson};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Iterates the `refId`s of a layer list.
pub fn layer_refs(layers: &[Layer]) -> impl Iterator<Item = &str> {
    layers.iter().filter_map(|l| l.ref_id.as_deref())
}

/// Index of asset ids into an asset slice.
pub struct AssetTable<'a> {
    assets: &'a [Asset],
    by_id: HashMap<&'a str, usize>,
}

/// Result of walking the precomposition graph from the root layers.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reachability {
    /// Reached assets, as indices into the asset list.
    pub reachable: Vec<usize>,
    /// Precompositions in depth-first pre-order, each listed once.
    pub precomp_order: Vec<usize>,
    /// Precompositions found on their own reference path.
    pub cycles: Vec<usize>,
    /// Longest chain of nested precompositions below the root.
    pub max_depth: usize,
    /// Referenced ids with no matching asset.
    pub dangling: Vec<String>,
}

#[derive(Default)]
struct WalkState {
    visiting: HashSet<usize>,
    heights: Vec<Option<usize>>,
    reached: Vec<bool>,
    out: Reachability,
}

impl<'a> AssetTable<'a> {
    pub fn new(assets: &'a [Asset]) -> Self {
        let mut by_id = HashMap::with_capacity(assets.len());
        for (idx, asset) in assets.iter().enumerate() {
            // First occurrence wins for duplicate ids.
            if by_id.contains_key(asset.id.as_str()) {
                warn!(id = %asset.id, "duplicate asset id");
                continue;
            }
            by_id.insert(asset.id.as_str(), idx);
        }
        Self { assets, by_id }
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&'a Asset> {
        self.index_of(id).map(|idx| &self.assets[idx])
    }

    /// Depth-first walk from `root` through every reachable precomposition.
    pub fn walk(&self, root: &[Layer]) -> Reachability {
        let mut state = WalkState {
            heights: vec![None; self.assets.len()],
            reached: vec![false; self.assets.len()],
            ..Default::default()
        };

        let mut depth = 0;
        for id in layer_refs(root) {
            depth = depth.max(self.visit_ref(id, &mut state));
        }
        state.out.max_depth = depth;
        state.out.reachable = state
            .reached
            .iter()
            .enumerate()
            .filter_map(|(idx, &hit)| hit.then_some(idx))
            .collect();
        state.out
    }

    /// Returns the nesting height below (and including) the referenced asset.
    fn visit_ref(&self, id: &str, state: &mut WalkState) -> usize {
        let Some(idx) = self.index_of(id) else {
            debug!(ref_id = id, "dangling refId");
            if !state.out.dangling.iter().any(|d| d == id) {
                state.out.dangling.push(id.to_string());
            }
            return 0;
        };
        state.reached[idx] = true;

        let Some(layers) = &self.assets[idx].layers else {
            return 0;
        };
        if state.visiting.contains(&idx) {
            warn!(id = %self.assets[idx].id, "precomposition references itself");
            if !state.out.cycles.contains(&idx) {
                state.out.cycles.push(idx);
            }
            return 0;
        }
        if let Some(height) = state.heights[idx] {
            return height;
        }

        state.visiting.insert(idx);
        state.out.precomp_order.push(idx);
        let mut below = 0;
        for child in layer_refs(layers) {
            below = below.max(self.visit_ref(child, state));
        }
        state.visiting.remove(&idx);

        let height = below + 1;
        state.heights[idx] = Some(height);
        height
    }
}

/// Counts references to each asset id from the root layers and from every
/// precomposition's layers. A precomposition referencing itself is not a use.
/// Every asset appears in the result, unreferenced ones with a count of 0.
pub fn usage_counts(doc: &LottieJson) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> =
        doc.assets.iter().map(|a| (a.id.clone(), 0)).collect();

    let mut tally = |owner: Option<&str>, layers: &[Layer]| {
        for id in layer_refs(layers) {
            if owner == Some(id) {
                continue;
            }
            if let Some(count) = counts.get_mut(id) {
                *count += 1;
            }
        }
    };

    tally(None, &doc.layers);
    for asset in &doc.assets {
        if let Some(layers) = &asset.layers {
            tally(Some(asset.id.as_str()), layers);
        }
    }
    counts
}

/// SHA-256 of everything in the asset except its id and name.
pub fn content_hash(asset: &Asset) -> Option<[u8; 32]> {
    if asset.kind() == AssetKind::Other {
        return None;
    }
    let mut anonymous = asset.clone();
    anonymous.id.clear();
    anonymous.extra.remove("nm");
    let bytes = serde_json::to_vec(&anonymous).ok()?;
    Some(Sha256::digest(&bytes).into())
}

/// Groups of asset ids sharing identical content, in document order.
pub fn duplicate_groups(assets: &[Asset]) -> Vec<Vec<String>> {
    let mut groups: Vec<([u8; 32], Vec<String>)> = Vec::new();
    for asset in assets {
        let Some(hash) = content_hash(asset) else {
            continue;
        };
        match groups.iter_mut().find(|(h, _)| *h == hash) {
            Some((_, ids)) => ids.push(asset.id.clone()),
            None => groups.push((hash, vec![asset.id.clone()])),
        }
    }
    groups
        .into_iter()
        .map(|(_, ids)| ids)
        .filter(|ids| ids.len() > 1)
        .collect()
}

fn rewrite_refs(layers: &mut [Layer], renames: &HashMap<String, String>) {
    for layer in layers {
        if let Some(target) = layer.ref_id.as_ref().and_then(|id| renames.get(id)) {
            layer.ref_id = Some(target.clone());
        }
    }
}

/// Merges assets with identical content into their first occurrence and points
/// every `refId` at the survivor. Repeats until stable, since merging images can
/// make two precompositions identical. Returns how many assets were removed.
pub fn dedupe_assets(doc: &mut LottieJson) -> usize {
    let mut removed = 0;
    loop {
        let mut renames = HashMap::new();
        for group in duplicate_groups(&doc.assets) {
            let Some((keep, rest)) = group.split_first() else {
                continue;
            };
            for id in rest {
                // A repeated id would rename itself; nothing to rewrite.
                if id != keep {
                    renames.insert(id.clone(), keep.clone());
                }
            }
        }
        if renames.is_empty() {
            return removed;
        }

        let before = doc.assets.len();
        doc.assets.retain(|a| !renames.contains_key(&a.id));
        removed += before - doc.assets.len();

        rewrite_refs(&mut doc.layers, &renames);
        for asset in &mut doc.assets {
            if let Some(layers) = asset.layers.as_mut() {
                rewrite_refs(layers, &renames);
            }
        }
        debug!(merged = renames.len(), "deduplicated assets");
    }
}

/// Drops image and precomposition assets the root layers never reach.
/// Other asset kinds (sounds, data) are kept. Returns the removed ids.
pub fn remove_unused_assets(doc: &mut LottieJson) -> Vec<String> {
    let reach = AssetTable::new(&doc.assets).walk(&doc.layers);
    let mut keep = vec![false; doc.assets.len()];
    for idx in reach.reachable {
        keep[idx] = true;
    }

    let mut removed = Vec::new();
    let mut flags = keep.into_iter();
    doc.assets.retain(|asset| {
        let reached = flags.next().unwrap_or(true);
        if reached || asset.kind() == AssetKind::Other {
            true
        } else {
            removed.push(asset.id.clone());
            false
        }
    });
    removed
}
