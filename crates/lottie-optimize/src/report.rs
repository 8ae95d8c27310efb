//! # Size and Diagnostics Reporting
//!
//! Read-only analysis over a document. Nothing here mutates.

use crate::assets::{duplicate_groups, usage_counts, AssetTable};
use crate::keyframes::count_keyframes;
use lottie_data::model::{AssetKind, Layer, LottieJson};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io;

/// `io::Write` sink that only counts.
#[derive(Default)]
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Bytes of the compact JSON encoding of `value`, without allocating it.
pub fn serialized_size<T: Serialize + ?Sized>(value: &T) -> Result<usize, serde_json::Error> {
    let mut counter = ByteCounter::default();
    serde_json::to_writer(&mut counter, value)?;
    Ok(counter.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeReport {
    pub before: usize,
    pub after: usize,
}

impl SizeReport {
    pub fn saved(&self) -> isize {
        self.before as isize - self.after as isize
    }

    /// Percentage of `before` that was saved; negative if the document grew.
    pub fn reduction_percent(&self) -> f64 {
        if self.before == 0 {
            return 0.0;
        }
        self.saved() as f64 * 100.0 / self.before as f64
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({:.2}% smaller)",
            human_bytes(self.before),
            human_bytes(self.after),
            self.reduction_percent()
        )
    }
}

pub fn human_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.2} MB", b / (KB * KB))
    }
}

/// Everything the `analyze` command prints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub total_bytes: usize,
    pub layer_count: usize,
    pub asset_counts: BTreeMap<AssetKind, usize>,
    pub embedded_image_bytes: usize,
    pub duplicate_groups: Vec<Vec<String>>,
    /// References per asset id; every asset is listed.
    pub usage: BTreeMap<String, usize>,
    pub unused: Vec<String>,
    pub unreachable: Vec<String>,
    pub dangling_refs: Vec<String>,
    pub cycles: Vec<String>,
    pub max_nesting_depth: usize,
    pub animated_properties: usize,
    pub keyframes: usize,
}

fn count_layer_keyframes(layers: &[Layer]) -> (usize, usize) {
    let mut totals = (0, 0);
    for layer in layers {
        let subtrees = [layer.ks.as_ref(), layer.shapes.as_ref()]
            .into_iter()
            .flatten()
            .chain(layer.extra.values());
        for value in subtrees {
            let (p, k) = count_keyframes(value);
            totals.0 += p;
            totals.1 += k;
        }
    }
    totals
}

impl Diagnostics {
    pub fn analyze(doc: &LottieJson) -> Result<Self, serde_json::Error> {
        let table = AssetTable::new(&doc.assets);
        let reach = table.walk(&doc.layers);

        let mut diag = Diagnostics {
            total_bytes: serialized_size(doc)?,
            layer_count: doc.layers.len(),
            duplicate_groups: duplicate_groups(&doc.assets),
            usage: usage_counts(doc),
            dangling_refs: reach.dangling.clone(),
            max_nesting_depth: reach.max_depth,
            ..Default::default()
        };

        let (props, frames) = count_layer_keyframes(&doc.layers);
        diag.animated_properties = props;
        diag.keyframes = frames;

        let mut reached = vec![false; doc.assets.len()];
        for &idx in &reach.reachable {
            reached[idx] = true;
        }

        for (idx, asset) in doc.assets.iter().enumerate() {
            let kind = asset.kind();
            *diag.asset_counts.entry(kind).or_default() += 1;
            match kind {
                AssetKind::EmbeddedImage => {
                    diag.embedded_image_bytes += asset.p.as_ref().map_or(0, String::len);
                }
                AssetKind::Precomposition => {
                    let layers = asset.layers.as_deref().unwrap_or_default();
                    diag.layer_count += layers.len();
                    let (props, frames) = count_layer_keyframes(layers);
                    diag.animated_properties += props;
                    diag.keyframes += frames;
                }
                AssetKind::ExternalImage | AssetKind::Other => {}
            }
            if !reached[idx] {
                diag.unreachable.push(asset.id.clone());
            }
        }

        diag.unused = diag
            .usage
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(id, _)| id.clone())
            .collect();
        diag.cycles = reach
            .cycles
            .iter()
            .map(|&idx| doc.assets[idx].id.clone())
            .collect();
        Ok(diag)
    }
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<24} {}", "Document size", human_bytes(self.total_bytes))?;
        writeln!(f, "{:<24} {}", "Layers", self.layer_count)?;
        writeln!(f, "{:<24} {}", "Animated properties", self.animated_properties)?;
        writeln!(f, "{:<24} {}", "Keyframes", self.keyframes)?;
        writeln!(f, "{:<24} {}", "Max precomp depth", self.max_nesting_depth)?;
        writeln!(f, "{:<24} {}", "Embedded image bytes", human_bytes(self.embedded_image_bytes))?;
        writeln!(f)?;

        writeln!(f, "{:<24} {:>6}", "Asset type", "Count")?;
        writeln!(f, "{:-<24} {:->6}", "", "")?;
        for (kind, count) in &self.asset_counts {
            writeln!(f, "{:<24} {:>6}", kind.label(), count)?;
        }
        writeln!(f)?;

        writeln!(f, "{:<24} {:>6}", "Asset id", "Uses")?;
        writeln!(f, "{:-<24} {:->6}", "", "")?;
        for (id, count) in &self.usage {
            writeln!(f, "{:<24} {:>6}", id, count)?;
        }
        writeln!(f)?;

        writeln!(f, "{:<24} {}", "Unused", list(&self.unused))?;
        writeln!(f, "{:<24} {}", "Unreachable", list(&self.unreachable))?;
        writeln!(f, "{:<24} {}", "Dangling refIds", list(&self.dangling_refs))?;
        writeln!(f, "{:<24} {}", "Cycles", list(&self.cycles))?;
        if self.duplicate_groups.is_empty() {
            writeln!(f, "{:<24} -", "Duplicates")?;
        } else {
            for group in &self.duplicate_groups {
                writeln!(f, "{:<24} {}", "Duplicates", group.join(" = "))?;
            }
        }
        Ok(())
    }
}
