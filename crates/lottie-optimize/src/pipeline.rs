//! # Optimization Pipeline
//!
//! Runs every pass over one document, in order:
//! 1. Merge duplicate assets.
//! 2. Drop assets the root never reaches.
//! 3. Recompress embedded images.
//! 4. Simplify and strip layers, root first, then precompositions.
//! 5. Strip document header defaults.
//!
//! Steps 1-3 are gated by [`OptimizeConfig`]; 4-5 always run under its `policy`.

use crate::assets::{dedupe_assets, remove_unused_assets};
use crate::config::OptimizeConfig;
use crate::errors::OptimizeError;
use crate::images::{recompress_assets, ImageStats};
use crate::layers::{strip_document, strip_header, StripStats};
use crate::report::{serialized_size, SizeReport};
use lottie_data::LottieJson;
use std::path::Path;
use tracing::{info, instrument};

/// What one run changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizeSummary {
    pub size: SizeReport,
    pub assets_merged: usize,
    pub assets_removed: Vec<String>,
    pub images: Option<ImageStats>,
    pub strip: StripStats,
    pub header_keys_dropped: usize,
}

pub struct Optimizer {
    config: OptimizeConfig,
}

impl Optimizer {
    pub fn new(config: OptimizeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizeConfig {
        &self.config
    }

    /// Optimizes `doc` in place.
    #[instrument(level = "info", skip_all, fields(layers = doc.layers.len(), assets = doc.assets.len()))]
    pub fn optimize(&self, doc: &mut LottieJson) -> Result<OptimizeSummary, OptimizeError> {
        let config = &self.config;
        let before = serialized_size(doc).map_err(OptimizeError::Measure)?;
        let mut summary = OptimizeSummary::default();

        if config.dedupe_assets {
            summary.assets_merged = dedupe_assets(doc);
            if summary.assets_merged > 0 {
                info!(merged = summary.assets_merged, "Merged duplicate assets");
            }
        }

        if config.remove_unused_assets {
            summary.assets_removed = remove_unused_assets(doc);
            if !summary.assets_removed.is_empty() {
                info!(removed = ?summary.assets_removed, "Removed unused assets");
            }
        }

        if config.recompress_images {
            let stats = recompress_assets(&mut doc.assets, &config.images);
            info!(
                processed = stats.processed,
                replaced = stats.replaced,
                failed = stats.failed,
                "Recompressed embedded images"
            );
            summary.images = Some(stats);
        }

        summary.strip = strip_document(doc, &config.policy, config.simplify_shapes);
        summary.header_keys_dropped = strip_header(doc, &config.policy);
        info!(
            layers = summary.strip.layers,
            precomps = summary.strip.precomps,
            keys_dropped = summary.strip.keys_dropped + summary.header_keys_dropped,
            "Stripped defaults"
        );

        let after = serialized_size(doc).map_err(OptimizeError::Measure)?;
        summary.size = SizeReport { before, after };
        info!("Size: {}", summary.size);
        Ok(summary)
    }

    /// Loads `input`, optimizes it and writes the result to `output`.
    ///
    /// Nothing is written if loading or optimizing fails. `output` may equal `input`.
    #[instrument(level = "info", skip(self))]
    pub fn optimize_file(
        &self,
        input: impl AsRef<Path> + std::fmt::Debug,
        output: impl AsRef<Path> + std::fmt::Debug,
    ) -> Result<OptimizeSummary, OptimizeError> {
        let mut doc = LottieJson::from_path(input.as_ref())?;
        let summary = self.optimize(&mut doc)?;
        doc.write_to_path(output.as_ref())?;
        Ok(summary)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(OptimizeConfig::default())
    }
}
