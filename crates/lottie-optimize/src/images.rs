//! # Embedded Image Recompression
//!
//! Re-encodes `data:` image payloads with the `image` crate.
//!
//! ## Responsibilities
//! - **Decode**: base64 payload to pixels.
//! - **Downscale**: fit within `max_dimension`, aspect preserved, never upscaled.
//! - **Encode**: JPEG at a fixed or size-dependent quality, or best-effort PNG.
//! - **Isolation**: one bad asset is logged and keeps its original bytes.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::DynamicImage;
use lottie_data::model::{Asset, AssetKind};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Not a base64 data URI")]
    NotDataUri,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Jpeg,
    Png,
}

impl TargetFormat {
    pub fn mime(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
        }
    }

    fn matches_mime(self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        match self {
            TargetFormat::Jpeg => mime == "image/jpeg" || mime == "image/jpg",
            TargetFormat::Png => mime == "image/png",
        }
    }
}

/// Largest dimension at or below which the maximum quality is used.
const SMALL_EDGE: u32 = 512;
/// Largest dimension at or above which the minimum quality is used.
const LARGE_EDGE: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum QualityPolicy {
    Fixed { quality: u8 },
    /// Larger images hide artifacts better, so quality falls linearly from
    /// `max` at 512 px to `min` at 2048 px of the largest dimension.
    Dynamic { min: u8, max: u8 },
}

impl Default for QualityPolicy {
    fn default() -> Self {
        QualityPolicy::Dynamic { min: 60, max: 85 }
    }
}

impl QualityPolicy {
    pub fn quality_for(&self, largest_dimension: u32) -> u8 {
        let q = match *self {
            QualityPolicy::Fixed { quality } => quality,
            QualityPolicy::Dynamic { min, max } => {
                let (lo, hi) = (min.min(max), min.max(max));
                let span = (LARGE_EDGE - SMALL_EDGE) as f32;
                let t = (largest_dimension.saturating_sub(SMALL_EDGE) as f32 / span).min(1.0);
                (hi as f32 - (hi - lo) as f32 * t).round() as u8
            }
        };
        q.clamp(1, 100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub format: TargetFormat,
    pub quality: QualityPolicy,
    /// Images wider or taller than this are downscaled to fit.
    pub max_dimension: Option<u32>,
    /// Keep the original when the re-encoded payload is not smaller.
    pub only_if_smaller: bool,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            format: TargetFormat::Jpeg,
            quality: QualityPolicy::default(),
            max_dimension: Some(2048),
            only_if_smaller: true,
        }
    }
}

/// A borrowed view of `data:<mime>;base64,<payload>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub mime: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(uri: &'a str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (mime, payload) = rest.split_once(";base64,")?;
        Some(Self { mime, payload })
    }

    pub fn decode(&self) -> Result<Vec<u8>, ImageError> {
        Ok(BASE64_STANDARD.decode(self.payload.trim())?)
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(bytes))
    }
}

fn has_transparency(img: &DynamicImage) -> bool {
    img.color().has_alpha() && img.to_rgba8().pixels().any(|p| p.0[3] < u8::MAX)
}

fn encode(img: &DynamicImage, format: TargetFormat, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    match format {
        TargetFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut out, quality);
            img.to_rgb8()
                .write_with_encoder(encoder)
                .map_err(ImageError::Encode)?;
        }
        TargetFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder).map_err(ImageError::Encode)?;
        }
    }
    Ok(out)
}

/// Re-encodes one data URI.
///
/// Returns `Ok(None)` when the original should stay: already in the target
/// format, transparency a JPEG cannot carry, or no size gain.
pub fn recompress_data_uri(
    uri: &str,
    settings: &ImageSettings,
) -> Result<Option<String>, ImageError> {
    let data = DataUri::parse(uri).ok_or(ImageError::NotDataUri)?;
    if settings.format.matches_mime(data.mime) {
        return Ok(None);
    }

    let bytes = data.decode()?;
    let mut img = image::load_from_memory(&bytes).map_err(ImageError::Decode)?;

    if settings.format == TargetFormat::Jpeg && has_transparency(&img) {
        debug!(mime = data.mime, "skipping transparent image for JPEG target");
        return Ok(None);
    }

    if let Some(max) = settings.max_dimension {
        if img.width() > max || img.height() > max {
            img = img.resize(max, max, FilterType::Lanczos3);
        }
    }

    let quality = settings.quality.quality_for(img.width().max(img.height()));
    let encoded = encode(&img, settings.format, quality)?;
    if settings.only_if_smaller && encoded.len() >= bytes.len() {
        return Ok(None);
    }
    Ok(Some(DataUri::encode(settings.format.mime(), &encoded)))
}

/// Totals for one recompression batch. Sizes are data-URI string lengths.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageStats {
    pub processed: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub bytes_before: usize,
    pub bytes_after: usize,
}

enum Outcome {
    Replaced { before: usize, after: usize },
    Unchanged(usize),
    Failed(usize),
}

fn recompress_asset(asset: &mut Asset, settings: &ImageSettings) -> Outcome {
    let Some(uri) = asset.p.as_deref() else {
        return Outcome::Unchanged(0);
    };
    let before = uri.len();
    match recompress_data_uri(uri, settings) {
        Ok(Some(new_uri)) => {
            let after = new_uri.len();
            debug!(id = %asset.id, before, after, "recompressed image");
            asset.p = Some(new_uri);
            Outcome::Replaced { before, after }
        }
        Ok(None) => Outcome::Unchanged(before),
        Err(e) => {
            warn!(id = %asset.id, error = %e, "keeping original image payload");
            Outcome::Failed(before)
        }
    }
}

/// Recompresses every embedded image in parallel. Never fails as a whole.
#[instrument(level = "info", skip_all, fields(assets = assets.len()))]
pub fn recompress_assets(assets: &mut [Asset], settings: &ImageSettings) -> ImageStats {
    let outcomes: Vec<Outcome> = assets
        .par_iter_mut()
        .filter(|asset| asset.kind() == AssetKind::EmbeddedImage)
        .map(|asset| recompress_asset(asset, settings))
        .collect();

    let mut stats = ImageStats::default();
    for outcome in outcomes {
        stats.processed += 1;
        match outcome {
            Outcome::Replaced { before, after } => {
                stats.replaced += 1;
                stats.bytes_before += before;
                stats.bytes_after += after;
            }
            Outcome::Unchanged(size) => {
                stats.unchanged += 1;
                stats.bytes_before += size;
                stats.bytes_after += size;
            }
            Outcome::Failed(size) => {
                stats.failed += 1;
                stats.bytes_before += size;
                stats.bytes_after += size;
            }
        }
    }
    stats
}
