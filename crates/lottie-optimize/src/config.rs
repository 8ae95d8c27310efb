//! Optimizer configuration.
//!
//! Every field has a default, so a config file only needs the keys it changes:
//!
//! ```json
//! { "policy": { "precision": 3, "header_frame_rate": false }, "images": { "format": "png" } }
//! ```

use crate::defaults::Policy;
use crate::errors::OptimizeError;
use crate::images::ImageSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeConfig {
    /// Rounding precision and which defaults get stripped.
    pub policy: Policy,
    pub images: ImageSettings,
    pub recompress_images: bool,
    pub dedupe_assets: bool,
    pub remove_unused_assets: bool,
    /// Simplify shapes, masks, effects and text as well as transforms.
    pub simplify_shapes: bool,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            images: ImageSettings::default(),
            recompress_images: true,
            dedupe_assets: true,
            remove_unused_assets: true,
            simplify_shapes: true,
        }
    }
}

impl OptimizeConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OptimizeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| OptimizeError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| OptimizeError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Structure-only passes: no image work, no asset graph changes.
    pub fn structure_only() -> Self {
        Self {
            recompress_images: false,
            dedupe_assets: false,
            remove_unused_assets: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{QualityPolicy, TargetFormat};
    use std::io::Write;

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "policy": {{ "precision": 3 }}, "images": {{ "format": "png", "quality": {{ "mode": "fixed", "quality": 70 }} }}, "remove_unused_assets": false }}"#
        )
        .unwrap();

        let config = OptimizeConfig::from_path(file.path()).unwrap();
        assert_eq!(config.policy.precision, 3);
        assert!(config.policy.single_keyframe);
        assert_eq!(config.images.format, TargetFormat::Png);
        assert_eq!(config.images.quality, QualityPolicy::Fixed { quality: 70 });
        assert_eq!(config.images.max_dimension, Some(2048));
        assert!(!config.remove_unused_assets);
        assert!(config.dedupe_assets);
    }

    #[test]
    fn test_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"policy\": 12 }}").unwrap();
        let err = OptimizeConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, OptimizeError::Config { .. }), "got {err:?}");

        let err = OptimizeConfig::from_path("/definitely/missing.json").unwrap_err();
        assert!(matches!(err, OptimizeError::ConfigIo { .. }), "got {err:?}");
    }
}
