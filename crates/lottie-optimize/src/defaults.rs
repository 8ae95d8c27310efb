//! # Schema Defaults
//!
//! Every value the optimizer considers "implicit" lives here, in one table.
//! The stripping passes consult it to decide what to drop, and
//! [`crate::layers::restore_layer_defaults`] consults it to put values back.
//!
//! Exporters disagree about which defaults are safe to omit, so each rule can be
//! switched off through [`Policy`].

use serde::{Deserialize, Serialize};

/// Values a conforming renderer assumes when a key is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDefaults {
    /// Layer `sr`.
    pub stretch: f64,
    /// Layer `ip`.
    pub in_point: f64,
    /// Layer `st`.
    pub start_time: f64,
    /// Layer `bm`; 0 is "normal".
    pub blend_mode: f64,
    /// Layer and document `ddd`.
    pub three_d: f64,
    /// Document `v`.
    pub version: String,
    /// Document `fr`.
    pub frame_rate: f64,
    /// Keyframe `h` when the keyframe interpolates.
    pub hold: f64,
    /// Ease-in handle `{x, y}` written by After Effects for linear-looking easing.
    pub ease_in: f64,
    /// Ease-out handle `{x, y}`.
    pub ease_out: f64,
    /// Tolerance when matching ease handles against the defaults above.
    pub handle_tolerance: f64,
}

impl Default for SchemaDefaults {
    fn default() -> Self {
        Self {
            stretch: 1.0,
            in_point: 0.0,
            start_time: 0.0,
            blend_mode: 0.0,
            three_d: 0.0,
            version: "5.5.2".to_string(),
            frame_rate: 30.0,
            hold: 0.0,
            ease_in: 0.833,
            ease_out: 0.167,
            handle_tolerance: 1e-3,
        }
    }
}

/// Which simplifications are active, and at what numeric precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub defaults: SchemaDefaults,
    /// Decimal places kept on float leaves.
    pub precision: u32,

    // Layer rules
    /// Drop `parent` when it equals `ind - 1`.
    pub sequential_parent: bool,
    pub stretch: bool,
    pub in_point: bool,
    pub start_time: bool,
    pub blend_mode: bool,
    /// Drop layer `op` when it equals the document `op`.
    pub out_point: bool,
    pub layer_three_d: bool,
    /// Drop `nm`, `mn`, `cl` and `ln`. Breaks expressions that look layers up by name.
    pub names: bool,

    // Document header rules
    pub header_three_d: bool,
    pub header_version: bool,
    pub header_frame_rate: bool,
    pub empty_markers: bool,

    // Keyframe rules
    pub hold_flag: bool,
    pub default_easing: bool,
    /// Turn `s == e` keyframes into hold keyframes.
    pub hold_collapse: bool,
    /// Replace one-keyframe tracks with their static value.
    pub single_keyframe: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            defaults: SchemaDefaults::default(),
            precision: 2,
            sequential_parent: true,
            stretch: true,
            in_point: true,
            start_time: true,
            blend_mode: true,
            out_point: true,
            layer_three_d: true,
            names: false,
            header_three_d: true,
            header_version: true,
            header_frame_rate: true,
            empty_markers: true,
            hold_flag: true,
            default_easing: true,
            hold_collapse: true,
            single_keyframe: true,
        }
    }
}

impl Policy {
    /// Rounding only; nothing is dropped.
    pub fn lossless_structure() -> Self {
        Self {
            sequential_parent: false,
            stretch: false,
            in_point: false,
            start_time: false,
            blend_mode: false,
            out_point: false,
            layer_three_d: false,
            names: false,
            header_three_d: false,
            header_version: false,
            header_frame_rate: false,
            empty_markers: false,
            hold_flag: false,
            default_easing: false,
            hold_collapse: false,
            single_keyframe: false,
            ..Self::default()
        }
    }
}

/// Keys carrying human-readable names or After Effects match names.
pub const NAME_KEYS: [&str; 4] = ["nm", "mn", "cl", "ln"];
