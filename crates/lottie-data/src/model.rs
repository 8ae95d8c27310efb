use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Root of a Lottie document.
///
/// Only the keys the optimizer reasons about are typed. Everything else is kept
/// verbatim in `extra` so a load/save cycle never loses data. Numeric header
/// fields stay as [`Number`] so that integers are written back as integers.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct LottieJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddd: Option<Number>, // 3D flag
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assets: Vec<Asset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chars: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LottieJson {
    /// Looks up an asset by id.
    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Global out-point as a float, if present and numeric.
    pub fn out_point(&self) -> Option<f64> {
        self.op.as_ref().and_then(Number::as_f64)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Layer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Number>, // 0 precomp, 1 solid, 2 image, 3 null, 4 shape, 5 text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ind: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub st: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sr: Option<Number>, // Stretch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bm: Option<Number>, // Blend mode, 0 = normal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddd: Option<Number>,
    #[serde(default, rename = "refId", skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>, // PreComp, Image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ks: Option<Value>, // Transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layer {
    pub fn index(&self) -> Option<f64> {
        self.ind.as_ref().and_then(Number::as_f64)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Asset {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Layer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u: Option<String>, // Directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>, // File name or data-URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<Number>, // Embedded flag
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    EmbeddedImage,
    ExternalImage,
    Precomposition,
    Other,
}

impl AssetKind {
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::EmbeddedImage => "embedded image",
            AssetKind::ExternalImage => "external image",
            AssetKind::Precomposition => "precomposition",
            AssetKind::Other => "other",
        }
    }
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        if self.layers.is_some() {
            AssetKind::Precomposition
        } else if let Some(p) = &self.p {
            if is_data_uri(p) {
                AssetKind::EmbeddedImage
            } else {
                AssetKind::ExternalImage
            }
        } else {
            AssetKind::Other
        }
    }
}

/// True for `data:<mime>;base64,<payload>` strings.
pub fn is_data_uri(s: &str) -> bool {
    s.starts_with("data:") && s.contains(";base64,")
}

/// Builds the shortest JSON number for `x`: integral values become integers.
///
/// Returns `None` for NaN and infinities, which JSON cannot carry.
pub fn number_from_f64(x: f64) -> Option<Number> {
    if !x.is_finite() {
        return None;
    }
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        // -0.0 collapses to 0 here as well
        return Some(Number::from(x as i64));
    }
    Number::from_f64(x)
}

/// Numeric comparison that ignores the integer/float encoding.
pub fn number_eq(n: &Number, expected: f64) -> bool {
    n.as_f64().is_some_and(|x| x == expected)
}
