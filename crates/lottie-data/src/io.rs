//! Loading and writing Lottie documents.
//!
//! Output is always compact JSON: no whitespace is added, since the whole point
//! of rewriting a document is to make it smaller.

use crate::error::LottieError;
use crate::model::LottieJson;
use std::fs;
use std::path::Path;

impl LottieJson {
    /// Reads and parses a UTF-8 JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LottieError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LottieError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, LottieError> {
        serde_json::from_slice(bytes).map_err(LottieError::Parse)
    }

    pub fn from_json_str(s: &str) -> Result<Self, LottieError> {
        serde_json::from_str(s).map_err(LottieError::Parse)
    }

    pub fn to_compact_string(&self) -> Result<String, LottieError> {
        serde_json::to_string(self).map_err(LottieError::Serialize)
    }

    /// Serializes first, then writes, so a serialization failure never leaves a
    /// truncated file behind. `path` may be the file the document was read from.
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<(), LottieError> {
        let path = path.as_ref();
        let json = self.to_compact_string()?;
        fs::write(path, json).map_err(|source| LottieError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
