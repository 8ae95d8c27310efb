use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LottieError {
    #[error("Failed to read or write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid Lottie JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Failed to serialize Lottie JSON: {0}")]
    Serialize(#[source] serde_json::Error),
}
