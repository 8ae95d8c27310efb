//! # Lottie Optimize
//!
//! `lottie-optimize` shrinks Lottie animation documents. It is an offline batch
//! transform: load a document, rewrite it, write it back.
//!
//! ## Passes
//!
//! *   **Rounding**: bound float precision on every animated value.
//! *   **Keyframes**: drop default easing and hold flags, turn constant segments
//!     into holds, turn one-keyframe tracks into static values.
//! *   **Default stripping**: remove layer and header keys equal to their
//!     implicit default.
//! *   **Assets**: merge duplicates, drop what the root never reaches.
//! *   **Images**: recompress embedded `data:` images.
//! *   **Diagnostics**: read-only reports on size, assets and keyframes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lottie_optimize::{OptimizeConfig, Optimizer};
//!
//! let optimizer = Optimizer::new(OptimizeConfig::default());
//! let summary = optimizer.optimize_file("intro.json", "intro.min.json").unwrap();
//! println!("{}", summary.size);
//! ```

/// Asset graph: reachability, usage counts, deduplication.
pub mod assets;

/// Optimizer configuration, loadable from JSON.
pub mod config;

/// The table of schema defaults and the policy selecting which to strip.
pub mod defaults;

pub mod errors;

/// Embedded image recompression.
pub mod images;

/// Keyframe and animated-property simplification.
pub mod keyframes;

/// Layer and header default stripping.
pub mod layers;

/// The ordered optimization pipeline.
pub mod pipeline;

/// Float precision bounding.
pub mod precision;

/// Size and diagnostics reporting.
pub mod report;

pub use config::OptimizeConfig;
pub use defaults::{Policy, SchemaDefaults};
pub use errors::OptimizeError;
pub use pipeline::{OptimizeSummary, Optimizer};
pub use report::{Diagnostics, SizeReport};
