//! Configuration layer for k8s-lse.
//!
//! ## Layers
//! - `types`: Configuration type definitions and defaults
//! - `loading`: File loading logic
//! - `effective`: CLI + config merging

mod effective;
mod error;
mod loading;
mod types;

pub use effective::EffectiveConfig;
pub use error::ConfigError;
pub use types::{
    Config, DEFAULT_NAMESPACE, DEFAULT_SHELLS, DEFAULT_UTILITIES, DEFAULT_WORKERS, ProbeConfig,
    ScanConfig,
};
