//! Value types that flow between the pipeline stages.
//!
//! Every stage talks in terms of [`ContainerRef`]; the prober produces
//! [`CapabilityResult`]s and the scan dispatcher produces [`ScanResult`]s.

mod container;

pub use container::{CapabilityResult, ContainerRef, ScanResult};
