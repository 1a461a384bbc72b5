//! Probe Adapters - 媒体时长探测

mod symphonia_probe;

pub use symphonia_probe::{FixedProbe, SymphoniaProbe};
