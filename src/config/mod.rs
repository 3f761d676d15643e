//! Configuration for admission control and monitoring
//!
//! All types are serde-loadable so deployments can ship a YAML file alongside
//! the pipeline configuration.

mod models;

pub use models::{
    AlertThresholds, ApiLimitConfig, ApiPriority, BackoffStrategy, GateConfig, GlobalLimits,
    MonitorConfig, DEFAULT_PROFILE,
};
