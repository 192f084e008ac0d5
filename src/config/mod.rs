//! Configuration loading and validation.
//!
//! All tunables live in a single `testforge.toml`: gateway endpoint and
//! sampling settings, pipeline snippet budgets, verification commands,
//! output layout, and driver filters. Nothing is read from ambient global
//! state; the loaded config is passed into the pipeline at construction.

mod settings;

pub use settings::{
    DriverConfig, ForgeConfig, GatewayConfig, OutputConfig, PipelineConfig, VerificationConfig,
    CONFIG_FILE_NAME,
};
