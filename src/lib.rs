pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod utils;
pub mod verification;

pub use config::ForgeConfig;
pub use driver::{Driver, FileOutcome, RunSummary};
pub use error::{ForgeError, Result};
pub use gateway::{ChatRequest, GatewayError, HttpGateway, ModelGateway};
pub use pipeline::{PipelineState, Scheduler, Stage};
pub use source::{ReadFailure, SourceReader};
pub use verification::{ProcessSandbox, Sandbox, TestVerifier, VerificationReport};
