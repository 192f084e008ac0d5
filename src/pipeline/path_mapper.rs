//! Second stage: enumerate execution paths per function.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::state::{ExecutionPath, PipelineState};
use crate::config::PipelineConfig;
use crate::extract;
use crate::gateway::{ChatRequest, ModelGateway};
use crate::utils::char_prefix;

const SYSTEM_PROMPT: &str = r#"You are a test path analyzer. For each function in the code, identify all possible execution paths:
1. Happy path (normal successful execution)
2. Edge cases (boundary conditions, empty inputs, etc.)
3. Error cases (invalid inputs, exceptions)
4. Special conditions (None values, type mismatches, etc.)

Return ONLY a valid JSON object mapping function names to their execution paths:
{
    "function_name": [
        {
            "path_type": "happy_path|edge_case|error_case",
            "description": "description of this path",
            "test_inputs": "example inputs for this path",
            "expected_behavior": "what should happen"
        }
    ]
}"#;

pub struct PathMapper {
    gateway: Arc<dyn ModelGateway>,
    language: String,
    snippet_chars: usize,
}

impl PathMapper {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &PipelineConfig) -> Self {
        Self {
            gateway,
            language: config.language.clone(),
            snippet_chars: config.path_snippet_chars,
        }
    }

    /// Map execution paths for every analyzed function.
    ///
    /// Short-circuits to an empty mapping when the code map has no
    /// functions. The source snippet sent along is capped at the configured
    /// character budget to keep the request bounded.
    pub async fn run(&self, state: PipelineState) -> PipelineState {
        if !state.code_map.has_functions() {
            warn!("No functions to analyze paths for");
            return PipelineState {
                execution_paths: BTreeMap::new(),
                ..state
            };
        }

        let functions_info = serde_json::to_string_pretty(&state.code_map.functions)
            .unwrap_or_else(|_| "[]".into());
        let snippet = state
            .source_code
            .as_deref()
            .map(|s| char_prefix(s, self.snippet_chars))
            .unwrap_or_default();

        let user = format!(
            "Functions to analyze:\n{}\n\nSource code snippet:\n```{}\n{}\n```",
            functions_info, self.language, snippet
        );

        let execution_paths = match self
            .gateway
            .complete(ChatRequest::new(SYSTEM_PROMPT, user))
            .await
        {
            Ok(reply) => {
                match extract::extract_as::<BTreeMap<String, Vec<ExecutionPath>>>(&reply) {
                    Ok(paths) => {
                        info!(functions = paths.len(), "Execution paths mapped");
                        paths
                    }
                    Err(e) => {
                        warn!(error = %e, "Unparseable path reply, using empty mapping");
                        BTreeMap::new()
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Path mapper model call failed, using empty mapping");
                BTreeMap::new()
            }
        };

        PipelineState {
            execution_paths,
            ..state
        }
    }
}
