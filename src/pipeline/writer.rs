//! Fourth stage: emit test code for one scenario at a time.

use std::sync::Arc;

use tracing::{info, warn};

use super::state::PipelineState;
use crate::config::PipelineConfig;
use crate::extract;
use crate::gateway::{ChatRequest, ModelGateway};
use crate::utils::char_prefix;

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a {language} test code writer. Write a complete, executable {framework} test function based on the scenario.

Requirements:
1. Use {framework} conventions
2. Include proper imports at the top
3. Add descriptive docstrings
4. Use appropriate assertions
5. Handle setup/teardown if needed
6. Include edge case validation
7. Use proper mocking if external dependencies are involved

Return ONLY the complete test code, no explanations."#;

pub struct Writer {
    gateway: Arc<dyn ModelGateway>,
    language: String,
    framework: String,
    snippet_chars: usize,
}

impl Writer {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &PipelineConfig) -> Self {
        Self {
            gateway,
            language: config.language.clone(),
            framework: config.framework.clone(),
            snippet_chars: config.writer_snippet_chars,
        }
    }

    /// Write the test for the scenario under the cursor.
    ///
    /// Invoked at the terminal boundary (cursor == scenario count) this is
    /// a no-op returning the state unchanged; the scheduler probes it there
    /// while evaluating its conditional edge. Otherwise the cursor advances
    /// by exactly one whether or not a test was produced, so the writing
    /// loop always terminates.
    pub async fn run(&self, state: PipelineState) -> PipelineState {
        let scenario = match state.current_scenario() {
            Some(s) => s.clone(),
            None => return state,
        };

        info!(
            index = state.current_scenario_index + 1,
            total = state.test_scenarios.len(),
            test = %scenario.test_name,
            "Writing test"
        );

        let system = SYSTEM_PROMPT_TEMPLATE
            .replace("{language}", &self.language)
            .replace("{framework}", &self.framework);
        let snippet = state
            .source_code
            .as_deref()
            .map(|s| char_prefix(s, self.snippet_chars))
            .unwrap_or_default();
        let user = format!(
            "Write a test for this scenario:\n{}\n\nSource code context:\n```{}\n{}\n```\n\nGenerate complete test code with all necessary imports.",
            serde_json::to_string_pretty(&scenario).unwrap_or_else(|_| "{}".into()),
            self.language,
            snippet
        );

        let mut state = state;

        match self.gateway.complete(ChatRequest::new(system, user)).await {
            Ok(reply) => {
                let code = extract::strip_code_fence(&reply, &self.language).to_string();
                info!(test = %scenario.test_name, bytes = code.len(), "Test generated");
                state.generated_tests.push(code);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    test = %scenario.test_name,
                    "Test generation failed, dropping scenario"
                );
            }
        }

        state.current_scenario_index += 1;
        state
    }
}
