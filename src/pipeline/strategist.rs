//! Third stage: turn execution paths into a prioritized test plan.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use super::state::{sort_by_priority, PipelineState, Scenario};
use crate::extract;
use crate::gateway::{ChatRequest, ModelGateway};

const SYSTEM_PROMPT: &str = r#"You are a test strategist. Based on the code analysis and execution paths, create a comprehensive test plan.
Prioritize:
1. Critical functionality tests
2. Edge cases that are likely to break
3. Error handling tests
4. Integration points

Return ONLY a valid JSON array of test scenarios:
[
    {
        "function": "function_name",
        "test_name": "descriptive_test_name",
        "description": "what this test validates",
        "priority": "high|medium|low",
        "test_type": "unit|integration|edge_case|error_handling",
        "setup_required": "any setup needed",
        "test_inputs": "specific inputs to use",
        "expected_output": "expected result or behavior"
    }
]"#;

pub struct Strategist {
    gateway: Arc<dyn ModelGateway>,
}

impl Strategist {
    pub fn new(gateway: Arc<dyn ModelGateway>) -> Self {
        Self { gateway }
    }

    /// Produce the sorted scenario list and (re)initialize the writing
    /// phase: `generated_tests` and the cursor are reset every time this
    /// stage runs, whether or not the plan came back usable.
    pub async fn run(&self, state: PipelineState) -> PipelineState {
        if state.execution_paths.is_empty() {
            warn!("No execution paths to create test scenarios from");
            return PipelineState {
                test_scenarios: Vec::new(),
                generated_tests: Vec::new(),
                current_scenario_index: 0,
                ..state
            };
        }

        let context = json!({
            "functions": state.code_map.functions,
            "execution_paths": state.execution_paths,
        });
        let user = format!(
            "Create test scenarios for:\n{}",
            serde_json::to_string_pretty(&context).unwrap_or_else(|_| "{}".into())
        );

        let mut test_scenarios = match self
            .gateway
            .complete(ChatRequest::new(SYSTEM_PROMPT, user))
            .await
        {
            Ok(reply) => match extract::extract_as::<Vec<Scenario>>(&reply) {
                Ok(scenarios) => {
                    info!(scenarios = scenarios.len(), "Test plan created");
                    scenarios
                }
                Err(e) => {
                    warn!(error = %e, "Unparseable scenario reply, using empty plan");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "Strategist model call failed, using empty plan");
                Vec::new()
            }
        };

        sort_by_priority(&mut test_scenarios);

        PipelineState {
            test_scenarios,
            generated_tests: Vec::new(),
            current_scenario_index: 0,
            ..state
        }
    }
}
