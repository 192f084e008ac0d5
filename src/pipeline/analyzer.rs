//! First stage: map the structure of a source file.

use std::sync::Arc;

use tracing::{info, warn};

use super::state::{CodeMap, PipelineState};
use crate::config::PipelineConfig;
use crate::extract;
use crate::gateway::{ChatRequest, ModelGateway};
use crate::source::SourceReader;

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a {language} code analyzer. Analyze the given source code and extract:
1. All functions (including class methods and static methods) with their signatures
2. All classes and their methods
3. Key imports and dependencies
4. Main code complexity and structure

Return ONLY a valid JSON object with this structure:
{
    "functions": [
        {
            "name": "function_name or ClassName.method_name",
            "params": ["param1", "param2"],
            "return_type": "return_type_hint_or_inferred",
            "complexity": "simple|medium|complex",
            "description": "brief description of what it does"
        }
    ],
    "classes": [
        {
            "name": "ClassName",
            "methods": ["method1", "method2"],
            "description": "brief description"
        }
    ],
    "imports": ["import1", "import2"],
    "overall_complexity": "simple|medium|complex"
}"#;

pub struct Analyzer {
    gateway: Arc<dyn ModelGateway>,
    language: String,
}

impl Analyzer {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &PipelineConfig) -> Self {
        Self {
            gateway,
            language: config.language.clone(),
        }
    }

    /// Read the source and ask the model for a structural map.
    ///
    /// A read failure short-circuits without a model call: the failure text
    /// lands in `source_code` and the code map stays empty. An unusable
    /// model reply degrades to the empty map the same way — this stage
    /// always yields a well-typed, if degenerate, `code_map`.
    pub async fn run(&self, state: PipelineState) -> PipelineState {
        info!(file = %state.file_path.display(), "Analyzing source structure");

        let source = match SourceReader::read(&state.file_path).await {
            Ok(content) => content,
            Err(failure) => {
                warn!(error = %failure, "Source read failed, skipping analysis");
                return PipelineState {
                    source_code: Some(failure.to_string()),
                    code_map: CodeMap::default(),
                    ..state
                };
            }
        };

        let system = SYSTEM_PROMPT_TEMPLATE.replace("{language}", &self.language);
        let user = format!(
            "Analyze this {} code:\n\n```{}\n{}\n```",
            self.language, self.language, source
        );

        let code_map = match self.gateway.complete(ChatRequest::new(system, user)).await {
            Ok(reply) => match extract::extract_as::<CodeMap>(&reply) {
                Ok(map) => {
                    info!(
                        functions = map.functions.len(),
                        classes = map.classes.len(),
                        "Code map extracted"
                    );
                    map
                }
                Err(e) => {
                    warn!(error = %e, "Unparseable analyzer reply, using empty code map");
                    CodeMap::default()
                }
            },
            Err(e) => {
                warn!(error = %e, "Analyzer model call failed, using empty code map");
                CodeMap::default()
            }
        };

        PipelineState {
            source_code: Some(source),
            code_map,
            ..state
        }
    }
}
