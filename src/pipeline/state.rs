//! Shared state threaded through the pipeline stages.
//!
//! Each stage consumes the previous state by value and returns a new one,
//! so no stage can observe another's partial mutations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Three-level complexity tier, with a catch-all for degraded analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionInfo {
    /// Plain function name, or `Class.method` dotted form for methods.
    pub name: String,
    pub params: Vec<String>,
    pub return_type: String,
    pub complexity: Complexity,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassInfo {
    pub name: String,
    pub methods: Vec<String>,
    pub description: String,
}

/// Structured description of a source file, produced once by the analyzer
/// and read-only afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeMap {
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub imports: Vec<String>,
    pub overall_complexity: Complexity,
}

impl CodeMap {
    pub fn has_functions(&self) -> bool {
        !self.functions.is_empty()
    }
}

/// Execution path category. Unrecognized kinds from the model land in
/// `Other` instead of failing the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    HappyPath,
    EdgeCase,
    ErrorCase,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionPath {
    pub path_type: PathKind,
    pub description: String,
    pub test_inputs: String,
    pub expected_behavior: String,
}

/// Scenario priority. Anything the model emits outside the three known
/// tiers ranks as medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Low,
    #[default]
    #[serde(other)]
    Medium,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// A single planned test case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub function: String,
    pub test_name: String,
    pub description: String,
    pub priority: Priority,
    pub test_type: String,
    pub setup_required: String,
    pub test_inputs: String,
    pub expected_output: String,
}

/// Stable sort by ascending priority rank; equal-priority scenarios keep
/// their original relative order.
pub fn sort_by_priority(scenarios: &mut [Scenario]) {
    scenarios.sort_by_key(|s| s.priority.rank());
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// Set once at construction, never mutated.
    pub file_path: PathBuf,
    /// `None` until the analyzer runs; a read failure stores the failure's
    /// display string here instead.
    pub source_code: Option<String>,
    pub code_map: CodeMap,
    pub execution_paths: BTreeMap<String, Vec<ExecutionPath>>,
    pub test_scenarios: Vec<Scenario>,
    /// One entry appended per successful writer invocation, in scenario
    /// order.
    pub generated_tests: Vec<String>,
    /// Cursor into `test_scenarios`; advanced by exactly one after every
    /// writer invocation, success or failure.
    pub current_scenario_index: usize,
}

impl PipelineState {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    pub fn scenarios_exhausted(&self) -> bool {
        self.current_scenario_index >= self.test_scenarios.len()
    }

    pub fn current_scenario(&self) -> Option<&Scenario> {
        self.test_scenarios.get(self.current_scenario_index)
    }
}
