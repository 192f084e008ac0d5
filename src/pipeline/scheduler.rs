//! Explicit state machine driving the pipeline stages.
//!
//! analyzer → path_mapper → strategist → {writer}* → terminal. The only
//! conditional edges leave the strategist and the writer, both decided by
//! "cursor < scenario count" against the just-produced state. Every writer
//! pass strictly advances the cursor, so the loop runs exactly
//! `test_scenarios.len()` times.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::analyzer::Analyzer;
use super::path_mapper::PathMapper;
use super::state::PipelineState;
use super::strategist::Strategist;
use super::writer::Writer;
use crate::config::PipelineConfig;
use crate::gateway::ModelGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Analyzer,
    PathMapper,
    Strategist,
    Writer,
    Terminal,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Terminal)
    }

    /// The stage the machine moves to, given the state the current stage
    /// just produced.
    pub fn next(self, state: &PipelineState) -> Stage {
        match self {
            Stage::Analyzer => Stage::PathMapper,
            Stage::PathMapper => Stage::Strategist,
            Stage::Strategist | Stage::Writer => {
                if state.scenarios_exhausted() {
                    Stage::Terminal
                } else {
                    Stage::Writer
                }
            }
            Stage::Terminal => Stage::Terminal,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Analyzer => "analyzer",
            Stage::PathMapper => "path_mapper",
            Stage::Strategist => "strategist",
            Stage::Writer => "writer",
            Stage::Terminal => "terminal",
        };
        write!(f, "{}", s)
    }
}

pub struct Scheduler {
    analyzer: Analyzer,
    path_mapper: PathMapper,
    strategist: Strategist,
    writer: Writer,
}

impl Scheduler {
    pub fn new(gateway: Arc<dyn ModelGateway>, config: &PipelineConfig) -> Self {
        Self {
            analyzer: Analyzer::new(Arc::clone(&gateway), config),
            path_mapper: PathMapper::new(Arc::clone(&gateway), config),
            strategist: Strategist::new(Arc::clone(&gateway)),
            writer: Writer::new(gateway, config),
        }
    }

    /// Drive one source file through the full stage sequence.
    pub async fn run(&self, initial: PipelineState) -> PipelineState {
        let mut state = initial;
        let mut stage = Stage::Analyzer;

        while !stage.is_terminal() {
            debug!(stage = %stage, "Entering stage");
            state = match stage {
                Stage::Analyzer => self.analyzer.run(state).await,
                Stage::PathMapper => self.path_mapper.run(state).await,
                Stage::Strategist => self.strategist.run(state).await,
                Stage::Writer => self.writer.run(state).await,
                Stage::Terminal => state,
            };
            stage = stage.next(&state);
        }

        info!(
            file = %state.file_path.display(),
            scenarios = state.test_scenarios.len(),
            tests = state.generated_tests.len(),
            "Pipeline complete"
        );
        state
    }
}
