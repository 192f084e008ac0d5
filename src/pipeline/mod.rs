//! The four-stage test synthesis pipeline and its scheduler.
//!
//! Each stage has exactly one authoritative definition here, composed into
//! the `Scheduler`. Stages never return errors: collaborator failures and
//! unparseable model replies degrade the affected slice of state in place,
//! so the worst outcome for one file is an empty `generated_tests`.

mod analyzer;
mod path_mapper;
mod scheduler;
mod state;
mod strategist;
mod writer;

pub use analyzer::Analyzer;
pub use path_mapper::PathMapper;
pub use scheduler::{Scheduler, Stage};
pub use state::{
    sort_by_priority, ClassInfo, CodeMap, Complexity, ExecutionPath, FunctionInfo, PathKind,
    PipelineState, Priority, Scenario,
};
pub use strategist::Strategist;
pub use writer::Writer;
