pub mod pipeline;
pub mod solicit;

pub use pipeline::{ExamPipeline, PipelineState, RunOutcome};
pub use solicit::{DirectCall, RelayedCall, SolveStrategy};
