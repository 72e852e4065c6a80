pub mod machine;
pub mod session;
pub mod pipeline;

pub use machine::TrialPhase;
pub use pipeline::{start_pipeline, PipelineChannels};
