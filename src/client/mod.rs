//! Per-client speech → translation → synthesis pipeline

mod pipeline;

pub use pipeline::{ClientPipeline, PipelineEvent, PipelineSettings};
