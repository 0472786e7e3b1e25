pub mod config;
pub mod health;
pub mod http;
pub mod ingest;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use pipeline::{Envelope, Pipeline, PipelineError};
