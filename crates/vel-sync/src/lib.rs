//! Ingestion orchestration: configuration, target registry, product matching,
//! the grounded ingestion pipeline and background jobs.

pub mod config;
pub mod jobs;
pub mod matcher;
pub mod pipeline;
pub mod registry;

pub use config::SyncConfig;
pub use jobs::{maybe_build_scheduler, IngestionJobs, IngestionTicket, SubmittedJob};
pub use matcher::{normalize_name, ProductMatcher};
pub use pipeline::{IngestionPipeline, IngestionSummary};
pub use registry::{TargetConfig, TargetRegistry, DEFAULT_TARGET};

pub const CRATE_NAME: &str = "vel-sync";
