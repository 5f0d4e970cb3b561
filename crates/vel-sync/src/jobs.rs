use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;
use vel_adapters::BlankTarget;

use crate::config::SyncConfig;
use crate::pipeline::{IngestionPipeline, IngestionSummary};
use crate::registry::TargetRegistry;

/// Returned immediately when a background ingestion is accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionTicket {
    pub job_id: Uuid,
    pub targets: Vec<String>,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SubmittedJob {
    pub ticket: IngestionTicket,
    pub handle: JoinHandle<Option<IngestionSummary>>,
}

/// Fire-and-forget ingestion. Progress is only visible through the activity log.
#[derive(Clone)]
pub struct IngestionJobs {
    pipeline: Arc<IngestionPipeline>,
    registry: Arc<TargetRegistry>,
}

impl IngestionJobs {
    pub fn new(pipeline: Arc<IngestionPipeline>, registry: Arc<TargetRegistry>) -> Self {
        Self { pipeline, registry }
    }

    pub fn pipeline(&self) -> &Arc<IngestionPipeline> {
        &self.pipeline
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// Resolve the targets and spawn the run; an empty list means the registry defaults.
    pub fn submit(&self, raw_targets: &[String]) -> Result<SubmittedJob, BlankTarget> {
        let targets = self.registry.resolve_all(raw_targets)?;
        let ticket = IngestionTicket {
            job_id: Uuid::new_v4(),
            targets: targets.iter().map(ToString::to_string).collect(),
            accepted_at: Utc::now(),
        };
        let pipeline = Arc::clone(&self.pipeline);
        let job_id = ticket.job_id;
        let handle = tokio::spawn(async move {
            match pipeline.run(&targets).await {
                Ok(summary) => Some(summary),
                Err(err) => {
                    tracing::error!(%job_id, error = ?err, "ingestion job failed");
                    None
                }
            }
        });
        tracing::info!(job_id = %ticket.job_id, targets = ?ticket.targets, "ingestion job accepted");
        Ok(SubmittedJob { ticket, handle })
    }
}

pub async fn maybe_build_scheduler(
    config: &SyncConfig,
    jobs: IngestionJobs,
) -> Result<Option<JobScheduler>> {
    if !config.scheduler_enabled {
        return Ok(None);
    }

    let sched = JobScheduler::new().await.context("creating scheduler")?;
    let job = Job::new_async(config.scrape_cron.as_str(), move |_uuid, _l| {
        let jobs = jobs.clone();
        Box::pin(async move {
            if let Err(err) = jobs.submit(&[]) {
                tracing::error!(error = %err, "scheduled ingestion rejected");
            }
        })
    })
    .with_context(|| format!("invalid VELOCITY_SCRAPE_CRON: {}", config.scrape_cron))?;
    sched.add(job).await.context("adding scheduled ingestion job")?;
    tracing::info!(cron = %config.scrape_cron, "scheduled ingestion enabled");
    Ok(Some(sched))
}
