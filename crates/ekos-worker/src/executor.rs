//! In-process job executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Semaphore};
use tracing::{info, warn, Instrument};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::jobs::{self, Job, JobContext};
use crate::logging::JobLogger;
use crate::metrics::{job_finished, job_started, record_job};

struct Inner {
    config: WorkerConfig,
    ctx: JobContext,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

/// Runs submitted jobs in the background, at most
/// `max_concurrent_jobs` at a time.
///
/// Each job's task is completed with the job's result or failed with its
/// error message. Jobs are not retried.
#[derive(Clone)]
pub struct JobExecutor {
    inner: Arc<Inner>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, ctx: JobContext) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        let (shutdown, _) = watch::channel(false);
        info!(
            "Job executor ready with {} max concurrent jobs",
            config.max_concurrent_jobs
        );

        Self {
            inner: Arc::new(Inner {
                config,
                ctx,
                job_semaphore,
                shutdown,
            }),
        }
    }

    pub fn context(&self) -> &JobContext {
        &self.inner.ctx
    }

    /// Queue `job` for execution. Returns immediately.
    pub fn submit(&self, job: Job) -> WorkerResult<()> {
        if *self.inner.shutdown.borrow() {
            return Err(WorkerError::ShuttingDown);
        }

        let executor = self.clone();
        let logger = JobLogger::new(job.task_id(), job.task_type().as_str());
        let span = logger.create_span();
        tokio::spawn(
            async move {
                let permit = match executor.inner.job_semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("Executor stopped before the job started");
                        let reason = WorkerError::ShuttingDown.to_string();
                        if let Err(e) = executor.inner.ctx.tracker.fail(job.task_id(), reason).await {
                            warn!(error = %e, "Failed to mark task failed");
                        }
                        return;
                    }
                };
                executor.execute_job(job, logger).await;
                drop(permit);
            }
            .instrument(span),
        );
        Ok(())
    }

    /// Run one job and record its outcome on the task.
    async fn execute_job(&self, job: Job, logger: JobLogger) {
        let ctx = &self.inner.ctx;
        let task_id = job.task_id().clone();
        let job_type = job.task_type();
        let timeout = self.inner.config.job_timeout;

        logger.log_start(&format!("{job_type} job"));
        job_started();
        let started = Instant::now();

        let result = match tokio::time::timeout(timeout, jobs::run(ctx, &job, &logger)).await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Timeout(timeout.as_secs())),
        };
        let ok = result.is_ok();

        match result {
            Ok(outcome) => {
                if let Err(e) = ctx.tracker.complete(&task_id, outcome.result).await {
                    warn!(task_id = %task_id, error = %e, "Failed to mark task completed");
                }
                logger.log_completion(&format!("{:.2}s", started.elapsed().as_secs_f64()));
                for follow_up in outcome.follow_ups {
                    if let Err(e) = self.submit(follow_up) {
                        warn!(task_id = %task_id, error = %e, "Follow-up job not submitted");
                    }
                }
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                if let Err(store_err) = ctx.tracker.fail(&task_id, e.to_string()).await {
                    warn!(task_id = %task_id, error = %store_err, "Failed to mark task failed");
                }
            }
        }

        job_finished();
        record_job(job_type.as_str(), ok, started.elapsed().as_secs_f64());
    }

    /// Stop accepting jobs and wait for in-flight ones, up to the
    /// configured shutdown timeout. Jobs still waiting for a slot afterwards
    /// never start; their tasks are failed.
    pub async fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        info!("Waiting for in-flight jobs to complete...");

        let permits = self.inner.config.max_concurrent_jobs as u32;
        let wait = self.inner.job_semaphore.acquire_many(permits);
        match tokio::time::timeout(self.inner.config.shutdown_timeout, wait).await {
            Ok(Ok(drained)) => {
                self.inner.job_semaphore.close();
                drop(drained);
                info!("Job executor stopped");
            }
            Ok(Err(_)) => info!("Job executor already stopped"),
            Err(_) => {
                self.inner.job_semaphore.close();
                warn!(
                    "Shutdown timeout after {}s with jobs still running",
                    self.inner.config.shutdown_timeout.as_secs()
                );
            }
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Number of jobs currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.inner.config.max_concurrent_jobs - self.inner.job_semaphore.available_permits()
    }
}
