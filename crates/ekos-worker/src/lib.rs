//! Background job execution for the content pipeline.
//!
//! This crate provides:
//! - The job set (speech, video, trend monitoring, scripts, publishing)
//! - A bounded in-process executor that records outcomes on tasks
//! - Platform publishers
//! - Job-scoped structured logging and metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod publish;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use jobs::{Job, JobContext, JobOutcome, VideoSource};
pub use logging::JobLogger;
pub use publish::{caption, Publisher, PublisherRegistry, TelegramPublisher};
