//! Periodic maintenance.
//!
//! The only recurring job re-sends admin notices for registrations whose
//! first notice could not be delivered.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::FollowUpSchedule;
use crate::state::AppState;

const FOLLOW_UP_JOB: &str = "registration-follow-up";

/// Running maintenance jobs.
pub struct Maintenance {
    jobs: JobScheduler,
}

impl Maintenance {
    /// Register and start the follow-up job.
    ///
    /// Returns `Ok(None)` when maintenance is switched off. A malformed cron
    /// expression is an error even then, so typos surface at startup.
    pub async fn start(
        state: &AppState,
        schedule: &FollowUpSchedule,
    ) -> Result<Option<Self>, JobSchedulerError> {
        let job = follow_up_job(state, &schedule.cron)?;

        if !schedule.enabled {
            tracing::info!("Maintenance jobs disabled");
            return Ok(None);
        }

        let jobs = JobScheduler::new().await?;
        let id = jobs.add(job).await?;
        jobs.start().await?;

        tracing::info!(job = FOLLOW_UP_JOB, cron = %schedule.cron, job_id = %id, "Maintenance started");
        Ok(Some(Self { jobs }))
    }

    pub async fn stop(mut self) -> Result<(), JobSchedulerError> {
        self.jobs.shutdown().await?;
        tracing::info!("Maintenance stopped");
        Ok(())
    }
}

fn follow_up_job(state: &AppState, cron: &str) -> Result<Job, JobSchedulerError> {
    let registration = state.registration.clone();

    Job::new_async(cron, move |_id, _lock| {
        let registration = registration.clone();
        Box::pin(async move {
            match registration.resend_follow_ups().await {
                Ok(report) if report.attempted > 0 => {
                    tracing::debug!(job = FOLLOW_UP_JOB, delivered = report.delivered, "Job finished");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(job = FOLLOW_UP_JOB, error = %e, "Job failed"),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rysetor_infra::{InMemoryMailer, LocalMediaStore};

    use super::*;
    use crate::config::AppConfig;
    use crate::state::Repositories;

    fn state(media: &std::path::Path) -> AppState {
        AppState::assemble(
            &AppConfig::default(),
            Repositories::in_memory(),
            Arc::new(InMemoryMailer::new()),
            LocalMediaStore::new(media),
        )
    }

    #[actix_web::test]
    async fn malformed_cron_fails_even_when_disabled() {
        let media = tempfile::tempdir().unwrap();
        let schedule = FollowUpSchedule {
            enabled: false,
            cron: "99 99 99 * * *".to_string(),
        };

        assert!(Maintenance::start(&state(media.path()), &schedule).await.is_err());
    }

    #[actix_web::test]
    async fn disabled_maintenance_starts_nothing() {
        let media = tempfile::tempdir().unwrap();
        let schedule = FollowUpSchedule {
            enabled: false,
            ..FollowUpSchedule::default()
        };

        let started = Maintenance::start(&state(media.path()), &schedule).await.unwrap();
        assert!(started.is_none());
    }
}
