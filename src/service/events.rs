// service/events.rs
use std::sync::Arc;

use super::error::ServiceError;
use crate::{
    db::MarketStore,
    models::{
        ids::{JobId, UserId},
        usermodel::success_rate,
    },
};

/// Things that happened to a job which other records care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    Created { job: JobId, client: UserId },
    /// Emitted once per transition into `completed` with an assignee.
    Completed { job: JobId, client: UserId, fundi: UserId },
}

/// Keeps the per-user aggregates (`jobsPosted`, `jobsCompleted`,
/// `successRate`) in step with job events.
#[derive(Debug, Clone)]
pub struct CounterService {
    db_client: Arc<dyn MarketStore>,
}

impl CounterService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        Self { db_client }
    }

    /// Applies the event. Failures are logged and swallowed: counters are
    /// best effort and never undo the job write that produced the event.
    pub async fn publish(&self, event: JobEvent) {
        if let Err(e) = self.handle(event).await {
            tracing::warn!("counter update for {:?} failed: {}", event, e);
        }
    }

    pub async fn handle(&self, event: JobEvent) -> Result<(), ServiceError> {
        match event {
            JobEvent::Created { job, client } => {
                tracing::debug!("job {} posted by {}", job, client);
                self.db_client.increment_jobs_posted(client).await?;
                self.refresh_success_rate(client).await
            }
            JobEvent::Completed { job, client, fundi } => {
                tracing::info!("job {} completed by fundi {}", job, fundi);
                self.db_client.increment_jobs_completed(fundi).await?;
                self.refresh_success_rate(client).await
            }
        }
    }

    async fn refresh_success_rate(&self, client: UserId) -> Result<(), ServiceError> {
        let Some(user) = self.db_client.get_user(Some(client), None).await? else {
            return Ok(());
        };
        let completed = self.db_client.count_completed_jobs_by_creator(client).await?;
        let rate = success_rate(completed, i64::from(user.jobs_posted));

        self.db_client.set_success_rate(client, rate).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{JobExt, MemoryStore, UserExt},
        models::{
            jobmodel::{JobPatch, JobStatus, NewJob},
            usermodel::{NewUser, UserRole},
        },
    };

    async fn user(store: &MemoryStore, email: &str, role: UserRole) -> UserId {
        store
            .save_user(NewUser {
                name: "u".into(),
                email: email.into(),
                password: "h".into(),
                role,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn created_bumps_jobs_posted() {
        let store = Arc::new(MemoryStore::new());
        let client = user(&store, "c@example.com", UserRole::Client).await;
        let counters = CounterService::new(store.clone());

        counters.publish(JobEvent::Created { job: JobId::new(), client }).await;
        counters.publish(JobEvent::Created { job: JobId::new(), client }).await;

        let client = store.get_user(Some(client), None).await.unwrap().unwrap();
        assert_eq!(client.jobs_posted, 2);
        assert_eq!(client.success_rate, 0.0);
    }

    #[tokio::test]
    async fn completed_bumps_fundi_and_client_rate() {
        let store = Arc::new(MemoryStore::new());
        let client = user(&store, "c@example.com", UserRole::Client).await;
        let fundi = user(&store, "f@example.com", UserRole::Fundi).await;
        let counters = CounterService::new(store.clone());

        let mut jobs = vec![];
        for _ in 0..2 {
            let job = store
                .create_job(NewJob {
                    title: "t".into(),
                    description: "d".into(),
                    category: "c".into(),
                    budget: 1.0,
                    location: "l".into(),
                    created_by: client,
                })
                .await
                .unwrap();
            counters.publish(JobEvent::Created { job: job.id, client }).await;
            jobs.push(job.id);
        }

        store
            .update_job(jobs[0], JobPatch { status: Some(JobStatus::Completed), ..Default::default() })
            .await
            .unwrap();
        counters.publish(JobEvent::Completed { job: jobs[0], client, fundi }).await;

        let fundi = store.get_user(Some(fundi), None).await.unwrap().unwrap();
        assert_eq!(fundi.jobs_completed, 1);
        let client = store.get_user(Some(client), None).await.unwrap().unwrap();
        assert_eq!(client.success_rate, 50.0);
    }

    #[tokio::test]
    async fn events_for_missing_users_are_harmless() {
        let store = Arc::new(MemoryStore::new());
        let counters = CounterService::new(store);

        let result = counters
            .handle(JobEvent::Completed {
                job: JobId::new(),
                client: UserId::new(),
                fundi: UserId::new(),
            })
            .await;
        assert!(result.is_ok());
    }
}
