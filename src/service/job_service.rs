// service/job_service.rs
use std::{collections::HashMap, sync::Arc};

use validator::Validate;

use super::{
    access,
    error::ServiceError,
    events::{CounterService, JobEvent},
};
use crate::{
    db::MarketStore,
    dtos::{
        jobdtos::{CreateJobDto, JobResponseDto, UpdateJobDto},
        userdtos::FilterUserDto,
    },
    models::{
        ids::{JobId, UserId},
        jobmodel::{Job, JobStatus, NewJob},
        usermodel::Identity,
    },
};

const APPLIED_TWICE: &str = "You have already applied for this job";

#[derive(Debug, Clone)]
pub struct JobService {
    db_client: Arc<dyn MarketStore>,
    counters: CounterService,
}

impl JobService {
    pub fn new(db_client: Arc<dyn MarketStore>) -> Self {
        let counters = CounterService::new(db_client.clone());
        Self { db_client, counters }
    }

    pub async fn create_job(
        &self,
        identity: &Identity,
        body: CreateJobDto,
    ) -> Result<JobResponseDto, ServiceError> {
        if !access::can_post_jobs(identity.role) {
            return Err(ServiceError::Forbidden("Only clients can create jobs".to_string()));
        }
        body.validate()?;

        let budget = body
            .budget
            .ok_or_else(|| ServiceError::Validation("All fields are required".to_string()))?;

        let job = self
            .db_client
            .create_job(NewJob {
                title: body.title,
                description: body.description,
                category: body.category,
                budget,
                location: body.location,
                created_by: identity.user_id,
            })
            .await?;

        tracing::info!("Job {} created by {}", job.id, identity.user_id);
        self.counters
            .publish(JobEvent::Created { job: job.id, client: identity.user_id })
            .await;

        self.expand_one(job).await
    }

    pub async fn list_jobs(&self) -> Result<Vec<JobResponseDto>, ServiceError> {
        let jobs = self.db_client.get_jobs().await?;
        self.expand(jobs).await
    }

    pub async fn get_job(&self, job_id: JobId) -> Result<JobResponseDto, ServiceError> {
        let job = self.find(job_id).await?;
        self.expand_one(job).await
    }

    /// Jobs authored by the caller. Non-clients simply get an empty list.
    pub async fn my_jobs(&self, identity: &Identity) -> Result<Vec<JobResponseDto>, ServiceError> {
        let jobs = self.db_client.get_jobs_by_creator(identity.user_id).await?;
        self.expand(jobs).await
    }

    /// Applies the caller's patch as-is. Moving a job with an assignee into
    /// `completed` from any other status publishes `JobEvent::Completed`.
    pub async fn update_job(
        &self,
        identity: &Identity,
        job_id: JobId,
        body: UpdateJobDto,
    ) -> Result<JobResponseDto, ServiceError> {
        body.validate()?;

        let job = self.find(job_id).await?;
        if !access::can_update_job(identity, &job) {
            return Err(ServiceError::Forbidden(
                "Not authorized to update this job".to_string(),
            ));
        }

        let updated = self
            .db_client
            .update_job(job_id, body.into())
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;

        let job = updated.job;
        if job.status == JobStatus::Completed && updated.previous_status != JobStatus::Completed {
            if let Some(fundi) = job.assigned_to {
                self.counters
                    .publish(JobEvent::Completed { job: job.id, client: job.created_by, fundi })
                    .await;
            }
        }

        tracing::info!(
            "Job {} updated by {} ({} -> {})",
            job.id,
            identity.user_id,
            updated.previous_status.to_str(),
            job.status.to_str()
        );

        self.expand_one(job).await
    }

    pub async fn delete_job(&self, identity: &Identity, job_id: JobId) -> Result<(), ServiceError> {
        let job = self.find(job_id).await?;
        if !access::can_delete_job(identity, &job) {
            return Err(ServiceError::Forbidden(
                "Not authorized to delete this job".to_string(),
            ));
        }

        if !self.db_client.delete_job(job_id).await? {
            return Err(ServiceError::JobNotFound(job_id));
        }

        tracing::info!("Job {} deleted by {}", job_id, identity.user_id);
        Ok(())
    }

    pub async fn apply_for_job(
        &self,
        identity: &Identity,
        job_id: JobId,
    ) -> Result<JobResponseDto, ServiceError> {
        if !access::can_apply(identity.role) {
            return Err(ServiceError::Forbidden("Only fundis can apply for jobs".to_string()));
        }

        // Separates "no such job" from "already applied", which the store
        // reports the same way.
        self.find(job_id).await?;

        if !self.db_client.add_applicant(job_id, identity.user_id).await? {
            let still_there = self.db_client.get_job(job_id).await?.is_some();
            return Err(if still_there {
                ServiceError::Conflict(APPLIED_TWICE.to_string())
            } else {
                ServiceError::JobNotFound(job_id)
            });
        }

        tracing::info!("Fundi {} applied for job {}", identity.user_id, job_id);
        let job = self.find(job_id).await?;
        self.expand_one(job).await
    }

    async fn find(&self, job_id: JobId) -> Result<Job, ServiceError> {
        self.db_client
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    async fn expand_one(&self, job: Job) -> Result<JobResponseDto, ServiceError> {
        let users = self.related_users(std::slice::from_ref(&job)).await?;
        Ok(expand_with(&users, job))
    }

    async fn expand(&self, jobs: Vec<Job>) -> Result<Vec<JobResponseDto>, ServiceError> {
        let users = self.related_users(&jobs).await?;
        Ok(jobs.into_iter().map(|job| expand_with(&users, job)).collect())
    }

    /// Creators and assignees of `jobs`, fetched in one round trip.
    async fn related_users(
        &self,
        jobs: &[Job],
    ) -> Result<HashMap<UserId, FilterUserDto>, ServiceError> {
        let mut ids: Vec<UserId> = jobs
            .iter()
            .flat_map(|job| std::iter::once(job.created_by).chain(job.assigned_to))
            .collect();
        ids.sort();
        ids.dedup();

        Ok(self
            .db_client
            .get_users_by_ids(&ids)
            .await?
            .iter()
            .map(|user| (user.id, FilterUserDto::filter_user(user)))
            .collect())
    }
}

/// Dangling creator or assignee references expand to `None`.
fn expand_with(users: &HashMap<UserId, FilterUserDto>, job: Job) -> JobResponseDto {
    let created_by = users.get(&job.created_by).cloned();
    let assigned_to = job.assigned_to.and_then(|id| users.get(&id).cloned());
    JobResponseDto::expand(job, created_by, assigned_to)
}
