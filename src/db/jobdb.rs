// db/jobdb.rs
use async_trait::async_trait;

use super::db::{DBClient, StoreError};
use crate::models::{
    ids::{JobId, UserId},
    jobmodel::{Job, JobPatch, JobStatus, NewJob},
};

const JOB_SELECT: &str = r#"
    SELECT
        j.id, j.title, j.description, j.category, j.budget, j.location,
        j.status, j.created_by, j.assigned_to,
        ARRAY(
            SELECT a.applicant_id FROM job_applicants a
            WHERE a.job_id = j.id
            ORDER BY a.applied_at ASC
        ) AS applicants,
        j.created_at, j.updated_at
    FROM jobs j
"#;

/// Result of a patch: the stored job afterwards plus the status it had
/// right before the write.
#[derive(Debug, Clone)]
pub struct UpdatedJob {
    pub previous_status: JobStatus,
    pub job: Job,
}

#[async_trait]
pub trait JobExt {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StoreError>;

    async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, StoreError>;

    async fn get_jobs(&self) -> Result<Vec<Job>, StoreError>;

    async fn get_jobs_by_creator(&self, user_id: UserId) -> Result<Vec<Job>, StoreError>;

    /// Applies the patch under a row lock, so `previous_status` is exactly
    /// the status this write replaced.
    async fn update_job(
        &self,
        job_id: JobId,
        patch: JobPatch,
    ) -> Result<Option<UpdatedJob>, StoreError>;

    async fn delete_job(&self, job_id: JobId) -> Result<bool, StoreError>;

    /// Adds the applicant if absent. Returns `false` when they had already
    /// applied. Check and insert are a single atomic step.
    async fn add_applicant(&self, job_id: JobId, user_id: UserId) -> Result<bool, StoreError>;

    async fn count_completed_jobs_by_creator(&self, user_id: UserId) -> Result<i64, StoreError>;
}

#[async_trait]
impl JobExt for DBClient {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StoreError> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, title, description, category, budget, location, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id, title, description, category, budget, location,
                status, created_by, assigned_to,
                ARRAY[]::UUID[] AS applicants,
                created_at, updated_at
            "#,
        )
        .bind(JobId::new())
        .bind(new_job.title)
        .bind(new_job.description)
        .bind(new_job.category)
        .bind(new_job.budget)
        .bind(new_job.location)
        .bind(new_job.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(job)
    }

    async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, StoreError> {
        let job = sqlx::query_as::<_, Job>(&format!("{} WHERE j.id = $1", JOB_SELECT))
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn get_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let jobs = sqlx::query_as::<_, Job>(&format!("{} ORDER BY j.created_at ASC", JOB_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn get_jobs_by_creator(&self, user_id: UserId) -> Result<Vec<Job>, StoreError> {
        let jobs = sqlx::query_as::<_, Job>(&format!(
            "{} WHERE j.created_by = $1 ORDER BY j.created_at ASC",
            JOB_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    async fn update_job(
        &self,
        job_id: JobId,
        patch: JobPatch,
    ) -> Result<Option<UpdatedJob>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<(JobStatus,)> =
            sqlx::query_as("SELECT status FROM jobs WHERE id = $1 FOR UPDATE")
                .bind(job_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((previous_status,)) = previous else {
            tx.rollback().await?;
            return Ok(None);
        };

        let (set_assignee, assignee) = match patch.assigned_to {
            Some(assignee) => (true, assignee),
            None => (false, None),
        };

        sqlx::query(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                budget = COALESCE($5, budget),
                location = COALESCE($6, location),
                status = COALESCE($7, status),
                created_by = COALESCE($8, created_by),
                assigned_to = CASE WHEN $9 THEN $10 ELSE assigned_to END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.category)
        .bind(patch.budget)
        .bind(patch.location)
        .bind(patch.status)
        .bind(patch.created_by)
        .bind(set_assignee)
        .bind(assignee)
        .execute(&mut *tx)
        .await?;

        if let Some(applicants) = patch.applicants {
            sqlx::query("DELETE FROM job_applicants WHERE job_id = $1")
                .bind(job_id)
                .execute(&mut *tx)
                .await?;

            // ordinality keeps the submitted order in applied_at
            sqlx::query(
                r#"
                INSERT INTO job_applicants (job_id, applicant_id, applied_at)
                SELECT $1, t.applicant, NOW() + t.n * INTERVAL '1 microsecond'
                FROM UNNEST($2::UUID[]) WITH ORDINALITY AS t(applicant, n)
                ON CONFLICT (job_id, applicant_id) DO NOTHING
                "#,
            )
            .bind(job_id)
            .bind(applicants)
            .execute(&mut *tx)
            .await?;
        }

        let job = sqlx::query_as::<_, Job>(&format!("{} WHERE j.id = $1", JOB_SELECT))
            .bind(job_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(UpdatedJob { previous_status, job }))
    }

    async fn delete_job(&self, job_id: JobId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_applicant(&self, job_id: JobId, user_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO job_applicants (job_id, applicant_id)
            VALUES ($1, $2)
            ON CONFLICT (job_id, applicant_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(result) => Ok(result.rows_affected() == 1),
            // the job was deleted in the meantime
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn count_completed_jobs_by_creator(&self, user_id: UserId) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM jobs WHERE created_by = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
