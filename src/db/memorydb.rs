// db/memorydb.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    db::StoreError,
    jobdb::{JobExt, UpdatedJob},
    userdb::UserExt,
};
use crate::models::{
    ids::{JobId, UserId},
    jobmodel::{Job, JobPatch, JobStatus, NewJob},
    usermodel::{average_rating, NewUser, Rating, User, UserRole, UserUpdate},
};

/// Process-local store used when no database is configured and by tests.
/// Every operation runs under one lock, so check-and-write sequences are atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    jobs: HashMap<JobId, Job>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

fn sorted_users<'a>(users: impl Iterator<Item = &'a User>) -> Vec<User> {
    let mut users: Vec<User> = users.cloned().collect();
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    users
}

fn sorted_jobs<'a>(jobs: impl Iterator<Item = &'a Job>) -> Vec<Job> {
    let mut jobs: Vec<Job> = jobs.cloned().collect();
    jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    jobs
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<UserId>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;

        if let Some(user_id) = user_id {
            return Ok(state.users.get(&user_id).cloned());
        }
        if let Some(email) = email {
            let email = normalize_email(email);
            return Ok(state.users.values().find(|u| u.email == email).cloned());
        }

        Ok(None)
    }

    async fn get_users(&self) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_users(state.users.values()))
    }

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_users(state.users.values().filter(|u| u.role == role)))
    }

    async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_users(ids.iter().filter_map(|id| state.users.get(id))))
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;

        let email = normalize_email(&new_user.email);
        if state.email_taken(&email, None) {
            return Err(StoreError::Duplicate("Email already in use".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            name: new_user.name,
            email,
            password: new_user.password,
            role: new_user.role,
            skills: vec![],
            experience: String::new(),
            location: String::new(),
            profile_image: String::new(),
            phone: String::new(),
            jobs_posted: 0,
            jobs_completed: 0,
            success_rate: 0.0,
            average_rating: 0.0,
            ratings: vec![],
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        mut update: UserUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write().await;

        if let Some(email) = update.email.take() {
            let email = normalize_email(&email);
            if state.email_taken(&email, Some(user_id)) {
                return Err(StoreError::Duplicate("Email already in use".to_string()));
            }
            update.email = Some(email);
        }

        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };
        update.apply_to(user);

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.users.remove(&user_id).is_some())
    }

    async fn add_rating(
        &self,
        user_id: UserId,
        rating: Rating,
    ) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write().await;

        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(None);
        };
        user.ratings.push(rating);
        user.average_rating = average_rating(&user.ratings);
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn increment_jobs_posted(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.jobs_posted += 1;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn increment_jobs_completed(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.jobs_completed += 1;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_success_rate(&self, user_id: UserId, rate: f64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.success_rate = rate;
        }
        Ok(())
    }
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_job(&self, new_job: NewJob) -> Result<Job, StoreError> {
        let mut state = self.state.write().await;

        let now = Utc::now();
        let job = Job {
            id: JobId::new(),
            title: new_job.title,
            description: new_job.description,
            category: new_job.category,
            budget: new_job.budget,
            location: new_job.location,
            status: JobStatus::Open,
            created_by: new_job.created_by,
            assigned_to: None,
            applicants: vec![],
            created_at: now,
            updated_at: now,
        };
        state.jobs.insert(job.id, job.clone());

        Ok(job)
    }

    async fn get_job(&self, job_id: JobId) -> Result<Option<Job>, StoreError> {
        let state = self.state.read().await;
        Ok(state.jobs.get(&job_id).cloned())
    }

    async fn get_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_jobs(state.jobs.values()))
    }

    async fn get_jobs_by_creator(&self, user_id: UserId) -> Result<Vec<Job>, StoreError> {
        let state = self.state.read().await;
        Ok(sorted_jobs(state.jobs.values().filter(|j| j.created_by == user_id)))
    }

    async fn update_job(
        &self,
        job_id: JobId,
        patch: JobPatch,
    ) -> Result<Option<UpdatedJob>, StoreError> {
        let mut state = self.state.write().await;

        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        let previous_status = job.status;
        patch.apply_to(job);

        Ok(Some(UpdatedJob {
            previous_status,
            job: job.clone(),
        }))
    }

    async fn delete_job(&self, job_id: JobId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.jobs.remove(&job_id).is_some())
    }

    async fn add_applicant(&self, job_id: JobId, user_id: UserId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;

        let Some(job) = state.jobs.get_mut(&job_id) else {
            return Ok(false);
        };
        if job.has_applicant(user_id) {
            return Ok(false);
        }
        job.applicants.push(user_id);
        job.updated_at = Utc::now();

        Ok(true)
    }

    async fn count_completed_jobs_by_creator(&self, user_id: UserId) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        let count = state
            .jobs
            .values()
            .filter(|j| j.created_by == user_id && j.status == JobStatus::Completed)
            .count();
        Ok(count as i64)
    }
}
