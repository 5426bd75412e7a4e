use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JobId, UserId};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Open,
    Assigned,
    Completed,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Assigned => "assigned",
            JobStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: f64,
    pub location: String,
    pub status: JobStatus,
    pub created_by: UserId,
    pub assigned_to: Option<UserId>,
    pub applicants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.created_by == user_id
    }

    pub fn has_applicant(&self, user_id: UserId) -> bool {
        self.applicants.contains(&user_id)
    }
}

/// Validated fields for a new posting.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: f64,
    pub location: String,
    pub created_by: UserId,
}

/// Full-overwrite patch applied by the owner or an admin. Every field may be
/// replaced, including ownership, status and the applicant list.
/// `assigned_to: Some(None)` clears the assignee.
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub budget: Option<f64>,
    pub location: Option<String>,
    pub status: Option<JobStatus>,
    pub created_by: Option<UserId>,
    pub assigned_to: Option<Option<UserId>>,
    pub applicants: Option<Vec<UserId>>,
}

impl JobPatch {
    pub fn apply_to(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(category) = self.category {
            job.category = category;
        }
        if let Some(budget) = self.budget {
            job.budget = budget;
        }
        if let Some(location) = self.location {
            job.location = location;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(created_by) = self.created_by {
            job.created_by = created_by;
        }
        if let Some(assigned_to) = self.assigned_to {
            job.assigned_to = assigned_to;
        }
        if let Some(applicants) = self.applicants {
            job.applicants = dedup_applicants(applicants);
        }
        job.updated_at = Utc::now();
    }
}

/// Keeps the first occurrence of every applicant, preserving order.
pub fn dedup_applicants(applicants: Vec<UserId>) -> Vec<UserId> {
    let mut seen = Vec::with_capacity(applicants.len());
    for id in applicants {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job {
            id: JobId::new(),
            title: "Fix sink".to_string(),
            description: "Leaking kitchen sink".to_string(),
            category: "plumbing".to_string(),
            budget: 1500.0,
            location: "Nairobi".to_string(),
            status: JobStatus::Open,
            created_by: UserId::new(),
            assigned_to: None,
            applicants: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Completed).unwrap(), "\"completed\"");
        assert_eq!(JobStatus::default(), JobStatus::Open);
    }

    #[test]
    fn patch_overwrites_any_field() {
        let mut job = job();
        let new_owner = UserId::new();
        let fundi = UserId::new();

        JobPatch {
            status: Some(JobStatus::Assigned),
            assigned_to: Some(Some(fundi)),
            created_by: Some(new_owner),
            budget: Some(0.0),
            ..Default::default()
        }
        .apply_to(&mut job);

        assert_eq!(job.status, JobStatus::Assigned);
        assert_eq!(job.assigned_to, Some(fundi));
        assert_eq!(job.created_by, new_owner);
        assert_eq!(job.budget, 0.0);
        assert_eq!(job.title, "Fix sink");
    }

    #[test]
    fn patch_can_clear_assignee() {
        let mut job = job();
        job.assigned_to = Some(UserId::new());

        JobPatch { assigned_to: Some(None), ..Default::default() }.apply_to(&mut job);
        assert_eq!(job.assigned_to, None);

        job.assigned_to = Some(UserId::new());
        JobPatch::default().apply_to(&mut job);
        assert!(job.assigned_to.is_some());
    }

    #[test]
    fn applicant_overwrite_drops_duplicates() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(dedup_applicants(vec![a, b, a]), vec![a, b]);
    }
}
