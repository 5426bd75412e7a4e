use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::userdtos::FilterUserDto;
use crate::models::{
    ids::{JobId, UserId},
    jobmodel::{Job, JobPatch, JobStatus},
};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Budgets arrive as numbers or, from plain HTML forms, as numeric strings.
/// An empty string counts as missing.
fn budget_from_json<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let budget = match Option::<NumberOrString>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberOrString::Number(n)) => n,
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => return Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom("Budget must be a number"))?,
    };

    // "NaN" and "inf" parse as f64 but are not budgets
    if !budget.is_finite() {
        return Err(serde::de::Error::custom("Budget must be a number"));
    }
    Ok(Some(budget))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateJobDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub description: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub category: String,

    #[serde(default, deserialize_with = "budget_from_json")]
    #[validate(
        required(message = "All fields are required"),
        range(min = 0.0, message = "Budget must be a positive number")
    )]
    pub budget: Option<f64>,

    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub location: String,
}

/// Whole-document patch. Any stored field may be replaced.
#[derive(Validate, Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,

    #[serde(default, deserialize_with = "budget_from_json")]
    #[validate(range(min = 0.0, message = "Budget must be a positive number"))]
    pub budget: Option<f64>,

    pub location: Option<String>,
    pub status: Option<JobStatus>,
    pub created_by: Option<UserId>,

    #[serde(default, deserialize_with = "nullable")]
    pub assigned_to: Option<Option<UserId>>,

    pub applicants: Option<Vec<UserId>>,
}

impl From<UpdateJobDto> for JobPatch {
    fn from(dto: UpdateJobDto) -> Self {
        JobPatch {
            title: dto.title,
            description: dto.description,
            category: dto.category,
            budget: dto.budget,
            location: dto.location,
            status: dto.status,
            created_by: dto.created_by,
            assigned_to: dto.assigned_to,
            applicants: dto.applicants,
        }
    }
}

/// A job with its creator and assignee expanded into user records.
/// A reference to a user that no longer exists renders as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponseDto {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget: f64,
    pub location: String,
    pub status: JobStatus,
    pub created_by: Option<FilterUserDto>,
    pub assigned_to: Option<FilterUserDto>,
    pub applicants: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobResponseDto {
    pub fn expand(
        job: Job,
        created_by: Option<FilterUserDto>,
        assigned_to: Option<FilterUserDto>,
    ) -> Self {
        JobResponseDto {
            id: job.id,
            title: job.title,
            description: job.description,
            category: job.category,
            budget: job.budget,
            location: job.location,
            status: job.status,
            created_by,
            assigned_to,
            applicants: job.applicants,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobListResponseDto {
    pub jobs: Vec<JobResponseDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponseEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub job: JobResponseDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_every_field() {
        let dto: CreateJobDto = serde_json::from_str(
            r#"{"title":"Paint","description":"Two rooms","category":"painting","location":"Mombasa"}"#,
        )
        .unwrap();
        assert!(dto.validate().is_err());

        let dto: CreateJobDto = serde_json::from_str(
            r#"{"title":"Paint","description":"Two rooms","category":"painting","location":"Mombasa","budget":0}"#,
        )
        .unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn negative_budget_is_invalid() {
        let dto: CreateJobDto = serde_json::from_str(
            r#"{"title":"Paint","description":"Two rooms","category":"painting","location":"Mombasa","budget":-1}"#,
        )
        .unwrap();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn budget_accepts_numeric_strings() {
        let dto: CreateJobDto = serde_json::from_str(r#"{"budget":"5000"}"#).unwrap();
        assert_eq!(dto.budget, Some(5000.0));

        let dto: CreateJobDto = serde_json::from_str(r#"{"budget":""}"#).unwrap();
        assert_eq!(dto.budget, None);

        assert!(serde_json::from_str::<CreateJobDto>(r#"{"budget":"lots"}"#).is_err());
    }

    #[test]
    fn non_finite_budgets_are_rejected() {
        for raw in ["NaN", "nan", "inf", "-inf", "infinity"] {
            let body = format!(r#"{{"budget":"{}"}}"#, raw);
            assert!(serde_json::from_str::<CreateJobDto>(&body).is_err(), "{}", raw);
            assert!(serde_json::from_str::<UpdateJobDto>(&body).is_err(), "{}", raw);
        }
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let dto: UpdateJobDto = serde_json::from_str(r#"{"status":"completed"}"#).unwrap();
        assert_eq!(dto.status, Some(JobStatus::Completed));
        assert_eq!(dto.assigned_to, None);

        let dto: UpdateJobDto = serde_json::from_str(r#"{"assignedTo":null}"#).unwrap();
        assert_eq!(dto.assigned_to, Some(None));

        let fundi = UserId::new();
        let dto: UpdateJobDto =
            serde_json::from_str(&format!(r#"{{"assignedTo":"{}"}}"#, fundi)).unwrap();
        assert_eq!(dto.assigned_to, Some(Some(fundi)));
    }

    #[test]
    fn update_rejects_unknown_status() {
        assert!(serde_json::from_str::<UpdateJobDto>(r#"{"status":"archived"}"#).is_err());
    }
}
