use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{
    ids::UserId,
    usermodel::{Rating, User},
};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide name, email, and password"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide name, email, and password"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide name, email, and password"))]
    pub password: String,

    pub role: Option<String>,
}

/// Login is never rejected as malformed: every failure is the same
/// "invalid email or password" answer.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserUpdateDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Email cannot be empty"))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: Option<String>,

    pub role: Option<String>,
}

/// Text parts of the multipart profile form.
#[derive(Validate, Debug, Default, Clone)]
pub struct ProfileUpdateDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub experience: Option<String>,
    pub skills: Option<Vec<String>>,
}

/// Accepts a JSON array (`["Plumbing","Carpentry"]`) or a comma separated
/// list (`Plumbing, Carpentry`). Blank entries are dropped.
pub fn parse_skills(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    trimmed
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RateFundiDto {
    #[validate(
        required(message = "Rating is required"),
        range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5")
    )]
    pub rating: Option<f64>,

    #[validate(length(max = 1000, message = "Comment must not exceed 1000 characters"))]
    pub comment: Option<String>,
}

/// A user record without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterUserDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub skills: Vec<String>,
    pub experience: String,
    pub location: String,
    pub profile_image: String,
    pub phone: String,
    pub jobs_posted: i32,
    pub jobs_completed: i32,
    pub success_rate: f64,
    pub average_rating: f64,
    pub ratings: Vec<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            skills: user.skills.clone(),
            experience: user.experience.to_owned(),
            location: user.location.to_owned(),
            profile_image: user.profile_image.to_owned(),
            phone: user.phone.to_owned(),
            jobs_posted: user.jobs_posted,
            jobs_completed: user.jobs_completed,
            success_rate: user.success_rate,
            average_rating: user.average_rating,
            ratings: user.ratings.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserAuthResponseDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUpdatedResponseDto {
    pub message: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_all_credentials() {
        let dto = RegisterUserDto {
            name: "Jane".into(),
            email: "".into(),
            password: "secret".into(),
            role: None,
        };
        assert!(dto.validate().is_err());

        let dto = RegisterUserDto {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            password: "secret".into(),
            role: Some("fundi".into()),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn register_only_checks_presence() {
        let dto = RegisterUserDto {
            name: "Jane".into(),
            email: "jane-at-home".into(),
            password: "secret".into(),
            role: None,
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn register_tolerates_missing_json_fields() {
        let dto: RegisterUserDto = serde_json::from_str(r#"{"email":"a@b.co"}"#).unwrap();
        assert!(dto.name.is_empty());
        assert!(dto.validate().is_err());
    }

    #[test]
    fn rating_must_be_in_range() {
        let dto = RateFundiDto { rating: Some(6.0), comment: None };
        assert!(dto.validate().is_err());

        let dto = RateFundiDto { rating: None, comment: None };
        assert!(dto.validate().is_err());

        let dto = RateFundiDto { rating: Some(4.0), comment: Some("Great".into()) };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn skills_accept_json_or_commas() {
        assert_eq!(parse_skills(r#"["Plumbing", " Carpentry "]"#), vec!["Plumbing", "Carpentry"]);
        assert_eq!(parse_skills("Plumbing, Carpentry,,"), vec!["Plumbing", "Carpentry"]);
        assert!(parse_skills("  ").is_empty());
    }
}
