use std::str::FromStr;

use chrono::prelude::*;
use serde::{Deserialize, Serialize};

use super::ids::UserId;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Client,
    Fundi,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Client => "client",
            UserRole::Fundi => "fundi",
        }
    }

    /// Role granted by self-registration. Nobody can register as admin,
    /// such a request silently becomes a client account.
    pub fn for_registration(requested: Option<UserRole>) -> UserRole {
        match requested {
            Some(UserRole::Fundi) => UserRole::Fundi,
            Some(UserRole::Admin) | Some(UserRole::Client) | None => UserRole::Client,
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "client" => Ok(UserRole::Client),
            "fundi" => Ok(UserRole::Fundi),
            other => Err(format!("Unknown role '{}'", other)),
        }
    }
}

/// Decoded bearer token: who is calling and with which role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Identity {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Identity { user_id, role }
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub rater: UserId,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Arithmetic mean of every score, 0 when nothing was rated yet.
pub fn average_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let total: i64 = ratings.iter().map(|r| i64::from(r.score)).sum();
    total as f64 / ratings.len() as f64
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,

    pub skills: Vec<String>,
    pub experience: String,
    pub location: String,
    pub profile_image: String,
    pub phone: String,

    pub jobs_posted: i32,
    pub jobs_completed: i32,
    pub success_rate: f64,
    pub average_rating: f64,

    #[sqlx(skip)]
    pub ratings: Vec<Rating>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }
}

/// Fields required to persist a new account. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Partial update of an account; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub phone: Option<String>,
}

impl UserUpdate {
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(password) = self.password {
            user.password = password;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(skills) = self.skills {
            user.skills = skills;
        }
        if let Some(experience) = self.experience {
            user.experience = experience;
        }
        if let Some(location) = self.location {
            user.location = location;
        }
        if let Some(profile_image) = self.profile_image {
            user.profile_image = profile_image;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        user.updated_at = Utc::now();
    }
}

/// Share of a client's posted jobs that reached `completed`, as a percentage
/// rounded to one decimal.
pub fn success_rate(completed: i64, posted: i64) -> f64 {
    if posted <= 0 {
        return 0.0;
    }
    let pct = completed as f64 * 100.0 / posted as f64;
    (pct * 10.0).round() / 10.0
}
