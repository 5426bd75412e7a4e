pub mod access;
pub mod auth_service;
pub mod error;
pub mod events;
pub mod job_service;
pub mod user_service;

pub use auth_service::{AuthService, Session};
pub use error::ServiceError;
pub use job_service::JobService;
pub use user_service::{ProfileImage, UserService};
