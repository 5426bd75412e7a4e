// Authorization rules shared by the route gates and the job lifecycle.
use crate::models::{
    jobmodel::Job,
    usermodel::{Identity, UserRole},
};

pub fn can_post_jobs(role: UserRole) -> bool {
    match role {
        UserRole::Client => true,
        UserRole::Admin | UserRole::Fundi => false,
    }
}

pub fn can_apply(role: UserRole) -> bool {
    match role {
        UserRole::Fundi => true,
        UserRole::Admin | UserRole::Client => false,
    }
}

/// Owner or any admin may patch a job.
pub fn can_update_job(identity: &Identity, job: &Job) -> bool {
    match identity.role {
        UserRole::Admin => true,
        UserRole::Client | UserRole::Fundi => job.is_owned_by(identity.user_id),
    }
}

/// Only the owner may delete, admins included in the refusal.
pub fn can_delete_job(identity: &Identity, job: &Job) -> bool {
    job.is_owned_by(identity.user_id)
}

/// Role changes are an administrative operation.
pub fn can_change_role(identity: &Identity) -> bool {
    match identity.role {
        UserRole::Admin => true,
        UserRole::Client | UserRole::Fundi => false,
    }
}
