// service/user_service.rs
use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use super::{access, error::ServiceError};
use crate::{
    config::Config,
    db::{MarketStore, UserExt},
    dtos::userdtos::{ProfileUpdateDto, RateFundiDto, UserUpdateDto},
    models::{
        ids::UserId,
        usermodel::{Identity, Rating, User, UserRole, UserUpdate},
    },
    utils::{password, upload},
};

/// Raw file part of the profile form.
#[derive(Debug, Clone)]
pub struct ProfileImage {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UserService {
    db_client: Arc<dyn MarketStore>,
    env: Config,
}

impl UserService {
    pub fn new(db_client: Arc<dyn MarketStore>, env: Config) -> Self {
        Self { db_client, env }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.db_client.get_users().await?)
    }

    pub async fn list_by_role(&self, role: UserRole) -> Result<Vec<User>, ServiceError> {
        Ok(self.db_client.get_users_by_role(role).await?)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.db_client
            .get_user(Some(user_id), None)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))
    }

    pub async fn get_profile(&self, identity: &Identity) -> Result<User, ServiceError> {
        self.get_user(identity.user_id).await
    }

    /// Updates the caller's own profile fields and, when a file was sent,
    /// replaces the profile image.
    pub async fn update_profile(
        &self,
        identity: &Identity,
        body: ProfileUpdateDto,
        image: Option<ProfileImage>,
    ) -> Result<User, ServiceError> {
        body.validate()?;

        let profile_image = match image {
            Some(image) if !image.bytes.is_empty() => Some(
                upload::save_profile_image(
                    &self.env.upload_dir,
                    image.file_name.as_deref(),
                    &image.bytes,
                )
                .await?,
            ),
            _ => None,
        };

        let update = UserUpdate {
            name: body.name,
            phone: body.phone,
            location: body.location,
            experience: body.experience,
            skills: body.skills,
            profile_image,
            ..Default::default()
        };

        self.db_client
            .update_user(identity.user_id, update)
            .await?
            .ok_or(ServiceError::UserNotFound(identity.user_id))
    }

    pub async fn update_user(
        &self,
        identity: &Identity,
        user_id: UserId,
        body: UserUpdateDto,
    ) -> Result<User, ServiceError> {
        body.validate()?;

        let role = match body.role.as_deref() {
            None => None,
            Some(role) => {
                let role = role.parse::<UserRole>().map_err(ServiceError::Validation)?;
                if !access::can_change_role(identity) {
                    return Err(ServiceError::Forbidden(
                        "Only admins can change user roles".to_string(),
                    ));
                }
                Some(role)
            }
        };

        let password = match body.password {
            Some(plain) => {
                Some(password::hash(plain).map_err(|e| ServiceError::Hashing(e.to_string()))?)
            }
            None => None,
        };

        let update = UserUpdate {
            name: body.name,
            email: body.email,
            password,
            role,
            ..Default::default()
        };

        let user = self
            .db_client
            .update_user(user_id, update)
            .await?
            .ok_or(ServiceError::UserNotFound(user_id))?;

        tracing::info!("User {} updated by {}", user.id, identity.user_id);
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<(), ServiceError> {
        if !self.db_client.delete_user(user_id).await? {
            return Err(ServiceError::UserNotFound(user_id));
        }
        tracing::info!("User {} deleted", user_id);
        Ok(())
    }

    pub async fn rate_fundi(
        &self,
        identity: &Identity,
        fundi_id: UserId,
        body: RateFundiDto,
    ) -> Result<User, ServiceError> {
        body.validate()?;

        let score = body
            .rating
            .filter(|r| r.fract() == 0.0)
            .ok_or_else(|| {
                ServiceError::Validation("Rating must be a whole number between 1 and 5".to_string())
            })? as i32;

        let fundi = self.get_user(fundi_id).await?;
        if fundi.role != UserRole::Fundi {
            return Err(ServiceError::Validation("Only fundis can be rated".to_string()));
        }

        let rating = Rating {
            rater: identity.user_id,
            score,
            comment: body.comment.filter(|c| !c.trim().is_empty()),
            created_at: Utc::now(),
        };

        self.db_client
            .add_rating(fundi_id, rating)
            .await?
            .ok_or(ServiceError::UserNotFound(fundi_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, models::usermodel::NewUser};

    async fn setup() -> (UserService, Arc<MemoryStore>, Identity, Identity, Identity) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = vec![];
        for (email, role) in [
            ("admin@example.com", UserRole::Admin),
            ("client@example.com", UserRole::Client),
            ("fundi@example.com", UserRole::Fundi),
        ] {
            let user = store
                .save_user(NewUser {
                    name: email.split('@').next().unwrap_or_default().to_string(),
                    email: email.into(),
                    password: password::hash("secret").unwrap(),
                    role,
                })
                .await
                .unwrap();
            ids.push(user.identity());
        }
        let service = UserService::new(store.clone(), Config::for_tests());
        (service, store, ids[0], ids[1], ids[2])
    }

    #[tokio::test]
    async fn lists_by_role() {
        let (users, _, _, _, fundi) = setup().await;

        let fundis = users.list_by_role(UserRole::Fundi).await.unwrap();
        assert_eq!(fundis.len(), 1);
        assert_eq!(fundis[0].id, fundi.user_id);
        assert_eq!(users.list_users().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn role_change_needs_admin() {
        let (users, _, admin, client, fundi) = setup().await;

        let dto = UserUpdateDto { role: Some("admin".into()), ..Default::default() };
        let err = users.update_user(&client, client.user_id, dto.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let dto = UserUpdateDto { role: Some("client".into()), ..Default::default() };
        let updated = users.update_user(&admin, fundi.user_id, dto).await.unwrap();
        assert_eq!(updated.role, UserRole::Client);
    }

    #[tokio::test]
    async fn update_rehashes_password_and_detects_email_clash() {
        let (users, _, _, client, _) = setup().await;

        let dto = UserUpdateDto { password: Some("n3w-secret".into()), ..Default::default() };
        let updated = users.update_user(&client, client.user_id, dto).await.unwrap();
        assert!(password::compare("n3w-secret", &updated.password).unwrap());

        let dto = UserUpdateDto { email: Some("FUNDI@example.com".into()), ..Default::default() };
        let err = users.update_user(&client, client.user_id, dto).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_users_are_not_found() {
        let (users, _, admin, _, _) = setup().await;
        let ghost = UserId::new();

        assert!(matches!(users.get_user(ghost).await, Err(ServiceError::UserNotFound(_))));
        assert!(matches!(users.delete_user(ghost).await, Err(ServiceError::UserNotFound(_))));
        assert!(matches!(
            users.update_user(&admin, ghost, UserUpdateDto::default()).await,
            Err(ServiceError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_keeps_credentials() {
        let (users, _, _, _, fundi) = setup().await;
        let before = users.get_profile(&fundi).await.unwrap();

        let body = ProfileUpdateDto {
            phone: Some("0712345678".into()),
            skills: Some(vec!["Plumbing".into(), "Tiling".into()]),
            ..Default::default()
        };
        let after = users.update_profile(&fundi, body, None).await.unwrap();

        assert_eq!(after.phone, "0712345678");
        assert_eq!(after.skills, vec!["Plumbing", "Tiling"]);
        assert_eq!(after.email, before.email);
        assert_eq!(after.password, before.password);
        assert_eq!(after.role, UserRole::Fundi);
    }

    #[tokio::test]
    async fn rating_rules() {
        let (users, _, _, client, fundi) = setup().await;

        let half = RateFundiDto { rating: Some(4.5), comment: None };
        assert!(matches!(
            users.rate_fundi(&client, fundi.user_id, half).await,
            Err(ServiceError::Validation(_))
        ));

        let five = RateFundiDto { rating: Some(5.0), comment: None };
        assert!(matches!(
            users.rate_fundi(&client, client.user_id, five.clone()).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            users.rate_fundi(&client, UserId::new(), five.clone()).await,
            Err(ServiceError::UserNotFound(_))
        ));

        users.rate_fundi(&client, fundi.user_id, five.clone()).await.unwrap();
        let four = RateFundiDto { rating: Some(4.0), comment: Some("Tidy".into()) };
        let rated = users.rate_fundi(&client, fundi.user_id, four).await.unwrap();

        assert_eq!(rated.ratings.len(), 2);
        assert_eq!(rated.average_rating, 4.5);
        assert_eq!(rated.ratings[1].rater, client.user_id);
    }
}
