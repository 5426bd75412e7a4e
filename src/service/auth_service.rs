// service/auth_service.rs
use std::sync::Arc;

use validator::Validate;

use super::error::ServiceError;
use crate::{
    config::Config,
    db::MarketStore,
    dtos::userdtos::{LoginUserDto, RegisterUserDto},
    error::ErrorMessage,
    models::usermodel::{Identity, NewUser, User, UserRole},
    utils::{password, token},
};

/// A freshly issued bearer token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    db_client: Arc<dyn MarketStore>,
    env: Config,
}

impl AuthService {
    pub fn new(db_client: Arc<dyn MarketStore>, env: Config) -> Self {
        Self { db_client, env }
    }

    pub async fn register(&self, body: RegisterUserDto) -> Result<Session, ServiceError> {
        body.validate()?;

        let requested = match body.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(role) => Some(role.parse::<UserRole>().map_err(ServiceError::Validation)?),
        };
        let role = UserRole::for_registration(requested);

        let existing_user = self.db_client.get_user(None, Some(&body.email)).await?;
        if existing_user.is_some() {
            return Err(ServiceError::Conflict(ErrorMessage::EmailExist.to_string()));
        }

        let hashed_password =
            password::hash(&body.password).map_err(|e| ServiceError::Hashing(e.to_string()))?;

        let user = self
            .db_client
            .save_user(NewUser {
                name: body.name,
                email: body.email,
                password: hashed_password,
                role,
            })
            .await?;

        tracing::info!("Registered {} account {}", user.role.to_str(), user.id);

        let token = self.issue(&user.identity(), self.env.jwt_register_maxage)?;
        Ok(Session { token, user })
    }

    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, body: LoginUserDto) -> Result<Session, ServiceError> {
        let wrong_credentials = || ServiceError::Auth(ErrorMessage::WrongCredentials.to_string());

        let user = self
            .db_client
            .get_user(None, Some(&body.email))
            .await?
            .ok_or_else(wrong_credentials)?;

        let password_matched =
            password::compare(&body.password, &user.password).map_err(|_| wrong_credentials())?;
        if !password_matched {
            return Err(wrong_credentials());
        }

        let token = self.issue(&user.identity(), self.env.jwt_login_maxage)?;
        Ok(Session { token, user })
    }

    fn issue(&self, identity: &Identity, maxage_minutes: i64) -> Result<String, ServiceError> {
        Ok(token::create_token(
            identity,
            self.env.jwt_secret.as_bytes(),
            maxage_minutes,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, UserExt};

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (AuthService::new(store.clone(), Config::for_tests()), store)
    }

    fn register_dto(email: &str, role: Option<&str>) -> RegisterUserDto {
        RegisterUserDto {
            name: "Amani".into(),
            email: email.into(),
            password: "pa55word".into(),
            role: role.map(String::from),
        }
    }

    #[tokio::test]
    async fn admin_requests_become_clients() {
        let (auth, store) = service();

        let session = auth.register(register_dto("boss@example.com", Some("admin"))).await.unwrap();
        assert_eq!(session.user.role, UserRole::Client);

        let stored = store.get_user(Some(session.user.id), None).await.unwrap().unwrap();
        assert_eq!(stored.role, UserRole::Client);

        let claims = token::decode_token(session.token, b"test-secret").unwrap();
        assert_eq!(claims.role, UserRole::Client);
    }

    #[tokio::test]
    async fn default_and_fundi_roles() {
        let (auth, _) = service();

        let client = auth.register(register_dto("c@example.com", None)).await.unwrap();
        assert_eq!(client.user.role, UserRole::Client);

        let fundi = auth.register(register_dto("f@example.com", Some("fundi"))).await.unwrap();
        assert_eq!(fundi.user.role, UserRole::Fundi);
    }

    #[tokio::test]
    async fn unknown_role_is_a_validation_error() {
        let (auth, _) = service();
        let err = auth.register(register_dto("x@example.com", Some("wizard"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn password_is_stored_hashed() {
        let (auth, _) = service();
        let session = auth.register(register_dto("h@example.com", None)).await.unwrap();
        assert_ne!(session.user.password, "pa55word");
        assert!(password::compare("pa55word", &session.user.password).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_in_any_case() {
        let (auth, _) = service();
        auth.register(register_dto("x@example.com", None)).await.unwrap();

        for email in ["x@example.com", "X@Example.COM"] {
            let err = auth.register(register_dto(email, Some("fundi"))).await.unwrap_err();
            assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Email already in use"));
        }
    }

    #[tokio::test]
    async fn missing_fields_fail_validation() {
        let (auth, _) = service();
        let mut dto = register_dto("y@example.com", None);
        dto.password = String::new();

        let err = auth.register(dto).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn login_does_not_leak_which_part_was_wrong() {
        let (auth, _) = service();
        auth.register(register_dto("z@example.com", None)).await.unwrap();

        let wrong_password = auth
            .login(LoginUserDto { email: "z@example.com".into(), password: "nope".into() })
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(LoginUserDto { email: "nobody@example.com".into(), password: "pa55word".into() })
            .await
            .unwrap_err();
        let empty_password = auth
            .login(LoginUserDto { email: "z@example.com".into(), password: String::new() })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), empty_password.to_string());
        assert!(matches!(wrong_password, ServiceError::Auth(_)));
        assert!(matches!(unknown_email, ServiceError::Auth(_)));
    }

    #[tokio::test]
    async fn login_is_case_insensitive_and_issues_token() {
        let (auth, _) = service();
        let registered = auth.register(register_dto("mix@example.com", Some("fundi"))).await.unwrap();

        let session = auth
            .login(LoginUserDto { email: "MIX@example.com".into(), password: "pa55word".into() })
            .await
            .unwrap();

        assert_eq!(session.user.id, registered.user.id);
        let identity = token::decode_token(session.token, b"test-secret").unwrap();
        assert_eq!(identity, Identity::new(registered.user.id, UserRole::Fundi));
    }
}
