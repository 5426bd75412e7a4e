// db/userdb.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;

use super::db::{DBClient, StoreError};
use crate::models::{
    ids::UserId,
    usermodel::{NewUser, Rating, User, UserRole, UserUpdate},
};

const USER_COLUMNS: &str = r#"
    id, name, email, password, role,
    skills, experience, location, profile_image, phone,
    jobs_posted, jobs_completed, success_rate, average_rating,
    created_at, updated_at
"#;

const DUPLICATE_EMAIL: &str = "Email already in use";

#[async_trait]
pub trait UserExt {
    /// Looks a user up by id or by (case-insensitive) email.
    async fn get_user(
        &self,
        user_id: Option<UserId>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    async fn get_users(&self) -> Result<Vec<User>, StoreError>;

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, StoreError>;

    async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;

    /// Fails with `StoreError::Duplicate` when the email is taken.
    async fn save_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn update_user(
        &self,
        user_id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, StoreError>;

    async fn delete_user(&self, user_id: UserId) -> Result<bool, StoreError>;

    /// Appends a rating and recomputes the average in one step.
    async fn add_rating(
        &self,
        user_id: UserId,
        rating: Rating,
    ) -> Result<Option<User>, StoreError>;

    async fn increment_jobs_posted(&self, user_id: UserId) -> Result<(), StoreError>;

    async fn increment_jobs_completed(&self, user_id: UserId) -> Result<(), StoreError>;

    async fn set_success_rate(&self, user_id: UserId, rate: f64) -> Result<(), StoreError>;
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    user_id: UserId,
    #[sqlx(flatten)]
    rating: Rating,
}

impl DBClient {
    async fn attach_ratings(&self, mut users: Vec<User>) -> Result<Vec<User>, sqlx::Error> {
        if users.is_empty() {
            return Ok(users);
        }

        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        let rows = sqlx::query_as::<_, RatingRow>(
            r#"
            SELECT user_id, rater_id AS rater, score, comment, created_at
            FROM ratings
            WHERE user_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_user: HashMap<UserId, Vec<Rating>> = HashMap::new();
        for row in rows {
            by_user.entry(row.user_id).or_default().push(row.rating);
        }
        for user in users.iter_mut() {
            user.ratings = by_user.remove(&user.id).unwrap_or_default();
        }

        Ok(users)
    }

    async fn attach_ratings_one(&self, user: Option<User>) -> Result<Option<User>, sqlx::Error> {
        match user {
            Some(user) => Ok(self.attach_ratings(vec![user]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<UserId>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
                USER_COLUMNS
            ))
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(self.attach_ratings_one(user).await?)
    }

    async fn get_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(self.attach_ratings(users).await?)
    }

    async fn get_users_by_role(&self, role: UserRole) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE role = $1 ORDER BY created_at ASC",
            USER_COLUMNS
        ))
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(self.attach_ratings(users).await?)
    }

    async fn get_users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        Ok(self.attach_ratings(users).await?)
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password, role)
            VALUES ($1, $2, LOWER($3), $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(UserId::new())
        .bind(new_user.name)
        .bind(new_user.email.trim())
        .bind(new_user.password)
        .bind(new_user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::from_unique(e, DUPLICATE_EMAIL))
    }

    async fn update_user(
        &self,
        user_id: UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE(LOWER($3), email),
                password = COALESCE($4, password),
                role = COALESCE($5, role),
                skills = COALESCE($6, skills),
                experience = COALESCE($7, experience),
                location = COALESCE($8, location),
                profile_image = COALESCE($9, profile_image),
                phone = COALESCE($10, phone),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(update.name)
        .bind(update.email.map(|e| e.trim().to_string()))
        .bind(update.password)
        .bind(update.role)
        .bind(update.skills)
        .bind(update.experience)
        .bind(update.location)
        .bind(update.profile_image)
        .bind(update.phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::from_unique(e, DUPLICATE_EMAIL))?;

        Ok(self.attach_ratings_one(user).await?)
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_rating(
        &self,
        user_id: UserId,
        rating: Rating,
    ) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<(UserId,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO ratings (user_id, rater_id, score, comment, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user_id)
        .bind(rating.rater)
        .bind(rating.score)
        .bind(rating.comment)
        .bind(rating.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET average_rating = (
                    SELECT COALESCE(AVG(score), 0)::DOUBLE PRECISION
                    FROM ratings WHERE user_id = $1
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_user(Some(user_id), None).await
    }

    async fn increment_jobs_posted(&self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET jobs_posted = jobs_posted + 1, updated_at = $2 WHERE id = $1")
            .bind(user_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn increment_jobs_completed(&self, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET jobs_completed = jobs_completed + 1, updated_at = $2 WHERE id = $1",
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_success_rate(&self, user_id: UserId, rate: f64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET success_rate = $2 WHERE id = $1")
            .bind(user_id)
            .bind(rate)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
