use sqlx::PgPool;

use crate::domain::{NewUser, ProfileUpdate, User};
use crate::store::{DuplicateField, StoreError, UserStore};

const USER_COLUMNS: &str =
    "id, email, phone, password_hash, nickname, profile, birthday, created_at";

/// 用户存储库的 Postgres 实现
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_field(&self, field: &str, value: &str) -> Result<User, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE {field} = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(user)
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (email, phone, password_hash, nickname, profile)
             VALUES ($1, $2, $3, '', '')
             RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query_as::<_, User>(&query)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(user) => {
                tracing::info!("inserted user {}", user.id);
                Ok(user)
            }
            Err(e) => Err(map_insert_error(e)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.find_by_field("email", email).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<User, StoreError> {
        self.find_by_field("phone", phone).await
    }

    async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(user)
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET nickname = $1, profile = $2, birthday = $3 WHERE id = $4",
        )
        .bind(&update.nickname)
        .bind(&update.profile)
        .bind(update.birthday)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

/// 把 Postgres 23505 翻译成带字段信息的 Duplicate 错误
fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("users_email_key") => StoreError::Duplicate(DuplicateField::Email),
                Some("users_phone_key") => StoreError::Duplicate(DuplicateField::Phone),
                other => {
                    tracing::error!("unique violation on unexpected constraint: {:?}", other);
                    StoreError::Database(err.to_string())
                }
            };
        }
    }
    err.into()
}
