use thiserror::Error;

use crate::domain::{NewUser, ProfileUpdate, User};
use crate::repository::{RepoError, UserRepository};
use crate::utils::{hash_password, verify_password};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("email already registered")]
    DuplicateEmail,
    /// 邮箱不存在和密码错误统一成同一个结果，
    /// 不向外暴露账号是否存在
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::DuplicateEmail => ServiceError::DuplicateEmail,
            RepoError::NotFound => ServiceError::NotFound,
            RepoError::Store(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

/// 账号业务编排：注册、登录、编辑、详情、手机号登录或注册
#[derive(Clone)]
pub struct AccountService {
    repo: UserRepository,
}

impl AccountService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// 注册。密码在进入存储边界之前先做单向哈希。
    pub async fn signup(&self, email: &str, password: &str) -> Result<i64, ServiceError> {
        let password_hash =
            hash_password(password).map_err(|e| ServiceError::Internal(e.to_string()))?;

        let user = self
            .repo
            .create(NewUser::with_email(email.to_string(), password_hash))
            .await?;

        tracing::info!("registered user {}", user.id);
        Ok(user.id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let user = match self.repo.find_by_email(email).await {
            Ok(user) => user,
            Err(RepoError::NotFound) => return Err(ServiceError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        // 手机号注册的账号没有密码，同样按凭证错误处理
        let matches = match user.password_hash.as_deref() {
            Some(hash) => {
                verify_password(password, hash).map_err(|e| ServiceError::Internal(e.to_string()))?
            }
            None => false,
        };
        if !matches {
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn edit(&self, id: i64, update: &ProfileUpdate) -> Result<(), ServiceError> {
        self.repo.update_profile(id, update).await?;
        Ok(())
    }

    pub async fn profile(&self, id: i64) -> Result<User, ServiceError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// 手机号登录或注册。调用方必须先通过验证码校验。
    pub async fn find_or_create(&self, phone: &str) -> Result<User, ServiceError> {
        Ok(self.repo.find_or_create(phone).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::testutil::{MemoryUserCache, MemoryUserStore};

    fn service() -> (AccountService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let cache = Arc::new(MemoryUserCache::new());
        let repo = UserRepository::new(
            store.clone(),
            cache,
            Duration::from_secs(60),
            Duration::from_secs(1),
        );
        (AccountService::new(repo), store)
    }

    #[tokio::test]
    async fn signup_then_login_roundtrip() {
        let (svc, _) = service();

        let id = svc.signup("a@x.com", "hello#world1").await.unwrap();
        let user = svc.login("a@x.com", "hello#world1").await.unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn second_signup_with_same_email_is_rejected() {
        let (svc, store) = service();

        svc.signup("a@x.com", "hello#world1").await.unwrap();
        let second = svc.signup("a@x.com", "other#pass2").await;
        assert!(matches!(second, Err(ServiceError::DuplicateEmail)));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() {
        let (svc, _) = service();
        svc.signup("a@x.com", "hello#world1").await.unwrap();

        let unknown = svc.login("notregistered@x.com", "anything").await;
        let wrong = svc.login("a@x.com", "wrongpassword").await;
        assert!(matches!(unknown, Err(ServiceError::InvalidCredentials)));
        assert!(matches!(wrong, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn phone_only_account_cannot_password_login() {
        let (svc, _) = service();

        let user = svc.find_or_create("13800000000").await.unwrap();
        assert!(user.email.is_none());

        // 用该账号邮箱登录无从谈起，但也要防住空哈希
        let result = svc.login("", "password").await;
        assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn edit_is_visible_through_profile() {
        let (svc, _) = service();

        let id = svc.signup("a@x.com", "hello#world1").await.unwrap();
        // 先读一次让缓存有陈旧快照
        svc.profile(id).await.unwrap();

        let update = ProfileUpdate {
            nickname: "乌龙头".into(),
            profile: "第一周作业".into(),
            birthday: chrono::NaiveDate::from_ymd_opt(2000, 1, 2),
        };
        svc.edit(id, &update).await.unwrap();

        let user = svc.profile(id).await.unwrap();
        assert_eq!(user.nickname, "乌龙头");
        assert_eq!(user.birthday, chrono::NaiveDate::from_ymd_opt(2000, 1, 2));
    }

    #[tokio::test]
    async fn edit_unknown_user_is_not_found() {
        let (svc, _) = service();
        let update = ProfileUpdate {
            nickname: "n".into(),
            profile: "p".into(),
            birthday: None,
        };
        assert!(matches!(
            svc.edit(404, &update).await,
            Err(ServiceError::NotFound)
        ));
    }
}
