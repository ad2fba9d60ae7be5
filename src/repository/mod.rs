use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{CacheUnavailable, UserCache};
use crate::domain::{NewUser, ProfileUpdate, User};
use crate::store::{DuplicateField, StoreError, UserStore};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => RepoError::NotFound,
            StoreError::Duplicate(DuplicateField::Email) => RepoError::DuplicateEmail,
            other => RepoError::Store(other),
        }
    }
}

/// 带缓存的用户存储库。读走 cache-aside，写走失效而不是更新，
/// 缓存故障只影响性能，从不影响正确性。
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn UserCache>,
    cache_ttl: Duration,
    call_timeout: Duration,
}

impl UserRepository {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn UserCache>,
        cache_ttl: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
            call_timeout,
        }
    }

    /// 给缓存调用加截止时间，超时等同于缓存不可用
    async fn cache_call<T>(
        &self,
        fut: impl Future<Output = Result<T, CacheUnavailable>>,
    ) -> Result<T, CacheUnavailable> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheUnavailable("deadline exceeded".into())),
        }
    }

    /// 给存储调用加截止时间，超时是硬失败
    async fn store_call<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, RepoError> {
        // 先查缓存。命中直接返回；未命中回源后回填；
        // 不可用则完全跳过缓存，不回填。
        let backfill = match self.cache_call(self.cache.get(id)).await {
            Ok(Some(user)) => return Ok(user),
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("cache read failed for user {}, falling back to store: {}", id, e);
                false
            }
        };

        let user = self.store_call(self.store.find_by_id(id)).await?;

        if backfill {
            if let Err(e) = self.cache_call(self.cache.set(&user, self.cache_ttl)).await {
                tracing::warn!("cache backfill failed for user {}: {}", id, e);
            }
        }

        Ok(user)
    }

    /// 缓存只按 id 建键，邮箱查找直接走存储
    pub async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        let user = self.store_call(self.store.find_by_email(email)).await?;
        Ok(user)
    }

    /// 新纪录此前对任何读者都不存在，所以不填缓存
    pub async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let user = self.store_call(self.store.insert(user)).await?;
        Ok(user)
    }

    /// 按手机号查找或创建。并发调用同一个手机号时，
    /// 唯一约束是唯一的协调机制：插入撞到 Duplicate(Phone)
    /// 说明并发写者赢了，重新查一次并返回赢家的记录。
    pub async fn find_or_create(&self, phone: &str) -> Result<User, RepoError> {
        match self.store_call(self.store.find_by_phone(phone)).await {
            Ok(user) => return Ok(user),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        match self
            .store_call(self.store.insert(NewUser::with_phone(phone.to_string())))
            .await
        {
            Ok(user) => Ok(user),
            Err(StoreError::Duplicate(DuplicateField::Phone)) => {
                tracing::debug!("lost find-or-create race for phone, re-reading");
                let user = self.store_call(self.store.find_by_phone(phone)).await?;
                Ok(user)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 先提交存储，再无条件失效缓存。失效失败只记日志，
    /// 剩下的陈旧窗口由 TTL 兜底。
    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<(), RepoError> {
        self.store_call(self.store.update_profile(id, update)).await?;

        if let Err(e) = self.cache_call(self.cache.delete(id)).await {
            tracing::warn!("cache invalidation failed for user {}: {}", id, e);
        }

        Ok(())
    }
}
