//! 测试用的内存版存储与缓存实现

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::{CacheUnavailable, UserCache};
use crate::domain::{NewUser, ProfileUpdate, User};
use crate::store::{DuplicateField, StoreError, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<i64, User>>>,
    next_id: AtomicI64,
    find_by_id_calls: AtomicUsize,
    fail_next_find_by_phone: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn find_by_id_calls(&self) -> usize {
        self.find_by_id_calls.load(Ordering::SeqCst)
    }

    /// 让下一次 find_by_phone 返回 NotFound，用来模拟输掉插入竞争
    pub fn fail_next_find_by_phone(&self) {
        self.fail_next_find_by_phone.store(true, Ordering::SeqCst);
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// 绕过唯一性检查之外的逻辑直接插入，扮演并发写者
    pub async fn insert_direct(&self, user: NewUser) -> User {
        self.try_insert(user).await.expect("direct insert failed")
    }

    async fn try_insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = user.email.as_deref() {
            if users.values().any(|u| u.email.as_deref() == Some(email)) {
                return Err(StoreError::Duplicate(DuplicateField::Email));
            }
        }
        if let Some(phone) = user.phone.as_deref() {
            if users.values().any(|u| u.phone.as_deref() == Some(phone)) {
                return Err(StoreError::Duplicate(DuplicateField::Phone));
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let user = User {
            id,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            nickname: String::new(),
            profile: String::new(),
            birthday: None,
            created_at: chrono::Utc::now(),
        };
        users.insert(id, user.clone());
        Ok(user)
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        self.try_insert(user).await
    }

    async fn find_by_email(&self, email: &str) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_phone(&self, phone: &str) -> Result<User, StoreError> {
        if self.fail_next_find_by_phone.swap(false, Ordering::SeqCst) {
            return Err(StoreError::NotFound);
        }
        self.users
            .read()
            .await
            .values()
            .find(|u| u.phone.as_deref() == Some(phone))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, StoreError> {
        self.find_by_id_calls.fetch_add(1, Ordering::SeqCst);
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.nickname = update.nickname.clone();
        user.profile = update.profile.clone();
        user.birthday = update.birthday;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserCache {
    entries: Arc<RwLock<HashMap<i64, User>>>,
    unavailable: AtomicBool,
    set_calls: AtomicUsize,
}

impl MemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, id: i64) -> bool {
        self.entries.read().await.contains_key(&id)
    }

    fn check_available(&self) -> Result<(), CacheUnavailable> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CacheUnavailable("forced unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl UserCache for MemoryUserCache {
    async fn get(&self, id: i64) -> Result<Option<User>, CacheUnavailable> {
        self.check_available()?;
        Ok(self.entries.read().await.get(&id).cloned())
    }

    async fn set(&self, user: &User, _ttl: Duration) -> Result<(), CacheUnavailable> {
        self.check_available()?;
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.entries.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), CacheUnavailable> {
        self.check_available()?;
        self.entries.write().await.remove(&id);
        Ok(())
    }
}
