use tokio::sync::OwnedMutexGuard;
use tracing::info;

use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::profile::entity::{append_entity, find_entity, remove_entity, replace_entity, ProfileEntity};
use crate::profile::locks::KeyedLocks;
use crate::storage::JsonStore;

/// Profile aggregate operations on top of the [`JsonStore`].
///
/// Every mutation is a whole-document read-modify-write, serialized per user
/// key so overlapping requests for one user apply one after the other. Reads
/// take no lock: the store's atomic rename already guarantees they see a
/// complete document.
#[derive(Debug, Clone)]
pub struct ProfileService {
    store: JsonStore,
    locks: KeyedLocks,
}

impl ProfileService {
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        let profile = self.load(user_id).await?;
        info!(user_id, "Retrieved profile");
        Ok(profile)
    }

    /// Replaces the whole profile. Creates it when none exists yet.
    pub async fn update_profile(&self, user_id: &str, profile: Profile) -> Result<Profile, AppError> {
        let guard = self.locks.lock(user_id).await;
        let profile = self.save(user_id, profile, guard).await?;
        info!(user_id, "Updated profile");
        Ok(profile)
    }

    pub async fn delete_profile(&self, user_id: &str) -> Result<(), AppError> {
        let guard = self.locks.lock(user_id).await;
        let store = self.store.clone();
        let key = user_id.to_string();
        let existed = run_blocking(move || {
            let _guard = guard;
            store.delete(&key)
        })
        .await??;
        if !existed {
            return Err(profile_not_found(user_id));
        }
        info!(user_id, "Deleted profile");
        Ok(())
    }

    pub async fn get_entity<E: ProfileEntity>(&self, user_id: &str, entity_id: &str) -> Result<E, AppError> {
        let profile = self.load(user_id).await?;
        find_entity::<E>(&profile, entity_id)
            .cloned()
            .ok_or_else(|| entity_not_found::<E>(user_id, entity_id))
    }

    /// Appends `entity` to its collection, generating an id if it has none.
    pub async fn add_entity<E: ProfileEntity>(&self, user_id: &str, entity: E) -> Result<E, AppError> {
        let added = self
            .mutate(user_id, |profile| Ok(append_entity(profile, entity)))
            .await?;
        info!(user_id, "Added {} {}", E::LABEL.to_lowercase(), added.id());
        Ok(added)
    }

    /// Overwrites the entity with `entity_id`. NotFound if it does not exist,
    /// in which case nothing is written.
    pub async fn update_entity<E: ProfileEntity>(
        &self,
        user_id: &str,
        entity_id: &str,
        entity: E,
    ) -> Result<E, AppError> {
        let updated = self
            .mutate(user_id, |profile| {
                replace_entity(profile, entity_id, entity)
                    .ok_or_else(|| entity_not_found::<E>(user_id, entity_id))
            })
            .await?;
        info!(user_id, "Updated {} {entity_id}", E::LABEL.to_lowercase());
        Ok(updated)
    }

    pub async fn delete_entity<E: ProfileEntity>(&self, user_id: &str, entity_id: &str) -> Result<(), AppError> {
        self.mutate(user_id, |profile| {
            if remove_entity::<E>(profile, entity_id) {
                Ok(())
            } else {
                Err(entity_not_found::<E>(user_id, entity_id))
            }
        })
        .await?;
        info!(user_id, "Deleted {} {entity_id}", E::LABEL.to_lowercase());
        Ok(())
    }

    /// Load → apply `f` → save under the user's lock. When `f` fails the
    /// stored document is left untouched.
    async fn mutate<T, F>(&self, user_id: &str, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Profile) -> Result<T, AppError>,
    {
        let guard = self.locks.lock(user_id).await;
        let mut profile = self.load(user_id).await?;
        let out = f(&mut profile)?;
        self.save(user_id, profile, guard).await?;
        Ok(out)
    }

    async fn load(&self, user_id: &str) -> Result<Profile, AppError> {
        let store = self.store.clone();
        let key = user_id.to_string();
        run_blocking(move || store.load::<Profile>(&key))
            .await??
            .ok_or_else(|| profile_not_found(user_id))
    }

    /// Writes `profile` while holding `guard`. The guard moves into the
    /// blocking task, so the lock is released only after the rename lands,
    /// even when the calling future is dropped mid-write.
    async fn save(
        &self,
        user_id: &str,
        profile: Profile,
        guard: OwnedMutexGuard<()>,
    ) -> Result<Profile, AppError> {
        let store = self.store.clone();
        let key = user_id.to_string();
        run_blocking(move || {
            let _guard = guard;
            store.save(&key, &profile).map(|()| profile)
        })
        .await?
    }
}

/// Store I/O is blocking; keep it off the async workers.
async fn run_blocking<T, E, F>(f: F) -> Result<Result<T, AppError>, AppError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f().map_err(Into::into))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("storage task failed: {e}")))
}

fn profile_not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!("Profile not found for user {user_id}"))
}

fn entity_not_found<E: ProfileEntity>(user_id: &str, entity_id: &str) -> AppError {
    AppError::NotFound(format!("{} {entity_id} not found for user {user_id}", E::LABEL))
}
