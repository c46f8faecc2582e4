use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::models::profile::{Accomplishment, Job, Profile, Project, Skill};

/// A child record of [`Profile`] that lives in one of its ordered collections.
///
/// Everything the service and the HTTP layer do with jobs, skills, projects
/// and accomplishments goes through this trait, so the four collections
/// cannot drift apart in behavior.
pub trait ProfileEntity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Prefix of generated ids: `{ID_PREFIX}-{8 hex chars}`.
    const ID_PREFIX: &'static str;
    /// Human-readable name used in error messages.
    const LABEL: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn collection(profile: &Profile) -> &Vec<Self>;
    fn collection_mut(profile: &mut Profile) -> &mut Vec<Self>;
}

impl ProfileEntity for Job {
    const ID_PREFIX: &'static str = "job";
    const LABEL: &'static str = "Job";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn collection(profile: &Profile) -> &Vec<Self> {
        &profile.jobs
    }
    fn collection_mut(profile: &mut Profile) -> &mut Vec<Self> {
        &mut profile.jobs
    }
}

impl ProfileEntity for Skill {
    const ID_PREFIX: &'static str = "skill";
    const LABEL: &'static str = "Skill";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn collection(profile: &Profile) -> &Vec<Self> {
        &profile.skills
    }
    fn collection_mut(profile: &mut Profile) -> &mut Vec<Self> {
        &mut profile.skills
    }
}

impl ProfileEntity for Project {
    const ID_PREFIX: &'static str = "project";
    const LABEL: &'static str = "Project";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn collection(profile: &Profile) -> &Vec<Self> {
        &profile.projects
    }
    fn collection_mut(profile: &mut Profile) -> &mut Vec<Self> {
        &mut profile.projects
    }
}

impl ProfileEntity for Accomplishment {
    const ID_PREFIX: &'static str = "accomplishment";
    const LABEL: &'static str = "Accomplishment";

    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn collection(profile: &Profile) -> &Vec<Self> {
        &profile.accomplishments
    }
    fn collection_mut(profile: &mut Profile) -> &mut Vec<Self> {
        &mut profile.accomplishments
    }
}

/// `{prefix}-{8 lowercase hex chars}` taken from a random v4 UUID.
/// Uniqueness is probabilistic; nothing checks for collisions at write time.
pub fn generate_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &hex[..8])
}

pub fn find_entity<'a, E: ProfileEntity>(profile: &'a Profile, id: &str) -> Option<&'a E> {
    E::collection(profile).iter().find(|existing| existing.id() == id)
}

/// Appends `entity`, assigning a generated id when it has none.
pub fn append_entity<E: ProfileEntity>(profile: &mut Profile, mut entity: E) -> E {
    if entity.id().is_empty() {
        entity.set_id(generate_id(E::ID_PREFIX));
    }
    E::collection_mut(profile).push(entity.clone());
    entity
}

/// Overwrites the first entity whose id is `id`, keeping that id.
/// Returns `None` when no entity matches; no upsert.
pub fn replace_entity<E: ProfileEntity>(profile: &mut Profile, id: &str, mut entity: E) -> Option<E> {
    let slot = E::collection_mut(profile)
        .iter_mut()
        .find(|existing| existing.id() == id)?;
    entity.set_id(id.to_string());
    *slot = entity.clone();
    Some(entity)
}

/// Drops every entity whose id is `id`. Returns whether anything was removed.
/// References to the removed id held by other records are left in place.
pub fn remove_entity<E: ProfileEntity>(profile: &mut Profile, id: &str) -> bool {
    let items = E::collection_mut(profile);
    let before = items.len();
    items.retain(|existing| existing.id() != id);
    items.len() != before
}
