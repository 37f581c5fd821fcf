//! Sync participation for replicated records.
//!
//! Records that take part in peer synchronization carry a stable identity derived
//! from their owner and the item they describe, plus a counter bumped on every
//! update so a sync engine can tell which revision it has seen.

use std::sync::{LazyLock, RwLock};

use uuid::Uuid;

use crate::model::entity::{ExerciseLog, VideoLog};

static SYNCING_MODELS: LazyLock<RwLock<Vec<&'static str>>> =
    LazyLock::new(|| RwLock::new(Vec::new()));

pub trait SyncedModel {
    /// Name the record kind is registered under.
    const MODEL_NAME: &'static str;

    fn sync_id(&self) -> Uuid;

    fn counter(&self) -> i64;
}

/// Version-5 uuid of `name` inside the namespace of `owner`.
///
/// Records without an owner have no stable identity across devices, so they get a
/// random id instead.
pub fn derive_sync_uuid(owner: Option<Uuid>, name: &str) -> Uuid {
    match owner {
        Some(namespace) => Uuid::new_v5(&namespace, name.as_bytes()),
        None => Uuid::new_v4(),
    }
}

pub fn add_syncing_models(models: &[&'static str]) {
    let mut registered = SYNCING_MODELS
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    for model in models {
        if !registered.contains(model) {
            tracing::debug!("registering syncing model {}", model);
            registered.push(model);
        }
    }
}

pub fn syncing_models() -> Vec<&'static str> {
    SYNCING_MODELS
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

pub fn is_syncing_model(name: &str) -> bool {
    syncing_models().iter().any(|model| *model == name)
}

/// Declares the progress logs as synced record kinds. Safe to call repeatedly.
pub fn register_syncing_models() {
    add_syncing_models(&[VideoLog::MODEL_NAME, ExerciseLog::MODEL_NAME]);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        let user = Uuid::new_v4();
        assert_eq!(
            derive_sync_uuid(Some(user), "dQw4w9WgXcQ"),
            derive_sync_uuid(Some(user), "dQw4w9WgXcQ")
        );
    }

    #[test]
    fn derive_distinct_items_differ() {
        let user = Uuid::new_v4();
        assert_ne!(
            derive_sync_uuid(Some(user), "addition_1"),
            derive_sync_uuid(Some(user), "addition_2")
        );
    }

    #[test]
    fn derive_distinct_users_differ() {
        assert_ne!(
            derive_sync_uuid(Some(Uuid::new_v4()), "addition_1"),
            derive_sync_uuid(Some(Uuid::new_v4()), "addition_1")
        );
    }

    #[test]
    fn derive_is_version_5() {
        let id = derive_sync_uuid(Some(Uuid::new_v4()), "addition_1");
        assert_eq!(id.get_version_num(), 5);
    }

    #[test]
    fn derive_known_vector() {
        // uuid5(NAMESPACE_DNS, "python.org")
        let id = derive_sync_uuid(Some(Uuid::NAMESPACE_DNS), "python.org");
        assert_eq!(id.simple().to_string(), "886313e13b8a53729b900c9aee199e5d");
    }

    #[test]
    fn derive_without_owner_is_random() {
        let a = derive_sync_uuid(None, "addition_1");
        let b = derive_sync_uuid(None, "addition_1");
        assert_ne!(a, b);
        assert_eq!(a.get_version_num(), 4);
    }

    #[test]
    fn registration_is_idempotent() {
        register_syncing_models();
        register_syncing_models();

        let models = syncing_models();
        let video_logs = models.iter().filter(|m| **m == VideoLog::MODEL_NAME).count();
        assert_eq!(video_logs, 1);
        assert!(is_syncing_model(ExerciseLog::MODEL_NAME));
        assert!(!is_syncing_model("VideoFile"));
    }
}
