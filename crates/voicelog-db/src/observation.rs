//! Persistence of the observation config.

use std::collections::BTreeSet;

use voicelog_types::{GroupId, ObservationConfig, RoomId};

use crate::codec;
use crate::error::StoreError;
use crate::keys;
use crate::kv::KeyValueStore;

/// Load the observed groups and excluded rooms. Missing or malformed keys
/// load as empty sets.
///
/// # Errors
///
/// Returns [`StoreError`] if the store read fails.
pub async fn load_observation(store: &dyn KeyValueStore) -> Result<ObservationConfig, StoreError> {
    let blobs = store
        .get_many(&[keys::OBSERVED_GROUPS, keys::EXCLUDED_ROOMS])
        .await?;
    let mut blobs = blobs.into_iter();
    let groups_blob = blobs.next().flatten();
    let rooms_blob = blobs.next().flatten();

    let observed_groups: BTreeSet<GroupId> =
        codec::decode_or_default(keys::OBSERVED_GROUPS, groups_blob.as_deref());
    let excluded_rooms: BTreeSet<RoomId> =
        codec::decode_or_default(keys::EXCLUDED_ROOMS, rooms_blob.as_deref());
    Ok(ObservationConfig {
        observed_groups,
        excluded_rooms,
    })
}

/// Write both observation keys in one multi-key write.
///
/// # Errors
///
/// Returns [`StoreError`] if encoding or the write fails.
pub async fn save_observation(
    store: &dyn KeyValueStore,
    config: &ObservationConfig,
) -> Result<(), StoreError> {
    store
        .set_many(vec![
            (
                keys::OBSERVED_GROUPS.to_owned(),
                codec::encode(&config.observed_groups)?,
            ),
            (
                keys::EXCLUDED_ROOMS.to_owned(),
                codec::encode(&config.excluded_rooms)?,
            ),
        ])
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::kv::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn empty_store_loads_empty_config() {
        let store = MemoryStore::new();
        let config = load_observation(&store).await.unwrap();
        assert_eq!(config, ObservationConfig::default());
    }

    #[tokio::test]
    async fn saved_config_loads_back() {
        let store = MemoryStore::new();
        let mut config = ObservationConfig::default();
        config.observed_groups.insert(GroupId::new("g1"));
        config.excluded_rooms.insert(RoomId::new("r9"));

        save_observation(&store, &config).await.unwrap();
        assert_eq!(load_observation(&store).await.unwrap(), config);
    }

    #[tokio::test]
    async fn malformed_key_loads_empty() {
        let store = MemoryStore::new();
        store
            .set(keys::OBSERVED_GROUPS, "{oops".to_owned())
            .await
            .unwrap();
        store
            .set(keys::EXCLUDED_ROOMS, "[\"r1\"]".to_owned())
            .await
            .unwrap();

        let config = load_observation(&store).await.unwrap();
        assert!(config.observed_groups.is_empty());
        assert!(config.is_excluded(&RoomId::new("r1")));
    }
}
