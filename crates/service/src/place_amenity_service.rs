use uuid::Uuid;
use tracing::info;

use models::{Amenity, EntityKind, Place, StorageKey};
use crate::errors::ServiceError;
use crate::storage::{fetch, Storage};

/// Result of linking an amenity to a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyLinked,
}

async fn require_place(storage: &dyn Storage, place_id: Uuid) -> Result<Place, ServiceError> {
    fetch::<Place>(storage, place_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(StorageKey::new(EntityKind::Place, place_id)))
}

async fn require_amenity(storage: &dyn Storage, amenity_id: Uuid) -> Result<Amenity, ServiceError> {
    fetch::<Amenity>(storage, amenity_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(StorageKey::new(EntityKind::Amenity, amenity_id)))
}

/// Amenities linked to a place. Links to amenities that no longer exist are skipped.
pub async fn list_place_amenities(storage: &dyn Storage, place_id: Uuid) -> Result<Vec<Amenity>, ServiceError> {
    let place = require_place(storage, place_id).await?;
    let mut amenities = Vec::with_capacity(place.amenity_ids.len());
    for amenity_id in &place.amenity_ids {
        if let Some(amenity) = fetch::<Amenity>(storage, *amenity_id).await? {
            amenities.push(amenity);
        }
    }
    Ok(amenities)
}

/// Link an amenity to a place and persist.
pub async fn link_amenity(
    storage: &dyn Storage,
    place_id: Uuid,
    amenity_id: Uuid,
) -> Result<(Amenity, LinkOutcome), ServiceError> {
    let mut place = require_place(storage, place_id).await?;
    let amenity = require_amenity(storage, amenity_id).await?;
    if !place.amenity_ids.insert(amenity_id) {
        return Ok((amenity, LinkOutcome::AlreadyLinked));
    }
    place.base.touch();
    storage.new(place.into()).await?;
    storage.save().await?;
    info!(%place_id, %amenity_id, "amenity linked");
    Ok((amenity, LinkOutcome::Created))
}

/// Remove the link between a place and an amenity and persist.
pub async fn unlink_amenity(storage: &dyn Storage, place_id: Uuid, amenity_id: Uuid) -> Result<(), ServiceError> {
    let mut place = require_place(storage, place_id).await?;
    require_amenity(storage, amenity_id).await?;
    if !place.amenity_ids.remove(&amenity_id) {
        return Err(ServiceError::NotFound(format!("amenity {} is not linked to place {}", amenity_id, place_id)));
    }
    place.base.touch();
    storage.new(place.into()).await?;
    storage.save().await?;
    info!(%place_id, %amenity_id, "amenity unlinked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;
    use models::password::{PasswordAlgorithm, PasswordHasher};
    use models::{City, State, User};

    async fn seeded() -> Result<(FileStorage, Place, Amenity), anyhow::Error> {
        let path = std::env::temp_dir().join(format!("hbnb_links_{}.json", Uuid::new_v4()));
        let storage = FileStorage::open(path, PasswordHasher::new(PasswordAlgorithm::Sha256));
        storage.reload().await?;

        let state = State::new("Colorado");
        let city = City::new(state.base.id, "Denver");
        let host = User::new("host@example.com", "pw");
        let place = Place::new(city.base.id, host.base.id, "Condo");
        let amenity = Amenity::new("Fireplace");
        storage.new(state.into()).await?;
        storage.new(city.into()).await?;
        storage.new(host.into()).await?;
        storage.new(place.clone().into()).await?;
        storage.new(amenity.clone().into()).await?;
        storage.save().await?;
        Ok((storage, place, amenity))
    }

    #[tokio::test]
    async fn link_then_relink_then_unlink() -> Result<(), anyhow::Error> {
        let (storage, place, amenity) = seeded().await?;
        let id = place.base.id;

        assert!(list_place_amenities(&storage, id).await?.is_empty());

        let (linked, outcome) = link_amenity(&storage, id, amenity.base.id).await?;
        assert_eq!(outcome, LinkOutcome::Created);
        assert_eq!(linked, amenity);

        let (_, outcome) = link_amenity(&storage, id, amenity.base.id).await?;
        assert_eq!(outcome, LinkOutcome::AlreadyLinked);
        assert_eq!(list_place_amenities(&storage, id).await?, vec![amenity.clone()]);

        // survives a reload from disk
        storage.reload().await?;
        assert_eq!(list_place_amenities(&storage, id).await?, vec![amenity.clone()]);

        unlink_amenity(&storage, id, amenity.base.id).await?;
        assert!(list_place_amenities(&storage, id).await?.is_empty());

        let err = unlink_amenity(&storage, id, amenity.base.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let _ = tokio::fs::remove_file(storage.file_path()).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_place_or_amenity_is_not_found() -> Result<(), anyhow::Error> {
        let (storage, place, amenity) = seeded().await?;

        let err = list_place_amenities(&storage, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = link_amenity(&storage, Uuid::new_v4(), amenity.base.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = link_amenity(&storage, place.base.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = unlink_amenity(&storage, place.base.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let _ = tokio::fs::remove_file(storage.file_path()).await;
        Ok(())
    }

    #[tokio::test]
    async fn dangling_links_are_skipped() -> Result<(), anyhow::Error> {
        let (storage, place, amenity) = seeded().await?;
        link_amenity(&storage, place.base.id, amenity.base.id).await?;

        storage.delete(Some(&amenity.clone().into())).await?;
        storage.save().await?;
        assert!(list_place_amenities(&storage, place.base.id).await?.is_empty());

        let _ = tokio::fs::remove_file(storage.file_path()).await;
        Ok(())
    }
}
