use std::collections::BTreeMap;

use models::EntityKind;
use crate::errors::ServiceError;
use crate::storage::Storage;

/// Stored entity counts keyed by collection name (`amenities`, `cities`, ...).
pub async fn object_counts(storage: &dyn Storage) -> Result<BTreeMap<&'static str, usize>, ServiceError> {
    let mut counts = BTreeMap::new();
    for kind in EntityKind::ALL {
        counts.insert(kind.plural(), storage.count(Some(kind)).await?);
    }
    Ok(counts)
}
