//! Entity kinds and the typed `(kind, id)` storage key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::errors::ModelError;

/// The fixed set of domain types a storage engine holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Amenity,
    City,
    Place,
    Review,
    State,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Amenity,
        EntityKind::City,
        EntityKind::Place,
        EntityKind::Review,
        EntityKind::State,
        EntityKind::User,
    ];

    /// Class name, used as the `__class__` tag and as the storage key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Amenity => "Amenity",
            EntityKind::City => "City",
            EntityKind::Place => "Place",
            EntityKind::Review => "Review",
            EntityKind::State => "State",
            EntityKind::User => "User",
        }
    }

    /// Collection name used when reporting per-kind statistics.
    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Amenity => "amenities",
            EntityKind::City => "cities",
            EntityKind::Place => "places",
            EntityKind::Review => "reviews",
            EntityKind::State => "states",
            EntityKind::User => "users",
        }
    }

    /// Foreign-key depth: a kind only references kinds of strictly lower rank.
    pub fn dependency_rank(self) -> u8 {
        match self {
            EntityKind::State | EntityKind::User | EntityKind::Amenity => 0,
            EntityKind::City => 1,
            EntityKind::Place => 2,
            EntityKind::Review => 3,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ModelError::UnknownEntityKind(s.to_string()))
    }
}

/// Composite identity of a stored entity. Renders as `"<Kind>.<id>"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl StorageKey {
    pub fn new(kind: EntityKind, id: Uuid) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.id)
    }
}

impl FromStr for StorageKey {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once('.')
            .ok_or_else(|| ModelError::InvalidKey(s.to_string()))?;
        let kind = kind.parse::<EntityKind>()?;
        let id = Uuid::parse_str(id).map_err(|_| ModelError::InvalidKey(s.to_string()))?;
        Ok(Self { kind, id })
    }
}

impl Serialize for StorageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StorageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!(matches!("BaseModel".parse::<EntityKind>(), Err(ModelError::UnknownEntityKind(k)) if k == "BaseModel"));
        assert!("user".parse::<EntityKind>().is_err());
    }

    #[test]
    fn key_display_and_parse() {
        let id = Uuid::new_v4();
        let key = StorageKey::new(EntityKind::Place, id);
        let text = key.to_string();
        assert_eq!(text, format!("Place.{id}"));
        assert_eq!(text.parse::<StorageKey>().unwrap(), key);

        assert!(matches!("Place".parse::<StorageKey>(), Err(ModelError::InvalidKey(_))));
        assert!(matches!("Place.not-a-uuid".parse::<StorageKey>(), Err(ModelError::InvalidKey(_))));
        assert!(matches!(format!("Ghost.{id}").parse::<StorageKey>(), Err(ModelError::UnknownEntityKind(_))));
    }

    #[test]
    fn key_serializes_as_string() {
        let key = StorageKey::new(EntityKind::User, Uuid::new_v4());
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{key}\""));
        let back: StorageKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn references_point_to_lower_ranks() {
        assert!(EntityKind::City.dependency_rank() > EntityKind::State.dependency_rank());
        assert!(EntityKind::Place.dependency_rank() > EntityKind::City.dependency_rank());
        assert!(EntityKind::Place.dependency_rank() > EntityKind::User.dependency_rank());
        assert!(EntityKind::Review.dependency_rank() > EntityKind::Place.dependency_rank());
    }
}
