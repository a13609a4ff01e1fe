//! Domain records held by the storage engines.
//!
//! Every record embeds a [`BaseModel`] carrying its identity and timestamps.
//! [`Object`] is the closed set of records an engine stores; it serialises
//! as a flat map tagged with `__class__`.

use std::collections::BTreeSet;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::kind::{EntityKind, StorageKey};
use crate::password::{Password, PasswordHasher};

/// Identity and timestamps shared by every entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseModel {
    pub id: Uuid,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl BaseModel {
    pub fn new() -> Self {
        let now = now();
        Self { id: Uuid::new_v4(), created_at: now, updated_at: now }
    }

    /// Refresh `updated_at`; call before registering a modified entity again.
    pub fn touch(&mut self) {
        self.updated_at = now().max(self.created_at);
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Current time at the microsecond precision both engines persist.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseModel,
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self { base: BaseModel::new(), name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseModel,
    pub state_id: Uuid,
    pub name: String,
}

impl City {
    pub fn new(state_id: Uuid, name: impl Into<String>) -> Self {
        Self { base: BaseModel::new(), state_id, name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,
    pub email: String,
    /// Plaintext until a storage engine registers the user; a one-way hash afterwards.
    #[serde(default)]
    pub password: Password,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base: BaseModel::new(),
            email: email.into(),
            password: Password::plain(password),
            first_name: None,
            last_name: None,
        }
    }

    /// Replace a non-empty plaintext password with its hash. Existing hashes are left alone.
    pub fn hash_password(&mut self, hasher: &PasswordHasher) -> Result<(), ModelError> {
        hasher.seal(&mut self.password)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseModel,
    pub name: String,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { base: BaseModel::new(), name: name.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseModel,
    pub city_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub number_rooms: i32,
    #[serde(default)]
    pub number_bathrooms: i32,
    #[serde(default)]
    pub max_guest: i32,
    #[serde(default)]
    pub price_by_night: i32,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Linked amenities (many-to-many).
    #[serde(default)]
    pub amenity_ids: BTreeSet<Uuid>,
}

impl Place {
    pub fn new(city_id: Uuid, user_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            base: BaseModel::new(),
            city_id,
            user_id,
            name: name.into(),
            description: None,
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: None,
            longitude: None,
            amenity_ids: BTreeSet::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseModel,
    pub place_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
}

impl Review {
    pub fn new(place_id: Uuid, user_id: Uuid, text: impl Into<String>) -> Self {
        Self { base: BaseModel::new(), place_id, user_id, text: text.into() }
    }
}

/// Any entity an engine can store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "__class__")]
pub enum Object {
    Amenity(Amenity),
    City(City),
    Place(Place),
    Review(Review),
    State(State),
    User(User),
}

impl Object {
    pub fn kind(&self) -> EntityKind {
        match self {
            Object::Amenity(_) => EntityKind::Amenity,
            Object::City(_) => EntityKind::City,
            Object::Place(_) => EntityKind::Place,
            Object::Review(_) => EntityKind::Review,
            Object::State(_) => EntityKind::State,
            Object::User(_) => EntityKind::User,
        }
    }

    pub fn base(&self) -> &BaseModel {
        match self {
            Object::Amenity(e) => &e.base,
            Object::City(e) => &e.base,
            Object::Place(e) => &e.base,
            Object::Review(e) => &e.base,
            Object::State(e) => &e.base,
            Object::User(e) => &e.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseModel {
        match self {
            Object::Amenity(e) => &mut e.base,
            Object::City(e) => &mut e.base,
            Object::Place(e) => &mut e.base,
            Object::Review(e) => &mut e.base,
            Object::State(e) => &mut e.base,
            Object::User(e) => &mut e.base,
        }
    }

    pub fn id(&self) -> Uuid {
        self.base().id
    }

    pub fn key(&self) -> StorageKey {
        StorageKey::new(self.kind(), self.id())
    }

    pub fn touch(&mut self) {
        self.base_mut().touch();
    }

    /// Apply the at-rest password transform; a no-op for every kind but `User`.
    pub fn hash_password(&mut self, hasher: &PasswordHasher) -> Result<(), ModelError> {
        match self {
            Object::User(user) => user.hash_password(hasher),
            _ => Ok(()),
        }
    }
}

/// Typed access to one variant of [`Object`].
pub trait DomainEntity: Clone + Into<Object> + TryFrom<Object, Error = ModelError> {
    const KIND: EntityKind;

    fn base(&self) -> &BaseModel;

    fn key(&self) -> StorageKey {
        StorageKey::new(Self::KIND, self.base().id)
    }
}

macro_rules! domain_entity {
    ($($ty:ident),+ $(,)?) => {$(
        impl DomainEntity for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn base(&self) -> &BaseModel {
                &self.base
            }
        }

        impl From<$ty> for Object {
            fn from(value: $ty) -> Self {
                Object::$ty(value)
            }
        }

        impl TryFrom<Object> for $ty {
            type Error = ModelError;

            fn try_from(value: Object) -> Result<Self, Self::Error> {
                match value {
                    Object::$ty(inner) => Ok(inner),
                    other => Err(ModelError::KindMismatch { expected: EntityKind::$ty, found: other.kind() }),
                }
            }
        }
    )+};
}

domain_entity!(Amenity, City, Place, Review, State, User);

/// `%Y-%m-%dT%H:%M:%S%.6f` in UTC; RFC 3339 is accepted on input.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
    // fraction optional, any length
    const LENIENT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(raw, LENIENT)
            .map(|naive| naive.and_utc())
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc)))
            .map(|dt| dt.trunc_subsecs(6))
    }
}
