use uuid::Uuid;

use crate::entity::{Amenity, BaseModel, City, DomainEntity, Object, Place, State, User};
use crate::errors::ModelError;
use crate::kind::{EntityKind, StorageKey};
use crate::password::{PasswordAlgorithm, PasswordHasher};

#[test]
fn new_entities_get_unique_ids_and_equal_timestamps() {
    let a = State::new("Nevada");
    let b = State::new("Nevada");
    assert_ne!(a.base.id, b.base.id);
    assert_eq!(a.base.created_at, a.base.updated_at);
    assert_eq!(a.base.created_at.timestamp_subsec_nanos() % 1_000, 0);
}

#[test]
fn touch_moves_updated_at_forward_only() {
    let mut base = BaseModel::new();
    let created = base.created_at;
    std::thread::sleep(std::time::Duration::from_millis(2));
    base.touch();
    assert_eq!(base.created_at, created);
    assert!(base.updated_at > created);
}

#[test]
fn object_key_matches_kind_and_id() {
    let amenity = Amenity::new("Pool");
    let id = amenity.base.id;
    let object = Object::from(amenity.clone());

    assert_eq!(object.kind(), EntityKind::Amenity);
    assert_eq!(object.id(), id);
    assert_eq!(object.key(), StorageKey::new(EntityKind::Amenity, id));
    assert_eq!(amenity.key(), object.key());
    assert_eq!(object.key().to_string(), format!("Amenity.{id}"));
}

#[test]
fn typed_conversion_checks_kind() {
    let city: Object = City::new(Uuid::new_v4(), "Reno").into();
    assert!(City::try_from(city.clone()).is_ok());

    let err = Place::try_from(city).unwrap_err();
    assert!(matches!(
        err,
        ModelError::KindMismatch { expected: EntityKind::Place, found: EntityKind::City }
    ));
}

#[test]
fn hash_password_only_touches_users() {
    let hasher = PasswordHasher::new(PasswordAlgorithm::Sha256);

    let mut user: Object = User::new("a@b.com", "secret").into();
    user.hash_password(&hasher).unwrap();
    let once = match &user {
        Object::User(u) => u.password.clone(),
        _ => unreachable!(),
    };
    assert!(once.is_hashed());
    assert_eq!(once.as_str().len(), 64);

    // second pass leaves the hash as is
    user.hash_password(&hasher).unwrap();
    match &user {
        Object::User(u) => assert_eq!(u.password, once),
        _ => unreachable!(),
    }

    let mut state: Object = State::new("Utah").into();
    let before = state.clone();
    state.hash_password(&hasher).unwrap();
    assert_eq!(state, before);
}

#[test]
fn serialized_object_carries_class_tag() {
    let place = Place::new(Uuid::new_v4(), Uuid::new_v4(), "Cabin");
    let value = serde_json::to_value(Object::Place(place)).unwrap();
    assert_eq!(value["__class__"], "Place");
    assert_eq!(value["number_rooms"], 0);
    assert!(value["amenity_ids"].as_array().unwrap().is_empty());
}
