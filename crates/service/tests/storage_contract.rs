//! The same contract scenarios run against both engines.

use std::path::{Path, PathBuf};

use configs::{DatabaseConfig, PasswordAlgorithm};
use models::password::PasswordHasher;
use models::{Amenity, City, EntityKind, Object, Place, Review, State, User};
use service::errors::ServiceError;
use service::place_amenity_service::{link_amenity, list_place_amenities, unlink_amenity, LinkOutcome};
use service::stats_service::object_counts;
use service::storage::{DbStorage, FileStorage, Storage};
use uuid::Uuid;

fn sha256() -> PasswordHasher {
    PasswordHasher::new(PasswordAlgorithm::Sha256)
}

fn temp_file() -> PathBuf {
    std::env::temp_dir().join(format!("hbnb_contract_{}.json", Uuid::new_v4()))
}

fn temp_sqlite() -> DatabaseConfig {
    let path = std::env::temp_dir().join(format!("hbnb_contract_{}.db", Uuid::new_v4()));
    DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: 1,
        min_connections: 1,
        ..DatabaseConfig::default()
    }
}

async fn file_engine(path: &Path, hasher: PasswordHasher) -> Result<FileStorage, ServiceError> {
    let storage = FileStorage::open(path, hasher);
    storage.reload().await?;
    Ok(storage)
}

async fn db_engine(cfg: &DatabaseConfig, hasher: PasswordHasher) -> Result<DbStorage, ServiceError> {
    let storage = DbStorage::connect(cfg, hasher, false).await?;
    storage.reload().await?;
    Ok(storage)
}

fn skip_db() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok()
}

/// A small connected graph: state, city, user, two amenities, place, review.
fn graph() -> Vec<Object> {
    let state = State::new("California");
    let city = City::new(state.base.id, "San Francisco");
    let user = User::new("guest@example.com", "pw");
    let wifi = Amenity::new("Wifi");
    let pool = Amenity::new("Pool");
    let mut place = Place::new(city.base.id, user.base.id, "Loft");
    place.description = Some("Near the bay".into());
    place.number_rooms = 2;
    place.number_bathrooms = 1;
    place.max_guest = 4;
    place.price_by_night = 150;
    place.latitude = Some(37.7749);
    place.longitude = Some(-122.4194);
    place.amenity_ids.insert(wifi.base.id);
    place.amenity_ids.insert(pool.base.id);
    let review = Review::new(place.base.id, user.base.id, "Great stay");
    vec![
        state.into(),
        city.into(),
        user.into(),
        wifi.into(),
        pool.into(),
        place.into(),
        review.into(),
    ]
}

/// Stored form of `object`: identical except for the user's password.
fn assert_stored_as(stored: &Object, original: &Object) {
    match (stored, original) {
        (Object::User(s), Object::User(o)) => {
            assert_eq!(s.base, o.base);
            assert_eq!(s.email, o.email);
            assert!(s.password.is_hashed());
            assert_ne!(s.password.as_str(), o.password.as_str());
            assert_eq!((&s.first_name, &s.last_name), (&o.first_name, &o.last_name));
        }
        _ => assert_eq!(stored, original),
    }
}

async fn round_trip_and_queries(storage: &dyn Storage) -> Result<(), anyhow::Error> {
    let objects = graph();
    for object in &objects {
        storage.new(object.clone()).await?;
    }
    storage.save().await?;

    for object in &objects {
        let stored = storage.get(object.kind(), object.id()).await?.expect("stored object");
        assert_stored_as(&stored, object);
    }
    assert!(storage.get(EntityKind::State, Uuid::new_v4()).await?.is_none());
    // same id, other kind
    assert!(storage.get(EntityKind::City, objects[0].id()).await?.is_none());

    let all = storage.all(None).await?;
    assert_eq!(all.len(), objects.len());
    for (key, object) in &all {
        assert_eq!(*key, object.key());
    }
    assert_eq!(storage.count(None).await?, all.len());

    for kind in EntityKind::ALL {
        let of_kind = storage.all(Some(kind)).await?;
        assert!(of_kind.keys().all(|key| key.kind == kind));
        assert!(of_kind.values().all(|object| object.kind() == kind));
        assert_eq!(storage.count(Some(kind)).await?, of_kind.len());
    }
    assert_eq!(storage.count(Some(EntityKind::Amenity)).await?, 2);
    Ok(())
}

async fn delete_removes_exactly_one(storage: &dyn Storage) -> Result<(), anyhow::Error> {
    let objects = graph();
    for object in &objects {
        storage.new(object.clone()).await?;
    }
    storage.save().await?;

    let review = objects.last().expect("review").clone();
    let before = storage.count(None).await?;
    storage.delete(Some(&review)).await?;
    storage.save().await?;
    assert_eq!(storage.count(None).await?, before - 1);
    assert!(storage.get(EntityKind::Review, review.id()).await?.is_none());

    storage.delete(None).await?;
    storage.save().await?;
    assert_eq!(storage.count(None).await?, before - 1);
    Ok(())
}

async fn update_then_save(storage: &dyn Storage) -> Result<(), anyhow::Error> {
    let mut state = State::new("Nevada");
    storage.new(state.clone().into()).await?;
    storage.save().await?;

    state.name = "Silver State".into();
    state.base.touch();
    storage.new(state.clone().into()).await?;
    storage.save().await?;

    assert_eq!(storage.count(Some(EntityKind::State)).await?, 1);
    let stored = storage.get(EntityKind::State, state.base.id).await?;
    assert_eq!(stored, Some(state.into()));
    Ok(())
}

const HEX_PLAINTEXT: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

async fn password_is_hashed_at_rest(storage: &dyn Storage, hasher: PasswordHasher) -> Result<(), anyhow::Error> {
    let user = User::new("a@b.com", "secret");
    storage.new(user.clone().into()).await?;
    storage.save().await?;

    let stored = match storage.get(EntityKind::User, user.base.id).await? {
        Some(Object::User(u)) => u,
        other => panic!("expected a user, got {other:?}"),
    };
    assert_eq!(stored.email, "a@b.com");
    assert_ne!(stored.password.as_str(), "secret");
    assert!(hasher.verify("secret", stored.password.as_str()));
    if hasher.algorithm() == PasswordAlgorithm::Sha256 {
        assert_eq!(stored.password.as_str().len(), 64);
        assert!(stored.password.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    // a plaintext that looks like a digest is hashed all the same
    let lookalike = User::new("hex@b.com", HEX_PLAINTEXT);
    storage.new(lookalike.clone().into()).await?;
    storage.save().await?;
    match storage.get(EntityKind::User, lookalike.base.id).await? {
        Some(Object::User(u)) => {
            assert_ne!(u.password.as_str(), HEX_PLAINTEXT);
            assert!(hasher.verify(HEX_PLAINTEXT, u.password.as_str()));
        }
        other => panic!("expected a user, got {other:?}"),
    }

    // saving again does not rehash
    storage.new(Object::User(stored.clone())).await?;
    storage.save().await?;
    match storage.get(EntityKind::User, user.base.id).await? {
        Some(Object::User(u)) => assert_eq!(u.password, stored.password),
        other => panic!("expected a user, got {other:?}"),
    }
    Ok(())
}

async fn stats_cover_every_kind(storage: &dyn Storage) -> Result<(), anyhow::Error> {
    for object in graph() {
        storage.new(object).await?;
    }
    storage.save().await?;
    let counts = object_counts(storage).await?;
    let expected = [("amenities", 2), ("cities", 1), ("places", 1), ("reviews", 1), ("states", 1), ("users", 1)];
    assert_eq!(counts.into_iter().collect::<Vec<_>>(), expected.to_vec());
    Ok(())
}

async fn place_amenity_link_and_unlink(storage: &dyn Storage) -> Result<(), anyhow::Error> {
    let state = State::new("Washington");
    let city = City::new(state.base.id, "Seattle");
    let host = User::new("host@example.com", "pw");
    let place = Place::new(city.base.id, host.base.id, "Houseboat");
    let linked = Amenity::new("Dock");
    let other = Amenity::new("Garage");
    let objects: [Object; 6] =
        [state.into(), city.into(), host.into(), place.clone().into(), linked.clone().into(), other.into()];
    for object in objects {
        storage.new(object).await?;
    }
    storage.save().await?;

    let (_, outcome) = link_amenity(storage, place.base.id, linked.base.id).await?;
    assert_eq!(outcome, LinkOutcome::Created);
    assert_eq!(list_place_amenities(storage, place.base.id).await?, vec![linked.clone()]);

    unlink_amenity(storage, place.base.id, linked.base.id).await?;
    assert!(list_place_amenities(storage, place.base.id).await?.is_empty());
    assert_eq!(storage.count(Some(EntityKind::Amenity)).await?, 2);
    Ok(())
}

#[tokio::test]
async fn file_place_amenity_link_and_unlink() -> Result<(), anyhow::Error> {
    let path = temp_file();
    place_amenity_link_and_unlink(&file_engine(&path, sha256()).await?).await?;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn db_place_amenity_link_and_unlink() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    place_amenity_link_and_unlink(&db_engine(&temp_sqlite(), sha256()).await?).await
}

#[tokio::test]
async fn file_round_trip_and_queries() -> Result<(), anyhow::Error> {
    let path = temp_file();
    round_trip_and_queries(&file_engine(&path, sha256()).await?).await?;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn db_round_trip_and_queries() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    round_trip_and_queries(&db_engine(&temp_sqlite(), sha256()).await?).await
}

#[tokio::test]
async fn file_delete_removes_exactly_one() -> Result<(), anyhow::Error> {
    let path = temp_file();
    delete_removes_exactly_one(&file_engine(&path, sha256()).await?).await?;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn db_delete_removes_exactly_one() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    delete_removes_exactly_one(&db_engine(&temp_sqlite(), sha256()).await?).await
}

#[tokio::test]
async fn file_update_then_save() -> Result<(), anyhow::Error> {
    let path = temp_file();
    update_then_save(&file_engine(&path, sha256()).await?).await?;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn db_update_then_save() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    update_then_save(&db_engine(&temp_sqlite(), sha256()).await?).await
}

#[tokio::test]
async fn file_password_hashed_at_rest() -> Result<(), anyhow::Error> {
    for algorithm in [PasswordAlgorithm::Sha256, PasswordAlgorithm::Argon2] {
        let path = temp_file();
        let hasher = PasswordHasher::new(algorithm);
        password_is_hashed_at_rest(&file_engine(&path, hasher).await?, hasher).await?;

        let raw = tokio::fs::read_to_string(&path).await?;
        assert!(!raw.contains("\"secret\""));
        assert!(!raw.contains(HEX_PLAINTEXT));
        let _ = tokio::fs::remove_file(&path).await;
    }
    Ok(())
}

#[tokio::test]
async fn db_password_hashed_at_rest() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    for algorithm in [PasswordAlgorithm::Sha256, PasswordAlgorithm::Argon2] {
        let hasher = PasswordHasher::new(algorithm);
        password_is_hashed_at_rest(&db_engine(&temp_sqlite(), hasher).await?, hasher).await?;
    }
    Ok(())
}

#[tokio::test]
async fn file_stats_cover_every_kind() -> Result<(), anyhow::Error> {
    let path = temp_file();
    stats_cover_every_kind(&file_engine(&path, sha256()).await?).await?;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn db_stats_cover_every_kind() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    stats_cover_every_kind(&db_engine(&temp_sqlite(), sha256()).await?).await
}

#[tokio::test]
async fn file_save_is_idempotent() -> Result<(), anyhow::Error> {
    let path = temp_file();
    let storage = file_engine(&path, PasswordHasher::default()).await?;
    for object in graph() {
        storage.new(object).await?;
    }
    storage.save().await?;
    let first = tokio::fs::read(&path).await?;
    storage.save().await?;
    let second = tokio::fs::read(&path).await?;
    assert_eq!(first, second);

    // a reload followed by save writes the same bytes again
    storage.reload().await?;
    storage.save().await?;
    assert_eq!(tokio::fs::read(&path).await?, first);
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn db_save_is_idempotent() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    let storage = db_engine(&temp_sqlite(), PasswordHasher::default()).await?;
    for object in graph() {
        storage.new(object).await?;
    }
    storage.save().await?;
    let first = storage.all(None).await?;
    storage.save().await?;
    assert_eq!(storage.all(None).await?, first);
    Ok(())
}

#[tokio::test]
async fn file_restart_durability() -> Result<(), anyhow::Error> {
    let path = temp_file();
    let objects = graph();
    {
        let storage = file_engine(&path, sha256()).await?;
        for object in &objects {
            storage.new(object.clone()).await?;
        }
        storage.save().await?;
        storage.close().await?;
    }

    let fresh = file_engine(&path, sha256()).await?;
    for object in &objects {
        let stored = fresh.get(object.kind(), object.id()).await?.expect("durable object");
        assert_stored_as(&stored, object);
    }
    assert_eq!(fresh.count(None).await?, objects.len());
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn db_restart_durability() -> Result<(), anyhow::Error> {
    if skip_db() { return Ok(()); }
    let cfg = temp_sqlite();
    let objects = graph();
    {
        let storage = db_engine(&cfg, sha256()).await?;
        for object in &objects {
            storage.new(object.clone()).await?;
        }
        storage.save().await?;
        storage.close().await?;
    }

    let fresh = db_engine(&cfg, sha256()).await?;
    for object in &objects {
        let stored = fresh.get(object.kind(), object.id()).await?.expect("durable object");
        assert_stored_as(&stored, object);
    }
    assert_eq!(fresh.count(None).await?, objects.len());
    Ok(())
}
