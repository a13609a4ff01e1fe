//! Relational engine backed by sea-orm.
//!
//! `new` and `delete` stage work in memory; readers only ever see committed
//! rows. `save` applies the staged batch inside one transaction: deletes
//! children-first, upserts parents-first, then commits. A failed batch is
//! rolled back and discarded.
//!
//! The staged batch belongs to the engine, not to the caller. Every task
//! sharing one `DbStorage` stages into the same batch, so any task's `save`
//! commits work staged by the others, and a failed `save` or a `close`
//! discards it. Give each unit of work its own engine when that matters.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use configs::DatabaseConfig;
use migration::{Migrator, MigratorTrait};
use models::password::PasswordHasher;
use models::{amenity, city, place, place_amenity, review, state, user};
use models::{EntityKind, Object, StorageKey};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, TransactionTrait,
};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::Storage;
use crate::errors::ServiceError;

#[derive(Debug)]
enum Pending {
    Upsert(Object),
    Delete(StorageKey),
}

impl Pending {
    fn key(&self) -> StorageKey {
        match self {
            Pending::Upsert(object) => object.key(),
            Pending::Delete(key) => *key,
        }
    }
}

pub struct DbStorage {
    db: DatabaseConnection,
    /// One batch shared by every caller of this engine.
    pending: Mutex<Vec<Pending>>,
    hasher: PasswordHasher,
    recreate_schema: bool,
}

impl DbStorage {
    /// Connect with `cfg`. With `recreate_schema`, `reload` drops and rebuilds every table.
    pub async fn connect(cfg: &DatabaseConfig, hasher: PasswordHasher, recreate_schema: bool) -> Result<Self, ServiceError> {
        let db = models::db::connect_with_config(cfg).await.map_err(ServiceError::persistence)?;
        Ok(Self::with_connection(db, hasher, recreate_schema))
    }

    pub fn with_connection(db: DatabaseConnection, hasher: PasswordHasher, recreate_schema: bool) -> Self {
        Self { db, pending: Mutex::new(Vec::new()), hasher, recreate_schema }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Last staged operation per key, as (deletes children-first, upserts parents-first).
fn collapse(ops: Vec<Pending>) -> (Vec<StorageKey>, Vec<Object>) {
    let mut latest: BTreeMap<StorageKey, Pending> = BTreeMap::new();
    for op in ops {
        latest.insert(op.key(), op);
    }

    let mut deletes = Vec::new();
    let mut upserts = Vec::new();
    for (key, op) in latest {
        match op {
            Pending::Delete(_) => deletes.push(key),
            Pending::Upsert(object) => upserts.push(object),
        }
    }
    deletes.sort_by_key(|key| Reverse(key.kind.dependency_rank()));
    upserts.sort_by_key(|object| object.kind().dependency_rank());
    (deletes, upserts)
}

async fn upsert<A, C>(
    conn: &C,
    model: A,
    id: <A::Entity as EntityTrait>::Column,
    columns: &[<A::Entity as EntityTrait>::Column],
) -> Result<(), DbErr>
where
    A: ActiveModelTrait + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    <A::Entity as EntityTrait>::insert(model)
        .on_conflict(OnConflict::column(id).update_columns(columns.iter().copied()).to_owned())
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn write_object<C: ConnectionTrait>(conn: &C, object: &Object) -> Result<(), DbErr> {
    match object {
        Object::State(e) => upsert(conn, state::active_model(e), state::Column::Id, &state::UPSERT_COLUMNS).await,
        Object::User(e) => upsert(conn, user::active_model(e), user::Column::Id, &user::UPSERT_COLUMNS).await,
        Object::Amenity(e) => {
            upsert(conn, amenity::active_model(e), amenity::Column::Id, &amenity::UPSERT_COLUMNS).await
        }
        Object::City(e) => upsert(conn, city::active_model(e), city::Column::Id, &city::UPSERT_COLUMNS).await,
        Object::Review(e) => upsert(conn, review::active_model(e), review::Column::Id, &review::UPSERT_COLUMNS).await,
        Object::Place(e) => {
            upsert(conn, place::active_model(e), place::Column::Id, &place::UPSERT_COLUMNS).await?;
            place_amenity::Entity::delete_many()
                .filter(place_amenity::Column::PlaceId.eq(e.base.id))
                .exec(conn)
                .await?;
            let links = place_amenity::active_models(e);
            if !links.is_empty() {
                place_amenity::Entity::insert_many(links).exec_without_returning(conn).await?;
            }
            Ok(())
        }
    }
}

async fn remove_object<C: ConnectionTrait>(conn: &C, key: StorageKey) -> Result<(), DbErr> {
    let id = key.id;
    match key.kind {
        EntityKind::State => state::Entity::delete_by_id(id).exec(conn).await?,
        EntityKind::User => user::Entity::delete_by_id(id).exec(conn).await?,
        EntityKind::Amenity => amenity::Entity::delete_by_id(id).exec(conn).await?,
        EntityKind::City => city::Entity::delete_by_id(id).exec(conn).await?,
        EntityKind::Review => review::Entity::delete_by_id(id).exec(conn).await?,
        EntityKind::Place => {
            place_amenity::Entity::delete_many()
                .filter(place_amenity::Column::PlaceId.eq(id))
                .exec(conn)
                .await?;
            place::Entity::delete_by_id(id).exec(conn).await?
        }
    };
    Ok(())
}

async fn load_kind<C: ConnectionTrait>(conn: &C, kind: EntityKind) -> Result<Vec<Object>, DbErr> {
    let objects: Vec<Object> = match kind {
        EntityKind::State => state::Entity::find().all(conn).await?.into_iter().map(|m| Object::State(m.into())).collect(),
        EntityKind::User => user::Entity::find().all(conn).await?.into_iter().map(|m| Object::User(m.into())).collect(),
        EntityKind::Amenity => {
            amenity::Entity::find().all(conn).await?.into_iter().map(|m| Object::Amenity(m.into())).collect()
        }
        EntityKind::City => city::Entity::find().all(conn).await?.into_iter().map(|m| Object::City(m.into())).collect(),
        EntityKind::Review => {
            review::Entity::find().all(conn).await?.into_iter().map(|m| Object::Review(m.into())).collect()
        }
        EntityKind::Place => {
            let mut links = place_amenity::group_by_place(place_amenity::Entity::find().all(conn).await?);
            place::Entity::find()
                .all(conn)
                .await?
                .into_iter()
                .map(|m| {
                    let amenity_ids = links.remove(&m.id).unwrap_or_default();
                    Object::Place(place::into_entity(m, amenity_ids))
                })
                .collect()
        }
    };
    Ok(objects)
}

async fn find_object<C: ConnectionTrait>(conn: &C, kind: EntityKind, id: Uuid) -> Result<Option<Object>, DbErr> {
    let object = match kind {
        EntityKind::State => state::Entity::find_by_id(id).one(conn).await?.map(|m| Object::State(m.into())),
        EntityKind::User => user::Entity::find_by_id(id).one(conn).await?.map(|m| Object::User(m.into())),
        EntityKind::Amenity => amenity::Entity::find_by_id(id).one(conn).await?.map(|m| Object::Amenity(m.into())),
        EntityKind::City => city::Entity::find_by_id(id).one(conn).await?.map(|m| Object::City(m.into())),
        EntityKind::Review => review::Entity::find_by_id(id).one(conn).await?.map(|m| Object::Review(m.into())),
        EntityKind::Place => match place::Entity::find_by_id(id).one(conn).await? {
            Some(m) => {
                let amenity_ids: BTreeSet<Uuid> = place_amenity::Entity::find()
                    .filter(place_amenity::Column::PlaceId.eq(id))
                    .all(conn)
                    .await?
                    .into_iter()
                    .map(|row| row.amenity_id)
                    .collect();
                Some(Object::Place(place::into_entity(m, amenity_ids)))
            }
            None => None,
        },
    };
    Ok(object)
}

async fn count_kind<C: ConnectionTrait>(conn: &C, kind: EntityKind) -> Result<u64, DbErr> {
    match kind {
        EntityKind::State => state::Entity::find().count(conn).await,
        EntityKind::User => user::Entity::find().count(conn).await,
        EntityKind::Amenity => amenity::Entity::find().count(conn).await,
        EntityKind::City => city::Entity::find().count(conn).await,
        EntityKind::Review => review::Entity::find().count(conn).await,
        EntityKind::Place => place::Entity::find().count(conn).await,
    }
}

#[async_trait]
impl Storage for DbStorage {
    async fn all(&self, kind: Option<EntityKind>) -> Result<BTreeMap<StorageKey, Object>, ServiceError> {
        let kinds = match kind {
            Some(k) => vec![k],
            None => EntityKind::ALL.to_vec(),
        };
        let mut objects = BTreeMap::new();
        for k in kinds {
            for object in load_kind(&self.db, k).await.map_err(ServiceError::persistence)? {
                objects.insert(object.key(), object);
            }
        }
        Ok(objects)
    }

    async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Option<Object>, ServiceError> {
        find_object(&self.db, kind, id).await.map_err(ServiceError::persistence)
    }

    async fn new(&self, mut object: Object) -> Result<(), ServiceError> {
        object.hash_password(&self.hasher)?;
        debug!(key = %object.key(), "staged upsert");
        self.pending.lock().await.push(Pending::Upsert(object));
        Ok(())
    }

    #[instrument(skip(self))]
    async fn save(&self) -> Result<(), ServiceError> {
        // held until commit so batches land in staging order
        let mut pending = self.pending.lock().await;
        if pending.is_empty() {
            return Ok(());
        }
        let (deletes, upserts) = collapse(std::mem::take(&mut *pending));

        let txn = self.db.begin().await.map_err(ServiceError::persistence)?;
        let mut applied: Result<(), DbErr> = Ok(());
        for key in &deletes {
            applied = remove_object(&txn, *key).await;
            if applied.is_err() {
                break;
            }
        }
        if applied.is_ok() {
            for object in &upserts {
                applied = write_object(&txn, object).await;
                if applied.is_err() {
                    break;
                }
            }
        }

        if let Err(e) = applied {
            error!(err = %e, deletes = deletes.len(), upserts = upserts.len(), "save failed, rolling back");
            if let Err(rollback) = txn.rollback().await {
                error!(err = %rollback, "rollback failed");
            }
            return Err(ServiceError::persistence(e));
        }
        txn.commit().await.map_err(ServiceError::persistence)?;
        info!(deletes = deletes.len(), upserts = upserts.len(), "changes committed");
        Ok(())
    }

    async fn delete(&self, object: Option<&Object>) -> Result<(), ServiceError> {
        let Some(object) = object else { return Ok(()) };
        let key = object.key();
        debug!(%key, "staged delete");
        self.pending.lock().await.push(Pending::Delete(key));
        Ok(())
    }

    async fn count(&self, kind: Option<EntityKind>) -> Result<usize, ServiceError> {
        let kinds = match kind {
            Some(k) => vec![k],
            None => EntityKind::ALL.to_vec(),
        };
        let mut total = 0u64;
        for k in kinds {
            total += count_kind(&self.db, k).await.map_err(ServiceError::persistence)?;
        }
        usize::try_from(total).map_err(ServiceError::persistence)
    }

    #[instrument(skip(self))]
    async fn reload(&self) -> Result<(), ServiceError> {
        if self.recreate_schema {
            Migrator::fresh(&self.db).await.map_err(ServiceError::persistence)?;
            info!("schema recreated");
        } else {
            Migrator::up(&self.db, None).await.map_err(ServiceError::persistence)?;
            info!("schema up to date");
        }
        self.pending.lock().await.clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), ServiceError> {
        let dropped = std::mem::take(&mut *self.pending.lock().await).len();
        if dropped > 0 {
            info!(dropped, "discarded uncommitted changes");
        }
        Ok(())
    }
}
