use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::{amenity, entity, place};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "place_amenity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub place_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub amenity_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Place, Amenity }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Place => Entity::belongs_to(place::Entity)
                .from(Column::PlaceId)
                .to(place::Column::Id)
                .into(),
            Relation::Amenity => Entity::belongs_to(amenity::Entity)
                .from(Column::AmenityId)
                .to(amenity::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Association rows for every amenity linked to `place`.
pub fn active_models(place: &entity::Place) -> Vec<ActiveModel> {
    place
        .amenity_ids
        .iter()
        .map(|amenity_id| ActiveModel { place_id: Set(place.base.id), amenity_id: Set(*amenity_id) })
        .collect()
}

/// Group association rows by place.
pub fn group_by_place(rows: Vec<Model>) -> BTreeMap<Uuid, BTreeSet<Uuid>> {
    let mut grouped: BTreeMap<Uuid, BTreeSet<Uuid>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.place_id).or_default().insert(row.amenity_id);
    }
    grouped
}
