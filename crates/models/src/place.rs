use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::entity;
use crate::{city, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "places")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub city_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub number_rooms: i32,
    pub number_bathrooms: i32,
    pub max_guest: i32,
    pub price_by_night: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    City,
    Owner,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::City => Entity::belongs_to(city::Entity)
                .from(Column::CityId)
                .to(city::Column::Id)
                .into(),
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const UPSERT_COLUMNS: [Column; 11] = [
    Column::UpdatedAt,
    Column::CityId,
    Column::UserId,
    Column::Name,
    Column::Description,
    Column::NumberRooms,
    Column::NumberBathrooms,
    Column::MaxGuest,
    Column::PriceByNight,
    Column::Latitude,
    Column::Longitude,
];

/// Row for `place`; amenity links live in `place_amenity`.
pub fn active_model(place: &entity::Place) -> ActiveModel {
    ActiveModel {
        id: Set(place.base.id),
        created_at: Set(place.base.created_at.into()),
        updated_at: Set(place.base.updated_at.into()),
        city_id: Set(place.city_id),
        user_id: Set(place.user_id),
        name: Set(place.name.clone()),
        description: Set(place.description.clone()),
        number_rooms: Set(place.number_rooms),
        number_bathrooms: Set(place.number_bathrooms),
        max_guest: Set(place.max_guest),
        price_by_night: Set(place.price_by_night),
        latitude: Set(place.latitude),
        longitude: Set(place.longitude),
    }
}

/// Rebuild the domain place from its row and its linked amenity ids.
pub fn into_entity(m: Model, amenity_ids: BTreeSet<Uuid>) -> entity::Place {
    entity::Place {
        base: entity::BaseModel {
            id: m.id,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        },
        city_id: m.city_id,
        user_id: m.user_id,
        name: m.name,
        description: m.description,
        number_rooms: m.number_rooms,
        number_bathrooms: m.number_bathrooms,
        max_guest: m.max_guest,
        price_by_night: m.price_by_night,
        latitude: m.latitude,
        longitude: m.longitude,
        amenity_ids,
    }
}
