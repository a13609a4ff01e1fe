use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::entity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "amenities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const UPSERT_COLUMNS: [Column; 2] = [Column::UpdatedAt, Column::Name];

pub fn active_model(amenity: &entity::Amenity) -> ActiveModel {
    ActiveModel {
        id: Set(amenity.base.id),
        created_at: Set(amenity.base.created_at.into()),
        updated_at: Set(amenity.base.updated_at.into()),
        name: Set(amenity.name.clone()),
    }
}

impl From<Model> for entity::Amenity {
    fn from(m: Model) -> Self {
        entity::Amenity {
            base: entity::BaseModel {
                id: m.id,
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            },
            name: m.name,
        }
    }
}
