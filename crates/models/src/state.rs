use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::entity;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "states")]
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

/// Columns rewritten when an existing row is upserted.
pub const UPSERT_COLUMNS: [Column; 2] = [Column::UpdatedAt, Column::Name];

pub fn active_model(state: &entity::State) -> ActiveModel {
    ActiveModel {
        id: Set(state.base.id),
        created_at: Set(state.base.created_at.into()),
        updated_at: Set(state.base.updated_at.into()),
        name: Set(state.name.clone()),
    }
}

impl From<Model> for entity::State {
    fn from(m: Model) -> Self {
        entity::State {
            base: entity::BaseModel {
                id: m.id,
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            },
            name: m.name,
        }
    }
}
