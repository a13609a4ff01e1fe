use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::entity;
use crate::state;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub state_id: Uuid,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    State,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::State => Entity::belongs_to(state::Entity).from(Column::StateId).to(state::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const UPSERT_COLUMNS: [Column; 3] = [Column::UpdatedAt, Column::StateId, Column::Name];

pub fn active_model(city: &entity::City) -> ActiveModel {
    ActiveModel {
        id: Set(city.base.id),
        created_at: Set(city.base.created_at.into()),
        updated_at: Set(city.base.updated_at.into()),
        state_id: Set(city.state_id),
        name: Set(city.name.clone()),
    }
}

impl From<Model> for entity::City {
    fn from(m: Model) -> Self {
        entity::City {
            base: entity::BaseModel {
                id: m.id,
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            },
            state_id: m.state_id,
            name: m.name,
        }
    }
}
