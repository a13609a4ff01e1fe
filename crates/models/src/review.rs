use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::entity;
use crate::{place, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub place_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Place, Author }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Place => Entity::belongs_to(place::Entity).from(Column::PlaceId).to(place::Column::Id).into(),
            Relation::Author => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const UPSERT_COLUMNS: [Column; 4] = [Column::UpdatedAt, Column::PlaceId, Column::UserId, Column::Text];

pub fn active_model(review: &entity::Review) -> ActiveModel {
    ActiveModel {
        id: Set(review.base.id),
        created_at: Set(review.base.created_at.into()),
        updated_at: Set(review.base.updated_at.into()),
        place_id: Set(review.place_id),
        user_id: Set(review.user_id),
        text: Set(review.text.clone()),
    }
}

impl From<Model> for entity::Review {
    fn from(m: Model) -> Self {
        entity::Review {
            base: entity::BaseModel {
                id: m.id,
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            },
            place_id: m.place_id,
            user_id: m.user_id,
            text: m.text,
        }
    }
}
