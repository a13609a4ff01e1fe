use chrono::Utc;
use sea_orm::{entity::prelude::*, Set};
use serde::{Deserialize, Serialize};

use crate::entity;
use crate::password::Password;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub email: String,
    /// One-way hash; never plaintext.
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match *self {}
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const UPSERT_COLUMNS: [Column; 5] = [
    Column::UpdatedAt,
    Column::Email,
    Column::Password,
    Column::FirstName,
    Column::LastName,
];

/// Row for `user`. The caller is responsible for having hashed the password.
pub fn active_model(user: &entity::User) -> ActiveModel {
    ActiveModel {
        id: Set(user.base.id),
        created_at: Set(user.base.created_at.into()),
        updated_at: Set(user.base.updated_at.into()),
        email: Set(user.email.clone()),
        password: Set(user.password.as_str().to_owned()),
        first_name: Set(user.first_name.clone()),
        last_name: Set(user.last_name.clone()),
    }
}

impl From<Model> for entity::User {
    fn from(m: Model) -> Self {
        entity::User {
            base: entity::BaseModel {
                id: m.id,
                created_at: m.created_at.with_timezone(&Utc),
                updated_at: m.updated_at.with_timezone(&Utc),
            },
            email: m.email,
            password: Password::Hashed(m.password),
            first_name: m.first_name,
            last_name: m.last_name,
        }
    }
}
