use crate::ids::FacultyId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "faculty")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: FacultyId,
    pub name: String,
    /// Folded copy of `name`; carries the case-insensitive unique index.
    #[sea_orm(unique)]
    pub name_key: String,
    pub color: String,
    pub color_key: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::student::Entity")]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
