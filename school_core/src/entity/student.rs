use crate::ids::{FacultyId, StudentId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Single-character gender code as stored in the `student.gender` column.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(1))")]
pub enum Gender {
    #[sea_orm(string_value = "м")]
    #[serde(rename = "м")]
    Male,
    #[sea_orm(string_value = "ж")]
    #[serde(rename = "ж")]
    Female,
}

impl Gender {
    /// Parses a gender code, ignoring case and surrounding whitespace.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "м" => Some(Self::Male),
            "ж" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "м",
            Self::Female => "ж",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: StudentId,
    pub name: String,
    pub name_key: String,
    pub age: i32,
    pub gender: Gender,
    pub faculty_id: Option<FacultyId>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::faculty::Entity",
        from = "Column::FacultyId",
        to = "super::faculty::Column::Id"
    )]
    Faculty,
    #[sea_orm(has_one = "super::avatar::Entity")]
    Avatar,
}

impl Related<super::faculty::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::avatar::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Avatar.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
