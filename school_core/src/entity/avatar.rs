use crate::ids::{AvatarId, StudentId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// The image bytes live twice: on disk at `file_path` and inline in `data`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "avatar")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: AvatarId,
    #[sea_orm(unique)]
    pub student_id: StudentId,
    pub file_path: String,
    pub file_size: i64,
    pub media_type: String,
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
