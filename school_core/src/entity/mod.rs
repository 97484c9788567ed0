// SeaORM entities for the school records schema.
// Tables are created by the migrations in `models::migrator`.

pub mod avatar;
pub mod faculty;
pub mod student;

#[cfg(test)]
mod tests;

pub mod prelude {
    // Re-export all entities for convenience
    pub use super::avatar::{
        ActiveModel as AvatarActiveModel, Column as AvatarColumn, Entity as Avatar,
        Model as AvatarModel,
    };
    pub use super::faculty::{
        ActiveModel as FacultyActiveModel, Column as FacultyColumn, Entity as Faculty,
        Model as FacultyModel,
    };
    pub use super::student::{
        ActiveModel as StudentActiveModel, Column as StudentColumn, Entity as Student,
        Gender, Model as StudentModel,
    };

    // Re-export commonly used SeaORM types and traits
    pub use sea_orm::{
        ActiveModelTrait,
        ActiveValue,

        ColumnTrait,
        Condition,
        ConnectionTrait,

        // Database and connection types
        Database,
        DatabaseConnection,
        DatabaseTransaction,
        DbConn,
        // Common result types
        DbErr,

        // Core traits
        EntityTrait,
        ModelTrait,
        NotSet,
        // Pagination
        PaginatorTrait,
        QueryFilter,
        QueryOrder,
        QuerySelect,
        Related,
        // Active model helpers
        Set,
        TransactionTrait,
    };
}
