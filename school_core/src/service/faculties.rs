use std::sync::Arc;

use sea_orm::SqlErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    entity::prelude::*,
    error::{Classify, ErrorKind},
    ids::{FacultyId, StudentId},
    service::{
        fold,
        roster::{self, Teardown},
    },
    storage::BlobStore,
};

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=50;
const COLOR_LEN: std::ops::RangeInclusive<usize> = 2..=30;

#[derive(Debug, Error)]
pub enum FacultiesServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("faculty {0} not found")]
    FacultyNotFound(FacultyId),

    #[error("student {0} not found")]
    StudentNotFound(StudentId),

    #[error("a faculty named {0:?} already exists")]
    DuplicateFacultyName(String),

    #[error("student {0} has no faculty assigned")]
    NoFacultyAssigned(StudentId),

    #[error("faculty name must be 2 to 50 characters, got {0:?}")]
    InvalidName(String),

    #[error("faculty color must be 2 to 30 characters, got {0:?}")]
    InvalidColor(String),
}

impl Classify for FacultiesServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            FacultiesServiceError::DbError(_) => ErrorKind::Internal,
            FacultiesServiceError::FacultyNotFound(_) => ErrorKind::NotFound,
            FacultiesServiceError::StudentNotFound(_) => ErrorKind::NotFound,
            FacultiesServiceError::DuplicateFacultyName(_) => ErrorKind::Conflict,
            FacultiesServiceError::NoFacultyAssigned(_) => ErrorKind::IllegalState,
            FacultiesServiceError::InvalidName(_) => ErrorKind::InvalidInput,
            FacultiesServiceError::InvalidColor(_) => ErrorKind::InvalidInput,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFaculty {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacultyView {
    pub id: FacultyId,
    pub name: String,
    pub color: String,
}

impl From<FacultyModel> for FacultyView {
    fn from(faculty: FacultyModel) -> Self {
        Self {
            id: faculty.id,
            name: faculty.name,
            color: faculty.color,
        }
    }
}

fn validate(faculty: &NewFaculty) -> Result<(String, String), FacultiesServiceError> {
    let name = faculty.name.trim();
    if !NAME_LEN.contains(&name.chars().count()) {
        return Err(FacultiesServiceError::InvalidName(faculty.name.clone()));
    }

    let color = faculty.color.trim();
    if !COLOR_LEN.contains(&color.chars().count()) {
        return Err(FacultiesServiceError::InvalidColor(faculty.color.clone()));
    }

    Ok((name.to_string(), color.to_string()))
}

/// Maps a unique-index violation on `name_key` to a duplicate name.
fn map_unique_violation(error: DbErr, name: &str) -> FacultiesServiceError {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            FacultiesServiceError::DuplicateFacultyName(name.to_string())
        }
        _ => FacultiesServiceError::DbError(error),
    }
}

#[derive(Clone)]
pub struct FacultiesService {
    db: DatabaseConnection,
    store: Arc<dyn BlobStore>,
}

impl FacultiesService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn BlobStore>) -> Self {
        Self { db, store }
    }

    /// Fails when a faculty other than `except` already holds the folded name.
    async fn ensure_name_free(
        &self,
        name: &str,
        except: Option<FacultyId>,
    ) -> Result<(), FacultiesServiceError> {
        let mut query = Faculty::find().filter(FacultyColumn::NameKey.eq(fold(name)));
        if let Some(id) = except {
            query = query.filter(FacultyColumn::Id.ne(id));
        }

        if query.one(&self.db).await?.is_some() {
            return Err(FacultiesServiceError::DuplicateFacultyName(name.to_string()));
        }
        Ok(())
    }

    /// Create a new faculty
    #[instrument(skip(self, new_faculty), fields(name = %new_faculty.name))]
    pub async fn add_faculty(
        &self,
        new_faculty: NewFaculty,
    ) -> Result<FacultyModel, FacultiesServiceError> {
        info!("adding faculty");

        let (name, color) = validate(&new_faculty)?;
        self.ensure_name_free(&name, None).await?;

        let faculty = FacultyActiveModel {
            id: NotSet,
            name: Set(name.clone()),
            name_key: Set(fold(&name)),
            color_key: Set(fold(&color)),
            color: Set(color),
        };

        faculty
            .insert(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &name))
    }

    /// Rename or recolor an existing faculty
    #[instrument(skip(self, changes))]
    pub async fn update_faculty(
        &self,
        faculty_id: FacultyId,
        changes: NewFaculty,
    ) -> Result<FacultyModel, FacultiesServiceError> {
        info!("updating faculty");

        let (name, color) = validate(&changes)?;

        let existing = Faculty::find_by_id(faculty_id)
            .one(&self.db)
            .await?
            .ok_or(FacultiesServiceError::FacultyNotFound(faculty_id))?;

        self.ensure_name_free(&name, Some(faculty_id)).await?;

        let mut faculty: FacultyActiveModel = existing.into();
        faculty.name = Set(name.clone());
        faculty.name_key = Set(fold(&name));
        faculty.color_key = Set(fold(&color));
        faculty.color = Set(color);

        faculty
            .update(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &name))
    }

    /// Delete a faculty with all of its students and their avatars
    #[instrument(skip(self))]
    pub async fn delete_faculty(
        &self,
        faculty_id: FacultyId,
    ) -> Result<Teardown, FacultiesServiceError> {
        info!("deleting faculty");

        let txn = self.db.begin().await?;

        let exists = Faculty::find_by_id(faculty_id).one(&txn).await?.is_some();
        if !exists {
            return Err(FacultiesServiceError::FacultyNotFound(faculty_id));
        }

        let (mut teardown, blobs) = roster::remove_faculty_students(&txn, faculty_id).await?;
        Faculty::delete_by_id(faculty_id).exec(&txn).await?;
        txn.commit().await?;

        teardown.blobs_removed = roster::remove_blobs(self.store.as_ref(), &blobs).await;
        info!(
            students = teardown.students_removed,
            avatars = teardown.avatars_removed,
            "faculty deleted"
        );

        Ok(teardown)
    }

    /// Get the faculty a student belongs to
    pub async fn get_faculty_by_student_id(
        &self,
        student_id: StudentId,
    ) -> Result<FacultyView, FacultiesServiceError> {
        let student = Student::find_by_id(student_id)
            .one(&self.db)
            .await?
            .ok_or(FacultiesServiceError::StudentNotFound(student_id))?;

        let faculty_id = student
            .faculty_id
            .ok_or(FacultiesServiceError::NoFacultyAssigned(student_id))?;

        let faculty = self.get_faculty(faculty_id).await?;
        Ok(faculty.into())
    }

    /// Get a specific faculty by ID
    pub async fn get_faculty(
        &self,
        faculty_id: FacultyId,
    ) -> Result<FacultyModel, FacultiesServiceError> {
        Faculty::find_by_id(faculty_id)
            .one(&self.db)
            .await?
            .ok_or(FacultiesServiceError::FacultyNotFound(faculty_id))
    }

    pub async fn list_faculties(&self) -> Result<Vec<FacultyModel>, FacultiesServiceError> {
        Ok(Faculty::find()
            .order_by_asc(FacultyColumn::Id)
            .all(&self.db)
            .await?)
    }

    /// Look a faculty up by name, ignoring case
    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<FacultyModel>, FacultiesServiceError> {
        Ok(Faculty::find()
            .filter(FacultyColumn::NameKey.eq(fold(name)))
            .one(&self.db)
            .await?)
    }

    /// Faculties with the given color, ignoring case
    pub async fn find_by_color(
        &self,
        color: &str,
    ) -> Result<Vec<FacultyModel>, FacultiesServiceError> {
        Ok(Faculty::find()
            .filter(FacultyColumn::ColorKey.eq(fold(color)))
            .order_by_asc(FacultyColumn::Id)
            .all(&self.db)
            .await?)
    }

    /// Faculties matching either the name or the color, ignoring case.
    ///
    /// Blank or missing criteria are ignored; with neither given the result is empty.
    pub async fn search_by_name_or_color(
        &self,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<Vec<FacultyModel>, FacultiesServiceError> {
        let name = name.map(fold).filter(|n| !n.is_empty());
        let color = color.map(fold).filter(|c| !c.is_empty());

        if name.is_none() && color.is_none() {
            return Ok(Vec::new());
        }

        let condition = Condition::any()
            .add_option(name.map(|n| FacultyColumn::NameKey.eq(n)))
            .add_option(color.map(|c| FacultyColumn::ColorKey.eq(c)));

        Ok(Faculty::find()
            .filter(condition)
            .order_by_asc(FacultyColumn::Id)
            .all(&self.db)
            .await?)
    }
}
