use std::sync::Arc;

use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::SqlErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

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

pub const MIN_STUDENT_AGE: i32 = 11;
const LAST_STUDENTS_LIMIT: u64 = 5;

#[derive(Debug, Error)]
pub enum StudentsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("student {0} not found")]
    StudentNotFound(StudentId),

    #[error("faculty {0} not found")]
    FacultyNotFound(FacultyId),

    #[error("a student named {0:?} already exists")]
    DuplicateStudentName(String),

    #[error("student name must not be blank")]
    BlankName,

    #[error("student age must be at least 11, got {0}")]
    AgeTooLow(i32),

    #[error("unknown gender code {0:?}")]
    UnknownGender(String),

    #[error("invalid age range {min}..={max}")]
    InvalidAgeRange { min: i32, max: i32 },
}

impl Classify for StudentsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            StudentsServiceError::DbError(_) => ErrorKind::Internal,
            StudentsServiceError::StudentNotFound(_) => ErrorKind::NotFound,
            StudentsServiceError::FacultyNotFound(_) => ErrorKind::NotFound,
            StudentsServiceError::DuplicateStudentName(_) => ErrorKind::Conflict,
            StudentsServiceError::BlankName
            | StudentsServiceError::AgeTooLow(_)
            | StudentsServiceError::UnknownGender(_)
            | StudentsServiceError::InvalidAgeRange { .. } => ErrorKind::InvalidInput,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub age: i32,
    /// Gender code, `м` or `ж` in either case.
    pub gender: String,
    pub faculty_id: FacultyId,
}

/// Replacement values for an existing student. A `None` faculty keeps the current one.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentChanges {
    pub name: String,
    pub age: i32,
    pub gender: String,
    #[serde(default)]
    pub faculty_id: Option<FacultyId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentView {
    pub id: StudentId,
    pub name: String,
    pub age: i32,
    pub gender: Gender,
    pub faculty_id: Option<FacultyId>,
}

impl From<StudentModel> for StudentView {
    fn from(student: StudentModel) -> Self {
        Self {
            id: student.id,
            name: student.name,
            age: student.age,
            gender: student.gender,
            faculty_id: student.faculty_id,
        }
    }
}

fn validate(name: &str, age: i32, gender: &str) -> Result<(String, Gender), StudentsServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StudentsServiceError::BlankName);
    }
    if age < MIN_STUDENT_AGE {
        return Err(StudentsServiceError::AgeTooLow(age));
    }
    let gender = Gender::parse(gender)
        .ok_or_else(|| StudentsServiceError::UnknownGender(gender.to_string()))?;

    Ok((name.to_string(), gender))
}

/// `%fragment%` for a `LIKE` match, with the fragment's own wildcards escaped.
fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Maps a unique-index violation on `name_key` to a duplicate name.
fn map_unique_violation(error: DbErr, name: &str) -> StudentsServiceError {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            StudentsServiceError::DuplicateStudentName(name.trim().to_string())
        }
        _ => StudentsServiceError::DbError(error),
    }
}

#[derive(Clone)]
pub struct StudentsService {
    db: DatabaseConnection,
    store: Arc<dyn BlobStore>,
}

impl StudentsService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn BlobStore>) -> Self {
        Self { db, store }
    }

    async fn ensure_faculty(&self, faculty_id: FacultyId) -> Result<(), StudentsServiceError> {
        let faculty_exists = Faculty::find_by_id(faculty_id)
            .one(&self.db)
            .await?
            .is_some();

        if !faculty_exists {
            return Err(StudentsServiceError::FacultyNotFound(faculty_id));
        }
        Ok(())
    }

    /// Fails when a student other than `except` already holds the folded name.
    async fn ensure_name_free(
        &self,
        name: &str,
        except: Option<StudentId>,
    ) -> Result<(), StudentsServiceError> {
        let mut query = Student::find().filter(StudentColumn::NameKey.eq(fold(name)));
        if let Some(id) = except {
            query = query.filter(StudentColumn::Id.ne(id));
        }

        if query.one(&self.db).await?.is_some() {
            return Err(StudentsServiceError::DuplicateStudentName(name.to_string()));
        }
        Ok(())
    }

    /// Enroll a new student into an existing faculty
    #[instrument(skip(self, new_student), fields(name = %new_student.name, faculty_id = %new_student.faculty_id))]
    pub async fn add_student(
        &self,
        new_student: NewStudent,
    ) -> Result<StudentModel, StudentsServiceError> {
        info!("adding student");

        let (name, gender) = validate(&new_student.name, new_student.age, &new_student.gender)?;
        self.ensure_name_free(&name, None).await?;
        self.ensure_faculty(new_student.faculty_id).await?;

        let student = StudentActiveModel {
            id: NotSet,
            name_key: Set(fold(&name)),
            name: Set(name),
            age: Set(new_student.age),
            gender: Set(gender),
            faculty_id: Set(Some(new_student.faculty_id)),
        };

        student
            .insert(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &new_student.name))
    }

    /// Replace a student's name, age and gender, optionally moving them to another faculty
    #[instrument(skip(self, changes))]
    pub async fn update_student(
        &self,
        student_id: StudentId,
        changes: StudentChanges,
    ) -> Result<StudentModel, StudentsServiceError> {
        info!("updating student");

        let (name, gender) = validate(&changes.name, changes.age, &changes.gender)?;

        let existing = Student::find_by_id(student_id)
            .one(&self.db)
            .await?
            .ok_or(StudentsServiceError::StudentNotFound(student_id))?;

        self.ensure_name_free(&name, Some(student_id)).await?;
        if let Some(faculty_id) = changes.faculty_id {
            self.ensure_faculty(faculty_id).await?;
        }

        let mut student: StudentActiveModel = existing.into();
        student.name_key = Set(fold(&name));
        student.name = Set(name);
        student.age = Set(changes.age);
        student.gender = Set(gender);
        if let Some(faculty_id) = changes.faculty_id {
            student.faculty_id = Set(Some(faculty_id));
        }

        student
            .update(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, &changes.name))
    }

    /// Delete a student together with their avatar.
    ///
    /// Returns `false` if no such student exists.
    #[instrument(skip(self))]
    pub async fn delete_student(&self, student_id: StudentId) -> Result<bool, StudentsServiceError> {
        info!("deleting student");

        let txn = self.db.begin().await?;

        let exists = Student::find_by_id(student_id).one(&txn).await?.is_some();
        if !exists {
            warn!("student not found, nothing to delete");
            return Ok(false);
        }

        let blob = roster::remove_student(&txn, student_id).await?;
        txn.commit().await?;

        if let Some(path) = blob {
            roster::remove_blob(self.store.as_ref(), &path).await;
        }

        Ok(true)
    }

    /// Delete every student of a faculty, avatars first. The faculty stays.
    #[instrument(skip(self))]
    pub async fn delete_all_students_from_faculty(
        &self,
        faculty_id: FacultyId,
    ) -> Result<Teardown, StudentsServiceError> {
        info!("deleting all students from faculty");

        self.ensure_faculty(faculty_id).await?;

        let txn = self.db.begin().await?;
        let (mut teardown, blobs) = roster::remove_faculty_students(&txn, faculty_id).await?;
        txn.commit().await?;

        teardown.blobs_removed = roster::remove_blobs(self.store.as_ref(), &blobs).await;
        Ok(teardown)
    }

    /// Get a specific student by ID
    pub async fn get_student(
        &self,
        student_id: StudentId,
    ) -> Result<StudentModel, StudentsServiceError> {
        Student::find_by_id(student_id)
            .one(&self.db)
            .await?
            .ok_or(StudentsServiceError::StudentNotFound(student_id))
    }

    /// List all students ordered by ID
    pub async fn list_students(&self) -> Result<Vec<StudentModel>, StudentsServiceError> {
        Ok(Student::find()
            .order_by_asc(StudentColumn::Id)
            .all(&self.db)
            .await?)
    }

    /// Students whose name contains `fragment`, ignoring case
    pub async fn find_by_name_containing(
        &self,
        fragment: &str,
    ) -> Result<Vec<StudentModel>, StudentsServiceError> {
        Ok(Student::find()
            .filter(
                Expr::col(StudentColumn::NameKey)
                    .like(LikeExpr::new(contains_pattern(&fold(fragment))).escape('\\')),
            )
            .order_by_asc(StudentColumn::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn find_by_gender(
        &self,
        code: &str,
    ) -> Result<Vec<StudentModel>, StudentsServiceError> {
        let gender =
            Gender::parse(code).ok_or_else(|| StudentsServiceError::UnknownGender(code.to_string()))?;

        Ok(Student::find()
            .filter(StudentColumn::Gender.eq(gender))
            .order_by_asc(StudentColumn::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn find_by_age(&self, age: i32) -> Result<Vec<StudentModel>, StudentsServiceError> {
        Ok(Student::find()
            .filter(StudentColumn::Age.eq(age))
            .order_by_asc(StudentColumn::Id)
            .all(&self.db)
            .await?)
    }

    /// Students aged `min..=max`
    pub async fn find_by_age_range(
        &self,
        min: i32,
        max: i32,
    ) -> Result<Vec<StudentModel>, StudentsServiceError> {
        if min < 0 || max < 0 || min > max {
            return Err(StudentsServiceError::InvalidAgeRange { min, max });
        }

        Ok(Student::find()
            .filter(StudentColumn::Age.between(min, max))
            .order_by_asc(StudentColumn::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn list_by_faculty(
        &self,
        faculty_id: FacultyId,
    ) -> Result<Vec<StudentModel>, StudentsServiceError> {
        self.ensure_faculty(faculty_id).await?;

        Ok(Student::find()
            .filter(StudentColumn::FacultyId.eq(faculty_id))
            .order_by_asc(StudentColumn::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn count_by_faculty(&self, faculty_id: FacultyId) -> Result<u64, StudentsServiceError> {
        self.ensure_faculty(faculty_id).await?;

        Ok(Student::find()
            .filter(StudentColumn::FacultyId.eq(faculty_id))
            .count(&self.db)
            .await?)
    }

    pub async fn count_students(&self) -> Result<u64, StudentsServiceError> {
        Ok(Student::find().count(&self.db).await?)
    }

    /// Mean age of all students, `None` when there are none
    pub async fn average_age(&self) -> Result<Option<f64>, StudentsServiceError> {
        let average = Student::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(StudentColumn::Age))),
                "average_age",
            )
            .into_tuple::<Option<f64>>()
            .one(&self.db)
            .await?;

        Ok(average.flatten())
    }

    /// The five most recently added students, newest first
    pub async fn last_five(&self) -> Result<Vec<StudentModel>, StudentsServiceError> {
        Ok(Student::find()
            .order_by_desc(StudentColumn::Id)
            .limit(LAST_STUDENTS_LIMIT)
            .all(&self.db)
            .await?)
    }
}
