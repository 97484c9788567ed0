//! Ordered teardown of the Faculty -> Student -> Avatar graph.
//!
//! Foreign keys are `ON DELETE RESTRICT`, so dependents must go first:
//! avatar rows, then student rows, then (for faculty deletion) the faculty
//! row. The row deletions run on whatever connection the caller passes, which
//! is a transaction in every service. Blob paths are handed back instead of
//! being removed here; the caller removes them with [`remove_blobs`] once the
//! transaction has committed.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::entity::prelude::*;
use crate::ids::{FacultyId, StudentId};
use crate::storage::BlobStore;

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Teardown {
    pub students_removed: u64,
    pub avatars_removed: u64,
    pub blobs_removed: u64,
}

/// Deletes the avatar row of one student. Returns the blob path it pointed at.
pub(crate) async fn remove_avatar_row<C: ConnectionTrait>(
    conn: &C,
    student_id: StudentId,
) -> Result<Option<PathBuf>, DbErr> {
    let Some(avatar) = Avatar::find()
        .filter(AvatarColumn::StudentId.eq(student_id))
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    let path = PathBuf::from(&avatar.file_path);
    avatar.delete(conn).await?;
    debug!(%student_id, path = %path.display(), "removed avatar row");

    Ok(Some(path))
}

/// Deletes a student's avatar row, then the student row.
///
/// Returns the avatar blob path, if the student had one.
pub(crate) async fn remove_student<C: ConnectionTrait>(
    conn: &C,
    student_id: StudentId,
) -> Result<Option<PathBuf>, DbErr> {
    let blob = remove_avatar_row(conn, student_id).await?;
    Student::delete_by_id(student_id).exec(conn).await?;
    debug!(%student_id, "removed student row");
    Ok(blob)
}

/// Deletes every student of a faculty, each student's avatar first.
///
/// The faculty row itself is left in place.
pub(crate) async fn remove_faculty_students<C: ConnectionTrait>(
    conn: &C,
    faculty_id: FacultyId,
) -> Result<(Teardown, Vec<PathBuf>), DbErr> {
    let students = Student::find()
        .filter(StudentColumn::FacultyId.eq(faculty_id))
        .order_by_asc(StudentColumn::Id)
        .all(conn)
        .await?;

    let mut teardown = Teardown::default();
    let mut blobs = Vec::new();

    if students.is_empty() {
        return Ok((teardown, blobs));
    }

    for student in &students {
        if let Some(path) = remove_avatar_row(conn, student.id).await? {
            teardown.avatars_removed += 1;
            blobs.push(path);
        }
    }

    let result = Student::delete_many()
        .filter(StudentColumn::FacultyId.eq(faculty_id))
        .exec(conn)
        .await?;
    teardown.students_removed = result.rows_affected;
    debug!(
        %faculty_id,
        students = teardown.students_removed,
        avatars = teardown.avatars_removed,
        "removed faculty students"
    );

    Ok((teardown, blobs))
}

/// Best-effort removal of blobs whose rows are already gone.
///
/// Returns how many blobs were actually deleted. Failures are logged and
/// skipped: the rows are committed and cannot be brought back.
pub(crate) async fn remove_blobs(store: &dyn BlobStore, paths: &[PathBuf]) -> u64 {
    let mut removed = 0;
    for path in paths {
        if remove_blob(store, path).await {
            removed += 1;
        }
    }
    removed
}

pub(crate) async fn remove_blob(store: &dyn BlobStore, path: &Path) -> bool {
    match store.delete(path).await {
        Ok(true) => true,
        Ok(false) => {
            debug!(path = %path.display(), "avatar blob already absent");
            false
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to remove avatar blob");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        create_test_faculty, create_test_student, setup_test_db, setup_test_store,
    };

    async fn create_test_avatar(
        db: &DatabaseConnection,
        student_id: StudentId,
        path: &Path,
    ) -> AvatarModel {
        let avatar = AvatarActiveModel {
            id: NotSet,
            student_id: Set(student_id),
            file_path: Set(path.to_string_lossy().into_owned()),
            file_size: Set(3),
            media_type: Set("image/png".to_string()),
            data: Set(vec![1, 2, 3]),
        };
        avatar.insert(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_remove_avatar_row_returns_path() {
        let db = setup_test_db().await;
        let student = create_test_student(&db, "Harry", 11, None).await;
        create_test_avatar(&db, student.id, Path::new("/avatars/1.png")).await;

        let path = remove_avatar_row(&db, student.id).await.unwrap();
        assert_eq!(path, Some(PathBuf::from("/avatars/1.png")));
        assert_eq!(Avatar::find().count(&db).await.unwrap(), 0);

        let again = remove_avatar_row(&db, student.id).await.unwrap();
        assert_eq!(again, None);
    }

    #[tokio::test]
    async fn test_student_delete_is_restricted_while_avatar_exists() {
        let db = setup_test_db().await;
        let student = create_test_student(&db, "Harry", 11, None).await;
        create_test_avatar(&db, student.id, Path::new("/avatars/1.png")).await;

        let result = Student::delete_by_id(student.id).exec(&db).await;
        assert!(result.is_err(), "Foreign key should restrict the delete");

        remove_student(&db, student.id).await.unwrap();
        assert!(Student::find_by_id(student.id)
            .one(&db)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_remove_faculty_students_in_transaction() {
        let db = setup_test_db().await;
        let faculty = create_test_faculty(&db, "Gryffindor").await;
        let other = create_test_faculty(&db, "Slytherin").await;

        let harry = create_test_student(&db, "Harry", 11, Some(faculty.id)).await;
        create_test_student(&db, "Ron", 11, Some(faculty.id)).await;
        let draco = create_test_student(&db, "Draco", 11, Some(other.id)).await;
        create_test_avatar(&db, harry.id, Path::new("/avatars/h.png")).await;
        create_test_avatar(&db, draco.id, Path::new("/avatars/d.png")).await;

        let txn = db.begin().await.unwrap();
        let (teardown, blobs) = remove_faculty_students(&txn, faculty.id).await.unwrap();
        txn.commit().await.unwrap();

        assert_eq!(teardown.students_removed, 2);
        assert_eq!(teardown.avatars_removed, 1);
        assert_eq!(blobs, vec![PathBuf::from("/avatars/h.png")]);

        // The other faculty is untouched
        assert_eq!(Student::find().count(&db).await.unwrap(), 1);
        assert_eq!(Avatar::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_remove_faculty_students_without_students_is_noop() {
        let db = setup_test_db().await;
        let faculty = create_test_faculty(&db, "Hufflepuff").await;

        let (teardown, blobs) = remove_faculty_students(&db, faculty.id).await.unwrap();
        assert_eq!(teardown, Teardown::default());
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_remove_blobs_counts_only_existing() {
        let (store, _dir) = setup_test_store().await;
        let present = store.blob_path(StudentId::from_i64(1), "png");
        let missing = store.blob_path(StudentId::from_i64(2), "png");
        store.put(&present, b"png").await.unwrap();

        let removed = remove_blobs(&*store, &[present.clone(), missing]).await;
        assert_eq!(removed, 1);
        assert!(!present.exists());
    }
}
