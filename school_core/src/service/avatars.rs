use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use sea_orm::FromQueryResult;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    entity::prelude::*,
    error::{Classify, ErrorKind},
    ids::{AvatarId, StudentId},
    service::roster,
    storage::{BlobStore, StorageError},
};

/// Rows returned per page by [`AvatarsService::list_avatars_by_page`].
pub const AVATARS_PER_PAGE: u64 = 4;

#[derive(Debug, Error)]
pub enum AvatarsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("student {0} not found")]
    StudentNotFound(StudentId),

    #[error("student {0} has no avatar")]
    AvatarNotFound(StudentId),

    #[error("avatar upload for student {0} is empty")]
    EmptyAvatar(StudentId),

    #[error("file name {0:?} has no usable extension")]
    MalformedFilename(String),

    #[error("page must be 1 or greater, got {0}")]
    InvalidPage(i64),

    #[error("avatar io failed for student {student_id} at {}", path.display())]
    AvatarIo {
        student_id: StudentId,
        path: PathBuf,
        #[source]
        source: StorageError,
    },
}

impl Classify for AvatarsServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            AvatarsServiceError::DbError(_) => ErrorKind::Internal,
            AvatarsServiceError::StudentNotFound(_) => ErrorKind::NotFound,
            AvatarsServiceError::AvatarNotFound(_) => ErrorKind::NotFound,
            AvatarsServiceError::EmptyAvatar(_) => ErrorKind::EmptyInput,
            AvatarsServiceError::MalformedFilename(_) => ErrorKind::InvalidInput,
            AvatarsServiceError::InvalidPage(_) => ErrorKind::InvalidInput,
            AvatarsServiceError::AvatarIo { .. } => ErrorKind::IoFailure,
        }
    }
}

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub bytes: Bytes,
    pub original_filename: String,
    pub media_type: String,
    /// Size reported by the client; stored as-is.
    pub declared_size: i64,
}

/// Avatar metadata without the inline image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct AvatarView {
    pub id: AvatarId,
    pub student_id: StudentId,
    pub file_path: String,
    pub file_size: i64,
    pub media_type: String,
}

impl From<AvatarModel> for AvatarView {
    fn from(avatar: AvatarModel) -> Self {
        Self {
            id: avatar.id,
            student_id: avatar.student_id,
            file_path: avatar.file_path,
            file_size: avatar.file_size,
            media_type: avatar.media_type,
        }
    }
}

/// Image bytes together with the media type they were uploaded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarContent {
    pub media_type: String,
    pub data: Vec<u8>,
}

/// Extension after the last `.`, when it is non-empty and alphanumeric.
fn extension_of(filename: &str) -> Option<&str> {
    let (_, extension) = filename.rsplit_once('.')?;
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(extension)
}

#[derive(Clone)]
pub struct AvatarsService {
    db: DatabaseConnection,
    store: Arc<dyn BlobStore>,
}

impl AvatarsService {
    pub fn new(db: DatabaseConnection, store: Arc<dyn BlobStore>) -> Self {
        Self { db, store }
    }

    /// Store a student's avatar on disk and in the database, replacing any previous one.
    #[instrument(skip(self, upload), fields(filename = %upload.original_filename, size = upload.bytes.len()))]
    pub async fn upload_avatar(
        &self,
        student_id: StudentId,
        upload: AvatarUpload,
    ) -> Result<AvatarModel, AvatarsServiceError> {
        info!("uploading avatar");

        let student_exists = Student::find_by_id(student_id)
            .one(&self.db)
            .await?
            .is_some();

        if !student_exists {
            return Err(AvatarsServiceError::StudentNotFound(student_id));
        }

        if upload.bytes.is_empty() {
            return Err(AvatarsServiceError::EmptyAvatar(student_id));
        }

        let extension = extension_of(&upload.original_filename).ok_or_else(|| {
            AvatarsServiceError::MalformedFilename(upload.original_filename.clone())
        })?;

        // Disk first: a failed write must leave the database untouched.
        let path = self.store.blob_path(student_id, extension);
        self.write_blob(student_id, &path, &upload.bytes).await?;

        let file_path = path.to_string_lossy().into_owned();
        let existing = Avatar::find()
            .filter(AvatarColumn::StudentId.eq(student_id))
            .one(&self.db)
            .await?;

        let (saved, stale_path) = match existing {
            Some(previous) => {
                let stale_path =
                    (previous.file_path != file_path).then(|| PathBuf::from(&previous.file_path));

                let mut avatar: AvatarActiveModel = previous.into();
                avatar.file_path = Set(file_path);
                avatar.file_size = Set(upload.declared_size);
                avatar.media_type = Set(upload.media_type);
                avatar.data = Set(upload.bytes.to_vec());

                (avatar.update(&self.db).await?, stale_path)
            }
            None => {
                let avatar = AvatarActiveModel {
                    id: NotSet,
                    student_id: Set(student_id),
                    file_path: Set(file_path),
                    file_size: Set(upload.declared_size),
                    media_type: Set(upload.media_type),
                    data: Set(upload.bytes.to_vec()),
                };

                (avatar.insert(&self.db).await?, None)
            }
        };

        if let Some(stale_path) = stale_path {
            debug!(path = %stale_path.display(), "removing blob with previous extension");
            roster::remove_blob(self.store.as_ref(), &stale_path).await;
        }

        Ok(saved)
    }

    /// Get the avatar record of a student
    pub async fn find_avatar(
        &self,
        student_id: StudentId,
    ) -> Result<AvatarModel, AvatarsServiceError> {
        Avatar::find()
            .filter(AvatarColumn::StudentId.eq(student_id))
            .one(&self.db)
            .await?
            .ok_or(AvatarsServiceError::AvatarNotFound(student_id))
    }

    /// Read the avatar bytes from the file the record points at.
    ///
    /// A missing or unreadable file is an error; the inline copy is not used
    /// as a fallback.
    #[instrument(skip(self))]
    pub async fn get_avatar_file_data(
        &self,
        student_id: StudentId,
    ) -> Result<AvatarContent, AvatarsServiceError> {
        let avatar = self.find_avatar(student_id).await?;
        let path = PathBuf::from(&avatar.file_path);

        let data = self
            .store
            .get(&path)
            .await
            .map_err(|source| AvatarsServiceError::AvatarIo {
                student_id,
                path: path.clone(),
                source,
            })?;

        Ok(AvatarContent {
            media_type: avatar.media_type,
            data,
        })
    }

    /// Read the avatar bytes stored inline in the database.
    pub async fn get_avatar_db_data(
        &self,
        student_id: StudentId,
    ) -> Result<AvatarContent, AvatarsServiceError> {
        let avatar = self.find_avatar(student_id).await?;
        Ok(AvatarContent {
            media_type: avatar.media_type,
            data: avatar.data,
        })
    }

    /// List avatars, 1-indexed pages of [`AVATARS_PER_PAGE`] ordered by id.
    pub async fn list_avatars_by_page(
        &self,
        page: i64,
    ) -> Result<Vec<AvatarView>, AvatarsServiceError> {
        if page <= 0 {
            return Err(AvatarsServiceError::InvalidPage(page));
        }

        // Offsets past i64::MAX cannot be bound; no rows live that far out.
        let Some(offset) = (page as u64 - 1)
            .checked_mul(AVATARS_PER_PAGE)
            .filter(|offset| *offset <= i64::MAX as u64)
        else {
            return Ok(Vec::new());
        };
        let avatars = Avatar::find()
            .select_only()
            .columns([
                AvatarColumn::Id,
                AvatarColumn::StudentId,
                AvatarColumn::FilePath,
                AvatarColumn::FileSize,
                AvatarColumn::MediaType,
            ])
            .order_by_asc(AvatarColumn::Id)
            .offset(offset)
            .limit(AVATARS_PER_PAGE)
            .into_model::<AvatarView>()
            .all(&self.db)
            .await?;

        Ok(avatars)
    }

    /// Rewrite the avatar file from the inline database copy.
    #[instrument(skip(self))]
    pub async fn restore_avatar_file(
        &self,
        student_id: StudentId,
    ) -> Result<AvatarModel, AvatarsServiceError> {
        let avatar = self.find_avatar(student_id).await?;
        let path = PathBuf::from(&avatar.file_path);

        self.write_blob(student_id, &path, &avatar.data).await?;
        info!(path = %path.display(), "restored avatar file from database copy");

        Ok(avatar)
    }

    /// Remove a student's avatar record, then its file.
    #[instrument(skip(self))]
    pub async fn delete_avatar(&self, student_id: StudentId) -> Result<(), AvatarsServiceError> {
        info!("deleting avatar");

        let Some(path) = roster::remove_avatar_row(&self.db, student_id).await? else {
            return Err(AvatarsServiceError::AvatarNotFound(student_id));
        };

        if !roster::remove_blob(self.store.as_ref(), &path).await {
            warn!(path = %path.display(), "avatar record removed but no file was deleted");
        }

        Ok(())
    }

    async fn write_blob(
        &self,
        student_id: StudentId,
        path: &std::path::Path,
        data: &[u8],
    ) -> Result<(), AvatarsServiceError> {
        let io_error = |source| AvatarsServiceError::AvatarIo {
            student_id,
            path: path.to_path_buf(),
            source,
        };

        self.store.ensure_dir(path).await.map_err(io_error)?;
        self.store.put(path, data).await.map_err(io_error)
    }
}
