use crate::api::error::UploadError;
use crate::media::{MediaSlot, StoredFile, normalize_mime};
use crate::naming::{job_id, stored_name};
use crate::AppState;
use axum::extract::multipart::Field;
use axum::extract::{Extension, Multipart};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt as _;
use tracing::{debug, error, info, warn};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub ok: bool,
    pub job_id: String,
    pub source_image: StoredFile,
    pub target_video: StoredFile,
}

/// Files stored so far while walking one multipart body
#[derive(Default)]
struct Intake {
    source_image: Option<StoredFile>,
    target_video: Option<StoredFile>,
    // slots already claimed by a file part, accepted or not
    claimed: Vec<MediaSlot>,
}

impl Intake {
    fn slot_mut(&mut self, slot: MediaSlot) -> &mut Option<StoredFile> {
        match slot {
            MediaSlot::SourceImage => &mut self.source_image,
            MediaSlot::TargetVideo => &mut self.target_video,
        }
    }

    fn into_files(self) -> impl Iterator<Item = StoredFile> {
        [self.source_image, self.target_video].into_iter().flatten()
    }
}

/// Remove whatever was written for a request that is being rejected
async fn discard(files: impl Iterator<Item = StoredFile>) {
    for file in files {
        debug!(path = %file.path, "Removing orphaned upload");
        if let Err(error) = tokio::fs::remove_file(&file.path).await {
            warn!(path = %file.path, %error, "Failed to remove orphaned upload");
        }
    }
}

pub async fn health() -> &'static str {
    "ok"
}

#[axum::debug_handler]
pub async fn upload_media(
    Extension(state): Extension<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let mut intake = Intake::default();

    if let Err(error) = receive_parts(&state, multipart, &mut intake).await {
        discard(intake.into_files()).await;
        return Err(error);
    }

    let (source_image, target_video) = match (intake.source_image, intake.target_video) {
        (Some(source_image), Some(target_video)) => (source_image, target_video),
        (source_image, target_video) => {
            discard([source_image, target_video].into_iter().flatten()).await;
            return Err(UploadError::MissingFiles);
        }
    };

    let job_id = job_id(state.names.as_ref());
    info!(
        job_id,
        source_image = %source_image.filename,
        target_video = %target_video.filename,
        "Upload accepted"
    );

    Ok(Json(UploadResponse {
        ok: true,
        job_id,
        source_image,
        target_video,
    }))
}

async fn receive_parts(
    state: &AppState,
    mut multipart: Multipart,
    intake: &mut Intake,
) -> Result<(), UploadError> {
    let mut file_parts = 0usize;

    while let Some(mut field) = multipart.next_field().await? {
        // Parts without a filename are plain form fields
        let Some(original) = field.file_name().map(str::to_owned) else {
            continue;
        };

        file_parts += 1;
        if file_parts > state.max_files {
            return Err(UploadError::TooManyFiles);
        }

        let field_name = field.name().unwrap_or_default().to_owned();
        let Some(slot) = MediaSlot::from_field(&field_name) else {
            debug!(field = %field_name, "Dropping file part with unknown field");
            continue;
        };

        if intake.claimed.contains(&slot) {
            return Err(UploadError::UnexpectedField(slot.field_name()));
        }
        intake.claimed.push(slot);

        let mimetype = normalize_mime(field.content_type());
        if !slot.accepts(&mimetype) {
            debug!(field = %field_name, %mimetype, "Dropping file part with disallowed type");
            continue;
        }

        let stored = store_field(state, slot, &original, mimetype, &mut field).await?;
        *intake.slot_mut(slot) = Some(stored);
    }

    Ok(())
}

async fn store_field(
    state: &AppState,
    slot: MediaSlot,
    original: &str,
    mimetype: String,
    field: &mut Field<'_>,
) -> Result<StoredFile, UploadError> {
    let filename = stored_name(state.names.as_ref(), slot.field_name(), original);
    let path = state.upload_dir().join(&filename);

    // never truncate an earlier upload on a name collision
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|error| {
            error!(%filename, %error, "Failed to create upload file");
            UploadError::Storage(error)
        })?;

    let mut size = 0u64;
    let written: Result<(), UploadError> = async {
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
            if size > state.max_file_size {
                return Err(UploadError::FileTooLarge);
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
    .await;

    if let Err(error) = written {
        if let UploadError::Storage(io) = &error {
            error!(%filename, error = %io, "Failed to write upload file");
        }
        drop(file);
        if let Err(cleanup_error) = tokio::fs::remove_file(&path).await {
            warn!(%filename, error = %cleanup_error, "Failed to remove partial upload");
        }
        return Err(error);
    }

    debug!(%filename, size, "Stored upload part");
    Ok(StoredFile::new(filename, mimetype, size, &path))
}
