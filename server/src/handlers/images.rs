use crate::response::{ApiError, JsonResponse};
use crate::state::StateRef;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

//--------------------------------------------------------------------------------------------------
// Response types
//--------------------------------------------------------------------------------------------------

const EXTENSION_WHITELIST: [&str; 3] = ["jpg", "png", "gif"];
const UPLOAD_ROOT: &str = "uploads";
const FILE_FIELD: &str = "file";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub path: String,
}

pub enum UploadError {
    NoFile,
    FileTooBig(u64),
    ExtensionNotAllowed,
    MalformedUpload,
    StorageError,
}

impl ApiError for UploadError {
    fn response_data(&self) -> (StatusCode, &'static str, String) {
        match self {
            UploadError::NoFile => (
                StatusCode::BAD_REQUEST,
                "no_file",
                "Please select an image".to_string(),
            ),
            UploadError::FileTooBig(max_mb) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "file_too_big",
                format!("File size too big (>{} MB)", max_mb),
            ),
            UploadError::ExtensionNotAllowed => (
                StatusCode::BAD_REQUEST,
                "extension_not_allowed",
                "Image extension not supported (.jpg, .gif, .png)".to_string(),
            ),
            UploadError::MalformedUpload => (
                StatusCode::BAD_REQUEST,
                "malformed_upload",
                "Could not read the uploaded file".to_string(),
            ),
            UploadError::StorageError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "Error storing the uploaded file".to_string(),
            ),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Handler
//--------------------------------------------------------------------------------------------------

pub async fn handler(
    State(state): State<StateRef>,
    mut multipart: Multipart,
) -> JsonResponse<UploadResponse, UploadError> {
    // First `file` field wins; anything else in the form is ignored
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(FILE_FIELD) => {
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    warn!("Upload field without a file name");
                    return Err(UploadError::NoFile).into();
                };
                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(err) => {
                        warn!("Failed to read upload body: {}", err);
                        return Err(UploadError::MalformedUpload).into();
                    }
                };
                upload = Some((file_name, data));
                break;
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(err) => {
                warn!("Malformed multipart request: {}", err);
                return Err(UploadError::MalformedUpload).into();
            }
        }
    }

    let Some((file_name, data)) = upload else {
        warn!("Upload request without a file field");
        return Err(UploadError::NoFile).into();
    };

    let max_mb = state.upload().max_size_mb;
    if data.len() as u64 > max_mb * 1024 * 1024 {
        warn!("Upload of {} bytes over the {} MB cap", data.len(), max_mb);
        return Err(UploadError::FileTooBig(max_mb)).into();
    }

    // Only the final path component counts, so a crafted name cannot escape the upload dir
    let Some(file_name) = Path::new(&file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
    else {
        warn!("Upload with unusable file name {:?}", file_name);
        return Err(UploadError::NoFile).into();
    };

    let extension = Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let Some(extension) = extension.filter(|e| EXTENSION_WHITELIST.contains(&e.as_str())) else {
        warn!("Upload with unsupported extension: {:?}", file_name);
        return Err(UploadError::ExtensionNotAllowed).into();
    };

    let dir = PathBuf::from(UPLOAD_ROOT).join(&state.upload().dir);
    let mut target = dir.join(&file_name);

    // De-duplicate: same name and same content is a repeat upload, same name and different
    // content gets a uniquified name
    if fs::try_exists(&target).await.unwrap_or(false) {
        match fs::read(&target).await {
            Ok(existing) if content_hash(&existing) == content_hash(&data) => {
                info!("Upload of {:?} matches existing file", file_name);
                return Ok(UploadResponse {
                    path: target.to_string_lossy().into_owned(),
                })
                .into();
            }
            Ok(_) => {
                let stem = Path::new(&file_name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("upload");
                target = dir.join(format!("{}_{}.{}", stem, uuid::Uuid::new_v4(), extension));
                debug!("Name collision, storing as {:?}", target);
            }
            Err(err) => {
                error!("Failed to read existing file {:?}: {}", target, err);
                return Err(UploadError::StorageError).into();
            }
        }
    }

    if let Err(err) = fs::create_dir_all(&dir).await {
        error!("Failed to create upload directory {:?}: {}", dir, err);
        return Err(UploadError::StorageError).into();
    }

    if let Err(err) = fs::write(&target, &data).await {
        error!("Failed to write upload {:?}: {}", target, err);
        return Err(UploadError::StorageError).into();
    }

    info!("Stored image {:?} ({} bytes)", target, data.len());

    Ok(UploadResponse {
        path: target.to_string_lossy().into_owned(),
    })
    .into()
}

fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable_and_discriminating() {
        assert_eq!(content_hash(b"same"), content_hash(b"same"));
        assert_ne!(content_hash(b"same"), content_hash(b"different"));
    }
}
