use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use tracing::{error, warn};
use uuid::Uuid;

use lantern_store::policy;
use lantern_types::api::Submission;
use lantern_types::models::{FileMeta, MessageContent, SubmitKind};

use crate::state::AppState;

/// 50 MB upload limit for files
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

fn bad_request(message: &str) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
}

#[derive(Default)]
struct UploadForm {
    file: Option<(String, String, Vec<u8>)>,
    channel_id: Option<String>,
    username: Option<String>,
    userid: Option<String>,
    client_id: Option<String>,
    quoted_message_id: Option<String>,
}

/// POST /api/upload — store the blob under the upload directory and answer
/// its descriptor `{url, originalName, mimeType, size}`.
///
/// When the form also names a `channelId`, a `type=file` message travels the
/// normal submit path (persist, then broadcast) as a side effect; a failure
/// there is logged but never fails the upload response.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<FileMeta>, ErrorResponse> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("malformed multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let original_name = field.file_name().unwrap_or("upload.bin").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("malformed multipart body"))?;
                if bytes.len() > MAX_FILE_SIZE {
                    return Err((
                        StatusCode::PAYLOAD_TOO_LARGE,
                        Json(serde_json::json!({ "error": "file too large" })),
                    ));
                }
                form.file = Some((original_name, mime_type, bytes.to_vec()));
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| bad_request("malformed multipart body"))?;
                match name.as_str() {
                    "channelId" => form.channel_id = Some(value),
                    "username" => form.username = Some(value),
                    "userid" => form.userid = Some(value),
                    "clientId" => form.client_id = Some(value),
                    "quotedMessageId" => form.quoted_message_id = Some(value),
                    other => warn!("ignoring unknown upload field {:?}", other),
                }
            }
        }
    }

    let Some((original_name, mime_type, bytes)) = form.file.take() else {
        return Err(bad_request("No file uploaded"));
    };

    // Store under a fresh name, keeping the extension so served URLs stay
    // recognizable.
    let extension = FsPath::new(&original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let stored_name = format!("{}{}", Uuid::new_v4(), extension);

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| {
            error!("failed to create upload directory: {}", e);
            internal_error()
        })?;
    tokio::fs::write(state.upload_dir.join(&stored_name), &bytes)
        .await
        .map_err(|e| {
            error!("failed to store upload {}: {}", stored_name, e);
            internal_error()
        })?;

    let meta = FileMeta {
        url: format!("/uploads/{stored_name}"),
        original_name,
        mime_type,
        size: bytes.len() as u64,
    };

    if form.channel_id.is_some() {
        relay_file_message(&state, &form, meta.clone()).await;
    }

    Ok(Json(meta))
}

fn internal_error() -> ErrorResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "internal error" })),
    )
}

/// Submit the uploaded file into its channel: normalize, persist, broadcast.
async fn relay_file_message(state: &AppState, form: &UploadForm, meta: FileMeta) {
    let submission = Submission {
        channel_id: form.channel_id.clone(),
        username: form.username.clone(),
        userid: form.userid.clone(),
        content: Some(MessageContent::File(meta)),
        kind: Some(SubmitKind::File),
        // Uploads without a client-supplied correlation token still get one,
        // marking the record as API-upload sourced.
        client_id: form
            .client_id
            .clone()
            .or_else(|| Some(format!("from-api-upload-{}", Uuid::new_v4()))),
        quoted_message_id: form.quoted_message_id.clone(),
    };

    let (channel_id, message) = match policy::normalize(submission) {
        Ok(normalized) => normalized,
        Err(e) => {
            warn!("uploaded file not relayed: {}", e);
            return;
        }
    };
    match state.store.append(&channel_id, message).await {
        Ok(message) => state.dispatcher.broadcast_new(&channel_id, message).await,
        Err(e) => error!("failed to log uploaded file to {}: {}", channel_id, e),
    }
}
