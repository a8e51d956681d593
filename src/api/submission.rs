//! Reads a create/update request body into a field map plus optional image.
//!
//! `multipart/form-data` is the primary shape (scalar text fields, nested
//! objects as JSON strings, a `profileImage` file part). A plain JSON object
//! body is also accepted, in which case nested objects may be raw.

use actix_multipart::Multipart;
use actix_web::{HttpMessage, HttpRequest, web};
use futures_util::StreamExt;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::media::ImageUpload;

pub const IMAGE_FIELD: &str = "profileImage";
const MAX_TEXT_BYTES: usize = 64 * 1024;
const MAX_JSON_BYTES: usize = 256 * 1024;

#[derive(Debug, Default)]
pub struct Submission {
    pub fields: Map<String, Value>,
    pub image: Option<ImageUpload>,
}

pub async fn read_submission(
    req: &HttpRequest,
    payload: web::Payload,
    max_image_bytes: usize,
) -> Result<Submission, ApiError> {
    match req.content_type() {
        "multipart/form-data" => read_multipart(req, payload, max_image_bytes).await,
        "application/json" => read_json(payload).await,
        "" => Ok(Submission::default()),
        other => Err(ApiError::rejected(format!("Unsupported content type {other}"))),
    }
}

async fn read_json(mut payload: web::Payload) -> Result<Submission, ApiError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|_| ApiError::rejected("Malformed request body"))?;
        if body.len() + chunk.len() > MAX_JSON_BYTES {
            return Err(ApiError::rejected("Request body is too large"));
        }
        body.extend_from_slice(&chunk);
    }

    if body.is_empty() {
        return Ok(Submission::default());
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => Ok(Submission {
            fields,
            image: None,
        }),
        _ => Err(ApiError::rejected("Request body must be a JSON object")),
    }
}

async fn read_multipart(
    req: &HttpRequest,
    payload: web::Payload,
    max_image_bytes: usize,
) -> Result<Submission, ApiError> {
    let mut multipart = Multipart::new(req.headers(), payload);
    let mut submission = Submission::default();

    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|_| ApiError::rejected("Malformed multipart body"))?;
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        let is_image = name == IMAGE_FIELD;
        let limit = if is_image { max_image_bytes } else { MAX_TEXT_BYTES };
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|_| ApiError::rejected("Malformed multipart body"))?;
            if bytes.len() + chunk.len() > limit {
                return Err(if is_image {
                    ApiError::rejected("Profile image is too large")
                } else {
                    ApiError::rejected(format!("Field {name} is too large"))
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        if is_image {
            // Browsers send an empty part when no file was chosen.
            if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                continue;
            }
            debug!(size = bytes.len(), content_type = %content_type, "Received profile image");
            submission.image = Some(ImageUpload {
                file_name: file_name.unwrap_or_else(|| "upload".to_string()),
                content_type,
                bytes,
            });
        } else {
            let text = String::from_utf8(bytes).map_err(|_| ApiError::invalid_field(&name))?;
            submission.fields.insert(name, Value::String(text));
        }
    }

    Ok(submission)
}
