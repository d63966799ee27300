//! Multipart form parsing for uploads.

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};

use crate::middleware::error::AppError;

/// The file part of an upload form.
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus at most one file.
#[derive(Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }
}

/// Read a multipart body, rejecting it once more than `limit` bytes arrive.
///
/// The part named `file_field` is kept as the file; other parts are text.
pub async fn read_form(
    mut payload: Multipart,
    file_field: &str,
    limit: usize,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    let mut received = 0usize;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(String::from),
            ),
            None => continue,
        };

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::BadRequest(e.to_string()))?;
            received += chunk.len();
            if received > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "uploads are limited to {} MB",
                    limit / (1024 * 1024)
                )));
            }
            data.extend_from_slice(&chunk);
        }

        if name == file_field {
            form.file = Some(UploadedFile {
                filename: filename.unwrap_or_default(),
                bytes: data,
            });
        } else {
            let value = String::from_utf8(data)
                .map_err(|_| AppError::BadRequest(format!("field '{name}' is not UTF-8")))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
