use crate::{
    auth::AdminUser,
    errors::ServiceError,
    services::list_preferences::{list_key, PageParams},
    AppState,
};
use axum::extract::Multipart;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Page and page size for a list request, remembered per admin and filter.
pub async fn resolve_paging<F: Serialize>(
    state: &AppState,
    admin: &AdminUser,
    list: &str,
    params: PageParams,
    filter: &F,
) -> Result<(u64, u64), ServiceError> {
    let key = list_key(list, filter);
    let filters = serde_json::to_value(filter).unwrap_or(serde_json::Value::Null);
    state
        .services
        .list_preferences
        .resolve_paging(admin.id, &key, params, filters)
        .await
}

/// A multipart form with one uploaded `file` and any text fields.
#[derive(Debug, Default)]
pub struct Upload {
    pub file: Vec<u8>,
    pub content_type: Option<String>,
    pub fields: HashMap<String, String>,
}

impl Upload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn uuid_field(&self, name: &str) -> Result<Option<Uuid>, ServiceError> {
        self.field(name)
            .map(|v| {
                Uuid::parse_str(v)
                    .map_err(|_| ServiceError::BadRequest(format!("'{}' is not a valid {}", v, name)))
            })
            .transpose()
    }
}

pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, ServiceError> {
    let mut upload = Upload::default();
    let mut seen_file = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                upload.content_type = field.content_type().map(str::to_string);
                upload.file = field
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::BadRequest(format!("Read error: {}", e)))?
                    .to_vec();
                seen_file = true;
            }
            Some(other) => {
                let other = other.to_string();
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServiceError::BadRequest(format!("Read error: {}", e)))?;
                upload.fields.insert(other, value);
            }
            None => {}
        }
    }

    if !seen_file {
        return Err(ServiceError::BadRequest(
            "Missing file in multipart form".to_string(),
        ));
    }
    if upload.file.is_empty() {
        return Err(ServiceError::BadRequest("Uploaded file is empty".into()));
    }
    Ok(upload)
}
