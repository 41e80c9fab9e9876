//! Video upload and streaming handlers.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Stored object name
    pub name: String,
    /// Retrieval path
    pub url: String,
}

/// Reject names that would escape the container namespace.
fn is_valid_blob_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 1024
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}

/// Upload a video.
///
/// POST /videos (multipart/form-data; field `file` required, `name`
/// optionally overrides the stored key)
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut file: Option<(Option<String>, Option<String>, Vec<u8>)> = None;
    let mut name_override: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let field_name = field.name().map(|s| s.to_string());
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("name") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read name: {e}")))?;
                if !value.trim().is_empty() {
                    name_override = Some(value);
                }
            }
            _ => {}
        }
    }

    let Some((file_name, content_type, bytes)) = file else {
        return Err(ApiError::bad_request("Missing file"));
    };
    if bytes.is_empty() {
        return Err(ApiError::bad_request("Missing file"));
    }

    let name = match name_override.or(file_name) {
        Some(n) => n,
        None => return Err(ApiError::bad_request("Missing file name")),
    };
    if !is_valid_blob_name(&name) {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let url = state
        .videos
        .upload(&name, bytes, content_type.as_deref())
        .await?;

    info!(blob_name = %name, "Upload accepted");
    Ok(Json(UploadResponse { name, url }))
}

/// How a Range header resolves against an object of known length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteRange {
    /// Serve the whole object
    Full,
    /// Serve the inclusive byte range
    Slice(u64, u64),
    /// No byte of the request can be satisfied
    Unsatisfiable,
}

/// Resolve a single `bytes=` range against `len`. Malformed or
/// multi-part ranges fall back to serving the full object.
fn resolve_range(header: Option<&str>, len: u64) -> ByteRange {
    let Some(header) = header else {
        return ByteRange::Full;
    };
    let Some(spec) = header.strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }

    let Some((start, end)) = spec.split_once('-') else {
        return ByteRange::Full;
    };

    match (start.is_empty(), end.is_empty()) {
        // "-n": final n bytes
        (true, false) => match end.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(n) if len > 0 => ByteRange::Slice(len.saturating_sub(n), len - 1),
            Ok(_) => ByteRange::Unsatisfiable,
            Err(_) => ByteRange::Full,
        },
        // "a-": from a to the end
        (false, true) => match start.parse::<u64>() {
            Ok(a) if a < len => ByteRange::Slice(a, len - 1),
            Ok(_) => ByteRange::Unsatisfiable,
            Err(_) => ByteRange::Full,
        },
        // "a-b"
        (false, false) => match (start.parse::<u64>(), end.parse::<u64>()) {
            (Ok(a), Ok(b)) if a <= b && a < len => ByteRange::Slice(a, b.min(len - 1)),
            (Ok(_), Ok(_)) => ByteRange::Unsatisfiable,
            _ => ByteRange::Full,
        },
        (true, true) => ByteRange::Full,
    }
}

/// Stream a stored video with range request support.
///
/// GET /videos/{name}
pub async fn stream_video(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    if !is_valid_blob_name(&name) {
        return Err(ApiError::bad_request("Invalid file name"));
    }

    let object = state.videos.download(&name).await?;
    let len = object.bytes.len() as u64;

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, &object.content_type)
        .header(header::ACCEPT_RANGES, "bytes");

    let response = match resolve_range(range_header.as_deref(), len) {
        ByteRange::Full => builder
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, len)
            .body(Body::from(object.bytes)),
        ByteRange::Slice(start, end) => {
            let slice = object.bytes[start as usize..=end as usize].to_vec();
            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{len}"))
                .header(header::CONTENT_LENGTH, slice.len())
                .body(Body::from(slice))
        }
        ByteRange::Unsatisfiable => builder
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{len}"))
            .body(Body::empty()),
    };

    response.map_err(|e| ApiError::internal(format!("Failed to build response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_range_full_when_absent_or_malformed() {
        assert_eq!(resolve_range(None, 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("items=0-1"), 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("bytes=abc-def"), 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("bytes=0-1,5-9"), 100), ByteRange::Full);
        assert_eq!(resolve_range(Some("bytes=-"), 100), ByteRange::Full);
    }

    #[test]
    fn test_resolve_range_bounded() {
        assert_eq!(resolve_range(Some("bytes=0-9"), 100), ByteRange::Slice(0, 9));
        assert_eq!(
            resolve_range(Some("bytes=50-200"), 100),
            ByteRange::Slice(50, 99)
        );
    }

    #[test]
    fn test_resolve_range_open_ended() {
        assert_eq!(
            resolve_range(Some("bytes=90-"), 100),
            ByteRange::Slice(90, 99)
        );
        assert_eq!(resolve_range(Some("bytes=-10"), 100), ByteRange::Slice(90, 99));
        assert_eq!(resolve_range(Some("bytes=-200"), 100), ByteRange::Slice(0, 99));
    }

    #[test]
    fn test_resolve_range_unsatisfiable() {
        assert_eq!(
            resolve_range(Some("bytes=100-"), 100),
            ByteRange::Unsatisfiable
        );
        assert_eq!(
            resolve_range(Some("bytes=150-200"), 100),
            ByteRange::Unsatisfiable
        );
        assert_eq!(resolve_range(Some("bytes=-0"), 100), ByteRange::Unsatisfiable);
        assert_eq!(resolve_range(Some("bytes=0-0"), 0), ByteRange::Unsatisfiable);
    }

    #[test]
    fn test_blob_name_validation() {
        assert!(is_valid_blob_name("clip1.mp4"));
        assert!(!is_valid_blob_name(""));
        assert!(!is_valid_blob_name("../etc/passwd"));
        assert!(!is_valid_blob_name("a/b.mp4"));
        assert!(!is_valid_blob_name("a\\b.mp4"));
    }
}
