//! Upload job descriptor published to the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job describing a freshly uploaded blob that needs processing.
///
/// Serialized as the queue message body. Identity is `blob_name`;
/// there is no separate job id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJob {
    /// Object key of the uploaded blob
    pub blob_name: String,
    /// Container (bucket) the blob was written to
    pub container: String,
    /// When the upload completed
    pub uploaded_utc: DateTime<Utc>,
}

impl UploadJob {
    /// Create a new upload job stamped with the current time.
    pub fn new(blob_name: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            blob_name: blob_name.into(),
            container: container.into(),
            uploaded_utc: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_format_field_names() {
        let job = UploadJob {
            blob_name: "clip1.mp4".to_string(),
            container: "videos".to_string(),
            uploaded_utc: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        };

        let json: serde_json::Value = serde_json::to_value(&job).unwrap();
        assert_eq!(json["blobName"], "clip1.mp4");
        assert_eq!(json["container"], "videos");
        assert_eq!(json["uploadedUtc"], "2024-01-01T12:00:00Z");
    }

    #[test]
    fn test_round_trip() {
        let job = UploadJob::new("a.mp4", "videos");
        let decoded: UploadJob =
            serde_json::from_str(&serde_json::to_string(&job).unwrap()).unwrap();
        assert_eq!(decoded, job);
    }

    #[test]
    fn test_rejects_malformed_body() {
        assert!(serde_json::from_str::<UploadJob>("not-json").is_err());
        assert!(serde_json::from_str::<UploadJob>(r#"{"blobName":"x"}"#).is_err());
    }
}
