//! S3-compatible client implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::store::{ObjectStore, StoredObject};

/// Configuration for the S3-compatible client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for most S3-compatible providers)
    pub region: String,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("S3_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("S3_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("S3_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("S3_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("S3_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("S3_BUCKET_NAME")
                .unwrap_or_else(|_| "videos".to_string()),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string()),
        })
    }
}

/// Object store backed by an S3-compatible service.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a new store from configuration.
    pub fn new(config: S3Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vup",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(S3Config::from_env()?))
    }

    /// The bucket this store writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn write(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()> {
        debug!("Writing {} bytes to {}", bytes.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::write_failed(e.to_string()))?;

        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<StoredObject> {
        debug!("Reading {}", key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::read_failed(e.to_string())
                }
            })?;

        let content_type = response
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::read_failed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::Sdk(e.to_string()))
                }
            }
        }
    }
}
