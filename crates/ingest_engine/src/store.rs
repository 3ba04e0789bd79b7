use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use ingest_logging::ingest_debug;

/// Bucket and region objects are published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub bucket: String,
    pub region: String,
}

impl StorageLocation {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// `https://s3-{region}.amazonaws.com/{bucket}/{key}`. Existing consumers
    /// depend on this exact shape.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://s3-{region}.amazonaws.com/{bucket}/{key}",
            region = self.region,
            bucket = self.bucket,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectAcl {
    PublicRead,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub key: String,
    pub body: Bytes,
    pub content_type: String,
    pub acl: ObjectAcl,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to store {key}: {message}")]
pub struct StorageError {
    pub key: String,
    pub message: String,
}

impl StorageError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Write-only object storage. One attempt per call; no retries.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, object: PutObject) -> Result<(), StorageError>;
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Client built from the default AWS credential chain, pinned to the
    /// location's region.
    pub async fn connect(location: &StorageLocation) -> Self {
        let config = aws_config::from_env()
            .region(aws_config::Region::new(location.region.clone()))
            .load()
            .await;
        Self::new(aws_sdk_s3::Client::new(&config), location.bucket.clone())
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, object: PutObject) -> Result<(), StorageError> {
        let acl = match object.acl {
            ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
        };
        ingest_debug!(
            "PUT s3://{}/{} ({} bytes, {})",
            self.bucket,
            object.key,
            object.body.len(),
            object.content_type
        );
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type)
            .acl(acl)
            .send()
            .await
            .map_err(|err| StorageError::new(&object.key, DisplayErrorContext(&err).to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::StorageLocation;

    #[test]
    fn public_url_shape() {
        let location = StorageLocation::new("b", "r");
        assert_eq!(location.public_url("k"), "https://s3-r.amazonaws.com/b/k");
    }
}
