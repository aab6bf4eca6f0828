//! S3 backend for [`ObjectStore`](super::ObjectStore).
//!
//! Works against AWS S3 proper or any S3-compatible endpoint (MinIO,
//! Spaces, ...) via a custom endpoint URL, in which case path-style
//! addressing is used.

use super::{ListChunk, ObjectStore, StoreEntry, StoreError, StoreResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use std::time::Duration;

#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
    public_read: bool,
}

impl S3Store {
    /// Build a client from ambient AWS credentials plus explicit bucket,
    /// region, and optional S3-compatible endpoint.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_read: bool,
    ) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if let Some(endpoint) = &endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket,
            region,
            endpoint_url,
            public_read,
        }
    }
}

/// Map an SDK failure to [`StoreError`], turning service-level 404s into
/// `NotFound` for the given key.
fn map_sdk_error<E>(err: aws_sdk_s3::error::SdkError<E>, key: &str) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    if let aws_sdk_s3::error::SdkError::ServiceError(ref service_err) = err {
        if service_err.raw().status().as_u16() == 404 {
            return StoreError::NotFound(key.to_string());
        }
    }
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> StoreResult<()> {
        let size = bytes.len();
        let acl = self.public_read.then_some(ObjectCannedAcl::PublicRead);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .set_acl(acl)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 put failed");
                StoreError::Unavailable(e.to_string())
            })?;

        tracing::info!(bucket = %self.bucket, key = %key, size_bytes = size, "S3 put ok");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if let aws_sdk_s3::error::SdkError::ServiceError(ref service_err) = err {
                    if service_err.raw().status().as_u16() == 404 {
                        return Ok(false);
                    }
                }
                Err(StoreError::Unavailable(err.to_string()))
            }
        }
    }

    async fn list(
        &self,
        prefix: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> StoreResult<ListChunk> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(limit as i32);
        if let Some(token) = cursor {
            request = request.continuation_token(token);
        }

        let output = request.send().await.map_err(|e| {
            tracing::error!(error = %e, bucket = %self.bucket, prefix = %prefix, "S3 list failed");
            StoreError::Unavailable(e.to_string())
        })?;

        let entries = output
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let last_modified = obj
                    .last_modified()
                    .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), 0));
                Some(StoreEntry {
                    key,
                    size: obj.size().unwrap_or(0),
                    last_modified,
                })
            })
            .collect();

        Ok(ListChunk {
            entries,
            next_cursor: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn copy(&self, src_key: &str, dst_key: &str) -> StoreResult<()> {
        // CopySource is `bucket/key`. Keys produced by the codec stay inside
        // a URL-safe charset, so no percent-encoding is needed here.
        let copy_source = format!("{}/{}", self.bucket, src_key);

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(copy_source)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| map_sdk_error(e, src_key))?;

        tracing::info!(src_key = %src_key, dst_key = %dst_key, "S3 copy ok");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 delete failed");
                StoreError::Unavailable(e.to_string())
            })?;

        tracing::info!(bucket = %self.bucket, key = %key, "S3 delete ok");
        Ok(())
    }

    async fn sign(
        &self,
        key: &str,
        expires_in: Duration,
        disposition: Option<&str>,
    ) -> StoreResult<String> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(key);
        if let Some(value) = disposition {
            request = request.response_content_disposition(value);
        }

        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StoreError::Config(e.to_string()))?;
        let presigned = request
            .presigned(config)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    fn public_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            // Path-style for S3-compatible providers.
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}
