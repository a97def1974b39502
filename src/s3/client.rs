//! AWS S3 client wrapper

use std::path::Path;
use std::time::Duration;

use aws_config::default_provider::region::DefaultRegionChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::s3::credentials::{
    check_region, validate_region, CredentialSource, ResolvedConfig, StorageOptions,
};
use crate::s3::types::{ByteRange, PresignedMethod, Visibility};

const PROVIDER_NAME: &str = "s3-storage";

/// S3 client wrapper bound to one region and an optional default bucket
///
/// Dropping the wrapper drops the SDK client and its connection pool.
pub struct S3Storage {
    client: Client,
    region: String,
    default_bucket: Option<String>,
}

impl S3Storage {
    /// Create a client from explicit credentials
    pub async fn with_credentials(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self> {
        Self::with_options(StorageOptions {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            region: Some(region.into()),
            ..Default::default()
        })
        .await
    }

    /// Create a client from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and
    /// `AWS_REGION`, falling back to the default credential chain
    pub async fn from_env() -> Result<Self> {
        Self::with_options(StorageOptions::default()).await
    }

    /// Create a client for `region` using the default credential chain
    pub async fn with_region(region: impl Into<String>) -> Result<Self> {
        let region = region.into();
        validate_region(&region)?;
        Self::from_resolved(ResolvedConfig {
            credentials: CredentialSource::DefaultChain,
            region: Some(region),
            profile: None,
            default_bucket: None,
            endpoint_url: None,
            force_path_style: false,
        })
        .await
    }

    /// Create a client from options, consulting the process environment and
    /// the default chain for anything the options leave out
    pub async fn with_options(options: StorageOptions) -> Result<Self> {
        let resolved = ResolvedConfig::from_process_env(options)?;
        Self::from_resolved(resolved).await
    }

    /// Build the SDK client from an already resolved configuration
    pub async fn from_resolved(resolved: ResolvedConfig) -> Result<Self> {
        let ResolvedConfig {
            credentials,
            region,
            profile,
            default_bucket,
            endpoint_url,
            force_path_style,
        } = resolved;

        let (builder, region) = match credentials {
            CredentialSource::Static {
                access_key_id,
                secret_access_key,
            } => {
                let region = match region {
                    Some(region) => region,
                    None => default_chain_region(profile.as_deref())
                        .await
                        .ok_or(StorageError::MissingRegion)?,
                };
                check_region(&region, endpoint_url.as_deref())?;
                let credentials =
                    Credentials::new(access_key_id, secret_access_key, None, None, PROVIDER_NAME);
                let builder = aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new(region.clone()))
                    .credentials_provider(credentials);
                (builder, region)
            }
            CredentialSource::DefaultChain => {
                let mut loader = aws_config::defaults(BehaviorVersion::latest());
                if let Some(ref profile) = profile {
                    loader = loader.profile_name(profile);
                }
                if let Some(ref region) = region {
                    loader = loader.region(Region::new(region.clone()));
                }
                let sdk_config = loader.load().await;

                let region = sdk_config
                    .region()
                    .map(|r| r.to_string())
                    .ok_or(StorageError::MissingRegion)?;
                check_region(&region, endpoint_url.as_deref())?;

                (aws_sdk_s3::config::Builder::from(&sdk_config), region)
            }
        };

        let mut builder = builder.force_path_style(force_path_style);
        if let Some(ref endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            region = %region,
            endpoint = ?endpoint_url,
            default_bucket = ?default_bucket,
            "S3 storage initialized"
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
            region,
            default_bucket,
        })
    }

    /// The region the client was built for
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn default_bucket(&self) -> Option<&str> {
        self.default_bucket.as_deref()
    }

    /// Replace the bucket used when an operation gets no override
    pub fn set_default_bucket(&mut self, bucket: Option<String>) {
        self.default_bucket = bucket.filter(|b| !b.is_empty());
        info!(default_bucket = ?self.default_bucket, "Default bucket changed");
    }

    /// The underlying SDK client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Pick the override if present, else the default bucket
    pub fn resolve_bucket<'a>(&'a self, bucket: Option<&'a str>) -> Result<&'a str> {
        bucket
            .filter(|b| !b.is_empty())
            .or(self.default_bucket.as_deref())
            .ok_or(StorageError::MissingBucket)
    }

    /// Open a stream over the object's body
    pub async fn get_object_stream(&self, key: &str, bucket: Option<&str>) -> Result<ByteStream> {
        let bucket = self.resolve_bucket(bucket)?;
        debug!(bucket, key, "get_object");

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        Ok(response.body)
    }

    /// Download the whole object into memory
    pub async fn get_object_bytes(&self, key: &str, bucket: Option<&str>) -> Result<Bytes> {
        let body = self.get_object_stream(key, bucket).await?;
        let data = body.collect().await?;
        Ok(data.into_bytes())
    }

    /// Fetch the bytes in `range`
    ///
    /// A range running past the end of the object returns the bytes that exist.
    pub async fn get_object_range(
        &self,
        key: &str,
        range: ByteRange,
        bucket: Option<&str>,
    ) -> Result<Bytes> {
        let bucket = self.resolve_bucket(bucket)?;
        debug!(bucket, key, range = %range.to_header(), "get_object range");

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .range(range.to_header())
            .send()
            .await?;

        let data = response.body.collect().await?;
        Ok(data.into_bytes())
    }

    /// Upload a stream as an object
    pub async fn put_object(&self, key: &str, body: ByteStream, bucket: Option<&str>) -> Result<()> {
        let bucket = self.resolve_bucket(bucket)?;
        debug!(bucket, key, "put_object");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await?;

        Ok(())
    }

    /// Upload a stream with a content type and visibility
    pub async fn put_object_with_content_type(
        &self,
        key: &str,
        body: ByteStream,
        content_type: &str,
        visibility: Visibility,
        bucket: Option<&str>,
    ) -> Result<()> {
        let bucket = self.resolve_bucket(bucket)?;
        debug!(bucket, key, content_type, ?visibility, "put_object");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .set_acl(visibility.acl())
            .send()
            .await?;

        Ok(())
    }

    /// Delete an object
    pub async fn delete_object(&self, key: &str, bucket: Option<&str>) -> Result<()> {
        let bucket = self.resolve_bucket(bucket)?;
        debug!(bucket, key, "delete_object");

        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        info!(bucket, key, "Object deleted");
        Ok(())
    }

    /// Sign a URL granting `method` access to the object for `expires_in`
    pub async fn presigned_url(
        &self,
        key: &str,
        expires_in: Duration,
        method: PresignedMethod,
        bucket: Option<&str>,
    ) -> Result<String> {
        let bucket = self.resolve_bucket(bucket)?;
        debug!(bucket, key, ?method, expires_in = expires_in.as_secs(), "presign");

        let presigning_config = PresigningConfig::expires_in(expires_in)?;

        let presigned = match method {
            PresignedMethod::Get => {
                self.client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .presigned(presigning_config)
                    .await?
            }
            PresignedMethod::Put => {
                self.client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .presigned(presigning_config)
                    .await?
            }
        };

        Ok(presigned.uri().to_string())
    }

    /// Stream an object into a local file, returning the bytes written
    pub async fn download_to_file(
        &self,
        key: &str,
        path: &Path,
        bucket: Option<&str>,
    ) -> Result<u64> {
        let body = self.get_object_stream(key, bucket).await?;
        let reader = body.into_async_read();
        tokio::pin!(reader);
        let mut file = tokio::fs::File::create(path).await?;

        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        debug!(key, path = %path.display(), bytes = written, "Downloaded to file");
        Ok(written)
    }

    /// Stream a local file into an object
    ///
    /// With a content type the upload goes through
    /// [`S3Storage::put_object_with_content_type`], otherwise [`S3Storage::put_object`].
    pub async fn upload_file(
        &self,
        path: &Path,
        key: &str,
        content_type: Option<&str>,
        visibility: Visibility,
        bucket: Option<&str>,
    ) -> Result<()> {
        let body = ByteStream::from_path(path).await?;

        match content_type {
            Some(content_type) => {
                self.put_object_with_content_type(key, body, content_type, visibility, bucket)
                    .await
            }
            None if visibility == Visibility::Private => self.put_object(key, body, bucket).await,
            None => {
                self.put_object_with_content_type(
                    key,
                    body,
                    "application/octet-stream",
                    visibility,
                    bucket,
                )
                .await
            }
        }
    }
}

/// Region from the SDK's default region chain: `AWS_REGION`,
/// `AWS_DEFAULT_REGION`, the profile's `region`, then instance metadata
async fn default_chain_region(profile: Option<&str>) -> Option<String> {
    let mut chain = DefaultRegionChain::builder();
    if let Some(profile) = profile {
        chain = chain.profile_name(profile);
    }
    chain.build().region().await.map(|r| r.to_string())
}

impl std::fmt::Debug for S3Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Storage")
            .field("region", &self.region)
            .field("default_bucket", &self.default_bucket)
            .finish_non_exhaustive()
    }
}
