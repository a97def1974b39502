//! Error type for storage operations

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfigError;
use aws_sdk_s3::primitives::ByteStreamError;

/// Errors returned by [`crate::s3::S3Storage`]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No region in the options, the environment or the default chain
    #[error("no AWS region configured")]
    MissingRegion,

    #[error("unrecognized AWS region '{0}'")]
    InvalidRegion(String),

    /// Neither a bucket override nor a default bucket was given
    #[error("no bucket given and no default bucket configured")]
    MissingBucket,

    #[error("invalid byte range {start}-{end}")]
    InvalidRange { start: u64, end: u64 },

    /// A length-based range that is empty or runs past `u64::MAX`
    #[error("invalid byte range: {len} bytes from offset {offset}")]
    InvalidRangeLength { offset: u64, len: u64 },

    /// Any S3 operation failure, passed through from the SDK
    #[error(transparent)]
    Sdk(Box<aws_sdk_s3::Error>),

    #[error("object body: {0}")]
    Body(#[from] ByteStreamError),

    #[error("presigning: {0}")]
    Presigning(#[from] PresigningConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<E, R> From<SdkError<E, R>> for StorageError
where
    aws_sdk_s3::Error: From<SdkError<E, R>>,
{
    fn from(err: SdkError<E, R>) -> Self {
        StorageError::Sdk(Box::new(aws_sdk_s3::Error::from(err)))
    }
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;
