//! S3 Storage Library
//!
//! A thin wrapper around the AWS S3 SDK: it builds a client from explicit
//! credentials, the environment or the default credential chain, and passes
//! uploads, downloads, ranged reads, deletes and presigned URLs straight
//! through to the SDK.

pub mod error;
pub mod s3;
pub mod settings;

pub use error::{Result, StorageError};
pub use s3::{ByteRange, PresignedMethod, S3Storage, StorageOptions, Visibility};
