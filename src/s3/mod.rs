//! S3 client wrapper module
//!
//! This module provides AWS S3 functionality including:
//! - [`client::S3Storage`] - Upload, download, ranged read, delete and presigned URLs
//! - [`credentials::ResolvedConfig`] - Credential and region resolution
//! - [`types`] - S3 data types (ByteRange, Visibility, ObjectLocation)

pub mod client;
pub mod credentials;
pub mod types;

// Re-export commonly used types
pub use client::S3Storage;
pub use credentials::{CredentialSource, ResolvedConfig, StorageOptions};
pub use types::{ByteRange, ObjectLocation, PresignedMethod, Visibility};
