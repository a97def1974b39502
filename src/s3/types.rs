//! S3 data types

use aws_sdk_s3::types::ObjectCannedAcl;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

/// Inclusive byte range for partial reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Range covering bytes `start..=end`
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(StorageError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range covering `len` bytes beginning at `offset`
    pub fn from_offset(offset: u64, len: u64) -> Result<Self> {
        match len.checked_sub(1).and_then(|n| offset.checked_add(n)) {
            Some(end) => Ok(Self { start: offset, end }),
            None => Err(StorageError::InvalidRangeLength { offset, len }),
        }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered, never zero
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the HTTP `Range` header
    pub fn to_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Access granted to an uploaded object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    /// Whatever the bucket policy grants
    #[default]
    Private,
    /// Anyone can read the object
    PublicRead,
}

impl Visibility {
    /// Canned ACL to send with the upload, if any
    pub fn acl(&self) -> Option<ObjectCannedAcl> {
        match self {
            Visibility::Private => None,
            Visibility::PublicRead => Some(ObjectCannedAcl::PublicRead),
        }
    }
}

/// HTTP method a presigned URL is valid for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresignedMethod {
    #[default]
    Get,
    Put,
}

/// S3 URL parsed components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Parse an S3 URL (supports s3:// and https:// formats)
    pub fn parse(url: &str) -> Option<Self> {
        // s3://bucket/key format
        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return None;
            }
            return Some(ObjectLocation {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return None;
        }

        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        if !host.ends_with(".amazonaws.com") {
            return None;
        }
        let path = parsed.path().trim_start_matches('/');

        // Virtual-hosted style: bucket.s3.region.amazonaws.com/key
        if let Some((bucket, _)) = host.split_once(".s3.") {
            return Some(ObjectLocation {
                bucket: bucket.to_string(),
                key: path.to_string(),
            });
        }

        // Path style: s3.region.amazonaws.com/bucket/key
        if host.starts_with("s3.") {
            let (bucket, key) = path.split_once('/').unwrap_or((path, ""));
            if bucket.is_empty() {
                return None;
            }
            return Some(ObjectLocation {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }

        None
    }

    /// Convert to s3:// URL format
    pub fn to_s3_url(&self) -> String {
        if self.key.is_empty() {
            format!("s3://{}", self.bucket)
        } else {
            format!("s3://{}/{}", self.bucket, self.key)
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_s3_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_range_header() {
        let range = ByteRange::new(0, 99).unwrap();
        assert_eq!(range.to_header(), "bytes=0-99");
        assert_eq!(range.byte_count(), 100);
    }

    #[test]
    fn test_byte_range_single_byte() {
        let range = ByteRange::new(42, 42).unwrap();
        assert_eq!(range.byte_count(), 1);
        assert_eq!(range.to_header(), "bytes=42-42");
    }

    #[test]
    fn test_byte_range_rejects_reversed() {
        let err = ByteRange::new(10, 5).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRange { start: 10, end: 5 }));
    }

    #[test]
    fn test_byte_range_from_offset() {
        let range = ByteRange::from_offset(1024, 512).unwrap();
        assert_eq!(range.start(), 1024);
        assert_eq!(range.end(), 1535);
        assert_eq!(range.byte_count(), 512);
    }

    #[test]
    fn test_byte_range_from_offset_zero_len() {
        let err = ByteRange::from_offset(0, 0).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRangeLength { offset: 0, len: 0 }));
        assert_eq!(err.to_string(), "invalid byte range: 0 bytes from offset 0");
    }

    #[test]
    fn test_byte_range_from_offset_overflow() {
        let err = ByteRange::from_offset(u64::MAX, 2).unwrap_err();
        assert!(matches!(err, StorageError::InvalidRangeLength { offset: u64::MAX, len: 2 }));
        assert!(ByteRange::from_offset(u64::MAX, 1).is_ok());
    }

    #[test]
    fn test_visibility_acl() {
        assert_eq!(Visibility::Private.acl(), None);
        assert_eq!(Visibility::PublicRead.acl(), Some(ObjectCannedAcl::PublicRead));
        assert_eq!(Visibility::default(), Visibility::Private);
    }

    #[test]
    fn test_visibility_serde() {
        let json = serde_json::to_string(&Visibility::PublicRead).unwrap();
        assert_eq!(json, "\"public-read\"");
    }

    #[test]
    fn test_location_parse_s3_scheme() {
        let loc = ObjectLocation::parse("s3://my-bucket/path/to/file.txt").unwrap();
        assert_eq!(loc.bucket, "my-bucket");
        assert_eq!(loc.key, "path/to/file.txt");
    }

    #[test]
    fn test_location_parse_bucket_only() {
        let loc = ObjectLocation::parse("s3://my-bucket").unwrap();
        assert_eq!(loc.bucket, "my-bucket");
        assert_eq!(loc.key, "");
        assert_eq!(loc.to_s3_url(), "s3://my-bucket");
    }

    #[test]
    fn test_location_parse_virtual_hosted() {
        let loc =
            ObjectLocation::parse("https://my-bucket.s3.eu-west-1.amazonaws.com/path/to/file.txt")
                .unwrap();
        assert_eq!(loc.bucket, "my-bucket");
        assert_eq!(loc.key, "path/to/file.txt");
    }

    #[test]
    fn test_location_parse_path_style() {
        let loc =
            ObjectLocation::parse("https://s3.eu-west-1.amazonaws.com/my-bucket/file.txt").unwrap();
        assert_eq!(loc.bucket, "my-bucket");
        assert_eq!(loc.key, "file.txt");
    }

    #[test]
    fn test_location_parse_invalid() {
        assert!(ObjectLocation::parse("https://example.com/file.txt").is_none());
        assert!(ObjectLocation::parse("ftp://bucket/key").is_none());
        assert!(ObjectLocation::parse("s3:///key").is_none());
        assert!(ObjectLocation::parse("not-a-url").is_none());
        assert!(ObjectLocation::parse("").is_none());
    }

    #[test]
    fn test_location_display() {
        let loc = ObjectLocation {
            bucket: "test-bucket".to_string(),
            key: "folder/file.txt".to_string(),
        };
        assert_eq!(loc.to_string(), "s3://test-bucket/folder/file.txt");
    }
}
