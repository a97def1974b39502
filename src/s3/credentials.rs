//! AWS credential and region resolution
//!
//! Credentials and region are resolved once, when the storage client is built.
//! Each setting is taken from the first source that provides it:
//! - Explicit [`StorageOptions`] fields
//! - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_REGION`)
//! - The SDK default credential chain (profiles, SSO, container and instance roles)

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};

pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const REGION_VAR: &str = "AWS_REGION";

/// Options accepted by [`crate::s3::S3Storage::with_options`]
///
/// Every field is optional; missing values fall through to the environment
/// and then to the default credential chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageOptions {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub default_bucket: Option<String>,
    /// Named profile for the default credential chain
    #[serde(default)]
    pub profile: Option<String>,
    /// Custom endpoint, e.g. a MinIO server
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

/// Where credentials come from once resolution is done
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Static {
        access_key_id: String,
        secret_access_key: String,
    },
    DefaultChain,
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Static { access_key_id, .. } => f
                .debug_struct("Static")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"** redacted **")
                .finish(),
            CredentialSource::DefaultChain => f.write_str("DefaultChain"),
        }
    }
}

/// Result of resolving [`StorageOptions`] against the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub credentials: CredentialSource,
    /// `None` means the default chain has to supply the region
    pub region: Option<String>,
    /// Profile the default chain reads credentials and region from
    pub profile: Option<String>,
    pub default_bucket: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
}

impl ResolvedConfig {
    /// Resolve options using `env` to look up environment variables.
    ///
    /// An explicit or environment region is checked here, so an unrecognized
    /// region fails before any client is built. With a custom endpoint the
    /// region is passed through unchecked.
    pub fn resolve<F>(options: StorageOptions, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|v| !v.is_empty());

        let explicit_keys = match (
            non_empty(options.access_key_id),
            non_empty(options.secret_access_key),
        ) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        };

        let env_keys = || match (lookup(ACCESS_KEY_ID_VAR), lookup(SECRET_ACCESS_KEY_VAR)) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        };

        let credentials = match explicit_keys.or_else(env_keys) {
            Some((access_key_id, secret_access_key)) => CredentialSource::Static {
                access_key_id,
                secret_access_key,
            },
            None => CredentialSource::DefaultChain,
        };

        let endpoint_url = non_empty(options.endpoint_url);
        let region = non_empty(options.region).or_else(|| lookup(REGION_VAR));
        if let Some(ref r) = region {
            check_region(r, endpoint_url.as_deref())?;
        }

        Ok(Self {
            credentials,
            region,
            profile: non_empty(options.profile),
            default_bucket: non_empty(options.default_bucket),
            endpoint_url,
            force_path_style: options.force_path_style,
        })
    }

    /// Resolve options against the process environment
    pub fn from_process_env(options: StorageOptions) -> Result<Self> {
        Self::resolve(options, |name| std::env::var(name).ok())
    }
}

/// Check `region` unless requests go to a custom endpoint
///
/// S3-compatible services pick their own region names (R2 uses `auto`).
pub fn check_region(region: &str, endpoint_url: Option<&str>) -> Result<()> {
    match endpoint_url {
        Some(_) => Ok(()),
        None => validate_region(region),
    }
}

/// Check that `region` looks like an AWS region code (`us-east-1`, `us-gov-west-1`, ...)
pub fn validate_region(region: &str) -> Result<()> {
    if is_recognized_region(region) {
        Ok(())
    } else {
        Err(StorageError::InvalidRegion(region.to_string()))
    }
}

/// A region code is a two to four letter area, one or more lowercase words, then a number
pub fn is_recognized_region(region: &str) -> bool {
    let segments: Vec<&str> = region.split('-').collect();
    if segments.len() < 3 {
        return false;
    }

    let (area, rest) = (segments[0], &segments[1..]);
    let (number, words) = match rest.split_last() {
        Some(parts) => parts,
        None => return false,
    };

    (2..=4).contains(&area.len())
        && area.bytes().all(|b| b.is_ascii_lowercase())
        && !number.is_empty()
        && number.bytes().all(|b| b.is_ascii_digit())
        && words
            .iter()
            .all(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_lowercase()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
