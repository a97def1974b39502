//! S3 Storage command line
//!
//! Drives the storage client from the shell: download, ranged read, upload,
//! delete and presigned URLs. Keys may be plain keys or `s3://bucket/key` URLs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use s3_storage::s3::ObjectLocation;
use s3_storage::settings::Settings;
use s3_storage::{ByteRange, PresignedMethod, S3Storage, Visibility};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "s3-storage", version)]
#[command(about = "Upload, download and sign S3 objects", long_about = None)]
struct Cli {
    /// Bucket to use instead of the default bucket
    #[arg(short, long, global = true)]
    bucket: Option<String>,

    /// AWS region
    #[arg(long, global = true)]
    region: Option<String>,

    /// Named AWS profile for the default credential chain
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Custom S3 endpoint, e.g. http://localhost:9000
    #[arg(long, global = true)]
    endpoint_url: Option<String>,

    /// Use path-style addressing
    #[arg(long, global = true)]
    path_style: bool,

    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download an object to a file or stdout
    Get {
        key: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print an inclusive byte range of an object
    Range { key: String, start: u64, end: u64 },

    /// Upload a file
    Put {
        file: PathBuf,
        key: String,
        #[arg(long)]
        content_type: Option<String>,
        /// Make the object publicly readable
        #[arg(long)]
        public: bool,
    },

    /// Delete an object
    Rm { key: String },

    /// Print a presigned URL
    Presign {
        key: String,
        /// Lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        expires: u64,
        /// Sign for upload instead of download
        #[arg(long)]
        put: bool,
    },

    /// Remember a default bucket for later invocations
    SetDefaultBucket { name: String },
}

/// Split an `s3://` URL into key and bucket, or pass a plain key through
fn target(key: &str, bucket: Option<&str>) -> (String, Option<String>) {
    match ObjectLocation::parse(key) {
        Some(loc) => (loc.key, Some(loc.bucket)),
        None => (key.to_string(), bucket.map(|b| b.to_string())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let settings_path = match cli.settings {
        Some(ref path) => path.clone(),
        None => Settings::settings_path()?,
    };
    let mut settings = Settings::load_from(&settings_path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings, using defaults: {}", e);
        Settings::default()
    });

    if let Commands::SetDefaultBucket { ref name } = cli.command {
        settings.set_default_bucket(Some(name));
        settings.save_to(&settings_path)?;
        println!("Default bucket set to {}", name);
        return Ok(());
    }

    let mut options = settings.to_options();
    if cli.region.is_some() {
        options.region = cli.region.clone();
    }
    if cli.profile.is_some() {
        options.profile = cli.profile.clone();
    }
    if cli.endpoint_url.is_some() {
        options.endpoint_url = cli.endpoint_url.clone();
    }
    options.force_path_style |= cli.path_style;

    let storage = S3Storage::with_options(options)
        .await
        .context("Failed to create S3 client")?;

    match cli.command {
        Commands::Get { key, output } => {
            let (key, bucket) = target(&key, cli.bucket.as_deref());
            match output {
                Some(path) => {
                    let written = storage
                        .download_to_file(&key, &path, bucket.as_deref())
                        .await
                        .with_context(|| format!("Failed to download {}", key))?;
                    tracing::info!("Downloaded {} bytes to {}", written, path.display());
                }
                None => {
                    let data = storage
                        .get_object_bytes(&key, bucket.as_deref())
                        .await
                        .with_context(|| format!("Failed to download {}", key))?;
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&data).await?;
                    stdout.flush().await?;
                }
            }
        }
        Commands::Range { key, start, end } => {
            let (key, bucket) = target(&key, cli.bucket.as_deref());
            let range = ByteRange::new(start, end)?;
            let data = storage
                .get_object_range(&key, range, bucket.as_deref())
                .await
                .with_context(|| format!("Failed to read {} of {}", range.to_header(), key))?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        Commands::Put {
            file,
            key,
            content_type,
            public,
        } => {
            let (key, bucket) = target(&key, cli.bucket.as_deref());
            let visibility = if public {
                Visibility::PublicRead
            } else {
                Visibility::Private
            };
            storage
                .upload_file(&file, &key, content_type.as_deref(), visibility, bucket.as_deref())
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?;
            tracing::info!("Uploaded: {}", key);
        }
        Commands::Rm { key } => {
            let (key, bucket) = target(&key, cli.bucket.as_deref());
            storage
                .delete_object(&key, bucket.as_deref())
                .await
                .with_context(|| format!("Failed to delete {}", key))?;
        }
        Commands::Presign { key, expires, put } => {
            let (key, bucket) = target(&key, cli.bucket.as_deref());
            let method = if put {
                PresignedMethod::Put
            } else {
                PresignedMethod::Get
            };
            let url = storage
                .presigned_url(&key, Duration::from_secs(expires), method, bucket.as_deref())
                .await
                .with_context(|| format!("Failed to presign {}", key))?;
            println!("{}", url);
        }
        // Handled before the client is built
        Commands::SetDefaultBucket { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_plain_key_keeps_bucket_flag() {
        let (key, bucket) = target("docs/readme.md", Some("flag-bucket"));
        assert_eq!(key, "docs/readme.md");
        assert_eq!(bucket.as_deref(), Some("flag-bucket"));
    }

    #[test]
    fn test_target_s3_url_overrides_bucket() {
        let (key, bucket) = target("s3://url-bucket/a/b.txt", Some("flag-bucket"));
        assert_eq!(key, "a/b.txt");
        assert_eq!(bucket.as_deref(), Some("url-bucket"));
    }

    #[test]
    fn test_cli_parses_presign() {
        let cli = Cli::parse_from(["s3-storage", "--bucket", "media", "presign", "x.jpg", "--put"]);
        assert_eq!(cli.bucket.as_deref(), Some("media"));
        match cli.command {
            Commands::Presign { key, expires, put } => {
                assert_eq!(key, "x.jpg");
                assert_eq!(expires, 3600);
                assert!(put);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
