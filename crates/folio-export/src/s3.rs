//! S3 upload of export artifacts.

use std::error::Error;

use aws_sdk_s3::Client;
use tokio::runtime::Runtime;

use crate::artifact::ExportArtifact;
use crate::error::UploadError;
use crate::upload::ArtifactUploader;

/// Configuration for S3 uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// S3 bucket name.
    pub bucket: String,
    /// AWS region.
    pub region: String,
    /// S3-compatible endpoint URL.
    pub endpoint: Option<String>,
    /// Optional key prefix within the bucket.
    pub prefix: Option<String>,
}

/// Uploads artifacts to an S3 bucket.
///
/// Owns a tokio runtime and blocks on each upload, so it must not be called
/// from inside another runtime.
pub struct S3Uploader {
    config: S3Config,
    client: Client,
    runtime: Runtime,
}

impl S3Uploader {
    /// Create an uploader, loading AWS credentials from the environment.
    pub fn new(config: S3Config) -> Result<Self, UploadError> {
        let runtime = Runtime::new()?;
        let client = runtime.block_on(build_client(&config));
        Ok(Self {
            config,
            client,
            runtime,
        })
    }

    async fn put(&self, key: &str, artifact: &ExportArtifact) -> Result<(), UploadError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(artifact.bytes.clone().into())
            .content_type(artifact.mime_type)
            .send()
            .await
            .map_err(|e| UploadError::S3(error_chain(&e)))?;
        Ok(())
    }
}

impl ArtifactUploader for S3Uploader {
    fn upload(&self, artifact: &ExportArtifact) -> Result<String, UploadError> {
        let key = build_key(self.config.prefix.as_deref(), &artifact.filename);
        self.runtime.block_on(self.put(&key, artifact))?;
        tracing::debug!(key = %key, "Uploaded");
        Ok(object_url(&self.config, &key))
    }
}

async fn build_client(config: &S3Config) -> Client {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()));

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;

    // Custom endpoints (MinIO, LocalStack) need path-style addressing.
    if config.endpoint.is_some() {
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();
        return Client::from_conf(s3_config);
    }

    Client::new(&sdk_config)
}

fn build_key(prefix: Option<&str>, filename: &str) -> String {
    match prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{prefix}/{filename}"),
        None => filename.to_owned(),
    }
}

fn object_url(config: &S3Config, key: &str) -> String {
    match &config.endpoint {
        Some(endpoint) => format!(
            "{}/{}/{key}",
            endpoint.trim_end_matches('/'),
            config.bucket
        ),
        None => format!(
            "https://{}.s3.{}.amazonaws.com/{key}",
            config.bucket, config.region
        ),
    }
}

/// Walk the error source chain and join all messages.
fn error_chain(err: &dyn Error) -> String {
    let mut msgs = vec![err.to_string()];
    let mut source = err.source();
    while let Some(s) = source {
        msgs.push(s.to_string());
        source = s.source();
    }
    msgs.join(": ")
}
