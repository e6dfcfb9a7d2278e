//! Resource export: fetch the bytes behind a media node and save them.
//!
//! Fetching and saving are platform concerns, so they sit behind
//! [`ResourceExporter`]. [`export_resource`] holds the platform-independent
//! part: validating the source and naming the saved file.

use bytes::Bytes;
use folio_common::DownloadConfig;
use mime_sniffer::MimeTypeSniffer;

use crate::error::ResourceError;
use crate::node::Node;

/// Bytes fetched for a resource, with the content type the source reported.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedResource {
    pub bytes: Bytes,
    pub mime_type: Option<String>,
}

/// Where a resource ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedResource {
    pub filename: String,
    pub location: String,
    pub size: usize,
}

/// Platform side of the download command.
pub trait ResourceExporter {
    fn fetch(&self, src: &str) -> impl Future<Output = Result<FetchedResource, ResourceError>> + Send;

    fn save(
        &self,
        filename: &str,
        resource: &FetchedResource,
    ) -> impl Future<Output = Result<SavedResource, ResourceError>> + Send;
}

/// File extension for a MIME type: the subtype, up to any `+suffix` or
/// parameters. `image/svg+xml` gives `svg`.
pub fn mime_extension(mime: &str) -> Option<&str> {
    let (_, subtype) = mime.split_once('/')?;
    let subtype = subtype.split([';', '+']).next()?.trim();
    (!subtype.is_empty()).then_some(subtype)
}

/// `<alt or default name>.<extension>`.
///
/// The extension comes from the reported content type, then from sniffing
/// the bytes, then from the configured fallback.
pub fn derive_filename(
    alt: Option<&str>,
    resource: &FetchedResource,
    config: &DownloadConfig,
) -> String {
    let stem = alt
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .unwrap_or(config.default_name.as_str());
    let stem: String = stem
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();

    let extension = resource
        .mime_type
        .as_deref()
        .and_then(mime_extension)
        .or_else(|| resource.bytes.sniff_mime_type().and_then(mime_extension))
        .unwrap_or(config.fallback_extension.as_str());
    format!("{stem}.{extension}")
}

/// Download the resource `src` of `node` through `exporter`.
///
/// Never touches the document; a failure aborts only this download.
#[tracing::instrument(skip_all, fields(src = %src))]
pub async fn export_resource(
    exporter: &impl ResourceExporter,
    node: &Node,
    src: &str,
    config: &DownloadConfig,
) -> Result<SavedResource, ResourceError> {
    if src.trim().is_empty() {
        return Err(ResourceError::EmptySource);
    }
    let resource = exporter.fetch(src).await?;
    let filename = derive_filename(node.attr_str("alt"), &resource, config);
    tracing::debug!(%filename, size = resource.bytes.len(), mime = ?resource.mime_type, "fetched resource");
    let saved = exporter.save(&filename, &resource).await?;
    tracing::info!(location = %saved.location, size = saved.size, "saved resource");
    Ok(saved)
}

#[cfg(feature = "http")]
pub use http::HttpExporter;

#[cfg(feature = "http")]
mod http {
    use std::path::{Path, PathBuf};

    use folio_common::DownloadConfig;
    use reqwest::header::CONTENT_TYPE;
    use tokio::fs;

    use super::{FetchedResource, ResourceExporter, SavedResource};
    use crate::error::ResourceError;

    fn is_remote(src: &str) -> bool {
        src.starts_with("http://") || src.starts_with("https://")
    }

    /// Fetches over HTTP(S), or from disk for local paths, and saves into a
    /// directory.
    #[derive(Debug, Clone)]
    pub struct HttpExporter {
        client: reqwest::Client,
        dir: PathBuf,
    }

    impl HttpExporter {
        pub fn new(dir: impl AsRef<Path>, config: &DownloadConfig) -> Result<Self, ResourceError> {
            let mut builder = reqwest::Client::builder().timeout(config.timeout);
            if let Some(agent) = &config.user_agent {
                builder = builder.user_agent(agent.as_str());
            }
            let client = builder
                .build()
                .map_err(|e| ResourceError::Client(Box::new(e)))?;
            Ok(Self {
                client,
                dir: dir.as_ref().to_path_buf(),
            })
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }
    }

    impl ResourceExporter for HttpExporter {
        async fn fetch(&self, src: &str) -> Result<FetchedResource, ResourceError> {
            let fetch_err = |e: Box<dyn std::error::Error + Send + Sync>| ResourceError::Fetch {
                src: src.to_owned(),
                source: e,
            };

            if !is_remote(src) {
                tracing::debug!(path = src, "reading local resource");
                let data = fs::read(src).await.map_err(|e| fetch_err(Box::new(e)))?;
                return Ok(FetchedResource {
                    bytes: data.into(),
                    mime_type: None,
                });
            }

            let response = self
                .client
                .get(src)
                .send()
                .await
                .map_err(|e| fetch_err(Box::new(e)))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ResourceError::Status {
                    src: src.to_owned(),
                    status: status.as_u16(),
                });
            }
            let mime_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let bytes = response.bytes().await.map_err(|e| fetch_err(Box::new(e)))?;
            Ok(FetchedResource { bytes, mime_type })
        }

        async fn save(
            &self,
            filename: &str,
            resource: &FetchedResource,
        ) -> Result<SavedResource, ResourceError> {
            let save_err = |e: std::io::Error| ResourceError::Save {
                filename: filename.to_owned(),
                source: Box::new(e),
            };
            fs::create_dir_all(&self.dir).await.map_err(save_err)?;
            let path = self.dir.join(filename);
            fs::write(&path, &resource.bytes).await.map_err(save_err)?;
            Ok(SavedResource {
                filename: filename.to_owned(),
                location: path.display().to_string(),
                size: resource.bytes.len(),
            })
        }
    }
}
