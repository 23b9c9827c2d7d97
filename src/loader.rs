//! Asset fetching and decoding.
//!
//! [`ImageLoader`] is the seam between the preloader and the outside world.
//! [`AssetLoader`] is the production implementation: it reads HTTP(S) and
//! `file://` URLs, local paths, and in-memory bytes, then rasterizes SVG or
//! decodes raster formats.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::bitmap::Bitmap;
use crate::error::{ConfigError, DecodeError, LoadError};
use crate::svg::{is_svg, rasterize_svg};

/// Default time allowed for a single asset request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// AssetSource
// ============================================================================

/// Where an image asset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// An `http`, `https`, or `file` URL.
    Url(Url),
    /// A local filesystem path.
    Path(PathBuf),
    /// Bytes already in memory. `name` is used for format sniffing and logs.
    Inline { name: String, bytes: Bytes },
}

impl AssetSource {
    /// Parses a location string.
    ///
    /// Strings with an `http`, `https`, or `file` scheme become URLs;
    /// anything else is a path.
    pub fn parse(location: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAsset {
            location: location.to_string(),
            reason,
        };
        if location.trim().is_empty() {
            return Err(invalid("empty location".into()));
        }
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https" | "file") => Ok(Self::Url(url)),
            Ok(url) if url.scheme().len() > 1 => {
                Err(invalid(format!("unsupported scheme '{}'", url.scheme())))
            }
            // Single-letter schemes are Windows drive letters.
            _ => Ok(Self::Path(PathBuf::from(location))),
        }
    }

    pub fn inline(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::Inline {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Name used in logs and for format detection.
    pub fn name(&self) -> String {
        match self {
            Self::Url(url) => url.to_string(),
            Self::Path(path) => path.display().to_string(),
            Self::Inline { name, .. } => name.clone(),
        }
    }

    /// Directory used to resolve relative references inside an SVG.
    fn resources_dir(&self) -> Option<PathBuf> {
        let path = match self {
            Self::Path(path) => Some(path.clone()),
            Self::Url(url) if url.scheme() == "file" => url.to_file_path().ok(),
            _ => None,
        };
        path.and_then(|p| p.parent().map(Path::to_path_buf))
    }

    /// Resolves `relative` against a base directory or URL.
    ///
    /// Used to expand an asset directory into per-asset sources.
    pub fn join(&self, relative: &str) -> Result<Self, ConfigError> {
        match self {
            Self::Url(url) => {
                let mut base = url.clone();
                if !base.path().ends_with('/') {
                    base.set_path(&format!("{}/", base.path()));
                }
                base.join(relative)
                    .map(Self::Url)
                    .map_err(|e| ConfigError::InvalidAsset {
                        location: relative.to_string(),
                        reason: e.to_string(),
                    })
            }
            Self::Path(dir) => Ok(Self::Path(dir.join(relative))),
            Self::Inline { name, .. } => Err(ConfigError::InvalidAsset {
                location: name.clone(),
                reason: "inline assets cannot be used as a base".into(),
            }),
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<Url> for AssetSource {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<PathBuf> for AssetSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

// ============================================================================
// ImageLoader
// ============================================================================

/// Loads an asset into a decoded bitmap.
///
/// A load either yields a bitmap or fails; it is never retried. The caller
/// decides what to substitute on failure.
pub trait ImageLoader {
    fn load_image(
        &self,
        source: &AssetSource,
    ) -> impl Future<Output = Result<Bitmap, LoadError>> + Send;
}

// ============================================================================
// AssetLoader
// ============================================================================

/// Builder for [`AssetLoader`].
#[derive(Debug, Clone)]
pub struct AssetLoaderBuilder {
    timeout: Duration,
    pixel_ratio: f32,
    user_agent: Option<String>,
}

impl Default for AssetLoaderBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            pixel_ratio: 1.0,
            user_agent: None,
        }
    }
}

impl AssetLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the scale SVG assets are rasterized at.
    pub fn pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<AssetLoader, LoadError> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(ref ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }
        let client = builder.build().map_err(LoadError::Client)?;
        Ok(AssetLoader {
            client,
            pixel_ratio: self.pixel_ratio,
        })
    }
}

/// Fetches assets over HTTP or from disk and decodes them.
///
/// SVG payloads are rasterized at the configured pixel ratio; raster
/// payloads decode at scale 1.0.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    client: reqwest::Client,
    pixel_ratio: f32,
}

impl AssetLoader {
    pub fn builder() -> AssetLoaderBuilder {
        AssetLoaderBuilder::new()
    }

    /// Creates a loader with the default timeout at the given pixel ratio.
    pub fn new(pixel_ratio: f32) -> Result<Self, LoadError> {
        Self::builder().pixel_ratio(pixel_ratio).build()
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Reads the raw payload and, for HTTP, its content type.
    async fn fetch(&self, source: &AssetSource) -> Result<(Bytes, Option<String>), LoadError> {
        match source {
            AssetSource::Url(url) => match url.scheme() {
                "http" | "https" => self.fetch_http(url).await,
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| LoadError::UnsupportedSource(url.to_string()))?;
                    Ok((read_file(&path).await?, None))
                }
                _ => Err(LoadError::UnsupportedSource(url.to_string())),
            },
            AssetSource::Path(path) => Ok((read_file(path).await?, None)),
            AssetSource::Inline { bytes, .. } => Ok((bytes.clone(), None)),
        }
    }

    async fn fetch_http(&self, url: &Url) -> Result<(Bytes, Option<String>), LoadError> {
        let request_error = |source| LoadError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.ok().filter(|t| !t.trim().is_empty());
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(request_error)?;
        Ok((body, content_type))
    }

    fn decode(
        &self,
        source: &AssetSource,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<Bitmap, LoadError> {
        let name = source.name();
        let decoded = if is_svg(bytes, content_type, &name) {
            rasterize_svg(bytes, self.pixel_ratio, source.resources_dir().as_deref())
        } else {
            image::load_from_memory(bytes)
                .map(|img| Bitmap::from_image(img.to_rgba8()))
                .map_err(DecodeError::from)
        };
        decoded.map_err(|source| LoadError::Decode { name, source })
    }
}

impl ImageLoader for AssetLoader {
    async fn load_image(&self, source: &AssetSource) -> Result<Bitmap, LoadError> {
        let (bytes, content_type) = self.fetch(source).await?;
        let bitmap = self.decode(source, &bytes, content_type.as_deref())?;
        tracing::trace!(
            target: "marker_icons::loader",
            source = %source,
            width = bitmap.data.width(),
            height = bitmap.data.height(),
            "decoded asset"
        );
        Ok(bitmap)
    }
}

async fn read_file(path: &Path) -> Result<Bytes, LoadError> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}
