//! Image URL resolution
//!
//! The page export needs natural image dimensions to size the annotation
//! layer. Resolution is one-shot and may fail; callers fall back to a square.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::domain::NaturalSize;

/// A successfully resolved image
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedImage {
    /// Location the image can be loaded from by the output
    pub download_url: String,
    pub natural_size: NaturalSize,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("unsupported image location: {0}")]
    Unsupported(String),
    #[error("invalid data URL: {0}")]
    DataUrl(String),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine image dimensions: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Turns a block's image URL into pixel data and dimensions
pub trait ImageResolver: Send + Sync {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<ResolvedImage, ResolveError>>;
}

/// Resolves `data:` URLs and local files; remote URLs are not fetched
#[derive(Clone, Debug, Default)]
pub struct FsImageResolver {
    /// Relative paths are looked up here
    base_dir: PathBuf,
}

impl FsImageResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    async fn resolve_inner(&self, url: &str) -> Result<ResolvedImage, ResolveError> {
        let bytes = if url.starts_with("data:") {
            decode_data_url(url)?
        } else if url.starts_with("http://") || url.starts_with("https://") {
            return Err(ResolveError::Unsupported(url.to_string()));
        } else {
            let path = self.local_path(url);
            tokio::fs::read(&path)
                .await
                .map_err(|source| ResolveError::Io { path, source })?
        };

        let natural_size = tokio::task::spawn_blocking(move || read_dimensions(&bytes)).await??;
        log::debug!(
            "Resolved image dimensions: {}x{}",
            natural_size.width,
            natural_size.height
        );
        Ok(ResolvedImage {
            download_url: url.to_string(),
            natural_size,
        })
    }

    fn local_path(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ImageResolver for FsImageResolver {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<ResolvedImage, ResolveError>> {
        self.resolve_inner(url).boxed()
    }
}

/// Resolver backed by dimensions the host already knows
#[derive(Clone, Debug, Default)]
pub struct KnownSizes {
    sizes: HashMap<String, NaturalSize>,
}

impl KnownSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, size: NaturalSize) {
        self.sizes.insert(url.into(), size);
    }
}

impl ImageResolver for KnownSizes {
    fn resolve<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<ResolvedImage, ResolveError>> {
        let result = self
            .sizes
            .get(url)
            .map(|size| ResolvedImage {
                download_url: url.to_string(),
                natural_size: *size,
            })
            .ok_or_else(|| ResolveError::Unsupported(url.to_string()));
        futures::future::ready(result).boxed()
    }
}

fn decode_data_url(url: &str) -> Result<Vec<u8>, ResolveError> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| ResolveError::DataUrl("missing payload".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ResolveError::DataUrl("only base64 payloads are supported".to_string()));
    }
    BASE64
        .decode(payload.trim())
        .map_err(|e| ResolveError::DataUrl(e.to_string()))
}

fn read_dimensions(bytes: &[u8]) -> Result<NaturalSize, ResolveError> {
    let (width, height) = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::from)?
        .into_dimensions()?;
    Ok(NaturalSize::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::new(width, height)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_resolve_data_url() {
        let url = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(6, 3)));
        let resolved = FsImageResolver::default().resolve(&url).await.unwrap();
        assert_eq!(resolved.natural_size, NaturalSize::new(6, 3));
        assert_eq!(resolved.download_url, url);
    }

    #[tokio::test]
    async fn test_resolve_relative_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), png_bytes(4, 8)).unwrap();
        let resolver = FsImageResolver::new(dir.path());
        let resolved = resolver.resolve("pic.png").await.unwrap();
        assert_eq!(resolved.natural_size, NaturalSize::new(4, 8));
    }

    #[tokio::test]
    async fn test_resolve_failures() {
        let resolver = FsImageResolver::new("/nonexistent-dir");
        assert!(matches!(
            resolver.resolve("https://example.com/a.png").await,
            Err(ResolveError::Unsupported(_))
        ));
        assert!(matches!(
            resolver.resolve("missing.png").await,
            Err(ResolveError::Io { .. })
        ));
        assert!(matches!(
            resolver.resolve("data:image/png,abc").await,
            Err(ResolveError::DataUrl(_))
        ));
        let garbage = format!("data:image/png;base64,{}", BASE64.encode(b"not an image"));
        assert!(matches!(
            resolver.resolve(&garbage).await,
            Err(ResolveError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_known_sizes() {
        let mut known = KnownSizes::new();
        known.insert("a.png", NaturalSize::new(10, 20));
        assert_eq!(
            known.resolve("a.png").await.unwrap().natural_size,
            NaturalSize::new(10, 20)
        );
        assert!(known.resolve("b.png").await.is_err());
    }
}
