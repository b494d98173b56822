//! Media Resources
//!
//! The audio track and the background image loaders used by preview and
//! export. Both are exclusively owned by the editor session.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::core::project::ImageHandle;
use crate::core::{CoreError, CoreResult, Size2D, TimeSec};

// =============================================================================
// Audio
// =============================================================================

/// The song the captions are timed against
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSource {
    /// Original file name, used to name the export
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
    /// Playback length in seconds
    pub duration: TimeSec,
}

impl AudioSource {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        duration: TimeSec,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
            duration,
        }
    }

    /// Reads a WAV file from memory, taking the duration from its header
    pub fn from_wav(name: impl Into<String>, bytes: Vec<u8>) -> CoreResult<Self> {
        let reader = hound::WavReader::new(Cursor::new(bytes.as_slice()))
            .map_err(|e| CoreError::ResourceLoadFailed(format!("Invalid WAV data: {}", e)))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(CoreError::ResourceLoadFailed(
                "WAV sample rate is zero".to_string(),
            ));
        }
        let duration = f64::from(reader.duration()) / f64::from(spec.sample_rate);
        drop(reader);

        Ok(Self::new(name, "audio/wav", bytes, duration))
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("export")
    }

    pub fn has_playable_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }
}

// =============================================================================
// Images
// =============================================================================

/// Resolves an image source into a decoded handle with its intrinsic size
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, source: &str) -> CoreResult<ImageHandle>;
}

/// Loader backed by a fixed table of known images
#[derive(Debug, Default, Clone)]
pub struct StaticImageLoader {
    images: HashMap<String, Size2D>,
}

impl StaticImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, source: impl Into<String>, size: Size2D) -> Self {
        self.images.insert(source.into(), size);
        self
    }
}

#[async_trait]
impl ImageLoader for StaticImageLoader {
    async fn load(&self, source: &str) -> CoreResult<ImageHandle> {
        self.images
            .get(source)
            .map(|size| ImageHandle::new(source, size.width, size.height))
            .ok_or_else(|| CoreError::ResourceLoadFailed(format!("Unknown image: {}", source)))
    }
}

/// Loader that reads image headers from disk
#[derive(Debug, Default, Clone)]
pub struct FsImageLoader {
    base_dir: Option<PathBuf>,
}

impl FsImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative sources against `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl ImageLoader for FsImageLoader {
    async fn load(&self, source: &str) -> CoreResult<ImageHandle> {
        let path = self.resolve(source);
        let probe_path = path.clone();
        let dimensions = tokio::task::spawn_blocking(move || image::image_dimensions(&probe_path))
            .await
            .map_err(|e| CoreError::Internal(format!("Image probe task failed: {}", e)))?;

        match dimensions {
            Ok((width, height)) if width > 0 && height > 0 => {
                debug!(path = %path.display(), width, height, "Image loaded");
                Ok(ImageHandle::new(source, width, height))
            }
            Ok(_) => Err(CoreError::ResourceLoadFailed(format!(
                "Image has no pixels: {}",
                path.display()
            ))),
            Err(e) => {
                warn!(path = %path.display(), "Failed to load image: {}", e);
                Err(CoreError::ResourceLoadFailed(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn wav_bytes(sample_rate: u32, samples: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..samples {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_wav_duration_from_header() {
        let audio = AudioSource::from_wav("take one.wav", wav_bytes(8000, 12000)).unwrap();
        assert_eq!(audio.duration, 1.5);
        assert_eq!(audio.mime_type, "audio/wav");
        assert_eq!(audio.stem(), "take one");
        assert!(audio.has_playable_duration());
    }

    #[test]
    fn test_invalid_wav() {
        let err = AudioSource::from_wav("x.wav", b"not a wav".to_vec()).unwrap_err();
        assert!(matches!(err, CoreError::ResourceLoadFailed(_)));
    }

    #[test]
    fn test_stem_fallback() {
        let audio = AudioSource::new("", "audio/mpeg", Vec::<u8>::new(), 0.0);
        assert_eq!(audio.stem(), "export");
        assert!(!audio.has_playable_duration());
    }

    #[tokio::test]
    async fn test_static_loader() {
        let loader = StaticImageLoader::new().with_image("bg.png", Size2D::new(640, 480));
        let handle = loader.load("bg.png").await.unwrap();
        assert_eq!(handle.size(), Size2D::new(640, 480));
        assert!(matches!(
            loader.load("other.png").await,
            Err(CoreError::ResourceLoadFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_fs_loader_reads_dimensions() {
        let dir = TempDir::new().unwrap();
        image::RgbImage::new(8, 4)
            .save(dir.path().join("cover.png"))
            .unwrap();

        let loader = FsImageLoader::with_base_dir(dir.path());
        let handle = loader.load("cover.png").await.unwrap();
        assert_eq!((handle.width, handle.height), (8, 4));
        assert_eq!(handle.source, "cover.png");

        assert!(loader.load("missing.png").await.is_err());
    }
}
