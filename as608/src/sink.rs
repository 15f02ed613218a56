//! Image persistence

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tracing::info;

use as608_types::FingerprintImage;

use crate::error::Result;

/// Destination for captured images
#[async_trait]
pub trait ImageSink: Send {
    /// Persist `image` and return where it went
    async fn save(&mut self, image: &FingerprintImage) -> Result<PathBuf>;
}

/// Writes each image as a BMP file into a directory
///
/// Files are named `<prefix>_<YYYYmmdd_HHMMSS>.bmp` in local time. Captures
/// within the same second get a numeric suffix instead of overwriting. A PNG
/// copy with the same stem is written next to the BMP unless disabled.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    prefix: String,
    png: bool,
}

impl DirectorySink {
    pub const DEFAULT_DIR: &'static str = "fingerprint_images";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "fingerprint".to_string(),
            png: true,
        }
    }

    /// Set the file name prefix (default: `fingerprint`)
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Also write a PNG copy of every image (default: on)
    pub fn with_png(mut self, enabled: bool) -> Self {
        self.png = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn unused_path(&self) -> Result<PathBuf> {
        let stem = format!("{}_{}", self.prefix, Local::now().format("%Y%m%d_%H%M%S"));

        let mut path = self.dir.join(format!("{}.bmp", stem));
        let mut n = 1;
        while tokio::fs::try_exists(&path).await?
            || tokio::fs::try_exists(path.with_extension("png")).await?
        {
            path = self.dir.join(format!("{}_{}.bmp", stem, n));
            n += 1;
        }

        Ok(path)
    }
}

impl Default for DirectorySink {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIR)
    }
}

#[async_trait]
impl ImageSink for DirectorySink {
    async fn save(&mut self, image: &FingerprintImage) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.unused_path().await?;
        tokio::fs::write(&path, image.to_bmp()).await?;
        info!("Saved {} to {}", image, path.display());

        if self.png {
            let png_path = path.with_extension("png");
            tokio::fs::write(&png_path, image.to_png()?).await?;
            info!("Saved PNG copy to {}", png_path.display());
        }

        Ok(path)
    }
}
