//! Upload intake: validation, storage and best-effort normalization of listing photos.

pub mod blob;
pub mod normalize;

use std::sync::Arc;

use axum::body::Bytes;
use image::ImageFormat;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use blob::BlobStore;
use normalize::{normalize, NormalizeSettings};

pub const VEHICLES: &str = "vehicles";
pub const SELL_REQUESTS: &str = "sell-requests";

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub max_file_size: usize,
    /// Lowercase, without the leading dot.
    pub allowed_extensions: Vec<String>,
    pub normalize: NormalizeSettings,
}

impl From<&AppConfig> for UploadSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            allowed_extensions: config.allowed_extensions(),
            normalize: NormalizeSettings {
                max_width: config.max_image_width,
                max_height: config.max_image_height,
                jpeg_quality: config.image_quality,
            },
        }
    }
}

pub struct UploadedFile {
    pub filename: Option<String>,
    pub bytes: Bytes,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("No filename provided")]
    MissingFilename,
    #[error("File type .{extension} not allowed. Allowed: {allowed}")]
    BadExtension { extension: String, allowed: String },
    #[error("File too large. Max size: {max} bytes")]
    Oversized { max: usize },
}

impl UploadRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            UploadRejection::MissingFilename => "missing_filename",
            UploadRejection::BadExtension { .. } => "bad_extension",
            UploadRejection::Oversized { .. } => "oversized",
        }
    }
}

impl From<UploadRejection> for ApiError {
    fn from(rejection: UploadRejection) -> Self {
        ApiError::Validation {
            message: rejection.to_string(),
            reason: Some(rejection.reason()),
        }
    }
}

#[derive(Clone)]
pub struct ImageIntake {
    blobs: Arc<dyn BlobStore>,
    settings: Arc<UploadSettings>,
}

impl ImageIntake {
    pub fn new(blobs: Arc<dyn BlobStore>, settings: UploadSettings) -> Self {
        Self {
            blobs,
            settings: Arc::new(settings),
        }
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    /// Checks the upload without touching storage and returns its normalized extension.
    pub fn validate(&self, file: &UploadedFile) -> Result<String, UploadRejection> {
        let extension = self.check_name(file.filename.as_deref())?;
        self.check_size(file.bytes.len())?;
        Ok(extension)
    }

    /// Filename and extension rules, which can be decided before any bytes arrive.
    pub fn check_name(&self, filename: Option<&str>) -> Result<String, UploadRejection> {
        let filename = filename
            .filter(|name| !name.is_empty())
            .ok_or(UploadRejection::MissingFilename)?;

        let extension = filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if !self.settings.allowed_extensions.contains(&extension) {
            return Err(UploadRejection::BadExtension {
                extension,
                allowed: self.settings.allowed_extensions.join(", "),
            });
        }
        Ok(extension)
    }

    pub fn check_size(&self, size: usize) -> Result<(), UploadRejection> {
        if size > self.settings.max_file_size {
            return Err(self.oversized());
        }
        Ok(())
    }

    pub fn oversized(&self) -> UploadRejection {
        UploadRejection::Oversized {
            max: self.settings.max_file_size,
        }
    }

    /// Validates, stores under `subfolder` with a fresh name and then tries to normalize the
    /// stored copy. Returns the public reference of the stored object.
    pub async fn upload(&self, file: UploadedFile, subfolder: &str) -> ApiResult<String> {
        let extension = self.validate(&file)?;
        let path = format!("{subfolder}/{}.{extension}", Uuid::new_v4());
        let reference = self.blobs.store(&file.bytes, &path).await?;
        log::info!("stored upload {reference} ({} bytes)", file.bytes.len());

        let Some(format) = ImageFormat::from_extension(&extension) else {
            log::warn!("no encoder for .{extension}, keeping {reference} as uploaded");
            return Ok(reference);
        };

        let settings = self.settings.normalize;
        let bytes = file.bytes;
        let normalized =
            tokio::task::spawn_blocking(move || normalize(&bytes, format, &settings)).await;
        match normalized {
            Ok(Ok(out)) => {
                if let Err(err) = self.blobs.store(&out, &path).await {
                    log::warn!("could not write normalized {reference}: {err}");
                }
            }
            Ok(Err(err)) => log::warn!("image optimization failed for {reference}: {err}"),
            Err(err) => log::warn!("image optimization task for {reference} aborted: {err}"),
        }

        Ok(reference)
    }

    /// Best-effort removal of a stored object; failures are only logged.
    pub async fn discard(&self, reference: &str) {
        match self.blobs.delete(reference).await {
            Ok(true) => log::info!("removed {reference}"),
            Ok(false) => log::warn!("{reference} was already gone"),
            Err(err) => log::warn!("failed to remove {reference}: {err}"),
        }
    }
}
