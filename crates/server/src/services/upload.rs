//! Store photo uploads.
//!
//! Photos arrive as one optional `photo` field in the store form's
//! multipart body. The declared MIME type gates the upload, the file is
//! renamed to a UUID so names never collide, and the image is resized to
//! 800px wide before being written under the upload directory.

use std::path::{Path, PathBuf};

use axum::extract::multipart::MultipartError;
use image::imageops::FilterType;
use thiserror::Error;
use uuid::Uuid;

/// Target width for stored photos, in pixels.
const PHOTO_WIDTH: u32 = 800;

/// Errors from the photo upload pipeline.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The declared MIME type is not an image type.
    #[error("That filetype isn't allowed ({0})")]
    NotAnImage(String),

    /// Reading the multipart body failed.
    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    /// The bytes did not decode as an image.
    #[error("Could not read the image: {0}")]
    Decode(#[from] image::ImageError),

    /// Writing the file failed.
    #[error("Failed to store the photo: {0}")]
    Io(#[from] std::io::Error),
}

/// Validate the declared MIME type and derive a unique filename for it.
///
/// The name is a fresh UUID with the MIME subtype as its extension, so
/// `image/jpeg` becomes e.g. `6f1c...-....jpeg`.
///
/// # Errors
///
/// Returns [`UploadError::NotAnImage`] when the type is missing the
/// `image/` prefix.
pub fn photo_filename(content_type: &str) -> Result<String, UploadError> {
    let subtype = content_type
        .strip_prefix("image/")
        .ok_or_else(|| UploadError::NotAnImage(content_type.to_owned()))?;

    Ok(format!("{}.{subtype}", Uuid::new_v4()))
}

/// Resize the uploaded bytes to [`PHOTO_WIDTH`] wide and write them to
/// `upload_dir/filename`.
///
/// Decoding and resizing are CPU-bound, so they run on the blocking pool.
///
/// # Errors
///
/// Returns [`UploadError::Decode`] when the bytes are not a decodable
/// image and [`UploadError::Io`] when the write fails.
pub async fn save_photo(
    upload_dir: &Path,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<(), UploadError> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let path: PathBuf = upload_dir.join(filename);
    let written = tokio::task::spawn_blocking(move || -> Result<(), UploadError> {
        let img = image::load_from_memory(&bytes)?;
        let resized = img.resize(PHOTO_WIDTH, u32::MAX, FilterType::Lanczos3);
        resized.save(&path)?;
        Ok(())
    })
    .await;

    match written {
        Ok(result) => result,
        Err(join_err) => Err(UploadError::Io(std::io::Error::other(join_err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_filename_accepts_image_types() {
        let name = photo_filename("image/jpeg").expect("jpeg allowed");
        assert!(name.ends_with(".jpeg"));

        let name = photo_filename("image/png").expect("png allowed");
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_photo_filename_rejects_non_images() {
        let err = photo_filename("application/pdf").expect_err("pdf rejected");
        assert!(matches!(err, UploadError::NotAnImage(ref t) if t == "application/pdf"));
    }

    #[test]
    fn test_photo_filenames_are_unique() {
        let a = photo_filename("image/png").expect("png allowed");
        let b = photo_filename("image/png").expect("png allowed");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_save_photo_rejects_garbage() {
        let dir = std::env::temp_dir().join("storefinder-upload-test");
        let err = save_photo(&dir, "garbage.png", b"not an image".to_vec())
            .await
            .expect_err("garbage rejected");
        assert!(matches!(err, UploadError::Decode(_)));
    }
}
