//! Reading the user's photo from disk.
//!
//! The declared type comes from the file extension and must be on the
//! configured allow-list (`png`, `jpeg` by default). The content is sniffed
//! as well, so a renamed file is caught before it is sent anywhere.

use crate::image_source::{ImageSource, ImageSourceError};
use image::ImageFormat;
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "You have chosen an incorrect file. The correct file should have one of the following extensions: {accepted}."
    )]
    Rejected { accepted: String },
    #[error("file is declared as {declared} but contains {detected}")]
    Mismatch { declared: String, detected: String },
    #[error(transparent)]
    Encode(#[from] ImageSourceError),
}

/// MIME subtype of a format, e.g. `jpeg` for [`ImageFormat::Jpeg`].
fn subtype(format: ImageFormat) -> &'static str {
    let mime = format.to_mime_type();
    mime.split_once('/').map_or(mime, |(_, sub)| sub)
}

fn rejected(accepted: &[String]) -> UploadError {
    UploadError::Rejected {
        accepted: accepted.join(", "),
    }
}

/// Check a declared format against the allow-list and the actual content,
/// then wrap the bytes as a data URL.
pub fn photo_from_bytes(
    declared: Option<ImageFormat>,
    bytes: &[u8],
    accepted: &[String],
) -> Result<ImageSource, UploadError> {
    let declared = declared
        .filter(|format| accepted.iter().any(|a| a == subtype(*format)))
        .ok_or_else(|| rejected(accepted))?;
    match image::guess_format(bytes) {
        Ok(detected) if detected == declared => {}
        Ok(detected) => {
            return Err(UploadError::Mismatch {
                declared: subtype(declared).to_string(),
                detected: subtype(detected).to_string(),
            });
        }
        Err(_) => {
            return Err(UploadError::Mismatch {
                declared: subtype(declared).to_string(),
                detected: "unknown data".to_string(),
            });
        }
    }
    Ok(ImageSource::from_bytes(declared.to_mime_type(), bytes)?)
}

/// Read and validate a photo file.
pub fn read_photo(path: &Path, accepted: &[String]) -> Result<ImageSource, UploadError> {
    // Reject by extension before touching the file
    let declared = ImageFormat::from_path(path).ok();
    if declared.is_none_or(|format| !accepted.iter().any(|a| a == subtype(format))) {
        return Err(rejected(accepted));
    }
    let bytes = std::fs::read(path).map_err(|source| UploadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let photo = photo_from_bytes(declared, &bytes, accepted)?;
    info!("read photo {} ({} bytes)", path.display(), bytes.len());
    Ok(photo)
}
