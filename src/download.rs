//! Saving the composited result.
//!
//! Files are named `<prefix>_<dd-mm-YYYY_HH-MM>.<ext>`, the extension taken
//! from the result's MIME type:
//!
//! ```text
//! Face_Swapping_16-10-2026_14-05.png
//! ```

use crate::image_source::{ImageSource, ImageSourceError};
use chrono::{Local, NaiveDateTime};
use log::info;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("there is no result to download")]
    NothingToDownload,
    #[error(transparent)]
    Decode(#[from] ImageSourceError),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const TIMESTAMP_FORMAT: &str = "%d-%m-%Y_%H-%M";

pub fn download_filename(prefix: &str, image: &ImageSource, at: NaiveDateTime) -> String {
    format!(
        "{}_{}.{}",
        prefix,
        at.format(TIMESTAMP_FORMAT),
        image.extension()
    )
}

/// Decode `image` and write it into `dir`, named for the current local time.
pub fn save_image(image: &ImageSource, dir: &Path, prefix: &str) -> Result<PathBuf, DownloadError> {
    save_image_at(image, dir, prefix, Local::now().naive_local())
}

pub fn save_image_at(
    image: &ImageSource,
    dir: &Path,
    prefix: &str,
    at: NaiveDateTime,
) -> Result<PathBuf, DownloadError> {
    let bytes = image.decode()?;
    let path = dir.join(download_filename(prefix, image, at));
    std::fs::write(&path, &bytes).map_err(|source| DownloadError::Io {
        path: path.clone(),
        source,
    })?;
    info!("saved result to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn afternoon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 6)
            .unwrap()
            .and_hms_opt(14, 5, 59)
            .unwrap()
    }

    #[test]
    fn filename_uses_prefix_date_and_extension() {
        let png = ImageSource::from_bytes("image/png", b"x").unwrap();
        assert_eq!(
            download_filename("Face_Swapping", &png, afternoon()),
            "Face_Swapping_06-10-2026_14-05.png"
        );
    }

    #[test]
    fn jpeg_results_keep_jpeg_extension() {
        let jpeg = ImageSource::from_bytes("image/jpeg", b"x").unwrap();
        assert!(download_filename("Swap", &jpeg, afternoon()).ends_with(".jpeg"));
    }

    #[test]
    fn save_writes_decoded_bytes() {
        let tmp = TempDir::new().unwrap();
        let image = ImageSource::from_bytes("image/png", b"result bytes").unwrap();
        let path = save_image_at(&image, tmp.path(), "Face_Swapping", afternoon()).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "Face_Swapping_06-10-2026_14-05.png"
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"result bytes");
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let image = ImageSource::from_bytes("image/png", b"x").unwrap();
        let err = save_image(&image, &tmp.path().join("nope"), "p").unwrap_err();
        assert!(matches!(err, DownloadError::Io { .. }));
    }
}
