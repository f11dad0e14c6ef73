//! Still-image validation by size and magic bytes.

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::error::AssetError;

/// Files smaller than this are treated as truncated or placeholder images.
pub const MIN_IMAGE_BYTES: u64 = 1000;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Image container formats accepted on the video track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

/// Identify an image from its leading bytes.
pub fn sniff_image(header: &[u8]) -> Option<ImageFormat> {
    if header.starts_with(JPEG_MAGIC) {
        Some(ImageFormat::Jpeg)
    } else if header.starts_with(PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else if header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

/// Check a downloaded still, deleting it when it is unusable.
pub async fn validate_image(path: &Path) -> Result<ImageFormat, AssetError> {
    let result = check_image(path).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::debug!(path = %path.display(), error = %e, "Could not remove rejected image");
        }
    }
    result
}

async fn check_image(path: &Path) -> Result<ImageFormat, AssetError> {
    let len = tokio::fs::metadata(path)
        .await
        .map_err(|e| AssetError::io(path, e))?
        .len();
    if len < MIN_IMAGE_BYTES {
        return Err(AssetError::Rejected(format!(
            "image is {len} bytes, below the {MIN_IMAGE_BYTES}-byte minimum"
        )));
    }

    let mut header = [0u8; 12];
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| AssetError::io(path, e))?;
    let read = file
        .read(&mut header)
        .await
        .map_err(|e| AssetError::io(path, e))?;

    sniff_image(&header[..read])
        .ok_or_else(|| AssetError::Rejected("not a JPEG, PNG, or WebP image".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(header: &[u8]) -> Vec<u8> {
        let mut bytes = header.to_vec();
        bytes.resize(2048, 0);
        bytes
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(sniff_image(&padded(JPEG_MAGIC)), Some(ImageFormat::Jpeg));
        assert_eq!(sniff_image(&padded(PNG_MAGIC)), Some(ImageFormat::Png));
        assert_eq!(
            sniff_image(b"RIFF\x10\x00\x00\x00WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(sniff_image(b"RIFF\x10\x00\x00\x00WAVEfmt "), None);
        assert_eq!(sniff_image(b"GIF89a"), None);
        assert_eq!(sniff_image(&[]), None);
    }

    #[tokio::test]
    async fn test_valid_image_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, padded(PNG_MAGIC)).unwrap();

        assert_eq!(validate_image(&path).await.unwrap(), ImageFormat::Png);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_small_image_is_rejected_and_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.jpg");
        std::fs::write(&path, JPEG_MAGIC).unwrap();

        let err = validate_image(&path).await.unwrap_err();
        assert!(matches!(err, AssetError::Rejected(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_html_error_page_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.jpg");
        let mut html = b"<!DOCTYPE html><html>".to_vec();
        html.resize(4096, b' ');
        std::fs::write(&path, html).unwrap();

        assert!(validate_image(&path).await.is_err());
        assert!(!path.exists());
    }
}
