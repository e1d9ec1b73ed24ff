//! Base64 and data-URI conversions for source and result images.

use crate::error::{NanoCanvasError, Result};
use crate::image::types::{ImageFormat, SourceImage, INVALID_IMAGE_MESSAGE};
use base64::Engine;
use std::path::Path;

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Encodes raw bytes as standard base64 with no data-URI prefix.
pub fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decodes a base64 payload.
///
/// Tolerates embedded whitespace and missing `=` padding, both of which show
/// up in payloads copied around by hand.
pub fn decode(payload: &str) -> Result<Vec<u8>> {
    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(&cleaned)
        .map_err(|e| NanoCanvasError::Decode(e.to_string()))
}

/// Builds a self-contained `data:` URI for display.
pub fn to_display_locator(mime_type: &str, payload: &str) -> String {
    format!("{DATA_URI_PREFIX}{mime_type}{BASE64_MARKER}{payload}")
}

/// Splits a `data:` URI back into its MIME type and decoded bytes.
pub fn parse_display_locator(locator: &str) -> Result<(String, Vec<u8>)> {
    let rest = locator
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| NanoCanvasError::Decode("locator is not a data URI".into()))?;
    let (mime_type, payload) = rest
        .split_once(BASE64_MARKER)
        .ok_or_else(|| NanoCanvasError::Decode("locator is not base64-encoded".into()))?;
    Ok((mime_type.to_string(), decode(payload)?))
}

/// Image extensions outside [`ImageFormat`] that a file picker still accepts
/// as `image/*`, with the MIME type each one is sent as.
const OTHER_IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("bmp", "image/bmp"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("avif", "image/avif"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
];

/// Works out the MIME type of a selected file.
///
/// The extension is the declared type; content sniffing is the fallback for
/// files without a recognizable extension. Image extensions the codec does
/// not sniff are passed through as their `image/*` type and left for the
/// remote model to accept or reject.
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> Option<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    if let Some(ext) = ext.as_deref() {
        if let Some(format) = ImageFormat::from_extension(ext) {
            return Some(format.mime_type().to_string());
        }
        if let Some((_, mime)) = OTHER_IMAGE_EXTENSIONS.iter().find(|(e, _)| *e == ext) {
            return Some((*mime).to_string());
        }
    }

    ImageFormat::from_magic_bytes(bytes).map(|f| f.mime_type().to_string())
}

/// Reads a local image file into a [`SourceImage`].
///
/// A read failure is a [`NanoCanvasError::Decode`]; a file that is not an
/// image is a [`NanoCanvasError::Validation`].
pub async fn read_source_image(path: impl AsRef<Path>) -> Result<SourceImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| NanoCanvasError::Decode(format!("{}: {}", path.display(), e)))?;

    let mime_type = detect_mime_type(path, &bytes)
        .ok_or_else(|| NanoCanvasError::Validation(INVALID_IMAGE_MESSAGE.into()))?;

    let image = SourceImage::new(bytes, mime_type)?;
    tracing::debug!(
        path = %path.display(),
        mime_type = %image.mime_type,
        size = image.size(),
        "read source image"
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_encode_has_no_prefix() {
        let encoded = encode(b"hello");
        assert_eq!(encoded, "aGVsbG8=");
        assert!(!encoded.starts_with("data:"));
    }

    #[test]
    fn test_display_locator_format() {
        assert_eq!(
            to_display_locator("image/png", "AAAA"),
            "data:image/png;base64,AAAA"
        );
    }

    #[test]
    fn test_display_locator_is_deterministic() {
        let first = to_display_locator("image/jpeg", "BBBB");
        let second = to_display_locator("image/jpeg", "BBBB");
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_display_locator() {
        let locator = to_display_locator("image/webp", &encode(b"pixels"));
        let (mime, bytes) = parse_display_locator(&locator).unwrap();
        assert_eq!(mime, "image/webp");
        assert_eq!(bytes, b"pixels");
    }

    #[test]
    fn test_parse_display_locator_rejects_garbage() {
        let err = parse_display_locator("https://example.com/a.png").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = parse_display_locator("data:image/png,rawtext").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let err = parse_display_locator("data:image/png;base64,!!!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_decode_lenient() {
        assert_eq!(decode("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_detect_mime_type() {
        assert_eq!(
            detect_mime_type(Path::new("photo.JPG"), &[]).as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            detect_mime_type(Path::new("upload.bin"), &PNG_MAGIC).as_deref(),
            Some("image/png")
        );
        assert_eq!(detect_mime_type(Path::new("notes.txt"), b"hello"), None);
    }

    #[test]
    fn test_detect_mime_type_other_image_extensions() {
        assert_eq!(
            detect_mime_type(Path::new("scan.bmp"), b"BM").as_deref(),
            Some("image/bmp")
        );
        assert_eq!(
            detect_mime_type(Path::new("IMG_0042.HEIC"), &[]).as_deref(),
            Some("image/heic")
        );
        assert_eq!(
            detect_mime_type(Path::new("page.tif"), &[]).as_deref(),
            Some("image/tiff")
        );
    }

    #[tokio::test]
    async fn test_read_source_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.png");
        std::fs::write(&path, PNG_MAGIC).unwrap();

        let image = read_source_image(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, PNG_MAGIC);
        assert_eq!(image.size(), PNG_MAGIC.len());
    }

    #[tokio::test]
    async fn test_read_source_image_accepts_heic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_0042.heic");
        std::fs::write(&path, b"ftypheic").unwrap();

        let image = read_source_image(&path).await.unwrap();
        assert_eq!(image.mime_type, "image/heic");
    }

    #[tokio::test]
    async fn test_read_source_image_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "not an image").unwrap();

        let err = read_source_image(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_read_source_image_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source_image(dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
