//! Core types for image generation and editing.

use crate::error::{ErrorKind, NanoCanvasError, Result};
use serde::{Deserialize, Serialize};

/// Mime type assumed when the provider omits one.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Message shown when a prompt is empty after trimming.
pub const EMPTY_PROMPT_MESSAGE: &str =
    "Please enter a prompt describing what you want to generate or how to edit the image.";

/// Message shown when a selected file is not an image.
pub const INVALID_IMAGE_MESSAGE: &str = "Please upload a valid image file (PNG, JPEG).";

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Returns true if the MIME type names an image.
pub fn is_image_mime_type(mime: &str) -> bool {
    mime.to_lowercase().starts_with("image/")
}

/// A locally selected image to edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Raw file contents.
    pub bytes: Vec<u8>,
    /// Declared MIME type, always `image/*`.
    pub mime_type: String,
}

impl SourceImage {
    /// Creates a source image, rejecting non-image MIME types.
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        if !is_image_mime_type(&mime_type) {
            return Err(NanoCanvasError::Validation(INVALID_IMAGE_MESSAGE.into()));
        }
        Ok(Self { bytes, mime_type })
    }

    /// Size of the image in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A request to generate a new image or edit a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    source_image: Option<SourceImage>,
}

impl GenerationRequest {
    /// Creates a generation-mode request.
    ///
    /// The prompt must contain something other than whitespace. It is kept
    /// as given, without trimming.
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(NanoCanvasError::Validation(EMPTY_PROMPT_MESSAGE.into()));
        }
        Ok(Self {
            prompt,
            source_image: None,
        })
    }

    /// Attaches a source image, switching the request to edit mode.
    pub fn with_source_image(mut self, image: SourceImage) -> Self {
        self.source_image = Some(image);
        self
    }

    /// The prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The source image, if editing.
    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source_image.as_ref()
    }

    /// Returns true if this is an edit request.
    pub fn is_edit(&self) -> bool {
        self.source_image.is_some()
    }
}

/// One unit of content submitted to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    /// Base64 image payload with its MIME type.
    InlineData {
        /// MIME type of the payload.
        mime_type: String,
        /// Base64 payload without a data-URI prefix.
        data: String,
    },
    /// Prompt text.
    Text(String),
}

/// One unit of content returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResponsePart {
    /// Inline image data.
    Image {
        /// MIME type, possibly empty.
        mime_type: String,
        /// Base64 payload.
        data: String,
    },
    /// Plain text (commentary or a refusal).
    Text {
        /// Text content.
        content: String,
    },
}

/// One alternative response for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Ordered response parts.
    pub parts: Vec<ResponsePart>,
    /// Provider finish reason, if reported.
    pub finish_reason: Option<String>,
}

impl Candidate {
    /// Creates a candidate from its parts.
    pub fn new(parts: Vec<ResponsePart>) -> Self {
        Self {
            parts,
            finish_reason: None,
        }
    }
}

/// A provider reply in provider-neutral form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentResponse {
    /// Candidates in provider order.
    pub candidates: Vec<Candidate>,
    /// Reason the prompt itself was blocked, if any.
    pub block_reason: Option<String>,
}

/// Outcome of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
#[must_use = "generation result should be applied to the session"]
pub enum GenerationResult {
    /// An image was produced.
    Success {
        /// Displayable data URI of the image.
        image_locator: String,
    },
    /// No image was produced.
    Failure {
        /// Failure category.
        reason: ErrorKind,
        /// Human-readable detail.
        detail: String,
    },
}

impl GenerationResult {
    /// Builds a failure from a crate error.
    pub fn from_error(err: &NanoCanvasError) -> Self {
        Self::Failure {
            reason: err.kind(),
            detail: err.to_string(),
        }
    }

    /// The image locator, if successful.
    pub fn image_locator(&self) -> Option<&str> {
        match self {
            Self::Success { image_locator } => Some(image_locator),
            Self::Failure { .. } => None,
        }
    }
}
