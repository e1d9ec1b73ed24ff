//! Request construction and response extraction around a [`ContentBackend`].

use crate::error::{NanoCanvasError, Result};
use crate::image::codec;
use crate::image::provider::{ContentBackend, ImageGenerator};
use crate::image::types::{
    ContentResponse, GenerationRequest, GenerationResult, RequestPart, ResponsePart,
    DEFAULT_MIME_TYPE,
};
use async_trait::async_trait;
use std::time::Instant;

/// Detail attached to a reply that carried no image.
pub const NO_IMAGE_MESSAGE: &str =
    "The model did not return an image. It might have refused the prompt.";

/// Packages requests for a backend and picks the image out of its reply.
pub struct GenerationAdapter<B> {
    backend: B,
}

impl<B: ContentBackend> GenerationAdapter<B> {
    /// Wraps a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Generates an image and returns its display locator.
    pub async fn try_generate(&self, request: GenerationRequest) -> Result<String> {
        let start = Instant::now();
        let edit = request.is_edit();
        let parts = build_parts(&request);

        tracing::debug!(
            model = self.backend.model(),
            edit,
            parts = parts.len(),
            "dispatching generation request"
        );

        let response = self.backend.generate_content(parts).await?;
        let locator = extract_image(response)?;

        tracing::debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );
        Ok(locator)
    }
}

#[async_trait]
impl<B: ContentBackend> ImageGenerator for GenerationAdapter<B> {
    async fn generate(&self, request: GenerationRequest) -> GenerationResult {
        match self.try_generate(request).await {
            Ok(image_locator) => GenerationResult::Success { image_locator },
            Err(e) => {
                tracing::warn!(kind = %e.kind(), "generation failed: {e}");
                GenerationResult::from_error(&e)
            }
        }
    }
}

/// Builds the ordered part list: source image first when editing, then the prompt.
pub fn build_parts(request: &GenerationRequest) -> Vec<RequestPart> {
    let mut parts = Vec::with_capacity(2);

    if let Some(image) = request.source_image() {
        parts.push(RequestPart::InlineData {
            mime_type: image.mime_type.clone(),
            data: codec::encode(&image.bytes),
        });
    }

    parts.push(RequestPart::Text(request.prompt().to_string()));
    parts
}

/// Picks the first image part of the first candidate and turns it into a locator.
///
/// Text parts are never surfaced; they are only logged.
pub fn extract_image(response: ContentResponse) -> Result<String> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| {
        let detail = match response.block_reason {
            Some(reason) => format!("prompt blocked: {}", reason),
            None => "the response contained no candidates".to_string(),
        };
        NanoCanvasError::NoCandidate(detail)
    })?;

    for part in candidate.parts {
        match part {
            ResponsePart::Image { mime_type, data } => {
                let mime_type = if mime_type.is_empty() {
                    DEFAULT_MIME_TYPE
                } else {
                    mime_type.as_str()
                };
                return Ok(codec::to_display_locator(mime_type, &data));
            }
            ResponsePart::Text { content } => {
                tracing::debug!(text = %content, "model returned text");
            }
        }
    }

    if let Some(reason) = candidate.finish_reason {
        tracing::debug!(finish_reason = %reason, "candidate finished without an image");
    }
    Err(NanoCanvasError::NoImageReturned(NO_IMAGE_MESSAGE.into()))
}
