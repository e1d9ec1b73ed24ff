//! Image generation and editing.

mod adapter;
pub mod codec;
mod provider;
pub mod providers;
mod types;

pub use adapter::{build_parts, extract_image, GenerationAdapter, NO_IMAGE_MESSAGE};
pub use provider::{ContentBackend, ImageGenerator};
pub use types::{
    is_image_mime_type, Candidate, ContentResponse, GenerationRequest, GenerationResult,
    ImageFormat, RequestPart, ResponsePart, SourceImage, DEFAULT_MIME_TYPE,
    EMPTY_PROMPT_MESSAGE, INVALID_IMAGE_MESSAGE,
};
