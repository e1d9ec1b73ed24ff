//! Traits at the seams between the session, the adapter and the remote API.

use crate::error::Result;
use crate::image::types::{ContentResponse, GenerationRequest, GenerationResult, RequestPart};
use async_trait::async_trait;

/// A remote multimodal API that turns ordered parts into candidates.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Sends one `generateContent`-style call.
    async fn generate_content(&self, parts: Vec<RequestPart>) -> Result<ContentResponse>;

    /// The model identifier requests are sent to.
    fn model(&self) -> &str;
}

/// Anything that can turn a [`GenerationRequest`] into a [`GenerationResult`].
///
/// Implementations never fail outright: every failure is reported as
/// [`GenerationResult::Failure`].
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates or edits an image.
    async fn generate(&self, request: GenerationRequest) -> GenerationResult;
}
