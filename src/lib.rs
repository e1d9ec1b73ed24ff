#![warn(missing_docs)]
//! NanoCanvas - generate or edit images from natural-language prompts.
//!
//! A prompt alone generates a new image; a prompt plus a source image asks
//! the model to edit that image. The [`Session`] controller owns the
//! user-facing state and guarantees at most one generation in flight.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use nanocanvas::{GeminiBackend, GenerationAdapter, Session, SessionState};
//!
//! #[tokio::main]
//! async fn main() -> nanocanvas::Result<()> {
//!     let backend = GeminiBackend::builder().build()?;
//!     let generator = Arc::new(GenerationAdapter::new(backend));
//!
//!     let mut session = Session::new();
//!     session.open_source_image("cat.png").await?;
//!     session.set_prompt("Give the cat a tiny wizard hat");
//!
//!     if session.submit(generator).await == SessionState::Success {
//!         session.download(None).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini`: Gemini `generateContent` backend (default)
//! - `cli`: the `nanocanvas` terminal front-end (default)

pub mod download;
mod error;
pub mod image;
pub mod session;

// Re-export error types at crate root
pub use error::{ErrorKind, NanoCanvasError, Result};

pub use image::{
    ContentBackend, GenerationAdapter, GenerationRequest, GenerationResult, ImageFormat,
    ImageGenerator, ResponsePart, SourceImage,
};
pub use session::{GenerationTask, PreviewStore, Session, SessionState};

#[cfg(feature = "gemini")]
pub use image::providers::{GeminiBackend, GeminiBackendBuilder, GeminiModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ErrorKind, NanoCanvasError, Result};
    pub use crate::image::{
        GenerationAdapter, GenerationRequest, GenerationResult, ImageGenerator, SourceImage,
    };
    pub use crate::session::{Session, SessionState};

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiBackend;
}
