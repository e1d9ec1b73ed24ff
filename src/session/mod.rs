//! Session controller: prompt, source image, previews and lifecycle state.
//!
//! All user-visible state lives in [`Session`] and changes only through its
//! transition methods. At most one generation is in flight at a time: a
//! submit while [`SessionState::Processing`] does nothing.

mod preview;
mod task;

pub use preview::PreviewStore;
pub use task::GenerationTask;

use crate::download;
use crate::error::{NanoCanvasError, Result};
use crate::image::codec;
use crate::image::{GenerationRequest, GenerationResult, ImageGenerator, SourceImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of one submit cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// A generation is in flight.
    Processing,
    /// The last generation produced an image.
    Success,
    /// The last generation failed.
    Error,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Processing => write!(f, "processing"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Single source of truth for the front-end.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    prompt: String,
    source_image: Option<SourceImage>,
    previews: PreviewStore,
    message: Option<String>,
    timeout: Option<Duration>,
}

impl Session {
    /// Creates an idle session with no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails generations that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true while a generation is in flight.
    pub fn is_processing(&self) -> bool {
        self.state == SessionState::Processing
    }

    /// Current prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Source and result previews.
    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Validation or error message to show, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The selected source image, if any.
    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source_image.as_ref()
    }

    /// Returns true when a source image is selected and submits will edit it.
    pub fn is_edit_mode(&self) -> bool {
        self.source_image.is_some()
    }

    /// Label for the submit action.
    pub fn action_label(&self) -> &'static str {
        if self.is_processing() {
            "Processing..."
        } else if self.is_edit_mode() {
            "Edit Image"
        } else {
            "Generate Image"
        }
    }

    /// Replaces the prompt text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Selects a source image and shows its preview.
    pub fn select_source_image(&mut self, image: SourceImage) {
        let preview = codec::to_display_locator(&image.mime_type, &codec::encode(&image.bytes));
        self.previews.set_source(preview);
        self.source_image = Some(image);
        self.message = None;
    }

    /// Reads a file and selects it as the source image.
    ///
    /// Unreadable or non-image files leave the selection untouched and set
    /// the message instead. The lifecycle state never changes.
    pub async fn open_source_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        match codec::read_source_image(path).await {
            Ok(image) => {
                self.select_source_image(image);
                Ok(())
            }
            Err(e) => {
                self.message = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Removes the source image, switching back to generation mode.
    pub fn clear_source_image(&mut self) {
        self.source_image = None;
        self.previews.clear_source();
    }

    /// Starts a submit cycle and returns the request to send.
    ///
    /// Returns `None` without touching anything while processing. An empty
    /// prompt sets a validation message and leaves the state unchanged.
    pub fn begin_submit(&mut self) -> Option<GenerationRequest> {
        if self.is_processing() {
            tracing::debug!("submit ignored while processing");
            return None;
        }

        let request = match GenerationRequest::new(self.prompt.clone()) {
            Ok(request) => request,
            Err(e) => {
                self.message = Some(e.to_string());
                return None;
            }
        };
        let request = match &self.source_image {
            Some(image) => request.with_source_image(image.clone()),
            None => request,
        };

        self.state = SessionState::Processing;
        self.message = None;
        Some(request)
    }

    /// Applies the outcome of the in-flight generation.
    ///
    /// Ignored unless processing. A failure keeps the previous result preview.
    pub fn complete(&mut self, result: GenerationResult) {
        if !self.is_processing() {
            tracing::warn!(state = %self.state, "generation result arrived outside processing");
            return;
        }

        match result {
            GenerationResult::Success { image_locator } => {
                self.previews.set_result(image_locator);
                self.state = SessionState::Success;
            }
            GenerationResult::Failure { reason, detail } => {
                tracing::debug!(%reason, "generation failed");
                self.message = Some(detail);
                self.state = SessionState::Error;
            }
        }
    }

    /// Starts a submit cycle and spawns the generation.
    ///
    /// The returned task must be joined and its result passed to
    /// [`Session::complete`].
    pub fn dispatch(&mut self, generator: Arc<dyn ImageGenerator>) -> Option<GenerationTask> {
        let request = self.begin_submit()?;
        Some(GenerationTask::spawn(generator, request, self.timeout))
    }

    /// Runs one full submit cycle and returns the resulting state.
    pub async fn submit(&mut self, generator: Arc<dyn ImageGenerator>) -> SessionState {
        if let Some(task) = self.dispatch(generator) {
            let result = task.join().await;
            self.complete(result);
        }
        self.state
    }

    /// Writes the current result to `path`, or to a timestamped file in the
    /// working directory.
    pub async fn download(&self, path: Option<&Path>) -> Result<PathBuf> {
        let locator = self
            .previews
            .result()
            .ok_or_else(|| NanoCanvasError::Validation("There is no result to download.".into()))?;
        match path {
            Some(path) => download::save_locator(locator, path).await,
            None => download::save_to_dir(locator, ".").await,
        }
    }
}
