//! Display-ready previews of the source and result images.

/// Current source and result previews as `data:` locators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewStore {
    source_preview: Option<String>,
    result_preview: Option<String>,
}

impl PreviewStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preview of the selected source image.
    pub fn source(&self) -> Option<&str> {
        self.source_preview.as_deref()
    }

    /// Preview of the most recent result.
    pub fn result(&self) -> Option<&str> {
        self.result_preview.as_deref()
    }

    /// Replaces the source preview.
    pub fn set_source(&mut self, locator: String) {
        self.source_preview = Some(locator);
    }

    /// Removes the source preview.
    pub fn clear_source(&mut self) {
        self.source_preview = None;
    }

    /// Replaces the result preview.
    pub fn set_result(&mut self, locator: String) {
        self.result_preview = Some(locator);
    }
}
