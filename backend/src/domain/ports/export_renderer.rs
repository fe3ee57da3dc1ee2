//! Port for turning readings into a downloadable document.

use crate::domain::telemetry::Reading;

use super::define_port_error;

define_port_error! {
    /// Errors raised while rendering an export.
    pub enum ExportRenderError {
        /// The document could not be produced.
        Render { message: String } => "export rendering failed: {message}",
    }
}

/// Renders readings (already in presentation order) into a binary document.
#[cfg_attr(test, mockall::automock)]
pub trait ExportRenderer: Send + Sync {
    /// MIME type of the rendered document.
    fn content_type(&self) -> &'static str;

    /// File extension without the leading dot.
    fn file_extension(&self) -> &'static str;

    fn render(&self, readings: &[Reading]) -> Result<Vec<u8>, ExportRenderError>;
}
