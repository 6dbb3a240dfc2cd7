//! Live preview of unsaved edits.
//!
//! A preview composes a throwaway set where one file's on-disk content is
//! replaced by what the editor currently holds, then renders whatever that
//! file contributes:
//!
//! | Edited file | Output |
//! |-------------|--------|
//! | style sheet | the raw content wrapped in a `<style>` element |
//! | base entry | sub-templates in order, then `page` with `module` and `content` |
//! | other markup | that file's own block, with the module as context |
//!
//! Previews never fail at the HTTP level: any problem comes back as
//! [`PreviewOutput::Failed`], whose body is a marked, escaped error block the
//! editor can show inline.

use minijinja::HtmlEscape;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::page::render_content;
use crate::context::PageData;
use crate::error::{BuildError, RenderError};
use crate::module::{Module, TemplateKind};
use crate::template::{OverlaySources, SetBuilder, ENTRY_BLOCK};

/// The in-flight edit sent by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub filename: String,
    pub content: String,
}

impl PreviewRequest {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Why a preview could not be rendered.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{filename} is not an active template of module {module}")]
    UnknownFile { module: String, filename: String },

    #[error("{filename} is neither markup nor a style sheet")]
    Unsupported { filename: String },
}

/// Result of a preview, always displayable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutput {
    Rendered(String),
    /// Error message, unescaped.
    Failed(String),
}

impl PreviewOutput {
    pub fn is_error(&self) -> bool {
        matches!(self, PreviewOutput::Failed(_))
    }

    /// HTML body to send back; failures become an error block.
    pub fn into_body(self) -> String {
        match self {
            PreviewOutput::Rendered(html) => html,
            PreviewOutput::Failed(message) => error_payload(&message),
        }
    }
}

/// Wraps raw CSS in a style element.
pub fn style_block(css: &str) -> String {
    format!("<style type=\"text/css\">\n{css}\n</style>")
}

/// Marked, escaped HTML block describing a preview failure.
pub fn error_payload(message: &str) -> String {
    format!(
        "<div class=\"mosaic-preview-error\"><strong>Preview failed</strong><pre>{}</pre></div>",
        HtmlEscape(message)
    )
}

/// Renders a preview of `request` within `module`.
pub fn render_preview(
    builder: &SetBuilder,
    module: &Module,
    request: &PreviewRequest,
) -> PreviewOutput {
    match try_render_preview(builder, module, request) {
        Ok(html) => PreviewOutput::Rendered(html),
        Err(e) => {
            tracing::debug!(module = %module.id, file = %request.filename, error = %e, "preview failed");
            PreviewOutput::Failed(e.to_string())
        }
    }
}

fn try_render_preview(
    builder: &SetBuilder,
    module: &Module,
    request: &PreviewRequest,
) -> Result<String, PreviewError> {
    match TemplateKind::of(&request.filename) {
        TemplateKind::Style => return Ok(style_block(&request.content)),
        TemplateKind::Other => {
            return Err(PreviewError::Unsupported {
                filename: request.filename.clone(),
            })
        }
        TemplateKind::Markup => {}
    }

    let entry = module
        .entry(&request.filename)
        .ok_or_else(|| PreviewError::UnknownFile {
            module: module.id.clone(),
            filename: request.filename.clone(),
        })?;

    let overlay = OverlaySources::new(&request.filename, &request.content);
    let set = builder.build_with(module, &overlay)?;

    if entry.is_base {
        let content = render_content(&set, module);
        let page = PageData::new(module, content.html);
        Ok(set.render(ENTRY_BLOCK, page.value())?)
    } else {
        Ok(set.render(entry.block_name(), module)?)
    }
}
