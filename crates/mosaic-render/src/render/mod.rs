//! Page and preview rendering.
//!
//! ## Which render function?
//!
//! | Function | Use when |
//! |----------|----------|
//! | [`render_page`] | Serving a module from its cached set (full or fragment) |
//! | [`render_view`] | Home page or module listing through the base layout |
//! | [`render_content`] | Only the module's ordered sub-template output |
//! | [`render_preview`] | Live editing, with one file's unsaved content |

mod page;
mod preview;

pub use page::{
    render_content, render_page, render_view, BlockFailure, RenderMode, RenderedContent,
    RenderedPage,
};
pub use preview::{
    error_payload, render_preview, style_block, PreviewError, PreviewOutput, PreviewRequest,
};
