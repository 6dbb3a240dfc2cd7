//! Module page rendering.

use crate::context::{PageData, RenderContext};
use crate::error::RenderError;
use crate::module::Module;
use crate::template::{BlockSet, ENTRY_BLOCK, LAYOUT_BLOCK};

/// Whether a request wants the whole document or only the module's fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Complete document through the `layout` block.
    #[default]
    Full,
    /// Only the `page` block, for partial page updates.
    Fragment,
}

impl RenderMode {
    /// Maps the transport's "fragment requested" flag to a mode.
    pub fn from_fragment_flag(fragment: bool) -> Self {
        if fragment {
            RenderMode::Fragment
        } else {
            RenderMode::Full
        }
    }
}

/// A sub-template that failed during ordered rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFailure {
    pub block: String,
    pub file: String,
    pub message: String,
}

/// Ordered sub-template output plus whatever was left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedContent {
    pub html: String,
    pub failures: Vec<BlockFailure>,
}

/// A rendered module page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub body: String,
    pub mode: RenderMode,
    /// Sub-templates omitted from the content because they failed.
    pub failures: Vec<BlockFailure>,
}

/// Renders the module's sub-templates, in order, into one content blob.
///
/// Each active, non-base markup entry is executed with the module as context,
/// sorted by ascending `order` (ties keep manifest order). A block that fails
/// is logged and left out, and rendering carries on with the next one; the
/// failure is returned in [`RenderedContent::failures`].
///
/// A module without sub-templates yields empty content.
pub fn render_content(set: &BlockSet, module: &Module) -> RenderedContent {
    let mut out = RenderedContent::default();

    for entry in module.renderable_entries() {
        let block = entry.block_name();
        match set.render(block, module) {
            Ok(html) => out.html.push_str(&html),
            Err(e) => {
                // TODO: product review on whether omitted blocks should be visible on the page
                tracing::warn!(module = %module.id, block, file = %entry.filename, error = %e, "sub-template failed, omitting its output");
                out.failures.push(BlockFailure {
                    block: block.to_string(),
                    file: entry.filename.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    out
}

/// Renders a module from its composed set.
///
/// - [`RenderMode::Fragment`]: only the `page` block, with `module` and `content`.
/// - [`RenderMode::Full`]: the `layout` block with a `module_page` context
///   (see [`crate::context`]).
///
/// # Errors
///
/// - [`RenderError::MissingEntryBlock`] when the set has no `page` block
/// - [`RenderError::MissingLayout`] in full mode when the set has no `layout`
/// - template execution errors from the `page`/`layout` blocks themselves
pub fn render_page(
    set: &BlockSet,
    module: &Module,
    mode: RenderMode,
    listing_enabled: bool,
) -> Result<RenderedPage, RenderError> {
    if !set.contains(ENTRY_BLOCK) {
        return Err(RenderError::MissingEntryBlock {
            module: module.id.clone(),
        });
    }
    if mode == RenderMode::Full && !set.contains(LAYOUT_BLOCK) {
        return Err(RenderError::MissingLayout);
    }

    let RenderedContent { html, failures } = render_content(set, module);
    let page = PageData::new(module, html);

    let body = match mode {
        RenderMode::Fragment => set.render(ENTRY_BLOCK, page.value())?,
        RenderMode::Full => {
            let ctx = RenderContext::ModulePage(page);
            set.render(LAYOUT_BLOCK, ctx.layout_value(listing_enabled))?
        }
    };

    tracing::debug!(module = %module.id, ?mode, bytes = body.len(), "rendered module page");
    Ok(RenderedPage {
        body,
        mode,
        failures,
    })
}

/// Renders a non-module view (home page, listing) through the layout.
pub fn render_view(
    set: &BlockSet,
    ctx: &RenderContext<'_>,
    listing_enabled: bool,
) -> Result<String, RenderError> {
    if !set.contains(LAYOUT_BLOCK) {
        return Err(RenderError::MissingLayout);
    }
    set.render(LAYOUT_BLOCK, ctx.layout_value(listing_enabled))
}
