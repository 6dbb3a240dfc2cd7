//! # Mosaic Render - Module Page Composition
//!
//! `mosaic-render` assembles independently authored page fragments
//! (*modules*) into HTML. A shared layout provides the document shell and
//! default blocks; each module brings its own blocks, which override the
//! layout's where names collide. The result is served either as a complete
//! document or as a fragment for partial page updates.
//!
//! ## Core Concepts
//!
//! - [`Module`]: a composable unit with an ordered list of [`TemplateEntry`]s
//! - [`BlockSet`]: an owned registry of named blocks with `clone()` and `graft()`
//! - [`SetBuilder`]: composes the base set with one module's blocks
//! - [`TemplateCache`]: compiled sets per module, rebuilt one at a time on save
//! - [`render_page`] / [`render_preview`]: execute a set for a request
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mosaic_render::{load_base_set, render_page, ModuleCatalog, RenderMode, TemplateCache};
//!
//! let catalog = ModuleCatalog::load("./modules")?;
//! let cache = TemplateCache::new(load_base_set("./layout")?);
//! let report = cache.build_all(catalog.active());
//!
//! let module = catalog.by_slug("pricing").unwrap();
//! let set = cache.get(&module.id).unwrap();
//! let page = render_page(&set, module, RenderMode::Full, true)?;
//! println!("{}", page.body);
//! ```
//!
//! ## Templates
//!
//! Templates use MiniJinja (Jinja2) syntax. A file's block name is its filename
//! without extension; a module's base file always provides `page`. The layout's
//! `layout` block renders full documents and typically does
//! `{% include "page" %}` for module pages, which picks up the module's own
//! `page` because includes resolve against the composed set.
//!
//! Sub-templates render with the module as context (`{{ name }}`, `{{ slug }}`).
//! The `page` block sees `module` and `content`, the ordered sub-template output.

pub mod cache;
pub mod catalog;
pub mod context;
mod error;
pub mod module;
pub mod render;
pub mod template;

pub use error::{BuildError, RenderError};

pub use cache::{BuildReport, TemplateCache};
pub use catalog::{CatalogError, ModuleCatalog};
pub use context::{PageData, RenderContext};
pub use module::{Module, ModuleSummary, TemplateEntry, TemplateKind};

pub use render::{
    error_payload, render_content, render_page, render_preview, render_view, style_block,
    BlockFailure, PreviewError, PreviewOutput, PreviewRequest, RenderMode, RenderedContent,
    RenderedPage,
};

pub use template::{
    load_base_set, Block, BlockSet, DiskSources, OverlaySources, SetBuilder, SourceProvider,
    ENTRY_BLOCK, LAYOUT_BLOCK,
};
