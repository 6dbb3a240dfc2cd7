//! Template set composition.
//!
//! This module turns template files into executable, independently owned
//! [`BlockSet`]s. It has three layers:
//!
//! 1. [`BlockSet`]: a named-block registry (name → compiled block) supporting
//!    `clone()` and [`graft`](BlockSet::graft).
//! 2. [`load_base_set`]: parses the shared layout directory once at startup.
//! 3. [`SetBuilder`]: composes the base set with one module's blocks.
//!
//! ## Composition
//!
//! ```text
//!   layout/                      modules/pricing/templates/
//!   ├── layout.html  ─┐          ├── base.html    → page
//!   ├── page.html     │          ├── widget.html  → widget
//!   └── nav.html      │          └── content.html → content
//!                     ▼                    │
//!              base BlockSet               │ parsed standalone
//!                     │ clone()            ▼
//!                     └──────────►  module BlockSet ◄── graft(name, block)
//! ```
//!
//! Module blocks replace base blocks of the same name, so a module's `page`
//! overrides the layout's default `page`. The base set itself is never
//! written to; every module gets its own copy.
//!
//! ## Block names
//!
//! | Name | Role |
//! |------|------|
//! | [`LAYOUT_BLOCK`] | Full document, rendered for full-page requests |
//! | [`ENTRY_BLOCK`] | Module entry point, rendered alone for fragment requests |
//!
//! Templates reference each other with `{% include "name" %}`, resolved
//! against the composed set at render time.

mod blocks;
mod builder;
pub mod filters;
mod loader;

pub use blocks::{Block, BlockSet};
pub use builder::{DiskSources, OverlaySources, SetBuilder, SourceProvider};
pub use loader::{load_base_set, walk_layout_dir, LayoutFile, LAYOUT_SET};

/// Name of the block rendering a complete document.
pub const LAYOUT_BLOCK: &str = "layout";

/// Name of a module's entry-point block.
pub const ENTRY_BLOCK: &str = "page";
