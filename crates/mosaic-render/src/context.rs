//! Rendering contexts handed to the layout.
//!
//! The layout renders three kinds of pages: the home page, a module listing,
//! and a single module. [`RenderContext`] names those three cases and
//! [`RenderContext::layout_value`] turns each into the template context with
//! an exhaustive `match`, tagging it with a `view` key the layout branches on:
//!
//! ```jinja
//! {% if view == "module_page" %}
//!   {% include "page" %}
//! {% elif view == "module_list" %}
//!   {% for m in modules %}<a href="/m/{{ m.slug }}">{{ m.name }}</a>{% endfor %}
//! {% else %}
//!   Welcome.
//! {% endif %}
//! ```
//!
//! | `view` | Other keys |
//! |--------|-----------|
//! | `empty` | `listing_enabled` |
//! | `module_list` | `listing_enabled`, `modules` |
//! | `module_page` | `listing_enabled`, `module`, `content` |

use minijinja::{context, Value};

use crate::module::{Module, ModuleSummary};

/// A module plus its pre-rendered sub-template content.
#[derive(Debug, Clone)]
pub struct PageData<'a> {
    pub module: &'a Module,
    /// Concatenated output of the module's sub-templates, already escaped.
    pub content: String,
}

impl<'a> PageData<'a> {
    pub fn new(module: &'a Module, content: impl Into<String>) -> Self {
        Self {
            module,
            content: content.into(),
        }
    }

    /// Context for the entry-point block: `module` and `content`.
    pub fn value(&self) -> Value {
        context! {
            module => self.module,
            content => Value::from_safe_string(self.content.clone()),
        }
    }
}

/// What the layout is asked to render.
#[derive(Debug, Clone)]
pub enum RenderContext<'a> {
    /// Root/home page.
    Empty,
    /// A listing of modules.
    ModuleList(Vec<ModuleSummary>),
    /// One module's page.
    ModulePage(PageData<'a>),
}

impl RenderContext<'_> {
    /// Tag the layout sees in its `view` variable.
    pub fn view(&self) -> &'static str {
        match self {
            RenderContext::Empty => "empty",
            RenderContext::ModuleList(_) => "module_list",
            RenderContext::ModulePage(_) => "module_page",
        }
    }

    /// Full-document context for the layout block.
    pub fn layout_value(&self, listing_enabled: bool) -> Value {
        let view = self.view();
        match self {
            RenderContext::Empty => context! {
                view => view,
                listing_enabled => listing_enabled,
            },
            RenderContext::ModuleList(modules) => context! {
                view => view,
                listing_enabled => listing_enabled,
                modules => modules,
            },
            RenderContext::ModulePage(page) => context! {
                view => view,
                listing_enabled => listing_enabled,
                module => page.module,
                content => Value::from_safe_string(page.content.clone()),
            },
        }
    }
}
