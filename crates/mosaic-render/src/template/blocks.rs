//! Named-block registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::{AutoEscape, Environment};
use serde::Serialize;

use super::filters::register_filters;
use crate::error::{BuildError, RenderError};
use crate::module::TemplateKind;

/// The source of one named block and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Template source exactly as read (or as supplied by a preview).
    pub source: Arc<str>,
    pub kind: TemplateKind,
    /// Filename the block was parsed from.
    pub file: String,
}

impl Block {
    pub fn new(source: impl Into<Arc<str>>, kind: TemplateKind, file: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind,
            file: file.into(),
        }
    }

    /// Source handed to the compiler.
    ///
    /// Markup is HTML auto-escaped. Style sheets are compiled with escaping off
    /// so selectors like `a > b` survive.
    fn compiled_source(&self) -> String {
        match self.kind {
            TemplateKind::Style => {
                format!("{{% autoescape false %}}{}{{% endautoescape %}}", self.source)
            }
            TemplateKind::Markup | TemplateKind::Other => self.source.to_string(),
        }
    }
}

/// An owned set of named, executable blocks.
///
/// Cloning produces an independent set: blocks grafted into the clone are
/// invisible to the original and vice versa. Compiled templates are immutable
/// and may be shared between clones, but the name → block mapping is owned by
/// each set.
///
/// ```rust
/// use mosaic_render::template::{Block, BlockSet};
/// use mosaic_render::module::TemplateKind;
///
/// let mut base = BlockSet::new("layout");
/// base.parse("page", Block::new("default", TemplateKind::Markup, "page.html")).unwrap();
///
/// let mut module = base.clone();
/// module
///     .graft("page", &Block::new("custom", TemplateKind::Markup, "base.html"))
///     .unwrap();
///
/// assert_eq!(base.render("page", ()).unwrap(), "default");
/// assert_eq!(module.render("page", ()).unwrap(), "custom");
/// ```
#[derive(Clone)]
pub struct BlockSet {
    label: String,
    env: Environment<'static>,
    blocks: BTreeMap<String, Block>,
}

impl BlockSet {
    /// Creates an empty set. `label` names the set in errors and logs
    /// (a module id, or `layout`).
    pub fn new(label: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        register_filters(&mut env);
        Self {
            label: label.into(),
            env,
            blocks: BTreeMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the set under a different label.
    pub fn relabel(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Compiles a new block into this set.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateBlock`] if the name is already taken, or
    /// [`BuildError::Parse`] if the source does not compile.
    pub fn parse(&mut self, name: &str, block: Block) -> Result<(), BuildError> {
        if let Some(existing) = self.blocks.get(name) {
            return Err(BuildError::DuplicateBlock {
                set: self.label.clone(),
                name: name.to_string(),
                first: existing.file.clone(),
                second: block.file,
            });
        }
        self.compile(name, block)
    }

    /// Attaches a block by name, replacing any block already registered under it.
    ///
    /// The block is recompiled inside this set, so its includes resolve
    /// against this set's blocks.
    pub fn graft(&mut self, name: &str, block: &Block) -> Result<(), BuildError> {
        if self.blocks.contains_key(name) {
            tracing::debug!(set = %self.label, block = name, file = %block.file, "replacing block");
            self.env.remove_template(name);
        }
        self.compile(name, block.clone())
    }

    fn compile(&mut self, name: &str, block: Block) -> Result<(), BuildError> {
        self.env
            .add_template_owned(name.to_string(), block.compiled_source())
            .map_err(|e| BuildError::parse(&self.label, &block.file, e))?;
        self.blocks.insert(name.to_string(), block);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    /// Block names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Block)> {
        self.blocks.iter().map(|(name, block)| (name.as_str(), block))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Executes one block with the given context.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, RenderError> {
        if !self.contains(name) {
            return Err(RenderError::TemplateNotFound(name.to_string()));
        }
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}

impl fmt::Debug for BlockSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockSet")
            .field("label", &self.label)
            .field("blocks", &self.blocks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup(source: &str, file: &str) -> Block {
        Block::new(source, TemplateKind::Markup, file)
    }

    #[test]
    fn test_parse_and_render() {
        let mut set = BlockSet::new("t");
        set.parse("hello", markup("Hello {{ name }}", "hello.html"))
            .unwrap();
        let out = set
            .render("hello", minijinja::context! { name => "World" })
            .unwrap();
        assert_eq!(out, "Hello World");
        assert!(set.contains("hello"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_markup_is_html_escaped() {
        let mut set = BlockSet::new("t");
        set.parse("p", markup("<p>{{ text }}</p>", "p.html")).unwrap();
        let out = set
            .render("p", minijinja::context! { text => "<b>" })
            .unwrap();
        assert_eq!(out, "<p>&lt;b&gt;</p>");
    }

    #[test]
    fn test_style_is_not_escaped() {
        let mut set = BlockSet::new("t");
        set.parse(
            "style",
            Block::new("a > b { content: \"{{ mark }}\" }", TemplateKind::Style, "style.css"),
        )
        .unwrap();
        let out = set
            .render("style", minijinja::context! { mark => "&" })
            .unwrap();
        assert_eq!(out, "a > b { content: \"&\" }");
    }

    #[test]
    fn test_parse_rejects_duplicate_names() {
        let mut set = BlockSet::new("t");
        set.parse("w", markup("a", "w.html")).unwrap();
        let err = set
            .parse("w", Block::new("b", TemplateKind::Style, "w.css"))
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateBlock { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let mut set = BlockSet::new("m1");
        let err = set
            .parse("broken", markup("{% if %}", "broken.html"))
            .unwrap_err();
        match err {
            BuildError::Parse { set, file, .. } => {
                assert_eq!(set, "m1");
                assert_eq!(file, "broken.html");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!set.contains("broken"));
    }

    #[test]
    fn test_graft_into_clone_leaves_original_untouched() {
        let mut base = BlockSet::new("layout");
        base.parse("page", markup("base page", "page.html")).unwrap();

        let mut a = base.clone();
        a.graft("page", &markup("a page", "base.html")).unwrap();
        a.graft("extra", &markup("a extra", "extra.html")).unwrap();

        let b = base.clone();

        assert_eq!(base.render("page", ()).unwrap(), "base page");
        assert!(!base.contains("extra"));
        assert_eq!(a.render("page", ()).unwrap(), "a page");
        assert_eq!(b.render("page", ()).unwrap(), "base page");
        assert!(!b.contains("extra"));
    }

    #[test]
    fn test_include_resolves_against_composed_set() {
        let mut base = BlockSet::new("layout");
        base.parse("layout", markup("[{% include \"page\" %}]", "layout.html"))
            .unwrap();
        base.parse("page", markup("default", "page.html")).unwrap();

        let mut module = base.clone();
        module
            .graft("page", &markup("override", "base.html"))
            .unwrap();

        assert_eq!(base.render("layout", ()).unwrap(), "[default]");
        assert_eq!(module.render("layout", ()).unwrap(), "[override]");
    }

    #[test]
    fn test_render_missing_block() {
        let set = BlockSet::new("t");
        assert!(matches!(
            set.render("nope", ()),
            Err(RenderError::TemplateNotFound(_))
        ));
    }
}
