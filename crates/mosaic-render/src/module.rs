//! Module metadata: the composable unit and its template entries.
//!
//! A module lives in its own directory:
//!
//! ```text
//! modules/pricing/
//! ├── module.json
//! └── templates/
//!     ├── base.html      (is_base, provides the `page` block)
//!     ├── widget.html    (order 1)
//!     ├── content.html   (order 2)
//!     └── style.css
//! ```
//!
//! `module.json` is the serialized [`Module`]. The directory itself is not part
//! of the manifest; [`Module::load`] fills it in.
//!
//! # Block names
//!
//! Each entry addresses its block by the filename with the extension stripped
//! (`widget.html` → `widget`). The base entry is the exception: it always
//! provides the entry-point block [`ENTRY_BLOCK`](crate::template::ENTRY_BLOCK),
//! whatever its filename.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::template::ENTRY_BLOCK;

/// Manifest filename inside a module directory.
pub const MANIFEST_FILE: &str = "module.json";

/// Subdirectory holding a module's template files.
pub const TEMPLATES_DIR: &str = "templates";

/// Extensions recognized as renderable markup.
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm", "tmpl", "jinja", "j2"];

/// Extensions recognized as style sheets.
pub const STYLE_EXTENSIONS: &[&str] = &["css"];

/// What a template file contributes, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Page markup; rendered into the content blob.
    Markup,
    /// Style sheet; composed into the set but never part of the content blob.
    Style,
    /// Anything else. Ignored by composition.
    Other,
}

impl TemplateKind {
    /// Classifies a filename by extension (case-insensitive).
    pub fn of(filename: &str) -> Self {
        let ext = match Path::new(filename).extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return TemplateKind::Other,
        };
        if MARKUP_EXTENSIONS.contains(&ext.as_str()) {
            TemplateKind::Markup
        } else if STYLE_EXTENSIONS.contains(&ext.as_str()) {
            TemplateKind::Style
        } else {
            TemplateKind::Other
        }
    }

    /// True for kinds that take part in set composition.
    pub fn is_composable(self) -> bool {
        !matches!(self, TemplateKind::Other)
    }
}

/// Returns the filename without its final extension.
///
/// ```rust
/// use mosaic_render::module::strip_extension;
///
/// assert_eq!(strip_extension("widget.html"), "widget");
/// assert_eq!(strip_extension("card.item.html"), "card.item");
/// assert_eq!(strip_extension("README"), "README");
/// ```
pub fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => filename,
    }
}

fn default_active() -> bool {
    true
}

/// One file backing a named block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub filename: String,

    /// Path relative to the module directory. Defaults to `templates/<filename>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub is_base: bool,

    /// Position in the content blob; only meaningful for non-base markup entries.
    #[serde(default)]
    pub order: i32,

    #[serde(default = "default_active")]
    pub active: bool,
}

impl TemplateEntry {
    /// Creates an active, non-base entry with the given order.
    pub fn new(filename: impl Into<String>, order: i32) -> Self {
        Self {
            filename: filename.into(),
            path: None,
            is_base: false,
            order,
            active: true,
        }
    }

    /// Creates the module's base entry.
    pub fn base(filename: impl Into<String>) -> Self {
        Self {
            is_base: true,
            ..Self::new(filename, 0)
        }
    }

    /// Marks the entry inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn kind(&self) -> TemplateKind {
        TemplateKind::of(&self.filename)
    }

    /// The filename with its extension stripped.
    pub fn defined_name(&self) -> &str {
        strip_extension(&self.filename)
    }

    /// The name this entry's block is registered under in a composed set.
    pub fn block_name(&self) -> &str {
        if self.is_base {
            ENTRY_BLOCK
        } else {
            self.defined_name()
        }
    }

    /// Path of the file relative to its module directory.
    pub fn relative_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => Path::new(TEMPLATES_DIR).join(&self.filename),
        }
    }
}

/// A composable unit of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub slug: String,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub templates: Vec<TemplateEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Directory the module was loaded from.
    #[serde(skip)]
    pub dir: PathBuf,
}

/// The slice of a module shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleSummary {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl Module {
    /// Creates an active module with no templates.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        slug: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
            active: true,
            templates: Vec::new(),
            updated_at: None,
            dir: dir.into(),
        }
    }

    /// Appends a template entry, preserving list order.
    pub fn with_template(mut self, entry: TemplateEntry) -> Self {
        self.templates.push(entry);
        self
    }

    /// Reads `module.json` from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let path = dir.join(MANIFEST_FILE);
        let raw = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let mut module: Module =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Manifest { path, source })?;
        module.dir = dir.to_path_buf();
        Ok(module)
    }

    /// Writes the manifest back to `module.json` in the module directory.
    pub fn save_manifest(&self) -> Result<(), CatalogError> {
        let path = self.dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|source| CatalogError::Manifest {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| CatalogError::Io { path, source })
    }

    /// Stamps the module as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Checks that exactly one active entry is marked base.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let count = self
            .templates
            .iter()
            .filter(|t| t.active && t.is_base)
            .count();
        if count == 1 {
            Ok(())
        } else {
            Err(CatalogError::BaseEntry {
                module: self.id.clone(),
                count,
            })
        }
    }

    pub fn summary(&self) -> ModuleSummary {
        ModuleSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }

    /// Looks up an active entry by filename.
    pub fn entry(&self, filename: &str) -> Option<&TemplateEntry> {
        self.templates
            .iter()
            .find(|t| t.active && t.filename == filename)
    }

    pub fn base_entry(&self) -> Option<&TemplateEntry> {
        self.templates.iter().find(|t| t.active && t.is_base)
    }

    /// Active entries that take part in set composition, in list order.
    pub fn composable_entries(&self) -> impl Iterator<Item = &TemplateEntry> {
        self.templates
            .iter()
            .filter(|t| t.active && t.kind().is_composable())
    }

    /// Active, non-base markup entries in render order.
    ///
    /// Sorted by ascending `order`; the sort is stable, so entries sharing an
    /// order keep their manifest order.
    pub fn renderable_entries(&self) -> Vec<&TemplateEntry> {
        let mut entries: Vec<&TemplateEntry> = self
            .templates
            .iter()
            .filter(|t| t.active && !t.is_base && t.kind() == TemplateKind::Markup)
            .collect();
        entries.sort_by_key(|t| t.order);
        entries
    }

    /// Absolute (or `dir`-relative) path of an entry's file.
    pub fn template_path(&self, entry: &TemplateEntry) -> PathBuf {
        self.dir.join(entry.relative_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Module {
        Module::new("m1", "Module One", "one", "/mods/one")
            .with_template(TemplateEntry::base("base.html"))
            .with_template(TemplateEntry::new("content.html", 2))
            .with_template(TemplateEntry::new("widget.html", 1))
            .with_template(TemplateEntry::new("style.css", 0))
            .with_template(TemplateEntry::new("notes.txt", 0))
    }

    #[test]
    fn test_kind_by_extension() {
        assert_eq!(TemplateKind::of("a.html"), TemplateKind::Markup);
        assert_eq!(TemplateKind::of("a.HTML"), TemplateKind::Markup);
        assert_eq!(TemplateKind::of("a.tmpl"), TemplateKind::Markup);
        assert_eq!(TemplateKind::of("a.css"), TemplateKind::Style);
        assert_eq!(TemplateKind::of("a.js"), TemplateKind::Other);
        assert_eq!(TemplateKind::of("Makefile"), TemplateKind::Other);
    }

    #[test]
    fn test_block_name_of_base_is_entry_point() {
        let base = TemplateEntry::base("base.html");
        assert_eq!(base.defined_name(), "base");
        assert_eq!(base.block_name(), "page");

        let widget = TemplateEntry::new("widget.html", 1);
        assert_eq!(widget.block_name(), "widget");
    }

    #[test]
    fn test_relative_path_defaults_to_templates_dir() {
        let entry = TemplateEntry::new("widget.html", 1);
        assert_eq!(entry.relative_path(), PathBuf::from("templates/widget.html"));

        let custom = TemplateEntry {
            path: Some(PathBuf::from("partials/w.html")),
            ..TemplateEntry::new("w.html", 0)
        };
        assert_eq!(custom.relative_path(), PathBuf::from("partials/w.html"));
    }

    #[test]
    fn test_renderable_entries_sorted_and_filtered() {
        let module = sample();
        let names: Vec<_> = module
            .renderable_entries()
            .iter()
            .map(|t| t.filename.as_str())
            .collect();
        assert_eq!(names, vec!["widget.html", "content.html"]);
    }

    #[test]
    fn test_renderable_entries_skip_inactive() {
        let module = sample().with_template(TemplateEntry::new("old.html", 0).inactive());
        assert!(module
            .renderable_entries()
            .iter()
            .all(|t| t.filename != "old.html"));
        assert!(module.entry("old.html").is_none());
    }

    #[test]
    fn test_composable_entries_exclude_other_kinds() {
        let module = sample();
        let names: Vec<_> = module
            .composable_entries()
            .map(|t| t.filename.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["base.html", "content.html", "widget.html", "style.css"]
        );
    }

    #[test]
    fn test_validate_base_entry_count() {
        assert!(sample().validate().is_ok());

        let none = Module::new("m2", "Two", "two", "/mods/two")
            .with_template(TemplateEntry::new("a.html", 0));
        assert!(matches!(
            none.validate(),
            Err(CatalogError::BaseEntry { count: 0, .. })
        ));

        let two = sample().with_template(TemplateEntry::base("other.html"));
        assert!(matches!(
            two.validate(),
            Err(CatalogError::BaseEntry { count: 2, .. })
        ));
    }

    #[test]
    fn test_manifest_defaults() {
        let json = r#"{
            "id": "m1",
            "name": "One",
            "slug": "one",
            "templates": [
                {"filename": "base.html", "is_base": true},
                {"filename": "widget.html", "order": 3}
            ]
        }"#;
        let module: Module = serde_json::from_str(json).unwrap();
        assert!(module.active);
        assert!(module.updated_at.is_none());
        assert!(module.templates[0].is_base);
        assert!(module.templates[1].active);
        assert_eq!(module.templates[1].order, 3);
    }

    #[test]
    fn test_load_and_save_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut module = Module::new("m1", "One", "one", dir.path())
            .with_template(TemplateEntry::base("base.html"));
        module.touch();
        module.save_manifest().unwrap();

        let loaded = Module::load(dir.path()).unwrap();
        assert_eq!(loaded, module);
        assert_eq!(loaded.dir, dir.path());
    }

    #[test]
    fn test_load_reports_bad_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), "{ not json").unwrap();
        assert!(matches!(
            Module::load(dir.path()),
            Err(CatalogError::Manifest { .. })
        ));
    }
}
