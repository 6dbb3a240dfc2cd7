//! Application state shared by all request threads.
//!
//! [`App`] owns the module catalog and the template cache. Both are created
//! once in [`App::open`]; the only later mutation is [`App::save`], which
//! writes one template file and rebuilds that module's set.

use std::fs;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use thiserror::Error;

use mosaic_render::{
    load_base_set, render_page, render_preview, render_view, BuildError, BuildReport,
    CatalogError, Module, ModuleCatalog, PreviewOutput, PreviewRequest, RenderContext,
    RenderError, RenderMode, RenderedPage, TemplateCache,
};

use crate::config::MosaicConfig;

/// Request-level failure, mapped to an HTTP status by the server.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    /// The module exists but its template set failed to build.
    #[error("module {0} is unavailable")]
    Unavailable(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A rendered module page plus what the transport needs to label it.
#[derive(Debug, Clone)]
pub struct ModuleResponse {
    pub page: RenderedPage,
    pub module_name: String,
}

pub struct App {
    config: MosaicConfig,
    catalog: RwLock<ModuleCatalog>,
    cache: TemplateCache,
}

impl App {
    /// Loads the layout, the catalog, and builds every active module.
    ///
    /// Fails if the layout cannot be loaded; individual module failures are
    /// logged and leave that module unavailable.
    pub fn open(config: MosaicConfig) -> Result<Self> {
        let app = Self::load(config)?;
        app.build_all();
        Ok(app)
    }

    /// Like [`App::open`] but leaves the cache empty.
    pub fn load(config: MosaicConfig) -> Result<Self> {
        let base = load_base_set(&config.layout_dir).with_context(|| {
            format!("Failed to load layout from {}", config.layout_dir.display())
        })?;
        let catalog = ModuleCatalog::load(&config.modules_dir).with_context(|| {
            format!("Failed to load modules from {}", config.modules_dir.display())
        })?;
        let cache = TemplateCache::new(base);

        Ok(Self {
            config,
            catalog: RwLock::new(catalog),
            cache,
        })
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Builds every active module into the cache; inactive ones are reported as skipped.
    pub fn build_all(&self) -> BuildReport {
        let catalog = self.catalog.read();
        self.cache.build_all(catalog.iter())
    }

    /// Snapshot of an active module by slug.
    pub fn module(&self, slug: &str) -> Result<Module, AppError> {
        self.catalog
            .read()
            .by_slug(slug)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("module {slug}")))
    }

    pub fn home(&self) -> Result<String, AppError> {
        Ok(render_view(
            self.cache.base(),
            &RenderContext::Empty,
            self.config.listing_enabled,
        )?)
    }

    pub fn listing(&self) -> Result<String, AppError> {
        if !self.config.listing_enabled {
            return Err(AppError::NotFound("module listing".to_string()));
        }
        let summaries = self.catalog.read().summaries();
        Ok(render_view(
            self.cache.base(),
            &RenderContext::ModuleList(summaries),
            true,
        )?)
    }

    /// Renders a module page in full or fragment mode.
    pub fn page(&self, slug: &str, mode: RenderMode) -> Result<ModuleResponse, AppError> {
        let module = self.module(slug)?;
        let set = self
            .cache
            .get(&module.id)
            .ok_or_else(|| AppError::Unavailable(module.id.clone()))?;
        let page = render_page(&set, &module, mode, self.config.listing_enabled)?;
        Ok(ModuleResponse {
            page,
            module_name: module.name,
        })
    }

    /// Renders a preview from a JSON request body.
    pub fn preview(&self, slug: &str, body: &str) -> Result<PreviewOutput, AppError> {
        let module = self.module(slug)?;
        let request: PreviewRequest = serde_json::from_str(body)
            .map_err(|e| AppError::BadRequest(format!("invalid preview request: {e}")))?;
        Ok(render_preview(self.cache.builder(), &module, &request))
    }

    /// Saves new content for an existing template and rebuilds the module.
    ///
    /// The file is written even if it fails to compile, so the edit is not
    /// lost; the module's previous set stays in effect until a save compiles.
    pub fn save(&self, slug: &str, filename: &str, content: &str) -> Result<(), AppError> {
        let mut module = self.module(slug)?;
        let entry = module
            .entry(filename)
            .ok_or_else(|| AppError::NotFound(format!("template {filename} in {slug}")))?;
        let path = module.template_path(entry);

        fs::write(&path, content).map_err(|source| AppError::Write {
            path: path.display().to_string(),
            source,
        })?;

        module.touch();
        if let Err(e) = module.save_manifest() {
            tracing::warn!(module = %module.id, error = %e, "failed to persist manifest");
        }
        if let Some(stored) = self.catalog.write().get_mut(&module.id) {
            stored.updated_at = module.updated_at;
        }

        tracing::info!(module = %module.id, file = filename, "template saved");
        self.cache.rebuild(&module)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_render::module::TEMPLATES_DIR;
    use mosaic_render::TemplateEntry;
    use std::path::Path;

    fn site(root: &Path) -> MosaicConfig {
        let layout = root.join("layout");
        fs::create_dir_all(&layout).unwrap();
        fs::write(
            layout.join("layout.html"),
            "<html>{% if view == 'module_page' %}{% include 'page' %}{% else %}{{ view }}{% endif %}</html>",
        )
        .unwrap();

        let dir = root.join("modules").join("m1");
        fs::create_dir_all(dir.join(TEMPLATES_DIR)).unwrap();
        fs::write(dir.join(TEMPLATES_DIR).join("base.html"), "<s>{{ content }}</s>").unwrap();
        fs::write(dir.join(TEMPLATES_DIR).join("w.html"), "w").unwrap();
        Module::new("m1", "One", "one", &dir)
            .with_template(TemplateEntry::base("base.html"))
            .with_template(TemplateEntry::new("w.html", 1))
            .save_manifest()
            .unwrap();

        MosaicConfig::default().resolve_relative_to(root)
    }

    #[test]
    fn test_page_modes() {
        let root = tempfile::tempdir().unwrap();
        let app = App::open(site(root.path())).unwrap();

        let full = app.page("one", RenderMode::Full).unwrap();
        assert_eq!(full.page.body, "<html><s>w</s></html>");
        assert_eq!(full.module_name, "One");

        let fragment = app.page("one", RenderMode::Fragment).unwrap();
        assert_eq!(fragment.page.body, "<s>w</s>");

        assert!(matches!(
            app.page("nope", RenderMode::Full),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_save_rebuilds_and_touches() {
        let root = tempfile::tempdir().unwrap();
        let app = App::open(site(root.path())).unwrap();
        assert!(app.module("one").unwrap().updated_at.is_none());

        app.save("one", "w.html", "W2").unwrap();
        assert_eq!(
            app.page("one", RenderMode::Fragment).unwrap().page.body,
            "<s>W2</s>"
        );
        assert!(app.module("one").unwrap().updated_at.is_some());

        let on_disk = Module::load(root.path().join("modules").join("m1")).unwrap();
        assert!(on_disk.updated_at.is_some());
    }

    #[test]
    fn test_broken_save_keeps_serving_previous_set() {
        let root = tempfile::tempdir().unwrap();
        let app = App::open(site(root.path())).unwrap();

        let err = app.save("one", "w.html", "{% if %}").unwrap_err();
        assert!(matches!(err, AppError::Build(_)));
        assert_eq!(
            app.page("one", RenderMode::Fragment).unwrap().page.body,
            "<s>w</s>"
        );
    }

    #[test]
    fn test_save_unknown_file_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let app = App::open(site(root.path())).unwrap();
        assert!(matches!(
            app.save("one", "new.html", "x"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_listing_respects_config() {
        let root = tempfile::tempdir().unwrap();
        let mut config = site(root.path());
        config.listing_enabled = false;
        let app = App::open(config).unwrap();
        assert_eq!(app.home().unwrap(), "<html>empty</html>");
        assert!(matches!(app.listing(), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_preview_bad_json() {
        let root = tempfile::tempdir().unwrap();
        let app = App::open(site(root.path())).unwrap();
        assert!(matches!(
            app.preview("one", "{"),
            Err(AppError::BadRequest(_))
        ));
        let ok = app
            .preview("one", r#"{"filename":"w.html","content":"live"}"#)
            .unwrap();
        assert_eq!(ok, PreviewOutput::Rendered("live".to_string()));
    }
}
