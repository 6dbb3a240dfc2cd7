//! Module catalog: every module found under a modules directory.
//!
//! The catalog is an explicitly owned value. Nothing here is global; the
//! application decides when to load it and when to reload it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::module::{Module, ModuleSummary, MANIFEST_FILE};

/// Error type for module metadata operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two active modules claim the same slug.
    #[error("slug \"{slug}\" is used by both {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },

    #[error("module id \"{id}\" appears more than once")]
    DuplicateId { id: String },

    /// A module must have exactly one active base entry.
    #[error("module {module} has {count} base templates, expected exactly one")]
    BaseEntry { module: String, count: usize },
}

/// All modules known to the application, in directory-name order.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
    by_id: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
}

impl ModuleCatalog {
    /// Builds a catalog from already loaded modules.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] or [`CatalogError::DuplicateSlug`]
    /// (the latter only among active modules).
    pub fn from_modules(modules: Vec<Module>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::new();
        let mut by_slug: HashMap<String, usize> = HashMap::new();

        for (index, module) in modules.iter().enumerate() {
            if by_id.insert(module.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateId {
                    id: module.id.clone(),
                });
            }
            if !module.active {
                continue;
            }
            if let Some(&first) = by_slug.get(&module.slug) {
                return Err(CatalogError::DuplicateSlug {
                    slug: module.slug.clone(),
                    first: modules[first].id.clone(),
                    second: module.id.clone(),
                });
            }
            by_slug.insert(module.slug.clone(), index);
        }

        Ok(Self {
            modules,
            by_id,
            by_slug,
        })
    }

    /// Loads every subdirectory of `root` that contains a `module.json`.
    ///
    /// Manifests that fail to read or parse are skipped with a warning so one
    /// broken module never hides the others. A module without exactly one base
    /// entry is kept, but logged.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let root = root.as_ref();
        let entries = fs::read_dir(root).map_err(|source| CatalogError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.join(MANIFEST_FILE).is_file())
            .collect();
        dirs.sort();

        let mut modules = Vec::with_capacity(dirs.len());
        for dir in dirs {
            match Module::load(&dir) {
                Ok(module) => {
                    if let Err(e) = module.validate() {
                        tracing::warn!(module = %module.id, error = %e, "module has no usable base template");
                    }
                    modules.push(module);
                }
                Err(e) => {
                    tracing::warn!(dir = ?dir, error = %e, "skipping unreadable module");
                }
            }
        }

        tracing::debug!(root = ?root, count = modules.len(), "loaded module catalog");
        Self::from_modules(modules)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All modules, active or not.
    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().filter(|m| m.active)
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.by_id.get(id).map(|&i| &self.modules[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Module> {
        self.by_id.get(id).map(|&i| &mut self.modules[i])
    }

    /// Finds an active module by slug.
    pub fn by_slug(&self, slug: &str) -> Option<&Module> {
        self.by_slug.get(slug).map(|&i| &self.modules[i])
    }

    /// Summaries of active modules, for listings.
    pub fn summaries(&self) -> Vec<ModuleSummary> {
        self.active().map(Module::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::TemplateEntry;

    fn module(id: &str, slug: &str) -> Module {
        Module::new(id, id.to_uppercase(), slug, format!("/mods/{id}"))
            .with_template(TemplateEntry::base("base.html"))
    }

    #[test]
    fn test_lookup_by_id_and_slug() {
        let catalog =
            ModuleCatalog::from_modules(vec![module("a", "alpha"), module("b", "beta")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("b").unwrap().slug, "beta");
        assert_eq!(catalog.by_slug("alpha").unwrap().id, "a");
        assert!(catalog.by_slug("gamma").is_none());
    }

    #[test]
    fn test_duplicate_active_slug_rejected() {
        let err = ModuleCatalog::from_modules(vec![module("a", "same"), module("b", "same")])
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSlug { .. }));
    }

    #[test]
    fn test_inactive_module_may_reuse_slug() {
        let mut old = module("a", "same");
        old.active = false;
        let catalog = ModuleCatalog::from_modules(vec![old, module("b", "same")]).unwrap();
        assert_eq!(catalog.by_slug("same").unwrap().id, "b");
        assert_eq!(catalog.summaries().len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err =
            ModuleCatalog::from_modules(vec![module("a", "x"), module("a", "y")]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { .. }));
    }

    #[test]
    fn test_load_skips_broken_manifests() {
        let root = tempfile::tempdir().unwrap();

        let good_dir = root.path().join("good");
        fs::create_dir_all(&good_dir).unwrap();
        let mut good = module("good", "good");
        good.dir = good_dir;
        good.save_manifest().unwrap();

        let bad_dir = root.path().join("bad");
        fs::create_dir_all(&bad_dir).unwrap();
        fs::write(bad_dir.join(MANIFEST_FILE), "not json").unwrap();

        fs::create_dir_all(root.path().join("no-manifest")).unwrap();

        let catalog = ModuleCatalog::load(root.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("good").unwrap().dir, root.path().join("good"));
    }
}
