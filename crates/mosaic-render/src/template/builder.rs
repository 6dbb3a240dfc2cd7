//! Per-module set composition.

use std::fs;
use std::sync::Arc;

use super::blocks::{Block, BlockSet};
use crate::error::BuildError;
use crate::module::{Module, TemplateEntry};

/// Supplies the source text of a module's template files.
pub trait SourceProvider {
    fn read(&self, module: &Module, entry: &TemplateEntry) -> Result<String, BuildError>;
}

/// Reads every file from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSources;

impl SourceProvider for DiskSources {
    fn read(&self, module: &Module, entry: &TemplateEntry) -> Result<String, BuildError> {
        let path = module.template_path(entry);
        fs::read_to_string(&path).map_err(|e| BuildError::io(path, e))
    }
}

/// Substitutes in-flight content for one file, reading the rest from disk.
#[derive(Debug, Clone, Copy)]
pub struct OverlaySources<'a> {
    filename: &'a str,
    content: &'a str,
}

impl<'a> OverlaySources<'a> {
    pub fn new(filename: &'a str, content: &'a str) -> Self {
        Self { filename, content }
    }
}

impl SourceProvider for OverlaySources<'_> {
    fn read(&self, module: &Module, entry: &TemplateEntry) -> Result<String, BuildError> {
        if entry.filename == self.filename {
            Ok(self.content.to_string())
        } else {
            DiskSources.read(module, entry)
        }
    }
}

/// Composes module sets on top of a shared base set.
///
/// Building never touches the base: each call clones it and grafts the
/// module's blocks into the clone.
///
/// ```rust,ignore
/// let builder = SetBuilder::new(Arc::new(load_base_set("./layout")?));
/// let set = builder.build(&module)?;
/// let html = set.render("page", &ctx)?;
/// ```
#[derive(Debug, Clone)]
pub struct SetBuilder {
    base: Arc<BlockSet>,
}

impl SetBuilder {
    pub fn new(base: Arc<BlockSet>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Arc<BlockSet> {
        &self.base
    }

    /// Builds a module's set from the files on disk.
    pub fn build(&self, module: &Module) -> Result<BlockSet, BuildError> {
        self.build_with(module, &DiskSources)
    }

    /// Builds a module's set, reading sources through `sources`.
    ///
    /// 1. Every active markup/style entry is parsed into a standalone set, so a
    ///    broken file fails the build before anything is composed.
    /// 2. The base set is cloned.
    /// 3. Each standalone block is grafted into the clone by name, replacing
    ///    base blocks with the same name.
    ///
    /// Inactive entries and files of other kinds are skipped.
    pub fn build_with(
        &self,
        module: &Module,
        sources: &dyn SourceProvider,
    ) -> Result<BlockSet, BuildError> {
        let mut own = BlockSet::new(&module.id);
        for entry in module.composable_entries() {
            let source = sources.read(module, entry)?;
            own.parse(
                entry.block_name(),
                Block::new(source, entry.kind(), entry.filename.clone()),
            )?;
        }

        let mut set = self.base.as_ref().clone().relabel(&module.id);
        for (name, block) in own.iter() {
            set.graft(name, block)?;
        }

        tracing::debug!(
            module = %module.id,
            own = own.len(),
            total = set.len(),
            "composed module template set"
        );
        Ok(set)
    }
}
