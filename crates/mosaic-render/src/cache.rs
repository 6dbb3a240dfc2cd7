//! Compiled set cache, keyed by module id.
//!
//! Readers take a cheap `Arc` clone under a shared lock and render without
//! holding it. Writers build outside the lock and only take the exclusive lock
//! to swap finished sets in, so a reader sees either the old set or the new
//! one, never a partial rebuild.
//!
//! Every build is stamped with a generation taken before its sources are
//! read. A set is only published if no newer generation is already in place
//! for that module, so two overlapping rebuilds cannot leave the older sources
//! serving.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BuildError;
use crate::module::Module;
use crate::template::{BlockSet, SetBuilder};

/// Outcome of building many modules at once.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Module ids published to the cache.
    pub built: Vec<String>,
    /// Inactive modules that were not built.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, BuildError)>,
}

impl BuildReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A published set and the generation it was built at.
struct Published {
    generation: u64,
    set: Arc<BlockSet>,
}

/// Holds every module's compiled set.
pub struct TemplateCache {
    builder: SetBuilder,
    sets: RwLock<HashMap<String, Published>>,
    generation: AtomicU64,
}

impl TemplateCache {
    /// Creates an empty cache over a base set.
    pub fn new(base: BlockSet) -> Self {
        Self::with_builder(SetBuilder::new(Arc::new(base)))
    }

    pub fn with_builder(builder: SetBuilder) -> Self {
        Self {
            builder,
            sets: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn builder(&self) -> &SetBuilder {
        &self.builder
    }

    pub fn base(&self) -> &Arc<BlockSet> {
        self.builder.base()
    }

    /// Builds every active module and publishes the ones that compile.
    ///
    /// A failing module is reported and left out; it never prevents the
    /// others from being published.
    pub fn build_all<'a>(&self, modules: impl IntoIterator<Item = &'a Module>) -> BuildReport {
        let mut report = BuildReport::default();
        let mut fresh = Vec::new();

        for module in modules {
            if !module.active {
                report.skipped.push(module.id.clone());
                continue;
            }
            let generation = self.next_generation();
            match self.builder.build(module) {
                Ok(set) => fresh.push((module.id.clone(), generation, Arc::new(set))),
                Err(e) => {
                    tracing::warn!(module = %module.id, error = %e, "module template set failed to build");
                    report.failed.push((module.id.clone(), e));
                }
            }
        }

        {
            let mut sets = self.sets.write();
            for (id, generation, set) in fresh {
                if Self::publish_locked(&mut sets, &id, generation, set) {
                    report.built.push(id);
                }
            }
        }

        tracing::info!(
            built = report.built.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "built module template sets"
        );
        report
    }

    /// Rebuilds one module and swaps it in.
    ///
    /// On failure the previously published set (if any) stays in effect.
    /// A rebuild that finishes after a newer one for the same module is
    /// discarded; the newer set stays published.
    pub fn rebuild(&self, module: &Module) -> Result<(), BuildError> {
        let generation = self.next_generation();
        let set = self.builder.build(module).inspect_err(|e| {
            tracing::warn!(module = %module.id, error = %e, "rebuild failed, keeping previous set");
        })?;
        if self.publish(&module.id, generation, set) {
            tracing::info!(module = %module.id, generation, "rebuilt module template set");
        }
        Ok(())
    }

    /// Reserves a generation for a build about to read its sources.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publishes `set` unless a newer generation is already in place.
    ///
    /// Returns whether the set was published.
    pub fn publish(&self, id: &str, generation: u64, set: BlockSet) -> bool {
        let mut sets = self.sets.write();
        Self::publish_locked(&mut sets, id, generation, Arc::new(set))
    }

    fn publish_locked(
        sets: &mut HashMap<String, Published>,
        id: &str,
        generation: u64,
        set: Arc<BlockSet>,
    ) -> bool {
        if let Some(current) = sets.get(id) {
            if current.generation > generation {
                tracing::debug!(
                    module = id,
                    stale = generation,
                    current = current.generation,
                    "discarding stale template set"
                );
                return false;
            }
        }
        sets.insert(id.to_string(), Published { generation, set });
        true
    }

    pub fn get(&self, id: &str) -> Option<Arc<BlockSet>> {
        self.sets.read().get(id).map(|p| Arc::clone(&p.set))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sets.read().contains_key(id)
    }

    /// Drops a module's set. Returns whether one was present.
    pub fn evict(&self, id: &str) -> bool {
        self.sets.write().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.read().is_empty()
    }
}
