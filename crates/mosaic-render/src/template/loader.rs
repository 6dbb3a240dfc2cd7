//! Base layout loading.
//!
//! The layout directory is flat: every markup or style file in it becomes one
//! block, named by its filename without extension.
//!
//! | File | Block |
//! |------|-------|
//! | `layout.html` | `layout` |
//! | `page.html` | `page` (default entry point, usually overridden) |
//! | `theme.css` | `theme` |
//!
//! Files of other kinds are ignored. Loading fails if nothing is left, or if any
//! file fails to read or parse: the application cannot serve without a layout.

use std::fs;
use std::path::{Path, PathBuf};

use super::blocks::{Block, BlockSet};
use crate::error::BuildError;
use crate::module::{strip_extension, TemplateKind};

/// Label of the base set in errors and logs.
pub const LAYOUT_SET: &str = "layout";

/// A layout file discovered in the layout directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutFile {
    /// Block name (filename without extension).
    pub name: String,
    pub filename: String,
    pub path: PathBuf,
    pub kind: TemplateKind,
}

/// Lists composable files in `dir`, sorted by filename.
pub fn walk_layout_dir(dir: impl AsRef<Path>) -> Result<Vec<LayoutFile>, BuildError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let kind = TemplateKind::of(filename);
        if !kind.is_composable() {
            continue;
        }
        files.push(LayoutFile {
            name: strip_extension(filename).to_string(),
            filename: filename.to_string(),
            path: path.clone(),
            kind,
        });
    }

    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(files)
}

/// Parses the layout directory into the shared base set.
///
/// # Errors
///
/// - [`BuildError::EmptyLayout`] if the directory holds no template files
/// - [`BuildError::Io`] if the directory or a file cannot be read
/// - [`BuildError::Parse`] / [`BuildError::DuplicateBlock`] for bad templates
pub fn load_base_set(dir: impl AsRef<Path>) -> Result<BlockSet, BuildError> {
    let dir = dir.as_ref();
    let files = walk_layout_dir(dir)?;
    if files.is_empty() {
        return Err(BuildError::EmptyLayout {
            dir: dir.to_path_buf(),
        });
    }

    let mut set = BlockSet::new(LAYOUT_SET);
    for file in files {
        let source = fs::read_to_string(&file.path).map_err(|e| BuildError::io(&file.path, e))?;
        set.parse(&file.name, Block::new(source, file.kind, file.filename))?;
    }

    tracing::info!(dir = ?dir, blocks = set.len(), "loaded layout templates");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_skips_other_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("layout.html"), "L").unwrap();
        fs::write(dir.path().join("theme.css"), "body{}").unwrap();
        fs::write(dir.path().join("notes.md"), "ignore me").unwrap();
        fs::create_dir(dir.path().join("sub.html")).unwrap();

        let files = walk_layout_dir(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["layout", "theme"]);
        assert_eq!(files[1].kind, TemplateKind::Style);
    }

    #[test]
    fn test_load_base_set() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("layout.html"), "<html>{% include \"page\" %}</html>").unwrap();
        fs::write(dir.path().join("page.html"), "default").unwrap();

        let set = load_base_set(dir.path()).unwrap();
        assert_eq!(set.label(), LAYOUT_SET);
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["layout", "page"]);
        assert_eq!(set.render("layout", ()).unwrap(), "<html>default</html>");
    }

    #[test]
    fn test_empty_layout_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "nothing to see").unwrap();
        assert!(matches!(
            load_base_set(dir.path()),
            Err(BuildError::EmptyLayout { .. })
        ));
    }

    #[test]
    fn test_missing_layout_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_base_set(dir.path().join("absent")),
            Err(BuildError::Io { .. })
        ));
    }

    #[test]
    fn test_broken_layout_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("layout.html"), "{% for %}").unwrap();
        assert!(matches!(
            load_base_set(dir.path()),
            Err(BuildError::Parse { .. })
        ));
    }
}
