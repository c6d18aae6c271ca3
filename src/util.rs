//! Shared utility functions
//!
//! Source discovery used by the CLI and integration tests.

use crate::error::Result;
use crate::parse::SourceFile;
use std::path::{Path, PathBuf};

/// Build output directories that never hold user code
const SKIPPED_DIRS: &[&str] = &["bin", "obj", ".git", ".vs"];

pub fn is_csharp_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "cs")
}

/// Collect `.cs` files from files and directories, recursively, sorted by path
///
/// # Examples
/// ```
/// use seedwork::util::collect_source_paths;
/// assert!(collect_source_paths(&[]).unwrap().is_empty());
/// ```
pub fn collect_source_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut found)?;
        } else {
            found.push(path.clone());
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let skipped = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIPPED_DIRS.contains(&n));
            if !skipped {
                walk(&path, found)?;
            }
        } else if is_csharp_file(&path) {
            found.push(path);
        }
    }
    Ok(())
}

/// Read every collected file into a [`SourceFile`], paths normalized to `/`
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    collect_source_paths(paths)?
        .into_iter()
        .map(|path| {
            let text = std::fs::read_to_string(&path)?;
            Ok(SourceFile::new(normalize(&path), text))
        })
        .collect()
}

/// Display form of a path with forward slashes
pub fn normalize(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}
