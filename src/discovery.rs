use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{err_msg, ParceraError};

/// File extensions the reader accepts when walking directories.
pub const CLOJURE_EXTENSIONS: &[&str] = &["clj", "cljs", "cljc", "edn"];

/// Expands the given paths into a sorted list of Clojure source files.
///
/// Files named explicitly are kept whatever their extension; directories are
/// walked recursively and filtered by [`CLOJURE_EXTENSIONS`].
pub fn discover_sources<P: AsRef<Path>>(roots: &[P]) -> Result<Vec<PathBuf>, ParceraError> {
    let mut files = Vec::new();
    for root in roots {
        let root = root.as_ref();
        if root.is_file() {
            files.push(root.to_path_buf());
            continue;
        }
        if !root.exists() {
            return Err(err_msg!(Io, "'{}' does not exist", root.display()));
        }
        for entry in WalkDir::new(root) {
            let entry =
                entry.map_err(|e| err_msg!(Io, "failed to walk '{}': {}", root.display(), e))?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !is_clojure_file(path) {
                continue;
            }

            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files.dedup();
    log::debug!("discovered {} source files", files.len());
    Ok(files)
}

pub fn is_clojure_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CLOJURE_EXTENSIONS.contains(&ext))
}
