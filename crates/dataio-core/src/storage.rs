// Filesystem helpers shared by the file-backed backends.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{DataError, Result};

pub fn matches_extension(p: &Path, extensions: &[&str]) -> bool {
    p.extension()
        .and_then(|s| s.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        == Some(true)
}

/// Files directly inside `dir` whose extension is one of `extensions`, sorted.
pub fn find_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            DataError::io(path, e.into())
        })?;
        let p = entry.path();
        if entry.file_type().is_file() && matches_extension(p, extensions) {
            out.push(p.to_path_buf());
        }
    }
    out.sort();
    Ok(out)
}

/// Entry names (file stems) of the loadable files in `dir`.
pub fn list_entry_names(dir: &Path, extensions: &[&str]) -> Result<Vec<String>> {
    let mut names: Vec<String> = find_files(dir, extensions)?
        .iter()
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    names.sort();
    names.dedup();
    Ok(names)
}

/// First existing file among `path.<ext>` for each extension, in order.
/// Entry names may contain dots, so the extension is appended rather than swapped.
pub fn find_with_extensions(path: &Path, extensions: &[&str]) -> Option<PathBuf> {
    extensions.iter().find_map(|ext| {
        let mut candidate = OsString::from(path.as_os_str());
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        candidate.is_file().then_some(candidate)
    })
}

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DataError::io(path, e))
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| DataError::io(path, e))
}
