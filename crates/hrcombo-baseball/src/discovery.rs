// Day-file discovery under the data root.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::extract::date_from_filename;

/// Files whose name contains this marker are quarantined scraper output.
const QUARANTINE_MARKER: &str = "BAD";

/// Every `.json` day file below `root`, recursively. Files are ordered by
/// the date in their name; files without one come first, by path.
pub fn find_day_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_dir(root, &mut files);
    files.sort_by(|a, b| {
        date_from_filename(a)
            .cmp(&date_from_filename(b))
            .then_with(|| a.cmp(b))
    });
    debug!("found {} day files under {}", files.len(), root.display());
    files
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_dir(&path, files);
        } else if is_day_file(&path) {
            files.push(path);
        }
    }
}

fn is_day_file(path: &Path) -> bool {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let quarantined = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(QUARANTINE_MARKER));
    is_json && !quarantined && path.is_file()
}

/// The last `n` files of an already ordered list.
pub fn recent(files: Vec<PathBuf>, n: usize) -> Vec<PathBuf> {
    let skip = files.len().saturating_sub(n);
    files.into_iter().skip(skip).collect()
}
