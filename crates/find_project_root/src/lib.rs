// crates/find_project_root/src/lib.rs

use std::path::{Path, PathBuf};

use filesystem::Filesystem;

/// Starting from `start`, traverse upward until a directory containing
/// `marker` as a plain file is found, and return that directory. When no
/// ancestor carries the marker, returns `start` unchanged: an unmarked tree
/// is analyzed from wherever the tool was invoked.
///
/// One `is_file` probe per level, no symlink resolution. The filesystem
/// root itself is never probed.
pub fn find_project_root(filesystem: &dyn Filesystem, start: &Path, marker: &str) -> PathBuf {
    let mut current = start.to_path_buf();
    while let Some(parent) = current.parent() {
        if filesystem.is_file(&current.join(marker)) {
            return current;
        }
        current = parent.to_path_buf();
    }
    start.to_path_buf()
}
