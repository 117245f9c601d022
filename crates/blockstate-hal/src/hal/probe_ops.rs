//! Read-only device probing operations.

use std::path::Path;

/// Probing operations trait.
///
/// Every method is best-effort: a stat or lookup failure answers `false`
/// instead of surfacing an error, since callers only branch on the answer.
pub trait ProbeOps {
    /// Whether anything exists at `path`.
    fn path_exists(&self, path: &Path) -> bool;

    /// Whether `path` is a block special file.
    fn is_block_device(&self, path: &Path) -> bool;

    /// Whether `name` resolves to an executable on `PATH`.
    fn find_executable(&self, name: &str) -> bool;
}
