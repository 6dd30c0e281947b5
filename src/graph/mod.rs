//! Import graph loading and traversal.
//!
//! - [`GraphLoader`] — the seam to whatever toolchain knows the import graph.
//! - [`go_list`] — a loader backed by `go list -e -json -deps`.
//! - [`walker`] — deduplicating traversal from one or more roots.

use std::path::PathBuf;

use crate::error::LoadError;

pub mod go_list;
pub mod walker;

/// What a [`GraphLoader`] knows about one package.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedPackage {
    pub import_path: String,
    pub dir: PathBuf,
    pub module_root: Option<PathBuf>,
    /// Part of the platform standard library; never scanned.
    pub standard: bool,
    /// Direct imports, as the loader resolved them (possibly vendored paths).
    pub imports: Vec<String>,
}

pub trait GraphLoader {
    fn load(&self, import_path: &str) -> Result<LoadedPackage, LoadError>;
}

/// Remove everything up to and including the first `/vendor/` segment.
///
/// Only one level is stripped: `a/vendor/b/vendor/c` becomes `b/vendor/c`.
pub fn unvendor(import_path: &str) -> &str {
    match import_path.split_once("/vendor/") {
        Some((_, vendoree)) => vendoree,
        None => import_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unvendor() {
        assert_eq!(unvendor("github.com/x/vendor/github.com/y/z"), "github.com/y/z");
        assert_eq!(unvendor("github.com/x"), "github.com/x");
    }

    #[test]
    fn test_unvendor_strips_first_segment_only() {
        assert_eq!(unvendor("a/vendor/b/vendor/c"), "b/vendor/c");
    }

    #[test]
    fn test_unvendor_requires_whole_segment() {
        assert_eq!(unvendor("github.com/vendorx/y"), "github.com/vendorx/y");
        assert_eq!(unvendor("vendor/github.com/y"), "vendor/github.com/y");
    }
}
