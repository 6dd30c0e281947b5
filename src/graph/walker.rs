use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{GraphError, LoadError};
use crate::graph::{unvendor, GraphLoader};
use crate::models::Package;

/// A package reached by the walk.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkEntry {
    Resolved(Package),
    /// A transitive import the loader could not provide.
    Unresolved { import_path: String, error: LoadError },
}

impl WalkEntry {
    pub fn import_path(&self) -> &str {
        match self {
            WalkEntry::Resolved(pkg) => &pkg.import_path,
            WalkEntry::Unresolved { import_path, .. } => import_path,
        }
    }
}

/// Enumerate every non-standard package reachable from `roots`.
///
/// Traversal is depth-first, pre-order, visiting children in lexicographic
/// order, so the output order is a pure function of the graph. Each path is
/// unvendored before it is checked against the visited set; the first copy
/// reached wins. Standard library packages are neither reported nor descended
/// into.
///
/// Every root must load, otherwise the whole walk fails. Transitive load
/// failures become [`WalkEntry::Unresolved`] and the walk continues.
pub fn walk<L: GraphLoader + ?Sized>(
    loader: &L,
    roots: &[String],
) -> Result<Vec<WalkEntry>, GraphError> {
    let mut root_paths: Vec<&str> = roots.iter().map(String::as_str).collect();
    root_paths.sort_unstable();
    root_paths.dedup();

    for root in &root_paths {
        loader
            .load(root)
            .map_err(|source| GraphError::RootUnresolved {
                path: root.to_string(),
                source,
            })?;
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();
    // Reversed so the smallest path is popped first.
    let mut frontier: Vec<String> = root_paths.iter().rev().map(|r| r.to_string()).collect();

    while let Some(raw) = frontier.pop() {
        let normalized = unvendor(&raw).to_string();
        if !visited.insert(normalized.clone()) {
            continue;
        }

        match loader.load(&raw) {
            Ok(loaded) if loaded.standard => {
                debug!(package = %normalized, "skipping standard library package");
            }
            Ok(loaded) => {
                let mut children: Vec<&String> = loaded
                    .imports
                    .iter()
                    .filter(|child| !visited.contains(unvendor(child)))
                    .collect();
                children.sort_unstable();
                children.dedup();
                frontier.extend(children.into_iter().rev().cloned());

                entries.push(WalkEntry::Resolved(Package {
                    import_path: normalized,
                    dir: loaded.dir,
                    module_root: loaded.module_root,
                }));
            }
            Err(error) => {
                warn!(package = %normalized, %error, "failed to load package");
                entries.push(WalkEntry::Unresolved {
                    import_path: normalized,
                    error,
                });
            }
        }
    }

    info!(
        roots = root_paths.len(),
        packages = entries.len(),
        "dependency walk complete"
    );
    Ok(entries)
}
