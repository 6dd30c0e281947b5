use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{GraphError, LoadError};
use crate::graph::{GraphLoader, LoadedPackage};

/// One object of the `go list -json` stream. Only the fields we use.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    import_path: String,
    #[serde(default)]
    dir: PathBuf,
    #[serde(default)]
    standard: bool,
    /// Set by `-deps` for packages that were not named on the command line.
    #[serde(default)]
    dep_only: bool,
    #[serde(default)]
    imports: Vec<String>,
    module: Option<GoModule>,
    error: Option<GoPackageError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoModule {
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoPackageError {
    err: String,
}

/// Import graph taken from `go list -e -json -deps`.
#[derive(Debug, Default)]
pub struct GoListLoader {
    packages: HashMap<String, GoListPackage>,
    roots: Vec<String>,
}

impl GoListLoader {
    /// Run `go list` in `dir` for the given package patterns.
    pub fn run(dir: &Path, patterns: &[String]) -> Result<Self, GraphError> {
        info!(dir = %dir.display(), ?patterns, "running go list");
        let output = Command::new("go")
            .args(["list", "-e", "-json", "-deps", "--"])
            .args(patterns)
            .current_dir(dir)
            .output()
            .map_err(GraphError::Spawn)?;

        if !output.status.success() {
            return Err(GraphError::Command {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::from_listing(&String::from_utf8_lossy(&output.stdout))
    }

    /// Load a listing previously captured with `go list -e -json -deps`.
    pub fn read(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path).map_err(|source| GraphError::ReadListing {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_listing(&content)
    }

    /// Parse a stream of concatenated JSON package objects.
    pub fn from_listing(listing: &str) -> Result<Self, GraphError> {
        let mut loader = GoListLoader::default();
        for package in serde_json::Deserializer::from_str(listing).into_iter::<GoListPackage>() {
            let package = package?;
            if !package.dep_only {
                loader.roots.push(package.import_path.clone());
            }
            loader.packages.insert(package.import_path.clone(), package);
        }
        debug!(
            packages = loader.packages.len(),
            roots = loader.roots.len(),
            "parsed go list output"
        );
        Ok(loader)
    }

    /// Packages named on the `go list` command line (after pattern expansion).
    pub fn roots(&self) -> &[String] {
        &self.roots
    }
}

impl GraphLoader for GoListLoader {
    fn load(&self, import_path: &str) -> Result<LoadedPackage, LoadError> {
        let package = self.packages.get(import_path).ok_or(LoadError::NotFound)?;
        if let Some(error) = &package.error {
            return Err(LoadError::Failed(error.err.clone()));
        }
        Ok(LoadedPackage {
            import_path: package.import_path.clone(),
            dir: package.dir.clone(),
            module_root: package.module.as_ref().and_then(|m| m.dir.clone()),
            standard: package.standard,
            imports: package.imports.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
{
	"Dir": "/usr/local/go/src/fmt",
	"ImportPath": "fmt",
	"Standard": true,
	"DepOnly": true
}
{
	"Dir": "/work/app/vendor/github.com/y/z",
	"ImportPath": "example.com/app/vendor/github.com/y/z",
	"Module": {"Path": "github.com/y/z", "Dir": "/work/app/vendor/github.com/y/z"},
	"DepOnly": true
}
{
	"ImportPath": "github.com/broken",
	"DepOnly": true,
	"Error": {"ImportStack": [], "Pos": "", "Err": "cannot find module providing package github.com/broken"}
}
{
	"Dir": "/work/app",
	"ImportPath": "example.com/app",
	"Module": {"Path": "example.com/app", "Dir": "/work/app", "Main": true},
	"Imports": ["example.com/app/vendor/github.com/y/z", "fmt", "github.com/broken"]
}
"#;

    #[test]
    fn test_parse_listing() {
        let loader = GoListLoader::from_listing(LISTING).unwrap();
        assert_eq!(loader.roots(), ["example.com/app".to_string()]);

        let app = loader.load("example.com/app").unwrap();
        assert_eq!(app.dir, PathBuf::from("/work/app"));
        assert_eq!(app.module_root, Some(PathBuf::from("/work/app")));
        assert_eq!(app.imports.len(), 3);
        assert!(!app.standard);

        assert!(loader.load("fmt").unwrap().standard);
    }

    #[test]
    fn test_package_errors() {
        let loader = GoListLoader::from_listing(LISTING).unwrap();
        assert_eq!(
            loader.load("github.com/broken"),
            Err(LoadError::Failed(
                "cannot find module providing package github.com/broken".to_string()
            ))
        );
        assert_eq!(loader.load("github.com/absent"), Err(LoadError::NotFound));
    }

    #[test]
    fn test_walk_over_listing() {
        let loader = GoListLoader::from_listing(LISTING).unwrap();
        let entries = crate::graph::walker::walk(&loader, loader.roots()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.import_path()).collect();
        assert_eq!(paths, vec!["example.com/app", "github.com/y/z", "github.com/broken"]);
    }

    #[test]
    fn test_read_listing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deps.json");
        std::fs::write(&path, LISTING).unwrap();
        assert_eq!(GoListLoader::read(&path).unwrap().roots().len(), 1);
    }

    #[test]
    fn test_malformed_listing() {
        assert!(matches!(
            GoListLoader::from_listing("{\"ImportPath\": "),
            Err(GraphError::Listing(_))
        ));
    }
}
