use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use regex::Regex;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::models::LicenseFile;

/// File names treated as license files, case-insensitively:
/// `LICENSE`, `LICENCE`, `UNLICENSE` or `COPYING`, optionally tagged with a
/// license name (`-MIT`, `.LESSER`, `.APACHE2`) and optionally carrying a
/// documentation extension (`.txt`, `.md`, `.markdown`, `.rst`).
/// Source files such as `license.go` never match.
const LICENSE_FILE_PATTERN: &str = concat!(
    r"(?i)^(?:(?:un)?licen[sc]e|copying)",
    r"(?:[-_.](?:mit|apache|apache2|apache-2\.0|bsd|isc|mpl|gpl|lgpl|lesser|library|docs|code))?",
    r"(?:\.(?:txt|md|markdown|rst))?$",
);

/// Outcome of listing one directory. Failures are kept so a directory that
/// cannot be read is not listed again.
type ScanResult = Result<Option<Arc<LicenseFile>>, Arc<io::Error>>;
type ScanCell = Arc<OnceCell<ScanResult>>;

/// Finds the license file nearest to a package directory.
///
/// Each directory is listed at most once per locator, however many packages
/// share it as an ancestor and however many tasks ask concurrently.
pub struct LicenseLocator {
    pattern: Regex,
    scans: Mutex<HashMap<PathBuf, ScanCell>>,
    scan_count: AtomicUsize,
}

impl LicenseLocator {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(LicenseLocator {
            pattern: Regex::new(LICENSE_FILE_PATTERN)?,
            scans: Mutex::new(HashMap::new()),
            scan_count: AtomicUsize::new(0),
        })
    }

    pub fn is_license_file_name(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// Search `dir` and then its ancestors for a license file.
    ///
    /// The search stops after `boundary` when `dir` lies inside it, otherwise
    /// at the file-system root. `Ok(None)` means no license file was found.
    pub async fn find(
        &self,
        dir: &Path,
        boundary: Option<&Path>,
    ) -> io::Result<Option<Arc<LicenseFile>>> {
        let boundary = boundary.filter(|b| dir.starts_with(b));
        let mut current = Some(dir);

        while let Some(candidate) = current {
            if let Some(found) = self.scan(candidate).await? {
                debug!(
                    dir = %dir.display(),
                    found_in = %found.dir.display(),
                    license = %found.path.display(),
                    "license file located"
                );
                return Ok(Some(found));
            }
            if Some(candidate) == boundary {
                break;
            }
            current = candidate.parent();
        }

        debug!(dir = %dir.display(), "no license file found");
        Ok(None)
    }

    /// Number of directories listed so far.
    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::Relaxed)
    }

    /// License file directly inside `dir`, memoized per directory.
    async fn scan(&self, dir: &Path) -> io::Result<Option<Arc<LicenseFile>>> {
        let cell = {
            let mut scans = self
                .scans
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "license cache poisoned"))?;
            scans.entry(dir.to_path_buf()).or_default().clone()
        };

        let scanned = cell
            .get_or_init(|| async {
                self.scan_count.fetch_add(1, Ordering::Relaxed);
                trace!(dir = %dir.display(), "scanning directory");
                self.scan_uncached(dir).await.map_err(Arc::new)
            })
            .await;
        match scanned {
            Ok(found) => Ok(found.clone()),
            Err(error) => Err(io::Error::new(error.kind(), error.to_string())),
        }
    }

    async fn scan_uncached(&self, dir: &Path) -> io::Result<Option<Arc<LicenseFile>>> {
        let mut names = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.is_license_file_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let Some(name) = names.into_iter().next() else {
            return Ok(None);
        };
        let path = dir.join(name);
        let bytes = tokio::fs::read(&path).await?;
        Ok(Some(Arc::new(LicenseFile {
            path,
            dir: dir.to_path_buf(),
            text: String::from_utf8_lossy(&bytes).into_owned(),
        })))
    }
}
