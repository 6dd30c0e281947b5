use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Overrides;
use crate::graph::walker::WalkEntry;
use crate::license::classifier::Classifier;
use crate::license::locator::LicenseLocator;
use crate::models::{ClassificationResult, LicenseType, Package, Provenance, Report};

/// Resolves every walked package to a [`ClassificationResult`].
///
/// Packages are resolved concurrently, at most `jobs` at a time. The report
/// keeps the walk order no matter which package finishes first.
pub struct Aggregator {
    overrides: Overrides,
    locator: LicenseLocator,
    classifier: Arc<Classifier>,
    jobs: usize,
    progress: Option<ProgressBar>,
}

impl Aggregator {
    pub fn new(
        overrides: Overrides,
        classifier: Classifier,
        jobs: usize,
    ) -> Result<Self, regex::Error> {
        Ok(Aggregator {
            overrides,
            locator: LicenseLocator::new()?,
            classifier: Arc::new(classifier),
            jobs: jobs.max(1),
            progress: None,
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn run(&self, entries: Vec<WalkEntry>) -> Report {
        self.run_until(entries, None).await
    }

    /// Like [`Aggregator::run`], but stops waiting at `deadline`.
    ///
    /// Results finished before the deadline are kept in walk order; the rest
    /// are dropped and the report is marked partial.
    pub async fn run_until(&self, entries: Vec<WalkEntry>, deadline: Option<Instant>) -> Report {
        let total = entries.len();
        let mut slots: Vec<Option<ClassificationResult>> = vec![None; total];
        let mut partial = false;

        let mut pending = stream::iter(entries.into_iter().enumerate())
            .map(|(index, entry)| async move { (index, self.resolve(entry).await) })
            .buffer_unordered(self.jobs);

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, pending.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        partial = true;
                        break;
                    }
                },
                None => pending.next().await,
            };
            let Some((index, result)) = next else {
                break;
            };
            slots[index] = Some(result);
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        let results: Vec<ClassificationResult> = slots.into_iter().flatten().collect();
        if partial {
            warn!(completed = results.len(), total, "deadline reached, report is partial");
        }
        let report = Report::new(results, partial);
        info!(
            packages = report.results.len(),
            severity = %report.severity,
            directories_scanned = self.locator.scan_count(),
            "aggregation complete"
        );
        report
    }

    async fn resolve(&self, entry: WalkEntry) -> ClassificationResult {
        let import_path = entry.import_path().to_string();

        if let Some(license_type) = self.overrides.get(&import_path) {
            debug!(package = %import_path, %license_type, "license type overridden");
            return ClassificationResult {
                package: import_path,
                license_file: None,
                template: None,
                license_type,
                confidence: 0.0,
                provenance: Provenance::Override,
                error: None,
            };
        }

        match entry {
            WalkEntry::Unresolved { error, .. } => unresolved(import_path, error.to_string()),
            WalkEntry::Resolved(package) => match self.classify(&package).await {
                Ok(result) => result,
                Err(error) => {
                    warn!(package = %import_path, %error, "license resolution failed");
                    unresolved(import_path, error)
                }
            },
        }
    }

    async fn classify(&self, package: &Package) -> Result<ClassificationResult, String> {
        let license_file = self
            .locator
            .find(&package.dir, package.module_root.as_deref())
            .await
            .map_err(|e| format!("locating license file in {}: {e}", package.dir.display()))?;

        let classifier = Arc::clone(&self.classifier);
        let file = license_file.clone();
        let classification = tokio::task::spawn_blocking(move || {
            classifier.identify(file.as_ref().map(|f| f.text.as_str()))
        })
        .await
        .map_err(|e| format!("classifier task failed: {e}"))?;

        debug!(
            package = %package.import_path,
            license_type = %classification.license_type,
            confidence = classification.confidence,
            "classified"
        );

        Ok(ClassificationResult {
            package: package.import_path.clone(),
            license_file: license_file.map(|f| f.path.clone()),
            template: classification.template,
            license_type: classification.license_type,
            confidence: classification.confidence,
            provenance: Provenance::Classified,
            error: None,
        })
    }
}

fn unresolved(package: String, error: String) -> ClassificationResult {
    ClassificationResult {
        package,
        license_file: None,
        template: None,
        license_type: LicenseType::Unknown,
        confidence: 0.0,
        provenance: Provenance::Unresolved,
        error: Some(error),
    }
}
