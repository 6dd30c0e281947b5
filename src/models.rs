use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity class of a license.
///
/// The order is total and explicit (see [`LicenseType::rank`]):
/// `Forbidden > Restricted > Reciprocal > Notice > Permissive > Unencumbered > Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LicenseType {
    Forbidden,
    Restricted,
    Reciprocal,
    Notice,
    Permissive,
    Unencumbered,
    Unknown,
}

impl LicenseType {
    /// Types a user may assign through an override or a corpus entry.
    /// `Unknown` is only ever produced by classification.
    pub const ASSIGNABLE: [LicenseType; 6] = [
        LicenseType::Restricted,
        LicenseType::Reciprocal,
        LicenseType::Notice,
        LicenseType::Permissive,
        LicenseType::Unencumbered,
        LicenseType::Forbidden,
    ];

    /// Position in the severity order; higher is more restrictive.
    pub fn rank(self) -> u8 {
        match self {
            LicenseType::Unknown => 0,
            LicenseType::Unencumbered => 1,
            LicenseType::Permissive => 2,
            LicenseType::Notice => 3,
            LicenseType::Reciprocal => 4,
            LicenseType::Restricted => 5,
            LicenseType::Forbidden => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LicenseType::Forbidden => "Forbidden",
            LicenseType::Restricted => "Restricted",
            LicenseType::Reciprocal => "Reciprocal",
            LicenseType::Notice => "Notice",
            LicenseType::Permissive => "Permissive",
            LicenseType::Unencumbered => "Unencumbered",
            LicenseType::Unknown => "Unknown",
        }
    }

    /// Human-readable list of [`LicenseType::ASSIGNABLE`], used in error messages.
    pub fn assignable_list() -> String {
        let names: Vec<String> = Self::ASSIGNABLE
            .iter()
            .map(|t| format!("{:?}", t.as_str()))
            .collect();
        format!("[{}]", names.join(", "))
    }
}

impl Ord for LicenseType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for LicenseType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for LicenseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one of the assignable type names. `"Unknown"` is rejected.
impl FromStr for LicenseType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Restricted" => Ok(LicenseType::Restricted),
            "Reciprocal" => Ok(LicenseType::Reciprocal),
            "Notice" => Ok(LicenseType::Notice),
            "Permissive" => Ok(LicenseType::Permissive),
            "Unencumbered" => Ok(LicenseType::Unencumbered),
            "Forbidden" => Ok(LicenseType::Forbidden),
            _ => Err(()),
        }
    }
}

/// A third-party package discovered by the walk, keyed by its normalized import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub import_path: String,
    pub dir: PathBuf,
    /// Root of the module that contains `dir`; the license search stops here.
    pub module_root: Option<PathBuf>,
}

/// A license file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseFile {
    pub path: PathBuf,
    /// Directory the file was found in.
    pub dir: PathBuf,
    pub text: String,
}

/// One entry of the reference corpus.
#[derive(Debug, Clone)]
pub struct ReferenceTemplate {
    pub name: String,
    pub license_type: LicenseType,
    /// Normalized bigram counts of the reference text, computed once at load.
    pub fingerprint: Fingerprint,
}

/// Multiset of normalized word n-grams, plus its total size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fingerprint {
    pub grams: BTreeMap<String, usize>,
    pub total: usize,
}

/// How a result's license type was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Override,
    Classified,
    Unresolved,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Override => write!(f, "override"),
            Provenance::Classified => write!(f, "classified"),
            Provenance::Unresolved => write!(f, "unresolved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub package: String,
    pub license_file: Option<PathBuf>,
    /// Canonical name of the accepted corpus template.
    pub template: Option<String>,
    pub license_type: LicenseType,
    /// In `[0, 1]`. Always `0` for overrides, which never consult the classifier.
    pub confidence: f64,
    pub provenance: Provenance,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub results: Vec<ClassificationResult>,
    /// Most restrictive type across `results`; `Unknown` when empty.
    pub severity: LicenseType,
    /// Set when an overall deadline cut the run short.
    pub partial: bool,
}

impl Report {
    pub fn new(results: Vec<ClassificationResult>, partial: bool) -> Self {
        let severity = results
            .iter()
            .map(|r| r.license_type)
            .max()
            .unwrap_or(LicenseType::Unknown);
        Report {
            results,
            severity,
            partial,
        }
    }

    /// Results whose type is in `types`.
    pub fn matching<'a>(
        &'a self,
        types: &'a [LicenseType],
    ) -> impl Iterator<Item = &'a ClassificationResult> + 'a {
        self.results
            .iter()
            .filter(move |r| types.contains(&r.license_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(package: &str, license_type: LicenseType) -> ClassificationResult {
        ClassificationResult {
            package: package.to_string(),
            license_file: None,
            template: None,
            license_type,
            confidence: 0.0,
            provenance: Provenance::Classified,
            error: None,
        }
    }

    #[test]
    fn test_severity_order() {
        use LicenseType::*;
        let ordered = [
            Unknown,
            Unencumbered,
            Permissive,
            Notice,
            Reciprocal,
            Restricted,
            Forbidden,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1], "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_parse_assignable_names() {
        for t in LicenseType::ASSIGNABLE {
            assert_eq!(t.as_str().parse::<LicenseType>(), Ok(t));
        }
        assert!("Unknown".parse::<LicenseType>().is_err());
        assert!("notice".parse::<LicenseType>().is_err());
    }

    #[test]
    fn test_report_severity_is_worst() {
        let report = Report::new(
            vec![
                result("a", LicenseType::Notice),
                result("b", LicenseType::Restricted),
                result("c", LicenseType::Restricted),
                result("d", LicenseType::Unknown),
            ],
            false,
        );
        assert_eq!(report.severity, LicenseType::Restricted);
        assert_eq!(report.matching(&[LicenseType::Restricted]).count(), 2);
    }

    #[test]
    fn test_empty_report_is_unknown() {
        assert_eq!(Report::new(Vec::new(), false).severity, LicenseType::Unknown);
    }
}
