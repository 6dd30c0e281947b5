use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::CorpusError;
use crate::license::classifier::fingerprint;
use crate::models::{LicenseType, ReferenceTemplate};

/// Name of the index file at the root of a corpus directory.
pub const INDEX_FILE: &str = "index.toml";

#[derive(Debug, Deserialize)]
struct CorpusIndex {
    #[serde(default, rename = "license")]
    licenses: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    name: String,
    #[serde(rename = "type")]
    license_type: String,
    /// Text file, relative to the corpus directory.
    file: PathBuf,
}

/// Read-only set of reference templates, sorted by canonical name.
#[derive(Debug, Clone)]
pub struct Corpus {
    templates: Vec<ReferenceTemplate>,
}

impl Corpus {
    /// Load `<dir>/index.toml` and every text file it lists.
    pub fn load(dir: &Path) -> Result<Corpus, CorpusError> {
        let index_path = dir.join(INDEX_FILE);
        let content = read(&index_path)?;
        let index: CorpusIndex = toml::from_str(&content).map_err(|source| CorpusError::Parse {
            path: index_path.clone(),
            source,
        })?;

        if index.licenses.is_empty() {
            return Err(CorpusError::Empty(dir.to_path_buf()));
        }

        let mut entries = Vec::with_capacity(index.licenses.len());
        for entry in index.licenses {
            let license_type =
                entry
                    .license_type
                    .parse::<LicenseType>()
                    .map_err(|_| CorpusError::InvalidType {
                        name: entry.name.clone(),
                        value: entry.license_type.clone(),
                        allowed: LicenseType::assignable_list(),
                    })?;
            let text = read(&dir.join(&entry.file))?;
            entries.push((entry.name, license_type, text));
        }

        let corpus = Corpus::from_entries(entries)?;
        info!(dir = %dir.display(), templates = corpus.len(), "loaded license corpus");
        Ok(corpus)
    }

    /// Build a corpus from `(name, type, text)` triples.
    pub fn from_entries(
        entries: Vec<(String, LicenseType, String)>,
    ) -> Result<Corpus, CorpusError> {
        let mut seen = HashSet::new();
        let mut templates = Vec::with_capacity(entries.len());
        for (name, license_type, text) in entries {
            if !seen.insert(name.clone()) {
                return Err(CorpusError::Duplicate(name));
            }
            templates.push(ReferenceTemplate {
                fingerprint: fingerprint(&text),
                name,
                license_type,
            });
        }
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Corpus { templates })
    }

    pub fn templates(&self) -> &[ReferenceTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }
}

fn read(path: &Path) -> Result<String, CorpusError> {
    std::fs::read_to_string(path).map_err(|source| CorpusError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_corpus(dir: &Path, index: &str, files: &[(&str, &str)]) {
        std::fs::write(dir.join(INDEX_FILE), index).unwrap();
        for (name, text) in files {
            std::fs::write(dir.join(name), text).unwrap();
        }
    }

    #[test]
    fn test_load_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(
            dir.path(),
            r#"
[[license]]
name = "MIT"
type = "Notice"
file = "MIT.txt"

[[license]]
name = "Apache-2.0"
type = "Notice"
file = "Apache-2.0.txt"
"#,
            &[("MIT.txt", "permission is hereby granted"), ("Apache-2.0.txt", "apache license")],
        );

        let corpus = Corpus::load(dir.path()).unwrap();
        let names: Vec<&str> = corpus.templates().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Apache-2.0", "MIT"]);
        assert_eq!(
            corpus.templates()[1].fingerprint,
            fingerprint("permission is hereby granted")
        );
        assert_eq!(corpus.templates()[1].fingerprint.total, 3);
    }

    #[test]
    fn test_invalid_type() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(
            dir.path(),
            "[[license]]\nname = \"X\"\ntype = \"Unknown\"\nfile = \"X.txt\"\n",
            &[("X.txt", "x")],
        );
        assert!(matches!(
            Corpus::load(dir.path()),
            Err(CorpusError::InvalidType { name, .. }) if name == "X"
        ));
    }

    #[test]
    fn test_missing_text_file() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(
            dir.path(),
            "[[license]]\nname = \"X\"\ntype = \"Notice\"\nfile = \"missing.txt\"\n",
            &[],
        );
        assert!(matches!(Corpus::load(dir.path()), Err(CorpusError::Read { .. })));
    }

    #[test]
    fn test_empty_and_absent_corpus() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(Corpus::load(dir.path()), Err(CorpusError::Read { .. })));

        write_corpus(dir.path(), "", &[]);
        assert!(matches!(Corpus::load(dir.path()), Err(CorpusError::Empty(_))));
    }

    #[test]
    fn test_duplicate_names() {
        let err = Corpus::from_entries(vec![
            ("MIT".to_string(), LicenseType::Notice, "a b".to_string()),
            ("MIT".to_string(), LicenseType::Notice, "c d".to_string()),
        ])
        .unwrap_err();
        assert!(matches!(err, CorpusError::Duplicate(name) if name == "MIT"));
    }
}
