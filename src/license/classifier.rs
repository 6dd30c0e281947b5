use std::collections::BTreeMap;

use tracing::debug;

use crate::license::corpus::Corpus;
use crate::models::{Fingerprint, LicenseType};

/// Outcome of matching one license text against the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Accepted template; `None` when the best score is under the threshold.
    pub template: Option<String>,
    pub license_type: LicenseType,
    pub confidence: f64,
}

impl Classification {
    fn unknown(confidence: f64) -> Self {
        Classification {
            template: None,
            license_type: LicenseType::Unknown,
            confidence,
        }
    }
}

/// Scores license texts against a reference corpus.
pub struct Classifier {
    corpus: Corpus,
    threshold: f64,
}

impl Classifier {
    /// `threshold` must already be validated to lie in `[0, 1]`.
    pub fn new(corpus: Corpus, threshold: f64) -> Self {
        Classifier { corpus, threshold }
    }

    /// Identify `text`. A missing text is `Unknown` with score 0 and skips the corpus.
    ///
    /// The best-scoring template wins; ties go to the lexicographically
    /// smallest name. A score equal to the threshold is accepted.
    pub fn identify(&self, text: Option<&str>) -> Classification {
        let Some(text) = text else {
            return Classification::unknown(0.0);
        };

        let candidate = fingerprint(text);
        let mut best: Option<(&str, LicenseType, f64)> = None;
        // Templates are sorted by name, so a strict `>` keeps the smallest name on ties.
        for template in self.corpus.templates() {
            let score = similarity(&candidate, &template.fingerprint);
            if best.map_or(true, |(_, _, s)| score > s) {
                best = Some((&template.name, template.license_type, score));
            }
        }

        match best {
            Some((name, license_type, score)) if score >= self.threshold => Classification {
                template: Some(name.to_string()),
                license_type,
                confidence: score,
            },
            Some((name, _, score)) => {
                debug!(
                    closest = name,
                    score,
                    threshold = self.threshold,
                    "no template above threshold"
                );
                Classification::unknown(score)
            }
            None => Classification::unknown(0.0),
        }
    }
}

/// Lowercased alphanumeric words of `text`, ignoring copyright notice lines.
pub fn normalize(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !is_copyright_line(line))
        .flat_map(|line| {
            line.split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn is_copyright_line(line: &str) -> bool {
    line.split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .is_some_and(|w| w.eq_ignore_ascii_case("copyright"))
}

/// Word bigram multiset of `text`; unigrams when it has fewer than two words.
pub fn fingerprint(text: &str) -> Fingerprint {
    let words = normalize(text);
    let mut grams: BTreeMap<String, usize> = BTreeMap::new();
    if words.len() < 2 {
        for w in words {
            *grams.entry(w).or_insert(0) += 1;
        }
    } else {
        for pair in words.windows(2) {
            *grams.entry(format!("{} {}", pair[0], pair[1])).or_insert(0) += 1;
        }
    }
    let total = grams.values().sum();
    Fingerprint { grams, total }
}

/// Sørensen–Dice coefficient of two multisets, in `[0, 1]`.
pub fn similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
    if a.total == 0 || b.total == 0 {
        return 0.0;
    }
    let (small, large) = if a.grams.len() <= b.grams.len() { (a, b) } else { (b, a) };
    let shared: usize = small
        .grams
        .iter()
        .filter_map(|(gram, n)| large.grams.get(gram).map(|m| (*n).min(*m)))
        .sum();
    let score = (2 * shared) as f64 / (a.total + b.total) as f64;
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::corpus::Corpus;

    /// 21 distinct words → 20 bigrams.
    const GPL_TEXT: &str = "alpha bravo charlie delta echo foxtrot golf hotel india juliet \
        kilo lima mike november oscar papa quebec romeo sierra tango uniform";
    /// Same words with the last one replaced: 19 of 20 bigrams shared → 0.95.
    const NEAR_GPL_TEXT: &str = "Alpha, bravo; charlie delta echo foxtrot golf hotel \
        india juliet\nkilo lima mike november oscar papa quebec romeo sierra tango victor";

    fn corpus() -> Corpus {
        Corpus::from_entries(vec![
            (
                "MIT".to_string(),
                LicenseType::Permissive,
                "permission is hereby granted free of charge to any person".to_string(),
            ),
            ("GPL-3.0".to_string(), LicenseType::Restricted, GPL_TEXT.to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn test_normalize() {
        let words = normalize("Copyright (c) 2024 Someone\nThe  MIT-License,\tfoo.");
        assert_eq!(words, vec!["the", "mit", "license", "foo"]);
    }

    #[test]
    fn test_similarity_bounds() {
        let a = fingerprint(GPL_TEXT);
        assert_eq!(similarity(&a, &a), 1.0);
        assert_eq!(similarity(&a, &fingerprint("")), 0.0);
        assert_eq!(similarity(&a, &fingerprint("zulu yankee xray")), 0.0);
    }

    #[test]
    fn test_near_match_score() {
        let score = similarity(&fingerprint(NEAR_GPL_TEXT), &fingerprint(GPL_TEXT));
        assert_eq!(score, 0.95);
    }

    #[test]
    fn test_classify_above_threshold() {
        let classifier = Classifier::new(corpus(), 0.9);
        assert_eq!(
            classifier.identify(Some(NEAR_GPL_TEXT)),
            Classification {
                template: Some("GPL-3.0".to_string()),
                license_type: LicenseType::Restricted,
                confidence: 0.95,
            }
        );
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let at = Classifier::new(corpus(), 0.95).identify(Some(NEAR_GPL_TEXT));
        assert_eq!(at.license_type, LicenseType::Restricted);

        let above = Classifier::new(corpus(), 0.9500001).identify(Some(NEAR_GPL_TEXT));
        assert_eq!(above.license_type, LicenseType::Unknown);
        assert_eq!(above.template, None);
        assert_eq!(above.confidence, 0.95);
    }

    #[test]
    fn test_no_text_is_unknown_zero() {
        let classification = Classifier::new(corpus(), 0.9).identify(None);
        assert_eq!(classification, Classification::unknown(0.0));
    }

    #[test]
    fn test_tie_breaks_on_smallest_name() {
        let corpus = Corpus::from_entries(vec![
            ("Zed".to_string(), LicenseType::Forbidden, GPL_TEXT.to_string()),
            ("Alpha".to_string(), LicenseType::Notice, GPL_TEXT.to_string()),
        ])
        .unwrap();
        let classification = Classifier::new(corpus, 0.9).identify(Some(GPL_TEXT));
        assert_eq!(classification.template.as_deref(), Some("Alpha"));
        assert_eq!(classification.license_type, LicenseType::Notice);
    }
}
