//! Namespace suggestions for flat keys.
//!
//! A flat key whose usages concentrate in one location category is proposed
//! to move under that category's namespace:
//!
//! ```text
//! hello: 3 usages in routes/home, 1 in routes/about
//!   → confidence 3/4 = 0.75 ≥ 0.6 → hello → home.hello
//! ```
//!
//! Confidence is measured against all of the key's usages, including usages in
//! files the classifier has nothing to say about.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::core::{
    classify::Classifier,
    index::UsageIndex,
    key_path::{KEY_SEPARATOR, is_namespaced},
    usage::UsageSite,
};

/// Lowest confidence at which a suggestion is emitted.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// A proposed key migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub original_key: String,
    pub suggested_key: String,
    pub namespace: String,
    /// Files whose classification equals `namespace`, sorted.
    pub affected_files: Vec<String>,
    /// Share of the key's usages inside `namespace`, in `[0, 1]`.
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    threshold: f64,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl SuggestionEngine {
    /// Thresholds below [`DEFAULT_CONFIDENCE_THRESHOLD`] are raised to it.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(DEFAULT_CONFIDENCE_THRESHOLD, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Suggestions for every flat key in `index`, highest confidence first,
    /// ties ordered by namespace and then key.
    pub fn suggest<C>(&self, index: &UsageIndex, classifier: &C) -> Vec<Suggestion>
    where
        C: Classifier + ?Sized,
    {
        let mut cache: HashMap<String, Option<String>> = HashMap::new();
        let mut suggestions: Vec<Suggestion> = index
            .iter()
            .filter_map(|(key, sites)| self.suggest_key(key, sites, classifier, &mut cache))
            .collect();

        suggestions.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.namespace.cmp(&b.namespace))
                .then_with(|| a.original_key.cmp(&b.original_key))
        });
        suggestions
    }

    fn suggest_key<C>(
        &self,
        key: &str,
        sites: &[UsageSite],
        classifier: &C,
        cache: &mut HashMap<String, Option<String>>,
    ) -> Option<Suggestion>
    where
        C: Classifier + ?Sized,
    {
        if is_namespaced(key) || sites.is_empty() {
            return None;
        }

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut files: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for site in sites {
            let class = cache
                .entry(site.file_path.clone())
                .or_insert_with(|| {
                    classifier
                        .classify(&site.file_path)
                        .filter(|namespace| !namespace.is_empty())
                })
                .clone();
            let Some(namespace) = class else {
                continue;
            };
            *counts.entry(namespace.clone()).or_default() += 1;
            files
                .entry(namespace)
                .or_default()
                .insert(site.file_path.clone());
        }

        // Ascending iteration keeps the smallest name on ties
        let mut best: Option<(&String, usize)> = None;
        for (namespace, &count) in &counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((namespace, count));
            }
        }
        let (namespace, count) = best?;

        let total = sites.len();
        let confidence = count as f64 / total as f64;
        if confidence < self.threshold {
            return None;
        }

        let affected_files: Vec<String> = files
            .get(namespace)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        let reason = format!(
            "{} of {} usages ({:.0}%) are in {} {} under '{}'",
            count,
            total,
            confidence * 100.0,
            affected_files.len(),
            if affected_files.len() == 1 {
                "file"
            } else {
                "files"
            },
            namespace
        );

        Some(Suggestion {
            original_key: key.to_string(),
            suggested_key: format!("{}{}{}", namespace, KEY_SEPARATOR, key),
            namespace: namespace.clone(),
            affected_files,
            confidence,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::core::suggest::*;
    use crate::core::{PatternScanner, SourceFile};
    use pretty_assertions::assert_eq;

    fn by_directory(path: &str) -> Option<String> {
        path.strip_prefix("routes/")
            .and_then(|rest| rest.split('/').next())
            .filter(|dir| !dir.ends_with(".svelte"))
            .map(str::to_string)
    }

    /// Build an index where `key` is used `n` times in each listed directory.
    fn index_with(key: &str, usages: &[(&str, usize)]) -> UsageIndex {
        let files: Vec<SourceFile> = usages
            .iter()
            .map(|(dir, n)| {
                SourceFile::new(
                    format!("routes/{}/+page.svelte", dir),
                    format!("{{m.{}()}}\n", key).repeat(*n),
                )
            })
            .collect();
        UsageIndex::rebuild(&PatternScanner::for_accessor("m").unwrap(), &files)
    }

    #[test]
    fn test_majority_above_threshold() {
        let index = index_with("welcome", &[("home", 7), ("about", 3)]);
        let suggestions = SuggestionEngine::default().suggest(&index, &by_directory);

        assert_eq!(suggestions.len(), 1);
        let s = &suggestions[0];
        assert_eq!(s.original_key, "welcome");
        assert_eq!(s.suggested_key, "home.welcome");
        assert_eq!(s.namespace, "home");
        assert!((s.confidence - 0.7).abs() < 1e-9);
        assert_eq!(s.affected_files, vec!["routes/home/+page.svelte"]);
        assert_eq!(s.reason, "7 of 10 usages (70%) are in 1 file under 'home'");
    }

    #[test]
    fn test_even_split_is_not_suggested() {
        let index = index_with("welcome", &[("home", 5), ("about", 5)]);
        assert!(
            SuggestionEngine::default()
                .suggest(&index, &by_directory)
                .is_empty()
        );
    }

    #[test]
    fn test_exact_threshold_is_suggested() {
        let index = index_with("welcome", &[("home", 3), ("about", 2)]);
        let suggestions = SuggestionEngine::default().suggest(&index, &by_directory);
        assert_eq!(suggestions.len(), 1);
        assert!((suggestions[0].confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_namespaced_key_never_suggested() {
        let index = index_with("home.title", &[("home", 4)]);
        assert!(
            SuggestionEngine::default()
                .suggest(&index, &by_directory)
                .is_empty()
        );
    }

    #[test]
    fn test_unclassified_usages_lower_confidence() {
        let scanner = PatternScanner::for_accessor("m").unwrap();
        let files = vec![
            SourceFile::new("routes/home/+page.svelte", "{m.hello()}\n{m.hello()}\n{m.hello()}"),
            SourceFile::new("lib/Header.svelte", "{m.hello()}"),
        ];
        let index = UsageIndex::rebuild(&scanner, &files);
        let suggestions = SuggestionEngine::default().suggest(&index, &by_directory);

        assert_eq!(suggestions.len(), 1);
        assert!((suggestions[0].confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_only_unclassified_usages() {
        let scanner = PatternScanner::for_accessor("m").unwrap();
        let files = vec![SourceFile::new("lib/Header.svelte", "{m.hello()}")];
        let index = UsageIndex::rebuild(&scanner, &files);
        assert!(
            SuggestionEngine::default()
                .suggest(&index, &by_directory)
                .is_empty()
        );
    }

    #[test]
    fn test_tie_picks_smallest_namespace() {
        let index = index_with("cta", &[("beta", 2), ("alpha", 2)]);
        let engine = SuggestionEngine::default();
        let alias = |path: &str| by_directory(path).map(|_| "shared".to_string());
        let suggestions = engine.suggest(&index, &alias);
        assert_eq!(suggestions[0].namespace, "shared");
        assert_eq!(suggestions[0].affected_files.len(), 2);

        // A 2/2 tie only passes a lowered threshold
        let mut cache = HashMap::new();
        let sites = index.usages_for("cta");
        let low = SuggestionEngine { threshold: 0.5 };
        let suggestion = low
            .suggest_key("cta", sites, &by_directory, &mut cache)
            .unwrap();
        assert_eq!(suggestion.namespace, "alpha");
    }

    #[test]
    fn test_ordering() {
        let scanner = PatternScanner::for_accessor("m").unwrap();
        let files = vec![
            SourceFile::new("routes/home/+page.svelte", "{m.a()}\n{m.b()}\n{m.b()}\n{m.c()}"),
            SourceFile::new("routes/about/+page.svelte", "{m.b()}\n{m.d()}\n{m.c()}"),
            SourceFile::new("routes/zoo/+page.svelte", "{m.e()}"),
        ];
        let index = UsageIndex::rebuild(&scanner, &files);
        let suggestions = SuggestionEngine::default().suggest(&index, &by_directory);

        let order: Vec<(&str, &str)> = suggestions
            .iter()
            .map(|s| (s.original_key.as_str(), s.namespace.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("d", "about"), ("a", "home"), ("e", "zoo"), ("b", "home")]
        );
    }

    #[test]
    fn test_threshold_floor() {
        assert_eq!(SuggestionEngine::new(0.2).threshold(), 0.6);
        assert_eq!(SuggestionEngine::new(0.8).threshold(), 0.8);
    }
}
