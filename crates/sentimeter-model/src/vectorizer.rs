//! Bag-of-words TF-IDF features over a bounded vocabulary.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TrainingDataError;

/// Runs of two or more word characters.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Sparse feature row: `(feature index, weight)` sorted by index.
pub type SparseRow = Vec<(usize, f64)>;

pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str())
}

/// TF-IDF vectorizer with a vocabulary fixed at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Learn the vocabulary and IDF weights from `texts`.
    ///
    /// Keeps the `max_features` most frequent terms across the corpus (ties
    /// broken alphabetically) and indexes them alphabetically. IDF is
    /// smoothed: `ln((1 + n) / (1 + df)) + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingDataError::EmptyVocabulary`] if no text contains a token.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(texts: &[String], max_features: usize) -> Result<Self, TrainingDataError> {
        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();

        for text in texts {
            let mut seen = HashSet::new();
            for token in tokenize(text) {
                *term_counts.entry(token).or_insert(0) += 1;
                if seen.insert(token) {
                    *doc_freq.entry(token).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() || max_features == 0 {
            return Err(TrainingDataError::EmptyVocabulary);
        }

        let mut ranked: Vec<(&str, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);

        let mut terms: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort_unstable();

        let n_docs = texts.len() as f64;
        let idf = terms
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        Ok(Self { vocabulary, idf })
    }

    /// Number of features (vocabulary size).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// L2-normalised TF-IDF row for one text. Out-of-vocabulary tokens are
    /// ignored; a text with no known tokens maps to an empty row.
    #[must_use]
    pub fn transform_one(&self, text: &str) -> SparseRow {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .filter_map(|(idx, count)| self.idf.get(idx).map(|idf| (idx, count * idf)))
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }
        row
    }

    #[must_use]
    pub fn transform(&self, texts: &[String]) -> Vec<SparseRow> {
        texts.iter().map(|t| self.transform_one(t)).collect()
    }

    /// Every vocabulary index addresses an IDF weight.
    pub(crate) fn is_consistent(&self) -> bool {
        self.vocabulary.len() == self.idf.len()
            && self.vocabulary.values().all(|&idx| idx < self.idf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn tokenizer_drops_single_characters_and_punctuation() {
        let tokens: Vec<&str> = tokenize("i love this! a b ok").collect();
        assert_eq!(tokens, vec!["love", "this", "ok"]);
    }

    #[test]
    fn fit_indexes_vocabulary_alphabetically() {
        let v = TfIdfVectorizer::fit(&docs(&["zebra apple", "mango apple"]), 10).unwrap();
        assert_eq!(v.n_features(), 3);
        assert_eq!(v.vocabulary.get("apple"), Some(&0));
        assert_eq!(v.vocabulary.get("mango"), Some(&1));
        assert_eq!(v.vocabulary.get("zebra"), Some(&2));
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let v = TfIdfVectorizer::fit(&docs(&["common rare", "common other", "common"]), 1).unwrap();
        assert_eq!(v.n_features(), 1);
        assert!(v.contains("common"));
        assert!(!v.contains("rare"));
    }

    #[test]
    fn empty_vocabulary_is_a_training_error() {
        let result = TfIdfVectorizer::fit(&docs(&["", "!!", "a b c"]), 10);
        assert!(matches!(result, Err(TrainingDataError::EmptyVocabulary)));
    }

    #[test]
    fn rarer_terms_get_higher_idf() {
        let v = TfIdfVectorizer::fit(&docs(&["shared rare", "shared", "shared"]), 10).unwrap();
        let shared = v.idf[v.vocabulary["shared"]];
        let rare = v.idf[v.vocabulary["rare"]];
        assert!(rare > shared);
        assert!((shared - 1.0).abs() < 1e-12, "term in every doc has idf 1");
    }

    #[test]
    fn rows_are_unit_length_and_ignore_unknown_terms() {
        let v = TfIdfVectorizer::fit(&docs(&["good movie", "bad movie"]), 10).unwrap();
        let row = v.transform_one("good good movie unknown");
        let norm: f64 = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        assert_eq!(row.len(), 2);

        assert!(v.transform_one("nothing known here").is_empty());
    }
}
