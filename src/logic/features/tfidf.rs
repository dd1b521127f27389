//! TF-IDF vectorizer for free-text records (complaint narratives, abstracts).

use std::collections::{BTreeMap, HashMap};

use super::record::Record;
use super::vector::{check_output, FeatureVector, Vectorizer};
use crate::logic::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    pub max_features: usize,
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self {
            max_features: crate::constants::DEFAULT_TFIDF_FEATURES,
        }
    }
}

/// Lowercase alphanumeric tokens of at least two characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .collect()
}

impl TfIdfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Vocabulary: most frequent terms across the corpus, ties alphabetical.
    /// Returned in alphabetical order so column positions are stable.
    fn vocabulary(&self, docs: &[Vec<String>]) -> Vec<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in docs {
            for token in doc {
                *counts.entry(token.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let mut vocab: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocab.sort();
        vocab
    }
}

impl Vectorizer for TfIdfVectorizer {
    fn name(&self) -> &str {
        "tfidf"
    }

    fn vectorize(&self, records: &[Record]) -> PipelineResult<Vec<FeatureVector>> {
        if self.max_features == 0 {
            return Err(PipelineError::config("TF-IDF needs max_features >= 1"));
        }

        let mut docs = Vec::with_capacity(records.len());
        for record in records {
            let text = record.text.as_deref().ok_or_else(|| PipelineError::InvalidVector {
                key: record.id.clone(),
                reason: "record has no text to vectorize".to_string(),
            })?;
            docs.push(tokenize(text));
        }

        let vocab = self.vocabulary(&docs);
        if vocab.is_empty() && !docs.is_empty() {
            return Err(PipelineError::config(
                "TF-IDF vocabulary is empty; no record has a token of two or more characters",
            ));
        }
        let index: HashMap<&str, usize> = vocab.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();

        let n = docs.len() as f64;
        let mut df = vec![0usize; vocab.len()];
        for doc in &docs {
            let mut seen = vec![false; vocab.len()];
            for token in doc {
                if let Some(&i) = index.get(token.as_str()) {
                    if !seen[i] {
                        seen[i] = true;
                        df[i] += 1;
                    }
                }
            }
        }
        let idf: Vec<f64> = df.iter().map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0).collect();

        let vectors: Vec<FeatureVector> = docs
            .iter()
            .map(|doc| {
                let mut row = vec![0.0_f64; vocab.len()];
                for token in doc {
                    if let Some(&i) = index.get(token.as_str()) {
                        row[i] += 1.0;
                    }
                }
                for (v, w) in row.iter_mut().zip(&idf) {
                    *v *= w;
                }
                let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    row.iter_mut().for_each(|v| *v /= norm);
                }
                FeatureVector::from_f64(&row)
            })
            .collect();

        check_output(records, &vectors)?;
        Ok(vectors)
    }
}
