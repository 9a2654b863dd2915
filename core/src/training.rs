//! Training-time conditional frequency estimation.
//!
//! A [`TrainingDataModel`] holds the absolute counts of every n-gram of one
//! order seen in a corpus and the exact conditional probability of each
//! n-gram given its prefix:
//!
//! ```text
//! order 1:  P(g) = count(g) / total character count
//! order k:  P(g) = count(g) / count_{k-1}(g without its last character)
//! ```
//!
//! The order `k - 1` counts come from the previous stage of the cascade and
//! are passed in explicitly, see [`crate::pipeline::train_cascade`].
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::fraction::Fraction;
use crate::language::Language;
use crate::ngram::{ngrams, prefix, NgramOrder};
use crate::tokenizer::CharClass;

/// n-gram -> occurrence count.
pub type AbsoluteFrequencies = AHashMap<String, u64>;

/// n-gram -> exact conditional probability.
pub type RelativeFrequencies = AHashMap<String, Fraction>;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingDataModel {
    language: Language,
    order: NgramOrder,
    absolute_frequencies: AbsoluteFrequencies,
    relative_frequencies: RelativeFrequencies,
}

impl TrainingDataModel {
    /// Count the n-grams of `order` in `lines` and derive their relative frequencies.
    ///
    /// Each line is tokenized on its own with `alphabet`. For `order > 1`,
    /// `lower` must be the absolute frequencies of order `order - 1` over the
    /// same lines; it is ignored for unigrams.
    ///
    /// # Errors
    /// [`ModelError::CascadeInvariantViolation`] if some n-gram's prefix is
    /// absent from `lower` or counted fewer times than the n-gram itself.
    pub fn from_text<I, S>(
        lines: I,
        language: &Language,
        order: NgramOrder,
        alphabet: &CharClass,
        lower: &AbsoluteFrequencies,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let absolute_frequencies = count_ngrams(lines, order, alphabet);
        let relative_frequencies = relative_frequencies(&absolute_frequencies, order, lower)?;

        debug!(
            language = %language,
            order = order.len(),
            distinct = absolute_frequencies.len(),
            "built training model"
        );

        Ok(Self {
            language: language.clone(),
            order,
            absolute_frequencies,
            relative_frequencies,
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn order(&self) -> NgramOrder {
        self.order
    }

    pub fn absolute_frequencies(&self) -> &AbsoluteFrequencies {
        &self.absolute_frequencies
    }

    pub fn relative_frequencies(&self) -> &RelativeFrequencies {
        &self.relative_frequencies
    }

    pub fn relative_frequency(&self, ngram: &str) -> Option<Fraction> {
        self.relative_frequencies.get(ngram).copied()
    }

    /// Hand the absolute counts on to the next stage of the cascade.
    pub fn into_absolute_frequencies(self) -> AbsoluteFrequencies {
        self.absolute_frequencies
    }

    /// Number of distinct n-grams.
    pub fn len(&self) -> usize {
        self.absolute_frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.absolute_frequencies.is_empty()
    }

    /// Relative frequencies sorted ascending by n-gram.
    pub fn sorted_relative_frequencies(&self) -> Vec<(&str, Fraction)> {
        let mut entries: Vec<(&str, Fraction)> = self
            .relative_frequencies
            .iter()
            .map(|(g, f)| (g.as_str(), *f))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Serialize as JSON with n-grams grouped by their exact frequency.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&JsonModel::from(self))
            .map_err(|e| ModelError::Config(format!("json serialization: {e}")))
    }
}

fn count_ngrams<I, S>(lines: I, order: NgramOrder, alphabet: &CharClass) -> AbsoluteFrequencies
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = AbsoluteFrequencies::new();
    for line in lines {
        let tokens = alphabet.tokenize(line.as_ref());
        for token in tokens.iter() {
            for gram in ngrams(token, order) {
                match counts.get_mut(gram) {
                    Some(count) => *count += 1,
                    None => {
                        counts.insert(gram.to_string(), 1);
                    }
                }
            }
        }
    }
    counts
}

fn relative_frequencies(
    absolute: &AbsoluteFrequencies,
    order: NgramOrder,
    lower: &AbsoluteFrequencies,
) -> Result<RelativeFrequencies> {
    let mut relative = RelativeFrequencies::with_capacity(absolute.len());

    if order.lower().is_none() {
        let total: u64 = absolute.values().sum();
        for (gram, &count) in absolute {
            if let Some(freq) = Fraction::new(count, total) {
                relative.insert(gram.clone(), freq);
            }
        }
        return Ok(relative);
    }

    // Sorted so that a violation always names the same n-gram.
    let mut grams: Vec<(&String, &u64)> = absolute.iter().collect();
    grams.sort_unstable_by(|a, b| a.0.cmp(b.0));

    for (gram, &count) in grams {
        let head = prefix(gram);
        let violation = || ModelError::CascadeInvariantViolation {
            ngram: gram.clone(),
            prefix: head.to_string(),
        };
        let denominator = lower.get(head).copied().ok_or_else(violation)?;
        if denominator < count {
            return Err(violation());
        }
        let freq = Fraction::new(count, denominator).ok_or_else(violation)?;
        relative.insert(gram.clone(), freq);
    }
    Ok(relative)
}

/// JSON form of a training model: `{"language", "order", "ngrams": {"n/d": "g1 g2"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonModel {
    pub language: Language,
    pub order: NgramOrder,
    pub ngrams: BTreeMap<Fraction, String>,
}

impl From<&TrainingDataModel> for JsonModel {
    fn from(model: &TrainingDataModel) -> Self {
        let mut grouped: BTreeMap<Fraction, Vec<&str>> = BTreeMap::new();
        for (gram, freq) in model.sorted_relative_frequencies() {
            grouped.entry(freq).or_default().push(gram);
        }
        JsonModel {
            language: model.language.clone(),
            order: model.order,
            ngrams: grouped
                .into_iter()
                .map(|(freq, grams)| (freq, grams.join(" ")))
                .collect(),
        }
    }
}

impl JsonModel {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ModelError::Config(format!("json model: {e}")))
    }

    /// Flatten back into n-gram -> frequency pairs.
    pub fn relative_frequencies(&self) -> RelativeFrequencies {
        self.ngrams
            .iter()
            .flat_map(|(freq, grams)| grams.split(' ').map(move |g| (g.to_string(), *freq)))
            .collect()
    }
}
