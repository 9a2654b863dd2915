//! Query-side n-gram extraction.
use ahash::AHashSet;

use crate::ngram::{ngrams, NgramOrder};
use crate::tokenizer::CharClass;

/// Distinct n-grams of one order found in a query text.
///
/// The query's language is unknown, so tokens are runs of letters of any
/// script; narrowing by alphabet is up to the scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct TestDataModel {
    order: NgramOrder,
    ngrams: AHashSet<String>,
}

impl TestDataModel {
    /// Extract every distinct n-gram of `order` from `text`.
    ///
    /// Text without `order` consecutive letters yields an empty model, which
    /// simply means there is no evidence at this order.
    pub fn from_text(text: &str, order: NgramOrder) -> Self {
        let tokens = CharClass::any_letter().tokenize(text);
        let ngrams = tokens
            .iter()
            .flat_map(|token| ngrams(token, order))
            .map(str::to_string)
            .collect();
        Self { order, ngrams }
    }

    /// One model per order from unigrams up to `max_order`.
    pub fn from_text_up_to(text: &str, max_order: NgramOrder) -> Vec<Self> {
        max_order.up_to().map(|order| Self::from_text(text, order)).collect()
    }

    pub fn order(&self) -> NgramOrder {
        self.order
    }

    pub fn ngrams(&self) -> &AHashSet<String> {
        &self.ngrams
    }

    pub fn contains(&self, ngram: &str) -> bool {
        self.ngrams.contains(ngram)
    }

    /// The n-grams in ascending order, for merge-style lookups against a sorted table.
    pub fn sorted_ngrams(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.ngrams.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    pub fn len(&self) -> usize {
        self.ngrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ngrams.is_empty()
    }
}
