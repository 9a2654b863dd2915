//! N-gram orders and the sliding-window extractor.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, Result};

/// Length of the n-grams a model represents.
///
/// Models are cascaded: the conditional probabilities of order *k* are taken
/// relative to the absolute frequencies of order *k - 1*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum NgramOrder {
    Uni = 1,
    Bi = 2,
    Tri = 3,
    Quadri = 4,
    Five = 5,
}

impl NgramOrder {
    pub const COUNT: usize = 5;

    pub const ALL: [NgramOrder; NgramOrder::COUNT] = [
        NgramOrder::Uni,
        NgramOrder::Bi,
        NgramOrder::Tri,
        NgramOrder::Quadri,
        NgramOrder::Five,
    ];

    /// Number of characters in an n-gram of this order.
    #[inline]
    pub const fn len(self) -> usize {
        self as usize
    }

    /// Zero-based position, handy for fixed-size per-order arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// The order whose absolute frequencies feed this one, if any.
    pub const fn lower(self) -> Option<NgramOrder> {
        match self {
            NgramOrder::Uni => None,
            NgramOrder::Bi => Some(NgramOrder::Uni),
            NgramOrder::Tri => Some(NgramOrder::Bi),
            NgramOrder::Quadri => Some(NgramOrder::Tri),
            NgramOrder::Five => Some(NgramOrder::Quadri),
        }
    }

    /// All orders from unigrams up to and including `self`.
    pub fn up_to(self) -> impl Iterator<Item = NgramOrder> {
        NgramOrder::ALL.into_iter().take(self.len())
    }

    /// File stem of the resource holding this order's table.
    pub const fn file_stem(self) -> &'static str {
        match self {
            NgramOrder::Uni => "unigrams",
            NgramOrder::Bi => "bigrams",
            NgramOrder::Tri => "trigrams",
            NgramOrder::Quadri => "quadrigrams",
            NgramOrder::Five => "fivegrams",
        }
    }
}

impl TryFrom<usize> for NgramOrder {
    type Error = ModelError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            1 => Ok(NgramOrder::Uni),
            2 => Ok(NgramOrder::Bi),
            3 => Ok(NgramOrder::Tri),
            4 => Ok(NgramOrder::Quadri),
            5 => Ok(NgramOrder::Five),
            other => Err(ModelError::InvalidOrder(other)),
        }
    }
}

impl From<NgramOrder> for usize {
    fn from(order: NgramOrder) -> Self {
        order.len()
    }
}

impl fmt::Display for NgramOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.len())
    }
}

/// Iterator over the n-grams of one token, see [`ngrams`].
#[derive(Debug, Clone)]
pub struct Ngrams<'a> {
    token: &'a str,
    start: usize,
    // Byte offset one past the current window, `None` once exhausted.
    end: Option<usize>,
}

/// All contiguous substrings of `order` characters of `token`, left to right.
///
/// A token shorter than `order` yields nothing. Callers pass a single token,
/// so n-grams never span a token boundary.
pub fn ngrams(token: &str, order: NgramOrder) -> Ngrams<'_> {
    let end = token
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .nth(order.len() - 1);
    Ngrams {
        token,
        start: 0,
        end,
    }
}

impl<'a> Iterator for Ngrams<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let end = self.end?;
        let gram = &self.token[self.start..end];
        self.start += gram.chars().next().map_or(0, char::len_utf8);
        self.end = self.token[end..].chars().next().map(|c| end + c.len_utf8());
        Some(gram)
    }
}

/// Prefix of an n-gram without its last character.
pub(crate) fn prefix(ngram: &str) -> &str {
    match ngram.char_indices().next_back() {
        Some((idx, _)) => &ngram[..idx],
        None => ngram,
    }
}
