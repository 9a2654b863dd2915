//! Script filter and tokenizer.
//!
//! A [`CharClass`] is an allowed-character predicate written as the body of a
//! regex character class, e.g. `\p{L}&&\p{Latin}` (letters of the Latin
//! script). Tokens are the maximal runs of allowed characters in the
//! lowercased text.
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{ModelError, Result};

static ANY_LETTER: Lazy<CharClass> = Lazy::new(|| CharClass {
    class: r"\p{L}".to_string(),
    runs: Regex::new(r"[\p{L}]+").expect("static letter class compiles"),
});

/// Allowed-character predicate compiled into a run matcher.
#[derive(Clone)]
pub struct CharClass {
    class: String,
    runs: Regex,
}

impl CharClass {
    /// Compile a class body such as `\p{L}&&\p{Cyrillic}` or `a-zäöüß`.
    pub fn new(class: &str) -> Result<Self> {
        if class.trim().is_empty() {
            return Err(ModelError::InvalidCharClass {
                class: class.to_string(),
                reason: "empty class".to_string(),
            });
        }
        let runs = Regex::new(&format!("[{class}]+")).map_err(|e| ModelError::InvalidCharClass {
            class: class.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            class: class.to_string(),
            runs,
        })
    }

    /// Letters of any script; used for query texts of unknown language.
    pub fn any_letter() -> &'static CharClass {
        &ANY_LETTER
    }

    pub fn as_str(&self) -> &str {
        &self.class
    }

    /// Whether a single character satisfies the predicate.
    pub fn matches(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.runs.is_match(c.encode_utf8(&mut buf))
    }

    /// Lowercase `text` and prepare its tokens.
    pub fn tokenize(&self, text: &str) -> TokenStream {
        TokenStream {
            lowered: text.to_lowercase(),
            runs: self.runs.clone(),
        }
    }
}

impl fmt::Debug for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CharClass").field(&self.class).finish()
    }
}

impl PartialEq for CharClass {
    fn eq(&self, other: &Self) -> bool {
        self.class == other.class
    }
}

impl Eq for CharClass {}

/// The lowercased text of one unit together with its token matcher.
///
/// Iteration is restartable: every call to [`TokenStream::iter`] walks the
/// tokens again from the start.
#[derive(Debug, Clone)]
pub struct TokenStream {
    lowered: String,
    runs: Regex,
}

impl TokenStream {
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.runs.find_iter(&self.lowered).map(|m| m.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn lowered(&self) -> &str {
        &self.lowered
    }
}
