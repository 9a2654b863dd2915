//! Language identifiers used as model keys.
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// Opaque language key, spelled as a lowercase ISO 639 code (`"en"`, `"deu"`).
///
/// The catalogue of languages lives outside this crate; the code only has to be
/// a stable identifier that is also safe to use as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Validate and wrap an ISO 639-1 or 639-3 code. Upper case input is folded.
    pub fn from_iso_code(code: &str) -> Result<Self> {
        let code = code.trim().to_ascii_lowercase();
        let valid = (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase());
        if !valid {
            return Err(ModelError::InvalidLanguage(code));
        }
        Ok(Self(code))
    }

    pub fn iso_code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Language {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_iso_code(s)
    }
}

impl TryFrom<String> for Language {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_iso_code(&value)
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.0
    }
}

// Lets the cache look languages up by `&str` without allocating.
impl Borrow<str> for Language {
    fn borrow(&self) -> &str {
        &self.0
    }
}
