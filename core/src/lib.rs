//! langmodel-core
//!
//! Character n-gram language models for text language identification:
//! training-time frequency estimation, query-time n-gram extraction, a
//! compact quantized model format and a concurrent model cache.
//!
//! Public API:
//! - `CharClass` - Allowed-character predicate and tokenizer
//! - `NgramOrder`, `ngrams` - N-gram orders and the sliding-window extractor
//! - `TrainingDataModel` - Absolute and exact relative frequencies of one order
//! - `TestDataModel` - Distinct n-grams of a query text
//! - `CompactModel` - Quantized, sorted per-(language, order) table
//! - `ModelCache` - Lazily loaded, concurrency-safe store of compact models
//! - `Config` - Configuration loaded from TOML
//!
//! The scoring engine that ranks languages consumes these pieces but lives
//! outside this crate.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod error;
pub use error::{ModelError, Result};

pub mod language;
pub use language::Language;

pub mod ngram;
pub use ngram::{ngrams, NgramOrder, Ngrams};

pub mod tokenizer;
pub use tokenizer::{CharClass, TokenStream};

pub mod fraction;
pub use fraction::Fraction;

pub mod training;
pub use training::{AbsoluteFrequencies, JsonModel, RelativeFrequencies, TrainingDataModel};

pub mod test_data;
pub use test_data::TestDataModel;

pub mod compact;
pub use compact::{CompactEntry, CompactModel};

pub mod cache;
pub use cache::{DirectorySource, MemorySource, ModelCache, ModelSource};

pub mod corpus;
pub use corpus::read_corpus;

pub mod pipeline;
pub use pipeline::{train_cascade, train_languages, write_language_models, TrainingJob, WriteSummary};

/// Runtime configuration of the model subsystem.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Root of the resource tree (`<model_dir>/<iso>/<stem>.lgrm`).
    pub model_dir: PathBuf,

    /// Highest n-gram order trained or preloaded (1-5).
    pub max_order: usize,

    /// Log-probability the scorer should use for n-grams a model has never seen.
    pub unseen_ngram_log_probability: f32,

    /// Load models for `preload_languages` when the cache is built.
    pub preload: bool,
    pub preload_languages: Vec<Language>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("data/models"),
            max_order: 5,
            unseen_ngram_log_probability: -20.0,
            preload: false,
            preload_languages: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::io(path, &e))?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ModelError::io(path, &e))
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ModelError::Config(e.to_string()))
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ModelError::Config(e.to_string()))
    }

    pub fn max_order(&self) -> Result<NgramOrder> {
        NgramOrder::try_from(self.max_order)
    }

    pub fn validate(&self) -> Result<()> {
        self.max_order()?;
        if !self.unseen_ngram_log_probability.is_finite() || self.unseen_ngram_log_probability > 0.0 {
            return Err(ModelError::Config(format!(
                "unseen_ngram_log_probability must be a finite value <= 0, got {}",
                self.unseen_ngram_log_probability
            )));
        }
        Ok(())
    }
}

/// Utility helpers.
pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }
}
