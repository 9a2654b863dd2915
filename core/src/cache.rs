//! Process-wide model cache.
//!
//! Each (language, order) key owns a publish-once cell. The first caller for
//! a key runs the load; concurrent callers for the same key block on that
//! cell and observe the same outcome, while other keys proceed untouched.
//! Outcomes are kept for the life of the cache:
//!
//! - `Ok(Some(model))`: the table, shared read-only,
//! - `Ok(None)`: no resource exists for the key,
//! - `Err(e)`: the resource could not be read or parsed; not retried.
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::compact::{CompactModel, FILE_EXTENSION};
use crate::error::{ModelError, Result};
use crate::language::Language;
use crate::ngram::NgramOrder;
use crate::Config;

/// Where the cache gets raw resources from.
pub trait ModelSource: Send + Sync {
    /// Raw bytes of the resource for `(language, order)`, `Ok(None)` if there is none.
    fn fetch(&self, language: &Language, order: NgramOrder) -> Result<Option<Vec<u8>>>;

    /// Human readable name of the resource, used in errors and logs.
    fn describe(&self, language: &Language, order: NgramOrder) -> String {
        format!("{}/{}.{}", language, order.file_stem(), FILE_EXTENSION)
    }
}

/// Location of a resource below a model directory: `<root>/<iso>/<stem>.lgrm`.
pub fn model_path(root: &Path, language: &Language, order: NgramOrder) -> PathBuf {
    root.join(language.iso_code())
        .join(order.file_stem())
        .with_extension(FILE_EXTENSION)
}

/// Reads resources from a directory tree laid out by [`model_path`].
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ModelSource for DirectorySource {
    fn fetch(&self, language: &Language, order: NgramOrder) -> Result<Option<Vec<u8>>> {
        let path = model_path(&self.root, language, order);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ModelError::io(path, &e)),
        }
    }

    fn describe(&self, language: &Language, order: NgramOrder) -> String {
        model_path(&self.root, language, order).display().to_string()
    }
}

/// Resources held in memory, e.g. bytes embedded with `include_bytes!`.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    resources: HashMap<(Language, NgramOrder), Arc<[u8]>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: Language, order: NgramOrder, bytes: impl Into<Arc<[u8]>>) {
        self.resources.insert((language, order), bytes.into());
    }

    pub fn with(mut self, language: Language, order: NgramOrder, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(language, order, bytes);
        self
    }
}

impl ModelSource for MemorySource {
    fn fetch(&self, language: &Language, order: NgramOrder) -> Result<Option<Vec<u8>>> {
        Ok(self
            .resources
            .get(&(language.clone(), order))
            .map(|bytes| bytes.to_vec()))
    }
}

type LoadOutcome = Result<Option<Arc<CompactModel>>>;
type LanguageSlots = [OnceLock<LoadOutcome>; NgramOrder::COUNT];

/// Lazily loading, never evicting cache of compact models.
pub struct ModelCache<S = DirectorySource> {
    source: S,
    slots: DashMap<Language, Arc<LanguageSlots>>,
    loads: AtomicUsize,
}

impl ModelCache<DirectorySource> {
    /// Cache over `config.model_dir`, preloading `config.preload_languages` if asked to.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let cache = ModelCache::new(DirectorySource::new(&config.model_dir));
        if config.preload && !config.preload_languages.is_empty() {
            cache.preload(&config.preload_languages, config.max_order()?)?;
        }
        Ok(cache)
    }
}

impl<S: ModelSource> ModelCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: DashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The table for `(language, order)`, loading it on first use.
    ///
    /// `Ok(None)` means no model exists for the key, which scorers treat as
    /// "no data" rather than a failure.
    ///
    /// # Errors
    /// The cached [`ModelError::CorruptResource`] (or `Io`) outcome of the
    /// first load attempt.
    pub fn get(&self, language: &Language, order: NgramOrder) -> Result<Option<Arc<CompactModel>>> {
        let slots = self.slots_for(language);
        slots[order.index()]
            .get_or_init(|| self.load(language, order))
            .clone()
    }

    /// Load every order up to `max_order` for `languages` in parallel.
    ///
    /// Returns how many of those tables exist.
    pub fn preload(&self, languages: &[Language], max_order: NgramOrder) -> Result<usize> {
        let keys: Vec<(&Language, NgramOrder)> = languages
            .iter()
            .flat_map(|language| max_order.up_to().map(move |order| (language, order)))
            .collect();
        let present = keys
            .into_par_iter()
            .map(|(language, order)| self.get(language, order).map(|model| usize::from(model.is_some())))
            .try_reduce(|| 0, |a, b| Ok(a + b))?;
        debug!(languages = languages.len(), present, "preloaded language models");
        Ok(present)
    }

    /// Keys whose load has completed, whatever the outcome.
    pub fn loaded(&self) -> Vec<(Language, NgramOrder)> {
        let mut keys: Vec<(Language, NgramOrder)> = Vec::new();
        for row in self.slots.iter() {
            let (language, cells) = row.pair();
            keys.extend(
                NgramOrder::ALL
                    .into_iter()
                    .filter(|order| cells[order.index()].get().is_some())
                    .map(|order| (language.clone(), order)),
            );
        }
        keys.sort();
        keys
    }

    /// Number of loads run against the source so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Acquire)
    }

    // Rows are sharded: a hit only read-locks its own shard, and adding a
    // language never blocks lookups that hash to other shards.
    fn slots_for(&self, language: &Language) -> Arc<LanguageSlots> {
        if let Some(row) = self.slots.get(language.iso_code()) {
            return Arc::clone(row.value());
        }
        Arc::clone(self.slots.entry(language.clone()).or_default().value())
    }

    fn load(&self, language: &Language, order: NgramOrder) -> LoadOutcome {
        self.loads.fetch_add(1, Ordering::AcqRel);
        let resource = self.source.describe(language, order);

        let bytes = match self.source.fetch(language, order) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(%language, order = order.len(), "no model resource");
                return Ok(None);
            }
            Err(e) => {
                warn!(%language, order = order.len(), error = %e, "failed to read model resource");
                return Err(e);
            }
        };

        match CompactModel::decode(&bytes, order, &resource) {
            Ok(model) => {
                debug!(%language, order = order.len(), ngrams = model.len(), "loaded model");
                Ok(Some(Arc::new(model)))
            }
            Err(e) => {
                warn!(%language, order = order.len(), error = %e, "corrupt model resource");
                Err(e)
            }
        }
    }
}
