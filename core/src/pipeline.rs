//! Training orchestration: the order cascade and model file writing.
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cache::model_path;
use crate::compact::{encode, quantize_model};
use crate::corpus::read_corpus;
use crate::error::{ModelError, Result};
use crate::language::Language;
use crate::ngram::NgramOrder;
use crate::tokenizer::CharClass;
use crate::training::{AbsoluteFrequencies, TrainingDataModel};

/// Train orders `1..=max_order` over the same lines.
///
/// Each stage receives the absolute frequencies of the stage before it, so
/// order `k` only starts once order `k - 1` is complete.
pub fn train_cascade<S: AsRef<str>>(
    lines: &[S],
    language: &Language,
    alphabet: &CharClass,
    max_order: NgramOrder,
) -> Result<Vec<TrainingDataModel>> {
    let empty = AbsoluteFrequencies::new();
    let mut models: Vec<TrainingDataModel> = Vec::with_capacity(max_order.len());
    for order in max_order.up_to() {
        let model = {
            let lower = models
                .last()
                .map(TrainingDataModel::absolute_frequencies)
                .unwrap_or(&empty);
            TrainingDataModel::from_text(lines, language, order, alphabet, lower)?
        };
        models.push(model);
    }
    Ok(models)
}

/// One language's training input.
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub language: Language,
    pub corpus: PathBuf,
    pub alphabet: CharClass,
}

/// What [`write_models`] produced for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub language: Language,
    /// Orders written, with their number of distinct n-grams.
    pub written: Vec<(NgramOrder, usize)>,
    /// Orders without any n-grams; no resource exists for them.
    pub skipped: Vec<NgramOrder>,
}

/// Write one resource per non-empty model below `out_dir`.
///
/// Empty models produce no resource; a stale file from an earlier run is
/// removed. With `json` set, a JSON export is written next to each resource.
pub fn write_models(models: &[TrainingDataModel], out_dir: &Path, json: bool) -> Result<Option<WriteSummary>> {
    let Some(language) = models.first().map(TrainingDataModel::language) else {
        return Ok(None);
    };
    let mut summary = WriteSummary {
        language: language.clone(),
        written: Vec::new(),
        skipped: Vec::new(),
    };

    for model in models {
        let path = model_path(out_dir, model.language(), model.order());
        if model.is_empty() {
            remove_stale(&path)?;
            summary.skipped.push(model.order());
            continue;
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| ModelError::io(dir, &e))?;
        }
        let bytes = encode(model.order(), quantize_model(model))?;
        std::fs::write(&path, &bytes).map_err(|e| ModelError::io(&path, &e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote model");

        if json {
            let json_path = path.with_extension("json");
            std::fs::write(&json_path, model.to_json()?).map_err(|e| ModelError::io(&json_path, &e))?;
        }
        summary.written.push((model.order(), model.len()));
    }
    Ok(Some(summary))
}

fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ModelError::io(path, &e)),
    }
}

/// Read a job's corpus, train its cascade and write the resulting resources.
pub fn write_language_models(
    job: &TrainingJob,
    out_dir: &Path,
    max_order: NgramOrder,
    json: bool,
) -> Result<WriteSummary> {
    let lines = read_corpus(&job.corpus)?;
    let models = train_cascade(&lines, &job.language, &job.alphabet, max_order)?;
    let summary = write_models(&models, out_dir, json)?.unwrap_or_else(|| WriteSummary {
        language: job.language.clone(),
        written: Vec::new(),
        skipped: Vec::new(),
    });
    info!(
        language = %job.language,
        lines = lines.len(),
        written = summary.written.len(),
        skipped = summary.skipped.len(),
        "trained language"
    );
    Ok(summary)
}

/// Run independent language jobs in parallel.
pub fn train_languages(
    jobs: &[TrainingJob],
    out_dir: &Path,
    max_order: NgramOrder,
    json: bool,
) -> Result<Vec<WriteSummary>> {
    jobs.par_iter()
        .map(|job| write_language_models(job, out_dir, max_order, json))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraction::Fraction;

    fn en() -> Language {
        Language::from_iso_code("en").unwrap()
    }

    #[test]
    fn cascade_threads_lower_counts_forward() {
        let models = train_cascade(&["aab"], &en(), CharClass::any_letter(), NgramOrder::Tri).unwrap();
        assert_eq!(models.len(), 3);
        assert_eq!(models[1].relative_frequency("aa"), Fraction::new(1, 2));
        assert_eq!(models[1].relative_frequency("ab"), Fraction::new(1, 2));
        assert_eq!(models[2].relative_frequency("aab"), Fraction::new(1, 1));
    }

    #[test]
    fn empty_orders_produce_no_resource() {
        let dir = tempfile::tempdir().unwrap();
        let models = train_cascade(&["ab ab"], &en(), CharClass::any_letter(), NgramOrder::Tri).unwrap();

        // Leftover from an earlier run must disappear.
        let stale = model_path(dir.path(), &en(), NgramOrder::Tri);
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"old").unwrap();

        let summary = write_models(&models, dir.path(), false).unwrap().unwrap();
        assert_eq!(summary.written, vec![(NgramOrder::Uni, 2), (NgramOrder::Bi, 1)]);
        assert_eq!(summary.skipped, vec![NgramOrder::Tri]);
        assert!(model_path(dir.path(), &en(), NgramOrder::Bi).exists());
        assert!(!stale.exists());
    }

    #[test]
    fn json_export_sits_next_to_the_resource() {
        let dir = tempfile::tempdir().unwrap();
        let models = train_cascade(&["abc"], &en(), CharClass::any_letter(), NgramOrder::Uni).unwrap();
        write_models(&models, dir.path(), true).unwrap();
        let json = std::fs::read_to_string(dir.path().join("en").join("unigrams.json")).unwrap();
        assert!(json.contains(r#""1/3":"a b c""#));
    }

    #[test]
    fn no_models_no_summary() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_models(&[], dir.path(), false).unwrap().is_none());
    }
}
