use anyhow::{Context, Result};
use clap::Parser;
use langmodel_core::{train_languages, CharClass, Config, Language, NgramOrder, TrainingJob};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Train character n-gram models for the languages listed in a manifest.
#[derive(Parser)]
struct Args {
    /// TOML manifest listing languages, corpora and alphabets
    #[arg(long)]
    manifest: PathBuf,

    /// Runtime config supplying defaults for the output directory and max order
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output model directory (overrides manifest and config)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Highest order to train, 1-5 (overrides manifest and config)
    #[arg(long)]
    max_order: Option<usize>,

    /// Also write a JSON export next to each model file
    #[arg(long)]
    json: bool,

    /// Print the per-language summary as JSON on stdout
    #[arg(long)]
    summary: bool,
}

#[derive(Debug, Deserialize)]
struct TrainingManifest {
    out_dir: Option<PathBuf>,
    max_order: Option<usize>,
    languages: Vec<LanguageEntry>,
}

#[derive(Debug, Deserialize)]
struct LanguageEntry {
    code: String,
    /// Relative paths are resolved against the manifest's directory.
    corpus: PathBuf,
    /// Character class body, e.g. `\p{L}&&\p{Latin}`.
    alphabet: String,
}

impl TrainingManifest {
    fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("read manifest {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parse manifest {}", path.display()))
    }

    fn jobs(&self, base: &Path) -> Result<Vec<TrainingJob>> {
        self.languages
            .iter()
            .map(|entry| -> Result<TrainingJob> {
                let language = Language::from_iso_code(&entry.code)?;
                let alphabet = CharClass::new(&entry.alphabet)
                    .with_context(|| format!("alphabet for {}", entry.code))?;
                Ok(TrainingJob {
                    language,
                    corpus: base.join(&entry.corpus),
                    alphabet,
                })
            })
            .collect()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load_toml(path).with_context(|| format!("load config {}", path.display()))?,
        None => Config::default(),
    };
    let manifest = TrainingManifest::load(&args.manifest)?;
    let base = args.manifest.parent().unwrap_or_else(|| Path::new("."));
    let jobs = manifest.jobs(base)?;

    let out_dir = args
        .out_dir
        .clone()
        .or_else(|| manifest.out_dir.clone())
        .unwrap_or_else(|| config.model_dir.clone());
    let max_order = NgramOrder::try_from(args.max_order.or(manifest.max_order).unwrap_or(config.max_order))?;

    info!(languages = jobs.len(), out_dir = %out_dir.display(), max_order = max_order.len(), "training");
    let summaries = train_languages(&jobs, &out_dir, max_order, args.json)?;

    if args.summary {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            let orders: Vec<String> = summary
                .written
                .iter()
                .map(|(order, count)| format!("{}={}", order.file_stem(), count))
                .collect();
            println!("{}: {}", summary.language, orders.join(" "));
        }
    }
    Ok(())
}
