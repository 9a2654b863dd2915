use anyhow::{Context, Result};
use clap::Parser;
use langmodel_core::compact::header_order;
use langmodel_core::CompactModel;
use std::path::PathBuf;

/// Dump or query a compact model file.
#[derive(Parser)]
struct Args {
    /// Model file (.lgrm)
    path: PathBuf,

    /// Print only these n-grams ("-" for ones the model has never seen)
    #[arg(long)]
    lookup: Vec<String>,

    /// Print at most this many entries
    #[arg(long)]
    limit: Option<usize>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let resource = args.path.display().to_string();
    let bytes = std::fs::read(&args.path).with_context(|| format!("read {resource}"))?;
    let order = header_order(&bytes, &resource)?;
    let model = CompactModel::decode(&bytes, order, &resource)?;

    println!("{resource}: order {order}, {} n-grams, {} bytes", model.len(), bytes.len());

    if !args.lookup.is_empty() {
        for ngram in &args.lookup {
            match model.lookup(ngram) {
                Some(value) => println!("{ngram}\t{value}"),
                None => println!("{ngram}\t-"),
            }
        }
        return Ok(());
    }

    let limit = args.limit.unwrap_or(usize::MAX);
    for entry in model.entries().into_iter().take(limit) {
        println!("{}\t{}", entry.ngram, entry.log_probability);
    }
    Ok(())
}
