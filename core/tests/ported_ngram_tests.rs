// core/tests/ported_ngram_tests.rs
//
// Frequency fixtures over a short English text.
//
// Tests cover:
// - Absolute and relative frequencies of every order, unigrams to fivegrams
// - The cascade producing the same tables as stage-by-stage training
// - Query-side n-gram sets over the same text
// - Repeated training over identical lines yielding identical tables

use langmodel_core::{
    train_cascade, AbsoluteFrequencies, CharClass, Fraction, Language, NgramOrder, TestDataModel,
    TrainingDataModel,
};
use std::collections::BTreeSet;

const TEXT: &str = "These sentences are intended for testing purposes.
    ⚠ Do not use them in production
    By the way, they consist of 23 words in total.";

const LATIN: &str = r"\p{L}&&\p{Latin}";

/// (n-gram, absolute count, relative frequency)
type Row = (&'static str, u64, &'static str);

const UNIGRAMS: &[Row] = &[
    ("a", 3, "3/100"),
    ("b", 1, "1/100"),
    ("c", 3, "3/100"),
    ("d", 5, "1/20"),
    ("e", 14, "7/50"),
    ("f", 2, "1/50"),
    ("g", 1, "1/100"),
    ("h", 4, "1/25"),
    ("i", 6, "3/50"),
    ("l", 1, "1/100"),
    ("m", 1, "1/100"),
    ("n", 10, "1/10"),
    ("o", 10, "1/10"),
    ("p", 3, "3/100"),
    ("r", 5, "1/20"),
    ("s", 10, "1/10"),
    ("t", 13, "13/100"),
    ("u", 3, "3/100"),
    ("w", 2, "1/50"),
    ("y", 3, "3/100"),
];

const BIGRAMS: &[Row] = &[
    ("de", 1, "1/5"),
    ("pr", 1, "1/3"),
    ("pu", 1, "1/3"),
    ("do", 1, "1/5"),
    ("uc", 1, "1/3"),
    ("ds", 1, "1/5"),
    ("du", 1, "1/5"),
    ("ur", 1, "1/3"),
    ("us", 1, "1/3"),
    ("ed", 1, "1/14"),
    ("in", 4, "2/3"),
    ("io", 1, "1/6"),
    ("em", 1, "1/14"),
    ("en", 3, "3/14"),
    ("is", 1, "1/6"),
    ("al", 1, "1/3"),
    ("es", 4, "2/7"),
    ("ar", 1, "1/3"),
    ("rd", 1, "1/5"),
    ("re", 1, "1/5"),
    ("ey", 1, "1/14"),
    ("nc", 1, "1/10"),
    ("nd", 1, "1/10"),
    ("ay", 1, "1/3"),
    ("ng", 1, "1/10"),
    ("ro", 1, "1/5"),
    ("rp", 1, "1/5"),
    ("no", 1, "1/10"),
    ("ns", 1, "1/10"),
    ("nt", 2, "1/5"),
    ("fo", 1, "1/2"),
    ("wa", 1, "1/2"),
    ("se", 4, "2/5"),
    ("od", 1, "1/10"),
    ("si", 1, "1/10"),
    ("of", 1, "1/10"),
    ("by", 1, "1/1"),
    ("wo", 1, "1/2"),
    ("on", 2, "1/5"),
    ("st", 2, "1/5"),
    ("ce", 1, "1/3"),
    ("or", 2, "1/5"),
    ("os", 1, "1/10"),
    ("ot", 2, "1/5"),
    ("co", 1, "1/3"),
    ("ta", 1, "1/13"),
    ("ct", 1, "1/3"),
    ("te", 3, "3/13"),
    ("th", 4, "4/13"),
    ("ti", 2, "2/13"),
    ("to", 1, "1/13"),
    ("he", 4, "1/1"),
    ("po", 1, "1/3"),
];

const TRIGRAMS: &[Row] = &[
    ("rds", 1, "1/1"),
    ("ose", 1, "1/1"),
    ("ded", 1, "1/1"),
    ("con", 1, "1/1"),
    ("use", 1, "1/1"),
    ("est", 1, "1/4"),
    ("ion", 1, "1/1"),
    ("ist", 1, "1/1"),
    ("pur", 1, "1/1"),
    ("hem", 1, "1/4"),
    ("hes", 1, "1/4"),
    ("tin", 1, "1/2"),
    ("cti", 1, "1/1"),
    ("wor", 1, "1/1"),
    ("tio", 1, "1/2"),
    ("ten", 2, "2/3"),
    ("ota", 1, "1/2"),
    ("hey", 1, "1/4"),
    ("tal", 1, "1/1"),
    ("tes", 1, "1/3"),
    ("uct", 1, "1/1"),
    ("sti", 1, "1/2"),
    ("pro", 1, "1/1"),
    ("odu", 1, "1/1"),
    ("nsi", 1, "1/1"),
    ("rod", 1, "1/1"),
    ("for", 1, "1/1"),
    ("ces", 1, "1/1"),
    ("nce", 1, "1/1"),
    ("not", 1, "1/1"),
    ("pos", 1, "1/1"),
    ("are", 1, "1/1"),
    ("tot", 1, "1/1"),
    ("end", 1, "1/3"),
    ("enc", 1, "1/3"),
    ("sis", 1, "1/1"),
    ("sen", 1, "1/4"),
    ("nte", 2, "1/1"),
    ("ord", 1, "1/2"),
    ("ses", 1, "1/4"),
    ("ing", 1, "1/4"),
    ("ent", 1, "1/3"),
    ("way", 1, "1/1"),
    ("nde", 1, "1/1"),
    ("int", 1, "1/4"),
    ("rpo", 1, "1/1"),
    ("the", 4, "1/1"),
    ("urp", 1, "1/1"),
    ("duc", 1, "1/1"),
    ("ons", 1, "1/2"),
    ("ese", 1, "1/4"),
];

const QUADRIGRAMS: &[Row] = &[
    ("onsi", 1, "1/1"),
    ("sist", 1, "1/1"),
    ("ende", 1, "1/1"),
    ("ords", 1, "1/1"),
    ("esti", 1, "1/1"),
    ("oduc", 1, "1/1"),
    ("nces", 1, "1/1"),
    ("tenc", 1, "1/2"),
    ("tend", 1, "1/2"),
    ("thes", 1, "1/4"),
    ("rpos", 1, "1/1"),
    ("ting", 1, "1/1"),
    ("nsis", 1, "1/1"),
    ("nten", 2, "1/1"),
    ("tota", 1, "1/1"),
    ("they", 1, "1/4"),
    ("cons", 1, "1/1"),
    ("tion", 1, "1/1"),
    ("prod", 1, "1/1"),
    ("otal", 1, "1/1"),
    ("test", 1, "1/1"),
    ("ence", 1, "1/1"),
    ("pose", 1, "1/1"),
    ("oses", 1, "1/1"),
    ("nded", 1, "1/1"),
    ("inte", 1, "1/1"),
    ("them", 1, "1/4"),
    ("urpo", 1, "1/1"),
    ("duct", 1, "1/1"),
    ("sent", 1, "1/1"),
    ("stin", 1, "1/1"),
    ("ucti", 1, "1/1"),
    ("ente", 1, "1/1"),
    ("purp", 1, "1/1"),
    ("ctio", 1, "1/1"),
    ("rodu", 1, "1/1"),
    ("word", 1, "1/1"),
    ("hese", 1, "1/1"),
];

const FIVEGRAMS: &[Row] = &[
    ("testi", 1, "1/1"),
    ("sente", 1, "1/1"),
    ("ences", 1, "1/1"),
    ("tende", 1, "1/1"),
    ("ducti", 1, "1/1"),
    ("ntenc", 1, "1/2"),
    ("these", 1, "1/1"),
    ("onsis", 1, "1/1"),
    ("ntend", 1, "1/2"),
    ("total", 1, "1/1"),
    ("uctio", 1, "1/1"),
    ("enten", 1, "1/1"),
    ("poses", 1, "1/1"),
    ("ction", 1, "1/1"),
    ("produ", 1, "1/1"),
    ("inten", 1, "1/1"),
    ("nsist", 1, "1/1"),
    ("words", 1, "1/1"),
    ("sting", 1, "1/1"),
    ("purpo", 1, "1/1"),
    ("tence", 1, "1/1"),
    ("estin", 1, "1/1"),
    ("roduc", 1, "1/1"),
    ("urpos", 1, "1/1"),
    ("rpose", 1, "1/1"),
    ("ended", 1, "1/1"),
    ("oduct", 1, "1/1"),
    ("consi", 1, "1/1"),
];

fn english() -> Language {
    Language::from_iso_code("en").unwrap()
}

fn training_lines() -> Vec<String> {
    TEXT.trim().to_lowercase().lines().map(str::to_string).collect()
}

fn absolute(rows: &[Row]) -> AbsoluteFrequencies {
    rows.iter().map(|(g, count, _)| (g.to_string(), *count)).collect()
}

fn assert_model_matches(model: &TrainingDataModel, rows: &[Row]) {
    assert_eq!(model.language(), &english());
    assert_eq!(model.absolute_frequencies(), &absolute(rows), "order {}", model.order());
    assert_eq!(model.relative_frequencies().len(), rows.len());
    for (ngram, _, expected) in rows {
        let expected: Fraction = expected.parse().unwrap();
        assert_eq!(model.relative_frequency(ngram), Some(expected), "n-gram {ngram:?}");
    }
}

fn train_stage(order: NgramOrder, lower: &[Row]) -> TrainingDataModel {
    let latin = CharClass::new(LATIN).unwrap();
    TrainingDataModel::from_text(training_lines(), &english(), order, &latin, &absolute(lower)).unwrap()
}

#[test]
fn unigram_model() {
    assert_model_matches(&train_stage(NgramOrder::Uni, &[]), UNIGRAMS);
}

#[test]
fn bigram_model() {
    assert_model_matches(&train_stage(NgramOrder::Bi, UNIGRAMS), BIGRAMS);
}

#[test]
fn trigram_model() {
    assert_model_matches(&train_stage(NgramOrder::Tri, BIGRAMS), TRIGRAMS);
}

#[test]
fn quadrigram_model() {
    assert_model_matches(&train_stage(NgramOrder::Quadri, TRIGRAMS), QUADRIGRAMS);
}

#[test]
fn fivegram_model() {
    assert_model_matches(&train_stage(NgramOrder::Five, QUADRIGRAMS), FIVEGRAMS);
}

#[test]
fn cascade_matches_stage_by_stage_training() {
    let latin = CharClass::new(LATIN).unwrap();
    let models = train_cascade(&training_lines(), &english(), &latin, NgramOrder::Five).unwrap();
    assert_eq!(models.len(), 5);
    for (model, rows) in models.iter().zip([UNIGRAMS, BIGRAMS, TRIGRAMS, QUADRIGRAMS, FIVEGRAMS]) {
        assert_model_matches(model, rows);
    }
}

#[test]
fn unigram_frequencies_sum_to_one() {
    let model = train_stage(NgramOrder::Uni, &[]);
    let total: u64 = model.absolute_frequencies().values().sum();
    assert_eq!(total, 100);
    let sum: f64 = model.relative_frequencies().values().map(Fraction::to_f64).sum();
    assert!((sum - 1.0).abs() < 1e-12);
}

fn ngram_set(rows: &[Row]) -> BTreeSet<&str> {
    rows.iter().map(|(g, _, _)| *g).collect()
}

#[test]
fn test_data_models_of_every_order() {
    let text = TEXT.to_lowercase();
    let tables = [UNIGRAMS, BIGRAMS, TRIGRAMS, QUADRIGRAMS, FIVEGRAMS];
    for (order, rows) in NgramOrder::ALL.into_iter().zip(tables) {
        let model = TestDataModel::from_text(&text, order);
        assert_eq!(model.order(), order);
        let found: BTreeSet<&str> = model.sorted_ngrams().into_iter().collect();
        assert_eq!(found, ngram_set(rows), "order {order}");
    }
}

#[test]
fn test_data_models_up_to_an_order() {
    let models = TestDataModel::from_text_up_to(&TEXT.to_lowercase(), NgramOrder::Tri);
    assert_eq!(models.len(), 3);
    assert_eq!(models[0].len(), UNIGRAMS.len());
    assert_eq!(models[2].len(), TRIGRAMS.len());
}

#[test]
fn training_twice_gives_identical_models() {
    let lines = ["Grüße aus Köln", "ÀÉÎ õü 12 ab-cd", "Добрый день, мир"];
    let letters = CharClass::any_letter();
    let first = train_cascade(&lines, &english(), letters, NgramOrder::Five).unwrap();
    let second = train_cascade(&lines, &english(), letters, NgramOrder::Five).unwrap();
    assert_eq!(first.len(), 5);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.absolute_frequencies(), b.absolute_frequencies(), "order {}", a.order());
        assert_eq!(a.relative_frequencies(), b.relative_frequencies(), "order {}", a.order());
    }
    assert_eq!(first, second);
}
