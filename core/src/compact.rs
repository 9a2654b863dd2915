//! Compact model store: quantized, sorted per-(language, order) tables.
//!
//! Exact relative frequencies are converted for storage in one documented
//! step, see [`quantize`]:
//!
//! ```text
//! Fraction n/d  ->  ln(n) - ln(d)  (f64)  ->  IEEE-754 binary16, round to nearest even
//! ```
//!
//! # Resource format (version 1)
//!
//! All integers are little-endian.
//!
//! ```text
//! offset  size  field
//!      0     4  magic "LGRM"
//!      4     1  format version (1)
//!      5     1  n-gram order (1..=5)
//!      6     2  reserved, zero
//!      8     4  record count N (u32)
//!     12     .  N records
//!
//! record: u8 byte length L | L bytes UTF-8 n-gram | u16 binary16 bits of ln(p)
//! ```
//!
//! Records are strictly ascending by n-gram bytes (code point order) and the
//! resource ends right after the last record. The same entries always encode
//! to the same bytes.
//!
//! In memory a table is an `fst::Map` from n-gram bytes to the stored bits.
use fst::{Map, MapBuilder, Streamer};
use half::f16;

use crate::error::{ModelError, Result};
use crate::fraction::Fraction;
use crate::ngram::NgramOrder;
use crate::training::TrainingDataModel;

pub const MAGIC: [u8; 4] = *b"LGRM";
pub const FORMAT_VERSION: u8 = 1;
pub const FILE_EXTENSION: &str = "lgrm";

const HEADER_LEN: usize = 12;

/// Relative error bound of binary16 rounding (half a unit in the last place).
pub const QUANTIZATION_RELATIVE_TOLERANCE: f64 = 1.0 / 2048.0;

/// Absolute error bound inside the binary16 subnormal range.
pub const QUANTIZATION_ABSOLUTE_TOLERANCE: f64 = 1.0 / 33_554_432.0;

/// Stored log-probability of a relative frequency.
pub fn quantize(frequency: Fraction) -> f16 {
    round_to_f16(frequency.ln())
}

/// Correctly rounded `f64 -> binary16`, ties to even.
///
/// `f16::from_f64` may round through `f32` or drop low mantissa bits
/// depending on the target, which can land one unit off. The exact answer is
/// always within one unit of it, so the nearest of it and its two neighbours
/// is chosen by comparing in `f64`, where every binary16 value is exact.
fn round_to_f16(value: f64) -> f16 {
    let approx = f16::from_f64(value);
    if !approx.is_finite() || value.is_nan() {
        return approx;
    }
    let bits = approx.to_bits();
    let mut best = approx;
    let mut best_err = (approx.to_f64() - value).abs();
    for candidate in [bits.wrapping_sub(1), bits.wrapping_add(1)].map(f16::from_bits) {
        if !candidate.is_finite() {
            continue;
        }
        let err = (candidate.to_f64() - value).abs();
        let tie_to_even = err == best_err && candidate.to_bits() & 1 == 0;
        if err < best_err || tie_to_even {
            best = candidate;
            best_err = err;
        }
    }
    best
}

/// Whether `stored` is within the quantization error of `exact_ln`.
pub fn within_quantization_tolerance(exact_ln: f64, stored: f32) -> bool {
    let bound = exact_ln.abs() * QUANTIZATION_RELATIVE_TOLERANCE + QUANTIZATION_ABSOLUTE_TOLERANCE;
    (f64::from(stored) - exact_ln).abs() <= bound
}

/// One row of a compact table.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactEntry {
    pub ngram: String,
    pub log_probability: f16,
}

/// Quantize every relative frequency of `model`, sorted ascending by n-gram.
pub fn quantize_model(model: &TrainingDataModel) -> Vec<CompactEntry> {
    model
        .sorted_relative_frequencies()
        .into_iter()
        .map(|(ngram, freq)| CompactEntry {
            ngram: ngram.to_string(),
            log_probability: quantize(freq),
        })
        .collect()
}

/// Encode entries into a version 1 resource.
///
/// Entries are sorted here; duplicates, n-grams of the wrong length and
/// values that are not log-probabilities are rejected.
pub fn encode(order: NgramOrder, mut entries: Vec<CompactEntry>) -> Result<Vec<u8>> {
    entries.sort_by(|a, b| a.ngram.cmp(&b.ngram));

    let count = u32::try_from(entries.len()).map_err(|_| ModelError::InvalidEntry {
        ngram: String::new(),
        reason: format!("{} entries exceed the format limit", entries.len()),
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + entries.len() * (order.len() + 3));
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.push(order.len() as u8);
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&count.to_le_bytes());

    let mut previous: Option<&str> = None;
    for entry in &entries {
        let invalid = |reason: &str| ModelError::InvalidEntry {
            ngram: entry.ngram.clone(),
            reason: reason.to_string(),
        };
        if previous == Some(entry.ngram.as_str()) {
            return Err(invalid("duplicate n-gram"));
        }
        if entry.ngram.chars().count() != order.len() {
            return Err(invalid("length does not match the table order"));
        }
        check_log_probability(entry.log_probability).map_err(|reason| invalid(reason))?;

        let bytes = entry.ngram.as_bytes();
        // At most five characters of four bytes each.
        out.push(bytes.len() as u8);
        out.extend_from_slice(bytes);
        out.extend_from_slice(&entry.log_probability.to_bits().to_le_bytes());
        previous = Some(entry.ngram.as_str());
    }
    Ok(out)
}

fn check_log_probability(value: f16) -> std::result::Result<(), &'static str> {
    if !value.is_finite() {
        return Err("log-probability is not finite");
    }
    if value > f16::ZERO {
        return Err("log-probability is positive");
    }
    Ok(())
}

/// Order recorded in a resource header, for tools that open a file without
/// knowing which table it holds. The rest of the resource is not checked.
pub fn header_order(bytes: &[u8], resource: &str) -> Result<NgramOrder> {
    if bytes.len() < HEADER_LEN || bytes[0..4] != MAGIC {
        return Err(ModelError::corrupt(resource, "not a model resource"));
    }
    NgramOrder::try_from(usize::from(bytes[5]))
        .map_err(|_| ModelError::corrupt(resource, format!("invalid order {}", bytes[5])))
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// A loaded, immutable per-(language, order) table.
#[derive(Debug, Clone)]
pub struct CompactModel {
    order: NgramOrder,
    index: Map<Vec<u8>>,
}

impl CompactModel {
    /// Parse a resource. `resource` names it in error messages.
    ///
    /// # Errors
    /// [`ModelError::CorruptResource`] for any structural problem, including
    /// a table of a different order than `order`.
    pub fn decode(bytes: &[u8], order: NgramOrder, resource: &str) -> Result<Self> {
        let corrupt = |reason: String| ModelError::corrupt(resource, reason);
        let mut reader = ByteReader { bytes, pos: 0 };

        let header = reader
            .take(HEADER_LEN)
            .ok_or_else(|| corrupt(format!("truncated header ({} bytes)", bytes.len())))?;
        if header[0..4] != MAGIC {
            return Err(corrupt("bad magic".to_string()));
        }
        if header[4] != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {}", header[4])));
        }
        if usize::from(header[5]) != order.len() {
            return Err(corrupt(format!(
                "table order {} does not match requested order {}",
                header[5], order
            )));
        }
        if header[6..8] != [0, 0] {
            return Err(corrupt("reserved header bytes are set".to_string()));
        }
        let count = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);

        let mut builder = MapBuilder::memory();
        let mut previous: Option<&[u8]> = None;
        for record in 0..count {
            let truncated = || corrupt(format!("truncated record {record} of {count}"));
            let len = reader.take(1).ok_or_else(truncated)?[0] as usize;
            let gram = reader.take(len).ok_or_else(truncated)?;
            let bits = reader.take(2).ok_or_else(truncated)?;

            let text = std::str::from_utf8(gram)
                .map_err(|_| corrupt(format!("record {record} is not valid UTF-8")))?;
            if text.chars().count() != order.len() {
                return Err(corrupt(format!("record {record} {text:?} has the wrong length")));
            }
            if previous.is_some_and(|prev| prev >= gram) {
                return Err(corrupt(format!("record {record} {text:?} is out of order")));
            }
            let value = f16::from_bits(u16::from_le_bytes([bits[0], bits[1]]));
            check_log_probability(value).map_err(|reason| corrupt(format!("record {record}: {reason}")))?;

            builder
                .insert(gram, u64::from(value.to_bits()))
                .map_err(|e| corrupt(e.to_string()))?;
            previous = Some(gram);
        }

        if reader.remaining() != 0 {
            return Err(corrupt(format!("{} trailing bytes", reader.remaining())));
        }

        let index = builder.into_map();
        Ok(Self { order, index })
    }

    /// Quantize a training model directly into a queryable table.
    pub fn from_training(model: &TrainingDataModel) -> Result<Self> {
        let mut builder = MapBuilder::memory();
        for entry in quantize_model(model) {
            builder
                .insert(entry.ngram.as_bytes(), u64::from(entry.log_probability.to_bits()))
                .map_err(|e| ModelError::InvalidEntry {
                    ngram: entry.ngram.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Self {
            order: model.order(),
            index: builder.into_map(),
        })
    }

    pub fn order(&self) -> NgramOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Stored `ln(p)` of `ngram`, or `None` if it was never seen in training.
    pub fn lookup(&self, ngram: &str) -> Option<f32> {
        self.lookup_f16(ngram).map(f32::from)
    }

    pub fn lookup_f16(&self, ngram: &str) -> Option<f16> {
        self.index.get(ngram).map(|bits| f16::from_bits(bits as u16))
    }

    /// Like [`lookup`](Self::lookup) but with the scorer's penalty for unseen n-grams.
    pub fn lookup_or(&self, ngram: &str, unseen: f32) -> f32 {
        self.lookup(ngram).unwrap_or(unseen)
    }

    /// All entries in ascending n-gram order.
    pub fn entries(&self) -> Vec<CompactEntry> {
        let mut out = Vec::with_capacity(self.len());
        let mut stream = self.index.stream();
        while let Some((key, bits)) = stream.next() {
            out.push(CompactEntry {
                ngram: String::from_utf8_lossy(key).into_owned(),
                log_probability: f16::from_bits(bits as u16),
            });
        }
        out
    }

    /// Encode back into the resource format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(self.order, self.entries())
    }
}
