//! Light, non-validating inspection of an uploaded sequence.
//!
//! Nothing here rejects an upload; it only fills the descriptive fields of a
//! result (`sequence_length`, `processed_shape`, `preprocessing_method`).

use ndarray::Array2;

use crate::intake::{FileKind, Upload};
use crate::models::SequenceLength;

/// Rows kept by the one-hot encoding; longer sequences are truncated.
pub const MAX_SEQUENCE_LENGTH: usize = 13_000;

/// Width reported for uploads that are not encoded here (NPZ, unreadable text):
/// one column per nucleotide.
pub const ENCODED_WIDTH: usize = MAX_SEQUENCE_LENGTH * 4;

pub const METHOD_ONE_HOT: &str = "One-hot encoding (max_length=13000)";
pub const METHOD_NPZ: &str = "NPZ (already preprocessed)";
pub const METHOD_MOCK: &str = "Mock processing for demo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub sequence_length: SequenceLength,
    pub processed_shape: [usize; 2],
    pub preprocessing_method: &'static str,
}

pub fn inspect(upload: &Upload) -> Inspection {
    if upload.kind() == FileKind::Preprocessed {
        return Inspection {
            sequence_length: SequenceLength::Preprocessed,
            processed_shape: [1, ENCODED_WIDTH],
            preprocessing_method: METHOD_NPZ,
        };
    }

    let sequence = match std::str::from_utf8(&upload.data) {
        Ok(text) => clean(text),
        Err(_) => String::new(),
    };
    if sequence.is_empty() {
        return Inspection {
            sequence_length: SequenceLength::Unknown,
            processed_shape: [1, ENCODED_WIDTH],
            preprocessing_method: METHOD_MOCK,
        };
    }

    let encoded = one_hot(&sequence);
    let shape = encoded.shape();
    Inspection {
        sequence_length: SequenceLength::Known(sequence.len()),
        processed_shape: [shape[0], shape[1]],
        preprocessing_method: METHOD_ONE_HOT,
    }
}

/// Strip FASTA headers and whitespace, upper-case, keep only A/T/G/C.
pub fn clean(text: &str) -> String {
    text.lines()
        .map(|line| line.split('>').next().unwrap_or_default())
        .flat_map(str::chars)
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| matches!(c, 'A' | 'T' | 'G' | 'C'))
        .collect()
}

/// Encode a cleaned sequence as a flattened `MAX_SEQUENCE_LENGTH x k` matrix,
/// where `k` is the number of distinct bases present.
///
/// Columns follow the sorted order of those bases, so `"GATTACA"` uses four
/// columns and `"AAAA"` only one. Shorter sequences are zero-padded.
pub fn one_hot(sequence: &str) -> Array2<f32> {
    let mut classes: Vec<u8> = sequence.bytes().collect();
    classes.sort_unstable();
    classes.dedup();
    let width = classes.len();

    let mut encoded = Array2::<f32>::zeros((1, MAX_SEQUENCE_LENGTH * width));
    for (row, base) in sequence.bytes().take(MAX_SEQUENCE_LENGTH).enumerate() {
        if let Ok(col) = classes.binary_search(&base) {
            encoded[[0, row * width + col]] = 1.0;
        }
    }
    encoded
}
