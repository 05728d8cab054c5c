use actix_multipart::{Multipart, MultipartError};
use actix_web::web::{Bytes, BytesMut};
use futures_util::StreamExt;
use uuid::Uuid;

use crate::error::ApiError;

/// Name of the multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";

pub const SEQUENCE_EXTENSIONS: [&str; 4] = [".txt", ".fasta", ".fa", ".seq"];
pub const NPZ_EXTENSION: &str = ".npz";

// Ceilings the upload page enforces in the browser. The server only reports them.
pub const MAX_SEQUENCE_BYTES: usize = 10 * 1024 * 1024;
pub const MAX_NPZ_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Raw nucleotide text (`.txt`, `.fasta`, `.fa`, `.seq`).
    Sequence,
    /// NumPy archive holding an already encoded sequence.
    Preprocessed,
    Unsupported,
}

impl FileKind {
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(NPZ_EXTENSION) {
            FileKind::Preprocessed
        } else if SEQUENCE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            FileKind::Sequence
        } else {
            FileKind::Unsupported
        }
    }

    pub fn max_bytes(self) -> Option<usize> {
        match self {
            FileKind::Sequence => Some(MAX_SEQUENCE_BYTES),
            FileKind::Preprocessed => Some(MAX_NPZ_BYTES),
            FileKind::Unsupported => None,
        }
    }
}

/// An uploaded file held in memory for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub request_id: Uuid,
    pub filename: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_filename(&self.filename)
    }

    /// True when the upload is larger than the browser-side ceiling for its kind.
    pub fn exceeds_advisory_limit(&self) -> bool {
        self.kind()
            .max_bytes()
            .is_some_and(|max| self.data.len() > max)
    }
}

/// Pull the `file` field out of a multipart body.
///
/// A `file` field without a file name, or with an empty one, is treated as
/// absent. Every other field is drained and ignored. A body that ends
/// before its first field (zero bytes, or only the closing boundary) is an
/// empty form, not a broken one.
pub async fn read_upload(mut payload: Multipart) -> Result<Upload, ApiError> {
    let mut upload = None;
    let mut fields_seen = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(MultipartError::Incomplete) if fields_seen == 0 => {
                return Err(ApiError::MissingInput)
            }
            Err(e) => return Err(e.into()),
        };
        fields_seen += 1;

        let filename = {
            let disposition = field.content_disposition();
            match (disposition.get_name(), disposition.get_filename()) {
                (Some(FILE_FIELD), Some(name)) if !name.is_empty() && upload.is_none() => {
                    Some(name.to_owned())
                }
                _ => None,
            }
        };

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            if filename.is_some() {
                data.extend_from_slice(&chunk);
            }
        }

        if let Some(filename) = filename {
            upload = Some(Upload::new(filename, data.freeze()));
        }
    }

    upload.ok_or(ApiError::MissingInput)
}
