use encoding_rs::Encoding;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Tried in order; `latin1` resolves to windows-1252 and accepts any byte.
pub const FALLBACK_ENCODINGS: [&str; 3] = ["utf-8", "gbk", "latin1"];

#[derive(Debug, thiserror::Error)]
pub enum TextReadError {
    #[error("file not found: {}", path.display())]
    MissingFile { path: PathBuf },
    #[error("unable to decode {} with any supported encoding", path.display())]
    Unreadable { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reads a text file produced by tools that may not write UTF-8.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String, TextReadError> {
    let path = path.as_ref();
    if !path.exists() {
        error!(path = %path.display(), "file not found");
        return Err(TextReadError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|source| TextReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match decode(&bytes) {
        Some((text, encoding)) => {
            debug!(path = %path.display(), encoding = encoding.name(), "decoded text file");
            Ok(text)
        }
        None => {
            error!(path = %path.display(), "no supported encoding could decode file");
            Err(TextReadError::Unreadable {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Strict decode: the first encoding that maps every byte without
/// replacement wins.
pub fn decode(bytes: &[u8]) -> Option<(String, &'static Encoding)> {
    FALLBACK_ENCODINGS
        .iter()
        .filter_map(|label| Encoding::for_label(label.as_bytes()))
        .find_map(|encoding| {
            encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| (text.into_owned(), encoding))
        })
}
