//! Token counting for LLM context budget management.
//!
//! Uses tiktoken-rs for OpenAI-compatible token counts. A [`Tokenizer`] is
//! loaded once per run and borrowed by the tree builder; dropping it
//! releases the loaded vocabulary.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tiktoken_rs::CoreBPE;

use crate::filter::is_text_file;

/// Default encoding (GPT-4o family).
pub const DEFAULT_ENCODING: &str = "o200k_base";

/// Files larger than this are not tokenized (50 MiB).
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Errors from tokenizer setup and per-file counting.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("unknown encoding or model: {name}")]
    UnknownEncoding { name: String },

    #[error("failed to load encoding {name}: {message}")]
    Load { name: String, message: String },

    #[error("file too large ({size} bytes): {path}")]
    OversizedFile { path: PathBuf, size: u64 },

    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Token encoding to use for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// o200k_base: GPT-4o
    #[default]
    O200kBase,
    /// cl100k_base: GPT-4, GPT-3.5-turbo
    Cl100kBase,
    /// p50k_base: Codex, text-davinci-002/003
    P50kBase,
    /// p50k_edit: edit models
    P50kEdit,
    /// r50k_base: GPT-3
    R50kBase,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::O200kBase => write!(f, "o200k_base"),
            Encoding::Cl100kBase => write!(f, "cl100k_base"),
            Encoding::P50kBase => write!(f, "p50k_base"),
            Encoding::P50kEdit => write!(f, "p50k_edit"),
            Encoding::R50kBase => write!(f, "r50k_base"),
        }
    }
}

impl std::str::FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "o200k" | "o200k_base" => Ok(Encoding::O200kBase),
            "cl100k" | "cl100k_base" => Ok(Encoding::Cl100kBase),
            "p50k" | "p50k_base" => Ok(Encoding::P50kBase),
            "p50k_edit" => Ok(Encoding::P50kEdit),
            "r50k" | "r50k_base" | "gpt2" => Ok(Encoding::R50kBase),
            _ => Err(format!("unknown encoding: {}", s)),
        }
    }
}

impl Encoding {
    fn load(self) -> Result<CoreBPE, TokenError> {
        let result = match self {
            Encoding::O200kBase => tiktoken_rs::o200k_base(),
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::P50kBase => tiktoken_rs::p50k_base(),
            Encoding::P50kEdit => tiktoken_rs::p50k_edit(),
            Encoding::R50kBase => tiktoken_rs::r50k_base(),
        };
        result.map_err(|e| TokenError::Load {
            name: self.to_string(),
            message: e.to_string(),
        })
    }
}

/// Anything that can turn text into a token count.
///
/// Implementations must not fail: text that cannot be tokenized counts as
/// zero.
pub trait TokenCounter {
    fn count(&self, text: &str) -> usize;
}

/// A loaded tiktoken vocabulary.
///
/// # Examples
///
/// ```no_run
/// use ttree::tokens::{TokenCounter, Tokenizer};
///
/// let tokenizer = Tokenizer::new("cl100k_base").unwrap();
/// assert!(tokenizer.count("Hello, world!") > 0);
/// ```
pub struct Tokenizer {
    name: String,
    bpe: CoreBPE,
}

impl Tokenizer {
    /// Load the tokenizer for an encoding name (`o200k_base`, `cl100k`, ...)
    /// or a model name (`gpt-4o`, `gpt-3.5-turbo`, ...).
    pub fn new(name: &str) -> Result<Self, TokenError> {
        let bpe = match name.parse::<Encoding>() {
            Ok(encoding) => encoding.load()?,
            Err(_) => tiktoken_rs::get_bpe_from_model(name).map_err(|_| {
                TokenError::UnknownEncoding {
                    name: name.to_string(),
                }
            })?,
        };

        log::debug!("loaded tokenizer {name}");
        Ok(Self {
            name: name.to_string(),
            bpe,
        })
    }

    /// The encoding or model name this tokenizer was created from.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TokenCounter for Tokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

impl Drop for Tokenizer {
    fn drop(&mut self) {
        log::trace!("released tokenizer {}", self.name);
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer").field("name", &self.name).finish()
    }
}

/// Count the tokens in a file on disk.
///
/// Binary files (by extension) count as zero without being read. Files over
/// [`MAX_FILE_SIZE`] and unreadable files are reported as errors so the
/// caller can log them and substitute zero.
pub fn count_file_tokens(
    counter: &dyn TokenCounter,
    path: &Path,
    size: u64,
) -> Result<usize, TokenError> {
    if !is_text_file(path) {
        return Ok(0);
    }

    if size > MAX_FILE_SIZE {
        return Err(TokenError::OversizedFile {
            path: path.to_path_buf(),
            size,
        });
    }

    let bytes = fs::read(path).map_err(|source| TokenError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    // Size can change between the scan and the read.
    if bytes.len() as u64 > MAX_FILE_SIZE {
        return Err(TokenError::OversizedFile {
            path: path.to_path_buf(),
            size: bytes.len() as u64,
        });
    }

    let content = String::from_utf8_lossy(&bytes);
    Ok(counter.count(&content))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::TokenCounter;

    /// Counts whitespace-separated words; deterministic stand-in for BPE.
    pub struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }
}
