//! Token-bounded text splitting
//!
//! Text is split recursively over a prioritized list of separators
//! (paragraphs, lines, sentences, words, characters). Pieces that fit the
//! token bound are greedily merged back into chunks; pieces that don't are
//! split again with the next, finer separator. Chunks never overlap.
//!
//! Sizes are measured with a [`TokenCounter`], so the bound is in model
//! tokens rather than characters.

use crate::error::PageError;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::warn;

/// Default token bound per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Separators tried in order, coarsest first
///
/// The empty separator splits between characters and always applies.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", "。", " ", ""];

/// Counts tokens the way the consuming model does
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`
    fn count(&self, text: &str) -> usize;
}

/// tiktoken BPE counter
///
/// [`Tiktoken::o200k`] loads the vocabulary used by the `gpt-4o` model
/// family, including `gpt-4o-mini`.
pub struct Tiktoken {
    bpe: CoreBPE,
}

impl Tiktoken {
    /// Counter for the o200k_base vocabulary
    pub fn o200k() -> Result<Self, PageError> {
        tiktoken_rs::o200k_base()
            .map(|bpe| Self { bpe })
            .map_err(|e| PageError::Tokenizer(e.to_string()))
    }

    /// Counter for the vocabulary of the given model name
    pub fn for_model(model: &str) -> Result<Self, PageError> {
        tiktoken_rs::get_bpe_from_model(model)
            .map(|bpe| Self { bpe })
            .map_err(|e| PageError::Tokenizer(e.to_string()))
    }
}

impl TokenCounter for Tiktoken {
    fn count(&self, text: &str) -> usize {
        // Special-token text is counted as ordinary text
        self.bpe.encode_ordinary(text).len()
    }
}

/// Recursive splitter with a token bound
#[derive(Clone)]
pub struct TextSplitter {
    counter: Arc<dyn TokenCounter>,
    chunk_size: usize,
    separators: Vec<String>,
}

impl std::fmt::Debug for TextSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextSplitter")
            .field("chunk_size", &self.chunk_size)
            .field("separators", &self.separators)
            .finish_non_exhaustive()
    }
}

impl TextSplitter {
    /// Create a splitter with the default separators
    pub fn new(counter: Arc<dyn TokenCounter>, chunk_size: usize) -> Self {
        Self {
            counter,
            chunk_size: chunk_size.max(1),
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the separator list
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Token bound per chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split text into chunks of at most `chunk_size` tokens
    ///
    /// Chunks are trimmed; empty or whitespace-only input yields no chunks.
    /// The same input always yields the same chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        // First separator present in the text wins; finer ones are kept for
        // pieces that are still too large
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = "";
                break;
            }
            if text.contains(sep.as_str()) {
                separator = sep.as_str();
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<(&str, usize)> = Vec::new();

        for piece in split_at_separator(text, separator) {
            let tokens = self.counter.count(piece);
            if tokens < self.chunk_size {
                fitting.push((piece, tokens));
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }

            if finer.is_empty() {
                warn!(
                    tokens,
                    chunk_size = self.chunk_size,
                    "Piece cannot be split further, emitting oversize chunk"
                );
                push_trimmed(&mut chunks, piece);
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }

        chunks
    }

    /// Greedily merge consecutive pieces while the token sum fits
    fn merge(&self, pieces: &[(&str, usize)]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut total = 0;

        for &(piece, tokens) in pieces {
            if total + tokens > self.chunk_size && !current.is_empty() {
                push_trimmed(&mut chunks, &current);
                current.clear();
                total = 0;
            }
            current.push_str(piece);
            total += tokens;
        }

        push_trimmed(&mut chunks, &current);
        chunks
    }
}

/// Split `text` at every occurrence of `separator`
///
/// Concatenating the pieces gives back `text`. Leading punctuation of the
/// separator stays at the end of the preceding piece and its whitespace
/// starts the next one, so ". " splits as `"One."` / `" Two."`.
fn split_at_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let offset = separator
        .find(char::is_whitespace)
        .unwrap_or(separator.len());

    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        let cut = idx + offset;
        if cut > start {
            pieces.push(&text[start..cut]);
            start = cut;
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
