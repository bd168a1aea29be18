//! Prompt token budgeting.
//!
//! Prompts longer than the model's input budget are cut at a token boundary
//! and decoded back to text. Trailing content is dropped silently, which can
//! change what the prompt asks for; callers get a `warn!` when it happens.

use std::path::{Path, PathBuf};

use tiktoken_rs::CoreBPE;
use tokenizers::decoders::wordpiece::WordPiece as WordPieceDecoder;
use tokenizers::decoders::DecoderWrapper;
use tokenizers::models::wordpiece::WordPiece;
use tokenizers::models::ModelWrapper;
use tokenizers::normalizers::bert::BertNormalizer;
use tokenizers::normalizers::NormalizerWrapper;
use tokenizers::pre_tokenizers::bert::BertPreTokenizer;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::processors::bert::BertProcessing;
use tokenizers::processors::PostProcessorWrapper;
use tokenizers::{Model, Tokenizer, TokenizerBuilder, TokenizerImpl};
use tracing::{debug, info, warn};

use crate::error::ResponderError;

/// Name of the bundled BPE used when no HuggingFace tokenizer is available.
pub const TIKTOKEN_MODEL: &str = "cl100k_base";

/// Decoding a truncated BPE sequence can split a multi-byte character; drop up
/// to this many extra tokens looking for a clean boundary.
const MAX_DECODE_BACKOFF: usize = 4;

/// Special tokens of BERT-style WordPiece vocabularies.
const BERT_UNK: &str = "[UNK]";
const BERT_CLS: &str = "[CLS]";
const BERT_SEP: &str = "[SEP]";

type WordPieceTokenizer = TokenizerImpl<
    ModelWrapper,
    NormalizerWrapper,
    PreTokenizerWrapper,
    PostProcessorWrapper,
    DecoderWrapper,
>;

fn tokenizer_error(e: impl std::fmt::Display) -> ResponderError {
    ResponderError::Tokenizer(e.to_string())
}

/// Encodes prompts to count and cut them at a token budget.
pub trait PromptTokenizer: Send + Sync {
    /// Tokenizer identifier, for logging.
    fn name(&self) -> &str;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> Result<usize, ResponderError>;

    /// `Some(truncated)` when `text` exceeds `max_tokens`, `None` when it fits.
    fn truncate(&self, text: &str, max_tokens: usize) -> Result<Option<String>, ResponderError>;
}

/// Tokenizer backed by tiktoken's bundled `cl100k_base` BPE. Works offline.
pub struct TiktokenPromptTokenizer {
    bpe: CoreBPE,
}

impl TiktokenPromptTokenizer {
    pub fn new() -> Result<Self, ResponderError> {
        let bpe = tiktoken_rs::cl100k_base().map_err(tokenizer_error)?;
        Ok(Self { bpe })
    }
}

impl PromptTokenizer for TiktokenPromptTokenizer {
    fn name(&self) -> &str {
        TIKTOKEN_MODEL
    }

    fn count(&self, text: &str) -> Result<usize, ResponderError> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> Result<Option<String>, ResponderError> {
        let tokens = self.bpe.encode_with_special_tokens(text);
        if tokens.len() <= max_tokens {
            return Ok(None);
        }

        let mut end = max_tokens;
        loop {
            match self.bpe.decode(tokens[..end].to_vec()) {
                Ok(decoded) => return Ok(Some(decoded)),
                Err(e) if end > 0 && max_tokens - end < MAX_DECODE_BACKOFF => {
                    debug!(end, error = %e, "Truncation split a character, backing off one token");
                    end -= 1;
                }
                Err(e) => return Err(ResponderError::Tokenizer(e.to_string())),
            }
        }
    }
}

/// Tokenizer loaded from a HuggingFace `tokenizer.json`, or built from a
/// BERT `vocab.txt` for repos that ship only the vocabulary.
pub struct HfPromptTokenizer {
    name: String,
    tokenizer: Tokenizer,
}

impl HfPromptTokenizer {
    /// Load from a local `tokenizer.json`.
    pub fn from_file(path: &Path) -> Result<Self, ResponderError> {
        let tokenizer = Tokenizer::from_file(path).map_err(tokenizer_error)?;
        Ok(Self {
            name: path.display().to_string(),
            tokenizer,
        })
    }

    /// Build a cased BERT WordPiece tokenizer from a local `vocab.txt`.
    pub fn from_vocab(path: &Path) -> Result<Self, ResponderError> {
        let vocab = path.to_string_lossy();
        let model = WordPiece::from_file(&vocab)
            .unk_token(BERT_UNK.to_string())
            .build()
            .map_err(|e| ResponderError::Tokenizer(format!("{}: {}", vocab, e)))?;

        let special_id = |token: &str| {
            model.token_to_id(token).ok_or_else(|| {
                ResponderError::Tokenizer(format!("{}: missing {} token", vocab, token))
            })
        };
        let cls = (BERT_CLS.to_string(), special_id(BERT_CLS)?);
        let sep = (BERT_SEP.to_string(), special_id(BERT_SEP)?);

        let built: WordPieceTokenizer = TokenizerBuilder::new()
            .with_model(model.into())
            .with_normalizer(Some(BertNormalizer::new(true, true, Some(false), false).into()))
            .with_pre_tokenizer(Some(BertPreTokenizer.into()))
            .with_post_processor(Some(BertProcessing::new(sep, cls).into()))
            .with_decoder(Some(WordPieceDecoder::default().into()))
            .build()
            .map_err(tokenizer_error)?;

        debug!(vocab = %vocab, "Built WordPiece tokenizer");
        Ok(Self {
            name: path.display().to_string(),
            tokenizer: Tokenizer::from(built),
        })
    }

    /// Fetch the tokenizer for `repo_id` from the HuggingFace Hub (cached).
    ///
    /// Prefers `tokenizer.json`; repos without one fall back to `vocab.txt`.
    /// Blocking; call it outside the async runtime or via `spawn_blocking`.
    pub fn from_hub(repo_id: &str) -> Result<Self, ResponderError> {
        use hf_hub::api::sync::ApiBuilder;

        let api = ApiBuilder::new()
            .with_cache_dir(model_cache_dir())
            .build()
            .map_err(tokenizer_error)?;
        let repo = api.model(repo_id.to_string());

        info!(repo = %repo_id, "Fetching tokenizer");
        let mut loaded = match repo.get("tokenizer.json") {
            Ok(path) => Self::from_file(&path)?,
            Err(e) => {
                info!(repo = %repo_id, error = %e, "No tokenizer.json, trying vocab.txt");
                let path = repo
                    .get("vocab.txt")
                    .map_err(|e| ResponderError::Tokenizer(format!("{}: {}", repo_id, e)))?;
                Self::from_vocab(&path)?
            }
        };
        loaded.name = repo_id.to_string();
        Ok(loaded)
    }
}

impl PromptTokenizer for HfPromptTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self, text: &str) -> Result<usize, ResponderError> {
        let encoding = self.tokenizer.encode(text, true).map_err(tokenizer_error)?;
        Ok(encoding.get_ids().len())
    }

    fn truncate(&self, text: &str, max_tokens: usize) -> Result<Option<String>, ResponderError> {
        let encoding = self.tokenizer.encode(text, true).map_err(tokenizer_error)?;

        let ids = encoding.get_ids();
        if ids.len() <= max_tokens {
            return Ok(None);
        }

        let decoded = self
            .tokenizer
            .decode(&ids[..max_tokens], true)
            .map_err(tokenizer_error)?;
        Ok(Some(decoded))
    }
}

/// Load the tokenizer named in configuration.
///
/// `cl100k_base` selects the bundled BPE. An existing `.txt` file is read as a
/// WordPiece vocabulary and any other existing file as a `tokenizer.json`.
/// Anything else is treated as a HuggingFace repo id. When a HuggingFace
/// tokenizer cannot be loaded the bundled BPE is used instead.
pub fn load_prompt_tokenizer(model: &str) -> Result<Box<dyn PromptTokenizer>, ResponderError> {
    if model == TIKTOKEN_MODEL {
        return Ok(Box::new(TiktokenPromptTokenizer::new()?));
    }

    let path = Path::new(model);
    let loaded = if path.is_file() && path.extension().is_some_and(|ext| ext == "txt") {
        HfPromptTokenizer::from_vocab(path)
    } else if path.is_file() {
        HfPromptTokenizer::from_file(path)
    } else {
        HfPromptTokenizer::from_hub(model)
    };

    match loaded {
        Ok(tokenizer) => Ok(Box::new(tokenizer)),
        Err(e) => {
            warn!(
                model = %model,
                error = %e,
                "Tokenizer unavailable, falling back to {}",
                TIKTOKEN_MODEL
            );
            Ok(Box::new(TiktokenPromptTokenizer::new()?))
        }
    }
}

fn model_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("postlab")
        .join("models")
}
