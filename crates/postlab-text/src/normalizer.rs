//! Text normalization.
//!
//! Turns one raw text field into a canonical token string: lowercase stemmed
//! lemmas joined by single spaces, with URLs, mentions, punctuation, emoji and
//! stopwords removed.
//!
//! The cleanup steps run in a fixed order; each pattern expects the shape left
//! by the previous step:
//! 1. UTF-8 validation (byte input only)
//! 2. emoji / pictograph removal
//! 3. newline removal
//! 4. URL removal
//! 5. `@mention` removal
//! 6. punctuation removal
//! 7. lowercasing
//! 8. tokenization, dropping non-alphanumeric characters inside tokens
//! 9. lemmatization, stopword filtering, stemming (repeated until stable)
//! 10. joining with single spaces
//!
//! Normalizing already-canonical text returns it unchanged.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::NormalizeError;
use crate::profile::LanguageProfile;

/// Emoji, pictograph and symbol blocks stripped from raw text (inclusive).
const EMOJI_RANGES: &[(char, char)] = &[
    ('\u{1F600}', '\u{1F64F}'), // emoticons
    ('\u{1F300}', '\u{1F5FF}'), // symbols & pictographs
    ('\u{1F680}', '\u{1F6FF}'), // transport & map symbols
    ('\u{1F1E0}', '\u{1F1FF}'), // regional indicators (flags)
    ('\u{2500}', '\u{2BEF}'),   // misc symbols
    ('\u{2702}', '\u{27B0}'),   // dingbats
    ('\u{24C2}', '\u{1F251}'),  // enclosed characters
];

/// Substrings that mark a leftover URL fragment.
const URL_MARKERS: &[&str] = &["http", "www"];

/// Upper bound on lemma/stem rounds for a single token.
const MAX_CANONICAL_PASSES: usize = 4;

static RE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:http|www)\S*").expect("valid URL regex"));

static RE_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("valid mention regex"));

static RE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"));

/// Normalizes raw text against a language profile.
///
/// Holds only immutable state, so one normalizer can be shared across threads.
#[derive(Debug)]
pub struct TextNormalizer {
    profile: LanguageProfile,
}

impl TextNormalizer {
    pub fn new(profile: LanguageProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    /// Normalize raw bytes, rejecting input that is not UTF-8.
    pub fn normalize_bytes(&self, raw: &[u8]) -> Result<String, NormalizeError> {
        let text = std::str::from_utf8(raw)?;
        Ok(self.normalize(text))
    }

    /// Normalize one text field into a canonical token string.
    pub fn normalize(&self, raw: &str) -> String {
        normalize(raw, &self.profile)
    }
}

/// Normalize one text field into a canonical token string.
///
/// Empty input, or input made only of stopwords and punctuation, yields `""`.
pub fn normalize(raw: &str, profile: &LanguageProfile) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let cleaned = clean(raw);

    let stems: Vec<String> = cleaned
        .unicode_words()
        .filter_map(|word| canonical_token(word, profile))
        .collect();

    stems.join(" ")
}

/// Reduce one lowercased word to its canonical stem, or `None` when dropped.
///
/// Lemma lookup and stemming repeat until the stem maps onto itself, so a
/// canonical token survives another round unchanged.
fn canonical_token(word: &str, profile: &LanguageProfile) -> Option<String> {
    // Lowercasing can leave combining marks behind ("İ" -> "i\u{307}").
    let mut current: String = word.chars().filter(|c| c.is_alphanumeric()).collect();

    for _ in 0..MAX_CANONICAL_PASSES {
        if current.is_empty() || profile.is_stopword(&current) {
            return None;
        }
        let lemma = profile.lemma(&current);
        if profile.is_stopword(lemma) {
            return None;
        }
        let stem = profile.stem(lemma);
        if stem == current {
            break;
        }
        current = stem;
    }

    if current.is_empty() || is_url_fragment(&current) {
        None
    } else {
        Some(current)
    }
}

/// Steps 2-7: character-level cleanup ahead of tokenization.
fn clean(raw: &str) -> String {
    let text = strip_emoji(raw);
    let text = text.replace('\n', "");
    let text = RE_URL.replace_all(&text, "");
    let text = RE_MENTION.replace_all(&text, "");
    let text = RE_PUNCT.replace_all(&text, "");
    text.to_lowercase()
}

fn strip_emoji(text: &str) -> String {
    text.chars().filter(|c| !is_emoji(*c)).collect()
}

fn is_emoji(c: char) -> bool {
    EMOJI_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&c))
}

fn is_url_fragment(token: &str) -> bool {
    URL_MARKERS.iter().any(|marker| token.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> LanguageProfile {
        LanguageProfile::with_language("pt", ["de", "a", "o", "e", "que", "para", "com"])
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize("", &profile()), "");
    }

    #[test]
    fn test_only_stopwords_and_punctuation() {
        assert_eq!(normalize("de, a... o! -- ?", &profile()), "");
    }

    #[test]
    fn test_strip_emoji() {
        assert_eq!(strip_emoji("força 💪🏽 feminista ✊ 🇧🇷"), "força  feminista  ");
        assert!(is_emoji('😀'));
        assert!(!is_emoji('ç'));
    }

    #[test]
    fn test_clean_removes_urls_mentions_punctuation() {
        let cleaned = clean("Veja: https://t.co/abc e www.site.com.br, via @coletivo_fem!\nHoje");
        assert_eq!(cleaned, "veja  e  via hoje");
    }

    #[test]
    fn test_newlines_are_removed_not_replaced() {
        assert_eq!(clean("luta\ndiária"), "lutadiária");
    }

    #[test]
    fn test_normalize_pipeline() {
        let out = normalize("Running networks, @someone! https://x.y 🚀", &profile());
        assert_eq!(out, "run network");
    }

    #[test]
    fn test_lemmas_feed_stemmer() {
        let profile = profile().with_lemmas([("fomos", "ir"), ("mulheres", "mulher")]);
        assert_eq!(normalize("Fomos mulheres", &profile), "ir mulher");
    }

    #[test]
    fn test_lemma_that_is_stopword_is_dropped() {
        let profile = profile().with_lemmas([("das", "de")]);
        assert_eq!(normalize("das", &profile), "");
    }

    #[test]
    fn test_idempotent_on_canonical_text() {
        let profile = profile();
        let once = normalize("Running networks dados!", &profile);
        let twice = normalize(&once, &profile);
        assert_eq!(once, "run network dado");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_idempotent_on_unstable_stems() {
        let profile = LanguageProfile::portuguese();
        let words = [
            "agreed",
            "guaranteed",
            "degree",
            "oversees",
            "refereed",
            "committee",
            "running",
            "networks",
            "likes",
            "stories",
            "followers",
            "feedback",
            "concordaram",
            "mulheres",
            "ciência",
            "dados",
            "feminismo",
            "manifestação",
            "lutamos",
            "direitos",
            "İstanbul",
            "naïve",
        ];

        for word in words {
            let once = normalize(word, &profile);
            assert_eq!(normalize(&once, &profile), once, "not stable for {:?}", word);
        }
        let sentence = words.join(" ");
        let once = normalize(&sentence, &profile);
        assert_eq!(normalize(&once, &profile), once);
    }

    #[test]
    fn test_bundled_lemmas_collapse_inflections() {
        let profile = LanguageProfile::portuguese();
        assert_eq!(
            normalize("Elas concordaram", &profile),
            normalize("concordar", &profile)
        );
        assert_eq!(normalize("mulheres", &profile), normalize("mulher", &profile));
    }

    #[test]
    fn test_combining_marks_are_dropped() {
        let out = normalize("İstanbul", &profile());
        assert_eq!(out, "istanbul");
        assert!(out.chars().all(char::is_alphanumeric));
    }

    #[test]
    fn test_output_properties() {
        let profile = profile();
        let inputs = [
            "OLÁ Mundo!!! @Fulana visite HTTP://EXEMPLO.COM/Path ☀️😀",
            "ht.tp trick and WWW.caps.org plus #hashtag & símbolos ©®",
            "Linha 1\nLinha 2\t\tTab — travessão “aspas”",
            "İSTANBUL e Ǆemal ﬁnal",
            "",
        ];

        for input in inputs {
            let out = normalize(input, &profile);
            assert!(!out.chars().any(char::is_uppercase), "uppercase in {:?}", out);
            assert!(!out.contains('@'), "mention in {:?}", out);
            assert!(!out.contains("http") && !out.contains("www"), "url in {:?}", out);
            assert!(
                out.chars().all(|c| c.is_alphanumeric() || c == ' '),
                "punctuation in {:?}",
                out
            );
            assert!(!out.chars().any(is_emoji), "emoji in {:?}", out);
            assert!(!out.contains("  ") && out.trim() == out, "empty token in {:?}", out);
        }
    }

    #[test]
    fn test_normalize_bytes_rejects_invalid_utf8() {
        let normalizer = TextNormalizer::new(profile());
        let err = normalizer.normalize_bytes(&[0x66, 0x6f, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, NormalizeError::Encoding(_)));

        let ok = normalizer.normalize_bytes("Networks".as_bytes()).unwrap();
        assert_eq!(ok, "network");
    }
}
