//! Language profiles: the stopword list, lemma table and stemmer that govern
//! normalization.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use rust_stemmers::{Algorithm, Stemmer};
use stop_words::LANGUAGE;
use tracing::{debug, info, warn};

use postlab_types::NormalizerSettings;

use crate::error::ProfileError;

/// Portuguese surface forms mapped to their dictionary lemma.
const PORTUGUESE_LEMMAS: &str = include_str!("../data/lemmas_pt.json");

/// Upper bound on re-stemming; every pass either shortens the word or stops.
const MAX_STEM_PASSES: usize = 8;

/// Natural-language resources used by the normalizer.
///
/// Built once at startup and shared read-only; every lookup is `&self`, so a
/// profile can be used from many threads at once.
pub struct LanguageProfile {
    language: String,
    stopwords: HashSet<String>,
    lemmas: HashMap<String, String>,
    stemmer: Stemmer,
}

impl LanguageProfile {
    /// Portuguese profile with the bundled stopword list and lemma table.
    pub fn portuguese() -> Self {
        let profile = Self::with_language("pt", stop_words::get(LANGUAGE::Portuguese));
        match parse_lemma_table(PORTUGUESE_LEMMAS) {
            Ok(lemmas) => profile.with_lemmas(lemmas),
            Err(e) => {
                warn!(error = %e, "Bundled lemma table unreadable, lemmatization disabled");
                profile
            }
        }
    }

    /// English profile with the bundled stopword list and no lemma table.
    pub fn english() -> Self {
        Self::with_language("en", stop_words::get(LANGUAGE::English))
    }

    /// Look up a built-in profile by language code.
    pub fn for_language(code: &str) -> Result<Self, ProfileError> {
        match code.trim().to_lowercase().as_str() {
            "pt" | "pt-br" | "portuguese" => Ok(Self::portuguese()),
            "en" | "english" => Ok(Self::english()),
            other => Err(ProfileError::UnsupportedLanguage(other.to_string())),
        }
    }

    /// Build the profile described by the normalizer settings.
    pub fn from_settings(settings: &NormalizerSettings) -> Result<Self, ProfileError> {
        let mut profile = Self::for_language(&settings.language)?;
        profile = profile.with_extra_stopwords(settings.extra_stopwords.iter().cloned());

        if let Some(path) = &settings.lemma_table_path {
            let lemmas = load_lemma_table(Path::new(path))?;
            info!(path = %path, entries = lemmas.len(), "Loaded lemma table");
            profile = profile.merge_lemmas(lemmas);
        }

        Ok(profile)
    }

    /// Profile with an explicit stopword list.
    pub fn with_language<I, S>(language: impl Into<String>, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            language: language.into(),
            stopwords: stopwords
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            lemmas: HashMap::new(),
            stemmer: Stemmer::create(Algorithm::English),
        }
    }

    /// Add stopwords on top of the current list.
    pub fn with_extra_stopwords<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in extra {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                self.stopwords.insert(word);
            }
        }
        self
    }

    /// Replace the lemma table. Keys and values are lowercased.
    pub fn with_lemmas<I, K, V>(mut self, lemmas: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.lemmas = lemmas
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_lowercase(), v.as_ref().to_lowercase()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();
        self
    }

    /// Add lemma entries, overriding existing ones for the same surface form.
    pub fn merge_lemmas<I, K, V>(mut self, lemmas: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let entries = lemmas
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_lowercase(), v.as_ref().to_lowercase()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty());
        self.lemmas.extend(entries);
        self
    }

    pub fn lemma_count(&self) -> usize {
        self.lemmas.len()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn stopword_count(&self) -> usize {
        self.stopwords.len()
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Lemma for `token`, or the token itself when the table has no entry.
    pub fn lemma<'a>(&'a self, token: &'a str) -> &'a str {
        self.lemmas.get(token).map(String::as_str).unwrap_or(token)
    }

    /// Porter-style stem of a lemma, re-applied until it stops changing.
    ///
    /// A single Snowball pass is not stable on its own output (`agreed` ->
    /// `agre` -> `agr`), so stems are taken to a fixed point.
    pub fn stem(&self, lemma: &str) -> String {
        let mut current = self.stemmer.stem(lemma).into_owned();
        for _ in 0..MAX_STEM_PASSES {
            let next = self.stemmer.stem(&current).into_owned();
            if next == current {
                break;
            }
            current = next;
        }
        current
    }
}

impl fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("language", &self.language)
            .field("stopwords", &self.stopwords.len())
            .field("lemmas", &self.lemmas.len())
            .finish()
    }
}

/// Read a JSON object mapping surface forms to lemmas.
fn load_lemma_table(path: &Path) -> Result<HashMap<String, String>, ProfileError> {
    let raw = std::fs::read_to_string(path)?;
    parse_lemma_table(&raw)
}

fn parse_lemma_table(raw: &str) -> Result<HashMap<String, String>, ProfileError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ProfileError::InvalidLemmaTable(e.to_string()))?;

    let object = value.as_object().ok_or_else(|| {
        ProfileError::InvalidLemmaTable("expected a JSON object".to_string())
    })?;

    let mut table = HashMap::with_capacity(object.len());
    for (surface, lemma) in object {
        let lemma = lemma.as_str().ok_or_else(|| {
            ProfileError::InvalidLemmaTable(format!("lemma for '{}' is not a string", surface))
        })?;
        table.insert(surface.clone(), lemma.to_string());
    }
    debug!(entries = table.len(), "Parsed lemma table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_portuguese_has_common_stopwords() {
        let profile = LanguageProfile::portuguese();
        assert_eq!(profile.language(), "pt");
        assert!(profile.is_stopword("de"));
        assert!(profile.is_stopword("que"));
        assert!(!profile.is_stopword("feminismo"));
    }

    #[test]
    fn test_unsupported_language() {
        let err = LanguageProfile::for_language("tlh").unwrap_err();
        assert!(matches!(err, ProfileError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_extra_stopwords_are_lowercased() {
        let profile =
            LanguageProfile::with_language("pt", ["de"]).with_extra_stopwords(["RT", " "]);
        assert!(profile.is_stopword("rt"));
        assert_eq!(profile.stopword_count(), 2);
    }

    #[test]
    fn test_lemma_lookup_falls_back_to_token() {
        let profile = LanguageProfile::with_language("pt", Vec::<String>::new())
            .with_lemmas([("Mulheres", "Mulher")]);
        assert_eq!(profile.lemma("mulheres"), "mulher");
        assert_eq!(profile.lemma("corpo"), "corpo");
    }

    #[test]
    fn test_stem_is_porter_style() {
        let profile = LanguageProfile::english();
        assert_eq!(profile.stem("running"), "run");
        assert_eq!(profile.stem("networks"), "network");
    }

    #[test]
    fn test_stem_reaches_fixed_point() {
        let profile = LanguageProfile::english();
        for word in ["agreed", "guaranteed", "degree", "oversees", "refereed", "committee"] {
            let stem = profile.stem(word);
            assert_eq!(profile.stem(&stem), stem, "unstable stem for {}", word);
        }
        assert_eq!(profile.stem("agreed"), "agr");
    }

    #[test]
    fn test_portuguese_lemmatizes_inflected_verbs() {
        let profile = LanguageProfile::portuguese();
        assert!(profile.lemma_count() > 1000);
        assert_eq!(profile.lemma("concordaram"), "concordar");
        assert_eq!(profile.lemma("lutamos"), "lutar");
        assert_eq!(profile.lemma("mulheres"), "mulher");
        assert_eq!(profile.lemma("fizeram"), "fazer");
        // Nouns that share a verb's spelling stay as they are.
        assert_eq!(profile.lemma("luta"), "luta");
        assert_eq!(profile.lemma("dados"), "dados");
    }

    #[test]
    fn test_bundled_table_maps_onto_fixed_lemmas() {
        let table = parse_lemma_table(PORTUGUESE_LEMMAS).unwrap();
        for (surface, lemma) in &table {
            assert!(
                table.get(lemma).map_or(true, |l| l == lemma),
                "{} -> {} is itself remapped",
                surface,
                lemma
            );
        }
    }

    #[test]
    fn test_from_settings_loads_lemma_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"fomos": "ir", "mulheres": "mulher"}}"#).unwrap();

        let settings = NormalizerSettings {
            language: "pt".to_string(),
            lemma_table_path: Some(file.path().to_string_lossy().to_string()),
            extra_stopwords: vec!["rt".to_string()],
        };

        let profile = LanguageProfile::from_settings(&settings).unwrap();
        assert_eq!(profile.lemma("mulheres"), "mulher");
        assert_eq!(profile.lemma("fomos"), "ir");
        // Bundled entries not named in the file are kept.
        assert_eq!(profile.lemma("concordaram"), "concordar");
        assert!(profile.is_stopword("rt"));
    }

    #[test]
    fn test_invalid_lemma_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["not", "an", "object"]"#).unwrap();

        let settings = NormalizerSettings {
            lemma_table_path: Some(file.path().to_string_lossy().to_string()),
            ..Default::default()
        };

        let err = LanguageProfile::from_settings(&settings).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidLemmaTable(_)));
    }
}
