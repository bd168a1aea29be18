//! Topic items and labeling results.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Label written for an item whose retry budget ran out.
pub const FAILURE_SENTINEL: &str = "Erro: Tópico não identificado";

/// A cluster to be labeled: its keywords and a representative token string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicItem {
    /// Cluster keywords, first occurrence order, no duplicates
    #[serde(alias = "palavras-chave", deserialize_with = "deserialize_keywords")]
    pub keywords: Vec<String>,

    /// Representative canonical token string
    #[serde(alias = "texto", default)]
    pub text: String,
}

impl TopicItem {
    pub fn new<I, S>(keywords: I, text: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: dedup_keywords(keywords.into_iter().map(Into::into)),
            text: text.into(),
        }
    }
}

fn dedup_keywords(keywords: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in keywords {
        if !out.contains(&keyword) {
            out.push(keyword);
        }
    }
    out
}

fn deserialize_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(dedup_keywords(raw.into_iter()))
}

/// Outcome of labeling one item.
///
/// On disk a failure is the literal [`FAILURE_SENTINEL`] string, so result
/// files stay readable by consumers that expect a flat `index -> label` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    /// The responder produced a label
    Labeled(String),
    /// Every attempt produced an unusable response
    Failed,
}

impl TopicOutcome {
    /// Label text, or the sentinel for a failure.
    pub fn as_str(&self) -> &str {
        match self {
            TopicOutcome::Labeled(label) => label,
            TopicOutcome::Failed => FAILURE_SENTINEL,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            TopicOutcome::Labeled(label) => Some(label),
            TopicOutcome::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TopicOutcome::Failed)
    }
}

impl Serialize for TopicOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TopicOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == FAILURE_SENTINEL {
            Ok(TopicOutcome::Failed)
        } else {
            Ok(TopicOutcome::Labeled(raw))
        }
    }
}

/// Labels keyed by the item's position in the input sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicResult {
    outcomes: BTreeMap<usize, TopicOutcome>,
}

impl TopicResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `index`, returning any previous one.
    pub fn insert(&mut self, index: usize, outcome: TopicOutcome) -> Option<TopicOutcome> {
        self.outcomes.insert(index, outcome)
    }

    pub fn get(&self, index: usize) -> Option<&TopicOutcome> {
        self.outcomes.get(&index)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TopicOutcome)> {
        self.outcomes.iter().map(|(i, o)| (*i, o))
    }

    pub fn labeled_count(&self) -> usize {
        self.outcomes.values().filter(|o| !o.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_failed()).count()
    }

    /// True when the keys are exactly `0..item_count`.
    pub fn covers(&self, item_count: usize) -> bool {
        self.outcomes.len() == item_count && self.outcomes.keys().copied().eq(0..item_count)
    }
}

impl FromIterator<(usize, TopicOutcome)> for TopicResult {
    fn from_iter<T: IntoIterator<Item = (usize, TopicOutcome)>>(iter: T) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}
