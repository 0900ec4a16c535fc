use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::UserInputError;

/// A generated word. Only ever compared by equality.
pub type Word = String;

/// How often generated words are a single syllable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepartitionPolicy {
    Always,
    Mostly,
    Frequent,
    LessFrequent,
    Rare,
    Never,
}

impl RepartitionPolicy {
    pub const ALL: [RepartitionPolicy; 6] = [
        RepartitionPolicy::Always,
        RepartitionPolicy::Mostly,
        RepartitionPolicy::Frequent,
        RepartitionPolicy::LessFrequent,
        RepartitionPolicy::Rare,
        RepartitionPolicy::Never,
    ];

    /// Selector label, also the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            RepartitionPolicy::Always => "Always",
            RepartitionPolicy::Mostly => "Mostly",
            RepartitionPolicy::Frequent => "Frequent",
            RepartitionPolicy::LessFrequent => "LessFrequent",
            RepartitionPolicy::Rare => "Rare",
            RepartitionPolicy::Never => "Never",
        }
    }

    /// Exact selector label lookup. There is no fallback value.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|policy| policy.label() == label)
    }

    /// Share of generated words that are monosyllables.
    pub fn mono_syllable_share(self) -> f32 {
        match self {
            RepartitionPolicy::Always => 1.0,
            RepartitionPolicy::Mostly => 0.85,
            RepartitionPolicy::Frequent => 0.5,
            RepartitionPolicy::LessFrequent => 0.20,
            RepartitionPolicy::Rare => 0.07,
            RepartitionPolicy::Never => 0.0,
        }
    }
}

impl fmt::Display for RepartitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Command-line spelling: the label or its snake_case form, any case.
impl FromStr for RepartitionPolicy {
    type Err = UserInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|policy| policy.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| UserInputError::UnknownRepartition(s.to_string()))
    }
}

/// One rule applied to the whole word list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformationStep {
    #[serde(rename = "rule")]
    pub rule_label: String,
    /// Form of each original word after this rule, same indexing.
    #[serde(rename = "words")]
    pub words_after: Vec<Word>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransformationResult {
    /// In rule application order.
    pub history: Vec<TransformationStep>,
    pub output: Vec<Word>,
}

impl TransformationResult {
    /// Result of running no rules at all: every word is its own final form.
    pub fn untouched(words: &[Word]) -> Self {
        TransformationResult {
            history: Vec::new(),
            output: words.to_vec(),
        }
    }

    pub fn rule_labels(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(|step| step.rule_label.as_str())
    }
}
